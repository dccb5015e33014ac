use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::config::{LogFormat, LogLevel};

/// Initialize structured logging to stdout.
///
/// - `LogFormat::Json`: flattened JSON, one event per line.
/// - `LogFormat::Text`: human-readable colored output.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `level`. Fails if a
/// global subscriber is already installed.
pub fn init(level: LogLevel, format: LogFormat) -> echoip_core::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing::subscriber::set_global_default(subscriber(env_filter, format))
        .map_err(|e| echoip_core::EchoipError::Config(format!("logging: {e}")))
}

fn subscriber(filter: EnvFilter, format: LogFormat) -> Box<dyn Subscriber + Send + Sync> {
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => Box::new(
            registry.with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(true)
                    .with_ansi(false),
            ),
        ),
        LogFormat::Text => Box::new(registry.with(fmt::layer().with_target(true).with_ansi(true))),
    }
}
