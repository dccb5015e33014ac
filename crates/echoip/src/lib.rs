//! Cached IP address enrichment.
//!
//! Given a request, determine the client address and attach geolocation,
//! autonomous system, reverse DNS and user agent information. Results are
//! kept in a bounded FIFO cache shared across requests.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use echoip::{Config, EnrichmentPipeline, RequestContext};
//!
//! #[tokio::main]
//! async fn main() -> echoip::Result<()> {
//!     let mut config = Config::load("echoip.toml".as_ref())?;
//!     config.apply_env()?;
//!     echoip::logging::init(config.log.level, config.log.format)?;
//!
//!     let pipeline = EnrichmentPipeline::from_config(&config)?;
//!     let ctx = RequestContext::new("203.0.113.7:51000".parse().unwrap())
//!         .with_user_agent("curl/8.4.0");
//!
//!     let info = pipeline.resolve(&ctx).await?;
//!     println!("{:?} {:?}", info.country, info.asn);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - `geoip` and `dns`
//! - `geoip` - MaxMind database lookups
//! - `dns` - Reverse hostname resolution
//! - `ipstack` - ipstack.com API instead of local databases
//! - `full` - Everything

#![doc(html_root_url = "https://docs.rs/echoip/0.1.0")]

pub mod config;
pub mod logging;
mod pipeline;
mod request;

pub use config::{Config, Database, GeoIpConfig, IpStackConfig, LogConfig, LogFormat, LogLevel};
pub use pipeline::EnrichmentPipeline;
pub use request::RequestContext;

// Re-export core types
pub use echoip_core::*;

// Re-export the cache
pub use echoip_cache::{CacheStats, ResultCache};

// Re-export providers
pub use echoip_lookup::{
    AsnLookup, CityLookup, CountryLookup, Disabled, HostnameLookup, LookupError, LookupResult,
    PortProbe, Providers, TcpProbe,
};

#[cfg(feature = "geoip")]
pub use echoip_lookup::GeoIpDatabase;

#[cfg(feature = "dns")]
pub use echoip_lookup::DnsHostname;

#[cfg(feature = "ipstack")]
pub use echoip_lookup::IpStack;

// Re-exported for implementing the async provider traits
pub use async_trait::async_trait;

// Re-export runtime for convenience
pub use serde_json;
pub use tokio;
