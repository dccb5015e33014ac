//! Configuration for an echoip deployment.

use echoip_core::{EchoipError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Prefix shared by all environment overrides.
const ENV_PREFIX: &str = "ECHOIP_";

/// Runtime configuration.
///
/// Loaded from TOML, then overridden by `ECHOIP_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of cached results, 0 disables the cache.
    #[serde(default)]
    pub cache_size: usize,

    /// Headers trusted to carry the client address, in precedence order.
    #[serde(default)]
    pub trusted_headers: Vec<String>,

    /// Whether an `ip` query parameter may override the client address.
    #[serde(default = "default_true")]
    pub allow_query_override: bool,

    /// Enable reverse DNS lookups.
    #[serde(default)]
    pub reverse_lookup: bool,

    /// Enable port reachability probing.
    #[serde(default)]
    pub port_lookup: bool,

    /// Reverse DNS timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub dns_timeout_ms: u64,

    /// Port probe timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub port_timeout_ms: u64,

    /// Which backend answers country, city and ASN lookups.
    #[serde(default)]
    pub database: Database,

    /// GeoIP database files.
    #[serde(default)]
    pub geoip: GeoIpConfig,

    /// ipstack.com API access.
    #[serde(default)]
    pub ipstack: IpStackConfig,

    /// Logging output.
    #[serde(default)]
    pub log: LogConfig,
}

/// Paths to MaxMind databases; a missing path disables that lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoIpConfig {
    /// Country database (`GeoLite2-Country.mmdb`).
    #[serde(default)]
    pub country_file: Option<PathBuf>,

    /// City database (`GeoLite2-City.mmdb`).
    #[serde(default)]
    pub city_file: Option<PathBuf>,

    /// ASN database (`GeoLite2-ASN.mmdb`).
    #[serde(default)]
    pub asn_file: Option<PathBuf>,
}

/// Geolocation backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    /// Local MaxMind databases from [`GeoIpConfig`]
    #[default]
    Geoip,
    /// The ipstack.com API
    Ipstack,
}

impl FromStr for Database {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geoip" => Ok(Self::Geoip),
            "ipstack" => Ok(Self::Ipstack),
            _ => Err(format!("invalid database '{s}': expected geoip|ipstack")),
        }
    }
}

/// ipstack.com API settings, used when `database = "ipstack"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpStackConfig {
    /// API access key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Use the HTTPS endpoint (paid plans only).
    #[serde(default)]
    pub use_https: bool,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for IpStackConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            use_https: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl IpStackConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Log level and output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_size: 0,
            trusted_headers: Vec::new(),
            allow_query_override: true,
            reverse_lookup: false,
            port_lookup: false,
            dns_timeout_ms: default_timeout_ms(),
            port_timeout_ms: default_timeout_ms(),
            database: Database::default(),
            geoip: GeoIpConfig::default(),
            ipstack: IpStackConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EchoipError::Config(e.to_string()))
    }

    /// Apply `ECHOIP_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `ECHOIP_*` overrides from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        if let Some(v) = var("CACHE_SIZE") {
            self.cache_size = parse_env("CACHE_SIZE", &v)?;
        }
        if let Some(v) = var("TRUSTED_HEADERS") {
            self.trusted_headers = v
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = var("ALLOW_QUERY_OVERRIDE") {
            self.allow_query_override = parse_bool("ALLOW_QUERY_OVERRIDE", &v)?;
        }
        if let Some(v) = var("REVERSE_LOOKUP") {
            self.reverse_lookup = parse_bool("REVERSE_LOOKUP", &v)?;
        }
        if let Some(v) = var("PORT_LOOKUP") {
            self.port_lookup = parse_bool("PORT_LOOKUP", &v)?;
        }
        if let Some(v) = var("DNS_TIMEOUT_MS") {
            self.dns_timeout_ms = parse_env("DNS_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = var("PORT_TIMEOUT_MS") {
            self.port_timeout_ms = parse_env("PORT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = var("DATABASE") {
            self.database = v.parse().map_err(EchoipError::Config)?;
        }
        if let Some(v) = var("IPSTACK_API_KEY") {
            self.ipstack.api_key = Some(v);
        }
        if let Some(v) = var("IPSTACK_USE_HTTPS") {
            self.ipstack.use_https = parse_bool("IPSTACK_USE_HTTPS", &v)?;
        }
        if let Some(v) = var("IPSTACK_TIMEOUT_MS") {
            self.ipstack.timeout_ms = parse_env("IPSTACK_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = var("GEOIP_COUNTRY_FILE") {
            self.geoip.country_file = Some(PathBuf::from(v));
        }
        if let Some(v) = var("GEOIP_CITY_FILE") {
            self.geoip.city_file = Some(PathBuf::from(v));
        }
        if let Some(v) = var("GEOIP_ASN_FILE") {
            self.geoip.asn_file = Some(PathBuf::from(v));
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log.level = v.parse().map_err(EchoipError::Config)?;
        }
        if let Some(v) = var("LOG_FORMAT") {
            self.log.format = v.parse().map_err(EchoipError::Config)?;
        }
        Ok(())
    }

    /// Check values that deserialization alone cannot rule out.
    pub fn validate(&self) -> Result<()> {
        if self.dns_timeout_ms == 0 {
            return Err(EchoipError::Config("dns_timeout_ms must be positive".into()));
        }
        if self.port_timeout_ms == 0 {
            return Err(EchoipError::Config("port_timeout_ms must be positive".into()));
        }
        if self.database == Database::Ipstack {
            if self.ipstack.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(EchoipError::Config(
                    "database = \"ipstack\" requires ipstack.api_key".into(),
                ));
            }
            if self.ipstack.timeout_ms == 0 {
                return Err(EchoipError::Config("ipstack.timeout_ms must be positive".into()));
            }
        }
        if let Some(header) = self.trusted_headers.iter().find(|h| h.trim().is_empty()) {
            return Err(EchoipError::Config(format!("invalid trusted header {header:?}")));
        }
        Ok(())
    }

    /// Reverse DNS timeout.
    #[must_use]
    pub const fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    /// Port probe timeout.
    #[must_use]
    pub const fn port_timeout(&self) -> Duration {
        Duration::from_millis(self.port_timeout_ms)
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| EchoipError::Config(format!("{ENV_PREFIX}{name}={value}: {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        _ => Err(EchoipError::Config(format!(
            "{ENV_PREFIX}{name}={value}: expected a boolean"
        ))),
    }
}

// Default value functions for serde.
const fn default_true() -> bool {
    true
}

const fn default_timeout_ms() -> u64 {
    2_000
}

// ── Log level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(format!(
                "invalid log level '{s}': expected error|warn|info|debug|trace"
            )),
        }
    }
}

// ── Log format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

impl LogFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            _ => Err(format!("invalid log format '{s}': expected json|text")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache_size, 0);
        assert!(config.allow_query_override);
        assert!(!config.reverse_lookup);
        assert!(!config.port_lookup);
        assert_eq!(config.port_timeout(), Duration::from_secs(2));
        assert_eq!(config.log.level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            cache_size = 1024
            trusted_headers = ["X-Real-IP", "X-Forwarded-For"]
            reverse_lookup = true

            [geoip]
            city_file = "/var/lib/geoip/GeoLite2-City.mmdb"

            [log]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache_size, 1024);
        assert_eq!(config.trusted_headers, vec!["X-Real-IP", "X-Forwarded-For"]);
        assert!(config.reverse_lookup);
        assert!(config.allow_query_override);
        assert_eq!(config.dns_timeout_ms, 2_000);
        assert_eq!(
            config.geoip.city_file.as_deref(),
            Some(Path::new("/var/lib/geoip/GeoLite2-City.mmdb"))
        );
        assert_eq!(config.geoip.country_file, None);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("cache_size = -1").unwrap_err();
        assert!(matches!(err, EchoipError::Config(_)));
    }

    #[test]
    fn test_load_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port_lookup = true").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert!(config.port_lookup);

        let missing = Config::load(Path::new("/nonexistent/echoip.toml")).unwrap();
        assert_eq!(missing, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_from(env(&[
                ("ECHOIP_CACHE_SIZE", "64"),
                ("ECHOIP_TRUSTED_HEADERS", "X-Real-IP, X-Forwarded-For,"),
                ("ECHOIP_REVERSE_LOOKUP", "true"),
                ("ECHOIP_ALLOW_QUERY_OVERRIDE", "0"),
                ("ECHOIP_GEOIP_ASN_FILE", "/tmp/asn.mmdb"),
                ("ECHOIP_LOG_LEVEL", "warning"),
                ("ECHOIP_PORT_LOOKUP", ""),
            ]))
            .unwrap();

        assert_eq!(config.cache_size, 64);
        assert_eq!(config.trusted_headers, vec!["X-Real-IP", "X-Forwarded-For"]);
        assert!(config.reverse_lookup);
        assert!(!config.allow_query_override);
        assert!(!config.port_lookup);
        assert_eq!(config.geoip.asn_file, Some(PathBuf::from("/tmp/asn.mmdb")));
        assert_eq!(config.log.level, LogLevel::Warn);
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config
            .apply_env_from(env(&[("ECHOIP_CACHE_SIZE", "lots")]))
            .is_err());
        assert!(config
            .apply_env_from(env(&[("ECHOIP_PORT_LOOKUP", "maybe")]))
            .is_err());
        assert!(config
            .apply_env_from(env(&[("ECHOIP_LOG_FORMAT", "xml")]))
            .is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            port_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ipstack_database() {
        let config = Config::from_toml(
            r#"
            database = "ipstack"

            [ipstack]
            api_key = "abc123"
            use_https = true
            "#,
        )
        .unwrap();
        assert_eq!(config.database, Database::Ipstack);
        assert_eq!(config.ipstack.api_key.as_deref(), Some("abc123"));
        assert!(config.ipstack.use_https);
        assert_eq!(config.ipstack.timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());

        let mut from_env = Config::default();
        from_env
            .apply_env_from(env(&[
                ("ECHOIP_DATABASE", "IPSTACK"),
                ("ECHOIP_IPSTACK_API_KEY", "k"),
                ("ECHOIP_IPSTACK_TIMEOUT_MS", "500"),
            ]))
            .unwrap();
        assert_eq!(from_env.database, Database::Ipstack);
        assert_eq!(from_env.ipstack.timeout_ms, 500);
        assert!(from_env.validate().is_ok());
    }

    #[test]
    fn test_ipstack_requires_api_key() {
        let config = Config {
            database: Database::Ipstack,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(EchoipError::Config(_))));

        let mut config = Config::default();
        assert!(config
            .apply_env_from(env(&[("ECHOIP_DATABASE", "redis")]))
            .is_err());
    }

    #[test]
    fn test_log_level_as_str() {
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!("TRACE".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
    }
}
