//! Cache-first enrichment of client addresses.

use echoip_cache::{CacheStats, ResultCache};
use echoip_core::{AddressInfo, EchoipError, PortCheck, Result};
use echoip_lookup::{LookupError, Providers, TcpProbe};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Config, Database};
use crate::request::RequestContext;

/// Resolves a request to an [`AddressInfo`], filling the cache on a miss.
///
/// The cache lock is never held while a provider runs: the pipeline reads,
/// releases, enriches and then writes. Two concurrent misses for the same
/// address may therefore both reach the providers; the later write wins.
#[derive(Debug, Clone)]
pub struct EnrichmentPipeline {
    cache: Arc<ResultCache>,
    providers: Providers,
    trusted_headers: Vec<String>,
    allow_query_override: bool,
}

impl EnrichmentPipeline {
    /// Create a pipeline over a shared cache.
    ///
    /// No headers are trusted and the `ip` query override is allowed.
    #[must_use]
    pub fn new(cache: Arc<ResultCache>, providers: Providers) -> Self {
        Self {
            cache,
            providers,
            trusted_headers: Vec::new(),
            allow_query_override: true,
        }
    }

    /// Set the headers trusted to carry the client address, in precedence order
    #[must_use]
    pub fn with_trusted_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Allow or forbid the `ip` query parameter to override the client address
    #[must_use]
    pub const fn with_query_override(mut self, allow: bool) -> Self {
        self.allow_query_override = allow;
        self
    }

    /// Build a pipeline with the providers and cache described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut providers = Providers::new();
        providers = match config.database {
            Database::Geoip => with_geoip(providers, config)?,
            Database::Ipstack => with_ipstack(providers, config)?,
        };
        providers = with_dns(providers, config);

        if config.port_lookup {
            providers =
                providers.with_port_probe(Arc::new(TcpProbe::new().timeout(config.port_timeout())));
        }

        info!(
            cache_size = config.cache_size,
            trusted_headers = ?config.trusted_headers,
            providers = ?providers,
            "enrichment pipeline ready"
        );

        Ok(
            Self::new(Arc::new(ResultCache::new(config.cache_size)), providers)
                .with_trusted_headers(config.trusted_headers.iter().cloned())
                .with_query_override(config.allow_query_override),
        )
    }

    /// Look up everything known about the requesting client.
    ///
    /// Provider failures are logged and leave their fields empty; only a
    /// missing or unparseable client address is an error.
    pub async fn resolve(&self, ctx: &RequestContext) -> Result<AddressInfo> {
        let ip = self.client_address(ctx)?;

        let info = if let Some(info) = self.cache.get(ip) {
            debug!(%ip, "cache hit");
            info
        } else {
            debug!(%ip, "cache miss");
            let info = self.enrich(ip).await;
            self.cache.set(ip, info.clone());
            info
        };

        Ok(info.with_user_agent(ctx.user_agent()))
    }

    /// The client address only, without enrichment
    pub fn client_address(&self, ctx: &RequestContext) -> Result<IpAddr> {
        ctx.client_address(&self.trusted_headers, self.allow_query_override)
    }

    /// Check whether `port` on `ip` accepts TCP connections.
    ///
    /// The port is validated before any network activity. Results are not
    /// cached.
    pub async fn probe_port(&self, ip: IpAddr, port: u64) -> Result<PortCheck> {
        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| {
                EchoipError::InvalidArgument(format!(
                    "invalid port: {port}, must be between 1 and 65535"
                ))
            })?;

        if !self.providers.port.is_enabled() {
            return Err(LookupError::Disabled.into_unavailable("port"));
        }

        let reachable = match self.providers.port.probe(ip, port).await {
            Ok(()) => true,
            Err(e) => {
                debug!(%ip, port, error = %e, "port unreachable");
                false
            }
        };

        Ok(PortCheck {
            ip,
            port,
            reachable,
        })
    }

    /// Probe a port on the requesting client.
    ///
    /// The `ip` query override is ignored so a client can only probe itself.
    pub async fn check_port(&self, ctx: &RequestContext, port: u64) -> Result<PortCheck> {
        let ip = ctx.client_address(&self.trusted_headers, false)?;
        self.probe_port(ip, port).await
    }

    /// Snapshot of the cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Change the cache capacity
    pub fn resize_cache(&self, capacity: i64) -> Result<()> {
        self.cache.resize(capacity)
    }

    /// Whether a country or city provider is enabled
    pub fn has_geo(&self) -> bool {
        self.providers.has_geo()
    }

    /// The shared result cache
    #[must_use]
    pub const fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    async fn enrich(&self, ip: IpAddr) -> AddressInfo {
        let mut info = AddressInfo::new(ip);
        let providers = &self.providers;

        if providers.country.is_enabled() {
            match providers.country.country(ip).await {
                Ok(record) => info.apply_country(record),
                Err(e) => log_failure(ip, "country", &e),
            }
        }

        if providers.city.is_enabled() {
            match providers.city.city(ip).await {
                Ok(record) => info.apply_city(record),
                Err(e) => log_failure(ip, "city", &e),
            }
        }

        if providers.asn.is_enabled() {
            match providers.asn.asn(ip).await {
                Ok(record) => info.apply_asn(record),
                Err(e) => log_failure(ip, "asn", &e),
            }
        }

        if providers.hostname.is_enabled() {
            match providers.hostname.hostname(ip).await {
                Ok(name) => info.apply_hostname(&name),
                Err(e) => log_failure(ip, "hostname", &e),
            }
        }

        info
    }
}

fn log_failure(ip: IpAddr, provider: &'static str, err: &LookupError) {
    match err {
        LookupError::NotFound => debug!(%ip, provider, "no data for address"),
        _ => warn!(%ip, provider, error = %err, "lookup failed"),
    }
}

#[cfg(feature = "geoip")]
fn with_geoip(mut providers: Providers, config: &Config) -> Result<Providers> {
    use echoip_lookup::GeoIpDatabase;

    let open = |path: &std::path::Path| {
        GeoIpDatabase::open(path)
            .map(Arc::new)
            .map_err(|e| EchoipError::Config(e.to_string()))
    };

    if let Some(path) = &config.geoip.country_file {
        providers = providers.with_country(open(path)?);
    }
    if let Some(path) = &config.geoip.city_file {
        providers = providers.with_city(open(path)?);
    }
    if let Some(path) = &config.geoip.asn_file {
        providers = providers.with_asn(open(path)?);
    }
    Ok(providers)
}

#[cfg(not(feature = "geoip"))]
fn with_geoip(providers: Providers, config: &Config) -> Result<Providers> {
    let geoip = &config.geoip;
    if geoip.country_file.is_some() || geoip.city_file.is_some() || geoip.asn_file.is_some() {
        warn!("GeoIP databases configured but the geoip feature is disabled");
    }
    Ok(providers)
}

#[cfg(feature = "ipstack")]
fn with_ipstack(providers: Providers, config: &Config) -> Result<Providers> {
    let api_key = config.ipstack.api_key.clone().unwrap_or_default();
    let ipstack = echoip_lookup::IpStack::builder(api_key)
        .use_https(config.ipstack.use_https)
        .timeout(config.ipstack.timeout())
        .build()
        .map_err(|e| EchoipError::Config(e.to_string()))?;

    let ipstack = Arc::new(ipstack);
    Ok(providers
        .with_country(ipstack.clone())
        .with_city(ipstack.clone())
        .with_asn(ipstack))
}

#[cfg(not(feature = "ipstack"))]
fn with_ipstack(_providers: Providers, _config: &Config) -> Result<Providers> {
    Err(EchoipError::Config(
        "database = \"ipstack\" but the ipstack feature is disabled".into(),
    ))
}

#[cfg(feature = "dns")]
fn with_dns(providers: Providers, config: &Config) -> Providers {
    if config.reverse_lookup {
        providers.with_hostname(Arc::new(echoip_lookup::DnsHostname::new(config.dns_timeout())))
    } else {
        providers
    }
}

#[cfg(not(feature = "dns"))]
fn with_dns(providers: Providers, config: &Config) -> Providers {
    if config.reverse_lookup {
        warn!("reverse lookup requested but the dns feature is disabled");
    }
    providers
}
