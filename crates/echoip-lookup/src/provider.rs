//! Capability traits for enrichment providers.

use async_trait::async_trait;
use echoip_core::{AsnRecord, CityRecord, CountryRecord};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::error::{LookupError, LookupResult};

/// Country attribution
#[async_trait]
pub trait CountryLookup: Send + Sync {
    /// Whether this provider should be consulted
    fn is_enabled(&self) -> bool {
        true
    }

    /// Look up the country of an address
    async fn country(&self, ip: IpAddr) -> LookupResult<CountryRecord>;
}

/// City attribution
#[async_trait]
pub trait CityLookup: Send + Sync {
    /// Whether this provider should be consulted
    fn is_enabled(&self) -> bool {
        true
    }

    /// Look up the city of an address
    async fn city(&self, ip: IpAddr) -> LookupResult<CityRecord>;
}

/// Autonomous system attribution
#[async_trait]
pub trait AsnLookup: Send + Sync {
    /// Whether this provider should be consulted
    fn is_enabled(&self) -> bool {
        true
    }

    /// Look up the autonomous system of an address
    async fn asn(&self, ip: IpAddr) -> LookupResult<AsnRecord>;
}

/// Reverse hostname resolution
#[async_trait]
pub trait HostnameLookup: Send + Sync {
    /// Whether this provider should be consulted
    fn is_enabled(&self) -> bool {
        true
    }

    /// Resolve the hostname of an address.
    ///
    /// Implementations must bound their own runtime.
    async fn hostname(&self, ip: IpAddr) -> LookupResult<String>;
}

/// TCP reachability probing
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// Whether this provider should be consulted
    fn is_enabled(&self) -> bool {
        true
    }

    /// Succeeds if `port` on `ip` accepts a connection.
    ///
    /// Implementations must bound their own runtime.
    async fn probe(&self, ip: IpAddr, port: u16) -> LookupResult<()>;
}

/// Stand-in for any provider that is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

#[async_trait]
impl CountryLookup for Disabled {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn country(&self, _ip: IpAddr) -> LookupResult<CountryRecord> {
        Err(LookupError::Disabled)
    }
}

#[async_trait]
impl CityLookup for Disabled {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn city(&self, _ip: IpAddr) -> LookupResult<CityRecord> {
        Err(LookupError::Disabled)
    }
}

#[async_trait]
impl AsnLookup for Disabled {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn asn(&self, _ip: IpAddr) -> LookupResult<AsnRecord> {
        Err(LookupError::Disabled)
    }
}

#[async_trait]
impl HostnameLookup for Disabled {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn hostname(&self, _ip: IpAddr) -> LookupResult<String> {
        Err(LookupError::Disabled)
    }
}

#[async_trait]
impl PortProbe for Disabled {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn probe(&self, _ip: IpAddr, _port: u16) -> LookupResult<()> {
        Err(LookupError::Disabled)
    }
}

/// One provider of each kind, all [`Disabled`] by default
#[derive(Clone)]
pub struct Providers {
    /// Country provider
    pub country: Arc<dyn CountryLookup>,
    /// City provider
    pub city: Arc<dyn CityLookup>,
    /// ASN provider
    pub asn: Arc<dyn AsnLookup>,
    /// Reverse hostname provider
    pub hostname: Arc<dyn HostnameLookup>,
    /// Port reachability provider
    pub port: Arc<dyn PortProbe>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            country: Arc::new(Disabled),
            city: Arc::new(Disabled),
            asn: Arc::new(Disabled),
            hostname: Arc::new(Disabled),
            port: Arc::new(Disabled),
        }
    }
}

impl Providers {
    /// Create a set with every provider disabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the country provider
    #[must_use]
    pub fn with_country(mut self, provider: Arc<dyn CountryLookup>) -> Self {
        self.country = provider;
        self
    }

    /// Set the city provider
    #[must_use]
    pub fn with_city(mut self, provider: Arc<dyn CityLookup>) -> Self {
        self.city = provider;
        self
    }

    /// Set the ASN provider
    #[must_use]
    pub fn with_asn(mut self, provider: Arc<dyn AsnLookup>) -> Self {
        self.asn = provider;
        self
    }

    /// Set the reverse hostname provider
    #[must_use]
    pub fn with_hostname(mut self, provider: Arc<dyn HostnameLookup>) -> Self {
        self.hostname = provider;
        self
    }

    /// Set the port reachability provider
    #[must_use]
    pub fn with_port_probe(mut self, provider: Arc<dyn PortProbe>) -> Self {
        self.port = provider;
        self
    }

    /// Whether any geographic provider (country or city) is enabled
    pub fn has_geo(&self) -> bool {
        self.country.is_enabled() || self.city.is_enabled()
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("country", &self.country.is_enabled())
            .field("city", &self.city.is_enabled())
            .field("asn", &self.asn.is_enabled())
            .field("hostname", &self.hostname.is_enabled())
            .field("port", &self.port.is_enabled())
            .finish()
    }
}
