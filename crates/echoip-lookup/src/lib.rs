//! Enrichment providers for echoip.
//!
//! Each kind of lookup is a capability trait in [`provider`]. A provider that
//! is switched off is represented by [`Disabled`] rather than an `Option`, so
//! callers never branch on presence.

#![doc(html_root_url = "https://docs.rs/echoip-lookup/0.1.0")]

mod error;
pub mod probe;
pub mod provider;

#[cfg(feature = "geoip")]
pub mod geoip;

#[cfg(feature = "dns")]
pub mod dns;

#[cfg(feature = "ipstack")]
pub mod ipstack;

pub use error::{LookupError, LookupResult};
pub use probe::TcpProbe;
pub use provider::{
    AsnLookup, CityLookup, CountryLookup, Disabled, HostnameLookup, PortProbe, Providers,
};

#[cfg(feature = "geoip")]
pub use geoip::GeoIpDatabase;

#[cfg(feature = "dns")]
pub use dns::DnsHostname;

#[cfg(feature = "ipstack")]
pub use ipstack::{IpStack, IpStackBuilder};
