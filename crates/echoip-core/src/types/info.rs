use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::{AsnRecord, CityRecord, CountryRecord, UserAgent};

/// Everything known about one address.
///
/// Built once per cache miss and cached without `user_agent`; the
/// user agent is attached per request afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// The address itself
    pub ip: IpAddr,

    /// Address as an unsigned integer (IPv4 uses its 4-byte form)
    pub ip_decimal: u128,

    /// English country name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Two-letter country code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_iso: Option<String>,

    /// Whether the country is in the European Union
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_eu: Option<bool>,

    /// Region/state name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,

    /// Region/state code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,

    /// Metro code (US only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metro_code: Option<u16>,

    /// Postal/ZIP code
    #[serde(default, rename = "zip_code", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    /// City name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Latitude coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// IANA time zone name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Autonomous system number, `AS<n>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,

    /// Autonomous system organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn_org: Option<String>,

    /// Reverse DNS name without the trailing root dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Client software of the current request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<UserAgent>,
}

impl AddressInfo {
    /// Create a record with only the address fields populated
    #[must_use]
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            ip_decimal: to_decimal(ip),
            country: None,
            country_iso: None,
            country_eu: None,
            region_name: None,
            region_code: None,
            metro_code: None,
            postal_code: None,
            city: None,
            latitude: None,
            longitude: None,
            timezone: None,
            asn: None,
            asn_org: None,
            hostname: None,
            user_agent: None,
        }
    }

    /// Copy country fields from a provider record
    pub fn apply_country(&mut self, record: CountryRecord) {
        self.country = non_empty(record.name);
        self.country_iso = non_empty(record.iso_code);
        self.country_eu = record.is_eu;
    }

    /// Copy city fields from a provider record
    pub fn apply_city(&mut self, record: CityRecord) {
        self.city = non_empty(record.name);
        self.region_name = non_empty(record.region_name);
        self.region_code = non_empty(record.region_code);
        self.metro_code = record.metro_code.filter(|code| *code > 0);
        self.postal_code = non_empty(record.postal_code);
        self.latitude = record.latitude.filter(|v| !v.is_nan());
        self.longitude = record.longitude.filter(|v| !v.is_nan());
        self.timezone = non_empty(record.timezone);
    }

    /// Copy autonomous system fields from a provider record
    pub fn apply_asn(&mut self, record: AsnRecord) {
        self.asn = record.label();
        self.asn_org = non_empty(record.organization);
    }

    /// Set the reverse hostname, dropping a trailing root dot
    pub fn apply_hostname(&mut self, name: &str) {
        let name = name.trim_end_matches('.');
        self.hostname = (!name.is_empty()).then(|| name.to_string());
    }

    /// Attach the request-scoped client descriptor
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: Option<UserAgent>) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Address as an unsigned integer.
///
/// IPv4-mapped IPv6 addresses use the 4-byte IPv4 form.
#[must_use]
pub fn to_decimal(ip: IpAddr) -> u128 {
    match ip.to_canonical() {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
