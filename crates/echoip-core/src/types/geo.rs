use serde::{Deserialize, Serialize};

/// Country attribution for an address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    /// English country name
    #[serde(default)]
    pub name: Option<String>,

    /// Two-letter country code (ISO 3166-1 alpha-2)
    #[serde(default)]
    pub iso_code: Option<String>,

    /// Whether the country is a member of the European Union
    #[serde(default)]
    pub is_eu: Option<bool>,
}

/// City-level attribution for an address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    /// English city name
    #[serde(default)]
    pub name: Option<String>,

    /// First subdivision (state/region) name
    #[serde(default)]
    pub region_name: Option<String>,

    /// First subdivision ISO code
    #[serde(default)]
    pub region_code: Option<String>,

    /// Metro code (US locations only)
    #[serde(default)]
    pub metro_code: Option<u16>,

    /// Postal/ZIP code
    #[serde(default)]
    pub postal_code: Option<String>,

    /// Latitude coordinate
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Longitude coordinate
    #[serde(default)]
    pub longitude: Option<f64>,

    /// IANA time zone name
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Autonomous system attribution for an address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnRecord {
    /// Autonomous system number
    #[serde(default)]
    pub number: Option<u32>,

    /// Organization operating the autonomous system
    #[serde(default)]
    pub organization: Option<String>,
}

impl AsnRecord {
    /// The AS number in `AS<n>` notation, if known and non-zero
    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.number.filter(|n| *n > 0).map(|n| format!("AS{n}"))
    }
}
