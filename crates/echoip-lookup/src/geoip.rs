//! MaxMind GeoIP2/GeoLite2 database provider.

use async_trait::async_trait;
use echoip_core::{AsnRecord, CityRecord, CountryRecord};
use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{LookupError, LookupResult};
use crate::provider::{AsnLookup, CityLookup, CountryLookup};

/// An opened `.mmdb` database.
///
/// One type serves the country, city and ASN lookups; which of them return
/// data depends on the edition of the file that was opened.
pub struct GeoIpDatabase {
    reader: Reader<Vec<u8>>,
    path: PathBuf,
}

impl GeoIpDatabase {
    /// Read a database file into memory
    pub fn open(path: impl AsRef<Path>) -> LookupResult<Self> {
        let path = path.as_ref();
        let reader = Reader::open_readfile(path)
            .map_err(|e| LookupError::Database(format!("{}: {e}", path.display())))?;

        info!(
            path = %path.display(),
            database_type = %reader.metadata.database_type,
            build_epoch = reader.metadata.build_epoch,
            "opened GeoIP database"
        );

        Ok(Self {
            reader,
            path: path.to_path_buf(),
        })
    }

    /// Path the database was loaded from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for GeoIpDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoIpDatabase")
            .field("path", &self.path)
            .field("database_type", &self.reader.metadata.database_type)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CountryLookup for GeoIpDatabase {
    async fn country(&self, ip: IpAddr) -> LookupResult<CountryRecord> {
        let record: geoip2::Country = self.reader.lookup(ip).map_err(map_error)?;
        Ok(country_record(&record))
    }
}

#[async_trait]
impl CityLookup for GeoIpDatabase {
    async fn city(&self, ip: IpAddr) -> LookupResult<CityRecord> {
        let record: geoip2::City = self.reader.lookup(ip).map_err(map_error)?;
        Ok(city_record(&record))
    }
}

#[async_trait]
impl AsnLookup for GeoIpDatabase {
    async fn asn(&self, ip: IpAddr) -> LookupResult<AsnRecord> {
        let record: geoip2::Asn = self.reader.lookup(ip).map_err(map_error)?;
        Ok(AsnRecord {
            number: record.autonomous_system_number.filter(|n| *n > 0),
            organization: record
                .autonomous_system_organization
                .filter(|org| !org.is_empty())
                .map(str::to_string),
        })
    }
}

/// Country fields, falling back to the registered country when the located
/// one is unknown. The EU flag is set if either of them is in the EU.
fn country_record(record: &geoip2::Country) -> CountryRecord {
    let country = record.country.as_ref();
    let registered = record.registered_country.as_ref();

    let name = country
        .and_then(|c| english(c.names.as_ref()))
        .or_else(|| registered.and_then(|c| english(c.names.as_ref())));
    let iso_code = country
        .and_then(|c| c.iso_code)
        .or_else(|| registered.and_then(|c| c.iso_code))
        .filter(|code| !code.is_empty())
        .map(str::to_string);
    let is_eu = country.and_then(|c| c.is_in_european_union).unwrap_or(false)
        || registered.and_then(|c| c.is_in_european_union).unwrap_or(false);

    CountryRecord {
        name,
        iso_code,
        is_eu: Some(is_eu),
    }
}

/// City fields. The region is the first subdivision; metro codes are only
/// kept for US locations.
fn city_record(record: &geoip2::City) -> CityRecord {
    let mut city = CityRecord {
        name: record.city.as_ref().and_then(|c| english(c.names.as_ref())),
        ..Default::default()
    };

    if let Some(subdivision) = record.subdivisions.as_ref().and_then(|s| s.first()) {
        city.region_name = english(subdivision.names.as_ref());
        city.region_code = subdivision.iso_code.map(str::to_string);
    }

    let country_iso = record.country.as_ref().and_then(|c| c.iso_code);
    if let Some(location) = record.location.as_ref() {
        city.latitude = location.latitude.filter(|v| !v.is_nan());
        city.longitude = location.longitude.filter(|v| !v.is_nan());
        city.timezone = location.time_zone.map(str::to_string);
        if country_iso == Some("US") {
            city.metro_code = location.metro_code.filter(|code| *code > 0);
        }
    }

    city.postal_code = record
        .postal
        .as_ref()
        .and_then(|p| p.code)
        .map(str::to_string);

    city
}

fn english(names: Option<&BTreeMap<&str, &str>>) -> Option<String> {
    names
        .and_then(|n| n.get("en"))
        .filter(|name| !name.is_empty())
        .map(|name| (*name).to_string())
}

fn map_error(err: MaxMindDBError) -> LookupError {
    match err {
        MaxMindDBError::AddressNotFoundError(_) => LookupError::NotFound,
        other => LookupError::Database(other.to_string()),
    }
}
