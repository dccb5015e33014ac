//! ipstack.com geolocation API provider.

use async_trait::async_trait;
use echoip_core::{AsnRecord, CityRecord, CountryRecord};
use parking_lot::Mutex;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{LookupError, LookupResult};
use crate::provider::{AsnLookup, CityLookup, CountryLookup};

const HTTP_BASE_URL: &str = "http://api.ipstack.com";
const HTTPS_BASE_URL: &str = "https://api.ipstack.com";

/// Default time allowed for one API request
pub const DEFAULT_IPSTACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Country, city and ASN lookups served by the ipstack API.
///
/// The most recent response is kept, so the country, city and ASN lookups
/// for one address cost a single request.
pub struct IpStack {
    http: HttpClient,
    api_key: String,
    base_url: String,
    last: Mutex<Option<(IpAddr, Arc<IpStackResponse>)>>,
}

impl IpStack {
    /// Create a builder for the given access key
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> IpStackBuilder {
        IpStackBuilder::new(api_key)
    }

    async fn fetch(&self, ip: IpAddr) -> LookupResult<Arc<IpStackResponse>> {
        let recent = self
            .last
            .lock()
            .as_ref()
            .filter(|(last_ip, _)| *last_ip == ip)
            .map(|(_, response)| Arc::clone(response));
        if let Some(response) = recent {
            return Ok(response);
        }

        let url = format!("{}/{ip}", self.base_url);
        debug!(%ip, base_url = %self.base_url, "ipstack request");

        let response = self
            .http
            .get(&url)
            .query(&[("access_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(map_http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Api {
                code: status.as_u16(),
                message: status.to_string(),
            });
        }

        let body: IpStackResponse = response.json().await.map_err(map_http)?;
        if let Some(error) = body.error {
            return Err(LookupError::Api {
                code: error.code,
                message: format!("{}: {}", error.kind, error.info),
            });
        }

        let body = Arc::new(body);
        *self.last.lock() = Some((ip, Arc::clone(&body)));
        Ok(body)
    }
}

impl std::fmt::Debug for IpStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpStack")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CountryLookup for IpStack {
    async fn country(&self, ip: IpAddr) -> LookupResult<CountryRecord> {
        let response = self.fetch(ip).await?;
        Ok(CountryRecord {
            name: response.country_name.clone(),
            iso_code: response.country_code.clone(),
            is_eu: response.location.as_ref().and_then(|l| l.is_eu),
        })
    }
}

#[async_trait]
impl CityLookup for IpStack {
    async fn city(&self, ip: IpAddr) -> LookupResult<CityRecord> {
        let response = self.fetch(ip).await?;
        Ok(CityRecord {
            name: response.city.clone(),
            region_name: response.region_name.clone(),
            region_code: response.region_code.clone(),
            metro_code: None,
            postal_code: response.zip.clone(),
            latitude: response.latitude,
            longitude: response.longitude,
            timezone: response.time_zone.as_ref().and_then(|tz| tz.id.clone()),
        })
    }
}

#[async_trait]
impl AsnLookup for IpStack {
    async fn asn(&self, ip: IpAddr) -> LookupResult<AsnRecord> {
        let response = self.fetch(ip).await?;
        // Connection data is only returned on paid plans.
        response
            .connection
            .as_ref()
            .and_then(|c| c.asn)
            .filter(|asn| *asn > 0)
            .map(|asn| AsnRecord {
                number: Some(asn),
                organization: None,
            })
            .ok_or(LookupError::NotFound)
    }
}

/// Builder for configuring an [`IpStack`] provider
#[derive(Debug, Clone)]
pub struct IpStackBuilder {
    api_key: String,
    base_url: Option<String>,
    use_https: bool,
    timeout: Duration,
}

impl IpStackBuilder {
    /// Create a new builder with the given access key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            use_https: false,
            timeout: DEFAULT_IPSTACK_TIMEOUT,
        }
    }

    /// Use the HTTPS endpoint (not available on the free plan)
    #[must_use]
    pub const fn use_https(mut self, enabled: bool) -> Self {
        self.use_https = enabled;
        self
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the provider
    pub fn build(self) -> LookupResult<IpStack> {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(format!("echoip/{}", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| LookupError::Http(e.to_string()))?;

        let base_url = self.base_url.unwrap_or_else(|| {
            if self.use_https {
                HTTPS_BASE_URL.to_string()
            } else {
                HTTP_BASE_URL.to_string()
            }
        });

        Ok(IpStack {
            http,
            api_key: self.api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            last: Mutex::new(None),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpStackResponse {
    country_code: Option<String>,
    country_name: Option<String>,
    region_code: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    zip: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location: Option<LocationInfo>,
    time_zone: Option<TimeZoneInfo>,
    connection: Option<ConnectionInfo>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct LocationInfo {
    is_eu: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TimeZoneInfo {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConnectionInfo {
    asn: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    info: String,
}

fn map_http(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Http(err.to_string())
    }
}
