//! Reverse DNS resolution.

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

use crate::error::{LookupError, LookupResult};
use crate::provider::HostnameLookup;

/// Default time allowed for one reverse lookup
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(2);

/// Reverse hostname provider backed by hickory
pub struct DnsHostname {
    resolver: TokioResolver,
    timeout: Duration,
}

impl DnsHostname {
    /// Create a resolver from the system configuration.
    ///
    /// Falls back to hickory's default upstreams when the system
    /// configuration cannot be read.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let builder = TokioResolver::builder_tokio().unwrap_or_else(|e| {
            debug!(error = %e, "system resolver config unavailable, using defaults");
            TokioResolver::builder_with_config(
                ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
        });

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: builder.with_options(opts).build(),
            timeout,
        }
    }
}

impl Default for DnsHostname {
    fn default() -> Self {
        Self::new(DEFAULT_DNS_TIMEOUT)
    }
}

impl std::fmt::Debug for DnsHostname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsHostname")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HostnameLookup for DnsHostname {
    async fn hostname(&self, ip: IpAddr) -> LookupResult<String> {
        let response = tokio::time::timeout(self.timeout, self.resolver.reverse_lookup(ip))
            .await
            .map_err(|_| LookupError::Timeout)?
            .map_err(|e| LookupError::Dns(e.to_string()))?;

        response
            .iter()
            .map(|name| unrooted(&name.to_string()))
            .find(|name| !name.is_empty())
            .ok_or(LookupError::NotFound)
    }
}

/// Strip the trailing root label dot from a DNS name
fn unrooted(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}
