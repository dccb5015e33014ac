//! TCP connect reachability probe.

use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{LookupError, LookupResult};
use crate::provider::PortProbe;

/// Default time allowed for one connection attempt
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Checks reachability by completing a TCP handshake
#[derive(Debug, Clone, Copy)]
pub struct TcpProbe {
    timeout: Duration,
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpProbe {
    /// Create a probe with the default 2 second timeout
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Set the timeout per connection attempt
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl PortProbe for TcpProbe {
    async fn probe(&self, ip: IpAddr, port: u16) -> LookupResult<()> {
        let addr = SocketAddr::new(ip, port);
        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "port probe refused");
                Err(LookupError::Network(e))
            }
            Err(_) => {
                debug!(%addr, "port probe timed out");
                Err(LookupError::Timeout)
            }
        }
    }
}
