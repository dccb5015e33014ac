use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Outcome of a reachability probe against one port of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortCheck {
    /// Address that was probed
    pub ip: IpAddr,
    /// TCP port number
    pub port: u16,
    /// Whether a TCP connection could be established
    pub reachable: bool,
}
