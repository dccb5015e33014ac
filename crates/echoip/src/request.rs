//! Per-request inputs and client address extraction.

use echoip_core::{EchoipError, Result, UserAgent};
use std::net::{IpAddr, SocketAddr};

const FORWARDED_FOR: &str = "X-Forwarded-For";
const USER_AGENT: &str = "User-Agent";

/// What the pipeline needs to know about one inbound request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    query_ip: Option<String>,
    headers: Vec<(String, String)>,
    peer: Option<SocketAddr>,
}

impl RequestContext {
    /// Create a context for a connection from `peer`
    #[must_use]
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer: Some(peer),
            ..Self::default()
        }
    }

    /// Set the `ip` query parameter
    #[must_use]
    pub fn with_query_ip(mut self, ip: impl Into<String>) -> Self {
        self.query_ip = Some(ip.into());
        self
    }

    /// Add a request header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the `User-Agent` header
    #[must_use]
    pub fn with_user_agent(self, value: impl Into<String>) -> Self {
        self.with_header(USER_AGENT, value)
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Transport-level peer address
    pub const fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Client software descriptor from the `User-Agent` header
    pub fn user_agent(&self) -> Option<UserAgent> {
        UserAgent::from_header(self.header(USER_AGENT))
    }

    /// Determine the client address.
    ///
    /// Precedence: the `ip` query parameter (when `allow_query` is set), then
    /// the first non-empty header in `trusted_headers`, then the peer address.
    /// Only the first entry of `X-Forwarded-For` is considered.
    pub fn client_address(&self, trusted_headers: &[String], allow_query: bool) -> Result<IpAddr> {
        let candidate = allow_query
            .then(|| self.query_ip.as_deref())
            .flatten()
            .filter(|v| !v.is_empty())
            .or_else(|| {
                trusted_headers
                    .iter()
                    .filter_map(|name| self.trusted_value(name))
                    .find(|v| !v.is_empty())
            });

        match candidate {
            Some(value) => value
                .parse()
                .map_err(|_| EchoipError::InvalidAddress(format!("could not parse IP: {value}"))),
            None => self
                .peer
                .map(|peer| peer.ip())
                .ok_or_else(|| EchoipError::InvalidAddress("no client address available".into())),
        }
    }

    fn trusted_value(&self, name: &str) -> Option<&str> {
        let value = self.header(name)?;
        let value = if name.eq_ignore_ascii_case(FORWARDED_FOR) {
            value.split(',').next().unwrap_or_default()
        } else {
            value
        };
        Some(value.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| (*h).to_string()).collect()
    }

    #[test]
    fn test_client_address_precedence() {
        let trusted = headers(&["X-Real-IP", "X-Forwarded-For"]);
        // (header, value, trusted, query ip, expected)
        let cases: [(&str, &str, &[String], Option<&str>, &str); 10] = [
            ("", "", &[], None, "127.0.0.1"),
            ("X-Real-IP", "1.3.3.7", &[], None, "127.0.0.1"),
            ("X-Real-IP", "1.3.3.7", &headers(&["X-Foo-Bar"]), None, "127.0.0.1"),
            ("X-Real-IP", "1.3.3.7", &trusted, None, "1.3.3.7"),
            ("X-Forwarded-For", "1.3.3.7", &trusted, None, "1.3.3.7"),
            ("X-Forwarded-For", "1.3.3.7,4.2.4.2", &trusted, None, "1.3.3.7"),
            ("X-Forwarded-For", "1.3.3.7, 4.2.4.2", &trusted, None, "1.3.3.7"),
            ("X-Forwarded-For", "", &trusted, None, "127.0.0.1"),
            ("", "", &[], Some("1.2.3.4"), "1.2.3.4"),
            ("X-Forwarded-For", "1.3.3.7,4.2.4.2", &trusted, Some("1.2.3.4"), "1.2.3.4"),
        ];

        for (header, value, trusted, query, expected) in cases {
            let mut ctx = RequestContext::new(peer());
            if !header.is_empty() {
                ctx = ctx.with_header(header, value);
            }
            if let Some(query) = query {
                ctx = ctx.with_query_ip(query);
            }
            let ip = ctx.client_address(trusted, true).unwrap();
            assert_eq!(ip, expected.parse::<IpAddr>().unwrap(), "{header}: {value}");
        }
    }

    #[test]
    fn test_query_override_can_be_disabled() {
        let ctx = RequestContext::new(peer()).with_query_ip("1.2.3.4");
        assert_eq!(
            ctx.client_address(&[], false).unwrap(),
            "127.0.0.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let ctx =
            RequestContext::new(peer()).with_header("x-forwarded-for", "2001:db8::1, 1.1.1.1");
        let ip = ctx
            .client_address(&headers(&["X-Forwarded-For"]), true)
            .unwrap();
        assert_eq!(ip, "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_unparseable_address() {
        let ctx = RequestContext::new(peer()).with_query_ip("not-an-ip");
        let err = ctx.client_address(&[], true).unwrap_err();
        assert!(matches!(err, EchoipError::InvalidAddress(_)));

        let ctx = RequestContext::new(peer()).with_header("X-Real-IP", "999.1.1.1");
        assert!(ctx
            .client_address(&headers(&["X-Real-IP"]), true)
            .is_err());
    }

    #[test]
    fn test_no_address_at_all() {
        let err = RequestContext::default().client_address(&[], true).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_user_agent() {
        let ctx = RequestContext::new(peer()).with_user_agent("curl/8.4.0");
        assert_eq!(ctx.user_agent().unwrap().product, "curl");
        assert!(RequestContext::new(peer()).user_agent().is_none());
    }
}
