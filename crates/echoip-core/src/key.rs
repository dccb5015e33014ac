//! Fixed-width cache keys for network addresses.

use std::net::IpAddr;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit cache key derived from the octets of an address.
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are canonicalised to their
/// IPv4 form first, so both spellings of one address land on the same key.
///
/// Keys are a non-cryptographic hash. Two distinct addresses may collide, in
/// which case the cache treats them as the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressKey(u64);

impl AddressKey {
    /// Derive the key for an address
    #[must_use]
    pub fn of(ip: IpAddr) -> Self {
        match ip.to_canonical() {
            IpAddr::V4(v4) => Self(fnv1a(&v4.octets())),
            IpAddr::V6(v6) => Self(fnv1a(&v6.octets())),
        }
    }
}

/// FNV-1a over a byte slice.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_fnv1a_reference_vectors() {
        assert_eq!(fnv1a(b""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(AddressKey::of(ip("192.0.2.1")), AddressKey::of(ip("192.0.2.1")));
        assert_eq!(
            AddressKey::of(ip("2001:db8::1")),
            AddressKey::of(ip("2001:db8::1"))
        );
    }

    #[test]
    fn test_key_hashes_raw_octets() {
        assert_eq!(AddressKey::of(ip("192.0.2.1")).0, fnv1a(&[192, 0, 2, 1]));
    }

    #[test]
    fn test_distinct_addresses_differ() {
        assert_ne!(AddressKey::of(ip("192.0.2.1")), AddressKey::of(ip("192.0.2.2")));
        assert_ne!(AddressKey::of(ip("192.0.2.1")), AddressKey::of(ip("2001:db8::1")));
    }

    #[test]
    fn test_ipv4_mapped_shares_key() {
        assert_eq!(
            AddressKey::of(ip("::ffff:203.0.113.7")),
            AddressKey::of(ip("203.0.113.7"))
        );
        // IPv4-compatible (deprecated) form is not mapped and stays distinct.
        assert_ne!(AddressKey::of(ip("::203.0.113.7")), AddressKey::of(ip("203.0.113.7")));
    }
}
