//! Canonical conversation keys.
//!
//! A key is the fixed-width byte layout of an ordered 4-tuple:
//!
//! ```text
//! | first addr | second addr | first port (BE) | second port (BE) |
//! ```
//!
//! "First" is the endpoint with the smaller address, or the smaller port when
//! both addresses are equal. The layout is lossless, so two keys are equal
//! exactly when they describe the same conversation. IPv4 and IPv6 keys are
//! distinct types and never compare equal, even inside [`CanonicalKey`].

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::constants::{IPV4_KEY_LEN, IPV6_KEY_LEN};

/// Which address width a flow or key belongs to
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum AddressFamily {
	Ipv4,
	Ipv6,
}

impl fmt::Display for AddressFamily {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AddressFamily::Ipv4 => f.write_str("IPv4"),
			AddressFamily::Ipv6 => f.write_str("IPv6"),
		}
	}
}

/// Canonical key for an IPv4 conversation
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ipv4Key([u8; IPV4_KEY_LEN]);

/// Canonical key for an IPv6 conversation
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ipv6Key([u8; IPV6_KEY_LEN]);

impl Ipv4Key {
	pub(crate) fn new(first: Ipv4Addr, second: Ipv4Addr, first_port: u16, second_port: u16) -> Self {
		let mut buf = [0u8; IPV4_KEY_LEN];
		buf[0..4].copy_from_slice(&first.octets());
		buf[4..8].copy_from_slice(&second.octets());
		buf[8..10].copy_from_slice(&first_port.to_be_bytes());
		buf[10..12].copy_from_slice(&second_port.to_be_bytes());
		Self(buf)
	}

	pub fn from_bytes(bytes: [u8; IPV4_KEY_LEN]) -> Self { Self(bytes) }

	pub fn as_bytes(&self) -> &[u8; IPV4_KEY_LEN] { &self.0 }

	/// Ordered `(first addr, second addr, first port, second port)`.
	pub fn endpoints(&self) -> (Ipv4Addr, Ipv4Addr, u16, u16) {
		let b = &self.0;
		(
			Ipv4Addr::new(b[0], b[1], b[2], b[3]),
			Ipv4Addr::new(b[4], b[5], b[6], b[7]),
			u16::from_be_bytes([b[8], b[9]]),
			u16::from_be_bytes([b[10], b[11]]),
		)
	}
}

impl Ipv6Key {
	pub(crate) fn new(first: Ipv6Addr, second: Ipv6Addr, first_port: u16, second_port: u16) -> Self {
		let mut buf = [0u8; IPV6_KEY_LEN];
		buf[0..16].copy_from_slice(&first.octets());
		buf[16..32].copy_from_slice(&second.octets());
		buf[32..34].copy_from_slice(&first_port.to_be_bytes());
		buf[34..36].copy_from_slice(&second_port.to_be_bytes());
		Self(buf)
	}

	pub fn from_bytes(bytes: [u8; IPV6_KEY_LEN]) -> Self { Self(bytes) }

	pub fn as_bytes(&self) -> &[u8; IPV6_KEY_LEN] { &self.0 }

	/// Ordered `(first addr, second addr, first port, second port)`.
	pub fn endpoints(&self) -> (Ipv6Addr, Ipv6Addr, u16, u16) {
		let b = &self.0;
		let mut first = [0u8; 16];
		let mut second = [0u8; 16];
		first.copy_from_slice(&b[0..16]);
		second.copy_from_slice(&b[16..32]);
		(
			Ipv6Addr::from(first),
			Ipv6Addr::from(second),
			u16::from_be_bytes([b[32], b[33]]),
			u16::from_be_bytes([b[34], b[35]]),
		)
	}
}

impl fmt::Debug for Ipv4Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (a, b, pa, pb) = self.endpoints();
		write!(f, "Ipv4Key({a}:{pa}<->{b}:{pb})")
	}
}

impl fmt::Debug for Ipv6Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (a, b, pa, pb) = self.endpoints();
		write!(f, "Ipv6Key([{a}]:{pa}<->[{b}]:{pb})")
	}
}

/// Direction-independent key of either family.
///
/// Tables holding conversations of both families key on this type; the
/// variant keeps the two key spaces apart.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum CanonicalKey {
	V4(Ipv4Key),
	V6(Ipv6Key),
}

impl CanonicalKey {
	pub fn family(&self) -> AddressFamily {
		match self {
			CanonicalKey::V4(_) => AddressFamily::Ipv4,
			CanonicalKey::V6(_) => AddressFamily::Ipv6,
		}
	}

	/// Raw key bytes, 12 for IPv4 and 36 for IPv6.
	pub fn as_bytes(&self) -> &[u8] {
		match self {
			CanonicalKey::V4(key) => key.as_bytes(),
			CanonicalKey::V6(key) => key.as_bytes(),
		}
	}

	/// Bucket index in `0..shards` for fixed-size tables or worker pools.
	///
	/// Both directions of a conversation land on the same index. Returns 0
	/// when `shards` is 0.
	pub fn shard(&self, shards: usize) -> usize {
		let mut hasher = DefaultHasher::new();
		self.hash(&mut hasher);
		(hasher.finish() as usize).checked_rem(shards).unwrap_or(0)
	}
}

impl From<Ipv4Key> for CanonicalKey {
	fn from(key: Ipv4Key) -> Self { CanonicalKey::V4(key) }
}

impl From<Ipv6Key> for CanonicalKey {
	fn from(key: Ipv6Key) -> Self { CanonicalKey::V6(key) }
}

impl fmt::Display for CanonicalKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CanonicalKey::V4(key) => {
				let (a, b, pa, pb) = key.endpoints();
				write!(f, "{a}:{pa}<->{b}:{pb}")
			}
			CanonicalKey::V6(key) => {
				let (a, b, pa, pb) = key.endpoints();
				write!(f, "[{a}]:{pa}<->[{b}]:{pb}")
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ipv4_layout() {
		let key = Ipv4Key::new(Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::new(2, 3, 4, 5), 1, 0x0102);
		assert_eq!(key.as_bytes(), &[1, 2, 3, 4, 2, 3, 4, 5, 0, 1, 1, 2]);
		assert_eq!(
			key.endpoints(),
			(Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::new(2, 3, 4, 5), 1, 0x0102)
		);
	}

	#[test]
	fn test_ipv6_layout() {
		let a = Ipv6Addr::LOCALHOST;
		let b: Ipv6Addr = "2001:db8::1".parse().unwrap();
		let key = Ipv6Key::new(a, b, 443, 51000);
		let bytes = key.as_bytes();
		assert_eq!(bytes.len(), 36);
		assert_eq!(&bytes[0..16], &a.octets());
		assert_eq!(&bytes[16..32], &b.octets());
		assert_eq!(&bytes[32..34], &443u16.to_be_bytes());
		assert_eq!(&bytes[34..36], &51000u16.to_be_bytes());
		assert_eq!(Ipv6Key::from_bytes(*bytes), key);
	}

	#[test]
	fn test_families_never_equal() {
		// ::ffff:1.2.3.4 embeds the same IPv4 octets, still a different key space
		let v4 = CanonicalKey::from(Ipv4Key::new(Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::new(2, 3, 4, 5), 1, 2));
		let v6 = CanonicalKey::from(Ipv6Key::new(
			Ipv4Addr::new(1, 2, 3, 4).to_ipv6_mapped(),
			Ipv4Addr::new(2, 3, 4, 5).to_ipv6_mapped(),
			1,
			2,
		));
		assert_ne!(v4, v6);
		assert_eq!(v4.family(), AddressFamily::Ipv4);
		assert_eq!(v6.family(), AddressFamily::Ipv6);
	}

	#[test]
	fn test_shard_bounds() {
		let key = CanonicalKey::from(Ipv4Key::new(Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::new(2, 3, 4, 5), 1, 2));
		assert_eq!(key.shard(0), 0);
		assert_eq!(key.shard(1), 0);
		for n in 1..32 {
			assert!(key.shard(n) < n);
		}
	}
}
