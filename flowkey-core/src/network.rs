//! Network-layer directed flows.
//!
//! A [`DirectedNetworkFlow`] is generic over [`FlowAddress`], which is sealed
//! and implemented only for [`Ipv4Addr`] and [`Ipv6Addr`]. Mixing families in
//! one flow is therefore unrepresentable.

use std::fmt;
use std::hash::Hash;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::key::{AddressFamily, Ipv4Key, Ipv6Key};

mod sealed {
	pub trait Sealed {}
	impl Sealed for std::net::Ipv4Addr {}
	impl Sealed for std::net::Ipv6Addr {}
}

/// An address family usable as a flow endpoint.
///
/// `Ord` on both implementors is the lexicographic order of the octets, which
/// is the total order canonicalization relies on.
pub trait FlowAddress: sealed::Sealed + Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display {
	/// Fixed-width canonical key for conversations of this family
	type Key: Copy + Eq + Ord + Hash + fmt::Debug;

	/// Family tag
	const FAMILY: AddressFamily;

	/// Lay out an already-ordered tuple as this family's key.
	fn key(first: Self, second: Self, first_port: u16, second_port: u16) -> Self::Key;
}

impl FlowAddress for Ipv4Addr {
	type Key = Ipv4Key;

	const FAMILY: AddressFamily = AddressFamily::Ipv4;

	fn key(first: Self, second: Self, first_port: u16, second_port: u16) -> Ipv4Key {
		Ipv4Key::new(first, second, first_port, second_port)
	}
}

impl FlowAddress for Ipv6Addr {
	type Key = Ipv6Key;

	const FAMILY: AddressFamily = AddressFamily::Ipv6;

	fn key(first: Self, second: Self, first_port: u16, second_port: u16) -> Ipv6Key {
		Ipv6Key::new(first, second, first_port, second_port)
	}
}

/// Ordered (source, destination) pair of network addresses.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct DirectedNetworkFlow<A> {
	src: A,
	dst: A,
}

pub type Ipv4NetworkFlow = DirectedNetworkFlow<Ipv4Addr>;
pub type Ipv6NetworkFlow = DirectedNetworkFlow<Ipv6Addr>;

impl<A: FlowAddress> DirectedNetworkFlow<A> {
	pub fn new(src: A, dst: A) -> Self { Self { src, dst } }

	pub fn src(&self) -> A { self.src }

	pub fn dst(&self) -> A { self.dst }

	/// Same pair with source and destination swapped.
	#[must_use]
	pub fn reverse(&self) -> Self {
		Self {
			src: self.dst,
			dst: self.src,
		}
	}
}

impl<A: FlowAddress> fmt::Display for DirectedNetworkFlow<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}->{}", self.src, self.dst) }
}

/// Network flow of either family, as produced by a decoder.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum NetworkFlow {
	V4(Ipv4NetworkFlow),
	V6(Ipv6NetworkFlow),
}

impl NetworkFlow {
	pub fn family(&self) -> AddressFamily {
		match self {
			NetworkFlow::V4(_) => AddressFamily::Ipv4,
			NetworkFlow::V6(_) => AddressFamily::Ipv6,
		}
	}
}

impl From<Ipv4NetworkFlow> for NetworkFlow {
	fn from(flow: Ipv4NetworkFlow) -> Self { NetworkFlow::V4(flow) }
}

impl From<Ipv6NetworkFlow> for NetworkFlow {
	fn from(flow: Ipv6NetworkFlow) -> Self { NetworkFlow::V6(flow) }
}
