//! Directed TCP/IP conversation flows.
//!
//! [`ConversationFlow`] pairs a network flow with a transport flow taken from
//! the same packet. Two equality relations live side by side:
//!
//! - [`ConversationFlow::same_direction`] (also `==`) is order-sensitive and
//!   answers "is this the exact same packet direction".
//! - [`ConversationFlow::same_conversation`] compares canonical keys and
//!   treats a flow and its reverse as equal.

use std::cmp::Ordering;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use snafu::ResultExt;

use crate::decode::{EtherparseDecoder, HeaderDecoder};
use crate::error::{self, Malformed, MalformedPacketSnafu};
use crate::key::{AddressFamily, CanonicalKey};
use crate::network::{DirectedNetworkFlow, FlowAddress, NetworkFlow};
use crate::transport::DirectedTransportFlow;

/// One direction of one TCP conversation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ConversationFlow<A> {
	network: DirectedNetworkFlow<A>,
	transport: DirectedTransportFlow,
}

pub type Ipv4ConversationFlow = ConversationFlow<Ipv4Addr>;
pub type Ipv6ConversationFlow = ConversationFlow<Ipv6Addr>;

impl<A: FlowAddress> ConversationFlow<A> {
	/// Compose a flow from its two layers.
	///
	/// Both layers are expected to come from the same packet. Nothing checks
	/// this, which also lets callers synthesize a flow for a lookup.
	pub fn new(network: DirectedNetworkFlow<A>, transport: DirectedTransportFlow) -> Self {
		Self { network, transport }
	}

	/// Shorthand for `new` from raw endpoints.
	pub fn from_endpoints(src: A, src_port: u16, dst: A, dst_port: u16) -> Self {
		Self::new(
			DirectedNetworkFlow::new(src, dst),
			DirectedTransportFlow::new(src_port, dst_port),
		)
	}

	pub fn flows(&self) -> (DirectedNetworkFlow<A>, DirectedTransportFlow) { (self.network, self.transport) }

	pub fn network(&self) -> &DirectedNetworkFlow<A> { &self.network }

	pub fn transport(&self) -> &DirectedTransportFlow { &self.transport }

	/// The opposite direction of the same conversation. Both layers are
	/// swapped together.
	#[must_use]
	pub fn reverse(&self) -> Self {
		Self {
			network: self.network.reverse(),
			transport: self.transport.reverse(),
		}
	}

	/// Whether the flow already runs from the canonical "first" endpoint.
	///
	/// The smaller address is first; equal addresses defer to the smaller
	/// port. A flow whose endpoints are identical on both layers is its own
	/// reverse and counts as canonical.
	pub fn is_canonical(&self) -> bool {
		match self.network.src().cmp(&self.network.dst()) {
			Ordering::Less => true,
			Ordering::Greater => false,
			Ordering::Equal => self.transport.src() <= self.transport.dst(),
		}
	}

	/// This flow or its reverse, whichever is canonical.
	#[must_use]
	pub fn canonical(&self) -> Self {
		if self.is_canonical() {
			*self
		} else {
			self.reverse()
		}
	}

	/// Direction-independent key: equal for a flow and its reverse, distinct
	/// for every other conversation of the same family.
	pub fn canonical_key(&self) -> A::Key {
		let c = self.canonical();
		A::key(c.network.src(), c.network.dst(), c.transport.src(), c.transport.dst())
	}

	/// Order-sensitive equality, the same relation as `==`.
	pub fn same_direction(&self, other: &Self) -> bool { self == other }

	/// Order-insensitive equality: true for `other == self` and for
	/// `other == self.reverse()`.
	pub fn same_conversation(&self, other: &Self) -> bool { self.canonical_key() == other.canonical_key() }
}

impl<A: FlowAddress> fmt::Display for ConversationFlow<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}:{}-{}:{}",
			self.network.src(),
			self.transport.src(),
			self.network.dst(),
			self.transport.dst()
		)
	}
}

/// A conversation flow of either address family.
///
/// This is what raw-packet construction yields, since the family is only
/// known after reading the version nibble.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum TcpIpFlow {
	V4(Ipv4ConversationFlow),
	V6(Ipv6ConversationFlow),
}

impl TcpIpFlow {
	/// Build a flow from a raw IPv4/IPv6 packet carrying TCP.
	///
	/// # Errors
	///
	/// Returns [`Error::MalformedPacket`](crate::Error::MalformedPacket) when
	/// the buffer is too short, is not TCP, or its length fields disagree
	/// with the buffer.
	pub fn from_packet(packet: &[u8]) -> crate::Result<Self> { Self::from_packet_with(&EtherparseDecoder, packet) }

	/// Like [`TcpIpFlow::from_packet`], decoding headers with `decoder`.
	///
	/// # Errors
	///
	/// Returns [`Error::MalformedPacket`](crate::Error::MalformedPacket)
	/// wrapping whatever the decoder reported.
	pub fn from_packet_with<D>(decoder: &D, packet: &[u8]) -> crate::Result<Self>
	where
		D: HeaderDecoder + ?Sized,
	{
		let layer = decoder.decode_network(packet).context(MalformedPacketSnafu)?;
		let transport = decoder.decode_tcp(layer.segment).context(MalformedPacketSnafu)?;
		Ok(Self::compose(layer.flow, transport))
	}

	/// Build a flow from a packet already sliced by `etherparse`.
	///
	/// # Errors
	///
	/// Returns [`Error::MalformedPacket`](crate::Error::MalformedPacket) when
	/// the slice has no IP layer or no TCP layer.
	pub fn from_sliced(sliced: &SlicedPacket<'_>) -> crate::Result<Self> {
		let network = match &sliced.net {
			Some(NetSlice::Ipv4(ip)) => NetworkFlow::V4(DirectedNetworkFlow::new(
				ip.header().source_addr(),
				ip.header().destination_addr(),
			)),
			Some(NetSlice::Ipv6(ip)) => NetworkFlow::V6(DirectedNetworkFlow::new(
				ip.header().source_addr(),
				ip.header().destination_addr(),
			)),
			_ => return missing_layer("IP"),
		};
		let transport = match &sliced.transport {
			Some(TransportSlice::Tcp(tcp)) => DirectedTransportFlow::new(tcp.source_port(), tcp.destination_port()),
			_ => return missing_layer("TCP"),
		};
		Ok(Self::compose(network, transport))
	}

	/// Build a flow from an Ethernet II frame (VLAN tags are skipped).
	///
	/// # Errors
	///
	/// Returns [`Error::MalformedPacket`](crate::Error::MalformedPacket) when
	/// the frame cannot be sliced or carries no IP + TCP layers.
	pub fn from_ethernet(frame: &[u8]) -> crate::Result<Self> {
		let sliced = SlicedPacket::from_ethernet(frame)
			.context(error::SlicedSnafu)
			.context(MalformedPacketSnafu)?;
		Self::from_sliced(&sliced)
	}

	fn compose(network: NetworkFlow, transport: DirectedTransportFlow) -> Self {
		match network {
			NetworkFlow::V4(network) => TcpIpFlow::V4(ConversationFlow::new(network, transport)),
			NetworkFlow::V6(network) => TcpIpFlow::V6(ConversationFlow::new(network, transport)),
		}
	}

	pub fn family(&self) -> AddressFamily {
		match self {
			TcpIpFlow::V4(_) => AddressFamily::Ipv4,
			TcpIpFlow::V6(_) => AddressFamily::Ipv6,
		}
	}

	pub fn network(&self) -> NetworkFlow {
		match self {
			TcpIpFlow::V4(flow) => NetworkFlow::V4(*flow.network()),
			TcpIpFlow::V6(flow) => NetworkFlow::V6(*flow.network()),
		}
	}

	pub fn flows(&self) -> (NetworkFlow, DirectedTransportFlow) { (self.network(), *self.transport()) }

	pub fn transport(&self) -> &DirectedTransportFlow {
		match self {
			TcpIpFlow::V4(flow) => flow.transport(),
			TcpIpFlow::V6(flow) => flow.transport(),
		}
	}

	#[must_use]
	pub fn reverse(&self) -> Self {
		match self {
			TcpIpFlow::V4(flow) => TcpIpFlow::V4(flow.reverse()),
			TcpIpFlow::V6(flow) => TcpIpFlow::V6(flow.reverse()),
		}
	}

	pub fn is_canonical(&self) -> bool {
		match self {
			TcpIpFlow::V4(flow) => flow.is_canonical(),
			TcpIpFlow::V6(flow) => flow.is_canonical(),
		}
	}

	pub fn canonical_key(&self) -> CanonicalKey {
		match self {
			TcpIpFlow::V4(flow) => CanonicalKey::V4(flow.canonical_key()),
			TcpIpFlow::V6(flow) => CanonicalKey::V6(flow.canonical_key()),
		}
	}

	pub fn same_direction(&self, other: &Self) -> bool { self == other }

	/// Flows of different families are never the same conversation.
	pub fn same_conversation(&self, other: &Self) -> bool { self.canonical_key() == other.canonical_key() }
}

fn missing_layer(layer: &'static str) -> crate::Result<TcpIpFlow> {
	Err(Malformed::MissingLayer { layer }).context(MalformedPacketSnafu)
}

impl From<Ipv4ConversationFlow> for TcpIpFlow {
	fn from(flow: Ipv4ConversationFlow) -> Self { TcpIpFlow::V4(flow) }
}

impl From<Ipv6ConversationFlow> for TcpIpFlow {
	fn from(flow: Ipv6ConversationFlow) -> Self { TcpIpFlow::V6(flow) }
}

impl fmt::Display for TcpIpFlow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TcpIpFlow::V4(flow) => flow.fmt(f),
			TcpIpFlow::V6(flow) => flow.fmt(f),
		}
	}
}
