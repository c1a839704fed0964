//! Error types for flowkey core
//!
//! Raw-packet construction is the only fallible operation in this crate.
//! Every failure surfaces as [`Error::MalformedPacket`], with the concrete
//! reason carried as its source.

use snafu::prelude::*;

/// Result type alias for operations using snafu error handling
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core error type for flowkey operations
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
	/// The buffer does not hold a usable IPv4/IPv6 + TCP packet
	#[snafu(display("Malformed packet: {source}"))]
	MalformedPacket { source: Malformed },
}

impl Error {
	/// Whether the packet was rejected as malformed.
	pub fn is_malformed(&self) -> bool { matches!(self, Error::MalformedPacket { .. }) }

	/// The reason the packet was rejected.
	pub fn reason(&self) -> &Malformed {
		match self {
			Error::MalformedPacket { source } => source,
		}
	}
}

/// Why a buffer could not be turned into a flow
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Malformed {
	/// Buffer shorter than the smallest header at this layer
	#[snafu(display("{len} bytes is too short for a {layer} header (need {min})"))]
	Truncated {
		layer: &'static str,
		len: usize,
		min: usize,
	},

	/// Leading nibble is neither 4 nor 6
	#[snafu(display("unsupported IP version {version}"))]
	UnknownVersion { version: u8 },

	/// IPv4 header failed validation
	#[snafu(display("invalid IPv4 header: {source}"))]
	Ipv4 {
		source: etherparse::err::ipv4::SliceError,
	},

	/// IPv6 header or extension chain failed validation
	#[snafu(display("invalid IPv6 header: {source}"))]
	Ipv6 {
		source: etherparse::err::ipv6::SliceError,
	},

	/// IPv6 payload length of zero (jumbogram or bogus header)
	#[snafu(display("IPv6 payload length is zero"))]
	ZeroPayloadLength,

	/// Network layer announces a transport other than TCP
	#[snafu(display("next protocol {protocol} is not TCP"))]
	NotTcp { protocol: u8 },

	/// Fragment that may not start with the TCP header
	#[snafu(display("fragmented payload without a leading TCP header"))]
	Fragmented,

	/// TCP header truncated or with an invalid data offset
	#[snafu(display("invalid TCP header: {source}"))]
	Tcp {
		source: etherparse::err::tcp::HeaderSliceError,
	},

	/// Input the link-layer slicer could not make sense of
	#[snafu(display("failed to slice packet: {source}"))]
	Sliced {
		source: etherparse::err::packet::SliceError,
	},

	/// Decoded packet lacks a network or TCP layer
	#[snafu(display("missing {layer} layer"))]
	MissingLayer { layer: &'static str },

	/// Failure reported by a caller-supplied decoder
	#[snafu(display("decoder failed: {source}"))]
	Backend {
		source: Box<dyn std::error::Error + Send + Sync>,
	},
}

impl Malformed {
	/// Short stable label, for counting rejects by reason.
	pub fn kind(&self) -> &'static str {
		match self {
			Malformed::Truncated { .. } => "truncated",
			Malformed::UnknownVersion { .. } => "unknown-version",
			Malformed::Ipv4 { .. } => "bad-ipv4",
			Malformed::Ipv6 { .. } | Malformed::ZeroPayloadLength => "bad-ipv6",
			Malformed::NotTcp { .. } => "not-tcp",
			Malformed::Fragmented => "fragment",
			Malformed::Tcp { .. } => "bad-tcp",
			Malformed::Sliced { .. } => "bad-frame",
			Malformed::MissingLayer { .. } => "missing-layer",
			Malformed::Backend { .. } => "decoder",
		}
	}
}
