//! Packet decoding capability.
//!
//! Flow construction never touches header bytes itself. It asks a
//! [`HeaderDecoder`] for the network addresses and the bytes that follow the
//! network header, then for the TCP ports at the start of those bytes.
//! [`EtherparseDecoder`] is the stock backend; anything else implementing the
//! trait can be passed to [`TcpIpFlow::from_packet_with`].
//!
//! [`TcpIpFlow::from_packet_with`]: crate::TcpIpFlow::from_packet_with

use etherparse::{Ipv4Slice, Ipv6Slice, TcpHeaderSlice};
use snafu::{ResultExt, ensure};

use crate::constants::{IP_PROTO_TCP, IPV6_HEADER_LEN, MIN_NETWORK_HEADER_LEN, TCP_MIN_HEADER_LEN};
use crate::error::{self, Malformed};
use crate::network::{DirectedNetworkFlow, NetworkFlow};
use crate::transport::DirectedTransportFlow;

/// Decoded network layer of a packet.
#[derive(Debug, Clone, Copy)]
pub struct NetworkLayer<'a> {
	/// Addresses in the order they appear in the header
	pub flow: NetworkFlow,
	/// Bytes following the network header (and any extension headers)
	pub segment: &'a [u8],
}

/// Typed access to the headers a flow is built from.
pub trait HeaderDecoder {
	/// Decode the IPv4 or IPv6 header at the start of `packet`.
	///
	/// Implementations must reject packets whose next protocol is not TCP.
	fn decode_network<'a>(&self, packet: &'a [u8]) -> Result<NetworkLayer<'a>, Malformed>;

	/// Decode the TCP header at the start of `segment`.
	fn decode_tcp(&self, segment: &[u8]) -> Result<DirectedTransportFlow, Malformed>;
}

/// [`HeaderDecoder`] backed by `etherparse`.
///
/// Length fields are validated against the buffer: an IPv4 IHL below 5, a
/// total length shorter than the header or longer than the buffer, an IPv6
/// payload length of zero or beyond the buffer, or a TCP data offset outside
/// the segment all fail. IPv6 extension headers are walked to find the upper protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct EtherparseDecoder;

impl HeaderDecoder for EtherparseDecoder {
	fn decode_network<'a>(&self, packet: &'a [u8]) -> Result<NetworkLayer<'a>, Malformed> {
		ensure!(
			packet.len() >= MIN_NETWORK_HEADER_LEN,
			error::TruncatedSnafu {
				layer: "network",
				len: packet.len(),
				min: MIN_NETWORK_HEADER_LEN,
			}
		);

		match packet[0] >> 4 {
			4 => decode_ipv4(packet),
			6 => decode_ipv6(packet),
			version => error::UnknownVersionSnafu { version }.fail(),
		}
	}

	fn decode_tcp(&self, segment: &[u8]) -> Result<DirectedTransportFlow, Malformed> {
		ensure!(
			segment.len() >= TCP_MIN_HEADER_LEN,
			error::TruncatedSnafu {
				layer: "TCP",
				len: segment.len(),
				min: TCP_MIN_HEADER_LEN,
			}
		);
		let tcp = TcpHeaderSlice::from_slice(segment).context(error::TcpSnafu)?;
		Ok(DirectedTransportFlow::new(tcp.source_port(), tcp.destination_port()))
	}
}

fn decode_ipv4(packet: &[u8]) -> Result<NetworkLayer<'_>, Malformed> {
	let ip = Ipv4Slice::from_slice(packet).context(error::Ipv4Snafu)?;
	let header = ip.header();

	let protocol = ip.payload().ip_number.0;
	ensure!(protocol == IP_PROTO_TCP, error::NotTcpSnafu { protocol });
	ensure!(header.fragments_offset().value() == 0, error::FragmentedSnafu);

	Ok(NetworkLayer {
		flow: NetworkFlow::V4(DirectedNetworkFlow::new(
			header.source_addr(),
			header.destination_addr(),
		)),
		segment: ip.payload().payload,
	})
}

fn decode_ipv6(packet: &[u8]) -> Result<NetworkLayer<'_>, Malformed> {
	ensure!(
		packet.len() >= IPV6_HEADER_LEN,
		error::TruncatedSnafu {
			layer: "IPv6",
			len: packet.len(),
			min: IPV6_HEADER_LEN,
		}
	);
	let ip = Ipv6Slice::from_slice(packet).context(error::Ipv6Snafu)?;
	let header = ip.header();
	// Jumbograms are not supported, a zero length never covers a TCP header.
	ensure!(header.payload_length() != 0, error::ZeroPayloadLengthSnafu);

	let payload = ip.payload();
	let protocol = payload.ip_number.0;
	ensure!(protocol == IP_PROTO_TCP, error::NotTcpSnafu { protocol });
	// Only an unfragmented payload is known to start with a TCP header.
	ensure!(!payload.fragmented, error::FragmentedSnafu);

	Ok(NetworkLayer {
		flow: NetworkFlow::V6(DirectedNetworkFlow::new(
			header.source_addr(),
			header.destination_addr(),
		)),
		segment: payload.payload,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rejects_short_buffer() {
		let err = EtherparseDecoder
			.decode_network(&[1, 2, 3, 4, 5, 6, 7])
			.unwrap_err();
		assert!(matches!(err, Malformed::Truncated { len: 7, .. }));
	}

	#[test]
	fn test_rejects_unknown_version() {
		let mut packet = [0u8; 40];
		packet[0] = 0x55;
		let err = EtherparseDecoder.decode_network(&packet).unwrap_err();
		assert!(matches!(err, Malformed::UnknownVersion { version: 5 }));
	}

	#[test]
	fn test_rejects_short_tcp_segment() {
		let err = EtherparseDecoder.decode_tcp(&[0, 1, 0, 2]).unwrap_err();
		assert!(matches!(err, Malformed::Truncated { layer: "TCP", .. }));
	}

	#[test]
	fn test_rejects_bad_tcp_data_offset() {
		let mut segment = [0u8; 20];
		// data offset of 4 words is below the minimum of 5
		segment[12] = 4 << 4;
		let err = EtherparseDecoder.decode_tcp(&segment).unwrap_err();
		assert!(matches!(err, Malformed::Tcp { .. }));
	}

	#[test]
	fn test_decodes_tcp_ports() {
		let mut segment = [0u8; 20];
		segment[0..2].copy_from_slice(&443u16.to_be_bytes());
		segment[2..4].copy_from_slice(&51000u16.to_be_bytes());
		segment[12] = 5 << 4;
		let ports = EtherparseDecoder.decode_tcp(&segment).unwrap();
		assert_eq!(ports, DirectedTransportFlow::new(443, 51000));
	}
}
