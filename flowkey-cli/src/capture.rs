use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use flowkey_common::{ConversationTable, Observation};
use flowkey_core::{AddressFamily, TcpIpFlow};
use log::{debug, info};
use pcap_file::DataLink;
use pcap_file::pcap::PcapReader;
use snafu::ResultExt;

use crate::error::{self, Result};

/// Which address families to feed into the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FamilyFilter {
	V4,
	V6,
	#[default]
	All,
}

impl FamilyFilter {
	pub fn includes(&self, family: AddressFamily) -> bool {
		matches!(
			(self, family),
			(FamilyFilter::All, _) | (FamilyFilter::V4, AddressFamily::Ipv4) | (FamilyFilter::V6, AddressFamily::Ipv6)
		)
	}
}

impl FromStr for FamilyFilter {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"v4" | "ipv4" | "4" => Ok(FamilyFilter::V4),
			"v6" | "ipv6" | "6" => Ok(FamilyFilter::V6),
			"all" => Ok(FamilyFilter::All),
			other => Err(format!("unknown family `{other}`, expected v4, v6 or all")),
		}
	}
}

impl fmt::Display for FamilyFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FamilyFilter::V4 => f.write_str("v4"),
			FamilyFilter::V6 => f.write_str("v6"),
			FamilyFilter::All => f.write_str("all"),
		}
	}
}

/// Counters collected while reading a capture
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
	pub link_type: String,
	pub packets: u64,
	pub tracked: u64,
	/// Conversations refused because the table was full
	pub dropped: u64,
	/// Packets of the excluded family
	pub filtered: u64,
	/// Packets that did not yield a TCP flow, by reason
	pub skipped: BTreeMap<&'static str, u64>,
}

impl CaptureSummary {
	pub fn skipped_total(&self) -> u64 { self.skipped.values().sum() }
}

type Decode = fn(&[u8]) -> flowkey_core::Result<TcpIpFlow>;

fn decoder_for(link_type: DataLink) -> Result<Decode> {
	match link_type {
		DataLink::ETHERNET => Ok(TcpIpFlow::from_ethernet),
		DataLink::RAW | DataLink::IPV4 | DataLink::IPV6 => Ok(TcpIpFlow::from_packet),
		other => error::UnsupportedLinkTypeSnafu {
			link_type: format!("{other:?}"),
		}
		.fail(),
	}
}

/// Read every packet of a pcap file into `table`.
///
/// Packets that are not IPv4/IPv6 + TCP are counted and skipped. Only I/O
/// and format errors of the capture itself abort the run.
pub fn process_capture(path: &Path, table: &ConversationTable, family: FamilyFilter) -> Result<CaptureSummary> {
	let file = File::open(path).context(error::OpenCaptureSnafu { path })?;
	let mut reader = PcapReader::new(file).context(error::ReadCaptureSnafu { path })?;

	let link_type = reader.header().datalink;
	let decode = decoder_for(link_type)?;
	info!("Reading {} ({:?})", path.display(), link_type);

	let mut summary = CaptureSummary {
		link_type: format!("{link_type:?}"),
		..Default::default()
	};

	while let Some(packet) = reader.next_packet() {
		let packet = packet.context(error::ReadCaptureSnafu { path })?;
		summary.packets += 1;

		let flow = match decode(&packet.data) {
			Ok(flow) => flow,
			Err(e) => {
				debug!("Skipping packet #{}: {}", summary.packets, e);
				*summary.skipped.entry(e.reason().kind()).or_default() += 1;
				continue;
			}
		};

		if !family.includes(flow.family()) {
			summary.filtered += 1;
			continue;
		}

		match table.observe(&flow, packet.orig_len as usize) {
			Observation::Tracked { .. } => summary.tracked += 1,
			Observation::Dropped(_) => summary.dropped += 1,
		}
	}

	Ok(summary)
}

#[cfg(test)]
pub(crate) mod tests {
	use std::path::PathBuf;
	use std::time::Duration;

	use etherparse::PacketBuilder;
	use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
	use pcap_file::{Endianness, TsResolution};

	use super::*;

	pub(crate) fn write_capture(name: &str, datalink: DataLink, packets: &[Vec<u8>]) -> PathBuf {
		let path = std::env::temp_dir().join(format!("flowkey-{}-{}.pcap", std::process::id(), name));
		let file_out = File::create(&path).unwrap();
		let mut writer = PcapWriter::with_header(
			file_out,
			PcapHeader {
				version_major: 2,
				version_minor: 4,
				ts_correction: 0,
				ts_accuracy: 0,
				snaplen: 65535,
				datalink,
				ts_resolution: TsResolution::MicroSecond,
				endianness: Endianness::native(),
			},
		)
		.unwrap();
		for (i, data) in packets.iter().enumerate() {
			let packet = PcapPacket::new(Duration::from_millis(i as u64), data.len() as u32, data);
			writer.write_packet(&packet).unwrap();
		}
		path
	}

	pub(crate) fn ip_tcp(src: [u8; 4], dst: [u8; 4], sp: u16, dp: u16, payload: &[u8]) -> Vec<u8> {
		let mut packet = Vec::new();
		PacketBuilder::ipv4(src, dst, 64)
			.tcp(sp, dp, 1, 1024)
			.write(&mut packet, payload)
			.unwrap();
		packet
	}

	fn ip_udp(src: [u8; 4], dst: [u8; 4]) -> Vec<u8> {
		let mut packet = Vec::new();
		PacketBuilder::ipv4(src, dst, 64)
			.udp(5353, 5353)
			.write(&mut packet, b"mdns")
			.unwrap();
		packet
	}

	#[test]
	fn test_raw_capture() {
		let a = [10, 0, 0, 1];
		let b = [10, 0, 0, 2];
		let path = write_capture(
			"raw",
			DataLink::RAW,
			&[
				ip_tcp(a, b, 40000, 80, &[]),
				ip_tcp(b, a, 80, 40000, &[]),
				ip_udp(a, b),
				vec![0x45, 0, 0],
				ip_tcp(a, b, 40001, 80, b"GET /"),
			],
		);

		let table = ConversationTable::default();
		let summary = process_capture(&path, &table, FamilyFilter::All).unwrap();
		std::fs::remove_file(&path).ok();

		assert_eq!(summary.link_type, "RAW");
		assert_eq!(summary.packets, 5);
		assert_eq!(summary.tracked, 3);
		assert_eq!(summary.skipped.get("not-tcp"), Some(&1));
		assert_eq!(summary.skipped.get("truncated"), Some(&1));
		assert_eq!(summary.skipped_total(), 2);
		assert_eq!(table.len(), 2);
	}

	#[test]
	fn test_ethernet_capture_with_filter() {
		let mut frame = Vec::new();
		PacketBuilder::ethernet2([1; 6], [2; 6])
			.ipv4([1, 2, 3, 4], [2, 3, 4, 5], 64)
			.tcp(1, 2, 1, 1024)
			.write(&mut frame, &[])
			.unwrap();
		let path = write_capture("eth", DataLink::ETHERNET, &[frame.clone(), frame]);

		let table = ConversationTable::default();
		let summary = process_capture(&path, &table, FamilyFilter::V6).unwrap();
		assert_eq!(summary.filtered, 2);
		assert!(table.is_empty());

		let summary = process_capture(&path, &table, FamilyFilter::V4).unwrap();
		std::fs::remove_file(&path).ok();
		assert_eq!(summary.tracked, 2);
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn test_missing_file() {
		let table = ConversationTable::default();
		let err = process_capture(Path::new("/nonexistent/flowkey.pcap"), &table, FamilyFilter::All).unwrap_err();
		assert!(matches!(err, error::Error::OpenCapture { .. }));
	}

	#[test]
	fn test_family_filter_parse() {
		assert_eq!("V4".parse::<FamilyFilter>(), Ok(FamilyFilter::V4));
		assert_eq!("ipv6".parse::<FamilyFilter>(), Ok(FamilyFilter::V6));
		assert_eq!("all".parse::<FamilyFilter>(), Ok(FamilyFilter::All));
		assert!("v5".parse::<FamilyFilter>().is_err());
		assert!(FamilyFilter::V4.includes(AddressFamily::Ipv4));
		assert!(!FamilyFilter::V4.includes(AddressFamily::Ipv6));
	}
}
