use std::fs::File;
use std::process::Command;
use std::time::Duration;

use etherparse::PacketBuilder;
use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::{DataLink, Endianness, TsResolution};

fn tcp(src: [u8; 4], dst: [u8; 4], sp: u16, dp: u16) -> Vec<u8> {
	let mut packet = Vec::new();
	PacketBuilder::ipv4(src, dst, 64)
		.tcp(sp, dp, 1, 1024)
		.write(&mut packet, &[])
		.unwrap();
	packet
}

#[test]
fn report_alone_goes_to_stdout() {
	let path = std::env::temp_dir().join(format!("flowkey-cli-{}.pcap", std::process::id()));
	let mut writer = PcapWriter::with_header(
		File::create(&path).unwrap(),
		PcapHeader {
			version_major: 2,
			version_minor: 4,
			ts_correction: 0,
			ts_accuracy: 0,
			snaplen: 65535,
			datalink: DataLink::RAW,
			ts_resolution: TsResolution::MicroSecond,
			endianness: Endianness::native(),
		},
	)
	.unwrap();
	for (i, data) in [tcp([10, 0, 0, 1], [10, 0, 0, 2], 40000, 80), tcp([10, 0, 0, 2], [10, 0, 0, 1], 80, 40000)]
		.iter()
		.enumerate()
	{
		let packet = PcapPacket::new(Duration::from_millis(i as u64), data.len() as u32, data);
		writer.write_packet(&packet).unwrap();
	}
	drop(writer);

	let output = Command::new(env!("CARGO_BIN_EXE_flowkey-cli"))
		.arg(&path)
		.env("RUST_LOG", "trace")
		.output()
		.unwrap();
	std::fs::remove_file(&path).ok();

	assert!(output.status.success());
	let stdout = String::from_utf8(output.stdout).unwrap();
	assert!(stdout.starts_with("Link type:"), "{stdout}");
	assert!(!stdout.contains("Reading"), "{stdout}");
	assert!(stdout.contains("  10.0.0.1:40000-10.0.0.2:80  fwd=1/40  rev=1/40"), "{stdout}");
}
