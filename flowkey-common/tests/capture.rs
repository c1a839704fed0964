use etherparse::PacketBuilder;
use flowkey_common::{ConversationTable, Direction, Observation};
use flowkey_core::{AddressFamily, TcpIpFlow};

fn tcp4(src: [u8; 4], dst: [u8; 4], sp: u16, dp: u16, payload: &[u8]) -> Vec<u8> {
	let mut packet = Vec::new();
	PacketBuilder::ipv4(src, dst, 64)
		.tcp(sp, dp, 1, 1024)
		.write(&mut packet, payload)
		.unwrap();
	packet
}

fn tcp6(src: [u8; 16], dst: [u8; 16], sp: u16, dp: u16, payload: &[u8]) -> Vec<u8> {
	let mut packet = Vec::new();
	PacketBuilder::ipv6(src, dst, 64)
		.tcp(sp, dp, 1, 1024)
		.write(&mut packet, payload)
		.unwrap();
	packet
}

#[test]
fn handshake_lands_in_one_conversation_per_family() {
	let client4 = [192, 168, 0, 10];
	let server4 = [192, 168, 0, 1];
	let mut client6 = [0u8; 16];
	client6[15] = 10;
	let mut server6 = [0u8; 16];
	server6[15] = 1;

	let packets = [
		tcp4(client4, server4, 50000, 22, &[]),
		tcp4(server4, client4, 22, 50000, &[]),
		tcp4(client4, server4, 50000, 22, b"SSH-2.0"),
		tcp6(client6, server6, 50000, 22, &[]),
		tcp6(server6, client6, 22, 50000, b"SSH-2.0"),
	];

	let table = ConversationTable::default();
	let mut directions = Vec::new();
	for packet in &packets {
		let flow = TcpIpFlow::from_packet(packet).unwrap();
		match table.observe(&flow, packet.len()) {
			Observation::Tracked { direction, .. } => directions.push(direction),
			Observation::Dropped(key) => panic!("unexpected drop of {key}"),
		}
	}

	assert_eq!(
		directions,
		[
			Direction::Forward,
			Direction::Reverse,
			Direction::Forward,
			Direction::Forward,
			Direction::Reverse,
		]
	);
	// same ports and "same" host numbers, but the families never share a bucket
	assert_eq!(table.len(), 2);

	let families: Vec<_> = table.snapshot().iter().map(|(key, _)| key.family()).collect();
	assert_eq!(families, [AddressFamily::Ipv4, AddressFamily::Ipv6]);

	let (_, v4) = table.top(1)[0];
	assert_eq!(v4.forward.packets, 2);
	assert_eq!(v4.reverse.packets, 1);
	assert_eq!(v4.initiator.to_string(), "192.168.0.10:50000-192.168.0.1:22");
}
