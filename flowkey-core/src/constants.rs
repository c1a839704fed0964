//! Shared constants for flowkey
//!
//! Header sizes and protocol numbers the decoder and key layouts rely on.

/// IP protocol number assigned to TCP
pub const IP_PROTO_TCP: u8 = 6;

/// Smallest possible IPv4 header (IHL = 5)
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// Fixed IPv6 header size, extension headers excluded
pub const IPV6_HEADER_LEN: usize = 40;

/// Smallest possible TCP header (data offset = 5)
pub const TCP_MIN_HEADER_LEN: usize = 20;

/// No valid network header fits in fewer bytes than this
pub const MIN_NETWORK_HEADER_LEN: usize = IPV4_MIN_HEADER_LEN;

/// Width of a canonical IPv4 key: two addresses followed by two ports
pub const IPV4_KEY_LEN: usize = 2 * 4 + 2 * 2;

/// Width of a canonical IPv6 key: two addresses followed by two ports
pub const IPV6_KEY_LEN: usize = 2 * 16 + 2 * 2;
