//! # flowkey core
//!
//! Bidirectional TCP/IP flow identification.
//!
//! ## Modules
//!
//! - `network` / `transport` - directed per-layer flows
//! - `conversation` - directed 4-tuples and raw-packet construction
//! - `key` - fixed-width canonical keys, one type per address family
//! - `decode` - the header decoding capability and its `etherparse` backend
//! - `error` - error types and handling
//! - `constants` - header sizes and protocol numbers
//!
//! ## Usage
//!
//! ```
//! use std::net::Ipv4Addr;
//! use flowkey_core::ConversationFlow;
//!
//! let a = ConversationFlow::from_endpoints(Ipv4Addr::new(1, 2, 3, 4), 1, Ipv4Addr::new(2, 3, 4, 5), 2);
//! let b = a.reverse();
//! assert_ne!(a, b);
//! assert_eq!(a.canonical_key(), b.canonical_key());
//! assert_eq!(a.to_string(), "1.2.3.4:1-2.3.4.5:2");
//! ```

pub mod constants;
pub mod conversation;
pub mod decode;
pub mod error;
pub mod key;
pub mod network;
pub mod transport;

pub use conversation::{ConversationFlow, Ipv4ConversationFlow, Ipv6ConversationFlow, TcpIpFlow};
pub use decode::{EtherparseDecoder, HeaderDecoder, NetworkLayer};
pub use error::{Error, Malformed, Result};
pub use key::{AddressFamily, CanonicalKey, Ipv4Key, Ipv6Key};
pub use network::{DirectedNetworkFlow, FlowAddress, Ipv4NetworkFlow, Ipv6NetworkFlow, NetworkFlow};
pub use transport::DirectedTransportFlow;
