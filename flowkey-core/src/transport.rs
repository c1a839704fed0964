//! Transport-layer directed flows.

use std::fmt;

/// Ordered (source port, destination port) pair.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct DirectedTransportFlow {
	src: u16,
	dst: u16,
}

impl DirectedTransportFlow {
	pub fn new(src: u16, dst: u16) -> Self { Self { src, dst } }

	pub fn src(&self) -> u16 { self.src }

	pub fn dst(&self) -> u16 { self.dst }

	/// Same pair with source and destination swapped.
	#[must_use]
	pub fn reverse(&self) -> Self {
		Self {
			src: self.dst,
			dst: self.src,
		}
	}
}

impl fmt::Display for DirectedTransportFlow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}->{}", self.src, self.dst) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_equality_is_order_sensitive() {
		let a = DirectedTransportFlow::new(1, 2);
		assert_eq!(a, DirectedTransportFlow::new(1, 2));
		assert_ne!(a, DirectedTransportFlow::new(2, 1));
		assert_eq!(a.reverse(), DirectedTransportFlow::new(2, 1));
	}
}
