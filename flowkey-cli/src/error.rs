//! CLI error handling

use std::path::PathBuf;

use snafu::prelude::*;

/// Result type alias for CLI operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
	/// Capture file could not be opened
	#[snafu(display("Failed to open capture {}: {source}", path.display()))]
	OpenCapture {
		source: std::io::Error,
		path: PathBuf,
	},

	/// Capture header or a packet record could not be read
	#[snafu(display("Failed to read capture {}: {source}", path.display()))]
	ReadCapture {
		source: pcap_file::PcapError,
		path: PathBuf,
	},

	/// Link layer other than Ethernet or raw IP
	#[snafu(display("Unsupported link type {link_type}"))]
	UnsupportedLinkType { link_type: String },
}
