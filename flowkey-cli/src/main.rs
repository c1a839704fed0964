//! Summarise the TCP conversations found in a pcap capture.

mod capture;
mod error;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use flowkey_common::{ConversationTable, TableConfig, shared_config};
use log::error;

use crate::capture::{FamilyFilter, process_capture};

#[derive(FromArgs, Debug)]
/// Group the TCP packets of a pcap capture into bidirectional conversations.
struct Args {
	/// capture file (Ethernet or raw IP link type)
	#[argh(positional)]
	file: PathBuf,

	/// number of conversations to list, busiest first
	#[argh(option, default = "10")]
	top: usize,

	/// address family to include: v4, v6 or all
	#[argh(option, default = "FamilyFilter::All")]
	family: FamilyFilter,

	/// stop opening conversations after this many
	#[argh(option)]
	max_conversations: Option<usize>,

	/// show skipped packets by reason
	#[argh(switch, short = 'v')]
	verbose: bool,
}

fn main() -> ExitCode {
	logforth::starter_log::stderr().apply();

	let args: Args = argh::from_env();

	let mut config = TableConfig::new();
	if let Some(max) = args.max_conversations {
		config = config.with_max_conversations(max);
	}
	let table = ConversationTable::new(shared_config(config), None);

	match process_capture(&args.file, &table, args.family) {
		Ok(summary) => {
			print!("{}", report::render(&summary, &table, args.top, args.verbose));
			ExitCode::SUCCESS
		}
		Err(e) => {
			error!("{}", e);
			ExitCode::FAILURE
		}
	}
}
