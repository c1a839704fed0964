use std::fmt::Write;

use flowkey_common::ConversationTable;

use crate::capture::CaptureSummary;

/// Render totals followed by the `top` busiest conversations.
pub fn render(summary: &CaptureSummary, table: &ConversationTable, top: usize, verbose: bool) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Link type:      {}", summary.link_type);
	let _ = writeln!(
		out,
		"Packets:        {} (tracked {}, skipped {}, filtered {}, dropped {})",
		summary.packets,
		summary.tracked,
		summary.skipped_total(),
		summary.filtered,
		summary.dropped
	);
	if verbose {
		for (reason, count) in &summary.skipped {
			let _ = writeln!(out, "  skipped {reason}: {count}");
		}
	}
	let _ = writeln!(out, "Conversations:  {}", table.len());

	for (_, stats) in table.top(top) {
		let _ = writeln!(
			out,
			"  {}  fwd={}/{}  rev={}/{}",
			stats.initiator, stats.forward.packets, stats.forward.bytes, stats.reverse.packets, stats.reverse.bytes
		);
	}
	out
}
