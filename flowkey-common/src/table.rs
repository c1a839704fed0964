//! Concurrent conversation table keyed by canonical flow keys.

use dashmap::DashMap;
use flowkey_core::{CanonicalKey, TcpIpFlow};
use tracing::{debug, trace};

use crate::config::SharedConfig;
use crate::events::TableEvent;

/// Which side of a conversation a packet travelled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
	/// Same direction as the first packet of the conversation
	Forward,
	/// Opposite direction
	Reverse,
}

/// Packet and byte counters for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionStats {
	pub packets: u64,
	pub bytes: u64,
}

impl DirectionStats {
	fn record(&mut self, bytes: usize) {
		self.packets += 1;
		self.bytes += bytes as u64;
	}
}

/// Per-conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationStats {
	/// Orientation of the first packet seen, used as "forward"
	pub initiator: TcpIpFlow,
	pub forward: DirectionStats,
	pub reverse: DirectionStats,
}

impl ConversationStats {
	fn new(initiator: TcpIpFlow) -> Self {
		Self {
			initiator,
			forward: DirectionStats::default(),
			reverse: DirectionStats::default(),
		}
	}

	/// Direction of `flow` relative to the initiator.
	pub fn direction_of(&self, flow: &TcpIpFlow) -> Direction {
		if flow.same_direction(&self.initiator) {
			Direction::Forward
		} else {
			Direction::Reverse
		}
	}

	fn record(&mut self, direction: Direction, bytes: usize) {
		match direction {
			Direction::Forward => self.forward.record(bytes),
			Direction::Reverse => self.reverse.record(bytes),
		}
	}

	pub fn total_packets(&self) -> u64 { self.forward.packets + self.reverse.packets }

	pub fn total_bytes(&self) -> u64 { self.forward.bytes + self.reverse.bytes }
}

/// Outcome of [`ConversationTable::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
	/// Packet counted against a conversation
	Tracked {
		key: CanonicalKey,
		direction: Direction,
		is_new: bool,
	},
	/// Conversation refused, the table is at `max_conversations`
	Dropped(CanonicalKey),
}

/// Conversations of both address families keyed by [`CanonicalKey`].
///
/// Both directions of a TCP connection share one entry. All methods take
/// `&self` and may be called from any number of threads.
pub struct ConversationTable {
	config: SharedConfig,
	conversations: DashMap<CanonicalKey, ConversationStats>,
	event_tx: Option<kanal::Sender<TableEvent>>,
}

impl ConversationTable {
	pub fn new(config: SharedConfig, event_tx: Option<kanal::Sender<TableEvent>>) -> Self {
		let (capacity, shards) = {
			let config = config.read();
			(config.capacity, config.shards.max(2).next_power_of_two())
		};
		Self {
			config,
			conversations: DashMap::with_capacity_and_shard_amount(capacity, shards),
			event_tx,
		}
	}

	/// Count one packet of `bytes` length travelling along `flow`.
	///
	/// The cap is checked without holding a shard lock, so threads racing to
	/// open different conversations may overshoot it by a few entries.
	pub fn observe(&self, flow: &TcpIpFlow, bytes: usize) -> Observation {
		let key = flow.canonical_key();

		if let Some(mut entry) = self.conversations.get_mut(&key) {
			let direction = entry.direction_of(flow);
			entry.record(direction, bytes);
			trace!("{} {:?} [L{}]", flow, direction, bytes);
			return Observation::Tracked {
				key,
				direction,
				is_new: false,
			};
		}

		if !self.config.read().admits(self.conversations.len()) {
			debug!("Table full, dropping conversation {}", key);
			self.notify(TableEvent::Dropped(key));
			return Observation::Dropped(key);
		}

		let mut is_new = false;
		let mut entry = self.conversations.entry(key).or_insert_with(|| {
			is_new = true;
			ConversationStats::new(*flow)
		});
		let direction = entry.direction_of(flow);
		entry.record(direction, bytes);
		drop(entry);

		if is_new {
			debug!("Conversation opened: {} ({})", flow, key.family());
			self.notify(TableEvent::Opened(key));
		}
		Observation::Tracked {
			key,
			direction,
			is_new,
		}
	}

	pub fn get(&self, key: &CanonicalKey) -> Option<ConversationStats> {
		self.conversations.get(key).map(|entry| *entry.value())
	}

	/// Remove a conversation, returning its final state.
	pub fn remove(&self, key: &CanonicalKey) -> Option<ConversationStats> {
		let (key, stats) = self.conversations.remove(key)?;
		debug!("Conversation closed: {}", key);
		self.notify(TableEvent::Closed(key));
		Some(stats)
	}

	pub fn len(&self) -> usize { self.conversations.len() }

	pub fn is_empty(&self) -> bool { self.conversations.is_empty() }

	/// All conversations, ordered by key.
	pub fn snapshot(&self) -> Vec<(CanonicalKey, ConversationStats)> {
		let mut all: Vec<_> = self
			.conversations
			.iter()
			.map(|entry| (*entry.key(), *entry.value()))
			.collect();
		all.sort_by_key(|(key, _)| *key);
		all
	}

	/// The `n` busiest conversations by packet count, ties ordered by key.
	pub fn top(&self, n: usize) -> Vec<(CanonicalKey, ConversationStats)> {
		let mut all = self.snapshot();
		all.sort_by(|(ka, a), (kb, b)| b.total_packets().cmp(&a.total_packets()).then(ka.cmp(kb)));
		all.truncate(n);
		all
	}

	fn notify(&self, event: TableEvent) {
		if let Some(tx) = &self.event_tx {
			// Non-blocking send, if channel full drop it
			let _ = tx.try_send(event);
		}
	}
}

impl Default for ConversationTable {
	fn default() -> Self { Self::new(crate::config::shared_config(Default::default()), None) }
}
