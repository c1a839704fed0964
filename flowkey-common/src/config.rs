//! Configuration types for the conversation table.

use std::sync::Arc;

/// Default initial capacity of a table
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default number of lock shards
pub const DEFAULT_SHARDS: usize = 32;

/// Runtime configuration for a [`ConversationTable`](crate::ConversationTable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
	/// Initial capacity, read once at construction.
	pub capacity: usize,
	/// Lock shard count, read once at construction. Always a power of two
	/// greater than one.
	pub shards: usize,
	/// Upper bound on tracked conversations; `None` is unbounded.
	/// Re-read on every new conversation, so it can be changed live.
	pub max_conversations: Option<usize>,
}

impl Default for TableConfig {
	fn default() -> Self {
		Self {
			capacity: DEFAULT_CAPACITY,
			shards: DEFAULT_SHARDS,
			max_conversations: None,
		}
	}
}

impl TableConfig {
	/// Create a new config with default values.
	#[must_use]
	pub fn new() -> Self { Self::default() }

	/// Set the initial capacity.
	#[must_use]
	pub fn with_capacity(mut self, capacity: usize) -> Self {
		self.capacity = capacity;
		self
	}

	/// Set the shard count, rounded up to a power of two of at least 2.
	#[must_use]
	pub fn with_shards(mut self, shards: usize) -> Self {
		self.shards = shards.max(2).next_power_of_two();
		self
	}

	/// Cap the number of tracked conversations.
	#[must_use]
	pub fn with_max_conversations(mut self, max: usize) -> Self {
		self.max_conversations = Some(max);
		self
	}

	/// Whether a table holding `len` conversations may open another one.
	pub fn admits(&self, len: usize) -> bool { self.max_conversations.is_none_or(|max| len < max) }
}

/// Shared configuration handle for live updates.
pub type SharedConfig = Arc<parking_lot::RwLock<TableConfig>>;

/// Create a new shared configuration.
#[must_use]
pub fn shared_config(config: TableConfig) -> SharedConfig { Arc::new(parking_lot::RwLock::new(config)) }
