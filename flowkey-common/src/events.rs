use flowkey_core::CanonicalKey;

/// Lifecycle notifications emitted by a
/// [`ConversationTable`](crate::ConversationTable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
	/// First packet of a conversation seen
	Opened(CanonicalKey),
	/// Conversation removed from the table
	Closed(CanonicalKey),
	/// New conversation refused because the table is full
	Dropped(CanonicalKey),
}
