//! flowkey common library.
//!
//! Provides the conversation table that consumes canonical flow keys, along
//! with its configuration and event types.

pub mod config;
pub mod events;
pub mod table;

// Re-exports for convenience
pub use config::{shared_config, SharedConfig, TableConfig};
pub use events::TableEvent;
pub use table::{ConversationStats, ConversationTable, Direction, DirectionStats, Observation};
