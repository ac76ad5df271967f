// Adapters layer: concrete record stores and invalidation sinks.

pub mod invalidation;
pub mod memory_store;
pub mod rest_store;

pub use invalidation::{ChannelSink, CollectingSink, LoggingSink, NoopSink};
pub use memory_store::InMemoryRecordStore;
pub use rest_store::RestRecordStore;
