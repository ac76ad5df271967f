pub mod aggregator;
pub mod catalog;
pub mod selector;
pub mod statistics;

pub use crate::domain::model::{Place, Review, ReviewStatistics};
pub use crate::domain::ports::{ConfigProvider, InvalidationSink, RecordStore};
pub use crate::utils::error::Result;
