pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{InMemoryRecordStore, RestRecordStore};
pub use config::StoreSettings;
pub use core::aggregator::ReviewAggregator;
pub use core::catalog::CatalogService;
pub use core::selector::{pick_random, PickHistory};
pub use domain::model::{
    Category, CategoryFilter, MutationOutcome, NewPlace, NewReview, Place, PlaceFilter, PlaceId,
    PlacePatch, Review, ReviewId, ReviewPatch, ReviewStatistics,
};
pub use domain::ports::{InvalidationSink, RecordStore};
pub use utils::error::{CatalogError, Result};
