use crate::domain::model::{
    InvalidationKey, NewPlace, NewReview, Place, PlaceFilter, PlaceId, PlacePatch, Review,
    ReviewId, ReviewPatch,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Remote tabular store holding places and reviews.
///
/// Single-record reads and writes fail with `CatalogError::NotFound` when the id matches
/// nothing. Deletes of a missing id succeed. The store is not expected to cascade deletes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_place(&self, place: &NewPlace) -> Result<Place>;
    async fn get_place(&self, id: &PlaceId) -> Result<Place>;
    async fn update_place(&self, id: &PlaceId, patch: &PlacePatch) -> Result<Place>;
    async fn delete_place(&self, id: &PlaceId) -> Result<()>;
    async fn list_places(&self, filter: &PlaceFilter) -> Result<Vec<Place>>;

    async fn create_review(&self, review: &NewReview) -> Result<Review>;
    async fn get_review(&self, id: &ReviewId) -> Result<Review>;
    async fn update_review(&self, id: &ReviewId, patch: &ReviewPatch) -> Result<Review>;
    async fn delete_review(&self, id: &ReviewId) -> Result<()>;
    async fn list_reviews_by_place(&self, place_id: &PlaceId) -> Result<Vec<Review>>;

    /// Removes every review of a place and returns how many there were.
    async fn delete_reviews_by_place(&self, place_id: &PlaceId) -> Result<usize> {
        let reviews = self.list_reviews_by_place(place_id).await?;
        for review in &reviews {
            self.delete_review(&review.id).await?;
        }
        Ok(reviews.len())
    }
}

/// Receives "data under these keys may be stale" signals after writes.
pub trait InvalidationSink: Send + Sync {
    fn invalidate(&self, keys: &[InvalidationKey]);
}

pub trait ConfigProvider: Send + Sync {
    fn store_url(&self) -> &str;
    fn api_key(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    fn places_table(&self) -> &str;
    fn reviews_table(&self) -> &str;
}
