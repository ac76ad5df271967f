use crate::adapters::invalidation::NoopSink;
use crate::core::statistics::aggregate_rating;
use crate::domain::model::{InvalidationKey, PlaceId, PlacePatch, ReviewStatistics};
use crate::domain::ports::{InvalidationSink, RecordStore};
use crate::utils::error::Result;
use std::sync::Arc;

/// Keeps `Place::rating` equal to the rounded mean of the place's reviews.
pub struct ReviewAggregator<S: RecordStore> {
    store: Arc<S>,
    sink: Arc<dyn InvalidationSink>,
}

impl<S: RecordStore> Clone for ReviewAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: RecordStore> ReviewAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sink: Arc::new(NoopSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn InvalidationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Re-derives the rating from the current reviews and writes it to the place.
    ///
    /// Safe to re-run at any time. If the write fails the previous rating stands; a
    /// missing place surfaces as `NotFound` from the store.
    pub async fn recompute_rating(&self, place_id: &PlaceId) -> Result<f64> {
        let reviews = self.store.list_reviews_by_place(place_id).await?;
        let rating = aggregate_rating(reviews.iter().map(|r| r.rating));

        self.store
            .update_place(place_id, &PlacePatch::rating(rating))
            .await?;

        tracing::debug!(
            place_id = %place_id,
            reviews = reviews.len(),
            rating,
            "place rating recomputed"
        );
        self.sink.invalidate(&[
            InvalidationKey::Place(place_id.clone()),
            InvalidationKey::PlaceLists,
            InvalidationKey::CatalogStatistics,
        ]);

        Ok(rating)
    }

    pub async fn statistics(&self, place_id: &PlaceId) -> Result<ReviewStatistics> {
        let reviews = self.store.list_reviews_by_place(place_id).await?;
        Ok(ReviewStatistics::from_reviews(&reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::invalidation::CollectingSink;
    use crate::adapters::memory_store::InMemoryRecordStore;
    use crate::domain::model::{Category, NewPlace, NewReview};
    use crate::utils::error::CatalogError;
    use chrono::NaiveDate;

    async fn seeded(ratings: &[u8]) -> (Arc<InMemoryRecordStore>, PlaceId) {
        let store = Arc::new(InMemoryRecordStore::new());
        let place = store
            .create_place(&NewPlace::new(
                "Toko Oen",
                "Old restaurant from 1936",
                "Jl. Pemuda 52",
                Category::Restaurant,
                "https://img.example/oen.jpg",
            ))
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for rating in ratings {
            store
                .create_review(&NewReview::new(
                    place.id.clone(),
                    "Budi",
                    *rating,
                    "ok",
                    date,
                ))
                .await
                .unwrap();
        }
        (store, place.id)
    }

    #[tokio::test]
    async fn test_recompute_writes_rounded_mean() {
        let (store, place_id) = seeded(&[5, 4, 3]).await;
        let aggregator = ReviewAggregator::new(store.clone());

        assert_eq!(aggregator.recompute_rating(&place_id).await.unwrap(), 4.0);
        assert_eq!(store.get_place(&place_id).await.unwrap().rating, 4.0);
    }

    #[tokio::test]
    async fn test_recompute_without_reviews_resets_to_zero() {
        let (store, place_id) = seeded(&[]).await;
        store
            .update_place(&place_id, &PlacePatch::rating(4.2))
            .await
            .unwrap();

        let aggregator = ReviewAggregator::new(store.clone());
        assert_eq!(aggregator.recompute_rating(&place_id).await.unwrap(), 0.0);
        assert_eq!(store.get_place(&place_id).await.unwrap().rating, 0.0);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let (store, place_id) = seeded(&[2, 5]).await;
        let aggregator = ReviewAggregator::new(store);

        let first = aggregator.recompute_rating(&place_id).await.unwrap();
        let second = aggregator.recompute_rating(&place_id).await.unwrap();
        assert_eq!(first, 3.5);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_recompute_missing_place_is_not_found() {
        let store = Arc::new(InMemoryRecordStore::new());
        let aggregator = ReviewAggregator::new(store);

        let err = aggregator
            .recompute_rating(&PlaceId::from("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { kind: "place", .. }));
    }

    #[tokio::test]
    async fn test_recompute_publishes_invalidation() {
        let (store, place_id) = seeded(&[4]).await;
        let sink = Arc::new(CollectingSink::default());
        let aggregator = ReviewAggregator::new(store).with_sink(sink.clone());

        aggregator.recompute_rating(&place_id).await.unwrap();
        let keys = sink.take();
        assert!(keys.contains(&InvalidationKey::Place(place_id)));
        assert!(keys.contains(&InvalidationKey::PlaceLists));
    }

    #[tokio::test]
    async fn test_statistics_has_no_side_effects() {
        let (store, place_id) = seeded(&[5, 5, 1]).await;
        let aggregator = ReviewAggregator::new(store.clone());

        let stats = aggregator.statistics(&place_id).await.unwrap();
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, 3.7);
        assert_eq!(stats.bucket(5), 2);
        // rating was never recomputed
        assert_eq!(store.get_place(&place_id).await.unwrap().rating, 0.0);
    }
}
