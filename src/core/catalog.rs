use crate::adapters::invalidation::NoopSink;
use crate::core::aggregator::ReviewAggregator;
use crate::core::selector::pick_random;
use crate::domain::model::{
    CatalogStatistics, CatalogWarning, CategoryFilter, InvalidationKey, MutationOutcome,
    NewPlace, NewReview, Place, PlaceFilter, PlaceId, PlacePatch, Review, ReviewId,
    ReviewPatch, ReviewStatistics,
};
use crate::domain::ports::{InvalidationSink, RecordStore};
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::Validate;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

/// Entry point for the presentation layer.
///
/// Validates input before any store call, enforces cascade deletes, recomputes ratings
/// after every review mutation and publishes invalidation keys after each write.
pub struct CatalogService<S: RecordStore> {
    store: Arc<S>,
    aggregator: ReviewAggregator<S>,
    sink: Arc<dyn InvalidationSink>,
}

impl<S: RecordStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self::with_shared_store(Arc::new(store))
    }

    pub fn with_shared_store(store: Arc<S>) -> Self {
        Self {
            aggregator: ReviewAggregator::new(Arc::clone(&store)),
            store,
            sink: Arc::new(NoopSink),
        }
    }

    pub fn with_sink(self, sink: Arc<dyn InvalidationSink>) -> Self {
        Self {
            aggregator: self.aggregator.with_sink(Arc::clone(&sink)),
            store: self.store,
            sink,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ---- places ----

    pub async fn list_places(&self, filter: &PlaceFilter) -> Result<Vec<Place>> {
        match filter {
            PlaceFilter::Search(query) if query.trim().is_empty() => {
                self.store.list_places(&PlaceFilter::All).await
            }
            PlaceFilter::Search(query) => {
                self.store
                    .list_places(&PlaceFilter::Search(query.trim().to_string()))
                    .await
            }
            other => self.store.list_places(other).await,
        }
    }

    pub async fn get_place(&self, id: &PlaceId) -> Result<Place> {
        self.store.get_place(id).await
    }

    pub async fn create_place(&self, place: NewPlace) -> Result<Place> {
        let place = place.normalized();
        place.validate()?;

        let created = self.store.create_place(&place).await?;
        tracing::info!(place_id = %created.id, name = %created.name, "place created");
        self.publish(&[InvalidationKey::PlaceLists, InvalidationKey::CatalogStatistics]);
        Ok(created)
    }

    /// Applies a field edit. The rating is derived from reviews and cannot be patched here.
    pub async fn update_place(&self, id: &PlaceId, patch: PlacePatch) -> Result<Place> {
        if patch.rating.is_some() {
            return Err(CatalogError::validation(
                "rating",
                "is derived from reviews and cannot be edited",
            ));
        }
        let patch = patch.normalized();
        patch.validate()?;
        if patch.is_empty() {
            return self.store.get_place(id).await;
        }

        let updated = self.store.update_place(id, &patch).await?;
        tracing::info!(place_id = %id, "place updated");
        self.publish_place_change(id);
        Ok(updated)
    }

    pub async fn set_favorite(&self, id: &PlaceId, is_favorite: bool) -> Result<Place> {
        let updated = self
            .store
            .update_place(id, &PlacePatch::favorite(is_favorite))
            .await?;
        tracing::info!(place_id = %id, is_favorite, "favorite toggled");
        self.publish_place_change(id);
        Ok(updated)
    }

    /// Marks a place visited (stamped now) or clears the visit.
    pub async fn set_visited(&self, id: &PlaceId, visited: bool) -> Result<Place> {
        let patch = if visited {
            PlacePatch::visited_at(Utc::now())
        } else {
            PlacePatch::not_visited()
        };
        let updated = self.store.update_place(id, &patch).await?;
        tracing::info!(place_id = %id, visited, "visit toggled");
        self.publish_place_change(id);
        Ok(updated)
    }

    /// Deletes a place and, first, all of its reviews.
    pub async fn delete_place(&self, id: &PlaceId) -> Result<()> {
        self.store.get_place(id).await?;

        let removed_reviews = self.store.delete_reviews_by_place(id).await?;
        if let Err(e) = self.store.delete_place(id).await {
            // the reviews are gone, so the surviving place must not keep their rating
            tracing::warn!(place_id = %id, removed_reviews, error = %e, "place delete failed");
            self.refresh_rating(id).await;
            self.publish(&[
                InvalidationKey::Reviews(id.clone()),
                InvalidationKey::ReviewStatistics(id.clone()),
            ]);
            return Err(e);
        }

        tracing::info!(place_id = %id, removed_reviews, "place deleted");
        self.publish(&[
            InvalidationKey::Place(id.clone()),
            InvalidationKey::Reviews(id.clone()),
            InvalidationKey::ReviewStatistics(id.clone()),
            InvalidationKey::PlaceLists,
            InvalidationKey::CatalogStatistics,
        ]);
        Ok(())
    }

    /// Deletes every place (and its reviews). Returns the number of places removed.
    pub async fn clear_places(&self) -> Result<usize> {
        let places = self.store.list_places(&PlaceFilter::All).await?;
        for place in &places {
            self.delete_place(&place.id).await?;
        }
        tracing::info!(count = places.len(), "catalog cleared");
        Ok(places.len())
    }

    pub async fn random_place<R>(
        &self,
        filter: &CategoryFilter,
        rng: &mut R,
    ) -> Result<Option<Place>>
    where
        R: Rng + ?Sized,
    {
        let pool_filter = match filter {
            CategoryFilter::Only(category) => PlaceFilter::Category(*category),
            CategoryFilter::All | CategoryFilter::AnyOf(_) => PlaceFilter::All,
        };
        let pool = self.store.list_places(&pool_filter).await?;
        let picked = pick_random(&pool, filter, rng).cloned();

        tracing::debug!(
            pool = pool.len(),
            picked = picked.as_ref().map(|p| p.id.as_str()),
            "random pick"
        );
        Ok(picked)
    }

    pub async fn catalog_statistics(&self) -> Result<CatalogStatistics> {
        let places = self.store.list_places(&PlaceFilter::All).await?;
        Ok(CatalogStatistics::from_places(&places))
    }

    // ---- reviews ----

    pub async fn list_reviews(&self, place_id: &PlaceId) -> Result<Vec<Review>> {
        self.store.list_reviews_by_place(place_id).await
    }

    pub async fn get_review(&self, id: &ReviewId) -> Result<Review> {
        self.store.get_review(id).await
    }

    pub async fn create_review(&self, review: NewReview) -> Result<MutationOutcome<Review>> {
        let review = review.normalized();
        review.validate()?;
        self.store.get_place(&review.place_id).await?;

        let created = self.store.create_review(&review).await?;
        tracing::info!(
            review_id = %created.id,
            place_id = %created.place_id,
            rating = created.rating,
            "review created"
        );

        let warnings = self.refresh_rating(&created.place_id).await;
        self.publish_review_change(&created.place_id, &created.id);
        Ok(MutationOutcome::new(created, warnings))
    }

    pub async fn update_review(
        &self,
        id: &ReviewId,
        patch: ReviewPatch,
    ) -> Result<MutationOutcome<Review>> {
        let patch = patch.normalized();
        patch.validate()?;
        if patch.is_empty() {
            return self.store.get_review(id).await.map(MutationOutcome::clean);
        }

        let updated = self.store.update_review(id, &patch).await?;
        tracing::info!(review_id = %id, place_id = %updated.place_id, "review updated");

        let warnings = self.refresh_rating(&updated.place_id).await;
        self.publish_review_change(&updated.place_id, id);
        Ok(MutationOutcome::new(updated, warnings))
    }

    /// Deletes a review and returns it as it was before deletion.
    pub async fn delete_review(&self, id: &ReviewId) -> Result<MutationOutcome<Review>> {
        let review = self.store.get_review(id).await?;
        self.store.delete_review(id).await?;
        tracing::info!(review_id = %id, place_id = %review.place_id, "review deleted");

        let warnings = self.refresh_rating(&review.place_id).await;
        self.publish_review_change(&review.place_id, id);
        Ok(MutationOutcome::new(review, warnings))
    }

    pub async fn review_statistics(&self, place_id: &PlaceId) -> Result<ReviewStatistics> {
        self.aggregator.statistics(place_id).await
    }

    pub async fn recompute_rating(&self, place_id: &PlaceId) -> Result<f64> {
        self.aggregator.recompute_rating(place_id).await
    }

    // the review write has already committed; a failure here only leaves the rating stale
    async fn refresh_rating(&self, place_id: &PlaceId) -> Vec<CatalogWarning> {
        match self.aggregator.recompute_rating(place_id).await {
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!(place_id = %place_id, error = %e, "rating recomputation failed");
                vec![CatalogWarning::StaleRating {
                    place_id: place_id.clone(),
                    reason: e.to_string(),
                }]
            }
        }
    }

    fn publish(&self, keys: &[InvalidationKey]) {
        self.sink.invalidate(keys);
    }

    fn publish_place_change(&self, id: &PlaceId) {
        self.publish(&[
            InvalidationKey::Place(id.clone()),
            InvalidationKey::PlaceLists,
            InvalidationKey::CatalogStatistics,
        ]);
    }

    fn publish_review_change(&self, place_id: &PlaceId, review_id: &ReviewId) {
        self.publish(&[
            InvalidationKey::Reviews(place_id.clone()),
            InvalidationKey::ReviewStatistics(place_id.clone()),
            InvalidationKey::Review(review_id.clone()),
            InvalidationKey::Place(place_id.clone()),
            InvalidationKey::PlaceLists,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::invalidation::CollectingSink;
    use crate::adapters::memory_store::InMemoryRecordStore;
    use crate::domain::model::Category;

    fn new_place(name: &str, category: Category) -> NewPlace {
        NewPlace::new(
            name,
            "Worth a visit on the weekend",
            "Semarang Tengah",
            category,
            "https://img.example/place.jpg",
        )
    }

    #[tokio::test]
    async fn test_create_place_starts_at_zero_rating() {
        let catalog = CatalogService::new(InMemoryRecordStore::new());
        let place = catalog
            .create_place(new_place("  Kopi Dari Hati  ", Category::Cafe))
            .await
            .unwrap();
        assert_eq!(place.rating, 0.0);
        assert_eq!(place.name, "Kopi Dari Hati");
        assert!(!place.visited && !place.is_favorite);
    }

    #[tokio::test]
    async fn test_update_place_rejects_rating() {
        let catalog = CatalogService::new(InMemoryRecordStore::new());
        let place = catalog
            .create_place(new_place("Paragon", Category::Mall))
            .await
            .unwrap();

        let err = catalog
            .update_place(&place.id, PlacePatch::rating(5.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ValidationError { ref field, .. } if field == "rating"
        ));
    }

    #[tokio::test]
    async fn test_update_place_clears_optional_text() {
        let catalog = CatalogService::new(InMemoryRecordStore::new());
        let place = catalog
            .create_place(
                new_place("Sam Poo Kong", Category::HistoricalPlace).with_ticket_price("Rp 10.000"),
            )
            .await
            .unwrap();

        let patch = PlacePatch {
            ticket_price: Some(Some("   ".to_string())),
            ..PlacePatch::default()
        };
        let updated = catalog.update_place(&place.id, patch).await.unwrap();
        assert!(updated.ticket_price.is_none());
    }

    #[tokio::test]
    async fn test_visited_toggle_keeps_timestamp_consistent() {
        let catalog = CatalogService::new(InMemoryRecordStore::new());
        let place = catalog
            .create_place(new_place("Kota Lama", Category::HistoricalPlace))
            .await
            .unwrap();

        let visited = catalog.set_visited(&place.id, true).await.unwrap();
        assert!(visited.visited);
        assert!(visited.visited_date.is_some());

        let cleared = catalog.set_visited(&place.id, false).await.unwrap();
        assert!(!cleared.visited);
        assert!(cleared.visited_date.is_none());
    }

    #[tokio::test]
    async fn test_favorite_publishes_invalidation() {
        let sink = Arc::new(CollectingSink::default());
        let catalog = CatalogService::new(InMemoryRecordStore::new()).with_sink(sink.clone());
        let place = catalog
            .create_place(new_place("Simpang Lima", Category::Mall))
            .await
            .unwrap();
        sink.take();

        catalog.set_favorite(&place.id, true).await.unwrap();
        let keys = sink.take();
        assert!(keys.contains(&InvalidationKey::Place(place.id.clone())));
        assert!(keys.contains(&InvalidationKey::PlaceLists));
    }

    #[tokio::test]
    async fn test_blank_search_lists_everything() {
        let catalog = CatalogService::new(InMemoryRecordStore::new());
        catalog.create_place(new_place("Cafe A", Category::Cafe)).await.unwrap();
        catalog.create_place(new_place("Mall B", Category::Mall)).await.unwrap();

        let all = catalog
            .list_places(&PlaceFilter::Search("   ".to_string()))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let hits = catalog
            .list_places(&PlaceFilter::Search(" mall ".to_string()))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Mall B");
    }

    #[tokio::test]
    async fn test_create_review_for_missing_place_is_not_found() {
        let catalog = CatalogService::new(InMemoryRecordStore::new());
        let err = catalog
            .create_review(NewReview::today("nope", "Ani", 4, "Nice"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(catalog.store().review_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_review_recomputes_rating() {
        let catalog = CatalogService::new(InMemoryRecordStore::new());
        let place = catalog
            .create_place(new_place("Warung Semawis", Category::Restaurant))
            .await
            .unwrap();
        let review = catalog
            .create_review(NewReview::today(place.id.clone(), "Ani", 2, "Meh"))
            .await
            .unwrap()
            .into_value();
        assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 2.0);

        let outcome = catalog
            .update_review(&review.id, ReviewPatch::rating(5))
            .await
            .unwrap();
        assert!(!outcome.has_warnings());
        assert_eq!(outcome.value.rating, 5.0);
        assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 5.0);
    }
}
