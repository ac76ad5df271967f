use crate::domain::model::{
    NewPlace, NewReview, Place, PlaceFilter, PlaceId, PlacePatch, Review, ReviewId, ReviewPatch,
};
use crate::domain::ports::RecordStore;
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    // insertion order; listings walk it backwards for "newest first"
    places: Vec<Place>,
    reviews: Vec<Review>,
}

/// Process-local record store with the same contract as the hosted one.
///
/// Like the hosted tables it does not cascade: deleting a place leaves its reviews behind.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn place_count(&self) -> usize {
        self.tables.read().await.places.len()
    }

    pub async fn review_count(&self) -> usize {
        self.tables.read().await.reviews.len()
    }

    pub async fn all_reviews(&self) -> Vec<Review> {
        self.tables.read().await.reviews.clone()
    }
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create_place(&self, place: &NewPlace) -> Result<Place> {
        let record = Place {
            id: PlaceId::new(new_id()),
            name: place.name.clone(),
            description: place.description.clone(),
            address: place.address.clone(),
            category: place.category,
            image: place.image.clone(),
            rating: 0.0,
            opening_hours: place.opening_hours.clone(),
            ticket_price: place.ticket_price.clone(),
            facilities: place.facilities.clone(),
            visited: false,
            visited_date: None,
            is_favorite: false,
            created_at: Some(Utc::now()),
        };
        self.tables.write().await.places.push(record.clone());
        Ok(record)
    }

    async fn get_place(&self, id: &PlaceId) -> Result<Place> {
        self.tables
            .read()
            .await
            .places
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("place", id.as_str()))
    }

    async fn update_place(&self, id: &PlaceId, patch: &PlacePatch) -> Result<Place> {
        let mut tables = self.tables.write().await;
        let place = tables
            .places
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CatalogError::not_found("place", id.as_str()))?;
        patch.apply_to(place);
        Ok(place.clone())
    }

    async fn delete_place(&self, id: &PlaceId) -> Result<()> {
        self.tables.write().await.places.retain(|p| &p.id != id);
        Ok(())
    }

    async fn list_places(&self, filter: &PlaceFilter) -> Result<Vec<Place>> {
        let tables = self.tables.read().await;
        let mut places: Vec<Place> = tables
            .places
            .iter()
            .rev()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        if *filter == PlaceFilter::Visited {
            places.sort_by(|a, b| b.visited_date.cmp(&a.visited_date));
        }
        Ok(places)
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review> {
        let record = Review {
            id: ReviewId::new(new_id()),
            place_id: review.place_id.clone(),
            author: review.author.clone(),
            rating: f64::from(review.rating),
            comment: review.comment.clone(),
            date: review.date,
            created_at: Some(Utc::now()),
        };
        self.tables.write().await.reviews.push(record.clone());
        Ok(record)
    }

    async fn get_review(&self, id: &ReviewId) -> Result<Review> {
        self.tables
            .read()
            .await
            .reviews
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("review", id.as_str()))
    }

    async fn update_review(&self, id: &ReviewId, patch: &ReviewPatch) -> Result<Review> {
        let mut tables = self.tables.write().await;
        let review = tables
            .reviews
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| CatalogError::not_found("review", id.as_str()))?;
        patch.apply_to(review);
        Ok(review.clone())
    }

    async fn delete_review(&self, id: &ReviewId) -> Result<()> {
        self.tables.write().await.reviews.retain(|r| &r.id != id);
        Ok(())
    }

    async fn list_reviews_by_place(&self, place_id: &PlaceId) -> Result<Vec<Review>> {
        Ok(self
            .tables
            .read()
            .await
            .reviews
            .iter()
            .rev()
            .filter(|r| &r.place_id == place_id)
            .cloned()
            .collect())
    }

    async fn delete_reviews_by_place(&self, place_id: &PlaceId) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.reviews.len();
        tables.reviews.retain(|r| &r.place_id != place_id);
        Ok(before - tables.reviews.len())
    }
}
