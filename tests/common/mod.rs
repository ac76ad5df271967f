#![allow(dead_code)]

use async_trait::async_trait;
use place_archive::{
    CatalogError, Category, InMemoryRecordStore, NewPlace, NewReview, Place, PlaceFilter,
    PlaceId, PlacePatch, RecordStore, Result, Review, ReviewId, ReviewPatch,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory store that can be told to fail place writes, and counts every call.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryRecordStore,
    fail_place_updates: AtomicBool,
    fail_place_deletes: AtomicBool,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_place_updates(&self, fail: bool) {
        self.fail_place_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_place_deletes(&self, fail: bool) {
        self.fail_place_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn create_place(&self, place: &NewPlace) -> Result<Place> {
        self.hit();
        self.inner.create_place(place).await
    }

    async fn get_place(&self, id: &PlaceId) -> Result<Place> {
        self.hit();
        self.inner.get_place(id).await
    }

    async fn update_place(&self, id: &PlaceId, patch: &PlacePatch) -> Result<Place> {
        self.hit();
        if self.fail_place_updates.load(Ordering::SeqCst) {
            return Err(CatalogError::StoreStatus {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        self.inner.update_place(id, patch).await
    }

    async fn delete_place(&self, id: &PlaceId) -> Result<()> {
        self.hit();
        if self.fail_place_deletes.load(Ordering::SeqCst) {
            return Err(CatalogError::StoreStatus {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        self.inner.delete_place(id).await
    }

    async fn list_places(&self, filter: &PlaceFilter) -> Result<Vec<Place>> {
        self.hit();
        self.inner.list_places(filter).await
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review> {
        self.hit();
        self.inner.create_review(review).await
    }

    async fn get_review(&self, id: &ReviewId) -> Result<Review> {
        self.hit();
        self.inner.get_review(id).await
    }

    async fn update_review(&self, id: &ReviewId, patch: &ReviewPatch) -> Result<Review> {
        self.hit();
        self.inner.update_review(id, patch).await
    }

    async fn delete_review(&self, id: &ReviewId) -> Result<()> {
        self.hit();
        self.inner.delete_review(id).await
    }

    async fn list_reviews_by_place(&self, place_id: &PlaceId) -> Result<Vec<Review>> {
        self.hit();
        self.inner.list_reviews_by_place(place_id).await
    }
}

pub fn new_place(name: &str, category: Category) -> NewPlace {
    NewPlace::new(
        name,
        "A spot locals keep recommending",
        "Jl. Pandanaran, Semarang",
        category,
        "https://img.example/place.jpg",
    )
}

pub fn stored_place(id: &str, category: Category) -> Place {
    Place {
        id: PlaceId::from(id),
        name: id.to_string(),
        description: "A spot locals keep recommending".to_string(),
        address: "Semarang".to_string(),
        category,
        image: "https://img.example/place.jpg".to_string(),
        rating: 0.0,
        opening_hours: None,
        ticket_price: None,
        facilities: Vec::new(),
        visited: false,
        visited_date: None,
        is_favorite: false,
        created_at: None,
    }
}
