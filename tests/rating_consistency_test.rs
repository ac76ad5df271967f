mod common;

use common::{new_place, FlakyStore};
use place_archive::adapters::CollectingSink;
use place_archive::domain::model::{CatalogWarning, InvalidationKey};
use place_archive::{
    CatalogError, CatalogService, Category, InMemoryRecordStore, NewReview, PlaceId, RecordStore,
    ReviewPatch,
};
use std::sync::Arc;

async fn add_review(catalog: &CatalogService<impl RecordStore>, place_id: &PlaceId, rating: u8) {
    let outcome = catalog
        .create_review(NewReview::today(place_id.clone(), "Dewi", rating, "Worth it"))
        .await
        .unwrap();
    assert!(!outcome.has_warnings(), "unexpected warnings: {:?}", outcome.warnings);
}

#[tokio::test]
async fn test_rating_follows_review_mutations() {
    let catalog = CatalogService::new(InMemoryRecordStore::new());
    let place = catalog
        .create_place(new_place("Tahu Gimbal Pak Edi", Category::Restaurant))
        .await
        .unwrap();

    for rating in [5, 4, 3] {
        add_review(&catalog, &place.id, rating).await;
    }
    assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 4.0);

    add_review(&catalog, &place.id, 2).await;
    assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 3.5);

    let stats = catalog.review_statistics(&place.id).await.unwrap();
    assert_eq!(stats.total_reviews, 4);
    assert_eq!(stats.average_rating, 3.5);
    let bucket_sum: usize = stats.rating_distribution.iter().map(|b| b.count).sum();
    assert_eq!(bucket_sum, stats.total_reviews);
}

#[tokio::test]
async fn test_deleting_last_review_resets_rating() {
    let catalog = CatalogService::new(InMemoryRecordStore::new());
    let place = catalog
        .create_place(new_place("Pagoda Avalokitesvara", Category::HistoricalPlace))
        .await
        .unwrap();
    let review = catalog
        .create_review(NewReview::today(place.id.clone(), "Yusuf", 5, "Beautiful"))
        .await
        .unwrap()
        .into_value();
    assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 5.0);

    let outcome = catalog.delete_review(&review.id).await.unwrap();
    assert_eq!(outcome.value.id, review.id);
    assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 0.0);
}

#[tokio::test]
async fn test_recompute_heals_a_stale_rating() {
    let store = Arc::new(FlakyStore::new());
    let catalog = CatalogService::with_shared_store(store.clone());
    let place = catalog
        .create_place(new_place("Kopi Tjap Oen", Category::Cafe))
        .await
        .unwrap();

    store.fail_place_updates(true);
    let outcome = catalog
        .create_review(NewReview::today(place.id.clone(), "Lina", 4, "Cozy"))
        .await
        .unwrap();

    // the review itself is kept
    assert_eq!(outcome.value.rating, 4.0);
    assert_eq!(catalog.list_reviews(&place.id).await.unwrap().len(), 1);
    match outcome.warnings.as_slice() {
        [CatalogWarning::StaleRating { place_id, .. }] => assert_eq!(place_id, &place.id),
        other => panic!("expected one stale-rating warning, got {:?}", other),
    }
    assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 0.0);

    store.fail_place_updates(false);
    assert_eq!(catalog.recompute_rating(&place.id).await.unwrap(), 4.0);
    assert_eq!(catalog.recompute_rating(&place.id).await.unwrap(), 4.0);
    assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 4.0);
}

#[tokio::test]
async fn test_invalid_review_never_reaches_the_store() {
    let store = Arc::new(FlakyStore::new());
    let catalog = CatalogService::with_shared_store(store.clone());
    let place = catalog
        .create_place(new_place("Mie Kopyok", Category::Restaurant))
        .await
        .unwrap();
    let before = store.calls();

    let err = catalog
        .create_review(NewReview::today(place.id.clone(), "Rudi", 6, "Too good"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ValidationError { ref field, .. } if field == "rating"));

    let err = catalog
        .create_review(NewReview::today(place.id.clone(), "Rudi", 3, "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ValidationError { ref field, .. } if field == "comment"));

    assert_eq!(store.calls(), before);
}

#[tokio::test]
async fn test_edit_of_missing_review_is_not_found() {
    let catalog = CatalogService::new(InMemoryRecordStore::new());
    let err = catalog
        .update_review(&"missing".into(), ReviewPatch::rating(3))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = catalog.delete_review(&"missing".into()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_place_cascades_to_reviews() {
    let store = Arc::new(FlakyStore::new());
    let catalog = CatalogService::with_shared_store(store.clone());
    let keep = catalog
        .create_place(new_place("Semawis", Category::Restaurant))
        .await
        .unwrap();
    let doomed = catalog
        .create_place(new_place("Citraland Mall", Category::Mall))
        .await
        .unwrap();
    add_review(&catalog, &keep.id, 4).await;
    add_review(&catalog, &doomed.id, 2).await;
    add_review(&catalog, &doomed.id, 3).await;

    catalog.delete_place(&doomed.id).await.unwrap();

    assert!(catalog.get_place(&doomed.id).await.unwrap_err().is_not_found());
    let remaining = store.inner.all_reviews().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].place_id, keep.id);

    let err = catalog.delete_place(&doomed.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_failed_place_delete_resets_rating() {
    let store = Arc::new(FlakyStore::new());
    let catalog = CatalogService::with_shared_store(store.clone());
    let place = catalog
        .create_place(new_place("Toko Oen", Category::Restaurant))
        .await
        .unwrap();
    add_review(&catalog, &place.id, 5).await;
    add_review(&catalog, &place.id, 3).await;
    assert_eq!(catalog.get_place(&place.id).await.unwrap().rating, 4.0);

    store.fail_place_deletes(true);
    let err = catalog.delete_place(&place.id).await.unwrap_err();
    assert!(err.is_store_error());

    // the place survives without reviews, so its rating follows them down to 0
    let survivor = catalog.get_place(&place.id).await.unwrap();
    assert_eq!(survivor.rating, 0.0);
    assert!(catalog.list_reviews(&place.id).await.unwrap().is_empty());

    store.fail_place_deletes(false);
    catalog.delete_place(&place.id).await.unwrap();
    assert!(catalog.get_place(&place.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_clear_places_removes_everything() {
    let store = InMemoryRecordStore::new();
    let catalog = CatalogService::new(store.clone());
    let a = catalog.create_place(new_place("A place", Category::Cafe)).await.unwrap();
    catalog.create_place(new_place("B place", Category::Mall)).await.unwrap();
    add_review(&catalog, &a.id, 5).await;

    assert_eq!(catalog.clear_places().await.unwrap(), 2);
    assert_eq!(store.place_count().await, 0);
    assert_eq!(store.review_count().await, 0);
}

#[tokio::test]
async fn test_review_mutation_publishes_invalidation() {
    let sink = Arc::new(CollectingSink::default());
    let catalog = CatalogService::new(InMemoryRecordStore::new()).with_sink(sink.clone());
    let place = catalog
        .create_place(new_place("Klenteng Tay Kak Sie", Category::HistoricalPlace))
        .await
        .unwrap();
    sink.take();

    let review = catalog
        .create_review(NewReview::today(place.id.clone(), "Hana", 5, "Calm"))
        .await
        .unwrap()
        .into_value();

    let keys = sink.take();
    for expected in [
        InvalidationKey::Reviews(place.id.clone()),
        InvalidationKey::ReviewStatistics(place.id.clone()),
        InvalidationKey::Review(review.id.clone()),
        InvalidationKey::Place(place.id.clone()),
        InvalidationKey::PlaceLists,
    ] {
        assert!(keys.contains(&expected), "missing {}", expected);
    }
}

#[tokio::test]
async fn test_catalog_statistics_reflect_state() {
    let catalog = CatalogService::new(InMemoryRecordStore::new());
    let cafe = catalog.create_place(new_place("Cafe One", Category::Cafe)).await.unwrap();
    catalog.create_place(new_place("Cafe Two", Category::Cafe)).await.unwrap();
    let mall = catalog.create_place(new_place("Mall One", Category::Mall)).await.unwrap();

    catalog.set_visited(&cafe.id, true).await.unwrap();
    catalog.set_favorite(&mall.id, true).await.unwrap();
    add_review(&catalog, &cafe.id, 4).await;
    add_review(&catalog, &mall.id, 5).await;

    let stats = catalog.catalog_statistics().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.visited, 1);
    assert_eq!(stats.favorites, 1);
    assert_eq!(stats.favorite_category, Some(Category::Cafe));
    // (4 + 0 + 5) / 3
    assert_eq!(stats.average_rating, 3.0);
}
