use crate::domain::model::{
    NewPlace, NewReview, Place, PlaceFilter, PlaceId, PlacePatch, Review, ReviewId, ReviewPatch,
};
use crate::domain::ports::{ConfigProvider, RecordStore};
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PLACES_TABLE: &str = "places";
pub const DEFAULT_REVIEWS_TABLE: &str = "reviews";

/// Record store backed by the hosted PostgREST API (`/rest/v1/<table>`).
///
/// Row filters use the `column=eq.value` syntax, single-row reads and writes come back as
/// arrays, and writes ask for `return=representation` so the stored row is returned.
#[derive(Debug, Clone)]
pub struct RestRecordStore {
    client: Client,
    base_url: String,
    api_key: String,
    places_table: String,
    reviews_table: String,
}

#[derive(Serialize)]
struct PlaceInsert<'a> {
    #[serde(flatten)]
    place: &'a NewPlace,
    rating: f64,
}

impl RestRecordStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            places_table: DEFAULT_PLACES_TABLE.to_string(),
            reviews_table: DEFAULT_REVIEWS_TABLE.to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let store = Self::with_timeout(
            config.store_url(),
            config.api_key(),
            Duration::from_secs(config.request_timeout_secs()),
        )?;
        Ok(store.with_tables(config.places_table(), config.reviews_table()))
    }

    pub fn with_tables(mut self, places: impl Into<String>, reviews: impl Into<String>) -> Self {
        self.places_table = places.into();
        self.reviews_table = reviews.into();
        self
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, table);
        tracing::debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
    }

    fn write_request(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, table)
            .header("Prefer", "return=representation")
    }

    async fn rows<T: DeserializeOwned>(builder: RequestBuilder) -> Result<Vec<T>> {
        let response = checked(builder.send().await?).await?;
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn single<T: DeserializeOwned>(
        builder: RequestBuilder,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        Self::rows(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(kind, id))
    }
}

async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %message, "store request rejected");
    Err(CatalogError::StoreStatus {
        status: status.as_u16(),
        message,
    })
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// `or=(...)` expression for a case-insensitive substring search.
///
/// Characters that carry meaning in the filter grammar are dropped from the query.
pub fn search_expression(query: &str) -> String {
    let cleaned: String = query
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '%' | '"' | '\\'))
        .collect();
    let pattern = format!("*{}*", cleaned);
    format!(
        "(name.ilike.{p},address.ilike.{p},description.ilike.{p})",
        p = pattern
    )
}

fn list_query(filter: &PlaceFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", "*".to_string())];
    match filter {
        PlaceFilter::All => {}
        PlaceFilter::Category(category) => query.push(("category", eq(category.as_str()))),
        PlaceFilter::Favorites => query.push(("is_favorite", eq("true"))),
        PlaceFilter::Visited => query.push(("visited", eq("true"))),
        PlaceFilter::Search(text) if text.trim().is_empty() => {}
        PlaceFilter::Search(text) => query.push(("or", search_expression(text))),
    }
    let order = match filter {
        PlaceFilter::Visited => "visited_date.desc",
        _ => "created_at.desc",
    };
    query.push(("order", order.to_string()));
    query
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn create_place(&self, place: &NewPlace) -> Result<Place> {
        let insert = PlaceInsert { place, rating: 0.0 };
        let builder = self
            .write_request(Method::POST, &self.places_table)
            .json(&[insert]);
        let created: Place = Self::rows(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::StoreStatus {
                status: 200,
                message: "insert returned no row".to_string(),
            })?;
        Ok(created)
    }

    async fn get_place(&self, id: &PlaceId) -> Result<Place> {
        let builder = self
            .request(Method::GET, &self.places_table)
            .query(&[("select", "*".to_string()), ("id", eq(id.as_str()))]);
        Self::single(builder, "place", id.as_str()).await
    }

    async fn update_place(&self, id: &PlaceId, patch: &PlacePatch) -> Result<Place> {
        let builder = self
            .write_request(Method::PATCH, &self.places_table)
            .query(&[("id", eq(id.as_str()))])
            .json(patch);
        Self::single(builder, "place", id.as_str()).await
    }

    async fn delete_place(&self, id: &PlaceId) -> Result<()> {
        let builder = self
            .request(Method::DELETE, &self.places_table)
            .query(&[("id", eq(id.as_str()))]);
        checked(builder.send().await?).await?;
        Ok(())
    }

    async fn list_places(&self, filter: &PlaceFilter) -> Result<Vec<Place>> {
        let builder = self
            .request(Method::GET, &self.places_table)
            .query(&list_query(filter));
        Self::rows(builder).await
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review> {
        let builder = self
            .write_request(Method::POST, &self.reviews_table)
            .json(&[review]);
        Self::rows(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::StoreStatus {
                status: 200,
                message: "insert returned no row".to_string(),
            })
    }

    async fn get_review(&self, id: &ReviewId) -> Result<Review> {
        let builder = self
            .request(Method::GET, &self.reviews_table)
            .query(&[("select", "*".to_string()), ("id", eq(id.as_str()))]);
        Self::single(builder, "review", id.as_str()).await
    }

    async fn update_review(&self, id: &ReviewId, patch: &ReviewPatch) -> Result<Review> {
        let builder = self
            .write_request(Method::PATCH, &self.reviews_table)
            .query(&[("id", eq(id.as_str()))])
            .json(patch);
        Self::single(builder, "review", id.as_str()).await
    }

    async fn delete_review(&self, id: &ReviewId) -> Result<()> {
        let builder = self
            .request(Method::DELETE, &self.reviews_table)
            .query(&[("id", eq(id.as_str()))]);
        checked(builder.send().await?).await?;
        Ok(())
    }

    async fn list_reviews_by_place(&self, place_id: &PlaceId) -> Result<Vec<Review>> {
        let builder = self.request(Method::GET, &self.reviews_table).query(&[
            ("select", "*".to_string()),
            ("place_id", eq(place_id.as_str())),
            ("order", "created_at.desc".to_string()),
        ]);
        Self::rows(builder).await
    }

    async fn delete_reviews_by_place(&self, place_id: &PlaceId) -> Result<usize> {
        let builder = self
            .write_request(Method::DELETE, &self.reviews_table)
            .query(&[("place_id", eq(place_id.as_str()))]);
        let removed: Vec<serde_json::Value> = Self::rows(builder).await?;
        Ok(removed.len())
    }
}
