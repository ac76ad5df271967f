use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::CatalogError;

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

record_id!(PlaceId);
record_id!(ReviewId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cafe,
    Restaurant,
    Mall,
    HistoricalPlace,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Cafe,
        Category::Restaurant,
        Category::Mall,
        Category::HistoricalPlace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cafe => "cafe",
            Category::Restaurant => "restaurant",
            Category::Mall => "mall",
            Category::HistoricalPlace => "historical_place",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                CatalogError::validation(
                    "category",
                    format!(
                        "unknown category '{}', expected one of: \
                         cafe, restaurant, mall, historical_place",
                        s
                    ),
                )
            })
    }
}

/// Category restriction for the random picker. `All` is the "every category" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
    AnyOf(Vec<Category>),
}

impl CategoryFilter {
    /// Builds a filter from a set of ticked categories.
    pub fn from_selection(selected: &[Category]) -> Self {
        if Category::ALL.iter().all(|c| selected.contains(c)) {
            CategoryFilter::All
        } else if let [single] = selected {
            CategoryFilter::Only(*single)
        } else {
            CategoryFilter::AnyOf(selected.to_vec())
        }
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
            CategoryFilter::AnyOf(set) => set.contains(&category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

/// A catalogued point of interest as stored in the `places` table.
///
/// Field names are snake_case on the wire. Records written by older clients used camelCase
/// for a few fields; rows are decoded through [`PlaceRow`] so nothing past this type ever
/// sees the legacy spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlaceRow")]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub description: String,
    pub address: String,
    pub category: Category,
    pub image: String,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<String>,
    pub facilities: Vec<String>,
    pub visited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visited_date: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// A row may carry both spellings of a field (older clients copied the snake_case columns
// into camelCase keys). The snake_case value wins when it is present.
#[derive(Deserialize)]
struct PlaceRow {
    id: PlaceId,
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    address: String,
    category: Category,
    #[serde(default, deserialize_with = "null_as_default")]
    image: String,
    #[serde(default, deserialize_with = "lenient_number")]
    rating: f64,
    #[serde(default)]
    opening_hours: Option<String>,
    #[serde(default, rename = "openingHours")]
    opening_hours_legacy: Option<String>,
    #[serde(default)]
    ticket_price: Option<String>,
    #[serde(default, rename = "ticketPrice")]
    ticket_price_legacy: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    facilities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    visited: bool,
    #[serde(default)]
    visited_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "visitedDate")]
    visited_date_legacy: Option<DateTime<Utc>>,
    #[serde(default)]
    is_favorite: Option<bool>,
    #[serde(default, rename = "isFavorite")]
    is_favorite_legacy: Option<bool>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt")]
    created_at_legacy: Option<DateTime<Utc>>,
}

impl From<PlaceRow> for Place {
    fn from(row: PlaceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            address: row.address,
            category: row.category,
            image: row.image,
            rating: row.rating,
            opening_hours: row.opening_hours.or(row.opening_hours_legacy),
            ticket_price: row.ticket_price.or(row.ticket_price_legacy),
            facilities: row.facilities,
            visited: row.visited,
            visited_date: row.visited_date.or(row.visited_date_legacy),
            is_favorite: row.is_favorite.or(row.is_favorite_legacy).unwrap_or_default(),
            created_at: row.created_at.or(row.created_at_legacy),
        }
    }
}

impl Place {
    /// Case-insensitive substring match over name, description and address.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.name, &self.description, &self.address]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Fields accepted when creating a place. The store assigns the id and a zero rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlace {
    pub name: String,
    pub description: String,
    pub address: String,
    pub category: Category,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facilities: Vec<String>,
}

impl NewPlace {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        address: impl Into<String>,
        category: Category,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            address: address.into(),
            category,
            image: image.into(),
            opening_hours: None,
            ticket_price: None,
            facilities: Vec::new(),
        }
    }

    pub fn with_opening_hours(mut self, hours: impl Into<String>) -> Self {
        self.opening_hours = Some(hours.into());
        self
    }

    pub fn with_ticket_price(mut self, price: impl Into<String>) -> Self {
        self.ticket_price = Some(price.into());
        self
    }

    pub fn with_facility(mut self, label: impl Into<String>) -> Self {
        self.facilities.push(label.into());
        self
    }

    /// Trims text and turns blank optional fields into `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            address: self.address.trim().to_string(),
            category: self.category,
            image: self.image.trim().to_string(),
            opening_hours: trim_optional(self.opening_hours),
            ticket_price: trim_optional(self.ticket_price),
            facilities: self
                .facilities
                .into_iter()
                .map(|f| f.trim().to_string())
                .collect(),
        }
    }
}

/// Partial update of a place. `None` leaves a field untouched; for the clearable
/// optional fields `Some(None)` writes a null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlacePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visited: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visited_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl PlacePatch {
    /// Patch carrying only a derived rating.
    pub fn rating(value: f64) -> Self {
        Self {
            rating: Some(value),
            ..Self::default()
        }
    }

    pub fn favorite(is_favorite: bool) -> Self {
        Self {
            is_favorite: Some(is_favorite),
            ..Self::default()
        }
    }

    pub fn visited_at(at: DateTime<Utc>) -> Self {
        Self {
            visited: Some(true),
            visited_date: Some(Some(at)),
            ..Self::default()
        }
    }

    pub fn not_visited() -> Self {
        Self {
            visited: Some(false),
            visited_date: Some(None),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|v| v.trim().to_string()),
            description: self.description.map(|v| v.trim().to_string()),
            address: self.address.map(|v| v.trim().to_string()),
            image: self.image.map(|v| v.trim().to_string()),
            opening_hours: self.opening_hours.map(trim_optional),
            ticket_price: self.ticket_price.map(trim_optional),
            facilities: self
                .facilities
                .map(|list| list.into_iter().map(|f| f.trim().to_string()).collect()),
            ..self
        }
    }

    pub fn apply_to(&self, place: &mut Place) {
        if let Some(name) = &self.name {
            place.name = name.clone();
        }
        if let Some(description) = &self.description {
            place.description = description.clone();
        }
        if let Some(address) = &self.address {
            place.address = address.clone();
        }
        if let Some(category) = self.category {
            place.category = category;
        }
        if let Some(image) = &self.image {
            place.image = image.clone();
        }
        if let Some(hours) = &self.opening_hours {
            place.opening_hours = hours.clone();
        }
        if let Some(price) = &self.ticket_price {
            place.ticket_price = price.clone();
        }
        if let Some(facilities) = &self.facilities {
            place.facilities = facilities.clone();
        }
        if let Some(rating) = self.rating {
            place.rating = rating;
        }
        if let Some(visited) = self.visited {
            place.visited = visited;
        }
        if let Some(visited_date) = self.visited_date {
            place.visited_date = visited_date;
        }
        if let Some(is_favorite) = self.is_favorite {
            place.is_favorite = is_favorite;
        }
    }
}

/// A single rated comment attached to one place (`reviews` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReviewRow")]
pub struct Review {
    pub id: ReviewId,
    pub place_id: PlaceId,
    pub author: String,
    pub rating: f64,
    pub comment: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ReviewRow {
    id: ReviewId,
    #[serde(default)]
    place_id: Option<PlaceId>,
    #[serde(default, rename = "placeId")]
    place_id_legacy: Option<PlaceId>,
    #[serde(default, deserialize_with = "null_as_default")]
    author: String,
    #[serde(deserialize_with = "lenient_number")]
    rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    comment: String,
    date: NaiveDate,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt")]
    created_at_legacy: Option<DateTime<Utc>>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = String;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let place_id = row
            .place_id
            .or(row.place_id_legacy)
            .ok_or_else(|| format!("review {} has no place_id", row.id))?;
        Ok(Self {
            id: row.id,
            place_id,
            author: row.author,
            rating: row.rating,
            comment: row.comment,
            date: row.date,
            created_at: row.created_at.or(row.created_at_legacy),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub place_id: PlaceId,
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub date: NaiveDate,
}

impl NewReview {
    pub fn new(
        place_id: impl Into<PlaceId>,
        author: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            place_id: place_id.into(),
            author: author.into(),
            rating,
            comment: comment.into(),
            date,
        }
    }

    /// Review dated today (UTC).
    pub fn today(
        place_id: impl Into<PlaceId>,
        author: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
    ) -> Self {
        Self::new(place_id, author, rating, comment, Utc::now().date_naive())
    }

    pub fn normalized(self) -> Self {
        Self {
            author: self.author.trim().to_string(),
            comment: self.comment.trim().to_string(),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ReviewPatch {
    pub fn rating(value: u8) -> Self {
        Self {
            rating: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn normalized(self) -> Self {
        Self {
            author: self.author.map(|v| v.trim().to_string()),
            comment: self.comment.map(|v| v.trim().to_string()),
            ..self
        }
    }

    pub fn apply_to(&self, review: &mut Review) {
        if let Some(author) = &self.author {
            review.author = author.clone();
        }
        if let Some(rating) = self.rating {
            review.rating = f64::from(rating);
        }
        if let Some(comment) = &self.comment {
            review.comment = comment.clone();
        }
        if let Some(date) = self.date {
            review.date = date;
        }
    }
}

/// Which places a listing returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaceFilter {
    #[default]
    All,
    Category(Category),
    Favorites,
    Visited,
    Search(String),
}

impl PlaceFilter {
    pub fn matches(&self, place: &Place) -> bool {
        match self {
            PlaceFilter::All => true,
            PlaceFilter::Category(c) => place.category == *c,
            PlaceFilter::Favorites => place.is_favorite,
            PlaceFilter::Visited => place.visited,
            PlaceFilter::Search(query) => place.matches_text(query),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingBucket {
    pub rating: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStatistics {
    pub total_reviews: usize,
    pub average_rating: f64,
    /// Always five buckets, 5 stars first.
    pub rating_distribution: Vec<RatingBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStatistics {
    pub total: usize,
    pub visited: usize,
    pub favorites: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub average_rating: f64,
    pub favorite_category: Option<Category>,
}

/// Presentation data that may be stale after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvalidationKey {
    PlaceLists,
    Place(PlaceId),
    Reviews(PlaceId),
    Review(ReviewId),
    ReviewStatistics(PlaceId),
    CatalogStatistics,
}

impl fmt::Display for InvalidationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationKey::PlaceLists => write!(f, "places"),
            InvalidationKey::Place(id) => write!(f, "place/{}", id),
            InvalidationKey::Reviews(id) => write!(f, "reviews/{}", id),
            InvalidationKey::Review(id) => write!(f, "review/{}", id),
            InvalidationKey::ReviewStatistics(id) => write!(f, "review-statistics/{}", id),
            InvalidationKey::CatalogStatistics => write!(f, "statistics"),
        }
    }
}

/// Secondary problem reported next to a mutation that itself succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogWarning {
    StaleRating { place_id: PlaceId, reason: String },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogWarning::StaleRating { place_id, reason } => write!(
                f,
                "rating of place {} may be stale: {}",
                place_id, reason
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub value: T,
    pub warnings: Vec<CatalogWarning>,
}

impl<T> MutationOutcome<T> {
    pub fn new(value: T, warnings: Vec<CatalogWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// numeric columns come back as numbers or, from some clients, as strings
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Raw::Number(n)) => Ok(n),
        Some(Raw::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
