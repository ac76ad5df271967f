use crate::domain::model::{NewPlace, NewReview, PlacePatch, ReviewPatch};
use crate::utils::error::{CatalogError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub const NAME_LENGTH: (usize, usize) = (1, 200);
pub const DESCRIPTION_LENGTH: (usize, usize) = (10, 1000);
pub const ADDRESS_LENGTH: (usize, usize) = (5, 500);
pub const OPTIONAL_TEXT_MAX: usize = 200;
pub const REVIEW_RATING_RANGE: (u8, u8) = (1, 5);

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CatalogError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| CatalogError::MissingConfigError {
            field: field_name.to_string(),
        })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

// Field checks for user input. These produce `ValidationError`, never a config error.

pub fn check_length(field_name: &str, value: &str, (min, max): (usize, usize)) -> Result<()> {
    let length = value.chars().count();
    if length < min {
        let message = if min == 1 {
            "is required".to_string()
        } else {
            format!("must be at least {} characters", min)
        };
        return Err(CatalogError::validation(field_name, message));
    }
    if length > max {
        return Err(CatalogError::validation(
            field_name,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

pub fn check_required_text(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::validation(field_name, "is required"));
    }
    Ok(())
}

pub fn check_optional_text(field_name: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(text) => check_length(field_name, text, (0, OPTIONAL_TEXT_MAX)),
        None => Ok(()),
    }
}

pub fn check_image_url(field_name: &str, value: &str) -> Result<()> {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !valid {
        return Err(CatalogError::validation(
            field_name,
            "must be an http(s) image URL",
        ));
    }
    Ok(())
}

pub fn check_facilities(field_name: &str, facilities: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for label in facilities {
        if label.trim().is_empty() {
            return Err(CatalogError::validation(
                field_name,
                "facility labels cannot be blank",
            ));
        }
        if !seen.insert(label.as_str()) {
            return Err(CatalogError::validation(
                field_name,
                format!("duplicate facility '{}'", label),
            ));
        }
    }
    Ok(())
}

pub fn check_review_rating(field_name: &str, rating: u8) -> Result<()> {
    let (min, max) = REVIEW_RATING_RANGE;
    if rating < min || rating > max {
        return Err(CatalogError::validation(
            field_name,
            format!("must be between {} and {}, got {}", min, max, rating),
        ));
    }
    Ok(())
}

impl Validate for NewPlace {
    fn validate(&self) -> Result<()> {
        check_length("name", &self.name, NAME_LENGTH)?;
        check_length("description", &self.description, DESCRIPTION_LENGTH)?;
        check_length("address", &self.address, ADDRESS_LENGTH)?;
        check_image_url("image", &self.image)?;
        check_optional_text("opening_hours", self.opening_hours.as_deref())?;
        check_optional_text("ticket_price", self.ticket_price.as_deref())?;
        check_facilities("facilities", &self.facilities)
    }
}

impl Validate for PlacePatch {
    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            check_length("name", name, NAME_LENGTH)?;
        }
        if let Some(description) = &self.description {
            check_length("description", description, DESCRIPTION_LENGTH)?;
        }
        if let Some(address) = &self.address {
            check_length("address", address, ADDRESS_LENGTH)?;
        }
        if let Some(image) = &self.image {
            check_image_url("image", image)?;
        }
        if let Some(hours) = &self.opening_hours {
            check_optional_text("opening_hours", hours.as_deref())?;
        }
        if let Some(price) = &self.ticket_price {
            check_optional_text("ticket_price", price.as_deref())?;
        }
        if let Some(facilities) = &self.facilities {
            check_facilities("facilities", facilities)?;
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(CatalogError::validation(
                    "rating",
                    format!("must be between 0 and 5, got {}", rating),
                ));
            }
        }

        // visited_date is present iff visited is true
        match (self.visited, &self.visited_date) {
            (None, None) | (Some(true), Some(Some(_))) | (Some(false), Some(None)) => Ok(()),
            (Some(true), _) => Err(CatalogError::validation(
                "visited_date",
                "a visited place needs a visit timestamp",
            )),
            (Some(false), _) => Err(CatalogError::validation(
                "visited_date",
                "an unvisited place cannot keep a visit timestamp",
            )),
            (None, Some(_)) => Err(CatalogError::validation(
                "visited_date",
                "can only change together with the visited flag",
            )),
        }
    }
}

impl Validate for NewReview {
    fn validate(&self) -> Result<()> {
        check_required_text("place_id", self.place_id.as_str())?;
        check_required_text("author", &self.author)?;
        check_review_rating("rating", self.rating)?;
        check_required_text("comment", &self.comment)
    }
}

impl Validate for ReviewPatch {
    fn validate(&self) -> Result<()> {
        if let Some(author) = &self.author {
            check_required_text("author", author)?;
        }
        if let Some(rating) = self.rating {
            check_review_rating("rating", rating)?;
        }
        if let Some(comment) = &self.comment {
            check_required_text("comment", comment)?;
        }
        Ok(())
    }
}
