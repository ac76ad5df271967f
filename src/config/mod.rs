#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::rest_store::{
    DEFAULT_PLACES_TABLE, DEFAULT_REVIEWS_TABLE, DEFAULT_TIMEOUT_SECS,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};

/// Where the hosted record store lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_places_table")]
    pub places_table: String,
    #[serde(default = "default_reviews_table")]
    pub reviews_table: String,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_places_table() -> String {
    DEFAULT_PLACES_TABLE.to_string()
}

fn default_reviews_table() -> String {
    DEFAULT_REVIEWS_TABLE.to_string()
}

impl StoreSettings {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout_seconds: default_timeout(),
            places_table: default_places_table(),
            reviews_table: default_reviews_table(),
        }
    }
}

impl Validate for StoreSettings {
    fn validate(&self) -> Result<()> {
        reject_unresolved_var("store.url", &self.url)?;
        reject_unresolved_var("store.api_key", &self.api_key)?;
        validate_url("store.url", &self.url)?;
        validate_non_empty_string("store.api_key", &self.api_key)?;
        validate_positive_number("store.timeout_seconds", self.timeout_seconds, 1)?;
        validate_non_empty_string("store.places_table", &self.places_table)?;
        validate_non_empty_string("store.reviews_table", &self.reviews_table)
    }
}

// `${VAR}` placeholders survive substitution when the variable is unset
fn reject_unresolved_var(field: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(CatalogError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "environment variable is not set".to_string(),
        });
    }
    Ok(())
}

impl ConfigProvider for StoreSettings {
    fn store_url(&self) -> &str {
        &self.url
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn request_timeout_secs(&self) -> u64 {
        self.timeout_seconds
    }

    fn places_table(&self) -> &str {
        &self.places_table
    }

    fn reviews_table(&self) -> &str {
        &self.reviews_table
    }
}
