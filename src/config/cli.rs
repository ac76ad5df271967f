use crate::config::toml_config::{LoggingConfig, TomlConfig};
use crate::config::StoreSettings;
use crate::domain::model::Category;
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::{validate_required_field, Validate};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "place-archive")]
#[command(about = "Archive of places worth visiting around the city")]
pub struct CliConfig {
    #[arg(long, global = true, env = "PLACE_ARCHIVE_CONFIG", help = "TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "PLACE_ARCHIVE_STORE_URL")]
    pub store_url: Option<String>,

    #[arg(long, global = true, env = "PLACE_ARCHIVE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List places, newest first
    Places {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        favorites: bool,
        #[arg(long)]
        visited: bool,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one place
    Show { id: String },
    /// Add a place
    CreatePlace {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        category: Category,
        #[arg(long)]
        image: String,
        #[arg(long)]
        opening_hours: Option<String>,
        #[arg(long)]
        ticket_price: Option<String>,
        #[arg(long = "facility")]
        facilities: Vec<String>,
    },
    /// Mark or unmark a place as favorite
    Favorite {
        id: String,
        #[arg(long)]
        off: bool,
    },
    /// Mark or unmark a place as visited
    Visit {
        id: String,
        #[arg(long)]
        off: bool,
    },
    /// Delete a place and its reviews
    Delete { id: String },
    /// Pick a random place; repeat --category to allow several
    Random {
        #[arg(long = "category")]
        categories: Vec<Category>,
    },
    /// Catalog-wide statistics
    Stats,
    /// Reviews of a place
    Reviews { place_id: String },
    /// Add a review
    ReviewAdd {
        #[arg(long)]
        place: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: String,
        #[arg(long, help = "YYYY-MM-DD, defaults to today")]
        date: Option<NaiveDate>,
    },
    /// Edit a review
    ReviewEdit {
        id: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Delete a review
    ReviewDelete { id: String },
    /// Review statistics of a place
    ReviewStats { place_id: String },
    /// Re-derive a place's rating from its reviews
    Recompute { place_id: String },
}

impl CliConfig {
    /// Merges the config file (if any) with flags and environment; flags win.
    pub fn resolve(&self) -> Result<(StoreSettings, LoggingConfig)> {
        let file = match &self.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };

        let (mut settings, mut logging) = match file {
            Some(file) => (Some(file.store), file.logging),
            None => (None, LoggingConfig::default()),
        };

        if let Some(url) = &self.store_url {
            settings = Some(match settings {
                Some(s) => StoreSettings {
                    url: url.clone(),
                    ..s
                },
                None => StoreSettings::new(url.clone(), self.api_key.clone().unwrap_or_default()),
            });
        }
        let mut settings = validate_required_field("store.url", &settings)?.clone();

        if let Some(key) = &self.api_key {
            settings.api_key = key.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            settings.timeout_seconds = timeout;
        }
        if settings.api_key.trim().is_empty() {
            return Err(CatalogError::MissingConfigError {
                field: "store.api_key".to_string(),
            });
        }
        settings.validate()?;

        logging.verbose |= self.verbose;
        logging.json |= self.json_logs;
        Ok((settings, logging))
    }
}
