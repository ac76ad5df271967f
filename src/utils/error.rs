use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Store request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Store returned {status}: {message}")]
    StoreStatus { status: u16, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Validation,
    Store,
    Configuration,
}

impl CatalogError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CatalogError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CatalogError::NotFound { .. } => ErrorCategory::NotFound,
            CatalogError::ValidationError { .. } => ErrorCategory::Validation,
            CatalogError::ApiError(_)
            | CatalogError::StoreStatus { .. }
            | CatalogError::SerializationError(_) => ErrorCategory::Store,
            CatalogError::IoError(_)
            | CatalogError::ConfigValidationError { .. }
            | CatalogError::InvalidConfigValueError { .. }
            | CatalogError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn is_store_error(&self) -> bool {
        self.category() == ErrorCategory::Store
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// 給使用者看的錯誤訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            CatalogError::NotFound { kind, id } => format!("No {} with id {}", kind, id),
            CatalogError::ValidationError { field, message } => {
                format!("{}: {}", field, message)
            }
            CatalogError::ApiError(e) if e.is_timeout() => {
                "The record store did not answer in time".to_string()
            }
            CatalogError::ApiError(_) => "Could not reach the record store".to_string(),
            CatalogError::StoreStatus { status, .. } => {
                format!("The record store rejected the request (HTTP {})", status)
            }
            CatalogError::SerializationError(_) => {
                "The record store sent data that could not be read".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::NotFound => "Check the id; the record may have been deleted",
            ErrorCategory::Validation => "Fix the highlighted field and submit again",
            ErrorCategory::Store => "Check the network and the store URL, then retry",
            ErrorCategory::Configuration => {
                "Check the command line flags, environment and config file"
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::NotFound => 4,
            ErrorCategory::Validation => 2,
            ErrorCategory::Store => 1,
            ErrorCategory::Configuration => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
