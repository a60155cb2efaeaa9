//! Error types for catalog operations

use thiserror::Error;

/// Errors that can occur while resolving, composing, or executing catalog queries
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Schema introspection failed or returned something unusable
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// An update request carried no value that differs from the stored row
    #[error("No changes: {0}")]
    NoChanges(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn no_changes(msg: impl Into<String>) -> Self {
        Self::NoChanges(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether the error was caused by the request rather than the database.
    ///
    /// Transport layers map these to client errors and everything else to
    /// server errors.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NoChanges(_) | Self::NotFound(_) | Self::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
