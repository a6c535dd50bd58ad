use thiserror::Error;

use crate::config::ConfigLoadError;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// The backing store rejected or failed a call, including a multi-row
    /// read that broke off partway through.
    #[error("{operation} failed: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: &'static str },

    #[error("Deadline exceeded: {operation}")]
    DeadlineExceeded { operation: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigLoadError),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl CatalogError {
    pub fn storage(operation: &'static str, source: sqlx::Error) -> Self {
        CatalogError::Storage { operation, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }

    /// True for both explicit cancellation and an expired deadline.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            CatalogError::Cancelled { .. }
                | CatalogError::DeadlineExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
