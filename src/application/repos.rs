//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::SettingsRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Durable store of settings records, one row per class short name.
#[async_trait]
pub trait SettingsRecordRepo: Send + Sync {
    async fn find_by_class_name(
        &self,
        class_name: &str,
    ) -> Result<Option<SettingsRecord>, RepoError>;

    /// Insert-or-update keyed by the record's class name.
    ///
    /// Entries of an existing row are merged with the saved ones, so writers
    /// extending different properties do not drop each other's entries.
    async fn save(&self, record: SettingsRecord) -> Result<(), RepoError>;
}
