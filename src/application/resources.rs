//! Conversion between resource references and their URIs.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::values::ResourceObject;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("no resource found at `{uri}`")]
    NotFound { uri: String },
    #[error("resource `{type_name}` with id `{id}` has no URI")]
    Unaddressable { type_name: String, id: String },
    #[error("resource lookup failed: {0}")]
    Backend(String),
}

impl ResourceError {
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::NotFound { uri: uri.into() }
    }
}

#[async_trait]
pub trait ResourceResolver: Send + Sync {
    async fn to_uri(&self, resource: &ResourceObject) -> Result<String, ResourceError>;

    async fn from_uri(&self, uri: &str) -> Result<ResourceObject, ResourceError>;
}
