use thiserror::Error;

use crate::{
    application::{repos::RepoError, resources::ResourceError},
    domain::{error::DomainError, types::ValueKind},
    infra::error::InfraError,
};

/// Failures surfaced by settings resolution.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings class `{0}` is not registered")]
    UnknownSettingsClass(String),
    #[error("property type `{declared}` cannot be stored")]
    UnsupportedPropertyType { declared: String },
    #[error("stored date `{value}` is invalid; expected YYYY-MM-DD")]
    InvalidDateFormat { value: String },
    #[error("resource `{uri}` could not be resolved")]
    ResourceNotFound { uri: String },
    #[error("stored {kind} value has an incompatible shape: {found}")]
    ValueShape { kind: ValueKind, found: String },
    #[error("value cannot be stored: {0}")]
    UnsupportedValue(String),
    #[error(transparent)]
    Resource(ResourceError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("settings record persistence failed: {0}")]
    RecordPersistence(#[from] RepoError),
}

impl SettingsError {
    pub fn unsupported_type(declared: impl Into<String>) -> Self {
        Self::UnsupportedPropertyType {
            declared: declared.into(),
        }
    }

    pub fn value_shape(kind: ValueKind, found: impl Into<String>) -> Self {
        Self::ValueShape {
            kind,
            found: found.into(),
        }
    }
}

impl From<ResourceError> for SettingsError {
    fn from(error: ResourceError) -> Self {
        match error {
            ResourceError::NotFound { uri } => SettingsError::ResourceNotFound { uri },
            other => SettingsError::Resource(other),
        }
    }
}

/// Top-level error of the administrative binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
