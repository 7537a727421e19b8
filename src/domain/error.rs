use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("settings class `{class}` has no property `{property}`")]
    UnknownProperty { class: String, property: String },
    #[error("settings class `{class}` is missing a value for `{property}`")]
    MissingProperty { class: String, property: String },
    #[error("property `{class}.{property}` expects {expected}, got {found}")]
    PropertyTypeMismatch {
        class: String,
        property: String,
        expected: String,
        found: &'static str,
    },
}

impl DomainError {
    pub fn unknown_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    pub fn missing_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    pub fn type_mismatch(
        class: impl Into<String>,
        property: impl Into<String>,
        expected: impl Into<String>,
        found: &'static str,
    ) -> Self {
        Self::PropertyTypeMismatch {
            class: class.into(),
            property: property.into(),
            expected: expected.into(),
            found,
        }
    }
}
