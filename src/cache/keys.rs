//! Cache key for a single resolved property.

use std::fmt;

/// Identifies one property of one settings class.
///
/// Rendered as `"<ShortClassName>.<property>"`; the class short name doubles
/// as the invalidation tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingsKey {
    class: String,
    property: String,
}

impl SettingsKey {
    pub fn new(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            property: property.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.class
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_class_dot_property() {
        let key = SettingsKey::new("Billing", "currency");
        assert_eq!(key.to_string(), "Billing.currency");
        assert_eq!(key.tag(), "Billing");
        assert_eq!(key.property(), "currency");
    }
}
