//! Lookup of registered settings classes.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::error::SettingsError;
use crate::domain::instance::SettingsClass;
use crate::domain::schema::SettingsDescriptor;

/// Maps class identifiers to their descriptors.
pub trait SettingsRegistry: Send + Sync {
    /// Identifiers of every registered class.
    fn list(&self) -> Vec<String>;

    fn get(&self, identifier: &str) -> Result<Arc<SettingsDescriptor>, SettingsError>;
}

/// Registry populated once at startup.
///
/// Classes are addressable by full identifier or by short name.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    by_identifier: BTreeMap<String, Arc<SettingsDescriptor>>,
    by_short_name: BTreeMap<String, String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, replacing any class with the same identifier
    /// or short name.
    pub fn register(&mut self, descriptor: SettingsDescriptor) -> &mut Self {
        let identifier = descriptor.identifier().to_string();
        let short = descriptor.short_name().to_string();

        let previous = self.by_short_name.insert(short, identifier.clone());
        if let Some(previous) = previous.filter(|previous| *previous != identifier) {
            self.by_identifier.remove(&previous);
        }
        self.by_identifier.insert(identifier, Arc::new(descriptor));
        self
    }

    pub fn register_class<T: SettingsClass>(&mut self) -> &mut Self {
        self.register(T::descriptor())
    }

    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }
}

impl SettingsRegistry for StaticRegistry {
    fn list(&self) -> Vec<String> {
        self.by_identifier.keys().cloned().collect()
    }

    fn get(&self, identifier: &str) -> Result<Arc<SettingsDescriptor>, SettingsError> {
        self.by_identifier
            .get(identifier)
            .or_else(|| {
                self.by_short_name
                    .get(identifier)
                    .and_then(|full| self.by_identifier.get(full))
            })
            .cloned()
            .ok_or_else(|| SettingsError::UnknownSettingsClass(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{PropertyDescriptor, PropertyType};

    fn descriptor(identifier: &str) -> SettingsDescriptor {
        SettingsDescriptor::new(identifier).property(PropertyDescriptor::new(
            "enabled",
            PropertyType::Boolean,
            true,
        ))
    }

    #[test]
    fn get_accepts_identifier_or_short_name() {
        let mut registry = StaticRegistry::new();
        registry.register(descriptor("app::settings::Mailer"));

        assert_eq!(
            registry.get("app::settings::Mailer").expect("by identifier").short_name(),
            "Mailer"
        );
        assert_eq!(
            registry.get("Mailer").expect("by short name").identifier(),
            "app::settings::Mailer"
        );
    }

    #[test]
    fn unknown_class_is_an_error() {
        let registry = StaticRegistry::new();
        assert!(matches!(
            registry.get("Missing"),
            Err(SettingsError::UnknownSettingsClass(ref id)) if id == "Missing"
        ));
    }

    #[test]
    fn short_name_collision_replaces_previous_class() {
        let mut registry = StaticRegistry::new();
        registry
            .register(descriptor("billing::Settings"))
            .register(descriptor("mailer::Settings"));

        assert_eq!(registry.list(), vec!["mailer::Settings".to_string()]);
        assert_eq!(
            registry.get("Settings").expect("short name").identifier(),
            "mailer::Settings"
        );
    }
}
