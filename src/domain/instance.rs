//! Immutable, fully materialized settings values.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::error::DomainError;
use crate::domain::schema::SettingsDescriptor;
use crate::domain::values::{FromSettingValue, SettingValue};

/// Resolved settings for one class. Every declared property has a value.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsInstance {
    identifier: String,
    class_name: String,
    values: BTreeMap<String, SettingValue>,
}

impl SettingsInstance {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn get(&self, property: &str) -> Option<&SettingValue> {
        self.values.get(property)
    }

    /// Typed access to a property.
    pub fn value<T>(&self, property: &str) -> Result<T, DomainError>
    where
        T: FromSettingValue,
    {
        let value = self
            .values
            .get(property)
            .ok_or_else(|| DomainError::unknown_property(&self.class_name, property))?;
        T::from_setting_value(value).ok_or_else(|| {
            DomainError::type_mismatch(
                &self.class_name,
                property,
                std::any::type_name::<T>(),
                value.describe(),
            )
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON object keyed by property name.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut object = Map::with_capacity(self.values.len());
        for (name, value) in &self.values {
            object.insert(name.clone(), serde_json::to_value(value)?);
        }
        Ok(Value::Object(object))
    }
}

/// Collects resolved values and validates them against the descriptor.
pub struct SettingsBuilder {
    descriptor: Arc<SettingsDescriptor>,
    values: BTreeMap<String, SettingValue>,
}

impl SettingsBuilder {
    pub fn new(descriptor: Arc<SettingsDescriptor>) -> Self {
        Self {
            descriptor,
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, property: &str, value: SettingValue) -> Result<&mut Self, DomainError> {
        let class = self.descriptor.short_name();
        let declared = self
            .descriptor
            .find(property)
            .ok_or_else(|| DomainError::unknown_property(class, property))?
            .declared();

        if !declared.accepts(&value) {
            return Err(DomainError::type_mismatch(
                class,
                property,
                declared.to_string(),
                value.describe(),
            ));
        }

        self.values.insert(property.to_string(), value);
        Ok(self)
    }

    pub fn build(self) -> Result<SettingsInstance, DomainError> {
        let class_name = self.descriptor.short_name().to_string();
        if let Some(missing) = self
            .descriptor
            .properties()
            .iter()
            .find(|property| !self.values.contains_key(property.name()))
        {
            return Err(DomainError::missing_property(class_name, missing.name()));
        }

        Ok(SettingsInstance {
            identifier: self.descriptor.identifier().to_string(),
            class_name,
            values: self.values,
        })
    }
}

/// A Rust type backed by a registered settings class.
///
/// ```
/// use settlekeep::domain::{
///     DomainError, PropertyDescriptor, PropertyType, SettingsClass, SettingsDescriptor,
///     SettingsInstance,
/// };
///
/// struct Billing {
///     retry_limit: i64,
///     currency: String,
/// }
///
/// impl SettingsClass for Billing {
///     fn descriptor() -> SettingsDescriptor {
///         SettingsDescriptor::new("app::settings::Billing")
///             .property(PropertyDescriptor::new("retryLimit", PropertyType::Integer, 3))
///             .property(PropertyDescriptor::new("currency", PropertyType::String, "EUR"))
///     }
///
///     fn from_instance(instance: &SettingsInstance) -> Result<Self, DomainError> {
///         Ok(Self {
///             retry_limit: instance.value("retryLimit")?,
///             currency: instance.value("currency")?,
///         })
///     }
/// }
/// ```
pub trait SettingsClass: Sized {
    fn descriptor() -> SettingsDescriptor;

    fn from_instance(instance: &SettingsInstance) -> Result<Self, DomainError>;
}
