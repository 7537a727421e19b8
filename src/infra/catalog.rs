//! TOML catalog of settings classes for the administrative binary.
//!
//! ```toml
//! [[classes]]
//! identifier = "app::settings::Billing"
//!
//! [[classes.properties]]
//! name = "retryLimit"
//! type = "int"
//! default = 3
//! label = "Retry limit"
//!
//! [[resources]]
//! type = "Country"
//! id = "lv"
//! ```

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;
use time::Date;

use crate::application::registry::StaticRegistry;
use crate::domain::schema::{PropertyDescriptor, PropertyType, SettingsDescriptor, short_name};
use crate::domain::values::{ISO_DATE, ResourceObject, Scalar, SettingValue};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog class at position {index} has an empty identifier")]
    EmptyIdentifier { index: usize },
    #[error("default of `{class}.{property}` is invalid: {reason}")]
    InvalidDefault {
        class: String,
        property: String,
        reason: String,
    },
}

impl CatalogError {
    fn invalid_default(class: &str, property: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefault {
            class: class.to_string(),
            property: property.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    classes: Vec<ClassEntry>,
    resources: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
struct ClassEntry {
    identifier: String,
    #[serde(default)]
    properties: Vec<PropertyEntry>,
}

#[derive(Debug, Deserialize)]
struct PropertyEntry {
    name: String,
    #[serde(rename = "type", default)]
    declared: String,
    default: Option<toml::Value>,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    #[serde(rename = "type")]
    type_name: String,
    id: String,
}

/// Parsed catalog: registered classes plus the resources they may reference.
#[derive(Debug, Default)]
pub struct Catalog {
    pub registry: StaticRegistry,
    pub resources: Vec<ResourceObject>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let data = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(data)?;

        let mut registry = StaticRegistry::new();
        for (index, class) in file.classes.into_iter().enumerate() {
            let identifier = class.identifier.trim();
            if identifier.is_empty() {
                return Err(CatalogError::EmptyIdentifier { index });
            }

            let mut descriptor = SettingsDescriptor::new(identifier);
            for property in class.properties {
                let declared = PropertyType::parse(&property.declared);
                let default = match &property.default {
                    Some(value) => convert_default(&declared, value)
                        .map_err(|reason| {
                            CatalogError::invalid_default(identifier, &property.name, reason)
                        })?,
                    None => SettingValue::Null,
                };

                let mut entry = PropertyDescriptor::new(property.name, declared, default);
                if let Some(label) = property.label {
                    entry = entry.with_label(label);
                }
                descriptor = descriptor.property(entry);
            }
            registry.register(descriptor);
        }

        let resources = file
            .resources
            .into_iter()
            .map(|entry| ResourceObject::new(entry.type_name, entry.id))
            .collect();

        Ok(Self {
            registry,
            resources,
        })
    }
}

/// Converts a TOML default according to the declared type.
///
/// Untyped and union declarations keep a loosely converted value; resolving
/// them fails later with an unsupported-type error.
fn convert_default(declared: &PropertyType, value: &toml::Value) -> Result<SettingValue, String> {
    match declared {
        PropertyType::Integer => value
            .as_integer()
            .map(SettingValue::Integer)
            .ok_or_else(|| mismatch("an integer", value)),
        PropertyType::String => value
            .as_str()
            .map(SettingValue::from)
            .ok_or_else(|| mismatch("a string", value)),
        PropertyType::Float => match value {
            toml::Value::Float(number) => Ok(SettingValue::Float(*number)),
            toml::Value::Integer(number) => Ok(SettingValue::Float(*number as f64)),
            other => Err(mismatch("a float", other)),
        },
        PropertyType::Boolean => value
            .as_bool()
            .map(SettingValue::Boolean)
            .ok_or_else(|| mismatch("a boolean", value)),
        PropertyType::Array => {
            let items = value.as_array().ok_or_else(|| mismatch("an array", value))?;
            items
                .iter()
                .map(|item| scalar(item).ok_or_else(|| mismatch("a scalar element", item)))
                .collect::<Result<Vec<_>, _>>()
                .map(SettingValue::Array)
        }
        PropertyType::Date => convert_date(value),
        PropertyType::Resource(path) => convert_resource(path, value),
        PropertyType::Union(_) | PropertyType::Untyped => Ok(loose(value)),
    }
}

fn convert_date(value: &toml::Value) -> Result<SettingValue, String> {
    let text = match value {
        toml::Value::String(text) => text.clone(),
        toml::Value::Datetime(datetime) if datetime.time.is_none() => datetime.to_string(),
        other => return Err(mismatch("a YYYY-MM-DD date", other)),
    };
    Date::parse(text.trim(), ISO_DATE)
        .map(SettingValue::Date)
        .map_err(|err| format!("`{text}` is not a YYYY-MM-DD date: {err}"))
}

fn convert_resource(path: &str, value: &toml::Value) -> Result<SettingValue, String> {
    let table = value
        .as_table()
        .ok_or_else(|| mismatch("a `{ id = ... }` table", value))?;
    let id = table
        .get("id")
        .and_then(|id| match id {
            toml::Value::String(text) => Some(text.clone()),
            toml::Value::Integer(number) => Some(number.to_string()),
            _ => None,
        })
        .ok_or_else(|| "resource default needs an `id`".to_string())?;
    let type_name = table
        .get("type")
        .and_then(toml::Value::as_str)
        .unwrap_or_else(|| short_name(path));
    Ok(SettingValue::Resource(ResourceObject::new(type_name, id)))
}

fn scalar(value: &toml::Value) -> Option<Scalar> {
    match value {
        toml::Value::Integer(number) => Some(Scalar::Integer(*number)),
        toml::Value::Float(number) => Some(Scalar::Float(*number)),
        toml::Value::Boolean(flag) => Some(Scalar::Boolean(*flag)),
        toml::Value::String(text) => Some(Scalar::String(text.clone())),
        _ => None,
    }
}

fn loose(value: &toml::Value) -> SettingValue {
    match value {
        toml::Value::Array(items) => {
            SettingValue::Array(items.iter().filter_map(scalar).collect())
        }
        other => match scalar(other) {
            Some(Scalar::Integer(number)) => SettingValue::Integer(number),
            Some(Scalar::Float(number)) => SettingValue::Float(number),
            Some(Scalar::Boolean(flag)) => SettingValue::Boolean(flag),
            Some(Scalar::String(text)) => SettingValue::String(text),
            None => SettingValue::Null,
        },
    }
}

fn mismatch(expected: &str, found: &toml::Value) -> String {
    format!("expected {expected}, found {}", found.type_str())
}
