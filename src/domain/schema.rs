//! Static descriptors declaring a settings class and its properties.

use std::fmt;

use crate::domain::types::ValueKind;
use crate::domain::values::SettingValue;

/// Declared type of a settings property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Integer,
    String,
    Float,
    Boolean,
    Array,
    Date,
    /// Reference to an external resource; holds the declared type path.
    Resource(String),
    /// Union declarations cannot be mapped onto a single storage kind.
    Union(Vec<String>),
    /// Property declared without a type.
    Untyped,
}

impl PropertyType {
    /// Parses a declared type string such as `int`, `?date` or `app::geo::Country`.
    ///
    /// A leading `?` marks nullability, which every kind already permits.
    pub fn parse(declared: &str) -> Self {
        let trimmed = declared.trim();
        if trimmed.is_empty() || trimmed == "mixed" || trimmed == "untyped" {
            return PropertyType::Untyped;
        }
        if trimmed.contains('|') {
            return PropertyType::Union(
                trimmed
                    .split('|')
                    .map(|part| part.trim().to_string())
                    .collect(),
            );
        }
        let name = trimmed.strip_prefix('?').unwrap_or(trimmed);
        match name {
            "int" | "integer" | "i64" => PropertyType::Integer,
            "string" | "str" | "String" => PropertyType::String,
            "float" | "double" | "f64" => PropertyType::Float,
            "bool" | "boolean" => PropertyType::Boolean,
            "array" | "list" => PropertyType::Array,
            "date" | "Date" | "DateTimeImmutable" => PropertyType::Date,
            "" => PropertyType::Untyped,
            other => PropertyType::Resource(other.to_string()),
        }
    }

    /// Storage kind this type encodes to, or `None` when it cannot be stored.
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            PropertyType::Integer => Some(ValueKind::Integer),
            PropertyType::String => Some(ValueKind::String),
            PropertyType::Float => Some(ValueKind::Float),
            PropertyType::Boolean => Some(ValueKind::Boolean),
            PropertyType::Array => Some(ValueKind::Array),
            PropertyType::Date => Some(ValueKind::Date),
            PropertyType::Resource(_) => Some(ValueKind::Resource),
            PropertyType::Union(_) | PropertyType::Untyped => None,
        }
    }

    /// Short name recorded as `resourceTypeName` for resource properties.
    pub fn resource_type_name(&self) -> Option<&str> {
        match self {
            PropertyType::Resource(path) => Some(short_name(path)),
            _ => None,
        }
    }

    /// Whether `value` can be held by a property of this type.
    pub fn accepts(&self, value: &SettingValue) -> bool {
        match (self, value) {
            (PropertyType::Union(_) | PropertyType::Untyped, _) => false,
            (_, SettingValue::Null) => true,
            (PropertyType::Integer, SettingValue::Integer(_))
            | (PropertyType::String, SettingValue::String(_))
            | (PropertyType::Float, SettingValue::Float(_))
            | (PropertyType::Boolean, SettingValue::Boolean(_))
            | (PropertyType::Array, SettingValue::Array(_))
            | (PropertyType::Date, SettingValue::Date(_)) => true,
            (PropertyType::Resource(path), SettingValue::Resource(resource)) => {
                short_name(&resource.type_name) == short_name(path)
            }
            _ => false,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Integer => f.write_str("int"),
            PropertyType::String => f.write_str("string"),
            PropertyType::Float => f.write_str("float"),
            PropertyType::Boolean => f.write_str("bool"),
            PropertyType::Array => f.write_str("array"),
            PropertyType::Date => f.write_str("date"),
            PropertyType::Resource(path) => f.write_str(path),
            PropertyType::Union(parts) => f.write_str(&parts.join("|")),
            PropertyType::Untyped => f.write_str("untyped"),
        }
    }
}

/// One public property of a settings class.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    name: String,
    declared: PropertyType,
    default: SettingValue,
    label: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(
        name: impl Into<String>,
        declared: PropertyType,
        default: impl Into<SettingValue>,
    ) -> Self {
        Self {
            name: name.into(),
            declared,
            default: default.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        let trimmed = label.trim();
        self.label = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> &PropertyType {
        &self.declared
    }

    pub fn default_value(&self) -> &SettingValue {
        &self.default
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Schema of a settings class: identifier plus its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDescriptor {
    identifier: String,
    properties: Vec<PropertyDescriptor>,
}

impl SettingsDescriptor {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            properties: Vec::new(),
        }
    }

    /// Adds a property, replacing any earlier declaration with the same name.
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        match self
            .properties
            .iter_mut()
            .find(|existing| existing.name == property.name)
        {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Record key and cache tag of the class.
    pub fn short_name(&self) -> &str {
        short_name(&self.identifier)
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn find(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|property| property.name == name)
    }
}

/// Last path segment of a type path, accepting `::`, `\` and `/` separators.
pub fn short_name(path: &str) -> &str {
    let path = path.trim_end_matches(['/', '\\', ':']);
    let cut = [
        path.rfind("::").map(|idx| idx + 2),
        path.rfind('\\').map(|idx| idx + 1),
        path.rfind('/').map(|idx| idx + 1),
    ]
    .into_iter()
    .flatten()
    .max()
    .unwrap_or(0);
    &path[cut..]
}
