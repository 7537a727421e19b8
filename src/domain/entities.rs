//! Domain entities mirrored from persistent storage.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::domain::values::TypedValue;

/// Durable row holding every stored property of one settings class.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRecord {
    pub class_name: String,
    pub store: BTreeMap<String, TypedValue>,
    pub last_modified_by: Option<String>,
    pub updated_at: OffsetDateTime,
}

impl SettingsRecord {
    pub fn new(class_name: impl Into<String>, last_modified_by: Option<String>) -> Self {
        Self {
            class_name: class_name.into(),
            store: BTreeMap::new(),
            last_modified_by,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn entry(&self, property: &str) -> Option<&TypedValue> {
        self.store.get(property)
    }

    pub fn insert(&mut self, property: impl Into<String>, value: TypedValue) -> Option<TypedValue> {
        self.store.insert(property.into(), value)
    }
}
