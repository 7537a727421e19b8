//! Runtime and stored representations of a single settings property.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::domain::types::ValueKind;

/// `YYYY-MM-DD`, the only date layout written to or read from a record.
pub const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Element of an array-typed property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Returns `None` for non-finite floats, which JSON cannot carry.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Scalar::Boolean(value) => Some(Value::Bool(*value)),
            Scalar::Integer(value) => Some(Value::Number((*value).into())),
            Scalar::Float(value) => Number::from_f64(*value).map(Value::Number),
            Scalar::String(value) => Some(Value::String(value.clone())),
        }
    }

    /// Returns `None` for nulls, nested arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Scalar::Boolean(*flag)),
            Value::Number(number) => number
                .as_i64()
                .map(Scalar::Integer)
                .or_else(|| number.as_f64().map(Scalar::Float)),
            Value::String(text) => Some(Scalar::String(text.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// Reference to a domain object living outside the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceObject {
    pub type_name: String,
    pub id: String,
}

impl ResourceObject {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }
}

/// Resolved value of a settings property as seen by application code.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Null,
    Integer(i64),
    String(String),
    Float(f64),
    Boolean(bool),
    Array(Vec<Scalar>),
    Date(Date),
    Resource(ResourceObject),
}

impl SettingValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SettingValue::Null)
    }

    /// Storage kind of the value; `None` for [`SettingValue::Null`].
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            SettingValue::Null => None,
            SettingValue::Integer(_) => Some(ValueKind::Integer),
            SettingValue::String(_) => Some(ValueKind::String),
            SettingValue::Float(_) => Some(ValueKind::Float),
            SettingValue::Boolean(_) => Some(ValueKind::Boolean),
            SettingValue::Array(_) => Some(ValueKind::Array),
            SettingValue::Date(_) => Some(ValueKind::Date),
            SettingValue::Resource(_) => Some(ValueKind::Resource),
        }
    }

    pub fn describe(&self) -> &'static str {
        self.kind().map(ValueKind::as_str).unwrap_or("null")
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            SettingValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            SettingValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceObject> {
        match self {
            SettingValue::Resource(resource) => Some(resource),
            _ => None,
        }
    }
}

impl Serialize for SettingValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            SettingValue::Null => serializer.serialize_none(),
            SettingValue::Integer(value) => serializer.serialize_i64(*value),
            SettingValue::String(value) => serializer.serialize_str(value),
            SettingValue::Float(value) => serializer.serialize_f64(*value),
            SettingValue::Boolean(value) => serializer.serialize_bool(*value),
            SettingValue::Array(items) => items.serialize(serializer),
            SettingValue::Date(date) => {
                let formatted = date.format(ISO_DATE).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&formatted)
            }
            SettingValue::Resource(resource) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", &resource.type_name)?;
                map.serialize_entry("id", &resource.id)?;
                map.end()
            }
        }
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::String(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Boolean(value)
    }
}

impl From<Vec<Scalar>> for SettingValue {
    fn from(value: Vec<Scalar>) -> Self {
        SettingValue::Array(value)
    }
}

impl From<Date> for SettingValue {
    fn from(value: Date) -> Self {
        SettingValue::Date(value)
    }
}

impl From<ResourceObject> for SettingValue {
    fn from(value: ResourceObject) -> Self {
        SettingValue::Resource(value)
    }
}

impl<T> From<Option<T>> for SettingValue
where
    T: Into<SettingValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SettingValue::Null)
    }
}

/// Conversion from a resolved value into a concrete Rust type.
pub trait FromSettingValue: Sized {
    fn from_setting_value(value: &SettingValue) -> Option<Self>;
}

impl FromSettingValue for i64 {
    fn from_setting_value(value: &SettingValue) -> Option<Self> {
        value.as_i64()
    }
}

impl FromSettingValue for String {
    fn from_setting_value(value: &SettingValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromSettingValue for f64 {
    fn from_setting_value(value: &SettingValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromSettingValue for bool {
    fn from_setting_value(value: &SettingValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromSettingValue for Vec<Scalar> {
    fn from_setting_value(value: &SettingValue) -> Option<Self> {
        value.as_array().map(<[Scalar]>::to_vec)
    }
}

impl FromSettingValue for Date {
    fn from_setting_value(value: &SettingValue) -> Option<Self> {
        value.as_date()
    }
}

impl FromSettingValue for ResourceObject {
    fn from_setting_value(value: &SettingValue) -> Option<Self> {
        value.as_resource().cloned()
    }
}

impl<T> FromSettingValue for Option<T>
where
    T: FromSettingValue,
{
    fn from_setting_value(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Null => Some(None),
            other => T::from_setting_value(other).map(Some),
        }
    }
}

/// Stored projection of one property inside a record's `store` map.
///
/// Serializes as `{"kind", "value", "resourceTypeName", "label"}`. The
/// `type`/`resourceClass` aliases accept rows written by earlier deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedValue {
    #[serde(alias = "type")]
    pub kind: ValueKind,
    #[serde(default)]
    pub value: Value,
    #[serde(default, alias = "resourceClass")]
    pub resource_type_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl TypedValue {
    pub fn new(kind: ValueKind, value: Value) -> Self {
        Self {
            kind,
            value,
            resource_type_name: None,
            label: None,
        }
    }

    pub fn with_label(mut self, label: Option<&str>) -> Self {
        self.label = label.map(str::to_string);
        self
    }

    pub fn with_resource_type(mut self, type_name: impl Into<String>) -> Self {
        self.resource_type_name = Some(type_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use super::*;

    #[test]
    fn typed_value_serializes_with_camel_case_keys() {
        let stored = TypedValue::new(ValueKind::Resource, json!("/api/countries/lv"))
            .with_resource_type("Country")
            .with_label(Some("Default country"));

        let json = serde_json::to_value(&stored).expect("serialize");
        assert_eq!(
            json,
            json!({
                "kind": "resource",
                "value": "/api/countries/lv",
                "resourceTypeName": "Country",
                "label": "Default country",
            })
        );
    }

    #[test]
    fn typed_value_accepts_legacy_keys() {
        let stored: TypedValue = serde_json::from_value(json!({
            "type": "resource",
            "value": null,
            "resourceClass": "Country",
        }))
        .expect("deserialize legacy row");

        assert_eq!(stored.kind, ValueKind::Resource);
        assert_eq!(stored.value, Value::Null);
        assert_eq!(stored.resource_type_name.as_deref(), Some("Country"));
        assert!(stored.label.is_none());
    }

    #[test]
    fn missing_value_defaults_to_null() {
        let stored: TypedValue =
            serde_json::from_value(json!({ "kind": "integer" })).expect("deserialize");
        assert_eq!(stored.value, Value::Null);
    }

    #[test]
    fn scalar_json_conversion_preserves_integers() {
        assert_eq!(Scalar::from_json(&json!(7)), Some(Scalar::Integer(7)));
        assert_eq!(Scalar::from_json(&json!(2.5)), Some(Scalar::Float(2.5)));
        assert_eq!(Scalar::from_json(&json!(null)), None);
        assert_eq!(Scalar::from_json(&json!([1])), None);
        assert!(Scalar::Float(f64::NAN).to_json().is_none());
    }

    #[test]
    fn setting_value_serializes_dates_as_iso() {
        let value = SettingValue::Date(date!(2024 - 02 - 29));
        assert_eq!(serde_json::to_value(&value).expect("serialize"), json!("2024-02-29"));
    }

    #[test]
    fn option_conversions_map_null() {
        assert_eq!(SettingValue::from(None::<i64>), SettingValue::Null);
        assert_eq!(
            Option::<i64>::from_setting_value(&SettingValue::Null),
            Some(None)
        );
        assert_eq!(
            Option::<i64>::from_setting_value(&SettingValue::Integer(4)),
            Some(Some(4))
        );
        assert_eq!(i64::from_setting_value(&SettingValue::from("4")), None);
    }
}
