//! Type-directed conversion between property values and their stored form.

use std::sync::Arc;

use serde_json::{Number, Value};
use time::Date;

use crate::application::error::SettingsError;
use crate::application::resources::ResourceResolver;
use crate::domain::schema::PropertyType;
use crate::domain::types::ValueKind;
use crate::domain::values::{ISO_DATE, Scalar, SettingValue, TypedValue};

/// Encodes declared properties into [`TypedValue`]s and decodes them back.
#[derive(Clone)]
pub struct StoreCodec {
    resources: Arc<dyn ResourceResolver>,
}

impl StoreCodec {
    pub fn new(resources: Arc<dyn ResourceResolver>) -> Self {
        Self { resources }
    }

    /// Storage kind for a declared type; untyped and union declarations fail.
    pub fn storage_kind(declared: &PropertyType) -> Result<ValueKind, SettingsError> {
        declared
            .value_kind()
            .ok_or_else(|| SettingsError::unsupported_type(declared.to_string()))
    }

    pub async fn encode(
        &self,
        declared: &PropertyType,
        value: &SettingValue,
        label: Option<&str>,
    ) -> Result<TypedValue, SettingsError> {
        let kind = Self::storage_kind(declared)?;

        let payload = match (kind, value) {
            (_, SettingValue::Null) => Value::Null,
            (ValueKind::Integer, SettingValue::Integer(number)) => Value::from(*number),
            (ValueKind::String, SettingValue::String(text)) => Value::String(text.clone()),
            (ValueKind::Float, SettingValue::Float(number)) => Number::from_f64(*number)
                .map(Value::Number)
                .ok_or_else(|| {
                    SettingsError::UnsupportedValue(format!("non-finite float `{number}`"))
                })?,
            (ValueKind::Boolean, SettingValue::Boolean(flag)) => Value::Bool(*flag),
            (ValueKind::Array, SettingValue::Array(items)) => Value::Array(encode_items(items)?),
            (ValueKind::Date, SettingValue::Date(date)) => Value::String(
                date.format(ISO_DATE)
                    .map_err(|err| SettingsError::UnsupportedValue(err.to_string()))?,
            ),
            (ValueKind::Resource, SettingValue::Resource(resource)) if declared.accepts(value) => {
                Value::String(self.resources.to_uri(resource).await?)
            }
            (kind, other) => return Err(SettingsError::value_shape(kind, other.describe())),
        };

        let stored = TypedValue::new(kind, payload).with_label(label);
        Ok(match declared.resource_type_name() {
            Some(type_name) => stored.with_resource_type(type_name),
            None => stored,
        })
    }

    /// Every kind is handled explicitly; new kinds must add their own arm.
    pub async fn decode(&self, stored: &TypedValue) -> Result<SettingValue, SettingsError> {
        let kind = stored.kind;
        let value = &stored.value;
        if value.is_null() {
            return Ok(SettingValue::Null);
        }

        match kind {
            ValueKind::Integer => value
                .as_i64()
                .map(SettingValue::Integer)
                .ok_or_else(|| shape_error(kind, value)),
            ValueKind::String => value
                .as_str()
                .map(|text| SettingValue::String(text.to_string()))
                .ok_or_else(|| shape_error(kind, value)),
            ValueKind::Float => value
                .as_f64()
                .map(SettingValue::Float)
                .ok_or_else(|| shape_error(kind, value)),
            ValueKind::Boolean => value
                .as_bool()
                .map(SettingValue::Boolean)
                .ok_or_else(|| shape_error(kind, value)),
            ValueKind::Array => {
                let items = value.as_array().ok_or_else(|| shape_error(kind, value))?;
                items
                    .iter()
                    .map(|item| Scalar::from_json(item).ok_or_else(|| shape_error(kind, item)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(SettingValue::Array)
            }
            ValueKind::Date => {
                let text = value.as_str().ok_or_else(|| shape_error(kind, value))?;
                parse_iso_date(text)
            }
            ValueKind::Resource => {
                let uri = value.as_str().ok_or_else(|| shape_error(kind, value))?;
                if uri.is_empty() {
                    return Ok(SettingValue::Null);
                }
                let resource = self.resources.from_uri(uri).await?;
                Ok(SettingValue::Resource(resource))
            }
        }
    }
}

fn encode_items(items: &[Scalar]) -> Result<Vec<Value>, SettingsError> {
    items
        .iter()
        .map(|item| {
            item.to_json().ok_or_else(|| {
                SettingsError::UnsupportedValue(format!("array element `{item:?}` is not finite"))
            })
        })
        .collect()
}

/// Parses a stored `YYYY-MM-DD` date; blank input is treated as null.
fn parse_iso_date(text: &str) -> Result<SettingValue, SettingsError> {
    if text.trim().is_empty() {
        return Ok(SettingValue::Null);
    }
    Date::parse(text, ISO_DATE)
        .map(SettingValue::Date)
        .map_err(|_| SettingsError::InvalidDateFormat {
            value: text.to_string(),
        })
}

fn shape_error(kind: ValueKind, found: &Value) -> SettingsError {
    let shape = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_i64() || number.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    SettingsError::value_shape(kind, shape)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use time::macros::date;

    use super::*;
    use crate::application::resources::ResourceError;
    use crate::domain::values::ResourceObject;

    #[derive(Default)]
    struct CountingResolver {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ResourceResolver for CountingResolver {
        async fn to_uri(&self, resource: &ResourceObject) -> Result<String, ResourceError> {
            Ok(format!("/api/{}/{}", resource.type_name, resource.id))
        }

        async fn from_uri(&self, uri: &str) -> Result<ResourceObject, ResourceError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let mut parts = uri.trim_start_matches("/api/").splitn(2, '/');
            match (parts.next(), parts.next()) {
                (Some(type_name), Some(id)) if type_name == "Country" => {
                    Ok(ResourceObject::new(type_name, id))
                }
                _ => Err(ResourceError::not_found(uri)),
            }
        }
    }

    fn codec() -> (StoreCodec, Arc<CountingResolver>) {
        let resolver = Arc::new(CountingResolver::default());
        (StoreCodec::new(resolver.clone()), resolver)
    }

    async fn round_trip(declared: PropertyType, value: SettingValue) {
        let (codec, _) = codec();
        let stored = codec
            .encode(&declared, &value, Some("label"))
            .await
            .expect("encode");
        assert_eq!(stored.label.as_deref(), Some("label"));
        let decoded = codec.decode(&stored).await.expect("decode");
        assert_eq!(decoded, value, "round trip for {declared}");
    }

    #[tokio::test]
    async fn every_kind_round_trips() {
        round_trip(PropertyType::Integer, SettingValue::Integer(-42)).await;
        round_trip(PropertyType::String, SettingValue::from("EUR")).await;
        round_trip(PropertyType::Float, SettingValue::Float(0.25)).await;
        round_trip(PropertyType::Boolean, SettingValue::Boolean(true)).await;
        round_trip(
            PropertyType::Array,
            SettingValue::Array(vec![
                Scalar::Integer(1),
                Scalar::from("two"),
                Scalar::Float(3.5),
                Scalar::Boolean(false),
            ]),
        )
        .await;
        round_trip(PropertyType::Date, SettingValue::Date(date!(2024 - 01 - 01))).await;
        round_trip(
            PropertyType::Resource("app::geo::Country".to_string()),
            ResourceObject::new("Country", "lv").into(),
        )
        .await;
        round_trip(PropertyType::Date, SettingValue::Null).await;
    }

    #[tokio::test]
    async fn encode_dispatches_on_declared_type() {
        let (codec, _) = codec();

        let stored = codec
            .encode(&PropertyType::Date, &date!(2023 - 12 - 31).into(), None)
            .await
            .expect("encode date");
        assert_eq!(stored.kind, ValueKind::Date);
        assert_eq!(stored.value, json!("2023-12-31"));
        assert!(stored.resource_type_name.is_none());

        let stored = codec
            .encode(
                &PropertyType::Resource("app::geo::Country".to_string()),
                &SettingValue::Null,
                None,
            )
            .await
            .expect("encode null resource");
        assert_eq!(stored.kind, ValueKind::Resource);
        assert_eq!(stored.value, Value::Null);
        assert_eq!(stored.resource_type_name.as_deref(), Some("Country"));
    }

    #[tokio::test]
    async fn encode_rejects_unsupported_declarations() {
        let (codec, _) = codec();

        let union = PropertyType::Union(vec!["int".to_string(), "string".to_string()]);
        let err = codec
            .encode(&union, &SettingValue::Integer(1), None)
            .await
            .expect_err("union is unsupported");
        assert!(matches!(
            err,
            SettingsError::UnsupportedPropertyType { ref declared } if declared == "int|string"
        ));

        let err = codec
            .encode(&PropertyType::Untyped, &SettingValue::Null, None)
            .await
            .expect_err("untyped is unsupported");
        assert!(matches!(err, SettingsError::UnsupportedPropertyType { .. }));
    }

    #[tokio::test]
    async fn encode_rejects_mismatched_and_non_finite_values() {
        let (codec, _) = codec();

        let err = codec
            .encode(&PropertyType::Integer, &SettingValue::from("3"), None)
            .await
            .expect_err("string for int");
        assert!(matches!(
            err,
            SettingsError::ValueShape { kind: ValueKind::Integer, .. }
        ));

        let err = codec
            .encode(&PropertyType::Float, &SettingValue::Float(f64::NAN), None)
            .await
            .expect_err("nan");
        assert!(matches!(err, SettingsError::UnsupportedValue(_)));

        let err = codec
            .encode(
                &PropertyType::Resource("Country".to_string()),
                &ResourceObject::new("Currency", "eur").into(),
                None,
            )
            .await
            .expect_err("wrong resource type");
        assert!(matches!(
            err,
            SettingsError::ValueShape { kind: ValueKind::Resource, .. }
        ));
    }

    #[tokio::test]
    async fn null_resource_skips_resolver() {
        let (codec, resolver) = codec();
        let stored = TypedValue::new(ValueKind::Resource, Value::Null).with_resource_type("Country");

        let decoded = codec.decode(&stored).await.expect("decode");
        assert_eq!(decoded, SettingValue::Null);

        let stored = TypedValue::new(ValueKind::Resource, json!("")).with_resource_type("Country");
        assert_eq!(codec.decode(&stored).await.expect("decode"), SettingValue::Null);

        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unresolvable_resource_propagates_not_found() {
        let (codec, resolver) = codec();
        let stored = TypedValue::new(ValueKind::Resource, json!("/api/Planet/mars"));

        let err = codec.decode(&stored).await.expect_err("missing resource");
        assert!(matches!(
            err,
            SettingsError::ResourceNotFound { ref uri } if uri == "/api/Planet/mars"
        ));
        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dates_decode_strictly() {
        let (codec, _) = codec();

        let blank = TypedValue::new(ValueKind::Date, json!(""));
        assert_eq!(codec.decode(&blank).await.expect("blank"), SettingValue::Null);

        let padded = TypedValue::new(ValueKind::Date, json!(" 2024-01-01\n"));
        let err = codec.decode(&padded).await.expect_err("padded");
        assert!(matches!(
            err,
            SettingsError::InvalidDateFormat { ref value } if value == " 2024-01-01\n"
        ));

        let malformed = TypedValue::new(ValueKind::Date, json!("31/12/2023"));
        let err = codec.decode(&malformed).await.expect_err("malformed");
        assert!(matches!(
            err,
            SettingsError::InvalidDateFormat { ref value } if value == "31/12/2023"
        ));

        let impossible = TypedValue::new(ValueKind::Date, json!("2023-02-30"));
        assert!(matches!(
            codec.decode(&impossible).await,
            Err(SettingsError::InvalidDateFormat { .. })
        ));
    }

    #[tokio::test]
    async fn shape_mismatch_is_an_error() {
        let (codec, _) = codec();

        let cases = [
            (ValueKind::Integer, json!("3")),
            (ValueKind::Integer, json!(3.5)),
            (ValueKind::String, json!(3)),
            (ValueKind::Boolean, json!("true")),
            (ValueKind::Array, json!({ "a": 1 })),
            (ValueKind::Array, json!([1, [2]])),
            (ValueKind::Date, json!(20240101)),
            (ValueKind::Resource, json!(12)),
        ];

        for (kind, value) in cases {
            let stored = TypedValue::new(kind, value.clone());
            let err = codec.decode(&stored).await.expect_err("shape mismatch");
            assert!(
                matches!(err, SettingsError::ValueShape { kind: found, .. } if found == kind),
                "{kind} with {value}"
            );
        }
    }

    #[tokio::test]
    async fn integral_numbers_decode_as_floats() {
        let (codec, _) = codec();
        let stored = TypedValue::new(ValueKind::Float, json!(2));
        assert_eq!(
            codec.decode(&stored).await.expect("decode"),
            SettingValue::Float(2.0)
        );
    }
}
