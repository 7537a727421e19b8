//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod instance;
pub mod schema;
pub mod types;
pub mod values;

pub use entities::SettingsRecord;
pub use error::DomainError;
pub use instance::{SettingsBuilder, SettingsClass, SettingsInstance};
pub use schema::{PropertyDescriptor, PropertyType, SettingsDescriptor, short_name};
pub use types::ValueKind;
pub use values::{FromSettingValue, ResourceObject, Scalar, SettingValue, TypedValue};
