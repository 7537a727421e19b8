//! Settings cache.
//!
//! Resolved property values are cached per `"<ShortClassName>.<property>"`
//! key and tagged with the class short name, so one class can be invalidated
//! without touching the others.
//!
//! ```toml
//! [cache]
//! enabled = true
//! max_entries = 1024
//! ```

mod config;
mod keys;
mod lock;
mod store;
mod tags;

pub use config::CacheConfig;
pub use keys::SettingsKey;
pub use store::SettingsCache;
