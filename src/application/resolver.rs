//! Lazy resolution of settings classes through cache, store and defaults.

use std::sync::Arc;

use metrics::counter;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::application::codec::StoreCodec;
use crate::application::error::SettingsError;
use crate::application::identity::IdentitySource;
use crate::application::registry::SettingsRegistry;
use crate::application::repos::{RepoError, SettingsRecordRepo};
use crate::application::resources::ResourceResolver;
use crate::cache::{SettingsCache, SettingsKey};
use crate::domain::entities::SettingsRecord;
use crate::domain::error::DomainError;
use crate::domain::instance::{SettingsBuilder, SettingsClass, SettingsInstance};
use crate::domain::schema::{PropertyDescriptor, SettingsDescriptor, short_name};
use crate::domain::values::SettingValue;

const METRIC_RECORD_WRITE: &str = "settlekeep_record_write_total";

/// Outcome of [`SettingsResolver::populate_all`].
#[derive(Debug, Default)]
pub struct PopulateReport {
    pub resolved: Vec<String>,
    pub failures: Vec<PopulateFailure>,
}

impl PopulateReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct PopulateFailure {
    pub class: String,
    pub error: SettingsError,
}

#[derive(Clone)]
pub struct SettingsResolver {
    registry: Arc<dyn SettingsRegistry>,
    records: Arc<dyn SettingsRecordRepo>,
    cache: Arc<SettingsCache>,
    codec: StoreCodec,
    identity: Arc<dyn IdentitySource>,
}

impl SettingsResolver {
    pub fn new(
        registry: Arc<dyn SettingsRegistry>,
        records: Arc<dyn SettingsRecordRepo>,
        cache: Arc<SettingsCache>,
        resources: Arc<dyn ResourceResolver>,
        identity: Arc<dyn IdentitySource>,
    ) -> Self {
        Self {
            registry,
            records,
            cache,
            codec: StoreCodec::new(resources),
            identity,
        }
    }

    /// Resolves every property of a class into an immutable instance.
    ///
    /// Accepts a full identifier or a registered short name.
    #[instrument(skip(self))]
    pub async fn resolve(&self, class: &str) -> Result<SettingsInstance, SettingsError> {
        let descriptor = self.registry.get(class)?;

        // Reject unsupported declarations before anything is written.
        for property in descriptor.properties() {
            StoreCodec::storage_kind(property.declared())?;
        }

        let mut builder = SettingsBuilder::new(descriptor.clone());
        for property in descriptor.properties() {
            let key = SettingsKey::new(descriptor.short_name(), property.name());
            let value = self
                .cache
                .get_or_load(&key, || self.load_property(&descriptor, property))
                .await?;
            builder.set(property.name(), value)?;
        }

        Ok(builder.build()?)
    }

    pub async fn resolve_as<T: SettingsClass>(&self) -> Result<T, SettingsError> {
        let descriptor = T::descriptor();
        let instance = self.resolve(descriptor.identifier()).await?;
        Ok(T::from_instance(&instance)?)
    }

    /// Drops cached values of a class; the next resolve re-reads the store.
    pub fn invalidate(&self, class: &str) -> usize {
        let tag = match self.registry.get(class) {
            Ok(descriptor) => descriptor.short_name().to_string(),
            Err(_) => short_name(class).to_string(),
        };
        self.cache.invalidate_tag(&tag)
    }

    /// Invalidates and resolves every registered class.
    ///
    /// A failing class is recorded in the report and the run continues.
    #[instrument(skip(self))]
    pub async fn populate_all(&self) -> PopulateReport {
        let mut report = PopulateReport::default();

        for class in self.registry.list() {
            self.invalidate(&class);
            match self.resolve(&class).await {
                Ok(_) => report.resolved.push(class),
                Err(error) => {
                    warn!(class = %class, error = %error, "Settings class failed to populate");
                    report.failures.push(PopulateFailure { class, error });
                }
            }
        }

        info!(
            resolved = report.resolved.len(),
            failed = report.failures.len(),
            "Settings population complete"
        );
        report
    }

    async fn load_property(
        &self,
        descriptor: &SettingsDescriptor,
        property: &PropertyDescriptor,
    ) -> Result<SettingValue, SettingsError> {
        let class_name = descriptor.short_name();
        let existing = self.records.find_by_class_name(class_name).await?;

        if let Some(stored) = existing
            .as_ref()
            .and_then(|record| record.entry(property.name()))
        {
            return self.codec.decode(stored).await;
        }

        let default = property.default_value();
        if !property.declared().accepts(default) {
            return Err(DomainError::type_mismatch(
                class_name,
                property.name(),
                property.declared().to_string(),
                default.describe(),
            )
            .into());
        }

        let encoded = self
            .codec
            .encode(property.declared(), default, property.label())
            .await?;
        let actor = self.identity.current_actor();

        match existing {
            Some(mut record) => {
                record.insert(property.name(), encoded);
                record.last_modified_by = actor;
                record.updated_at = OffsetDateTime::now_utc();
                self.records.save(record).await?;
                counter!(METRIC_RECORD_WRITE, "op" => "extend").increment(1);
            }
            None => {
                let mut record = SettingsRecord::new(class_name, actor);
                record.insert(property.name(), encoded);
                match self.records.save(record).await {
                    Ok(()) => {
                        counter!(METRIC_RECORD_WRITE, "op" => "create").increment(1);
                    }
                    Err(RepoError::Duplicate { constraint }) => {
                        warn!(
                            class = class_name,
                            property = property.name(),
                            constraint = %constraint,
                            "Settings record was created concurrently; keeping default"
                        );
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        info!(
            class = class_name,
            property = property.name(),
            "Persisted default for newly seen property"
        );
        Ok(default.clone())
    }
}
