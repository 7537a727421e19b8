use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::{
    application::repos::{RepoError, SettingsRecordRepo},
    domain::{entities::SettingsRecord, values::TypedValue},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SettingsRecordRow {
    class_name: String,
    store: Json<BTreeMap<String, TypedValue>>,
    last_modified_by: Option<String>,
    updated_at: OffsetDateTime,
}

impl From<SettingsRecordRow> for SettingsRecord {
    fn from(row: SettingsRecordRow) -> Self {
        Self {
            class_name: row.class_name,
            store: row.store.0,
            last_modified_by: row.last_modified_by,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SettingsRecordRepo for PostgresRepositories {
    async fn find_by_class_name(
        &self,
        class_name: &str,
    ) -> Result<Option<SettingsRecord>, RepoError> {
        let row = sqlx::query_as::<_, SettingsRecordRow>(
            r#"
            SELECT class_name,
                   store,
                   last_modified_by,
                   updated_at
            FROM settings_records
            WHERE class_name = $1
            "#,
        )
        .bind(class_name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SettingsRecord::from))
    }

    async fn save(&self, record: SettingsRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO settings_records (
                class_name,
                store,
                last_modified_by,
                updated_at
            ) VALUES ($1, $2, $3, $4)
            ON CONFLICT (class_name) DO UPDATE SET
                store = settings_records.store || EXCLUDED.store,
                last_modified_by = EXCLUDED.last_modified_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.class_name)
        .bind(Json(&record.store))
        .bind(record.last_modified_by.as_deref())
        .bind(record.updated_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
