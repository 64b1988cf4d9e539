//! Catalog backed by a SQLite file.

use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use features_protocol::Extent;

use crate::error::{CatalogError, Result};
use crate::models::{
    option_keys, CollectionRecord, CollectionRow, CollectionUpdate, Dataset, DatasetKind,
    DatasetRow, GeneralSettings, GeneralSettingsUpdate, License, LicenseRow,
};
use crate::schema::{CLEAR_COLLECTION_CACHE_SQL, DROP_CACHE_SQL, SCHEMA_SQL, TRIGGER_SQL};

const COLLECTION_COLUMNS: &str = "uuid, id, layer_name, title, description, license_title, \
     extent_json, crs_json, storage_crs, storage_crs_coordinate_epoch, is_3d, \
     datetime_field, dataset_uuid, pre_rendered_json";

/// Database connection pool and catalog operations.
#[derive(Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    /// File name of the database inside the database directory.
    pub const DATABASE_FILE: &'static str = "data.db";

    /// Open (creating if needed) `data.db` inside `db_dir`.
    pub async fn open(db_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(db_dir).await?;

        let options = SqliteConnectOptions::new()
            .filename(db_dir.join(Self::DATABASE_FILE))
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        Self::connect_with(options).await
    }

    /// Open a catalog from a `sqlite:` URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| CatalogError::Database(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|e| CatalogError::Database(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Create tables and triggers, reset cached documents, and insert the
    /// default options and licenses.
    pub async fn migrate(&self) -> Result<()> {
        info!("Initializing catalog database");

        self.execute(DROP_CACHE_SQL).await?;
        for statement in SCHEMA_SQL.iter().chain(TRIGGER_SQL) {
            self.execute(statement).await?;
        }
        self.execute(CLEAR_COLLECTION_CACHE_SQL).await?;

        for (key, value) in GeneralSettings::default().as_pairs() {
            sqlx::query("INSERT OR IGNORE INTO general_option (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await
                .map_err(|e| CatalogError::from_sqlx("Seeding options failed", e))?;
        }

        for license in License::defaults() {
            sqlx::query(
                "INSERT OR IGNORE INTO license (title, url, type, alternative_url, alternative_type) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&license.title)
            .bind(&license.url)
            .bind(&license.type_)
            .bind(&license.alternative_url)
            .bind(&license.alternative_type)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::from_sqlx("Seeding licenses failed", e))?;
        }

        Ok(())
    }

    async fn execute(&self, statement: &str) -> Result<()> {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        sqlx::query(trimmed)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::Database(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    /// Check the database answers.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::Database(format!("Ping failed: {}", e)))?;
        Ok(())
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ------------------------------------------------------------------
    // Datasets
    // ------------------------------------------------------------------

    /// Register a data source.
    pub async fn insert_dataset(&self, name: &str, kind: DatasetKind, path: &str) -> Result<Dataset> {
        let dataset = Dataset {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            path: path.to_string(),
        };

        sqlx::query("INSERT INTO dataset (uuid, name, kind, path) VALUES (?, ?, ?, ?)")
            .bind(dataset.uuid.to_string())
            .bind(&dataset.name)
            .bind(dataset.kind.as_str())
            .bind(&dataset.path)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::from_sqlx("Insert dataset failed", e))?;

        info!(dataset = %dataset.uuid, kind = kind.as_str(), "Registered dataset");
        Ok(dataset)
    }

    /// All datasets, by name.
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let rows = sqlx::query_as::<_, DatasetRow>(
            "SELECT uuid, name, kind, path FROM dataset ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query datasets failed", e))?;

        rows.into_iter().map(Dataset::try_from).collect()
    }

    /// One dataset.
    pub async fn get_dataset(&self, uuid: Uuid) -> Result<Dataset> {
        let row = sqlx::query_as::<_, DatasetRow>(
            "SELECT uuid, name, kind, path FROM dataset WHERE uuid = ?",
        )
        .bind(uuid.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query dataset failed", e))?;

        row.ok_or_else(|| CatalogError::not_found(format!("dataset {}", uuid)))?
            .try_into()
    }

    /// Delete a dataset and, by cascade, its collections.
    pub async fn delete_dataset(&self, uuid: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM dataset WHERE uuid = ?")
            .bind(uuid.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::from_sqlx("Delete dataset failed", e))?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(format!("dataset {}", uuid)));
        }
        info!(dataset = %uuid, "Deleted dataset");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    /// All collections, ordered by id.
    pub async fn list_collections(&self) -> Result<Vec<CollectionRecord>> {
        let rows = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {} FROM collection ORDER BY id",
            COLLECTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query collections failed", e))?;

        rows.into_iter().map(CollectionRecord::try_from).collect()
    }

    /// Collections registered from one dataset.
    pub async fn collections_of_dataset(&self, dataset_uuid: Uuid) -> Result<Vec<CollectionRecord>> {
        let rows = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {} FROM collection WHERE dataset_uuid = ? ORDER BY id",
            COLLECTION_COLUMNS
        ))
        .bind(dataset_uuid.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query collections failed", e))?;

        rows.into_iter().map(CollectionRecord::try_from).collect()
    }

    /// Collection by its public id.
    pub async fn get_collection(&self, id: &str) -> Result<CollectionRecord> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {} FROM collection WHERE id = ?",
            COLLECTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query collection failed", e))?;

        row.ok_or_else(|| CatalogError::not_found(format!("collection {}", id)))?
            .try_into()
    }

    /// Collection by its row uuid.
    pub async fn get_collection_by_uuid(&self, uuid: Uuid) -> Result<CollectionRecord> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {} FROM collection WHERE uuid = ?",
            COLLECTION_COLUMNS
        ))
        .bind(uuid.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query collection failed", e))?;

        row.ok_or_else(|| CatalogError::not_found(format!("collection {}", uuid)))?
            .try_into()
    }

    /// Ids equal to `base` or shaped like `base-...`, for id allocation.
    pub async fn ids_with_base(&self, base: &str) -> Result<Vec<String>> {
        let prefix = format!("{}-", base);
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM collection WHERE id = ? OR substr(id, 1, ?) = ?")
                .bind(base)
                .bind(prefix.chars().count() as i64)
                .bind(&prefix)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| CatalogError::from_sqlx("Query collection ids failed", e))?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Persist a new collection. A layer already registered for the same
    /// dataset, or a taken id, is a conflict.
    pub async fn insert_collection(&self, record: &CollectionRecord) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO collection ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            COLLECTION_COLUMNS
        ))
        .bind(record.uuid.to_string())
        .bind(&record.id)
        .bind(&record.layer_name)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.license_title)
        .bind(serde_json::to_string(&record.extent)?)
        .bind(serde_json::to_string(&record.crs)?)
        .bind(&record.storage_crs)
        .bind(record.storage_crs_coordinate_epoch)
        .bind(record.is_3d)
        .bind(&record.datetime_field)
        .bind(record.dataset_uuid.to_string())
        .bind(
            record
                .pre_rendered_json
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            CatalogError::from_sqlx(&format!("Insert collection '{}' failed", record.layer_name), e)
        })?;

        info!(collection_id = %record.id, layer = %record.layer_name, "Registered collection");
        Ok(())
    }

    /// Apply a metadata update; triggers drop the cached documents.
    pub async fn update_collection(&self, uuid: Uuid, update: &CollectionUpdate) -> Result<CollectionRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogError::from_sqlx("Begin transaction failed", e))?;

        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {} FROM collection WHERE uuid = ?",
            COLLECTION_COLUMNS
        ))
        .bind(uuid.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query collection failed", e))?;
        let mut record: CollectionRecord = row
            .ok_or_else(|| CatalogError::not_found(format!("collection {}", uuid)))?
            .try_into()?;

        if let Some(title) = &update.title {
            record.title = title.clone();
        }
        if let Some(description) = &update.description {
            record.description = description.clone();
        }
        if let Some(license) = &update.license_title {
            record.license_title = license.clone();
        }
        if let Some(field) = &update.datetime_field {
            record.datetime_field = field.clone();
        }

        sqlx::query(
            "UPDATE collection SET title = ?, description = ?, license_title = ?, datetime_field = ? \
             WHERE uuid = ?",
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.license_title)
        .bind(&record.datetime_field)
        .bind(uuid.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| CatalogError::from_sqlx("Update collection failed", e))?;

        tx.commit()
            .await
            .map_err(|e| CatalogError::from_sqlx("Commit failed", e))?;

        debug!(collection_id = %record.id, "Updated collection metadata");
        record.pre_rendered_json = None;
        Ok(record)
    }

    /// Replace a collection's stored extent.
    pub async fn set_collection_extent(&self, uuid: Uuid, extent: &Extent) -> Result<()> {
        sqlx::query("UPDATE collection SET extent_json = ? WHERE uuid = ?")
            .bind(serde_json::to_string(extent)?)
            .bind(uuid.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::from_sqlx("Update extent failed", e))?;
        Ok(())
    }

    /// Cache a rendered collection document.
    pub async fn store_collection_document(&self, uuid: Uuid, document: &Value) -> Result<()> {
        sqlx::query("UPDATE collection SET pre_rendered_json = ? WHERE uuid = ?")
            .bind(serde_json::to_string(document)?)
            .bind(uuid.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::from_sqlx("Store collection document failed", e))?;
        Ok(())
    }

    /// Delete collections by uuid; returns how many existed.
    pub async fn delete_collections(&self, uuids: &[Uuid]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogError::from_sqlx("Begin transaction failed", e))?;

        let mut deleted = 0;
        for uuid in uuids {
            deleted += sqlx::query("DELETE FROM collection WHERE uuid = ?")
                .bind(uuid.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| CatalogError::from_sqlx("Delete collection failed", e))?
                .rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| CatalogError::from_sqlx("Commit failed", e))?;
        info!(deleted, "Deleted collections");
        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Licenses and options
    // ------------------------------------------------------------------

    /// All licenses, by title.
    pub async fn list_licenses(&self) -> Result<Vec<License>> {
        let rows = sqlx::query_as::<_, LicenseRow>(
            "SELECT title, url, type, alternative_url, alternative_type FROM license ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query licenses failed", e))?;

        Ok(rows.into_iter().map(License::from).collect())
    }

    /// License by title, if it exists.
    pub async fn get_license(&self, title: &str) -> Result<Option<License>> {
        let row = sqlx::query_as::<_, LicenseRow>(
            "SELECT title, url, type, alternative_url, alternative_type FROM license WHERE title = ?",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::from_sqlx("Query license failed", e))?;

        Ok(row.map(License::from))
    }

    /// Current service title and description.
    pub async fn general_settings(&self) -> Result<GeneralSettings> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM general_option")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::from_sqlx("Query options failed", e))?;

        let mut settings = GeneralSettings::default();
        for (key, value) in rows {
            match key.as_str() {
                option_keys::SERVICE_TITLE => settings.service_title = value,
                option_keys::SERVICE_DESCRIPTION => settings.service_description = value,
                _ => {}
            }
        }
        Ok(settings)
    }

    /// Change service settings; the landing page cache is patched by trigger.
    pub async fn update_general_settings(&self, update: &GeneralSettingsUpdate) -> Result<GeneralSettings> {
        let changes = [
            (option_keys::SERVICE_TITLE, &update.service_title),
            (option_keys::SERVICE_DESCRIPTION, &update.service_description),
        ];
        for (key, value) in changes {
            if let Some(value) = value {
                sqlx::query("UPDATE general_option SET value = ? WHERE key = ?")
                    .bind(value)
                    .bind(key)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| CatalogError::from_sqlx("Update option failed", e))?;
            }
        }
        self.general_settings().await
    }

    // ------------------------------------------------------------------
    // Pre-rendered documents
    // ------------------------------------------------------------------

    /// Cached document by key.
    pub async fn get_document(&self, key: &str) -> Result<Option<Value>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT json_value FROM pre_rendered_json WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CatalogError::from_sqlx("Query document failed", e))?;

        row.map(|(json,)| serde_json::from_str(&json).map_err(CatalogError::from))
            .transpose()
    }

    /// Store or replace a cached document.
    pub async fn put_document(&self, key: &str, document: &Value) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO pre_rendered_json (key, json_value) VALUES (?, ?)")
            .bind(key)
            .bind(serde_json::to_string(document)?)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::from_sqlx("Store document failed", e))?;
        Ok(())
    }
}
