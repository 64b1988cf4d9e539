//! Persistence for the Features service.
//!
//! A single SQLite file (`data.db`) holds:
//! - datasets (local files or PostGIS connections)
//! - collections published from their layers
//! - licenses and general service options
//! - pre-rendered JSON documents, kept fresh by SQL triggers

pub mod catalog;
pub mod error;
pub mod models;
pub mod postgres;
mod schema;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
pub use models::{
    cache_keys, CollectionRecord, CollectionUpdate, Dataset, DatasetKind, GeneralSettings,
    GeneralSettingsUpdate, License,
};
pub use postgres::PgConnectionParams;
