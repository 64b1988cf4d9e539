//! Rows stored in the catalog and the documents derived from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use features_protocol::collections::collection_links;
use features_protocol::{Collection, Extent, Link};

use crate::error::{CatalogError, Result};

/// Keys of the `pre_rendered_json` table.
pub mod cache_keys {
    pub const LANDING_PAGE: &str = "landing_page";
    pub const COLLECTIONS: &str = "collections";
    pub const CONFORMANCE: &str = "conformance_declaration";
}

/// Keys of the `general_option` table.
pub mod option_keys {
    pub const SERVICE_TITLE: &str = "service_title";
    pub const SERVICE_DESCRIPTION: &str = "service_description";
}

/// Where a dataset's data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// A local file or directory readable by GDAL/OGR.
    File,
    /// A PostgreSQL/PostGIS database.
    Postgis,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::File => "file",
            DatasetKind::Postgis => "postgis",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "file" => Ok(DatasetKind::File),
            "postgis" => Ok(DatasetKind::Postgis),
            other => Err(CatalogError::Invalid(format!("unknown dataset kind '{}'", other))),
        }
    }
}

/// A registered data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub uuid: Uuid,
    pub name: String,
    pub kind: DatasetKind,
    /// File path, or a `postgresql://` connection string.
    pub path: String,
}

#[derive(FromRow)]
pub(crate) struct DatasetRow {
    uuid: String,
    name: String,
    kind: String,
    path: String,
}

impl TryFrom<DatasetRow> for Dataset {
    type Error = CatalogError;

    fn try_from(row: DatasetRow) -> Result<Self> {
        Ok(Dataset {
            uuid: parse_uuid(&row.uuid)?,
            name: row.name,
            kind: DatasetKind::parse(&row.kind)?,
            path: row.path,
        })
    }
}

/// A license that can be attached to collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub alternative_url: Option<String>,
    pub alternative_type: Option<String>,
}

impl License {
    /// `rel=license` links for the main and alternative documents.
    pub fn links(&self) -> Vec<Link> {
        let mut links = vec![Link::new(&self.url, "license")
            .with_type(&self.type_)
            .with_title(&self.title)];
        if let (Some(url), Some(type_)) = (&self.alternative_url, &self.alternative_type) {
            links.push(Link::new(url, "license").with_type(type_).with_title(&self.title));
        }
        links
    }

    fn creative_commons(title: &str, path: &str) -> Self {
        let url = format!("https://creativecommons.org/{}/", path);
        Self {
            title: title.to_string(),
            alternative_url: Some(format!("{}rdf", url)),
            url,
            type_: "text/html".to_string(),
            alternative_type: Some(features_protocol::media_types::RDF_XML.to_string()),
        }
    }

    /// Licenses inserted on every startup unless already present.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::creative_commons("CC0-1.0", "publicdomain/zero/1.0"),
            Self::creative_commons("CC-BY-4.0", "licenses/by/4.0"),
            Self::creative_commons("CC-BY-SA-4.0", "licenses/by-sa/4.0"),
            Self::creative_commons("CC-BY-NC-4.0", "licenses/by-nc/4.0"),
            Self::creative_commons("CC-BY-NC-SA-4.0", "licenses/by-nc-sa/4.0"),
            Self::creative_commons("CC-BY-ND-4.0", "licenses/by-nd/4.0"),
            Self::creative_commons("CC-BY-NC-ND-4.0", "licenses/by-nc-nd/4.0"),
        ]
    }
}

#[derive(FromRow)]
pub(crate) struct LicenseRow {
    title: String,
    url: String,
    #[sqlx(rename = "type")]
    type_: String,
    alternative_url: Option<String>,
    alternative_type: Option<String>,
}

impl From<LicenseRow> for License {
    fn from(row: LicenseRow) -> Self {
        License {
            title: row.title,
            url: row.url,
            type_: row.type_,
            alternative_url: row.alternative_url,
            alternative_type: row.alternative_type,
        }
    }
}

/// A layer published as a feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub uuid: Uuid,
    /// Public collection id used in URLs.
    pub id: String,
    pub layer_name: String,
    pub title: String,
    pub description: String,
    pub license_title: Option<String>,
    pub extent: Extent,
    pub crs: Vec<String>,
    pub storage_crs: String,
    pub storage_crs_coordinate_epoch: Option<f64>,
    pub is_3d: bool,
    /// Attribute used for `datetime` filtering and the temporal extent.
    pub datetime_field: Option<String>,
    pub dataset_uuid: Uuid,
    /// Cached collection document, cleared whenever metadata changes.
    #[serde(skip)]
    pub pre_rendered_json: Option<Value>,
}

impl CollectionRecord {
    /// Build the collection document. `api_base` is the Features root URL.
    pub fn to_collection(&self, api_base: &str, license: Option<&License>) -> Collection {
        let mut links = collection_links(api_base, &self.id, &self.title);
        if let Some(license) = license {
            links.extend(license.links());
        }

        let mut collection = Collection::new(&self.id)
            .with_title(&self.title)
            .with_links(links)
            .with_crs(self.crs.clone())
            .with_storage_crs(&self.storage_crs, self.storage_crs_coordinate_epoch);
        if !self.description.is_empty() {
            collection = collection.with_description(&self.description);
        }
        if !self.extent.is_empty() {
            collection = collection.with_extent(self.extent.clone());
        }
        collection
    }
}

#[derive(FromRow)]
pub(crate) struct CollectionRow {
    uuid: String,
    id: String,
    layer_name: String,
    title: String,
    description: String,
    license_title: Option<String>,
    extent_json: Option<String>,
    crs_json: String,
    storage_crs: String,
    storage_crs_coordinate_epoch: Option<f64>,
    is_3d: bool,
    datetime_field: Option<String>,
    dataset_uuid: String,
    pre_rendered_json: Option<String>,
}

impl TryFrom<CollectionRow> for CollectionRecord {
    type Error = CatalogError;

    fn try_from(row: CollectionRow) -> Result<Self> {
        Ok(CollectionRecord {
            uuid: parse_uuid(&row.uuid)?,
            id: row.id,
            layer_name: row.layer_name,
            title: row.title,
            description: row.description,
            license_title: row.license_title,
            extent: match row.extent_json {
                Some(json) => serde_json::from_str(&json)?,
                None => Extent::default(),
            },
            crs: serde_json::from_str(&row.crs_json)?,
            storage_crs: row.storage_crs,
            storage_crs_coordinate_epoch: row.storage_crs_coordinate_epoch,
            is_3d: row.is_3d,
            datetime_field: row.datetime_field,
            dataset_uuid: parse_uuid(&row.dataset_uuid)?,
            pre_rendered_json: row
                .pre_rendered_json
                .map(|json| serde_json::from_str(&json))
                .transpose()?,
        })
    }
}

/// Editable collection metadata; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollectionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` detaches the license.
    #[serde(default, deserialize_with = "double_option")]
    pub license_title: Option<Option<String>>,
    /// `Some(None)` removes the datetime field.
    #[serde(default, deserialize_with = "double_option")]
    pub datetime_field: Option<Option<String>>,
}

fn double_option<'de, D, T>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Service-wide settings kept in `general_option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub service_title: String,
    pub service_description: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            service_title: "OGC Features API".to_string(),
            service_description: "A OGC compliant Features API".to_string(),
        }
    }
}

impl GeneralSettings {
    pub(crate) fn as_pairs(&self) -> [(&'static str, &str); 2] {
        [
            (option_keys::SERVICE_TITLE, self.service_title.as_str()),
            (option_keys::SERVICE_DESCRIPTION, self.service_description.as_str()),
        ]
    }
}

/// Partial update of the general settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneralSettingsUpdate {
    pub service_title: Option<String>,
    pub service_description: Option<String>,
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| CatalogError::Invalid(format!("bad uuid '{}': {}", value, e)))
}
