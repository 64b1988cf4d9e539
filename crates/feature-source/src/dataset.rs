//! Opening GDAL vector datasets.

use gdal::vector::sql::Dialect;
use gdal::vector::{Layer, LayerAccess};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use serde::Serialize;
use tracing::{debug, warn};

use crate::crs::uri_of_spatial_ref;
use crate::error::{Result, SourceError};
use crate::ffi;

/// Short name GDAL gives its PostgreSQL/PostGIS driver.
pub const POSTGRES_DRIVER: &str = "PostgreSQL";

/// Where a dataset's features are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Any file-based OGR driver; queries use the OGR SQL dialect.
    File,
    /// PostGIS; queries are sent to the server as native SQL.
    Postgres,
}

/// Whether a dataset path is a PostgreSQL connection string.
pub fn is_postgres_connection(path: &str) -> bool {
    path.starts_with("postgresql://") || path.starts_with("postgres://") || path.starts_with("PG:")
}

/// A vector dataset opened read-only. The handle is released on drop, so
/// open one per unit of work.
pub struct SourceDataset {
    dataset: Dataset,
    backend: Backend,
}

impl SourceDataset {
    /// Open a file path or a `postgresql://` connection string.
    pub fn open(path: &str) -> Result<Self> {
        let target = if is_postgres_connection(path) && !path.starts_with("PG:") {
            format!("PG:{}", path)
        } else {
            path.to_string()
        };

        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_READONLY
                | GdalOpenFlags::GDAL_OF_SHARED
                | GdalOpenFlags::GDAL_OF_VECTOR
                | GdalOpenFlags::GDAL_OF_VERBOSE_ERROR,
            ..Default::default()
        };

        let dataset = Dataset::open_ex(&target, options).map_err(|e| {
            let shown = if is_postgres_connection(path) {
                "PostgreSQL connection".to_string()
            } else {
                path.to_string()
            };
            warn!(path = %shown, error = %e, "Failed to open dataset");
            SourceError::Open {
                path: shown,
                message: e.to_string(),
            }
        })?;

        let backend = if dataset.driver().short_name() == POSTGRES_DRIVER {
            Backend::Postgres
        } else {
            Backend::File
        };
        debug!(backend = ?backend, layers = dataset.layer_count(), "Opened dataset");

        Ok(Self { dataset, backend })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn is_postgres(&self) -> bool {
        self.backend == Backend::Postgres
    }

    /// SQL dialect used for generated queries.
    pub fn native_dialect(&self) -> Dialect {
        match self.backend {
            Backend::Postgres => Dialect::DEFAULT,
            Backend::File => Dialect::OGR,
        }
    }

    pub(crate) fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Look up a layer by name.
    pub fn layer(&self, name: &str) -> Result<Layer<'_>> {
        self.dataset
            .layer_by_name(name)
            .map_err(|_| SourceError::LayerNotFound(name.to_string()))
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.dataset.layers().map(|layer| layer.name()).collect()
    }

    /// Summary of every layer, for choosing what to publish.
    pub fn list_layers(&self) -> Vec<LayerInfo> {
        self.dataset
            .layers()
            .map(|layer| {
                let geometry_type = ffi::layer_geometry_type(&layer);
                LayerInfo {
                    name: layer.name(),
                    geometry_type: ffi::geometry_type_name(geometry_type),
                    feature_count: layer.feature_count(),
                    crs: layer
                        .spatial_ref()
                        .and_then(|srs| uri_of_spatial_ref(&srs).ok()),
                }
            })
            .collect()
    }
}

/// A layer as listed for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerInfo {
    pub name: String,
    pub geometry_type: String,
    pub feature_count: u64,
    /// CRS URI, when the layer's spatial reference has an authority code.
    pub crs: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_postgres_connection() {
        assert!(is_postgres_connection("postgresql://gis@localhost:5432/features"));
        assert!(is_postgres_connection("PG:dbname=features"));
        assert!(!is_postgres_connection("/data/lakes.gpkg"));
        assert!(!is_postgres_connection("postgresql.geojson"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = SourceDataset::open("/nonexistent/lakes.geojson").err().unwrap();
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
