//! Dataset management.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use catalog::postgres::{check_connection, redact_connection_string};
use catalog::{Dataset, DatasetKind, PgConnectionParams};
use feature_source::LayerInfo;

use super::{parse_body, parse_uuid};
use crate::blocking::with_dataset;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Dataset as listed to the dashboard; credentials are masked.
#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub uuid: Uuid,
    pub name: String,
    pub kind: DatasetKind,
    pub path: String,
}

impl From<&Dataset> for DatasetSummary {
    fn from(dataset: &Dataset) -> Self {
        let path = match dataset.kind {
            DatasetKind::Postgis => redact_connection_string(&dataset.path),
            DatasetKind::File => dataset.path.clone(),
        };
        Self {
            uuid: dataset.uuid,
            name: dataset.name.clone(),
            kind: dataset.kind,
            path,
        }
    }
}

/// A layer of a dataset and the collection publishing it, if any.
#[derive(Debug, Serialize)]
pub struct DatasetLayer {
    #[serde(flatten)]
    pub info: LayerInfo,
    pub collection_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatasetDetail {
    #[serde(flatten)]
    pub dataset: DatasetSummary,
    pub layers: Vec<DatasetLayer>,
}

/// Body of `POST /datasets`. PostGIS sources give either `path` as a
/// connection string or `connection` parameters.
#[derive(Debug, Deserialize)]
pub struct NewDataset {
    pub name: String,
    pub kind: DatasetKind,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub connection: Option<PgConnectionParams>,
}

impl NewDataset {
    /// Where the data lives: a file path or a `postgresql://` URL.
    pub fn location(&self) -> ApiResult<String> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("dataset name must not be empty".to_string()));
        }
        match (self.kind, &self.path, &self.connection) {
            (DatasetKind::Postgis, _, Some(params)) => Ok(params.connection_string()?),
            (_, Some(path), _) if !path.trim().is_empty() => Ok(path.trim().to_string()),
            (DatasetKind::File, _, _) => Err(ApiError::BadRequest("a file dataset needs a 'path'".to_string())),
            (DatasetKind::Postgis, _, _) => Err(ApiError::BadRequest(
                "a postgis dataset needs 'connection' parameters or a connection string in 'path'".to_string(),
            )),
        }
    }
}

/// GET /datasets
pub async fn list_datasets_handler(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Json<Vec<DatasetSummary>>> {
    let datasets = state.catalog.list_datasets().await?;
    Ok(Json(datasets.iter().map(DatasetSummary::from).collect()))
}

/// POST /datasets - Register a data source after checking it can be read
pub async fn create_dataset_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Response> {
    let request: NewDataset = parse_body(&body)?;
    let location = request.location()?;

    match request.kind {
        DatasetKind::Postgis => check_connection(&location).await?,
        DatasetKind::File => {
            with_dataset(location.clone(), |_| Ok(())).await.map_err(|e| {
                warn!(path = %location, error = %e, "Dataset cannot be opened");
                ApiError::BadRequest(format!("cannot open '{}': {}", location, e))
            })?;
        }
    }

    let dataset = state
        .catalog
        .insert_dataset(request.name.trim(), request.kind, &location)
        .await?;
    info!(uuid = %dataset.uuid, kind = dataset.kind.as_str(), "Dataset added");

    Ok((StatusCode::CREATED, Json(DatasetSummary::from(&dataset))).into_response())
}

/// GET /datasets/:uuid - The dataset and the layers it contains
pub async fn get_dataset_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(uuid): Path<String>,
) -> ApiResult<Json<DatasetDetail>> {
    let dataset = state.catalog.get_dataset(parse_uuid(&uuid)?).await?;
    let published = state.catalog.collections_of_dataset(dataset.uuid).await?;

    let infos = with_dataset(dataset.path.clone(), |source| Ok(source.list_layers())).await?;
    let layers = infos
        .into_iter()
        .map(|info| {
            let collection_id = published
                .iter()
                .find(|c| c.layer_name == info.name)
                .map(|c| c.id.clone());
            DatasetLayer { info, collection_id }
        })
        .collect();

    Ok(Json(DatasetDetail {
        dataset: DatasetSummary::from(&dataset),
        layers,
    }))
}

/// DELETE /datasets/:uuid - Remove a dataset and its collections
pub async fn delete_dataset_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(uuid): Path<String>,
) -> ApiResult<StatusCode> {
    let uuid = parse_uuid(&uuid)?;
    state.catalog.delete_dataset(uuid).await?;
    info!(uuid = %uuid, "Dataset deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: DatasetKind, path: Option<&str>, connection: Option<PgConnectionParams>) -> NewDataset {
        NewDataset {
            name: "roads".to_string(),
            kind,
            path: path.map(str::to_string),
            connection,
        }
    }

    #[test]
    fn test_location_of_file_dataset() {
        let location = request(DatasetKind::File, Some(" /data/roads.gpkg "), None).location().unwrap();
        assert_eq!(location, "/data/roads.gpkg");
        assert!(request(DatasetKind::File, None, None).location().is_err());
    }

    #[test]
    fn test_location_of_postgis_dataset() {
        let params = PgConnectionParams {
            host: "db".to_string(),
            port: 5432,
            role: "reader".to_string(),
            password: "secret".to_string(),
            database_name: "gis".to_string(),
        };
        let location = request(DatasetKind::Postgis, None, Some(params)).location().unwrap();
        assert!(location.starts_with("postgresql://reader:secret@db:5432/gis"));

        let err = request(DatasetKind::Postgis, None, None).location().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_summary_masks_password() {
        let dataset = Dataset {
            uuid: Uuid::new_v4(),
            name: "pg".to_string(),
            kind: DatasetKind::Postgis,
            path: "postgresql://reader:secret@db:5432/gis".to_string(),
        };
        let summary = DatasetSummary::from(&dataset);
        assert!(!summary.path.contains("secret"));
    }
}
