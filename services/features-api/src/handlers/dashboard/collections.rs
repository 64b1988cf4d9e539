//! Publishing layers and editing collection metadata.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use catalog::{CatalogError, CollectionRecord, CollectionUpdate, License};

use super::{parse_body, parse_uuid};
use crate::error::{ApiError, ApiResult};
use crate::registrar::{self, bulk_status, LayerOutcome, RegisterOptions};
use crate::state::AppState;

/// Body of `POST /collections`. Without `layer_name` every layer of the
/// dataset is published.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub dataset_uuid: Uuid,
    #[serde(default)]
    pub layer_name: Option<String>,
    #[serde(flatten)]
    pub options: RegisterOptions,
}

/// Body of `PATCH /collections`.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub uuid: Uuid,
    #[serde(flatten)]
    pub update: CollectionUpdate,
}

/// Body of `DELETE /collections`.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub uuids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub layers: Vec<LayerOutcome>,
}

/// GET /collections
pub async fn list_collections_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<CollectionRecord>>> {
    Ok(Json(state.catalog.list_collections().await?))
}

/// GET /collections/:uuid
pub async fn get_collection_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(uuid): Path<String>,
) -> ApiResult<Json<CollectionRecord>> {
    let record = state.catalog.get_collection_by_uuid(parse_uuid(&uuid)?).await?;
    Ok(Json(record))
}

/// POST /collections - Publish one layer, or all layers of a dataset
pub async fn register_handler(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> ApiResult<Response> {
    let request: RegisterRequest = parse_body(&body)?;
    let dataset = state.catalog.get_dataset(request.dataset_uuid).await?;
    let api_base = state.api_base();

    match &request.layer_name {
        Some(layer_name) => {
            let record =
                registrar::register_layer(&state.catalog, &dataset, layer_name, &request.options, &api_base).await?;
            Ok((StatusCode::CREATED, Json(record)).into_response())
        }
        None => {
            let layers = registrar::register_all(&state.catalog, &dataset, &api_base).await?;
            let status = StatusCode::from_u16(bulk_status(&layers)).unwrap_or(StatusCode::MULTI_STATUS);
            info!(dataset = %dataset.uuid, layers = layers.len(), status = status.as_u16(), "Bulk registration finished");
            Ok((status, Json(BulkResponse { layers })).into_response())
        }
    }
}

/// PATCH /collections - Edit metadata of one collection
pub async fn update_collection_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<CollectionRecord>> {
    let request: UpdateRequest = parse_body(&body)?;
    if let Some(Some(title)) = &request.update.license_title {
        if state.catalog.get_license(title).await?.is_none() {
            return Err(ApiError::BadRequest(format!("unknown license '{}'", title)));
        }
    }

    let record =
        registrar::update_collection(&state.catalog, request.uuid, &request.update, &state.api_base()).await?;
    info!(collection_id = %record.id, "Collection updated");
    Ok(Json(record))
}

/// DELETE /collections - Unpublish collections
pub async fn delete_collections_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Response> {
    let request: DeleteRequest = parse_body(&body)?;
    let deleted = state.catalog.delete_collections(&request.uuids).await?;
    if deleted == 0 {
        return Err(CatalogError::not_found("no matching collection").into());
    }
    info!(deleted, "Collections deleted");
    Ok((StatusCode::OK, Json(json!({ "deleted": deleted }))).into_response())
}

/// GET /collections/licenses
pub async fn list_licenses_handler(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Json<Vec<License>>> {
    Ok(Json(state.catalog.list_licenses().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_with_options() {
        let uuid = Uuid::new_v4();
        let body = format!(
            r#"{{"dataset_uuid":"{}","layer_name":"lakes","title":"Lakes","datetime_field":"observed"}}"#,
            uuid
        );
        let request: RegisterRequest = parse_body(&Bytes::from(body)).unwrap();
        assert_eq!(request.dataset_uuid, uuid);
        assert_eq!(request.layer_name.as_deref(), Some("lakes"));
        assert_eq!(request.options.title.as_deref(), Some("Lakes"));
        assert_eq!(request.options.datetime_field.as_deref(), Some("observed"));
    }

    #[test]
    fn test_update_request_detaches_license() {
        let uuid = Uuid::new_v4();
        let body = format!(r#"{{"uuid":"{}","license_title":null}}"#, uuid);
        let request: UpdateRequest = parse_body(&Bytes::from(body)).unwrap();
        assert_eq!(request.update.license_title, Some(None));
        assert_eq!(request.update.title, None);
    }
}
