//! Service title and description.

use std::sync::Arc;

use axum::{body::Bytes, extract::Extension, Json};
use tracing::info;

use catalog::{GeneralSettings, GeneralSettingsUpdate};

use super::parse_body;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /settings/general
pub async fn get_settings_handler(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Json<GeneralSettings>> {
    Ok(Json(state.catalog.general_settings().await?))
}

/// PATCH /settings/general - The landing page follows the new values
pub async fn update_settings_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<GeneralSettings>> {
    let update: GeneralSettingsUpdate = parse_body(&body)?;
    if update.service_title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("service_title must not be empty".to_string()));
    }

    let settings = state.catalog.update_general_settings(&update).await?;
    info!(title = %settings.service_title, "General settings updated");
    Ok(Json(settings))
}
