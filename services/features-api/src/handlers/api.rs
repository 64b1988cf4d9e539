//! OpenAPI definition handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};

use features_protocol::{media_types, FeaturesError};

use crate::error::ApiResult;
use crate::state::AppState;

/// OpenAPI 3.0 definition of the Features endpoints.
const OPENAPI_DOCUMENT: &str = include_str!("../openapi.json");

/// The OpenAPI document with `servers` pointing at this deployment.
pub fn openapi_document(api_base: &str) -> ApiResult<Value> {
    let mut document: Value = serde_json::from_str(OPENAPI_DOCUMENT)
        .map_err(|e| FeaturesError::InternalError(format!("invalid OpenAPI document: {}", e)))?;
    document["servers"] = json!([{ "url": api_base, "description": "This server" }]);
    Ok(document)
}

/// GET /features/api.json - OpenAPI definition
pub async fn api_json_handler(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Response> {
    let document = openapi_document(&state.api_base())?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, media_types::OPENAPI_JSON),
            (header::CACHE_CONTROL, "max-age=3600"),
        ],
        document.to_string(),
    )
        .into_response())
}

/// GET /features/api.html - API documentation rendered by ReDoc
pub async fn api_html_handler() -> Response {
    let html = r#"<!DOCTYPE html>
<html>
<head>
    <title>OGC API - Features Documentation</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <redoc spec-url='api.json'></redoc>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
</body>
</html>"#;

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "max-age=3600"),
        ],
        html,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_parses() {
        let document = openapi_document("http://h/features").unwrap();
        assert_eq!(document["openapi"], "3.0.3");
        assert_eq!(document["servers"][0]["url"], "http://h/features");
        assert!(document["paths"]["/collections/{collectionId}/items"].is_object());
    }
}
