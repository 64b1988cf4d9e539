//! HTTP error type for every handler.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use catalog::CatalogError;
use feature_source::SourceError;
use features_protocol::{ExceptionResponse, FeaturesError};

/// Result alias for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Anything a handler can fail with, rendered as an OGC exception document.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Protocol(#[from] FeaturesError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// Malformed dashboard request body.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Protocol(e) => e.status_code(),
            ApiError::Catalog(e) => match e {
                CatalogError::NotFound(_) => 404,
                CatalogError::Conflict(_) => 409,
                CatalogError::Invalid(_) | CatalogError::Connection(_) => 400,
                _ => 500,
            },
            ApiError::Source(e) => e.status_code(),
            ApiError::BadRequest(_) => 400,
            ApiError::Task(_) => 500,
        }
    }

    pub fn to_exception(&self) -> ExceptionResponse {
        if let ApiError::Protocol(e) = self {
            return e.to_exception();
        }
        let detail = self.to_string();
        match self.status_code() {
            400 => ExceptionResponse::bad_request(detail),
            404 => ExceptionResponse::not_found(detail),
            409 => ExceptionResponse::conflict(detail),
            _ => ExceptionResponse::internal_error(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = serde_json::to_string(&self.to_exception()).unwrap_or_default();
        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_status_mapping() {
        assert_eq!(ApiError::from(CatalogError::not_found("x")).status_code(), 404);
        assert_eq!(ApiError::from(CatalogError::Conflict("x".into())).status_code(), 409);
        assert_eq!(ApiError::from(CatalogError::Connection("x".into())).status_code(), 400);
        assert_eq!(ApiError::from(CatalogError::Database("x".into())).status_code(), 500);
    }

    #[test]
    fn test_protocol_exception_kept() {
        let err = ApiError::from(FeaturesError::UnknownParameter("'foo'".into()));
        let exc = err.to_exception();
        assert_eq!(exc.status, Some(400));
        assert!(exc.type_.ends_with("unknown-parameter"));
    }

    #[test]
    fn test_source_exception() {
        let err = ApiError::from(SourceError::FeatureNotFound("9".into()));
        let exc = err.to_exception();
        assert_eq!(exc.status, Some(404));
        assert_eq!(exc.title.as_deref(), Some("Not Found"));
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::BadRequest("missing body".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
