//! Features API error types.

use thiserror::Error;

use crate::responses::ExceptionResponse;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, FeaturesError>;

/// Errors that can occur while serving Features requests.
#[derive(Debug, Error)]
pub enum FeaturesError {
    /// Collection not found.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Feature not found.
    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    /// Invalid query parameter value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Query parameter the endpoint does not know about.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Malformed CRS identifier or CRS not offered by a collection.
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// `f` parameter value the endpoint cannot produce.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No media type in the Accept header can be produced.
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    /// Resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl FeaturesError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            FeaturesError::CollectionNotFound(_) => 404,
            FeaturesError::FeatureNotFound(_) => 404,
            FeaturesError::InvalidParameter(_) => 400,
            FeaturesError::UnknownParameter(_) => 400,
            FeaturesError::UnsupportedCrs(_) => 400,
            FeaturesError::UnsupportedFormat(_) => 400,
            FeaturesError::NotAcceptable(_) => 406,
            FeaturesError::Conflict(_) => 409,
            FeaturesError::InternalError(_) => 500,
        }
    }

    /// Convert to an ExceptionResponse.
    pub fn to_exception(&self) -> ExceptionResponse {
        let detail = self.to_string();
        match self {
            FeaturesError::CollectionNotFound(_) | FeaturesError::FeatureNotFound(_) => {
                ExceptionResponse::not_found(detail)
            }
            FeaturesError::InvalidParameter(_)
            | FeaturesError::UnsupportedCrs(_)
            | FeaturesError::UnsupportedFormat(_) => ExceptionResponse::bad_request(detail),
            FeaturesError::UnknownParameter(_) => ExceptionResponse::unknown_parameter(detail),
            FeaturesError::NotAcceptable(_) => ExceptionResponse::not_acceptable(detail),
            FeaturesError::Conflict(_) => ExceptionResponse::conflict(detail),
            FeaturesError::InternalError(_) => ExceptionResponse::internal_error(detail),
        }
    }
}
