//! Errors raised while reading feature data through GDAL.

use features_protocol::FeaturesError;
use gdal::errors::GdalError;
use thiserror::Error;

/// Result alias for feature source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalError),

    #[error("Failed to open dataset '{path}': {message}")]
    Open { path: String, message: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer '{layer}' has no field '{field}'")]
    FieldNotFound { layer: String, field: String },

    #[error("Layer '{0}' has no spatial reference")]
    NoSpatialRef(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("CRS error: {0}")]
    Crs(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unexpected query result: {0}")]
    UnexpectedResult(String),

    #[error(transparent)]
    Protocol(#[from] FeaturesError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SourceError {
    /// HTTP status this error maps to when it reaches a client.
    pub fn status_code(&self) -> u16 {
        match self {
            SourceError::FeatureNotFound(_) | SourceError::LayerNotFound(_) => 404,
            SourceError::InvalidQuery(_) | SourceError::Crs(_) | SourceError::FieldNotFound { .. } => 400,
            SourceError::Protocol(e) => e.status_code(),
            _ => 500,
        }
    }
}
