//! JSON endpoints backing the administration dashboard.
//!
//! Mounted under `/{dashboard_url}/data`. They manage datasets, publish
//! layers as collections and edit the service settings.

pub mod collections;
pub mod datasets;
pub mod settings;

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Decode a JSON request body.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e)))
}

/// Parse a dataset or collection uuid from a path segment.
pub fn parse_uuid(value: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid uuid", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        name: String,
    }

    #[test]
    fn test_parse_body() {
        let body: Body = parse_body(&Bytes::from_static(br#"{"name":"lakes"}"#)).unwrap();
        assert_eq!(body.name, "lakes");

        let err = parse_body::<Body>(&Bytes::from_static(b"{")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_parse_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(parse_uuid(&uuid.to_string()).unwrap(), uuid);
        assert_eq!(parse_uuid("nope").unwrap_err().status_code(), 400);
    }
}
