//! HTTP request handlers.

pub mod api;
pub mod collections;
pub mod conformance;
pub mod dashboard;
pub mod features;
pub mod health;
pub mod index;
pub mod landing;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use url::form_urlencoded;

use features_protocol::Format;

/// `Content-Crs` header of Part 2.
pub const CONTENT_CRS: HeaderName = HeaderName::from_static("content-crs");

/// Decode a raw query string into ordered pairs.
pub fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Last value of the `f` parameter.
pub fn f_param(pairs: &[(String, String)]) -> Option<&str> {
    pairs.iter().rev().find(|(k, _)| k == "f").map(|(_, v)| v.as_str())
}

/// Serialize `document` with the media type of `format`.
pub fn json_response<T: Serialize>(format: Format, document: &T) -> Response {
    match serde_json::to_string(document) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, format.media_type())],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub fn html_response(page: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        page,
    )
        .into_response()
}

/// Add `Content-Crs: <uri>` to a response.
pub fn with_content_crs(mut response: Response, crs: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(&format!("<{}>", crs)) {
        response.headers_mut().insert(CONTENT_CRS, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_decoded_in_order() {
        let pairs = query_pairs(Some("bbox=1%2C2%2C3%2C4&f=html&f=json"));
        assert_eq!(pairs[0], ("bbox".to_string(), "1,2,3,4".to_string()));
        assert_eq!(f_param(&pairs), Some("json"));
        assert!(query_pairs(None).is_empty());
    }

    #[test]
    fn test_content_crs_header() {
        let response = with_content_crs(
            html_response(String::new()),
            "http://www.opengis.net/def/crs/EPSG/0/3857",
        );
        assert_eq!(
            response.headers().get("content-crs").unwrap(),
            "<http://www.opengis.net/def/crs/EPSG/0/3857>"
        );
    }
}
