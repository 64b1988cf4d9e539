//! Features API response types.
//!
//! This module contains types for the landing page, conformance,
//! and exception responses.

use serde::{Deserialize, Serialize};

use crate::conformance;
use crate::links::{format_links, Format, DOCUMENT_FORMATS};
use crate::media_types;
use crate::types::Link;

const EXCEPTION_BASE: &str = "http://www.opengis.net/def/exceptions/ogcapi-features-1/1.0";

/// Landing page response for the Features API root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandingPage {
    /// Title of the API.
    pub title: String,

    /// Description of the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Links to related resources.
    pub links: Vec<Link>,
}

impl LandingPage {
    /// Create a new landing page with standard links.
    ///
    /// `base_url` is the root of the Features API (e.g. `http://host/features`).
    pub fn new(title: impl Into<String>, description: impl Into<String>, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let mut links = format_links(
            &format!("{}/", base_url),
            &[],
            &DOCUMENT_FORMATS,
            Format::Json,
            "This document",
        );
        links.extend([
            Link::new(format!("{}/api.json", base_url), "service-desc")
                .with_type(media_types::OPENAPI_JSON)
                .with_title("The API definition"),
            Link::new(format!("{}/api.html", base_url), "service-doc")
                .with_type(media_types::HTML)
                .with_title("The API documentation"),
            Link::new(format!("{}/conformance", base_url), "conformance")
                .with_type(media_types::JSON)
                .with_title("Conformance classes implemented by this server"),
            Link::new(format!("{}/collections", base_url), "data")
                .with_type(media_types::JSON)
                .with_title("Information about the feature collections"),
        ]);

        Self {
            title: title.into(),
            description: Some(description.into()),
            links,
        }
    }
}

/// Conformance declaration response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConformanceClasses {
    /// List of conformance class URIs.
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
}

impl ConformanceClasses {
    /// Conformance classes implemented by this server.
    pub fn current() -> Self {
        Self {
            conforms_to: vec![
                conformance::CORE.to_string(),
                conformance::OAS30.to_string(),
                conformance::HTML.to_string(),
                conformance::GEOJSON.to_string(),
                conformance::CRS.to_string(),
            ],
        }
    }

    /// Check if a conformance class is declared.
    pub fn contains(&self, class: &str) -> bool {
        self.conforms_to.iter().any(|c| c == class)
    }
}

/// Exception response for errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// Exception type identifier.
    #[serde(rename = "type")]
    pub type_: String,

    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTTP status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Detailed error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI of the request that caused the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ExceptionResponse {
    /// Create a new exception response.
    pub fn new(type_: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            title: None,
            status: Some(status),
            detail: Some(detail.into()),
            instance: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the instance URI.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Create a 404 Not Found exception.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/not-found", EXCEPTION_BASE), 404, detail).with_title("Not Found")
    }

    /// Create a 400 Bad Request exception.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/invalid-parameter-value", EXCEPTION_BASE), 400, detail)
            .with_title("Bad Request")
    }

    /// Create a 400 exception for a parameter the endpoint does not accept.
    pub fn unknown_parameter(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/unknown-parameter", EXCEPTION_BASE), 400, detail)
            .with_title("Bad Request")
    }

    /// Create a 406 Not Acceptable exception.
    pub fn not_acceptable(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/not-acceptable", EXCEPTION_BASE), 406, detail)
            .with_title("Not Acceptable")
    }

    /// Create a 409 Conflict exception.
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/conflict", EXCEPTION_BASE), 409, detail).with_title("Conflict")
    }

    /// Create a 500 Internal Server Error exception.
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(format!("{}/server-error", EXCEPTION_BASE), 500, detail)
            .with_title("Internal Server Error")
    }
}
