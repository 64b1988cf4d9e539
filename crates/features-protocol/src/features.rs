//! GeoJSON feature documents.
//!
//! Geometries arrive already encoded by GDAL, so they are carried as raw
//! JSON values rather than typed geometry enums.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Link;

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Feature identifier (the layer's FID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Geometry object, or `null` for features without geometry.
    pub geometry: Option<Value>,

    /// Attribute values.
    pub properties: Map<String, Value>,

    /// Links, present on single-feature responses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Feature {
    /// Create a feature from its parts.
    pub fn new(id: Option<u64>, geometry: Option<Value>, properties: Map<String, Value>) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: id.map(Value::from),
            geometry,
            properties,
            links: Vec::new(),
        }
    }

    /// Set the links.
    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }
}

/// A GeoJSON FeatureCollection with the OGC paging members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<Feature>,

    pub links: Vec<Link>,

    /// Response generation time, RFC 3339.
    pub time_stamp: String,

    pub number_matched: u64,

    pub number_returned: u64,
}

impl FeatureCollection {
    /// Create a collection stamped with the current time.
    pub fn new(features: Vec<Feature>, number_matched: u64) -> Self {
        Self::at(features, number_matched, Utc::now())
    }

    /// Create a collection stamped with `now`.
    pub fn at(features: Vec<Feature>, number_matched: u64, now: DateTime<Utc>) -> Self {
        let number_returned = features.len() as u64;
        Self {
            type_: "FeatureCollection".to_string(),
            features,
            links: Vec::new(),
            time_stamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            number_matched,
            number_returned,
        }
    }

    /// Set the links.
    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }
}
