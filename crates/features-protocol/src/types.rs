//! Core types shared by every Features document.

use serde::{Deserialize, Serialize};

use crate::crs::CRS84;

/// Temporal reference system used for every temporal extent.
pub const GREGORIAN_TRS: &str = "http://www.opengis.net/def/uom/ISO-8601/0/Gregorian";

/// A hyperlink to a related resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// The URI of the linked resource.
    pub href: String,

    /// The relationship type (e.g., "self", "data", "conformance").
    pub rel: String,

    /// The media type of the linked resource.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// A human-readable title for the link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// Create a new link with required fields.
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            type_: None,
            title: None,
        }
    }

    /// Set the media type.
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// The spatial and temporal extent of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Extent {
    /// The spatial extent of the collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialExtent>,

    /// The temporal extent of the collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalExtent>,
}

impl Extent {
    /// Create an extent with a single bounding box (4 or 6 numbers, OGC order).
    pub fn with_spatial(bbox: Vec<f64>, crs: impl Into<String>) -> Self {
        Self {
            spatial: Some(SpatialExtent {
                bbox: vec![bbox],
                crs: crs.into(),
            }),
            temporal: None,
        }
    }

    /// Add temporal extent to this extent (builder pattern).
    pub fn with_temporal(mut self, temporal: TemporalExtent) -> Self {
        self.temporal = Some(temporal);
        self
    }

    /// Whether the extent carries any information at all.
    pub fn is_empty(&self) -> bool {
        self.spatial.is_none() && self.temporal.is_none()
    }
}

/// Spatial extent with bounding boxes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpatialExtent {
    /// Bounding boxes in OGC order, `[minx, miny, maxx, maxy]` or
    /// `[minx, miny, minz, maxx, maxy, maxz]`.
    pub bbox: Vec<Vec<f64>>,

    /// Coordinate reference system of the bounding boxes.
    #[serde(default = "default_crs")]
    pub crs: String,
}

fn default_crs() -> String {
    CRS84.to_string()
}

/// Temporal extent with time intervals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemporalExtent {
    /// Time intervals as [start, end] pairs (RFC 3339); null is open-ended.
    pub interval: Vec<[Option<String>; 2]>,

    /// Temporal reference system.
    #[serde(default = "default_trs")]
    pub trs: String,
}

fn default_trs() -> String {
    GREGORIAN_TRS.to_string()
}

impl TemporalExtent {
    /// Create a temporal extent from start and end times.
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        Self {
            interval: vec![[start, end]],
            trs: default_trs(),
        }
    }
}
