//! OGC API - Features Protocol
//!
//! Types and pure algorithms for serving an OGC API - Features endpoint.
//! Nothing in this crate touches the network, the database or GDAL, so
//! every rule that can be checked without data lives here.
//!
//! # Conformance Classes
//!
//! - Part 1: Core, OpenAPI 3.0, HTML, GeoJSON
//! - Part 2: Coordinate Reference Systems by Reference
//!
//! # Example
//!
//! ```rust
//! use features_protocol::LandingPage;
//!
//! let landing = LandingPage::new(
//!     "OGC Features API",
//!     "A OGC compliant Features API",
//!     "http://localhost:8000/features",
//! );
//! assert!(landing.links.iter().any(|l| l.rel == "conformance"));
//! ```

pub mod collections;
pub mod crs;
pub mod errors;
pub mod extent;
pub mod features;
pub mod links;
pub mod pagination;
pub mod queries;
pub mod responses;
pub mod slug;
pub mod types;

// Re-export commonly used types
pub use collections::{Collection, CollectionList};
pub use crs::{CrsIdentifier, CRS84, CRS84H};
pub use errors::{FeaturesError, Result};
pub use extent::GdalExtent;
pub use features::{Feature, FeatureCollection};
pub use links::Format;
pub use pagination::Page;
pub use queries::{BboxQuery, DateTimeFilter, FeatureQuery, ItemsQuery, LimitConfig};
pub use responses::{ConformanceClasses, ExceptionResponse, LandingPage};
pub use types::{Extent, Link, SpatialExtent, TemporalExtent};

/// OGC API - Features conformance class URIs
pub mod conformance {
    /// Part 1 core
    pub const CORE: &str = "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core";
    /// OpenAPI 3.0 service description
    pub const OAS30: &str = "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/oas30";
    /// HTML encoding
    pub const HTML: &str = "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/html";
    /// GeoJSON encoding
    pub const GEOJSON: &str = "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson";
    /// Part 2 CRS by reference
    pub const CRS: &str = "http://www.opengis.net/spec/ogcapi-features-2/1.0/conf/crs";
}

/// Media types used in Features responses
pub mod media_types {
    /// Plain JSON
    pub const JSON: &str = "application/json";
    /// GeoJSON
    pub const GEO_JSON: &str = "application/geo+json";
    /// HTML
    pub const HTML: &str = "text/html";
    /// OpenAPI JSON
    pub const OPENAPI_JSON: &str = "application/vnd.oai.openapi+json;version=3.0";
    /// RDF/XML, used by the alternate license links
    pub const RDF_XML: &str = "application/rdf+xml";
}
