//! OGC CRS identifiers.
//!
//! Two spellings are accepted:
//! - URI: `http://www.opengis.net/def/crs/{authority}/{version}/{code}`
//! - URN: `urn:ogc:def:crs:{authority}:{version}:{code}` (version may be empty)

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{FeaturesError, Result};

/// WGS 84 longitude/latitude.
pub const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

/// WGS 84 longitude/latitude/ellipsoidal height.
pub const CRS84H: &str = "http://www.opengis.net/def/crs/OGC/0/CRS84h";

fn uri_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://www\.opengis\.net/def/crs/(\w+)/([\d.]+)/(.+)$")
            .expect("static CRS URI pattern")
    })
}

fn urn_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^urn:ogc:def:crs:(\w+):([\d.]*):(.+)$").expect("static CRS URN pattern")
    })
}

/// A parsed CRS identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrsIdentifier {
    /// Authority name, e.g. `EPSG` or `OGC`.
    pub authority: String,
    /// Version segment as written; often `0`.
    pub version: String,
    /// Code within the authority, e.g. `4326` or `CRS84`.
    pub code: String,
}

impl CrsIdentifier {
    /// Build an identifier from authority and code with the unversioned `0`.
    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            version: "0".to_string(),
            code: code.into(),
        }
    }

    /// Parse a URI or URN identifier.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let caps = uri_pattern()
            .captures(value)
            .or_else(|| urn_pattern().captures(value))
            .ok_or_else(|| FeaturesError::UnsupportedCrs(format!("'{}' is not a valid CRS identifier", value)))?;

        Ok(Self {
            authority: caps[1].to_string(),
            version: caps[2].to_string(),
            code: caps[3].to_string(),
        })
    }

    /// Canonical URI form, always with version `0`.
    pub fn uri(&self) -> String {
        format!("http://www.opengis.net/def/crs/{}/0/{}", self.authority, self.code)
    }

    /// Canonical URN form, with an empty version.
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:{}::{}", self.authority, self.code)
    }

    /// `AUTHORITY:CODE`, the form GDAL accepts as a user input definition.
    pub fn authority_code(&self) -> String {
        format!("{}:{}", self.authority, self.code)
    }

    /// Whether two identifiers name the same CRS regardless of spelling.
    pub fn same_crs(&self, other: &CrsIdentifier) -> bool {
        self.authority.eq_ignore_ascii_case(&other.authority) && self.code == other.code
    }

    /// CRS84 or CRS84h.
    pub fn is_crs84(&self) -> bool {
        self.authority.eq_ignore_ascii_case("OGC") && matches!(self.code.as_str(), "CRS84" | "CRS84h")
    }
}

impl fmt::Display for CrsIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

/// Default CRS for a collection: CRS84h for 3D data, CRS84 otherwise.
pub fn default_crs(is_3d: bool) -> &'static str {
    if is_3d {
        CRS84H
    } else {
        CRS84
    }
}

/// Find `requested` in `offered`, comparing by authority and code so that
/// URN and URI spellings or differing versions still match. Returns the
/// offered spelling.
pub fn match_offered<'a>(requested: &str, offered: &'a [String]) -> Result<&'a str> {
    let wanted = CrsIdentifier::parse(requested)?;
    offered
        .iter()
        .find(|candidate| {
            CrsIdentifier::parse(candidate)
                .map(|c| c.same_crs(&wanted))
                .unwrap_or(false)
        })
        .map(String::as_str)
        .ok_or_else(|| FeaturesError::UnsupportedCrs(format!("CRS '{}' is not supported by this collection", requested)))
}
