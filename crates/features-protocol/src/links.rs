//! Output formats and the self/alternate link sets built from them.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::media_types;
use crate::types::Link;

/// An output encoding a Features endpoint can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    GeoJson,
    Html,
}

/// Formats offered by metadata documents (landing page, collections, conformance).
pub const DOCUMENT_FORMATS: [Format; 2] = [Format::Json, Format::Html];

/// Formats offered by feature documents (items, single feature).
pub const FEATURE_FORMATS: [Format; 2] = [Format::GeoJson, Format::Html];

impl Format {
    /// Media type written to `Content-Type` and to link `type` fields.
    pub fn media_type(&self) -> &'static str {
        match self {
            Format::Json => media_types::JSON,
            Format::GeoJson => media_types::GEO_JSON,
            Format::Html => media_types::HTML,
        }
    }

    /// Value of the `f` query parameter selecting this format.
    pub fn f_param(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::GeoJson => "geojson",
            Format::Html => "html",
        }
    }

    /// Display name used in link titles.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "JSON",
            Format::GeoJson => "GeoJSON",
            Format::Html => "HTML",
        }
    }

    /// Parse an `f` parameter value.
    pub fn from_f_param(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "geojson" => Some(Format::GeoJson),
            "html" => Some(Format::Html),
            _ => None,
        }
    }

    /// Parse a media type, ignoring parameters such as `charset`.
    pub fn from_media_type(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(Format::Json),
            "application/geo+json" => Some(Format::GeoJson),
            "text/html" => Some(Format::Html),
            _ => None,
        }
    }
}

/// Append encoded query pairs to `href`.
pub fn href_with_query<K, V>(href: &str, pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if pairs.is_empty() {
        return href.to_string();
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k.as_ref(), v.as_ref());
    }
    format!("{}?{}", href, serializer.finish())
}

/// Build one link per format for `href`, marking `current` as `self` and the
/// rest as `alternate`.
///
/// `query` holds the pairs to keep on every link; any existing `f` pair is
/// replaced by the format's own.
pub fn format_links(
    href: &str,
    query: &[(String, String)],
    formats: &[Format],
    current: Format,
    title: &str,
) -> Vec<Link> {
    formats
        .iter()
        .map(|format| {
            let mut pairs: Vec<(&str, &str)> = query
                .iter()
                .filter(|(k, _)| k != "f")
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            pairs.push(("f", format.f_param()));

            let rel = if *format == current { "self" } else { "alternate" };
            Link::new(href_with_query(href, &pairs), rel)
                .with_type(format.media_type())
                .with_title(format!("{} as {}", title, format.name()))
        })
        .collect()
}

/// Re-label the self/alternate links of a cached document for the format
/// actually being served.
pub fn set_current_format(links: &mut [Link], current: Format) {
    for link in links.iter_mut().filter(|l| l.rel == "self" || l.rel == "alternate") {
        let is_current = link.type_.as_deref() == Some(current.media_type());
        link.rel = if is_current { "self" } else { "alternate" }.to_string();
    }
}
