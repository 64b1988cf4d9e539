//! Content negotiation for the `f` parameter and the Accept header.
//!
//! An explicit, non-empty `f` wins and is answered with 400 when it names
//! something the endpoint cannot produce. Otherwise the Accept header is
//! honoured by quality value and answered with 406 when nothing in it can be
//! produced. Without either, the endpoint's first format is used.

use axum::http::{header, HeaderMap};

use features_protocol::{FeaturesError, Format};

/// Pick the response format among `offered` (default first).
pub fn negotiate(
    headers: &HeaderMap,
    f_param: Option<&str>,
    offered: &[Format],
) -> Result<Format, FeaturesError> {
    let default = offered.first().copied().unwrap_or(Format::Json);

    // `f=` with an empty value is treated as absent
    if let Some(f) = f_param.map(str::trim).filter(|f| !f.is_empty()) {
        return Format::from_f_param(f)
            .and_then(|format| resolve(format, offered))
            .ok_or_else(|| {
                FeaturesError::UnsupportedFormat(format!(
                    "'{}' is not available here. Supported formats: {}",
                    f,
                    supported_list(offered, Format::f_param)
                ))
            });
    }

    let accept = match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Ok(default),
    };

    let accepted = parse_accept(accept);
    if accepted.is_empty() {
        return Ok(default);
    }

    for (media_type, _) in accepted.iter().filter(|(_, q)| *q > 0.0) {
        let candidate = match media_type.as_str() {
            "*/*" => Some(default),
            "application/*" => offered
                .iter()
                .copied()
                .find(|f| f.media_type().starts_with("application/")),
            "text/*" => resolve(Format::Html, offered),
            other => Format::from_media_type(other).and_then(|f| resolve(f, offered)),
        };
        if let Some(format) = candidate {
            return Ok(format);
        }
    }

    let requested: Vec<&str> = accepted.iter().map(|(t, _)| t.as_str()).collect();
    Err(FeaturesError::NotAcceptable(format!(
        "Requested media type(s) '{}' not supported. Supported media types: {}",
        requested.join(", "),
        supported_list(offered, Format::media_type)
    )))
}

/// `format` if offered. A plain JSON request is answered with GeoJSON where
/// only GeoJSON is offered.
fn resolve(format: Format, offered: &[Format]) -> Option<Format> {
    if offered.contains(&format) {
        return Some(format);
    }
    if format == Format::Json && offered.contains(&Format::GeoJson) {
        return Some(Format::GeoJson);
    }
    None
}

/// Media types of an Accept header ordered by quality, highest first.
fn parse_accept(accept: &str) -> Vec<(String, f32)> {
    let mut accepted: Vec<(String, f32)> = accept
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let media_type = parts.next()?.trim().to_ascii_lowercase();
            if media_type.is_empty() {
                return None;
            }
            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q=").and_then(|q| q.trim().parse::<f32>().ok()))
                .unwrap_or(1.0);
            Some((media_type, quality))
        })
        .collect();

    // stable sort keeps header order for equal weights
    accepted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    accepted
}

fn supported_list(offered: &[Format], label: fn(&Format) -> &'static str) -> String {
    offered.iter().map(label).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use features_protocol::links::{DOCUMENT_FORMATS, FEATURE_FORMATS};

    fn accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_defaults() {
        let headers = HeaderMap::new();
        assert_eq!(negotiate(&headers, None, &DOCUMENT_FORMATS).unwrap(), Format::Json);
        assert_eq!(negotiate(&headers, None, &FEATURE_FORMATS).unwrap(), Format::GeoJson);
    }

    #[test]
    fn test_f_param_wins_over_accept() {
        let headers = accept("application/json");
        assert_eq!(
            negotiate(&headers, Some("html"), &DOCUMENT_FORMATS).unwrap(),
            Format::Html
        );
    }

    #[test]
    fn test_empty_f_param_falls_back_to_accept() {
        let headers = accept("text/html");
        assert_eq!(negotiate(&headers, Some(""), &DOCUMENT_FORMATS).unwrap(), Format::Html);
    }

    #[test]
    fn test_unknown_f_param_is_bad_request() {
        let err = negotiate(&HeaderMap::new(), Some("xml"), &DOCUMENT_FORMATS).unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = negotiate(&HeaderMap::new(), Some("geojson"), &DOCUMENT_FORMATS).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_json_alias_on_feature_endpoints() {
        assert_eq!(
            negotiate(&HeaderMap::new(), Some("json"), &FEATURE_FORMATS).unwrap(),
            Format::GeoJson
        );
        assert_eq!(
            negotiate(&accept("application/json"), None, &FEATURE_FORMATS).unwrap(),
            Format::GeoJson
        );
    }

    #[test]
    fn test_browser_accept_header() {
        let headers =
            accept("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");
        assert_eq!(negotiate(&headers, None, &FEATURE_FORMATS).unwrap(), Format::Html);
    }

    #[test]
    fn test_quality_ordering() {
        let headers = accept("text/html;q=0.5, application/geo+json");
        assert_eq!(negotiate(&headers, None, &FEATURE_FORMATS).unwrap(), Format::GeoJson);
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(
            negotiate(&accept("*/*"), None, &FEATURE_FORMATS).unwrap(),
            Format::GeoJson
        );
        assert_eq!(
            negotiate(&accept("text/*"), None, &DOCUMENT_FORMATS).unwrap(),
            Format::Html
        );
        assert_eq!(
            negotiate(&accept("application/*"), None, &DOCUMENT_FORMATS).unwrap(),
            Format::Json
        );
    }

    #[test]
    fn test_not_acceptable() {
        let err = negotiate(&accept("application/xml"), None, &DOCUMENT_FORMATS).unwrap_err();
        assert_eq!(err.status_code(), 406);

        let err = negotiate(&accept("text/html;q=0"), None, &DOCUMENT_FORMATS).unwrap_err();
        assert_eq!(err.status_code(), 406);
    }
}
