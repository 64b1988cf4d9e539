//! Query parameter parsing for the items and feature endpoints.
//!
//! Parameters arrive as decoded `(name, value)` pairs so that the original
//! order can be reused when building pagination and alternate links.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::crs::{default_crs, CrsIdentifier};
use crate::errors::{FeaturesError, Result};

/// Limits applied to the `limit` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitConfig {
    /// Used when the request has no `limit`.
    pub default: u64,
    /// Requests above this are clamped down to it.
    pub maximum: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            default: 10,
            maximum: 10_000,
        }
    }
}

impl LimitConfig {
    /// Clamp a requested limit into `[1, maximum]`.
    pub fn clamp(&self, requested: i64) -> u64 {
        let maximum = self.maximum.max(1);
        if requested < 1 {
            1
        } else {
            (requested as u64).min(maximum)
        }
    }
}

/// Bounding box filter: 4 (2D) or 6 (3D) numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct BboxQuery {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    /// `(min_z, max_z)` for 6-value boxes.
    pub z: Option<(f64, f64)>,
}

impl BboxQuery {
    /// Parse a comma separated bbox.
    ///
    /// `min_x > max_x` is accepted (a box crossing the antimeridian);
    /// `min_y > max_y` and `min_z > max_z` are not.
    pub fn parse(value: &str) -> Result<Self> {
        let numbers = value
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| {
                        FeaturesError::InvalidParameter(format!(
                            "bbox value '{}' is not a finite number",
                            part.trim()
                        ))
                    })
            })
            .collect::<Result<Vec<f64>>>()?;

        let bbox = match numbers.as_slice() {
            [min_x, min_y, max_x, max_y] => Self {
                min_x: *min_x,
                min_y: *min_y,
                max_x: *max_x,
                max_y: *max_y,
                z: None,
            },
            [min_x, min_y, min_z, max_x, max_y, max_z] => Self {
                min_x: *min_x,
                min_y: *min_y,
                max_x: *max_x,
                max_y: *max_y,
                z: Some((*min_z, *max_z)),
            },
            _ => {
                return Err(FeaturesError::InvalidParameter(format!(
                    "bbox must have 4 or 6 values, got {}",
                    numbers.len()
                )))
            }
        };

        if bbox.min_y > bbox.max_y {
            return Err(FeaturesError::InvalidParameter(
                "bbox lower y bound is greater than upper y bound".to_string(),
            ));
        }
        if let Some((min_z, max_z)) = bbox.z {
            if min_z > max_z {
                return Err(FeaturesError::InvalidParameter(
                    "bbox lower z bound is greater than upper z bound".to_string(),
                ));
            }
        }
        Ok(bbox)
    }

    /// Whether the box has a z range.
    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }

    /// Whether the box wraps across the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_x > self.max_x
    }

    /// Planar `[min_x, min_y, max_x, max_y]` rectangles covering this box.
    /// An antimeridian-crossing box is split at ±180.
    pub fn rectangles(&self) -> Vec<[f64; 4]> {
        if self.crosses_antimeridian() {
            vec![
                [self.min_x, self.min_y, 180.0, self.max_y],
                [-180.0, self.min_y, self.max_x, self.max_y],
            ]
        } else {
            vec![[self.min_x, self.min_y, self.max_x, self.max_y]]
        }
    }
}

/// Temporal filter from the `datetime` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeFilter {
    /// A single instant.
    Instant(DateTime<Utc>),
    /// A closed or half-bounded interval; `None` is an open end.
    Interval {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

impl DateTimeFilter {
    /// Parse `instant`, `start/end`, `../end`, `start/..` (empty ends are
    /// open too). Returns `None` for a fully open interval.
    ///
    /// Dates without a time cover the whole day; timestamps without an
    /// offset are taken as UTC.
    pub fn parse(value: &str) -> Result<Option<Self>> {
        let value = value.trim();
        if value.is_empty() {
            return Err(FeaturesError::InvalidParameter("datetime is empty".to_string()));
        }

        let Some((start, end)) = value.split_once('/') else {
            return Ok(Some(match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                Ok(date) => DateTimeFilter::Interval {
                    start: Some(start_of_day(date)),
                    end: Some(end_of_day(date)),
                },
                Err(_) => DateTimeFilter::Instant(parse_instant(value)?),
            }));
        };
        if end.contains('/') {
            return Err(FeaturesError::InvalidParameter(format!(
                "datetime interval '{}' has more than two parts",
                value
            )));
        }

        let start = parse_bound(start, start_of_day)?;
        let end = parse_bound(end, end_of_day)?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(FeaturesError::InvalidParameter(format!(
                    "datetime interval '{}' starts after it ends",
                    value
                )));
            }
        }
        if start.is_none() && end.is_none() {
            return Ok(None);
        }
        Ok(Some(DateTimeFilter::Interval { start, end }))
    }

    /// Inclusive `(start, end)` bounds; an instant has equal bounds.
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match *self {
            DateTimeFilter::Instant(t) => (Some(t), Some(t)),
            DateTimeFilter::Interval { start, end } => (start, end),
        }
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(FeaturesError::InvalidParameter(format!(
        "Invalid datetime '{}'. Expected RFC 3339 (e.g. 2024-01-31T12:00:00Z)",
        value
    )))
}

fn parse_bound(
    value: &str,
    date_only: fn(NaiveDate) -> DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let value = value.trim();
    if value.is_empty() || value == ".." {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(date_only(date)));
    }
    parse_instant(value).map(Some)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last))
}

/// Reject any parameter outside `known`.
pub fn reject_unknown(pairs: &[(String, String)], known: &[&str]) -> Result<()> {
    match pairs.iter().find(|(k, _)| !known.contains(&k.as_str())) {
        Some((k, _)) => Err(FeaturesError::UnknownParameter(format!(
            "'{}' is not a supported query parameter",
            k
        ))),
        None => Ok(()),
    }
}

fn last_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn validate_crs(name: &str, value: Option<&str>) -> Result<Option<String>> {
    value
        .map(|v| {
            CrsIdentifier::parse(v)
                .map(|_| v.to_string())
                .map_err(|e| FeaturesError::UnsupportedCrs(format!("{}: {}", name, e)))
        })
        .transpose()
}

/// Parsed parameters of `GET /collections/{id}/items`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemsQuery {
    pub limit: u64,
    pub offset: u64,
    pub bbox: Option<BboxQuery>,
    pub bbox_crs: Option<String>,
    pub datetime: Option<DateTimeFilter>,
    pub crs: Option<String>,
    pub f: Option<String>,
    /// The request's parameters as received, for link building.
    pub pairs: Vec<(String, String)>,
}

impl ItemsQuery {
    /// Parameters the items endpoint understands.
    pub const KNOWN_PARAMS: [&'static str; 7] =
        ["limit", "offset", "bbox", "bbox-crs", "datetime", "crs", "f"];

    /// Parse and validate the request parameters.
    pub fn from_pairs(pairs: Vec<(String, String)>, limits: &LimitConfig) -> Result<Self> {
        reject_unknown(&pairs, &Self::KNOWN_PARAMS)?;

        let limit = match last_value(&pairs, "limit") {
            Some(v) => {
                let requested = v.trim().parse::<i64>().map_err(|_| {
                    FeaturesError::InvalidParameter(format!("limit '{}' is not an integer", v))
                })?;
                limits.clamp(requested)
            }
            None => limits.clamp(limits.default as i64),
        };

        let offset = match last_value(&pairs, "offset") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| {
                FeaturesError::InvalidParameter(format!(
                    "offset '{}' is not a non-negative integer",
                    v
                ))
            })?,
            None => 0,
        };

        let bbox = last_value(&pairs, "bbox").map(BboxQuery::parse).transpose()?;
        let bbox_crs = validate_crs("bbox-crs", last_value(&pairs, "bbox-crs"))?;
        let crs = validate_crs("crs", last_value(&pairs, "crs"))?;
        let datetime = match last_value(&pairs, "datetime") {
            Some(v) => DateTimeFilter::parse(v)?,
            None => None,
        };
        let f = last_value(&pairs, "f").map(str::to_string);

        if let Some(ref b) = bbox {
            let crs84 = bbox_crs
                .as_deref()
                .map(|c| CrsIdentifier::parse(c).map(|id| id.is_crs84()).unwrap_or(false))
                .unwrap_or(true);
            if b.crosses_antimeridian() && !crs84 {
                return Err(FeaturesError::InvalidParameter(
                    "bbox lower x bound is greater than upper x bound".to_string(),
                ));
            }
        }

        Ok(Self {
            limit,
            offset,
            bbox,
            bbox_crs,
            datetime,
            crs,
            f,
            pairs,
        })
    }

    /// The CRS the bbox is expressed in: `bbox-crs`, or CRS84/CRS84h by
    /// dimension.
    pub fn effective_bbox_crs(&self) -> String {
        match (&self.bbox_crs, &self.bbox) {
            (Some(crs), _) => crs.clone(),
            (None, Some(b)) => default_crs(b.is_3d()).to_string(),
            (None, None) => default_crs(false).to_string(),
        }
    }
}

/// Parsed parameters of `GET /collections/{id}/items/{featureId}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    pub crs: Option<String>,
    pub f: Option<String>,
    pub pairs: Vec<(String, String)>,
}

impl FeatureQuery {
    /// Parameters the single feature endpoint understands.
    pub const KNOWN_PARAMS: [&'static str; 2] = ["crs", "f"];

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self> {
        reject_unknown(&pairs, &Self::KNOWN_PARAMS)?;
        Ok(Self {
            crs: validate_crs("crs", last_value(&pairs, "crs"))?,
            f: last_value(&pairs, "f").map(str::to_string),
            pairs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let q = ItemsQuery::from_pairs(vec![], &LimitConfig::default()).unwrap();
        assert_eq!(q.limit, 10);
        assert_eq!(q.offset, 0);
        assert!(q.bbox.is_none());
        assert!(q.datetime.is_none());
        assert_eq!(q.effective_bbox_crs(), crate::CRS84);
    }

    #[test]
    fn test_limit_clamped() {
        let limits = LimitConfig { default: 10, maximum: 100 };
        let q = ItemsQuery::from_pairs(pairs(&[("limit", "5000")]), &limits).unwrap();
        assert_eq!(q.limit, 100);
        let q = ItemsQuery::from_pairs(pairs(&[("limit", "0")]), &limits).unwrap();
        assert_eq!(q.limit, 1);
    }

    #[test]
    fn test_limit_not_integer() {
        let err = ItemsQuery::from_pairs(pairs(&[("limit", "ten")]), &LimitConfig::default())
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_negative_offset_rejected() {
        assert!(ItemsQuery::from_pairs(pairs(&[("offset", "-1")]), &LimitConfig::default()).is_err());
    }

    #[test]
    fn test_unknown_parameter() {
        let err = ItemsQuery::from_pairs(pairs(&[("foo", "bar")]), &LimitConfig::default())
            .unwrap_err();
        assert!(matches!(err, FeaturesError::UnknownParameter(_)));
    }

    #[test]
    fn test_bbox_2d_and_3d() {
        let b = BboxQuery::parse("-10, -5, 10, 5").unwrap();
        assert!(!b.is_3d());
        assert_eq!(b.rectangles(), vec![[-10.0, -5.0, 10.0, 5.0]]);

        let b = BboxQuery::parse("0,0,-100,1,1,100").unwrap();
        assert_eq!(b.z, Some((-100.0, 100.0)));

        let q = ItemsQuery::from_pairs(pairs(&[("bbox", "0,0,-100,1,1,100")]), &LimitConfig::default())
            .unwrap();
        assert_eq!(q.effective_bbox_crs(), crate::CRS84H);
    }

    #[test]
    fn test_bbox_invalid() {
        assert!(BboxQuery::parse("1,2,3").is_err());
        assert!(BboxQuery::parse("0,10,1,5").is_err());
        assert!(BboxQuery::parse("0,0,NaN,1").is_err());
        assert!(BboxQuery::parse("a,b,c,d").is_err());
    }

    #[test]
    fn test_bbox_antimeridian() {
        let b = BboxQuery::parse("170,-10,-170,10").unwrap();
        assert!(b.crosses_antimeridian());
        assert_eq!(b.rectangles().len(), 2);

        let err = ItemsQuery::from_pairs(
            pairs(&[
                ("bbox", "170,-10,-170,10"),
                ("bbox-crs", "http://www.opengis.net/def/crs/EPSG/0/3857"),
            ]),
            &LimitConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_invalid_crs_rejected() {
        let err = ItemsQuery::from_pairs(pairs(&[("crs", "EPSG:4326")]), &LimitConfig::default())
            .unwrap_err();
        assert!(matches!(err, FeaturesError::UnsupportedCrs(_)));
    }

    #[test]
    fn test_datetime_instant() {
        let dt = DateTimeFilter::parse("2024-01-31T12:00:00Z").unwrap().unwrap();
        let (start, end) = dt.bounds();
        assert_eq!(start, end);
        assert_eq!(start.unwrap().to_rfc3339(), "2024-01-31T12:00:00+00:00");
    }

    #[test]
    fn test_datetime_open_intervals() {
        let dt = DateTimeFilter::parse("../2024-01-31T12:00:00Z").unwrap().unwrap();
        assert!(dt.bounds().0.is_none());
        assert!(dt.bounds().1.is_some());

        let dt = DateTimeFilter::parse("2024-01-31T12:00:00Z/").unwrap().unwrap();
        assert!(dt.bounds().0.is_some());
        assert!(dt.bounds().1.is_none());

        assert_eq!(DateTimeFilter::parse("../..").unwrap(), None);
    }

    #[test]
    fn test_datetime_date_only_covers_day() {
        let dt = DateTimeFilter::parse("2024-02-29").unwrap().unwrap();
        let (start, end) = dt.bounds();
        assert_eq!(start.unwrap().to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert!(end.unwrap() > start.unwrap());
    }

    #[test]
    fn test_datetime_invalid() {
        assert!(DateTimeFilter::parse("yesterday").is_err());
        assert!(DateTimeFilter::parse("2024-02-01T00:00:00Z/2024-01-01T00:00:00Z").is_err());
        assert!(DateTimeFilter::parse("a/b/c").is_err());
    }

    #[test]
    fn test_feature_query() {
        let q = FeatureQuery::from_pairs(pairs(&[("f", "html")])).unwrap();
        assert_eq!(q.f.as_deref(), Some("html"));
        assert!(FeatureQuery::from_pairs(pairs(&[("limit", "1")])).is_err());
    }
}
