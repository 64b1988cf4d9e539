//! Planning and running item queries against a layer.
//!
//! PostGIS layers get one native SQL statement for the count and one for
//! the page. File layers use the OGR SQL dialect; when a bbox is given the
//! layer is scanned instead, because an OGR spatial filter drops features
//! without geometry and those always match.

use gdal::spatial_ref::CoordTransform;
use gdal::vector::{Geometry, LayerAccess};
use serde_json::{Map, Value};
use tracing::debug;

use features_protocol::{BboxQuery, CrsIdentifier, DateTimeFilter, Feature};

use crate::crs::{spatial_ref_from_identifier, transform_rectangle};
use crate::dataset::{Backend, SourceDataset};
use crate::error::{Result, SourceError};
use crate::extent::table_reference;
use crate::ffi;
use crate::sql::{field_value_as_u64, field_value_to_json, first_row, quote_ident, timestamp_literal};

/// A page request against one layer, with every parameter resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemsRequest {
    pub limit: u64,
    pub offset: u64,
    pub bbox: Option<BboxQuery>,
    /// CRS the bbox is expressed in.
    pub bbox_crs: String,
    pub datetime: Option<DateTimeFilter>,
    /// Attribute the datetime filter applies to. Without one the filter
    /// matches everything.
    pub datetime_field: Option<String>,
    pub storage_crs: String,
    /// CRS of the returned geometries.
    pub response_crs: String,
}

/// Features of one page and the total number matching the filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemsPage {
    pub features: Vec<Feature>,
    pub number_matched: u64,
}

/// What the planner needs to know about the layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTarget {
    pub backend: Backend,
    /// `FROM` target, already quoted.
    pub table: String,
    pub geometry_column: Option<String>,
    pub fid_column: Option<String>,
}

/// How a request is executed.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    /// A count statement and a page statement.
    Sql { count: String, page: String },
    /// Iterate the layer with an attribute filter and test geometries
    /// against `rectangles` (in `bbox_crs`).
    Scan {
        attribute_filter: Option<String>,
        rectangles: Vec<[f64; 4]>,
        bbox_crs: String,
    },
}

/// `("dt" IS NULL OR (...))` for the given filter; NULL datetimes always
/// match.
pub fn datetime_predicate(field: &str, filter: &DateTimeFilter) -> Option<String> {
    let column = quote_ident(field);
    let bounds = match filter.bounds() {
        (Some(start), Some(end)) if start == end => {
            format!("{} = {}", column, timestamp_literal(&start))
        }
        (Some(start), Some(end)) => format!(
            "{c} >= {} AND {c} <= {}",
            timestamp_literal(&start),
            timestamp_literal(&end),
            c = column
        ),
        (Some(start), None) => format!("{} >= {}", column, timestamp_literal(&start)),
        (None, Some(end)) => format!("{} <= {}", column, timestamp_literal(&end)),
        (None, None) => return None,
    };
    Some(format!("({} IS NULL OR ({}))", column, bounds))
}

/// PostGIS SRID of a CRS identifier, when it has one.
pub fn postgis_srid(identifier: &str) -> Option<i64> {
    let crs = CrsIdentifier::parse(identifier).ok()?;
    if crs.authority.eq_ignore_ascii_case("OGC") {
        return match crs.code.as_str() {
            "CRS84" => Some(4326),
            "CRS84h" => Some(4979),
            _ => None,
        };
    }
    if crs.authority.eq_ignore_ascii_case("EPSG") {
        return crs.code.parse().ok();
    }
    None
}

fn postgis_bbox_predicate(geometry: &str, bbox: &BboxQuery, request: &ItemsRequest) -> Result<String> {
    let bbox_srid = postgis_srid(&request.bbox_crs).ok_or_else(|| {
        SourceError::Crs(format!("'{}' has no PostGIS SRID", request.bbox_crs))
    })?;
    let storage_srid = postgis_srid(&request.storage_crs)
        .map(|srid| srid.to_string())
        .unwrap_or_else(|| format!("ST_SRID({})", geometry));

    let envelopes: Vec<String> = bbox
        .rectangles()
        .iter()
        .map(|[xmin, ymin, xmax, ymax]| {
            format!(
                "ST_Intersects({g}, ST_Transform(ST_MakeEnvelope({}, {}, {}, {}, {}), {}))",
                xmin,
                ymin,
                xmax,
                ymax,
                bbox_srid,
                storage_srid,
                g = geometry
            )
        })
        .collect();
    Ok(format!("({} IS NULL OR {})", geometry, envelopes.join(" OR ")))
}

fn where_clause(predicates: &[String]) -> String {
    if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    }
}

/// Build the statements for a request.
pub fn plan_query(target: &LayerTarget, request: &ItemsRequest) -> Result<QueryPlan> {
    let temporal = match (&request.datetime, &request.datetime_field) {
        (Some(filter), Some(field)) => datetime_predicate(field, filter),
        _ => None,
    };

    match target.backend {
        Backend::Postgres => {
            let mut predicates = Vec::new();
            if let Some(bbox) = &request.bbox {
                let geometry = target.geometry_column.as_deref().ok_or_else(|| {
                    SourceError::InvalidQuery("bbox given for a layer without geometry".to_string())
                })?;
                predicates.push(postgis_bbox_predicate(&quote_ident(geometry), bbox, request)?);
            }
            predicates.extend(temporal);

            let filter = where_clause(&predicates);
            let order = target
                .fid_column
                .as_deref()
                .map(|fid| format!(" ORDER BY {}", quote_ident(fid)))
                .unwrap_or_default();
            Ok(QueryPlan::Sql {
                count: format!("SELECT COUNT(*) AS matched FROM {}{}", target.table, filter),
                page: format!(
                    "SELECT * FROM {}{}{} LIMIT {} OFFSET {}",
                    target.table, filter, order, request.limit, request.offset
                ),
            })
        }
        Backend::File => match &request.bbox {
            Some(bbox) => Ok(QueryPlan::Scan {
                attribute_filter: temporal,
                rectangles: bbox.rectangles(),
                bbox_crs: request.bbox_crs.clone(),
            }),
            None => {
                let filter = where_clause(&temporal.into_iter().collect::<Vec<_>>());
                Ok(QueryPlan::Sql {
                    count: format!("SELECT COUNT(*) AS matched FROM {}{}", target.table, filter),
                    page: format!(
                        "SELECT * FROM {}{} LIMIT {} OFFSET {}",
                        target.table, filter, request.limit, request.offset
                    ),
                })
            }
        },
    }
}

/// `offset` must fall inside the matched features unless nothing matched.
pub fn check_offset(offset: u64, number_matched: u64) -> Result<()> {
    if number_matched > 0 && offset >= number_matched {
        return Err(SourceError::InvalidQuery(format!(
            "offset {} is out of range, the query matched {} features",
            offset, number_matched
        )));
    }
    Ok(())
}

/// Converts OGR features to GeoJSON features, reprojecting when needed.
struct FeatureConverter {
    transform: Option<CoordTransform>,
    fid_field: Option<String>,
}

impl FeatureConverter {
    fn new(storage_crs: &str, response_crs: &str, fid_field: Option<String>) -> Result<Self> {
        let same = match (CrsIdentifier::parse(storage_crs), CrsIdentifier::parse(response_crs)) {
            (Ok(a), Ok(b)) => a.same_crs(&b),
            _ => storage_crs == response_crs,
        };
        let transform = if same {
            None
        } else {
            let source = spatial_ref_from_identifier(storage_crs)?;
            let target = spatial_ref_from_identifier(response_crs)?;
            Some(CoordTransform::new(&source, &target)?)
        };
        Ok(Self { transform, fid_field })
    }

    fn convert(&self, feature: &gdal::vector::Feature) -> Result<Feature> {
        let mut id = feature.fid();
        let mut properties = Map::new();
        for (name, value) in feature.fields() {
            if self.fid_field.as_deref() == Some(name.as_str()) {
                if id.is_none() {
                    id = value.and_then(|v| field_value_as_u64(Some(v)).ok());
                }
                continue;
            }
            properties.insert(name, value.map(field_value_to_json).unwrap_or(Value::Null));
        }

        let geometry = match feature.geometry() {
            Some(geometry) => {
                let json = match &self.transform {
                    Some(transform) => geometry.transform(transform)?.json()?,
                    None => geometry.json()?,
                };
                Some(serde_json::from_str(&json)?)
            }
            None => None,
        };

        Ok(Feature::new(id, geometry, properties))
    }
}

/// Planner input for a layer of an open dataset.
pub fn layer_target(source: &SourceDataset, layer_name: &str) -> Result<LayerTarget> {
    let layer = source.layer(layer_name)?;
    Ok(LayerTarget {
        backend: source.backend(),
        table: table_reference(source, layer_name),
        geometry_column: ffi::geometry_column(&layer),
        fid_column: ffi::fid_column(&layer),
    })
}

/// Run an items request: count, check the offset, fetch the page.
pub fn query_items(source: &SourceDataset, layer_name: &str, request: &ItemsRequest) -> Result<ItemsPage> {
    let target = layer_target(source, layer_name)?;
    let plan = plan_query(&target, request)?;
    let converter = FeatureConverter::new(
        &request.storage_crs,
        &request.response_crs,
        target.fid_column.clone(),
    )?;

    match plan {
        QueryPlan::Sql { count, page } => {
            debug!(layer = %layer_name, query = %count, "Counting features");
            let number_matched = field_value_as_u64(first_row(source, &count, source.native_dialect())?)?;
            check_offset(request.offset, number_matched)?;

            debug!(layer = %layer_name, query = %page, "Fetching features");
            let mut result = source
                .dataset()
                .execute_sql(&page, None, source.native_dialect())?
                .ok_or_else(|| SourceError::UnexpectedResult(format!("no result set for '{}'", page)))?;
            let features = result
                .features()
                .map(|feature| converter.convert(&feature))
                .collect::<Result<Vec<_>>>()?;

            Ok(ItemsPage {
                features,
                number_matched,
            })
        }
        QueryPlan::Scan {
            attribute_filter,
            rectangles,
            bbox_crs,
        } => {
            let boxes = rectangles
                .into_iter()
                .map(|rect| -> Result<Geometry> {
                    let [xmin, ymin, xmax, ymax] = transform_rectangle(rect, &bbox_crs, &request.storage_crs)?;
                    Ok(Geometry::bbox(xmin, ymin, xmax, ymax)?)
                })
                .collect::<Result<Vec<Geometry>>>()?;

            let mut layer = source.layer(layer_name)?;
            if let Some(filter) = &attribute_filter {
                layer.set_attribute_filter(filter)?;
            }
            debug!(layer = %layer_name, filter = ?attribute_filter, boxes = boxes.len(), "Scanning features");

            let first = request.offset;
            let last = request.offset.saturating_add(request.limit);
            let mut number_matched = 0u64;
            let mut features = Vec::new();
            for feature in layer.features() {
                let matches = match feature.geometry() {
                    Some(geometry) => boxes.iter().any(|b| geometry.intersects(b)),
                    None => true,
                };
                if !matches {
                    continue;
                }
                if number_matched >= first && number_matched < last {
                    features.push(converter.convert(&feature)?);
                }
                number_matched += 1;
            }
            check_offset(request.offset, number_matched)?;

            Ok(ItemsPage {
                features,
                number_matched,
            })
        }
    }
}

/// Fetch one feature by FID.
pub fn get_feature(
    source: &SourceDataset,
    layer_name: &str,
    fid: u64,
    storage_crs: &str,
    response_crs: &str,
) -> Result<Feature> {
    let layer = source.layer(layer_name)?;
    let converter = FeatureConverter::new(storage_crs, response_crs, ffi::fid_column(&layer))?;
    let feature = layer
        .feature(fid)
        .ok_or_else(|| SourceError::FeatureNotFound(fid.to_string()))?;
    converter.convert(&feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use features_protocol::CRS84;

    fn request() -> ItemsRequest {
        ItemsRequest {
            limit: 10,
            offset: 20,
            bbox: None,
            bbox_crs: CRS84.to_string(),
            datetime: None,
            datetime_field: None,
            storage_crs: "http://www.opengis.net/def/crs/EPSG/0/25832".to_string(),
            response_crs: CRS84.to_string(),
        }
    }

    fn postgis_target() -> LayerTarget {
        LayerTarget {
            backend: Backend::Postgres,
            table: "\"hydro\".\"lakes\"".to_string(),
            geometry_column: Some("geom".to_string()),
            fid_column: Some("id".to_string()),
        }
    }

    fn file_target() -> LayerTarget {
        LayerTarget {
            backend: Backend::File,
            table: "\"lakes\"".to_string(),
            geometry_column: None,
            fid_column: None,
        }
    }

    #[test]
    fn test_datetime_predicate_variants() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();

        assert_eq!(
            datetime_predicate("observed", &DateTimeFilter::Instant(t0)).unwrap(),
            "(\"observed\" IS NULL OR (\"observed\" = '2024-01-01T00:00:00.000Z'))"
        );
        assert_eq!(
            datetime_predicate(
                "observed",
                &DateTimeFilter::Interval { start: Some(t0), end: Some(t1) }
            )
            .unwrap(),
            "(\"observed\" IS NULL OR (\"observed\" >= '2024-01-01T00:00:00.000Z' AND \"observed\" <= '2024-06-30T00:00:00.000Z'))"
        );
        let open_start = datetime_predicate(
            "observed",
            &DateTimeFilter::Interval { start: None, end: Some(t1) },
        )
        .unwrap();
        assert!(open_start.contains("\"observed\" <= '2024-06-30T00:00:00.000Z'"));
        assert!(!open_start.contains(">="));
    }

    #[test]
    fn test_date_only_predicate_covers_the_whole_day() {
        let day = DateTimeFilter::parse("2024-01-10").unwrap().unwrap();
        let predicate = datetime_predicate("observed", &day).unwrap();
        assert!(predicate.contains("\"observed\" >= '2024-01-10T00:00:00.000Z'"));
        assert!(predicate.contains("\"observed\" <= '2024-01-10T23:59:59.999Z'"));

        let instant = DateTimeFilter::parse("2024-01-10T10:00:00.750Z").unwrap().unwrap();
        assert_eq!(
            datetime_predicate("observed", &instant).unwrap(),
            "(\"observed\" IS NULL OR (\"observed\" = '2024-01-10T10:00:00.750Z'))"
        );
    }

    #[test]
    fn test_postgis_srid() {
        assert_eq!(postgis_srid(CRS84), Some(4326));
        assert_eq!(postgis_srid("urn:ogc:def:crs:EPSG::25832"), Some(25832));
        assert_eq!(postgis_srid("http://www.opengis.net/def/crs/ESRI/0/54009"), None);
    }

    #[test]
    fn test_postgis_plan_without_filters() {
        let plan = plan_query(&postgis_target(), &request()).unwrap();
        assert_eq!(
            plan,
            QueryPlan::Sql {
                count: "SELECT COUNT(*) AS matched FROM \"hydro\".\"lakes\"".to_string(),
                page: "SELECT * FROM \"hydro\".\"lakes\" ORDER BY \"id\" LIMIT 10 OFFSET 20".to_string(),
            }
        );
    }

    #[test]
    fn test_postgis_plan_with_bbox_and_datetime() {
        let mut req = request();
        req.bbox = Some(BboxQuery::parse("5,50,6,51").unwrap());
        req.datetime = Some(DateTimeFilter::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        req.datetime_field = Some("observed".to_string());

        let QueryPlan::Sql { count, page } = plan_query(&postgis_target(), &req).unwrap() else {
            panic!("expected SQL plan");
        };
        assert!(count.contains(
            "(\"geom\" IS NULL OR ST_Intersects(\"geom\", ST_Transform(ST_MakeEnvelope(5, 50, 6, 51, 4326), 25832)))"
        ));
        assert!(count.contains(" AND (\"observed\" IS NULL OR"));
        assert!(page.ends_with("ORDER BY \"id\" LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn test_postgis_plan_splits_antimeridian_bbox() {
        let mut req = request();
        req.bbox = Some(BboxQuery::parse("170,-10,-170,10").unwrap());

        let QueryPlan::Sql { count, .. } = plan_query(&postgis_target(), &req).unwrap() else {
            panic!("expected SQL plan");
        };
        assert!(count.contains("ST_MakeEnvelope(170, -10, 180, 10, 4326)"));
        assert!(count.contains(" OR ST_Intersects("));
        assert!(count.contains("ST_MakeEnvelope(-180, -10, -170, 10, 4326)"));
    }

    #[test]
    fn test_postgis_unknown_srid_falls_back_to_column_srid() {
        let mut req = request();
        req.storage_crs = "http://www.opengis.net/def/crs/ESRI/0/54009".to_string();
        req.bbox = Some(BboxQuery::parse("5,50,6,51").unwrap());

        let QueryPlan::Sql { count, .. } = plan_query(&postgis_target(), &req).unwrap() else {
            panic!("expected SQL plan");
        };
        assert!(count.contains("ST_SRID(\"geom\")"));
    }

    #[test]
    fn test_file_plan_without_bbox_is_sql() {
        let mut req = request();
        req.datetime = Some(DateTimeFilter::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        // No datetime field configured: the filter is ignored.
        let plan = plan_query(&file_target(), &req).unwrap();
        assert_eq!(
            plan,
            QueryPlan::Sql {
                count: "SELECT COUNT(*) AS matched FROM \"lakes\"".to_string(),
                page: "SELECT * FROM \"lakes\" LIMIT 10 OFFSET 20".to_string(),
            }
        );
    }

    #[test]
    fn test_file_plan_with_bbox_scans() {
        let mut req = request();
        req.bbox = Some(BboxQuery::parse("5,50,6,51").unwrap());
        req.datetime = Some(DateTimeFilter::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        req.datetime_field = Some("observed".to_string());

        match plan_query(&file_target(), &req).unwrap() {
            QueryPlan::Scan {
                attribute_filter,
                rectangles,
                bbox_crs,
            } => {
                assert!(attribute_filter.unwrap().starts_with("(\"observed\" IS NULL OR"));
                assert_eq!(rectangles, vec![[5.0, 50.0, 6.0, 51.0]]);
                assert_eq!(bbox_crs, CRS84);
            }
            other => panic!("expected scan, got {:?}", other),
        }
    }

    #[test]
    fn test_check_offset() {
        assert!(check_offset(0, 0).is_ok());
        assert!(check_offset(5, 0).is_ok());
        assert!(check_offset(2, 3).is_ok());
        let err = check_offset(3, 3).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
