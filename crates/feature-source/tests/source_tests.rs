//! Reading the lakes fixture through GDAL.

use std::path::PathBuf;

use feature_source::query::{query_items, ItemsRequest};
use feature_source::{compute_layer_extent, describe_layer, ensure_field, get_feature, temporal_extent, SourceDataset, SourceError};
use features_protocol::{BboxQuery, DateTimeFilter, CRS84};

const WEB_MERCATOR: &str = "http://www.opengis.net/def/crs/EPSG/0/3857";

fn fixture() -> SourceDataset {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/lakes.geojson");
    SourceDataset::open(path.to_str().unwrap()).unwrap()
}

fn open_fixture(name: &str) -> SourceDataset {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    SourceDataset::open(path.to_str().unwrap()).unwrap()
}

fn storage_crs(source: &SourceDataset) -> String {
    describe_layer(source, "lakes").unwrap().storage_crs
}

fn request(source: &SourceDataset, limit: u64, offset: u64) -> ItemsRequest {
    ItemsRequest {
        limit,
        offset,
        bbox: None,
        bbox_crs: CRS84.to_string(),
        datetime: None,
        datetime_field: None,
        storage_crs: storage_crs(source),
        response_crs: CRS84.to_string(),
    }
}

fn ids(page: &feature_source::ItemsPage) -> Vec<u64> {
    page.features
        .iter()
        .map(|f| f.id.as_ref().and_then(|id| id.as_u64()).unwrap())
        .collect()
}

// ============================================================================
// Layers
// ============================================================================

#[test]
fn test_list_layers() {
    let source = fixture();
    assert!(!source.is_postgres());

    let layers = source.list_layers();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].name, "lakes");
    assert_eq!(layers[0].feature_count, 5);
    assert_eq!(layers[0].geometry_type, "Point");
    assert!(layers[0].crs.is_some());
}

#[test]
fn test_unknown_layer() {
    let source = fixture();
    assert!(matches!(
        describe_layer(&source, "rivers"),
        Err(SourceError::LayerNotFound(_))
    ));
}

#[test]
fn test_describe_layer() {
    let source = fixture();
    let meta = describe_layer(&source, "lakes").unwrap();

    assert!(!meta.is_3d);
    assert_eq!(meta.default_crs, CRS84);
    assert_eq!(meta.crs[0], CRS84);
    assert!(meta.crs.len() <= 2);

    let bbox = meta.bbox.unwrap();
    let expected = [-120.0, 40.0, 10.0, 55.0];
    assert_eq!(bbox.len(), 4);
    for (a, b) in bbox.iter().zip(expected) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }
}

#[test]
fn test_extent_of_3d_layer() {
    let source = open_fixture("peaks.geojson");
    let extent = compute_layer_extent(&source, "peaks").unwrap().unwrap();

    assert!((extent.xmin - 10.62).abs() < 1e-9);
    assert!((extent.xmax - 35.50).abs() < 1e-9);
    assert!((extent.ymin - 31.50).abs() < 1e-9);
    assert!((extent.ymax - 51.80).abs() < 1e-9);
    assert_eq!(extent.zmin, -430.0);
    assert_eq!(extent.zmax, 2962.0);

    let meta = describe_layer(&source, "peaks").unwrap();
    assert!(meta.is_3d);
    assert_eq!(meta.bbox.unwrap().len(), 6);
}

#[test]
fn test_extent_of_2d_layer_has_no_z() {
    let source = fixture();
    let extent = compute_layer_extent(&source, "lakes").unwrap().unwrap();
    assert!(extent.zmin > extent.zmax);
}

// ============================================================================
// Items
// ============================================================================

#[test]
fn test_first_page() {
    let source = fixture();
    let page = query_items(&source, "lakes", &request(&source, 2, 0)).unwrap();

    assert_eq!(page.number_matched, 5);
    assert_eq!(ids(&page), vec![1, 2]);
    assert_eq!(page.features[0].properties["name"], "Alpha");
}

#[test]
fn test_last_page_is_short() {
    let source = fixture();
    let page = query_items(&source, "lakes", &request(&source, 2, 4)).unwrap();

    assert_eq!(page.number_matched, 5);
    assert_eq!(ids(&page), vec![5]);
    assert!(page.features[0].geometry.is_none());
}

#[test]
fn test_offset_past_end_is_rejected() {
    let source = fixture();
    let err = query_items(&source, "lakes", &request(&source, 10, 5)).unwrap_err();
    assert!(matches!(err, SourceError::InvalidQuery(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_bbox_keeps_features_without_geometry() {
    let source = fixture();
    let mut req = request(&source, 10, 0);
    req.bbox = Some(BboxQuery::parse("5,50,7,52").unwrap());

    let page = query_items(&source, "lakes", &req).unwrap();
    assert_eq!(page.number_matched, 3);
    assert_eq!(ids(&page), vec![1, 2, 5]);
}

#[test]
fn test_bbox_paging() {
    let source = fixture();
    let mut req = request(&source, 1, 1);
    req.bbox = Some(BboxQuery::parse("5,50,7,52").unwrap());

    let page = query_items(&source, "lakes", &req).unwrap();
    assert_eq!(page.number_matched, 3);
    assert_eq!(ids(&page), vec![2]);
}

#[test]
fn test_bbox_in_other_crs() {
    let source = fixture();
    let mut req = request(&source, 10, 0);
    // Roughly 9.9..10.1 E, 54.9..55.1 N in Web Mercator.
    req.bbox = Some(BboxQuery::parse("1102000,7339000,1124000,7378000").unwrap());
    req.bbox_crs = WEB_MERCATOR.to_string();

    let page = query_items(&source, "lakes", &req).unwrap();
    assert_eq!(ids(&page), vec![3, 5]);
}

// ============================================================================
// Datetime
// ============================================================================

fn datetime_request(source: &SourceDataset, value: &str) -> ItemsRequest {
    let mut req = request(source, 10, 0);
    req.datetime = DateTimeFilter::parse(value).unwrap();
    req.datetime_field = Some("observed".to_string());
    req
}

#[test]
fn test_datetime_date_only_covers_the_day() {
    let source = fixture();
    let page = query_items(&source, "lakes", &datetime_request(&source, "2024-01-10")).unwrap();

    // Charlie has no observation time and is always kept.
    assert_eq!(ids(&page), vec![1, 3]);
    assert_eq!(page.number_matched, 2);
}

#[test]
fn test_datetime_instant() {
    let source = fixture();
    let page = query_items(&source, "lakes", &datetime_request(&source, "2024-03-05T08:30:00Z")).unwrap();
    assert_eq!(ids(&page), vec![2, 3]);

    let page = query_items(&source, "lakes", &datetime_request(&source, "2024-03-05T08:30:01Z")).unwrap();
    assert_eq!(ids(&page), vec![3]);
}

#[test]
fn test_datetime_open_intervals() {
    let source = fixture();

    let page = query_items(&source, "lakes", &datetime_request(&source, "../2023-12-31")).unwrap();
    assert_eq!(ids(&page), vec![3, 4]);

    let page = query_items(&source, "lakes", &datetime_request(&source, "2024-02-01T00:00:00Z/..")).unwrap();
    assert_eq!(ids(&page), vec![2, 3, 5]);
}

#[test]
fn test_datetime_with_bbox() {
    let source = fixture();
    let mut req = datetime_request(&source, "2024-01-01/2024-01-31");
    req.bbox = Some(BboxQuery::parse("5,50,7,52").unwrap());

    let page = query_items(&source, "lakes", &req).unwrap();
    assert_eq!(ids(&page), vec![1]);
}

#[test]
fn test_datetime_ignored_without_field() {
    let source = fixture();
    let mut req = datetime_request(&source, "2024-01-10");
    req.datetime_field = None;

    let page = query_items(&source, "lakes", &req).unwrap();
    assert_eq!(page.number_matched, 5);
}

#[test]
fn test_temporal_extent() {
    let source = fixture();
    let (start, end) = temporal_extent(&source, "lakes", "observed").unwrap();

    assert_eq!(start.as_deref(), Some("2023-07-01T00:00:00Z"));
    assert_eq!(end.as_deref(), Some("2024-03-05T08:30:00Z"));
}

#[test]
fn test_temporal_extent_unknown_field() {
    let source = fixture();
    assert!(ensure_field(&source, "lakes", "observed").is_ok());

    let err = temporal_extent(&source, "lakes", "measured").unwrap_err();
    assert!(matches!(err, SourceError::FieldNotFound { .. }));
    assert_eq!(err.status_code(), 400);

    let err = temporal_extent(&source, "rivers", "observed").unwrap_err();
    assert_eq!(err.status_code(), 404);
}

// ============================================================================
// Single feature
// ============================================================================

#[test]
fn test_get_feature() {
    let source = fixture();
    let storage = storage_crs(&source);
    let feature = get_feature(&source, "lakes", 3, &storage, CRS84).unwrap();

    assert_eq!(feature.id.unwrap().as_u64(), Some(3));
    assert_eq!(feature.properties["name"], "Charlie");
    assert!(feature.properties["observed"].is_null());
    let coords = &feature.geometry.unwrap()["coordinates"];
    assert!((coords[0].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert!((coords[1].as_f64().unwrap() - 55.0).abs() < 1e-9);
}

#[test]
fn test_get_feature_reprojected() {
    let source = fixture();
    let storage = storage_crs(&source);
    let feature = get_feature(&source, "lakes", 3, &storage, WEB_MERCATOR).unwrap();

    let coords = &feature.geometry.unwrap()["coordinates"];
    assert!((coords[0].as_f64().unwrap() - 1_113_194.9).abs() < 1.0);
}

#[test]
fn test_missing_feature() {
    let source = fixture();
    let storage = storage_crs(&source);
    let err = get_feature(&source, "lakes", 99, &storage, CRS84).unwrap_err();
    assert!(matches!(err, SourceError::FeatureNotFound(_)));
    assert_eq!(err.status_code(), 404);
}
