//! Resolution between OGC CRS identifiers and GDAL spatial references.

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};

use features_protocol::{CrsIdentifier, GdalExtent};

use crate::error::{Result, SourceError};
use crate::ffi;

/// Points added along each edge when reprojecting a bounding box.
pub const DENSIFY_POINTS: i32 = 21;

/// Resolve a CRS URI or URN to a spatial reference in longitude/easting
/// first axis order.
pub fn spatial_ref_from_identifier(identifier: &str) -> Result<SpatialRef> {
    let crs = CrsIdentifier::parse(identifier)?;
    let definition = gdal_definition(&crs);
    let mut srs = SpatialRef::from_definition(&definition).map_err(|e| {
        SourceError::Crs(format!("cannot resolve '{}' ({}): {}", identifier, definition, e))
    })?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// `AUTHORITY:CODE` user input for GDAL. CRS84h is looked up through its
/// EPSG equivalent, which every PROJ database carries.
fn gdal_definition(crs: &CrsIdentifier) -> String {
    if crs.authority.eq_ignore_ascii_case("OGC") && crs.code == "CRS84h" {
        "EPSG:4979".to_string()
    } else {
        crs.authority_code()
    }
}

/// Canonical URI of a spatial reference, from its authority name and code.
pub fn uri_of_spatial_ref(srs: &SpatialRef) -> Result<String> {
    identifier_of_spatial_ref(srs).map(|crs| crs.uri())
}

/// URN form of a spatial reference.
pub fn urn_of_spatial_ref(srs: &SpatialRef) -> Result<String> {
    identifier_of_spatial_ref(srs).map(|crs| crs.urn())
}

fn identifier_of_spatial_ref(srs: &SpatialRef) -> Result<CrsIdentifier> {
    let authority = ffi::authority_name(srs)
        .ok_or_else(|| SourceError::Crs("spatial reference has no authority name".to_string()))?;
    let code = ffi::authority_code(srs)
        .ok_or_else(|| SourceError::Crs("spatial reference has no authority code".to_string()))?;
    Ok(CrsIdentifier::new(authority, code))
}

/// WKT of the CRS named by `identifier`, shown on HTML feature pages.
pub fn wkt_of_identifier(identifier: &str) -> Result<String> {
    Ok(spatial_ref_from_identifier(identifier)?.to_wkt()?)
}

/// Coordinate epoch of a dynamic CRS.
pub fn coordinate_epoch(srs: &SpatialRef) -> Option<f64> {
    if !ffi::is_dynamic(srs) {
        return None;
    }
    let epoch = ffi::coordinate_epoch(srs);
    (epoch > 0.0).then_some(epoch)
}

/// Reproject an extent. The xy bounds go through `transform_bounds` with
/// [`DENSIFY_POINTS`]; the z range is transformed at the two corners.
pub fn transform_extent(
    source: &SpatialRef,
    target: &SpatialRef,
    extent: &GdalExtent,
) -> Result<GdalExtent> {
    let transform = CoordTransform::new(source, target)?;
    let [xmin, ymin, xmax, ymax] = transform.transform_bounds(
        &[extent.xmin, extent.ymin, extent.xmax, extent.ymax],
        DENSIFY_POINTS,
    )?;

    if !extent.is_3d() {
        return Ok(GdalExtent::new_2d(xmin, xmax, ymin, ymax));
    }

    let mut x = [extent.xmin, extent.xmax];
    let mut y = [extent.ymin, extent.ymax];
    let mut z = [extent.zmin, extent.zmax];
    transform.transform_coords(&mut x, &mut y, &mut z)?;
    Ok(GdalExtent::new_3d(xmin, xmax, ymin, ymax, z[0], z[1]))
}

/// Reproject `[min_x, min_y, max_x, max_y]` between two CRS identifiers.
pub fn transform_rectangle(rect: [f64; 4], from: &str, to: &str) -> Result<[f64; 4]> {
    let source = spatial_ref_from_identifier(from)?;
    let target = spatial_ref_from_identifier(to)?;
    let transform = CoordTransform::new(&source, &target)?;
    Ok(transform.transform_bounds(&rect, DENSIFY_POINTS)?)
}
