//! Collection metadata derived from a layer.

use gdal::spatial_ref::AxisMappingStrategy;
use gdal::vector::LayerAccess;
use tracing::debug;

use features_protocol::crs::default_crs;
use features_protocol::{CrsIdentifier, GdalExtent};

use crate::crs::{coordinate_epoch, spatial_ref_from_identifier, transform_extent, uri_of_spatial_ref};
use crate::dataset::SourceDataset;
use crate::error::{Result, SourceError};
use crate::extent::compute_layer_extent;
use crate::ffi;

/// What a collection needs to know about its layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerMetadata {
    pub layer_name: String,
    /// Extent in CRS84 (2D) or CRS84h (3D), OGC order. `None` for layers
    /// without geometries.
    pub bbox: Option<Vec<f64>>,
    /// CRS84 or CRS84h.
    pub default_crs: String,
    pub storage_crs: String,
    pub storage_crs_coordinate_epoch: Option<f64>,
    /// Default CRS and storage CRS; the storage CRS is left out when it
    /// names the default one.
    pub crs: Vec<String>,
    pub is_3d: bool,
}

/// Read a layer's CRS and extent.
pub fn describe_layer(source: &SourceDataset, layer_name: &str) -> Result<LayerMetadata> {
    let layer = source.layer(layer_name)?;
    let mut storage_srs = layer
        .spatial_ref()
        .ok_or_else(|| SourceError::NoSpatialRef(layer_name.to_string()))?;
    storage_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    let storage_crs = uri_of_spatial_ref(&storage_srs)?;
    let declared_3d = ffi::geometry_type_has_z(ffi::layer_geometry_type(&layer));
    drop(layer);

    let extent = compute_layer_extent(source, layer_name)?;
    let is_3d = extent.as_ref().map(GdalExtent::is_3d).unwrap_or(declared_3d);
    let default = default_crs(is_3d);

    let bbox = match extent {
        Some(extent) => {
            let target = spatial_ref_from_identifier(default)?;
            Some(transform_extent(&storage_srs, &target, &extent)?.to_ogc_order())
        }
        None => None,
    };

    let mut crs = vec![default.to_string()];
    let duplicate = match (CrsIdentifier::parse(default), CrsIdentifier::parse(&storage_crs)) {
        (Ok(a), Ok(b)) => a.same_crs(&b),
        _ => false,
    };
    if !duplicate {
        crs.push(storage_crs.clone());
    }

    debug!(
        layer = %layer_name,
        storage_crs = %storage_crs,
        is_3d,
        "Described layer"
    );

    Ok(LayerMetadata {
        layer_name: layer_name.to_string(),
        bbox,
        default_crs: default.to_string(),
        storage_crs_coordinate_epoch: coordinate_epoch(&storage_srs),
        storage_crs,
        crs,
        is_3d,
    })
}
