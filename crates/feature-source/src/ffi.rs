//! Thin wrappers over OGR/OSR calls the safe bindings do not expose.

use std::ffi::CStr;
use std::os::raw::c_char;

use gdal::spatial_ref::SpatialRef;
use gdal::vector::LayerAccess;
use gdal_sys::OGRwkbGeometryType;

fn owned_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // Strings returned by these getters are owned by the OGR object.
    let value = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
    (!value.is_empty()).then_some(value)
}

/// Declared geometry type of the layer's first geometry field.
pub(crate) fn layer_geometry_type<L: LayerAccess>(layer: &L) -> OGRwkbGeometryType::Type {
    unsafe { gdal_sys::OGR_L_GetGeomType(layer.c_layer()) }
}

/// Name of the FID column, when the driver exposes one.
pub(crate) fn fid_column<L: LayerAccess>(layer: &L) -> Option<String> {
    owned_str(unsafe { gdal_sys::OGR_L_GetFIDColumn(layer.c_layer()) })
}

/// Name of the geometry column, when the driver exposes one.
pub(crate) fn geometry_column<L: LayerAccess>(layer: &L) -> Option<String> {
    owned_str(unsafe { gdal_sys::OGR_L_GetGeometryColumn(layer.c_layer()) })
}

pub(crate) fn geometry_type_has_z(geometry_type: OGRwkbGeometryType::Type) -> bool {
    unsafe { gdal_sys::OGR_GT_HasZ(geometry_type) != 0 }
}

pub(crate) fn geometry_type_name(geometry_type: OGRwkbGeometryType::Type) -> String {
    owned_str(unsafe { gdal_sys::OGRGeometryTypeToName(geometry_type) })
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Authority code as text; `auth_code()` only handles integer codes and
/// fails for codes such as `CRS84`.
pub(crate) fn authority_code(srs: &SpatialRef) -> Option<String> {
    owned_str(unsafe { gdal_sys::OSRGetAuthorityCode(srs.to_c_hsrs(), std::ptr::null()) })
}

pub(crate) fn authority_name(srs: &SpatialRef) -> Option<String> {
    owned_str(unsafe { gdal_sys::OSRGetAuthorityName(srs.to_c_hsrs(), std::ptr::null()) })
}

pub(crate) fn is_dynamic(srs: &SpatialRef) -> bool {
    unsafe { gdal_sys::OSRIsDynamic(srs.to_c_hsrs()) != 0 }
}

/// Coordinate epoch in decimal years; 0 when none is set.
pub(crate) fn coordinate_epoch(srs: &SpatialRef) -> f64 {
    unsafe { gdal_sys::OSRGetCoordinateEpoch(srs.to_c_hsrs()) }
}
