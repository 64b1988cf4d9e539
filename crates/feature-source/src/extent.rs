//! Spatial and temporal extents of layers.

use gdal::vector::sql::Dialect;
use gdal::vector::{FieldValue, LayerAccess};
use tracing::{debug, warn};

use features_protocol::extent::parse_postgis_box;
use features_protocol::GdalExtent;

use crate::dataset::SourceDataset;
use crate::error::{Result, SourceError};
use crate::ffi;
use crate::sql::{field_value_to_iso, first_row, quote_ident};

/// Extent of a layer in its storage CRS.
///
/// 3D layers report a z range. Outside PostGIS the z range is read from
/// every feature's geometry; PostgreSQL layers use `ST_3DExtent`, or
/// `ST_Extent` when GDAL cannot compute the 2D extent. Returns `None` for
/// layers without any geometry.
pub fn compute_layer_extent(source: &SourceDataset, layer_name: &str) -> Result<Option<GdalExtent>> {
    let mut layer = source.layer(layer_name)?;
    let is_3d = ffi::geometry_type_has_z(ffi::layer_geometry_type(&layer));

    if source.is_postgres() && is_3d {
        return postgis_extent(source, layer_name, &layer, true).map(Some);
    }

    let envelope = match layer.get_extent() {
        Ok(envelope) => envelope,
        Err(e) if source.is_postgres() => {
            debug!(layer = %layer_name, error = %e, "Falling back to ST_Extent");
            return postgis_extent(source, layer_name, &layer, false).map(Some);
        }
        Err(e) => {
            // Empty layers have no extent.
            if layer.feature_count() == 0 {
                return Ok(None);
            }
            return Err(e.into());
        }
    };

    if ![envelope.MinX, envelope.MaxX, envelope.MinY, envelope.MaxY]
        .iter()
        .all(|v| v.is_finite())
    {
        return Ok(None);
    }

    let mut extent = GdalExtent::new_2d(envelope.MinX, envelope.MaxX, envelope.MinY, envelope.MaxY);
    if is_3d {
        let (zmin, zmax) = scan_z_range(&mut layer);
        if zmin <= zmax {
            extent = GdalExtent::new_3d(extent.xmin, extent.xmax, extent.ymin, extent.ymax, zmin, zmax);
        }
    }
    Ok(Some(extent))
}

fn scan_z_range<L: LayerAccess>(layer: &mut L) -> (f64, f64) {
    let mut range = (f64::INFINITY, f64::NEG_INFINITY);
    for feature in layer.features() {
        if let Some(geometry) = feature.geometry() {
            let envelope = geometry.envelope_3d();
            range.0 = range.0.min(envelope.MinZ);
            range.1 = range.1.max(envelope.MaxZ);
        }
    }
    range
}

fn postgis_extent<L: LayerAccess>(
    source: &SourceDataset,
    layer_name: &str,
    layer: &L,
    is_3d: bool,
) -> Result<GdalExtent> {
    let geometry_column = ffi::geometry_column(layer).ok_or_else(|| {
        SourceError::UnexpectedResult(format!("layer '{}' has no geometry column", layer_name))
    })?;
    let function = if is_3d { "ST_3DExtent" } else { "ST_Extent" };
    let query = format!(
        "SELECT {}({})::text AS extent FROM {}",
        function,
        quote_ident(&geometry_column),
        postgres_table(layer_name)
    );

    let text = match first_row(source, &query, Dialect::DEFAULT)? {
        Some(FieldValue::StringValue(text)) => text,
        other => {
            return Err(SourceError::UnexpectedResult(format!(
                "{} returned {:?} for layer '{}'",
                function, other, layer_name
            )))
        }
    };
    Ok(parse_postgis_box(&text)?)
}

/// `schema."table"` for a PostgreSQL layer name; layers in `public` are
/// reported without a schema.
pub(crate) fn postgres_table(layer_name: &str) -> String {
    match layer_name.split_once('.') {
        Some((schema, table)) => format!("{}.{}", quote_ident(schema), quote_ident(table)),
        None => format!("public.{}", quote_ident(layer_name)),
    }
}

/// `FROM` target for a layer: `schema."table"` on PostgreSQL, the quoted
/// layer name elsewhere.
pub(crate) fn table_reference(source: &SourceDataset, layer_name: &str) -> String {
    if source.is_postgres() {
        postgres_table(layer_name)
    } else {
        quote_ident(layer_name)
    }
}

/// Fail with `FieldNotFound` unless the layer defines `field`.
pub fn ensure_field(source: &SourceDataset, layer_name: &str, field: &str) -> Result<()> {
    let layer = source.layer(layer_name)?;
    let found = layer.defn().fields().any(|f| f.name() == field);
    if found {
        Ok(())
    } else {
        Err(SourceError::FieldNotFound {
            layer: layer_name.to_string(),
            field: field.to_string(),
        })
    }
}

/// `MIN`/`MAX` of a datetime field as ISO 8601 strings. Either end is
/// `None` when every value is NULL.
pub fn temporal_extent(
    source: &SourceDataset,
    layer_name: &str,
    datetime_field: &str,
) -> Result<(Option<String>, Option<String>)> {
    ensure_field(source, layer_name, datetime_field)?;
    let field = quote_ident(datetime_field);
    let table = table_reference(source, layer_name);

    let start = first_row(
        source,
        &format!("SELECT MIN({}) AS tmin FROM {}", field, table),
        source.native_dialect(),
    )?;
    let end = first_row(
        source,
        &format!("SELECT MAX({}) AS tmax FROM {}", field, table),
        source.native_dialect(),
    )?;

    let interval = (start.and_then(field_value_to_iso), end.and_then(field_value_to_iso));
    if interval.0.is_none() && interval.1.is_none() {
        warn!(layer = %layer_name, field = %datetime_field, "Datetime field has no values");
    }
    Ok(interval)
}
