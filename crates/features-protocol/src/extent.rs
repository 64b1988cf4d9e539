//! Bounding extents in GDAL axis order and their OGC array form.

use crate::errors::{FeaturesError, Result};

/// An extent as GDAL reports it: `(xmin, xmax, ymin, ymax, zmin, zmax)`.
///
/// A z range of `(+inf, -inf)` (the empty range GDAL returns for layers
/// without elevation) marks a 2D extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdalExtent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

impl GdalExtent {
    /// A 2D extent.
    pub fn new_2d(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin: f64::INFINITY,
            zmax: f64::NEG_INFINITY,
        }
    }

    /// A 3D extent.
    pub fn new_3d(xmin: f64, xmax: f64, ymin: f64, ymax: f64, zmin: f64, zmax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin,
            zmax,
        }
    }

    /// Whether this extent carries a z range.
    pub fn is_3d(&self) -> bool {
        !(self.zmin == f64::INFINITY && self.zmax == f64::NEG_INFINITY)
    }

    /// OGC array order: `[xmin, ymin, xmax, ymax]` or
    /// `[xmin, ymin, zmin, xmax, ymax, zmax]`.
    pub fn to_ogc_order(&self) -> Vec<f64> {
        if self.is_3d() {
            vec![self.xmin, self.ymin, self.zmin, self.xmax, self.ymax, self.zmax]
        } else {
            vec![self.xmin, self.ymin, self.xmax, self.ymax]
        }
    }

    /// Inverse of [`GdalExtent::to_ogc_order`].
    pub fn from_ogc_order(bbox: &[f64]) -> Result<Self> {
        match *bbox {
            [xmin, ymin, xmax, ymax] => Ok(Self::new_2d(xmin, xmax, ymin, ymax)),
            [xmin, ymin, zmin, xmax, ymax, zmax] => {
                Ok(Self::new_3d(xmin, xmax, ymin, ymax, zmin, zmax))
            }
            _ => Err(FeaturesError::InvalidParameter(format!(
                "bounding box must have 4 or 6 values, got {}",
                bbox.len()
            ))),
        }
    }
}

/// Parse the text PostGIS returns for `ST_Extent` (`BOX(x y,x y)`) or
/// `ST_3DExtent` (`BOX3D(x y z,x y z)`).
pub fn parse_postgis_box(text: &str) -> Result<GdalExtent> {
    let invalid = || FeaturesError::InternalError(format!("unrecognised PostGIS box: '{}'", text));

    let text = text.trim();
    let open = text.find('(').ok_or_else(invalid)?;
    let inner = text
        .get(open + 1..)
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(invalid)?;

    let corners: Vec<Vec<f64>> = inner
        .split(',')
        .map(|corner| {
            corner
                .split_whitespace()
                .map(|n| n.parse::<f64>().map_err(|_| invalid()))
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<_>>()?;

    match corners.as_slice() {
        [min, max] if min.len() == 2 && max.len() == 2 => {
            Ok(GdalExtent::new_2d(min[0], max[0], min[1], max[1]))
        }
        [min, max] if min.len() == 3 && max.len() == 3 => Ok(GdalExtent::new_3d(
            min[0], max[0], min[1], max[1], min[2], max[2],
        )),
        _ => Err(invalid()),
    }
}
