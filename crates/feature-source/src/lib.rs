//! GDAL/OGR access for OGC API Features collections.
//!
//! Everything here is blocking; async callers run it on a blocking thread.
//! A [`SourceDataset`] is opened read-only per unit of work and released
//! when dropped.

pub mod crs;
pub mod dataset;
pub mod error;
pub mod extent;
mod ffi;
pub mod layer;
pub mod query;
mod sql;

pub use dataset::{Backend, LayerInfo, SourceDataset};
pub use error::{Result, SourceError};
pub use extent::{compute_layer_extent, ensure_field, temporal_extent};
pub use layer::{describe_layer, LayerMetadata};
pub use query::{get_feature, query_items, ItemsPage, ItemsRequest};
