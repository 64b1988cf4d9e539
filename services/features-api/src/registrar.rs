//! Publishing dataset layers as collections.
//!
//! Registration reads the layer through GDAL (CRS, extent, optional time
//! range), allocates a collection id from the layer name and stores the
//! record together with its rendered document.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use catalog::{Catalog, CatalogError, CollectionRecord, CollectionUpdate, Dataset};
use feature_source::{describe_layer, temporal_extent, LayerMetadata};
use features_protocol::slug::{allocate_collection_id, base_id_for_layer, title_from_id};
use features_protocol::{Extent, FeaturesError, TemporalExtent};

use crate::blocking::with_dataset;
use crate::documents;
use crate::error::ApiResult;

/// Optional metadata supplied with a registration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegisterOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub license_title: Option<String>,
    pub datetime_field: Option<String>,
}

/// Result of registering one layer during a bulk registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerOutcome {
    pub layer_name: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall status of a bulk registration: 201 when every layer was
/// registered, 500 when none was, 207 otherwise.
pub fn bulk_status(outcomes: &[LayerOutcome]) -> u16 {
    let succeeded = outcomes.iter().filter(|o| o.status == 201).count();
    if succeeded == outcomes.len() {
        201
    } else if succeeded == 0 {
        500
    } else {
        207
    }
}

/// Extent document from layer metadata and an optional time range.
pub fn build_extent(metadata: &LayerMetadata, temporal: Option<(Option<String>, Option<String>)>) -> Extent {
    let mut extent = match &metadata.bbox {
        Some(bbox) => Extent::with_spatial(bbox.clone(), &metadata.default_crs),
        None => Extent::default(),
    };
    if let Some((start, end)) = temporal {
        if start.is_some() || end.is_some() {
            extent = extent.with_temporal(TemporalExtent::new(start, end));
        }
    }
    extent
}

/// Register one layer of `dataset` as a collection.
pub async fn register_layer(
    catalog: &Catalog,
    dataset: &Dataset,
    layer_name: &str,
    options: &RegisterOptions,
    api_base: &str,
) -> ApiResult<CollectionRecord> {
    let registered = catalog.collections_of_dataset(dataset.uuid).await?;
    if let Some(existing) = registered.iter().find(|c| c.layer_name == layer_name) {
        return Err(FeaturesError::Conflict(format!(
            "Layer '{}' is already published as collection '{}'",
            layer_name, existing.id
        ))
        .into());
    }

    let layer = layer_name.to_string();
    let datetime_field = options.datetime_field.clone();
    let (metadata, temporal) = with_dataset(dataset.path.clone(), move |source| {
        let metadata = describe_layer(source, &layer)?;
        let temporal = match &datetime_field {
            Some(field) => Some(temporal_extent(source, &layer, field)?),
            None => None,
        };
        Ok((metadata, temporal))
    })
    .await?;

    let base = base_id_for_layer(layer_name);
    let taken = catalog.ids_with_base(&base).await?;
    let id = allocate_collection_id(&base, &taken)?;

    let mut record = CollectionRecord {
        uuid: Uuid::new_v4(),
        title: options.title.clone().unwrap_or_else(|| title_from_id(&id)),
        id,
        layer_name: layer_name.to_string(),
        description: options.description.clone().unwrap_or_default(),
        license_title: options.license_title.clone(),
        extent: build_extent(&metadata, temporal),
        crs: metadata.crs.clone(),
        storage_crs: metadata.storage_crs.clone(),
        storage_crs_coordinate_epoch: metadata.storage_crs_coordinate_epoch,
        is_3d: metadata.is_3d,
        datetime_field: options.datetime_field.clone(),
        dataset_uuid: dataset.uuid,
        pre_rendered_json: None,
    };

    let rendered = documents::render_collection(catalog, &record, api_base).await?;
    record.pre_rendered_json = Some(serde_json::to_value(&rendered).map_err(CatalogError::from)?);

    catalog.insert_collection(&record).await?;
    info!(collection_id = %record.id, dataset = %dataset.uuid, "Published layer");
    Ok(record)
}

/// Register every layer of `dataset`; one outcome per layer.
pub async fn register_all(
    catalog: &Catalog,
    dataset: &Dataset,
    api_base: &str,
) -> ApiResult<Vec<LayerOutcome>> {
    let layers = with_dataset(dataset.path.clone(), |source| Ok(source.layer_names())).await?;

    let mut outcomes = Vec::with_capacity(layers.len());
    for layer_name in layers {
        let outcome =
            match register_layer(catalog, dataset, &layer_name, &RegisterOptions::default(), api_base).await {
                Ok(record) => LayerOutcome {
                    layer_name,
                    status: 201,
                    collection_id: Some(record.id),
                    error: None,
                },
                Err(e) => {
                    warn!(layer = %layer_name, error = %e, "Layer registration failed");
                    LayerOutcome {
                        layer_name,
                        status: e.status_code(),
                        collection_id: None,
                        error: Some(e.to_string()),
                    }
                }
            };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

/// Apply a metadata update. A changed datetime field recomputes the
/// temporal extent; the collection document is rendered again afterwards.
/// A datetime field the layer does not have is rejected before anything is
/// stored.
pub async fn update_collection(
    catalog: &Catalog,
    uuid: Uuid,
    update: &CollectionUpdate,
    api_base: &str,
) -> ApiResult<CollectionRecord> {
    let temporal = match &update.datetime_field {
        Some(Some(field)) => {
            let current = catalog.get_collection_by_uuid(uuid).await?;
            let dataset = catalog.get_dataset(current.dataset_uuid).await?;
            let layer = current.layer_name.clone();
            let field = field.clone();
            let range = with_dataset(dataset.path, move |source| temporal_extent(source, &layer, &field)).await?;
            Some(Some(range))
        }
        Some(None) => Some(None),
        None => None,
    };

    let mut record = catalog.update_collection(uuid, update).await?;

    if let Some(range) = temporal {
        record.extent.temporal = match range {
            Some((start, end)) if start.is_some() || end.is_some() => Some(TemporalExtent::new(start, end)),
            _ => None,
        };
        catalog.set_collection_extent(uuid, &record.extent).await?;
    }

    let rendered = documents::render_collection(catalog, &record, api_base).await?;
    let value = serde_json::to_value(&rendered).map_err(CatalogError::from)?;
    catalog.store_collection_document(uuid, &value).await?;
    record.pre_rendered_json = Some(value);
    Ok(record)
}
