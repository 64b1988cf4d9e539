//! Metadata documents served from the pre-rendered cache.
//!
//! Each document is built once, stored in the catalog and reused until a
//! trigger or an update drops it. Cached documents are stored with JSON as
//! the current format; handlers relabel the links for what they serve.

use serde_json::Value;
use tracing::debug;

use catalog::{cache_keys, Catalog, CatalogError, CollectionRecord};
use features_protocol::{Collection, CollectionList, ConformanceClasses, FeaturesError, LandingPage};

use crate::error::{ApiError, ApiResult};

/// Landing page with the configured service title and description.
pub async fn landing_page(catalog: &Catalog, api_base: &str) -> ApiResult<LandingPage> {
    if let Some(cached) = catalog.get_document(cache_keys::LANDING_PAGE).await? {
        return Ok(serde_json::from_value(cached).map_err(CatalogError::from)?);
    }

    let settings = catalog.general_settings().await?;
    let landing = LandingPage::new(&settings.service_title, &settings.service_description, api_base);
    store(catalog, cache_keys::LANDING_PAGE, &landing).await?;
    Ok(landing)
}

/// Conformance declaration.
pub async fn conformance(catalog: &Catalog) -> ApiResult<ConformanceClasses> {
    if let Some(cached) = catalog.get_document(cache_keys::CONFORMANCE).await? {
        return Ok(serde_json::from_value(cached).map_err(CatalogError::from)?);
    }

    let classes = ConformanceClasses::current();
    store(catalog, cache_keys::CONFORMANCE, &classes).await?;
    Ok(classes)
}

/// All collections with the CRS list they share.
pub async fn collection_list(catalog: &Catalog, api_base: &str) -> ApiResult<CollectionList> {
    if let Some(cached) = catalog.get_document(cache_keys::COLLECTIONS).await? {
        return Ok(serde_json::from_value(cached).map_err(CatalogError::from)?);
    }

    let mut collections = Vec::new();
    for record in catalog.list_collections().await? {
        collections.push(collection(catalog, &record, api_base).await?);
    }

    let list = CollectionList::new(collections, api_base);
    store(catalog, cache_keys::COLLECTIONS, &list).await?;
    Ok(list)
}

/// Look up a collection by its public id.
pub async fn find_collection(catalog: &Catalog, id: &str) -> ApiResult<CollectionRecord> {
    catalog.get_collection(id).await.map_err(|e| match e {
        CatalogError::NotFound(_) => ApiError::Protocol(FeaturesError::CollectionNotFound(id.to_string())),
        other => other.into(),
    })
}

/// Collection document for `record`, from its cache column when present.
pub async fn collection(catalog: &Catalog, record: &CollectionRecord, api_base: &str) -> ApiResult<Collection> {
    if let Some(cached) = &record.pre_rendered_json {
        return Ok(serde_json::from_value(cached.clone()).map_err(CatalogError::from)?);
    }

    let rendered = render_collection(catalog, record, api_base).await?;
    let value = serde_json::to_value(&rendered).map_err(CatalogError::from)?;
    catalog.store_collection_document(record.uuid, &value).await?;
    debug!(collection_id = %record.id, "Rendered collection document");
    Ok(rendered)
}

/// Build a collection document without touching the cache.
pub async fn render_collection(
    catalog: &Catalog,
    record: &CollectionRecord,
    api_base: &str,
) -> ApiResult<Collection> {
    let license = match &record.license_title {
        Some(title) => catalog.get_license(title).await?,
        None => None,
    };
    Ok(record.to_collection(api_base, license.as_ref()))
}

async fn store<T: serde::Serialize>(catalog: &Catalog, key: &str, document: &T) -> ApiResult<()> {
    let value: Value = serde_json::to_value(document).map_err(CatalogError::from)?;
    catalog.put_document(key, &value).await?;
    debug!(key, "Cached document");
    Ok(())
}
