//! Catalog behaviour against a real SQLite file in a temporary directory.

use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use catalog::{
    cache_keys, Catalog, CatalogError, CollectionRecord, CollectionUpdate, DatasetKind,
    GeneralSettingsUpdate,
};
use features_protocol::{Extent, CRS84};

async fn open_catalog() -> (TempDir, Catalog) {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::open(dir.path()).await.unwrap();
    catalog.migrate().await.unwrap();
    (dir, catalog)
}

fn record(id: &str, layer: &str, dataset_uuid: Uuid) -> CollectionRecord {
    CollectionRecord {
        uuid: Uuid::new_v4(),
        id: id.to_string(),
        layer_name: layer.to_string(),
        title: id.to_string(),
        description: String::new(),
        license_title: None,
        extent: Extent::with_spatial(vec![0.0, 0.0, 1.0, 1.0], CRS84),
        crs: vec![CRS84.to_string()],
        storage_crs: CRS84.to_string(),
        storage_crs_coordinate_epoch: None,
        is_3d: false,
        datetime_field: None,
        dataset_uuid,
        pre_rendered_json: None,
    }
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_migrate_seeds_defaults() {
    let (dir, catalog) = open_catalog().await;

    assert!(dir.path().join(Catalog::DATABASE_FILE).exists());
    assert_eq!(catalog.list_licenses().await.unwrap().len(), 7);

    let settings = catalog.general_settings().await.unwrap();
    assert_eq!(settings.service_title, "OGC Features API");
    assert_eq!(settings.service_description, "A OGC compliant Features API");
}

#[tokio::test]
async fn test_migrate_twice_keeps_data_and_drops_cache() {
    let (dir, catalog) = open_catalog().await;
    let dataset = catalog
        .insert_dataset("lakes", DatasetKind::File, "/data/lakes.geojson")
        .await
        .unwrap();
    catalog
        .put_document(cache_keys::CONFORMANCE, &json!({"conformsTo": []}))
        .await
        .unwrap();

    let reopened = Catalog::open(dir.path()).await.unwrap();
    reopened.migrate().await.unwrap();

    assert_eq!(reopened.get_dataset(dataset.uuid).await.unwrap().name, "lakes");
    assert!(reopened.get_document(cache_keys::CONFORMANCE).await.unwrap().is_none());
    assert_eq!(reopened.list_licenses().await.unwrap().len(), 7);
}

// ============================================================================
// Collections
// ============================================================================

#[tokio::test]
async fn test_duplicate_layer_is_conflict() {
    let (_dir, catalog) = open_catalog().await;
    let dataset = catalog
        .insert_dataset("d", DatasetKind::File, "/data/d.gpkg")
        .await
        .unwrap();

    catalog.insert_collection(&record("lakes", "lakes", dataset.uuid)).await.unwrap();
    let err = catalog
        .insert_collection(&record("lakes-01", "lakes", dataset.uuid))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Conflict(_)));
}

#[tokio::test]
async fn test_ids_with_base() {
    let (_dir, catalog) = open_catalog().await;
    let dataset = catalog
        .insert_dataset("d", DatasetKind::File, "/data/d.gpkg")
        .await
        .unwrap();

    for (id, layer) in [("lakes", "a"), ("lakes-01", "b"), ("lakeside", "c"), ("rivers", "d")] {
        catalog.insert_collection(&record(id, layer, dataset.uuid)).await.unwrap();
    }

    let mut ids = catalog.ids_with_base("lakes").await.unwrap();
    ids.sort();
    assert_eq!(ids, vec!["lakes".to_string(), "lakes-01".to_string()]);
}

#[tokio::test]
async fn test_delete_dataset_cascades() {
    let (_dir, catalog) = open_catalog().await;
    let dataset = catalog
        .insert_dataset("d", DatasetKind::File, "/data/d.gpkg")
        .await
        .unwrap();
    catalog.insert_collection(&record("lakes", "lakes", dataset.uuid)).await.unwrap();

    catalog.delete_dataset(dataset.uuid).await.unwrap();

    assert!(catalog.list_collections().await.unwrap().is_empty());
    assert!(matches!(
        catalog.delete_dataset(dataset.uuid).await,
        Err(CatalogError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_update_clears_collection_cache() {
    let (_dir, catalog) = open_catalog().await;
    let dataset = catalog
        .insert_dataset("d", DatasetKind::File, "/data/d.gpkg")
        .await
        .unwrap();
    let rec = record("lakes", "lakes", dataset.uuid);
    catalog.insert_collection(&rec).await.unwrap();
    catalog
        .store_collection_document(rec.uuid, &json!({"id": "lakes"}))
        .await
        .unwrap();
    assert!(catalog.get_collection("lakes").await.unwrap().pre_rendered_json.is_some());

    let update = CollectionUpdate {
        title: Some("Big Lakes".to_string()),
        license_title: Some(Some("CC-BY-4.0".to_string())),
        ..Default::default()
    };
    let updated = catalog.update_collection(rec.uuid, &update).await.unwrap();
    assert_eq!(updated.title, "Big Lakes");

    let stored = catalog.get_collection("lakes").await.unwrap();
    assert_eq!(stored.license_title.as_deref(), Some("CC-BY-4.0"));
    assert!(stored.pre_rendered_json.is_none());
}

#[tokio::test]
async fn test_unknown_license_rejected() {
    let (_dir, catalog) = open_catalog().await;
    let dataset = catalog
        .insert_dataset("d", DatasetKind::File, "/data/d.gpkg")
        .await
        .unwrap();
    let rec = record("lakes", "lakes", dataset.uuid);
    catalog.insert_collection(&rec).await.unwrap();

    let update = CollectionUpdate {
        license_title: Some(Some("NOT-A-LICENSE".to_string())),
        ..Default::default()
    };
    let err = catalog.update_collection(rec.uuid, &update).await.unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));
}

// ============================================================================
// Pre-rendered documents and triggers
// ============================================================================

#[tokio::test]
async fn test_collection_change_invalidates_collections_document() {
    let (_dir, catalog) = open_catalog().await;
    let dataset = catalog
        .insert_dataset("d", DatasetKind::File, "/data/d.gpkg")
        .await
        .unwrap();
    catalog
        .put_document(cache_keys::COLLECTIONS, &json!({"collections": []}))
        .await
        .unwrap();

    catalog.insert_collection(&record("lakes", "lakes", dataset.uuid)).await.unwrap();

    assert!(catalog.get_document(cache_keys::COLLECTIONS).await.unwrap().is_none());
}

#[tokio::test]
async fn test_storing_collection_document_keeps_collections_document() {
    let (_dir, catalog) = open_catalog().await;
    let dataset = catalog
        .insert_dataset("d", DatasetKind::File, "/data/d.gpkg")
        .await
        .unwrap();
    let lakes = record("lakes", "lakes", dataset.uuid);
    catalog.insert_collection(&lakes).await.unwrap();
    catalog
        .put_document(cache_keys::COLLECTIONS, &json!({"collections": []}))
        .await
        .unwrap();

    catalog
        .store_collection_document(lakes.uuid, &json!({"id": "lakes"}))
        .await
        .unwrap();
    assert!(catalog.get_document(cache_keys::COLLECTIONS).await.unwrap().is_some());

    let update = CollectionUpdate {
        title: Some("Big Lakes".to_string()),
        ..Default::default()
    };
    catalog.update_collection(lakes.uuid, &update).await.unwrap();
    assert!(catalog.get_document(cache_keys::COLLECTIONS).await.unwrap().is_none());
}

#[tokio::test]
async fn test_settings_update_patches_landing_page() {
    let (_dir, catalog) = open_catalog().await;
    catalog
        .put_document(
            cache_keys::LANDING_PAGE,
            &json!({"title": "OGC Features API", "description": "old", "links": []}),
        )
        .await
        .unwrap();

    let settings = catalog
        .update_general_settings(&GeneralSettingsUpdate {
            service_title: Some("Lakes of Europe".to_string()),
            service_description: None,
        })
        .await
        .unwrap();
    assert_eq!(settings.service_title, "Lakes of Europe");

    let landing = catalog.get_document(cache_keys::LANDING_PAGE).await.unwrap().unwrap();
    assert_eq!(landing["title"], "Lakes of Europe");
    assert_eq!(landing["description"], "A OGC compliant Features API");
    assert!(landing["links"].is_array());
}
