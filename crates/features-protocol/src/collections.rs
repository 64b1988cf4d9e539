//! Feature collection metadata documents.

use serde::{Deserialize, Serialize};

use crate::crs::CRS84;
use crate::links::{format_links, href_with_query, Format, DOCUMENT_FORMATS, FEATURE_FORMATS};
use crate::media_types;
use crate::types::{Extent, Link};

/// The `/collections` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionList {
    /// Links to related resources.
    pub links: Vec<Link>,

    /// The collections.
    pub collections: Vec<Collection>,

    /// CRSs every collection supports.
    pub crs: Vec<String>,
}

impl CollectionList {
    /// Create a collection list; `api_base` is the Features root URL.
    pub fn new(collections: Vec<Collection>, api_base: &str) -> Self {
        let api_base = api_base.trim_end_matches('/');
        let crs = shared_crs(&collections);
        let mut links = format_links(
            &format!("{}/collections", api_base),
            &[],
            &DOCUMENT_FORMATS,
            Format::Json,
            "This document",
        );
        links.push(
            Link::new(format!("{}/", api_base), "root")
                .with_type(media_types::JSON)
                .with_title("The landing page"),
        );

        Self {
            links,
            collections,
            crs,
        }
    }
}

/// Intersection of the per-collection CRS lists, in the order of the first
/// collection. CRS84 is always present.
pub fn shared_crs(collections: &[Collection]) -> Vec<String> {
    let mut iter = collections.iter();
    let mut shared: Vec<String> = match iter.next() {
        Some(first) => first.crs.clone(),
        None => Vec::new(),
    };
    for collection in iter {
        shared.retain(|crs| collection.crs.contains(crs));
    }
    if !shared.iter().any(|c| c == CRS84) {
        shared.insert(0, CRS84.to_string());
    }
    shared
}

/// A feature collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Unique identifier for the collection.
    pub id: String,

    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Detailed description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Links to related resources.
    pub links: Vec<Link>,

    /// Spatial and temporal extent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,

    /// Always `feature`.
    pub item_type: String,

    /// Coordinate reference systems supported.
    pub crs: Vec<String>,

    /// CRS the data is stored in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_crs: Option<String>,

    /// Epoch of a dynamic storage CRS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_crs_coordinate_epoch: Option<f64>,
}

impl Collection {
    /// Create a new collection with required fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            links: Vec::new(),
            extent: None,
            item_type: "feature".to_string(),
            crs: vec![CRS84.to_string()],
            storage_crs: None,
            storage_crs_coordinate_epoch: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the extent.
    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Set links.
    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }

    /// Set supported CRS.
    pub fn with_crs(mut self, crs: Vec<String>) -> Self {
        self.crs = crs;
        self
    }

    /// Set the storage CRS and its epoch.
    pub fn with_storage_crs(mut self, crs: impl Into<String>, epoch: Option<f64>) -> Self {
        self.storage_crs = Some(crs.into());
        self.storage_crs_coordinate_epoch = epoch;
        self
    }
}

/// Standard links of a collection document: self/alternate, root and items
/// in every feature format.
pub fn collection_links(api_base: &str, id: &str, title: &str) -> Vec<Link> {
    let api_base = api_base.trim_end_matches('/');
    let href = format!("{}/collections/{}", api_base, id);

    let mut links = format_links(&href, &[], &DOCUMENT_FORMATS, Format::Json, "This document");
    links.push(
        Link::new(format!("{}/", api_base), "root")
            .with_type(media_types::JSON)
            .with_title("The landing page"),
    );
    for format in FEATURE_FORMATS {
        links.push(
            Link::new(
                href_with_query(&format!("{}/items", href), &[("f", format.f_param())]),
                "items",
            )
            .with_type(format.media_type())
            .with_title(format!("{} as {}", title, format.name())),
        );
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::CRS84H;

    const EPSG_3857: &str = "http://www.opengis.net/def/crs/EPSG/0/3857";
    const EPSG_25832: &str = "http://www.opengis.net/def/crs/EPSG/0/25832";

    #[test]
    fn test_collection_serialization() {
        let collection = Collection::new("lakes")
            .with_title("Lakes")
            .with_crs(vec![CRS84.to_string(), EPSG_3857.to_string()])
            .with_storage_crs(EPSG_3857, None);

        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["itemType"], "feature");
        assert_eq!(value["storageCrs"], EPSG_3857);
        assert!(value.get("storageCrsCoordinateEpoch").is_none());
    }

    #[test]
    fn test_shared_crs_intersection() {
        let a = Collection::new("a").with_crs(vec![CRS84.to_string(), EPSG_3857.to_string()]);
        let b = Collection::new("b").with_crs(vec![CRS84.to_string(), EPSG_3857.to_string(), EPSG_25832.to_string()]);
        let c = Collection::new("c").with_crs(vec![CRS84.to_string(), EPSG_25832.to_string()]);

        assert_eq!(shared_crs(&[a.clone(), b.clone()]), vec![CRS84.to_string(), EPSG_3857.to_string()]);
        assert_eq!(shared_crs(&[a, b, c]), vec![CRS84.to_string()]);
    }

    #[test]
    fn test_shared_crs_always_has_crs84() {
        let only_3d = Collection::new("z").with_crs(vec![CRS84H.to_string()]);
        assert!(shared_crs(&[only_3d]).contains(&CRS84.to_string()));
        assert_eq!(shared_crs(&[]), vec![CRS84.to_string()]);
    }

    #[test]
    fn test_collection_links() {
        let links = collection_links("http://h/features", "lakes", "Lakes");

        assert!(links.iter().any(|l| l.rel == "self" && l.href == "http://h/features/collections/lakes?f=json"));
        assert!(links.iter().any(|l| l.rel == "root"));
        let items: Vec<_> = links.iter().filter(|l| l.rel == "items").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].href, "http://h/features/collections/lakes/items?f=geojson");
    }

    #[test]
    fn test_collection_list_links() {
        let list = CollectionList::new(vec![], "http://h/features/");
        assert!(list.links.iter().any(|l| l.href == "http://h/features/collections?f=json"));
        assert_eq!(list.crs, vec![CRS84.to_string()]);
    }
}
