//! Feature data handlers: item pages and single features.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Path, RawQuery},
    http::HeaderMap,
    response::Response,
};
use tracing::debug;

use catalog::CollectionRecord;
use feature_source::crs::wkt_of_identifier;
use feature_source::{get_feature, query_items, ItemsRequest};
use features_protocol::crs::{default_crs, match_offered};
use features_protocol::links::{format_links, FEATURE_FORMATS};
use features_protocol::{
    media_types, FeatureCollection, FeatureQuery, FeaturesError, Format, ItemsQuery, Link, Page,
};

use crate::blocking::with_dataset;
use crate::content_negotiation::negotiate;
use crate::documents;
use crate::error::ApiResult;
use crate::handlers::{html_response, json_response, query_pairs, with_content_crs};
use crate::html;
use crate::metrics::{record_features_returned, record_request};
use crate::state::AppState;

/// Response CRS: the requested one in the collection's spelling, or the
/// collection's default.
fn response_crs(requested: Option<&str>, record: &CollectionRecord) -> ApiResult<String> {
    match requested {
        Some(crs) => Ok(match_offered(crs, &record.crs)?.to_string()),
        None => Ok(default_crs(record.is_3d).to_string()),
    }
}

fn collection_link(api_base: &str, record: &CollectionRecord) -> Link {
    Link::new(format!("{}/collections/{}", api_base, record.id), "collection")
        .with_type(media_types::JSON)
        .with_title(&record.title)
}

/// GET /features/collections/:collection_id/items - A page of features
pub async fn items_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(collection_id): Path<String>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> ApiResult<Response> {
    let started = Instant::now();
    let query = ItemsQuery::from_pairs(query_pairs(raw.as_deref()), state.limits())?;
    let format = negotiate(&headers, query.f.as_deref(), &FEATURE_FORMATS)?;

    let record = documents::find_collection(&state.catalog, &collection_id).await?;
    let crs = response_crs(query.crs.as_deref(), &record)?;
    let bbox_crs = match &query.bbox_crs {
        Some(requested) => match_offered(requested, &record.crs)?.to_string(),
        None => query.effective_bbox_crs(),
    };
    let dataset = state.catalog.get_dataset(record.dataset_uuid).await?;

    let request = ItemsRequest {
        limit: query.limit,
        offset: query.offset,
        bbox: query.bbox.clone(),
        bbox_crs,
        datetime: query.datetime.clone(),
        datetime_field: record.datetime_field.clone(),
        storage_crs: record.storage_crs.clone(),
        response_crs: crs.clone(),
    };
    debug!(collection_id = %record.id, limit = request.limit, offset = request.offset, "Querying items");

    let layer = record.layer_name.clone();
    let page = with_dataset(dataset.path, move |source| query_items(source, &layer, &request)).await?;

    let api_base = state.api_base();
    let items_href = format!("{}/collections/{}/items", api_base, record.id);
    let paging = Page::new(query.limit, query.offset, page.number_matched);

    let mut links = format_links(&items_href, &query.pairs, &FEATURE_FORMATS, format, "This document");
    links.extend(paging.links(&items_href, &query.pairs, format));
    links.push(collection_link(&api_base, &record));

    let collection = FeatureCollection::new(page.features, page.number_matched).with_links(links);
    record_features_returned(collection.number_returned);
    record_request("items", started);

    let response = match format {
        Format::Html => html_response(html::items(
            &record.title,
            &record.id,
            &items_href,
            &collection,
            &api_base,
        )),
        _ => json_response(format, &collection),
    };
    Ok(with_content_crs(response, &crs))
}

/// GET /features/collections/:collection_id/items/:feature_id - One feature
pub async fn feature_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((collection_id, feature_id)): Path<(String, String)>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> ApiResult<Response> {
    let started = Instant::now();
    let query = FeatureQuery::from_pairs(query_pairs(raw.as_deref()))?;
    let format = negotiate(&headers, query.f.as_deref(), &FEATURE_FORMATS)?;

    let record = documents::find_collection(&state.catalog, &collection_id).await?;
    let fid: u64 = feature_id
        .trim()
        .parse()
        .map_err(|_| FeaturesError::FeatureNotFound(feature_id.clone()))?;
    let crs = response_crs(query.crs.as_deref(), &record)?;
    let dataset = state.catalog.get_dataset(record.dataset_uuid).await?;

    let layer = record.layer_name.clone();
    let storage_crs = record.storage_crs.clone();
    let target_crs = crs.clone();
    let want_wkt = format == Format::Html;
    let (feature, crs_wkt) = with_dataset(dataset.path, move |source| {
        let feature = get_feature(source, &layer, fid, &storage_crs, &target_crs)?;
        let wkt = if want_wkt {
            wkt_of_identifier(&target_crs).ok()
        } else {
            None
        };
        Ok((feature, wkt))
    })
    .await?;

    let api_base = state.api_base();
    let href = format!("{}/collections/{}/items/{}", api_base, record.id, fid);
    let mut links = format_links(&href, &query.pairs, &FEATURE_FORMATS, format, "This feature");
    links.push(collection_link(&api_base, &record));
    links.push(
        Link::new(format!("{}/", api_base), "root")
            .with_type(media_types::JSON)
            .with_title("The landing page"),
    );
    let feature = feature.with_links(links);

    record_request("feature", started);
    let response = match format {
        Format::Html => html_response(html::feature(
            &record.title,
            &record.id,
            &feature,
            &crs,
            crs_wkt.as_deref(),
            &api_base,
        )),
        _ => json_response(format, &feature),
    };
    Ok(with_content_crs(response, &crs))
}
