//! Collection metadata handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Path, RawQuery},
    http::HeaderMap,
    response::Response,
};

use features_protocol::links::{set_current_format, DOCUMENT_FORMATS};
use features_protocol::queries::reject_unknown;
use features_protocol::Format;

use crate::content_negotiation::negotiate;
use crate::documents;
use crate::error::ApiResult;
use crate::handlers::{f_param, html_response, json_response, query_pairs};
use crate::html;
use crate::metrics::record_request;
use crate::state::AppState;

/// GET /features/collections - All collections
pub async fn list_collections_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let started = Instant::now();
    let pairs = query_pairs(query.as_deref());
    reject_unknown(&pairs, &["f"])?;
    let format = negotiate(&headers, f_param(&pairs), &DOCUMENT_FORMATS)?;

    let api_base = state.api_base();
    let mut list = documents::collection_list(&state.catalog, &api_base).await?;
    set_current_format(&mut list.links, format);

    record_request("collections", started);
    Ok(match format {
        Format::Html => html_response(html::collections(&list, &api_base)),
        _ => json_response(format, &list),
    })
}

/// GET /features/collections/:collection_id - One collection
pub async fn get_collection_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(collection_id): Path<String>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let started = Instant::now();
    let pairs = query_pairs(query.as_deref());
    reject_unknown(&pairs, &["f"])?;
    let format = negotiate(&headers, f_param(&pairs), &DOCUMENT_FORMATS)?;

    let api_base = state.api_base();
    let record = documents::find_collection(&state.catalog, &collection_id).await?;
    let mut collection = documents::collection(&state.catalog, &record, &api_base).await?;
    set_current_format(&mut collection.links, format);

    record_request("collection", started);
    Ok(match format {
        Format::Html => html_response(html::collection(&collection, &api_base)),
        _ => json_response(format, &collection),
    })
}
