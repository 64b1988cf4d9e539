//! Conformance handler.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, RawQuery},
    http::HeaderMap,
    response::Response,
};

use features_protocol::links::DOCUMENT_FORMATS;
use features_protocol::queries::reject_unknown;
use features_protocol::Format;

use crate::content_negotiation::negotiate;
use crate::documents;
use crate::error::ApiResult;
use crate::handlers::{f_param, html_response, json_response, query_pairs};
use crate::html;
use crate::metrics::record_request;
use crate::state::AppState;

/// GET /features/conformance - Conformance classes
pub async fn conformance_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let started = Instant::now();
    let pairs = query_pairs(query.as_deref());
    reject_unknown(&pairs, &["f"])?;
    let format = negotiate(&headers, f_param(&pairs), &DOCUMENT_FORMATS)?;

    let classes = documents::conformance(&state.catalog).await?;

    record_request("conformance", started);
    Ok(match format {
        Format::Html => html_response(html::conformance(&classes, &state.api_base())),
        _ => json_response(format, &classes),
    })
}
