//! Service index at `/`.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Serialize;

use features_protocol::{media_types, Link};

use crate::state::AppState;

const TITLE: &str = "Implementation for the new OGC APIs";
const DESCRIPTION: &str = "This server implements the new OGC APIs. Currently, it implements \
     the OGC API - Features - Part 1 and Part 2: Core and CRS standard.";

/// One entry of the index.
#[derive(Debug, Serialize)]
pub struct ServiceEntry {
    pub title: String,
    pub description: String,
    pub links: Vec<Link>,
}

/// GET / - Services offered by this server
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<ServiceEntry>> {
    let config = &state.config;
    let mut links = vec![Link::new(format!("{}/", config.base_url), "self")
        .with_type(media_types::JSON)
        .with_title("This document")];

    if config.enable_api {
        links.push(
            Link::new(config.api_base(), "service")
                .with_type(media_types::JSON)
                .with_title("OGC API - Features"),
        );
    }
    if config.enable_web {
        links.push(
            Link::new(format!("{}{}", config.base_url, config.dashboard_prefix()), "service")
                .with_type(media_types::JSON)
                .with_title("Dashboard data"),
        );
    }

    Json(vec![ServiceEntry {
        title: TITLE.to_string(),
        description: DESCRIPTION.to_string(),
        links,
    }])
}
