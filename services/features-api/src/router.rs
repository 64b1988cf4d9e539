//! Route table and middleware stack.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::config::FEATURES_ROUTE;
use crate::handlers::{self, dashboard};
use crate::state::AppState;

/// Build the application router for `state`. The OGC API and the dashboard
/// endpoints are mounted only when enabled in the configuration.
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let mut app = Router::new()
        .route("/", get(handlers::index::index_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler));

    if config.enable_api {
        app = app.merge(features_routes());
    }
    if config.enable_web {
        app = app.nest(&config.dashboard_prefix(), dashboard_routes());
    }
    if config.debug {
        app = app.layer(middleware::from_fn(log_request_time));
    }

    app.layer(Extension(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

/// OGC API routes; `/features` and `/features/` both reach the landing page.
fn features_routes() -> Router {
    let route = |path: &str| format!("{}{}", FEATURES_ROUTE, path);
    Router::new()
        // Landing page
        .route(FEATURES_ROUTE, get(handlers::landing::landing_handler))
        .route(&route("/"), get(handlers::landing::landing_handler))
        // Conformance
        .route(&route("/conformance"), get(handlers::conformance::conformance_handler))
        // Collections
        .route(&route("/collections"), get(handlers::collections::list_collections_handler))
        .route(
            &route("/collections/:collection_id"),
            get(handlers::collections::get_collection_handler),
        )
        // Features
        .route(
            &route("/collections/:collection_id/items"),
            get(handlers::features::items_handler),
        )
        .route(
            &route("/collections/:collection_id/items/:feature_id"),
            get(handlers::features::feature_handler),
        )
        // API definition
        .route(&route("/api.json"), get(handlers::api::api_json_handler))
        .route(&route("/api.html"), get(handlers::api::api_html_handler))
}

fn dashboard_routes() -> Router {
    Router::new()
        .route(
            "/datasets",
            get(dashboard::datasets::list_datasets_handler).post(dashboard::datasets::create_dataset_handler),
        )
        .route(
            "/datasets/:uuid",
            get(dashboard::datasets::get_dataset_handler).delete(dashboard::datasets::delete_dataset_handler),
        )
        .route(
            "/collections",
            get(dashboard::collections::list_collections_handler)
                .post(dashboard::collections::register_handler)
                .patch(dashboard::collections::update_collection_handler)
                .delete(dashboard::collections::delete_collections_handler),
        )
        .route("/collections/licenses", get(dashboard::collections::list_licenses_handler))
        .route("/collections/:uuid", get(dashboard::collections::get_collection_handler))
        .route(
            "/settings/general",
            get(dashboard::settings::get_settings_handler).patch(dashboard::settings::update_settings_handler),
        )
}

/// Debug mode: log how long each request took.
async fn log_request_time(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    debug!(
        "Request {} '{}' took {:.1} ms",
        method,
        path,
        started.elapsed().as_secs_f64() * 1000.0
    );
    response
}
