//! OGC API - Features service.
//!
//! Serves collections published from GDAL/OGR datasets: metadata documents
//! from the catalog's pre-rendered cache, items and single features read
//! through `feature-source`, and JSON endpoints for the dashboard that
//! manages datasets and collections.

pub mod blocking;
pub mod config;
pub mod content_negotiation;
pub mod documents;
pub mod error;
pub mod handlers;
pub mod html;
pub mod metrics;
pub mod registrar;
pub mod router;
pub mod state;

pub use config::ServiceConfig;
pub use router::build_router;
pub use state::AppState;
