//! Application state shared by every handler.

use catalog::Catalog;
use features_protocol::LimitConfig;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    /// SQLite catalog of datasets, collections and cached documents.
    pub catalog: Catalog,

    pub config: ServiceConfig,

    /// Renders `/metrics`; absent when no recorder was installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(catalog: Catalog, config: ServiceConfig) -> Self {
        Self {
            catalog,
            config,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Absolute root of the OGC API.
    pub fn api_base(&self) -> String {
        self.config.api_base()
    }

    pub fn limits(&self) -> &LimitConfig {
        &self.config.limits
    }
}
