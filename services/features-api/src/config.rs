//! Service configuration.
//!
//! Values come from command line flags with `APP_*` environment fallbacks
//! (see `main.rs`); this module holds the resolved form and the URL layout
//! derived from it.

use features_protocol::LimitConfig;

/// Path the OGC API is mounted under.
pub const FEATURES_ROUTE: &str = "/features";

/// Resolved service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Verbose logging and request timing.
    pub debug: bool,
    /// Serve the dashboard data endpoints.
    pub enable_web: bool,
    /// Serve the OGC API.
    pub enable_api: bool,
    /// Public URL of the server, without a trailing slash.
    pub base_url: String,
    /// First path segment of the dashboard endpoints.
    pub dashboard_url: String,
    pub limits: LimitConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            debug: false,
            enable_web: true,
            enable_api: true,
            base_url: "http://localhost:8000".to_string(),
            dashboard_url: "dashboard".to_string(),
            limits: LimitConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Normalise user supplied values.
    pub fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self.dashboard_url = self.dashboard_url.trim_matches('/').to_string();
        if self.dashboard_url.is_empty() {
            self.dashboard_url = "dashboard".to_string();
        }
        self.limits.maximum = self.limits.maximum.max(1);
        self.limits.default = self.limits.default.clamp(1, self.limits.maximum);
        self
    }

    /// Whether anything would be served at all.
    pub fn serves_anything(&self) -> bool {
        self.enable_api || self.enable_web
    }

    /// Absolute root of the OGC API, e.g. `http://host/features`.
    pub fn api_base(&self) -> String {
        format!("{}{}", self.base_url, FEATURES_ROUTE)
    }

    /// Route prefix of the dashboard data endpoints, e.g. `/dashboard/data`.
    pub fn dashboard_prefix(&self) -> String {
        format!("/{}/data", self.dashboard_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized() {
        let config = ServiceConfig {
            base_url: "https://maps.example.com/".to_string(),
            dashboard_url: "/admin/".to_string(),
            limits: LimitConfig {
                default: 50_000,
                maximum: 1_000,
            },
            ..Default::default()
        }
        .normalized();

        assert_eq!(config.api_base(), "https://maps.example.com/features");
        assert_eq!(config.dashboard_prefix(), "/admin/data");
        assert_eq!(config.limits.default, 1_000);
    }

    #[test]
    fn test_serves_anything() {
        let mut config = ServiceConfig::default();
        assert!(config.serves_anything());
        config.enable_api = false;
        assert!(config.serves_anything());
        config.enable_web = false;
        assert!(!config.serves_anything());
    }
}
