//! Request metrics recorded through the `metrics` facade.

use std::time::Instant;

use metrics::{counter, histogram};

/// Count a served request and its duration under `endpoint`.
pub fn record_request(endpoint: &'static str, started: Instant) {
    counter!("features_requests_total", "endpoint" => endpoint).increment(1);
    histogram!("features_request_duration_seconds", "endpoint" => endpoint)
        .record(started.elapsed().as_secs_f64());
}

/// Count features written to responses.
pub fn record_features_returned(count: u64) {
    counter!("features_returned_total").increment(count);
}
