use std::time::Instant;

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "spexregister_http_requests_total",
        "Total HTTP requests by method and status",
        &["method", "status"]
    )
    .expect("register http_requests_total")
});

pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "spexregister_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register http_request_duration")
});

/// Count and time every request.
pub async fn track(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let started = Instant::now();
    let res = next.run(req).await;
    HTTP_REQUEST_DURATION.with_label_values(&[&method]).observe(started.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL.with_label_values(&[&method, res.status().as_str()]).inc();
    res
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_counters() {
        HTTP_REQUESTS_TOTAL.with_label_values(&["GET", "200"]).inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("spexregister_http_requests_total"));
    }
}
