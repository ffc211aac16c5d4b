use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

// Global Prometheus registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

fn service_name() -> String {
    std::env::var("APP_SERVICE").unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string())
}

pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("api_requests_total", "API requests by operation and outcome")
        .const_label("service", service_name());
    let c = IntCounterVec::new(opts, &["operation", "outcome"]).expect("metric");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static UPSTREAM_CALLS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("upstream_calls_total", "Upstream completion calls by outcome")
        .const_label("service", service_name());
    let c = IntCounterVec::new(opts, &["outcome"]).expect("metric");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static UPSTREAM_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    let mut opts = HistogramOpts::new("upstream_latency_ms", "Upstream call latency in milliseconds")
        .buckets(vec![100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0, 120000.0]);
    opts.common_opts = opts.common_opts.const_label("service", service_name());
    let h = Histogram::with_opts(opts).expect("metric");
    REGISTRY.register(Box::new(h.clone())).ok();
    h
});

pub static MOCK_SUBSTITUTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "mock_substitutions_total",
        "Mock responses served in place of upstream output, by reason",
    )
    .const_label("service", service_name());
    let c = IntCounterVec::new(opts, &["reason"]).expect("metric");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static CHUNKS_PROCESSED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::with_opts(
        Opts::new("humanize_chunks_processed_total", "Chunks sent through chunked humanization")
            .const_label("service", service_name()),
    )
    .expect("metric");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static RATE_LIMIT_DROPS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::with_opts(
        Opts::new("rate_limit_drops_total", "Total requests dropped due to rate limit")
            .const_label("service", service_name()),
    )
    .expect("metric");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub fn record_request(operation: &str, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[operation, outcome]).inc();
}

pub fn record_upstream(outcome: &str, latency_ms: f64) {
    UPSTREAM_CALLS_TOTAL.with_label_values(&[outcome]).inc();
    UPSTREAM_LATENCY_MS.observe(latency_ms);
}

pub fn record_mock_substitution(reason: &str) {
    MOCK_SUBSTITUTIONS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn export_prometheus() -> String {
    let metric_families = REGISTRY.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_ok() {
        String::from_utf8(buffer).unwrap_or_default()
    } else {
        "".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_recorded_series() {
        record_request("check", "ok");
        record_mock_substitution("malformed_output");
        RATE_LIMIT_DROPS_TOTAL.inc();
        let text = export_prometheus();
        assert!(text.contains("api_requests_total"));
        assert!(text.contains("mock_substitutions_total"));
        assert!(text.contains("rate_limit_drops_total"));
    }
}
