//! Monitoring module
//!
//! Provides:
//! - Structured logging with tracing
//! - Prometheus metrics collection
//! - Per-client rate limiting middleware for the API surface

pub mod config;
pub mod metrics;
pub mod rate_limit_middleware;
pub mod tracing_config;

pub use config::{LogFormat, MonitoringConfig};
pub use metrics::{export_prometheus, REGISTRY};
pub use rate_limit_middleware::{RateLimitMiddleware, RateLimitOptions};
pub use tracing_config::init_tracing;
