// src/main.rs
use humanizer::api::start_api_server;
use humanizer::config::ApiConfig;
use humanizer::monitoring::{init_tracing, MonitoringConfig};
use tracing::{error, info, warn};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env before the logging config reads RUST_LOG and friends
    if std::env::var("NO_DOTENV").map(|v| v != "true" && v != "1").unwrap_or(true) {
        dotenvy::dotenv().ok();
    }

    let monitoring_config = MonitoringConfig::from_env();
    // Held until shutdown so buffered file logs are flushed
    let _log_guard = init_tracing(&monitoring_config)?;

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    info!(addr = %config.bind_addr(), mock_mode = !config.has_api_key(), "Configuration loaded");
    if !config.rate_limit_enabled {
        warn!("Rate limiting disabled");
    }

    start_api_server(&config).await
}
