// src/config.rs
use crate::error::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ROUTER_API_URL: &str = "https://api.router.example.com/v1/completions";
pub const DEFAULT_ROUTER_MODEL: &str = "deepseek-r3";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,

    // Upstream completion API
    pub router_api_key: Option<String>,
    pub router_api_url: String,
    pub router_model: String,
    pub upstream_timeout_ms: u64,

    // Chunking knobs, honored independently
    pub chunk_word_threshold: usize,
    pub chunk_max_chars: usize,

    // Rate limiting
    pub rate_limit_enabled: bool,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max_requests: u32,
    pub rate_limit_lru_capacity: usize,
    pub trust_proxy: bool,
    /// Interval for evicting expired windows; 0 disables the sweeper
    pub rate_limit_sweep_secs: u64,

    pub result_store_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            workers: None,
            router_api_key: None,
            router_api_url: DEFAULT_ROUTER_API_URL.to_string(),
            router_model: DEFAULT_ROUTER_MODEL.to_string(),
            upstream_timeout_ms: 120_000,
            chunk_word_threshold: 2000,
            chunk_max_chars: 2000,
            rate_limit_enabled: true,
            rate_limit_window_secs: 15 * 60,
            rate_limit_max_requests: 50,
            rate_limit_lru_capacity: 10_000,
            trust_proxy: false,
            rate_limit_sweep_secs: 300,
            result_store_capacity: 100,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            })
        }
        _ => Ok(default),
    }
}

fn flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(default)
}

impl ApiConfig {
    /// Read configuration once at process start.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !flag("NO_DOTENV", false) {
            dotenvy::dotenv().ok();
        }
        let defaults = Self::default();

        let router_api_key = env::var("ROUTER_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let router_api_url = env::var("ROUTER_API_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(defaults.router_api_url);
        let router_model = env::var("ROUTER_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.router_model);

        let workers = match env::var("ACTIX_WORKERS") {
            Ok(v) if !v.trim().is_empty() => Some(parse_var("ACTIX_WORKERS", 1usize)?.max(1)),
            _ => None,
        };

        Ok(Self {
            host: env::var("BACKEND_HOST").unwrap_or(defaults.host),
            port: parse_var("BACKEND_PORT", defaults.port)?,
            workers,
            router_api_key,
            router_api_url,
            router_model,
            upstream_timeout_ms: parse_var("UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout_ms)?,
            chunk_word_threshold: parse_var("CHUNK_WORD_THRESHOLD", defaults.chunk_word_threshold)?,
            chunk_max_chars: parse_var("CHUNK_MAX_CHARS", defaults.chunk_max_chars)?,
            rate_limit_enabled: flag("RATE_LIMIT_ENABLED", defaults.rate_limit_enabled),
            rate_limit_window_secs: parse_var("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit_window_secs)?,
            rate_limit_max_requests: parse_var(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            )?,
            rate_limit_lru_capacity: parse_var(
                "RATE_LIMIT_LRU_CAPACITY",
                defaults.rate_limit_lru_capacity,
            )?,
            trust_proxy: flag("TRUST_PROXY", defaults.trust_proxy),
            rate_limit_sweep_secs: parse_var("RATE_LIMIT_SWEEP_SECS", defaults.rate_limit_sweep_secs)?,
            result_store_capacity: parse_var("RESULT_STORE_CAPACITY", defaults.result_store_capacity)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Mock mode is system-wide and decided solely by key presence.
    pub fn has_api_key(&self) -> bool {
        self.router_api_key.is_some()
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.upstream_timeout_ms, 120_000);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(900));
        assert_eq!(config.rate_limit_max_requests, 50);
        assert_eq!(config.chunk_word_threshold, 2000);
        assert_eq!(config.chunk_max_chars, 2000);
        assert!(!config.has_api_key());
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("HUMANIZER_TEST_PORT_GARBAGE", "not-a-port");
        let err = parse_var::<u16>("HUMANIZER_TEST_PORT_GARBAGE", 1).unwrap_err();
        assert!(err.to_string().contains("HUMANIZER_TEST_PORT_GARBAGE"));
        env::remove_var("HUMANIZER_TEST_PORT_GARBAGE");
    }

    #[test]
    fn test_parse_var_missing_uses_default() {
        assert_eq!(parse_var::<u64>("HUMANIZER_TEST_UNSET_VAR", 42).unwrap(), 42);
    }
}
