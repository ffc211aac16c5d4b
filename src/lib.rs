pub mod api;
pub mod chunker;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod monitoring;
pub mod orchestrator;
pub mod security;
pub mod store;

pub use error::{ApiError, ApiResult};
pub use orchestrator::Orchestrator;
