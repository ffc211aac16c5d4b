// src/llm/mod.rs

pub mod extract;
pub mod mock;
pub mod prompts;
pub mod provider;
pub mod router_client;

pub use extract::{extract_structured, extract_text, generated_text};
pub use mock::MockResponder;
pub use provider::{bounded, CompletionProvider, UpstreamPayload};
pub use router_client::RouterClient;
