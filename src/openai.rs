//! Shared OpenAI client construction.
//!
//! The course agent and the embedder both talk to OpenAI. Credentials come
//! from the `OPENAI_API_KEY` environment variable, which `async-openai`
//! reads on its own; only the HTTP timeout varies by caller.

use std::time::Duration;

use async_openai::{config::OpenAIConfig, Client};

/// Default HTTP timeout. Completion calls that draft a full course run long.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client with the default timeout.
pub fn create_client() -> Client<OpenAIConfig> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client with a caller-chosen timeout. Agent turns pass their
/// configured turn timeout here.
pub fn create_client_with_timeout(timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
