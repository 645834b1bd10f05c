//! Web search as a discovery origin.
//!
//! Uses a Tavily-style JSON search API, which reports per-result relevance
//! scores in [0, 1]. Results without a score fall back to the default.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::discovery::{
    DiscoveredSource, SearchQuery, SearchSource, SourceOrigin, DEFAULT_UNSCORED_RELEVANCE,
};
use crate::error::{LaereError, Result};

const WEB_SEARCH_ENDPOINT: &str = "https://api.tavily.com/search";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const SNIPPET_CHARS: usize = 300;

/// Discovery origin backed by a web search API.
pub struct WebSource {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl WebSource {
    /// Create a web source with an optional API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_endpoint(api_key, WEB_SEARCH_ENDPOINT)
    }

    /// Create a web source against a custom endpoint.
    pub fn with_endpoint(api_key: Option<String>, endpoint: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_key,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl SearchSource for WebSource {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Web
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<DiscoveredSource>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LaereError::Config("Web search API key not configured".to_string()))?;

        let request = WebSearchRequest {
            api_key,
            query: &query.query,
            max_results: query.max_results.max(1),
        };

        let response = self.http.post(&self.endpoint).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LaereError::SourceSearch(format!(
                "Web search returned {status}: {body}"
            )));
        }

        let parsed: WebSearchResponse = response.json().await?;
        debug!("Web search returned {} results", parsed.results.len());

        Ok(parsed
            .results
            .iter()
            .take(query.max_results)
            .map(web_to_source)
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct WebSearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct WebSearchResponse {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f32>,
}

fn web_to_source(result: &WebResult) -> DiscoveredSource {
    DiscoveredSource::new(
        result.url.clone(),
        result.title.clone(),
        truncate_snippet(&result.content),
        SourceOrigin::Web,
        result.score.unwrap_or(DEFAULT_UNSCORED_RELEVANCE),
    )
}

fn truncate_snippet(content: &str) -> String {
    if content.chars().count() <= SNIPPET_CHARS {
        content.to_string()
    } else {
        let mut snippet: String = content.chars().take(SNIPPET_CHARS).collect();
        snippet.push_str("...");
        snippet
    }
}
