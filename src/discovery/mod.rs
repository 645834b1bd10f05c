//! Source discovery for course generation.
//!
//! Three origins sit behind one [`SearchSource`] trait: the internal
//! knowledge base, repository search, and web search. The
//! [`orchestrator::DiscoveryOrchestrator`] decides which origins to query
//! and how to merge what they return.

pub mod knowledge;
pub mod orchestrator;
pub mod repository;
pub mod tracker;
pub mod web;

pub use knowledge::KnowledgeSource;
pub use orchestrator::{DiscoveryOrchestrator, SourcePriority};
pub use repository::RepositorySource;
pub use tracker::SourceTracker;
pub use web::WebSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Relevance assigned to results from origins that do not score.
pub const DEFAULT_UNSCORED_RELEVANCE: f32 = 0.5;

/// Where a discovered source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Internal,
    Repository,
    Web,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Repository => write!(f, "repository"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// One source returned by a discovery origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredSource {
    /// URI of the source (URL, repository slug, or indexed path).
    pub uri: String,
    /// Human-readable title.
    pub title: String,
    /// Short excerpt of the matching content.
    pub snippet: String,
    /// Which origin produced this source.
    pub origin: SourceOrigin,
    /// Relevance in [0, 1].
    pub relevance_score: f32,
}

impl DiscoveredSource {
    /// Create a source, clamping the relevance score into [0, 1].
    pub fn new(
        uri: String,
        title: String,
        snippet: String,
        origin: SourceOrigin,
        relevance_score: f32,
    ) -> Self {
        Self {
            uri,
            title,
            snippet,
            origin,
            relevance_score: relevance_score.clamp(0.0, 1.0),
        }
    }
}

/// A discovery request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-text topic or question.
    pub query: String,
    /// Upper bound on returned results.
    pub max_results: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
        }
    }
}

/// One origin of discoverable sources.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Origin reported on this source's results.
    fn origin(&self) -> SourceOrigin;

    /// Whether the source is configured well enough to be queried.
    fn is_available(&self) -> bool;

    /// Run one search.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DiscoveredSource>>;
}

/// Canonical form of a URI for deduplication across origins.
///
/// Lowercases the host, drops fragments, and strips trailing slashes.
/// Non-URL inputs (indexed file paths) are only trimmed.
pub fn normalize_uri(uri: &str) -> String {
    match Url::parse(uri.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            let trimmed = url.path().trim_end_matches('/').to_string();
            url.set_path(&trimmed);
            url.to_string().trim_end_matches('/').to_string()
        }
        Err(_) => uri.trim().trim_end_matches('/').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_uri_lowercases_host() {
        assert_eq!(
            normalize_uri("HTTPS://GitHub.COM/tokio-rs/tokio"),
            "https://github.com/tokio-rs/tokio"
        );
    }

    #[test]
    fn test_normalize_uri_strips_slash_and_fragment() {
        assert_eq!(
            normalize_uri("https://example.com/guide/#intro"),
            "https://example.com/guide"
        );
        assert_eq!(
            normalize_uri("https://example.com/"),
            "https://example.com"
        );
    }

    #[test]
    fn test_normalize_uri_equates_duplicates() {
        let a = normalize_uri("https://Example.com/a/b/");
        let b = normalize_uri("https://example.com/a/b");
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_uri_leaves_paths_alone() {
        assert_eq!(normalize_uri("notes/Rust.md "), "notes/Rust.md");
    }

    #[test]
    fn test_discovered_source_clamps_score() {
        let high = DiscoveredSource::new(
            "u".into(),
            "t".into(),
            "s".into(),
            SourceOrigin::Web,
            1.7,
        );
        assert_eq!(high.relevance_score, 1.0);

        let low = DiscoveredSource::new(
            "u".into(),
            "t".into(),
            "s".into(),
            SourceOrigin::Web,
            -0.2,
        );
        assert_eq!(low.relevance_score, 0.0);
    }
}
