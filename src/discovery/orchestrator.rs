//! Three-tier source discovery policy.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::discovery::{
    normalize_uri, DiscoveredSource, SearchQuery, SearchSource, SourceOrigin,
};
use crate::error::{DiscoveryError, LaereError, Result};

const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.7;
const DEFAULT_MIN_RESULTS: usize = 3;
const DEFAULT_INTERNAL_RESULTS: usize = 2;
const DEFAULT_REPOSITORY_RESULTS: usize = 5;
const DEFAULT_WEB_RESULTS: usize = 5;

/// Which origin to try first when discovering sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePriority {
    #[default]
    RagFirst,
    GithubFirst,
    Balanced,
}

impl FromStr for SourcePriority {
    type Err = LaereError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rag_first" => Ok(Self::RagFirst),
            "github_first" => Ok(Self::GithubFirst),
            "balanced" => Ok(Self::Balanced),
            _ => Err(LaereError::Config(format!(
                "Unknown source priority: {s}. Valid options: rag_first, github_first, balanced"
            ))),
        }
    }
}

impl fmt::Display for SourcePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RagFirst => write!(f, "rag_first"),
            Self::GithubFirst => write!(f, "github_first"),
            Self::Balanced => write!(f, "balanced"),
        }
    }
}

/// Coordinates the three discovery origins.
///
/// Tiered priorities query origins in order and stop as soon as enough
/// sources have accumulated, so later oracles are never consulted when an
/// earlier tier suffices. `Balanced` queries all three concurrently. A
/// failing or unconfigured origin degrades to zero results; discovery as a
/// whole fails only when every origin failed.
pub struct DiscoveryOrchestrator {
    internal: Arc<dyn SearchSource>,
    repository: Arc<dyn SearchSource>,
    web: Arc<dyn SearchSource>,
    relevance_threshold: f32,
    min_results: usize,
    internal_max_results: usize,
    repository_max_results: usize,
    web_max_results: usize,
}

impl DiscoveryOrchestrator {
    /// Create an orchestrator over the three origins.
    pub fn new(
        internal: Arc<dyn SearchSource>,
        repository: Arc<dyn SearchSource>,
        web: Arc<dyn SearchSource>,
    ) -> Self {
        Self {
            internal,
            repository,
            web,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            min_results: DEFAULT_MIN_RESULTS,
            internal_max_results: DEFAULT_INTERNAL_RESULTS,
            repository_max_results: DEFAULT_REPOSITORY_RESULTS,
            web_max_results: DEFAULT_WEB_RESULTS,
        }
    }

    /// Set the relevance floor applied to internal results.
    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    /// Set how many sources count as "enough" to stop querying further tiers.
    pub fn with_min_results(mut self, min_results: usize) -> Self {
        self.min_results = min_results.max(1);
        self
    }

    /// Set per-origin result limits.
    pub fn with_tier_limits(mut self, internal: usize, repository: usize, web: usize) -> Self {
        self.internal_max_results = internal.max(1);
        self.repository_max_results = repository.max(1);
        self.web_max_results = web.max(1);
        self
    }

    /// Discover sources for a query under the given priority.
    #[instrument(skip(self))]
    pub async fn discover(
        &self,
        query: &str,
        priority: SourcePriority,
    ) -> Result<Vec<DiscoveredSource>> {
        debug!("Discovering sources with {priority} priority");

        let sources = match priority {
            SourcePriority::RagFirst => {
                self.tiered(query, [&self.internal, &self.repository, &self.web])
                    .await?
            }
            SourcePriority::GithubFirst => {
                self.tiered(query, [&self.repository, &self.internal, &self.web])
                    .await?
            }
            SourcePriority::Balanced => self.balanced(query).await?,
        };

        debug!("Discovered {} sources", sources.len());
        Ok(sources)
    }

    /// Query tiers in order, stopping once `min_results` have accumulated.
    async fn tiered(
        &self,
        query: &str,
        order: [&Arc<dyn SearchSource>; 3],
    ) -> Result<Vec<DiscoveredSource>> {
        let mut merged: Vec<DiscoveredSource> = Vec::new();
        let mut failures: Vec<String> = Vec::new();

        for source in order {
            let (results, failure) = self.query_origin(source.as_ref(), query).await;
            if let Some(message) = failure {
                failures.push(message);
            }
            merge_dedup(&mut merged, results);

            if merged.len() >= self.min_results {
                return Ok(sort_by_relevance(merged));
            }
        }

        if failures.len() == order.len() {
            return Err(DiscoveryError::AllOriginsFailed {
                detail: failures.join("; "),
            }
            .into());
        }

        Ok(sort_by_relevance(merged))
    }

    /// Query all three origins concurrently and merge everything.
    async fn balanced(&self, query: &str) -> Result<Vec<DiscoveredSource>> {
        let (internal, repository, web) = tokio::join!(
            self.query_origin(self.internal.as_ref(), query),
            self.query_origin(self.repository.as_ref(), query),
            self.query_origin(self.web.as_ref(), query),
        );

        let mut merged: Vec<DiscoveredSource> = Vec::new();
        let mut failures: Vec<String> = Vec::new();
        for (results, failure) in [internal, repository, web] {
            if let Some(message) = failure {
                failures.push(message);
            }
            merge_dedup(&mut merged, results);
        }

        if failures.len() == 3 {
            return Err(DiscoveryError::AllOriginsFailed {
                detail: failures.join("; "),
            }
            .into());
        }

        Ok(sort_by_relevance(merged))
    }

    /// Run one origin's search, degrading failures to zero results.
    async fn query_origin(
        &self,
        source: &dyn SearchSource,
        query: &str,
    ) -> (Vec<DiscoveredSource>, Option<String>) {
        let origin = source.origin();

        if !source.is_available() {
            warn!("{origin} source is not configured, skipping");
            return (Vec::new(), Some(format!("{origin} not configured")));
        }

        let request = SearchQuery::new(query, self.limit_for(origin));
        match source.search(&request).await {
            Ok(mut results) => {
                if origin == SourceOrigin::Internal {
                    results.retain(|s| s.relevance_score >= self.relevance_threshold);
                }
                (results, None)
            }
            Err(e) => {
                warn!("{origin} search failed: {e}");
                (Vec::new(), Some(format!("{origin}: {e}")))
            }
        }
    }

    fn limit_for(&self, origin: SourceOrigin) -> usize {
        match origin {
            SourceOrigin::Internal => self.internal_max_results,
            SourceOrigin::Repository => self.repository_max_results,
            SourceOrigin::Web => self.web_max_results,
        }
    }
}

/// Append sources that are not already present under URI normalization.
/// The earlier occurrence wins, keeping the higher-priority origin's entry.
fn merge_dedup(merged: &mut Vec<DiscoveredSource>, incoming: Vec<DiscoveredSource>) {
    for source in incoming {
        let key = normalize_uri(&source.uri);
        if !merged
            .iter()
            .any(|existing| normalize_uri(&existing.uri) == key)
        {
            merged.push(source);
        }
    }
}

/// Stable sort by relevance descending; ties keep discovery order.
fn sort_by_relevance(mut sources: Vec<DiscoveredSource>) -> Vec<DiscoveredSource> {
    sources.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
    });
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct StubSource {
        origin: SourceOrigin,
        available: bool,
        fail: bool,
        results: Vec<DiscoveredSource>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn returning(origin: SourceOrigin, results: Vec<DiscoveredSource>) -> Arc<Self> {
            Arc::new(Self {
                origin,
                available: true,
                fail: false,
                results,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(origin: SourceOrigin) -> Arc<Self> {
            Arc::new(Self {
                origin,
                available: true,
                fail: true,
                results: Vec::new(),
                calls: AtomicUsize::new(0),
            })
        }

        fn unavailable(origin: SourceOrigin) -> Arc<Self> {
            Arc::new(Self {
                origin,
                available: false,
                fail: false,
                results: Vec::new(),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(AtomicOrdering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchSource for StubSource {
        fn origin(&self) -> SourceOrigin {
            self.origin
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn search(&self, query: &SearchQuery) -> Result<Vec<DiscoveredSource>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            if self.fail {
                return Err(LaereError::SourceSearch("stub failure".to_string()));
            }
            Ok(self
                .results
                .iter()
                .take(query.max_results)
                .cloned()
                .collect())
        }
    }

    fn src(uri: &str, origin: SourceOrigin, score: f32) -> DiscoveredSource {
        DiscoveredSource::new(
            uri.to_string(),
            format!("title {uri}"),
            "snippet".to_string(),
            origin,
            score,
        )
    }

    fn orchestrator(
        internal: Arc<StubSource>,
        repository: Arc<StubSource>,
        web: Arc<StubSource>,
    ) -> DiscoveryOrchestrator {
        DiscoveryOrchestrator::new(internal, repository, web).with_tier_limits(5, 5, 5)
    }

    #[tokio::test]
    async fn test_sufficient_internal_results_short_circuit() {
        let internal = StubSource::returning(
            SourceOrigin::Internal,
            vec![
                src("kb/a.md", SourceOrigin::Internal, 0.9),
                src("kb/b.md", SourceOrigin::Internal, 0.8),
                src("kb/c.md", SourceOrigin::Internal, 0.75),
            ],
        );
        let repository = StubSource::failing(SourceOrigin::Repository);
        let web = StubSource::failing(SourceOrigin::Web);

        let orch = orchestrator(internal.clone(), repository.clone(), web.clone());
        let results = orch.discover("rust", SourcePriority::RagFirst).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(internal.call_count(), 1);
        assert_eq!(repository.call_count(), 0);
        assert_eq!(web.call_count(), 0);
    }

    #[tokio::test]
    async fn test_low_relevance_internal_results_are_filtered() {
        let internal = StubSource::returning(
            SourceOrigin::Internal,
            vec![
                src("kb/meh.md", SourceOrigin::Internal, 0.4),
                src("kb/worse.md", SourceOrigin::Internal, 0.2),
            ],
        );
        let repository = StubSource::returning(
            SourceOrigin::Repository,
            vec![src("https://github.com/a/b", SourceOrigin::Repository, 0.5)],
        );
        let web = StubSource::returning(
            SourceOrigin::Web,
            vec![src("https://example.com/x", SourceOrigin::Web, 0.8)],
        );

        let orch = orchestrator(internal, repository.clone(), web.clone());
        let results = orch.discover("rust", SourcePriority::RagFirst).await.unwrap();

        assert!(results.iter().all(|s| s.origin != SourceOrigin::Internal));
        assert_eq!(repository.call_count(), 1);
        assert_eq!(web.call_count(), 1);
    }

    #[tokio::test]
    async fn test_repository_tier_completes_the_quota() {
        let internal = StubSource::returning(
            SourceOrigin::Internal,
            vec![src("kb/a.md", SourceOrigin::Internal, 0.9)],
        );
        let repository = StubSource::returning(
            SourceOrigin::Repository,
            vec![
                src("https://github.com/a/b", SourceOrigin::Repository, 0.5),
                src("https://github.com/c/d", SourceOrigin::Repository, 0.5),
            ],
        );
        let web = StubSource::returning(SourceOrigin::Web, Vec::new());

        let orch = orchestrator(internal, repository, web.clone());
        let results = orch.discover("rust", SourcePriority::RagFirst).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(web.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_internal_degrades_to_other_origins() {
        let internal = StubSource::failing(SourceOrigin::Internal);
        let repository = StubSource::returning(
            SourceOrigin::Repository,
            vec![src("https://github.com/a/b", SourceOrigin::Repository, 0.5)],
        );
        let web = StubSource::returning(
            SourceOrigin::Web,
            vec![src("https://example.com/x", SourceOrigin::Web, 0.8)],
        );

        let orch = orchestrator(internal.clone(), repository, web);
        let results = orch.discover("rust", SourcePriority::RagFirst).await.unwrap();

        assert_eq!(internal.call_count(), 1);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].origin, SourceOrigin::Web);
        assert_eq!(results[1].origin, SourceOrigin::Repository);
    }

    #[tokio::test]
    async fn test_all_origins_failing_is_an_error() {
        let orch = orchestrator(
            StubSource::failing(SourceOrigin::Internal),
            StubSource::failing(SourceOrigin::Repository),
            StubSource::failing(SourceOrigin::Web),
        );

        let err = orch
            .discover("rust", SourcePriority::RagFirst)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LaereError::Discovery(DiscoveryError::AllOriginsFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_origin_counts_as_failed_and_is_never_queried() {
        let repository = StubSource::unavailable(SourceOrigin::Repository);
        let orch = orchestrator(
            StubSource::failing(SourceOrigin::Internal),
            repository.clone(),
            StubSource::failing(SourceOrigin::Web),
        );

        let err = orch
            .discover("rust", SourcePriority::RagFirst)
            .await
            .unwrap_err();
        assert!(matches!(err, LaereError::Discovery(_)));
        assert_eq!(repository.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_results_without_failures_is_ok() {
        let orch = orchestrator(
            StubSource::returning(SourceOrigin::Internal, Vec::new()),
            StubSource::returning(SourceOrigin::Repository, Vec::new()),
            StubSource::returning(SourceOrigin::Web, Vec::new()),
        );

        let results = orch.discover("rust", SourcePriority::RagFirst).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_uris_are_merged_once() {
        let internal = StubSource::returning(SourceOrigin::Internal, Vec::new());
        let repository = StubSource::returning(
            SourceOrigin::Repository,
            vec![src(
                "https://github.com/tokio-rs/tokio",
                SourceOrigin::Repository,
                0.5,
            )],
        );
        let web = StubSource::returning(
            SourceOrigin::Web,
            vec![src(
                "https://GitHub.com/tokio-rs/tokio/",
                SourceOrigin::Web,
                0.9,
            )],
        );

        let orch = orchestrator(internal, repository, web);
        let results = orch.discover("tokio", SourcePriority::RagFirst).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].origin, SourceOrigin::Repository);
    }

    #[tokio::test]
    async fn test_ties_keep_discovery_order() {
        let orch = orchestrator(
            StubSource::returning(
                SourceOrigin::Internal,
                vec![src("kb/a.md", SourceOrigin::Internal, 0.5)],
            ),
            StubSource::returning(
                SourceOrigin::Repository,
                vec![src("https://github.com/a/b", SourceOrigin::Repository, 0.5)],
            ),
            StubSource::returning(
                SourceOrigin::Web,
                vec![src("https://example.com", SourceOrigin::Web, 0.5)],
            ),
        )
        .with_relevance_threshold(0.5);

        let results = orch.discover("rust", SourcePriority::RagFirst).await.unwrap();
        let origins: Vec<SourceOrigin> = results.iter().map(|s| s.origin).collect();
        assert_eq!(
            origins,
            vec![
                SourceOrigin::Internal,
                SourceOrigin::Repository,
                SourceOrigin::Web
            ]
        );
    }

    #[tokio::test]
    async fn test_github_first_tries_repositories_before_internal() {
        let internal = StubSource::returning(
            SourceOrigin::Internal,
            vec![src("kb/a.md", SourceOrigin::Internal, 0.9)],
        );
        let repository = StubSource::returning(
            SourceOrigin::Repository,
            vec![
                src("https://github.com/a/b", SourceOrigin::Repository, 0.5),
                src("https://github.com/c/d", SourceOrigin::Repository, 0.5),
                src("https://github.com/e/f", SourceOrigin::Repository, 0.5),
            ],
        );
        let web = StubSource::returning(SourceOrigin::Web, Vec::new());

        let orch = orchestrator(internal.clone(), repository.clone(), web.clone());
        let results = orch
            .discover("rust", SourcePriority::GithubFirst)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|s| s.origin == SourceOrigin::Repository));
        assert_eq!(repository.call_count(), 1);
        assert_eq!(internal.call_count(), 0);
        assert_eq!(web.call_count(), 0);
    }

    #[tokio::test]
    async fn test_balanced_queries_everything_and_sorts_by_relevance() {
        let internal = StubSource::returning(
            SourceOrigin::Internal,
            vec![src("kb/a.md", SourceOrigin::Internal, 0.9)],
        );
        let repository = StubSource::returning(
            SourceOrigin::Repository,
            vec![src("https://github.com/a/b", SourceOrigin::Repository, 0.5)],
        );
        let web = StubSource::returning(
            SourceOrigin::Web,
            vec![src("https://example.com", SourceOrigin::Web, 0.7)],
        );

        let orch = orchestrator(internal.clone(), repository.clone(), web.clone());
        let results = orch
            .discover("rust", SourcePriority::Balanced)
            .await
            .unwrap();

        assert_eq!(internal.call_count(), 1);
        assert_eq!(repository.call_count(), 1);
        assert_eq!(web.call_count(), 1);

        let scores: Vec<f32> = results.iter().map(|s| s.relevance_score).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!(
            "rag_first".parse::<SourcePriority>().unwrap(),
            SourcePriority::RagFirst
        );
        assert_eq!(
            "GITHUB_FIRST".parse::<SourcePriority>().unwrap(),
            SourcePriority::GithubFirst
        );
        assert_eq!(
            "balanced".parse::<SourcePriority>().unwrap(),
            SourcePriority::Balanced
        );
        assert!("best_effort".parse::<SourcePriority>().is_err());
        assert_eq!(SourcePriority::RagFirst.to_string(), "rag_first");
    }
}
