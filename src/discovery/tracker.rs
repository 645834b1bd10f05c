//! Request-scoped tracking of discovered sources.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::course::SourceTracking;
use crate::discovery::{normalize_uri, DiscoveredSource, SourceOrigin};

/// Default cap on tracked sources per origin.
pub const DEFAULT_MAX_PER_ORIGIN: usize = 5;

/// Accumulates every source the agent discovered during one generation run.
///
/// Shared by the discovery tools through an `Arc`; lives exactly as long as
/// the request. Each origin is capped independently, evicting the oldest
/// entry of that origin when full.
pub struct SourceTracker {
    sources: Mutex<Vec<DiscoveredSource>>,
    max_per_origin: usize,
}

impl SourceTracker {
    /// Create a tracker with a per-origin cap.
    pub fn new(max_per_origin: usize) -> Self {
        Self {
            sources: Mutex::new(Vec::new()),
            max_per_origin: max_per_origin.max(1),
        }
    }

    /// Record one source, evicting the oldest of its origin when at capacity.
    pub fn record(&self, source: DiscoveredSource) {
        let mut sources = self.sources.lock().unwrap();
        let same_origin = sources.iter().filter(|s| s.origin == source.origin).count();
        if same_origin >= self.max_per_origin {
            if let Some(pos) = sources.iter().position(|s| s.origin == source.origin) {
                sources.remove(pos);
            }
        }
        sources.push(source);
    }

    /// Record a batch in order.
    pub fn record_all(&self, batch: &[DiscoveredSource]) {
        for source in batch {
            self.record(source.clone());
        }
    }

    /// Unique source URIs in the order they were first recorded.
    pub fn uris(&self) -> Vec<String> {
        let sources = self.sources.lock().unwrap();
        let mut seen = HashSet::new();
        let mut uris = Vec::new();
        for source in sources.iter() {
            if seen.insert(normalize_uri(&source.uri)) {
                uris.push(source.uri.clone());
            }
        }
        uris
    }

    /// Snapshot of everything currently tracked.
    pub fn sources(&self) -> Vec<DiscoveredSource> {
        self.sources.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.lock().unwrap().is_empty()
    }

    /// Per-origin counts plus mean relevance across everything tracked.
    pub fn summary(&self) -> SourceTracking {
        let sources = self.sources.lock().unwrap();

        let mut internal_count = 0;
        let mut repository_count = 0;
        let mut web_count = 0;
        for source in sources.iter() {
            match source.origin {
                SourceOrigin::Internal => internal_count += 1,
                SourceOrigin::Repository => repository_count += 1,
                SourceOrigin::Web => web_count += 1,
            }
        }

        let confidence = if sources.is_empty() {
            0.0
        } else {
            sources.iter().map(|s| s.relevance_score).sum::<f32>() / sources.len() as f32
        };

        SourceTracking {
            internal_count,
            repository_count,
            web_count,
            confidence,
        }
    }
}

impl Default for SourceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_ORIGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(uri: &str, origin: SourceOrigin, score: f32) -> DiscoveredSource {
        DiscoveredSource::new(
            uri.to_string(),
            format!("title for {uri}"),
            "snippet".to_string(),
            origin,
            score,
        )
    }

    #[test]
    fn test_summary_counts_and_confidence() {
        let tracker = SourceTracker::default();
        tracker.record(source("kb/a.md", SourceOrigin::Internal, 0.9));
        tracker.record(source("https://github.com/x/y", SourceOrigin::Repository, 0.5));
        tracker.record(source("https://example.com", SourceOrigin::Web, 0.7));

        let summary = tracker.summary();
        assert_eq!(summary.internal_count, 1);
        assert_eq!(summary.repository_count, 1);
        assert_eq!(summary.web_count, 1);
        assert!((summary.confidence - 0.7).abs() < 0.001);
    }

    #[test]
    fn test_empty_tracker_summary() {
        let tracker = SourceTracker::default();
        assert!(tracker.is_empty());
        assert_eq!(tracker.summary().confidence, 0.0);
    }

    #[test]
    fn test_oldest_of_origin_is_evicted_at_cap() {
        let tracker = SourceTracker::new(2);
        tracker.record(source("first", SourceOrigin::Web, 0.5));
        tracker.record(source("second", SourceOrigin::Web, 0.5));
        tracker.record(source("third", SourceOrigin::Web, 0.5));

        let uris = tracker.uris();
        assert_eq!(uris, vec!["second", "third"]);
    }

    #[test]
    fn test_caps_are_per_origin() {
        let tracker = SourceTracker::new(1);
        tracker.record(source("kb/a.md", SourceOrigin::Internal, 0.9));
        tracker.record(source("https://example.com", SourceOrigin::Web, 0.4));

        let summary = tracker.summary();
        assert_eq!(summary.internal_count, 1);
        assert_eq!(summary.web_count, 1);
    }

    #[test]
    fn test_uris_are_unique_in_first_seen_order() {
        let tracker = SourceTracker::default();
        tracker.record_all(&[
            source("https://example.com/a", SourceOrigin::Web, 0.5),
            source("https://Example.com/a/", SourceOrigin::Web, 0.5),
            source("https://example.com/b", SourceOrigin::Web, 0.5),
        ]);

        assert_eq!(
            tracker.uris(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }
}
