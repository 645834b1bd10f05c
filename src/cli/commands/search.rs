//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::discovery::{
    DiscoveryOrchestrator, KnowledgeSource, RepositorySource, SourcePriority, WebSource,
};
use crate::generator::CourseGenerator;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
///
/// Queries the same three origins course generation uses, under the same
/// priority rules, so results preview what the agent would discover.
pub async fn run_search(
    query: &str,
    limit: usize,
    min_score: Option<f32>,
    priority: Option<String>,
    settings: Settings,
) -> Result<()> {
    let priority = match priority {
        Some(p) => p.parse::<SourcePriority>()?,
        None => settings.discovery.source_priority,
    };
    let threshold = min_score.unwrap_or(settings.discovery.relevance_threshold);

    let generator = CourseGenerator::new(settings.clone())?;

    let knowledge = Arc::new(KnowledgeSource::new(
        generator.vector_store(),
        generator.embedder(),
    ));
    let repository = Arc::new(RepositorySource::new(
        settings.discovery.resolve_github_token(),
        settings.discovery.max_repositories,
    ));
    let web = Arc::new(WebSource::new(settings.discovery.resolve_web_api_key()));

    let orchestrator = DiscoveryOrchestrator::new(knowledge, repository, web)
        .with_relevance_threshold(threshold)
        .with_min_results(settings.discovery.min_results)
        .with_tier_limits(
            settings.discovery.rag_max_results,
            settings.discovery.max_repositories,
            settings.discovery.web_max_results,
        );

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.discover(query, priority).await;
    spinner.finish_and_clear();

    match results {
        Ok(sources) => {
            if sources.is_empty() {
                Output::warning("No sources found matching your query.");
            } else {
                Output::success(&format!("Found {} sources", sources.len()));

                for source in sources.iter().take(limit) {
                    Output::search_result(
                        &source.title,
                        &source.origin.to_string(),
                        source.relevance_score,
                        &source.snippet,
                        Some(&source.uri),
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
