//! Course generation pipeline.
//!
//! Wires discovery, the agent turn, extraction, and normalization into one
//! request-scoped flow, and owns knowledge base ingestion.

use crate::agent::{CourseAgent, ToolContext};
use crate::config::{Prompts, Settings};
use crate::course::{extract_json, normalize, CourseDocument};
use crate::discovery::{
    normalize_uri, DiscoveryOrchestrator, KnowledgeSource, RepositorySource, SourcePriority,
    SourceTracker, WebSource,
};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{LaereError, Result};
use crate::openai::create_client_with_timeout;
use crate::vector_store::{KnowledgeChunk, MemoryVectorStore, SqliteVectorStore, VectorStore};
use futures::{stream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main entry point for course generation and knowledge indexing.
pub struct CourseGenerator {
    settings: Settings,
    prompts: Prompts,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

/// One course generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Natural-language course request.
    pub prompt: String,
    /// GitHub token for repository discovery, overriding configuration.
    pub github_token: Option<String>,
    /// Drive token, accepted from callers that send one.
    pub drive_token: Option<String>,
    /// Location of supplementary files, surfaced to the model.
    pub files_url: Option<String>,
    /// Priority override for this request.
    pub priority: Option<SourcePriority>,
}

/// Result of indexing one source into the knowledge base.
#[derive(Debug)]
pub struct IngestOutcome {
    pub source_path: String,
    pub title: String,
    pub chunks_indexed: usize,
    pub skipped: bool,
}

impl CourseGenerator {
    /// Create a generator from settings, opening the configured vector store.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new()),
            _ => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        };

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        Ok(Self {
            settings,
            prompts,
            store,
            embedder,
        })
    }

    /// Create a generator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            settings,
            prompts,
            store,
            embedder,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generate a course document for one request.
    ///
    /// Discovery state (tracker, orchestrator, tool context) is built per
    /// request so credentials never leak between callers.
    #[instrument(skip(self, request))]
    pub async fn generate(&self, request: &GenerateRequest) -> Result<CourseDocument> {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(LaereError::InvalidInput(
                "Course prompt is empty".to_string(),
            ));
        }

        let priority = request
            .priority
            .unwrap_or(self.settings.discovery.source_priority);
        let github_token = request
            .github_token
            .clone()
            .or_else(|| self.settings.discovery.resolve_github_token());
        let github_available = github_token.is_some();

        let tracker = Arc::new(SourceTracker::default());
        let repository = Arc::new(RepositorySource::new(
            github_token,
            self.settings.discovery.max_repositories,
        ));
        let knowledge = Arc::new(KnowledgeSource::new(
            self.store.clone(),
            self.embedder.clone(),
        ));
        let web = Arc::new(WebSource::new(
            self.settings.discovery.resolve_web_api_key(),
        ));

        let orchestrator = Arc::new(
            DiscoveryOrchestrator::new(knowledge, repository.clone(), web)
                .with_relevance_threshold(self.settings.discovery.relevance_threshold)
                .with_min_results(self.settings.discovery.min_results)
                .with_tier_limits(
                    self.settings.discovery.rag_max_results,
                    self.settings.discovery.max_repositories,
                    self.settings.discovery.web_max_results,
                ),
        );

        let tools = ToolContext::new(
            orchestrator,
            tracker.clone(),
            repository,
            priority,
            self.settings.course.default_difficulty,
            self.settings.course.default_duration.clone(),
        );

        let agent = CourseAgent::new(tools, &self.settings.agent.model)
            .with_client(create_client_with_timeout(
                self.settings.agent.turn_timeout(),
            ))
            .with_system_prompt(&self.render_system_prompt(priority, github_available))
            .with_max_iterations(self.settings.agent.max_iterations)
            .with_turn_timeout(self.settings.agent.turn_timeout());

        info!(priority = %priority, "Running course generation turn");
        let outcome = agent
            .run_turn(&self.render_user_prompt(prompt, request.files_url.as_deref()))
            .await?;
        info!(iterations = outcome.iterations, "Turn finished");

        let value = extract_json(&outcome.text)?;
        let mut course = normalize(&value)?;

        merge_sources(&mut course, &tracker);

        info!(
            modules = course.modules.len(),
            sources = course.source_from.len(),
            "Course generated: {}",
            course.title
        );
        Ok(course)
    }

    fn render_system_prompt(&self, priority: SourcePriority, github_available: bool) -> String {
        let discovery = &self.settings.discovery;
        let course = &self.settings.course;

        let mut vars = HashMap::new();
        vars.insert("source_priority".to_string(), priority.to_string());
        vars.insert(
            "max_repositories".to_string(),
            discovery.max_repositories.to_string(),
        );
        vars.insert(
            "rag_max_results".to_string(),
            discovery.rag_max_results.to_string(),
        );
        vars.insert(
            "github_available".to_string(),
            github_available.to_string(),
        );
        vars.insert("max_modules".to_string(), course.max_modules.to_string());
        vars.insert(
            "max_lessons_per_module".to_string(),
            course.max_lessons_per_module.to_string(),
        );
        vars.insert(
            "default_duration".to_string(),
            course.default_duration.clone(),
        );
        vars.insert(
            "default_difficulty".to_string(),
            course.default_difficulty.to_string(),
        );

        self.prompts
            .render_with_custom(&self.prompts.course.system, &vars)
    }

    fn render_user_prompt(&self, prompt: &str, files_url: Option<&str>) -> String {
        let attachments = match files_url {
            Some(url) if !url.trim().is_empty() => {
                format!("Supplementary files: {}\n", url.trim())
            }
            _ => String::new(),
        };

        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), prompt.to_string());
        vars.insert("attachments".to_string(), attachments);

        self.prompts
            .render_with_custom(&self.prompts.course.user, &vars)
    }

    /// Index one file into the knowledge base.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn index_path(&self, path: &Path, force: bool) -> Result<IngestOutcome> {
        let source_path = path.display().to_string();

        if !force && self.store.is_source_indexed(&source_path).await? {
            info!("{} is already indexed, skipping", source_path);
            return Ok(IngestOutcome {
                source_path,
                title: "Already indexed".to_string(),
                chunks_indexed: 0,
                skipped: true,
            });
        }

        let content = tokio::fs::read_to_string(path).await?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| source_path.clone());

        let chunks = chunk_text(
            &content,
            self.settings.ingest.chunk_size,
            self.settings.ingest.chunk_overlap,
        );
        if chunks.is_empty() {
            return Ok(IngestOutcome {
                source_path,
                title,
                chunks_indexed: 0,
                skipped: false,
            });
        }

        // Replace any previous version of this source
        self.store.delete_by_source(&source_path).await?;

        let embeddings = self.embedder.embed_batch(&chunks).await?;

        let documents: Vec<KnowledgeChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(order, (content, embedding))| {
                KnowledgeChunk::new(
                    source_path.clone(),
                    title.clone(),
                    None,
                    content,
                    embedding,
                    order as i32,
                )
            })
            .collect();

        self.store.upsert_batch(&documents).await?;

        info!("Indexed {} chunks from {}", documents.len(), source_path);
        Ok(IngestOutcome {
            source_path,
            title,
            chunks_indexed: documents.len(),
            skipped: false,
        })
    }

    /// Index files and directories, processing files concurrently.
    ///
    /// Unreadable files are skipped with a warning rather than failing the
    /// whole batch.
    pub async fn index_paths(&self, paths: &[PathBuf], force: bool) -> Result<Vec<IngestOutcome>> {
        let files = collect_files(paths)?;
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut stream = stream::iter(files)
            .map(|file| async move {
                let result = self.index_path(&file, force).await;
                (file, result)
            })
            .buffer_unordered(self.settings.ingest.max_concurrent.max(1));

        let mut outcomes = Vec::new();
        while let Some((file, result)) = stream.next().await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Skipping {}: {}", file.display(), e),
            }
        }

        outcomes.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        Ok(outcomes)
    }
}

/// Fold tracked discoveries into the document's provenance fields.
///
/// The model's own source_from entries stay first; tracked URIs it did not
/// list are appended, deduplicated by normalized URI.
fn merge_sources(course: &mut CourseDocument, tracker: &SourceTracker) {
    if tracker.is_empty() {
        return;
    }

    let mut seen: HashSet<String> = course
        .source_from
        .iter()
        .map(|uri| normalize_uri(uri))
        .collect();

    for uri in tracker.uris() {
        if seen.insert(normalize_uri(&uri)) {
            course.source_from.push(uri);
        }
    }

    course.source_tracking = Some(tracker.summary());
}

/// Split text into chunks of roughly `chunk_size` characters, preferring
/// paragraph boundaries. Oversized paragraphs are windowed with `overlap`
/// characters carried between windows.
fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    // Overlap below chunk size keeps the window advancing
    let overlap = overlap.min(chunk_size - 1);

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        let paragraph_len = paragraph.chars().count();

        if paragraph_len > chunk_size {
            flush_chunk(&mut chunks, &mut current);

            let chars: Vec<char> = paragraph.chars().collect();
            let mut start = 0;
            while start < chars.len() {
                let end = (start + chunk_size).min(chars.len());
                chunks.push(chars[start..end].iter().collect());
                if end == chars.len() {
                    break;
                }
                start = end - overlap;
            }
            continue;
        }

        if !current.is_empty() && current.chars().count() + paragraph_len + 2 > chunk_size {
            flush_chunk(&mut chunks, &mut current);
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    flush_chunk(&mut chunks, &mut current);
    chunks
}

fn flush_chunk(chunks: &mut Vec<String>, current: &mut String) {
    if !current.trim().is_empty() {
        chunks.push(std::mem::take(current));
    }
}

/// Expand paths into a sorted list of files, recursing into directories and
/// skipping hidden entries.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            collect_dir(path, &mut files)?;
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    Ok(files)
}

fn collect_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_dir(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}
