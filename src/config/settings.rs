//! Layered configuration: TOML file, environment fallbacks for
//! credentials, and built-in defaults matching a fresh install.

use crate::course::Difficulty;
use crate::discovery::SourcePriority;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub discovery: DiscoverySettings,
    pub agent: AgentSettings,
    pub course: CourseSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub ingest: IngestSettings,
    pub prompts: PromptSettings,
}

/// Settings that apply across every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Where the knowledge database and other state live.
    pub data_dir: String,
    /// Log level used when no -v flags are given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.laere".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Source discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Which origin to try first (rag_first, github_first, balanced).
    pub source_priority: SourcePriority,
    /// Relevance floor applied to internal knowledge base results.
    pub relevance_threshold: f32,
    /// Sources that count as "enough" before later tiers are skipped.
    pub min_results: usize,
    /// Maximum results from the internal knowledge base.
    pub rag_max_results: usize,
    /// Maximum repositories from repository search.
    pub max_repositories: usize,
    /// Maximum results from web search.
    pub web_max_results: usize,
    /// GitHub token (falls back to GITHUB_TOKEN / GITHUB_PERSONAL_ACCESS_TOKEN).
    pub github_token: Option<String>,
    /// Web search API key (falls back to TAVILY_API_KEY).
    pub web_api_key: Option<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            source_priority: SourcePriority::RagFirst,
            relevance_threshold: 0.7,
            min_results: 3,
            rag_max_results: 2,
            max_repositories: 5,
            web_max_results: 5,
            github_token: None,
            web_api_key: None,
        }
    }
}

impl DiscoverySettings {
    /// GitHub token from config, falling back to the environment.
    pub fn resolve_github_token(&self) -> Option<String> {
        self.github_token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .or_else(|| std::env::var("GITHUB_PERSONAL_ACCESS_TOKEN").ok())
    }

    /// Web search key from config, falling back to the environment.
    pub fn resolve_web_api_key(&self) -> Option<String> {
        self.web_api_key
            .clone()
            .or_else(|| std::env::var("TAVILY_API_KEY").ok())
    }
}

/// Course agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Model driving the agent loop.
    pub model: String,
    /// Maximum model calls per turn.
    pub max_iterations: usize,
    /// Wall-clock limit for one turn, in seconds.
    pub turn_timeout_seconds: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_iterations: 15,
            turn_timeout_seconds: 300,
        }
    }
}

impl AgentSettings {
    /// Turn timeout as a [`Duration`].
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_seconds)
    }
}

/// Course shape defaults, interpolated into the agent prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseSettings {
    /// Difficulty used when the topic gives no signal.
    pub default_difficulty: Difficulty,
    /// Duration estimate offered to the model.
    pub default_duration: String,
    /// Upper bound on modules per course.
    pub max_modules: u32,
    /// Upper bound on lessons per module.
    pub max_lessons_per_module: u32,
}

impl Default for CourseSettings {
    fn default() -> Self {
        Self {
            default_difficulty: Difficulty::Intermediate,
            default_duration: "8-12 hours".to_string(),
            max_modules: 6,
            max_lessons_per_module: 4,
        }
    }
}

/// Embedding model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider name; only "openai" is implemented.
    pub provider: String,
    /// Model name passed to the embeddings API.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Knowledge chunk storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Backend, "sqlite" or "memory".
    pub provider: String,
    /// Database location for the sqlite backend.
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.laere/knowledge.db".to_string(),
        }
    }
}

/// Knowledge base ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Maximum files processed concurrently.
    pub max_concurrent: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            max_concurrent: 4,
        }
    }
}

/// Prompt template overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory holding course.toml with replacement templates.
    pub custom_dir: Option<String>,
    /// Extra variables substituted into every template as {{name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load from the default config location.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or the default location when `None`. Missing
    /// files yield the built-in defaults rather than an error.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Write to the default config location.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LaereError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Platform config path, e.g. ~/.config/laere/config.toml on Linux.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("laere")
            .join("config.toml")
    }

    /// Tilde-expand a configured path.
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Expanded data directory.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Expanded database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }
}
