//! Error types for Laere.

use thiserror::Error;

/// Failure to locate or parse a JSON object in free-form model output.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no JSON object found in model output")]
    NoJsonFound,

    #[error("malformed JSON at bytes {start}..{end}: {source}")]
    MalformedJson {
        start: usize,
        end: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to coerce extracted JSON into a course document.
///
/// Each variant names the offending field via [`NormalizationError::field`],
/// which the HTTP layer includes in the error detail.
#[derive(Error, Debug)]
pub enum NormalizationError {
    #[error("course output is not a JSON object")]
    NotAnObject,

    #[error("missing or empty field: {0}")]
    MissingField(&'static str),

    #[error("estimated_duration contains no integer: {value:?}")]
    UnparsableDuration { value: String },

    #[error("difficulty must be Beginner, Intermediate, or Advanced, got {value:?}")]
    InvalidDifficulty { value: String },
}

impl NormalizationError {
    /// Name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NotAnObject => "course",
            Self::MissingField(field) => field,
            Self::UnparsableDuration { .. } => "estimated_duration",
            Self::InvalidDifficulty { .. } => "difficulty",
        }
    }
}

/// Failure of the source discovery orchestrator.
///
/// A single failing origin degrades to zero results and is not an error;
/// this fires only when every origin failed.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("all discovery origins failed: {detail}")]
    AllOriginsFailed { detail: String },
}

/// Failure of a single conversational turn.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("model produced no text output")]
    EmptyResponse,

    #[error("upstream model error: {detail}")]
    Upstream { detail: String },

    #[error("turn did not complete within {limit_secs}s")]
    Timeout { limit_secs: u64 },
}

/// Library-level error type for Laere operations.
#[derive(Error, Debug)]
pub enum LaereError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error("Source search failed: {0}")]
    SourceSearch(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for Laere operations.
pub type Result<T> = std::result::Result<T, LaereError>;
