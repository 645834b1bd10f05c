//! Configuration module for Laere.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{CoursePrompts, Prompts};
pub use settings::{
    AgentSettings, CourseSettings, DiscoverySettings, EmbeddingSettings, GeneralSettings,
    IngestSettings, PromptSettings, ServerSettings, Settings, VectorStoreSettings,
};
