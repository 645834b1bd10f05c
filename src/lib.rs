//! Laere - AI Course Generation
//!
//! A CLI tool and HTTP service that turns a topic prompt into a complete,
//! structured course grounded in discovered sources.
//!
//! The name "Laere" comes from the Norwegian word "lære," meaning "learn."
//!
//! # Overview
//!
//! Laere allows you to:
//! - Generate structured courses (modules, lessons, quizzes) from a prompt
//! - Ground course content in an indexed knowledge base, GitHub repositories,
//!   and web search
//! - Track the provenance of every source that informed a course
//! - Serve course generation over HTTP for integration with other systems
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `course` - Course document model, extraction, and normalization
//! - `discovery` - Three-tier source discovery (knowledge base, GitHub, web)
//! - `agent` - Conversational tool loop that drives generation
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `generator` - Pipeline coordination and knowledge ingestion
//!
//! # Example
//!
//! ```rust,no_run
//! use laere::config::Settings;
//! use laere::generator::{CourseGenerator, GenerateRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let generator = CourseGenerator::new(settings)?;
//!
//!     let request = GenerateRequest {
//!         prompt: "Deploying XGBoost models on Vertex AI".to_string(),
//!         ..Default::default()
//!     };
//!     let course = generator.generate(&request).await?;
//!     println!("{} ({} modules)", course.title, course.modules.len());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod course;
pub mod discovery;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod openai;
pub mod vector_store;

pub use error::{LaereError, Result};
