//! Command-line interface: argument parsing, terminal output, and
//! pre-flight checks.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Laere - AI Course Generation
///
/// A CLI tool and HTTP service that turns a topic prompt into a structured
/// course grounded in an indexed knowledge base, GitHub repositories, and
/// web search. The name "Laere" comes from the Norwegian word for "learn."
#[derive(Parser, Debug)]
#[command(name = "laere")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a configuration file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diagnose configuration and environment problems
    Doctor,

    /// Generate a course from a topic prompt
    Generate {
        /// What the course should teach (e.g., "XGBoost deployment on Vertex AI")
        prompt: String,

        /// GitHub token for repository discovery (overrides config and env)
        #[arg(long)]
        github_token: Option<String>,

        /// URL of supplementary files to surface to the model
        #[arg(long)]
        files_url: Option<String>,

        /// Source priority (rag_first, github_first, balanced)
        #[arg(short, long)]
        priority: Option<String>,

        /// LLM model to use for generation
        #[arg(short, long)]
        model: Option<String>,

        /// Write the course JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Index local files into the knowledge base
    Index {
        /// Files or directories to index
        #[arg(required = true)]
        paths: Vec<std::path::PathBuf>,

        /// Force re-indexing even if already indexed
        #[arg(short, long)]
        force: bool,
    },

    /// Search for sources across the knowledge base, GitHub, and the web
    Search {
        /// Search query
        query: String,

        /// Maximum number of results to display
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Minimum relevance for knowledge-base results (defaults to config)
        #[arg(short, long)]
        min_score: Option<f32>,

        /// Source priority (rag_first, github_first, balanced)
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// List indexed knowledge sources
    List,

    /// Start the course generation HTTP server
    Serve {
        /// Host to bind to (defaults to config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Open the config file in $EDITOR
    Edit,

    /// Print the config file path
    Path,
}
