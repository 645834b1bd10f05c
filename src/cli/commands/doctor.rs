//! Doctor command - diagnose configuration and environment problems.

use std::path::Path;

use console::style;

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore};

/// Outcome of a single diagnostic check.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Ok, message)
    }

    fn warning(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Warning, message)
    }

    fn error(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Error, message)
    }

    fn new(name: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Print a section of checks under a bold heading and hand them back for
/// the summary tally.
fn section(title: &str, results: Vec<CheckResult>) -> Vec<CheckResult> {
    println!("{}", style(title).bold());
    for result in &results {
        result.print();
    }
    println!();
    results
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Laere Doctor");
    println!();
    println!("Checking configuration and environment...\n");

    let mut checks = section(
        "API Configuration",
        vec![
            check_openai_api_key(),
            check_github_token(settings),
            check_web_api_key(settings),
        ],
    );
    checks.extend(section("Storage", check_storage(settings).await));
    checks.extend(section("Configuration", check_configuration(settings)));

    let errors = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Error)
        .count();
    let warnings = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Warning)
        .count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Laere.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Laere is ready to use.");
    }

    Ok(())
}

/// Generation and indexing both require an OpenAI key.
fn check_openai_api_key() -> CheckResult {
    let key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            return CheckResult::error("OPENAI_API_KEY", "not set")
                .with_hint("Set with: export OPENAI_API_KEY='sk-...'")
        }
    };

    if key.is_empty() {
        CheckResult::error("OPENAI_API_KEY", "empty")
            .with_hint("Set with: export OPENAI_API_KEY='sk-...'")
    } else if key.starts_with("sk-") && key.len() > 20 {
        CheckResult::ok("OPENAI_API_KEY", format!("configured ({})", mask_key(&key)))
    } else {
        CheckResult::warning("OPENAI_API_KEY", "set but format looks unusual")
            .with_hint("Expected an OpenAI key starting with sk-")
    }
}

fn check_github_token(settings: &Settings) -> CheckResult {
    match settings.discovery.resolve_github_token() {
        Some(_) => CheckResult::ok("GitHub token", "configured"),
        None => CheckResult::warning("GitHub token", "not set").with_hint(
            "Repository discovery will be skipped. Set GITHUB_TOKEN or discovery.github_token",
        ),
    }
}

fn check_web_api_key(settings: &Settings) -> CheckResult {
    match settings.discovery.resolve_web_api_key() {
        Some(_) => CheckResult::ok("Web search key", "configured"),
        None => CheckResult::warning("Web search key", "not set").with_hint(
            "Web discovery will be skipped. Set TAVILY_API_KEY or discovery.web_api_key",
        ),
    }
}

/// Data directory and the knowledge database, with index stats when the
/// database exists.
async fn check_storage(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    results.push(if data_dir.exists() {
        CheckResult::ok("Data directory", data_dir.display().to_string())
    } else {
        CheckResult::warning(
            "Data directory",
            format!("{} (will be created)", data_dir.display()),
        )
        .with_hint("Created automatically on first use")
    });

    let db_path = settings.sqlite_path();
    if !db_path.exists() {
        results.push(
            CheckResult::warning(
                "Knowledge base",
                format!("{} (not created yet)", db_path.display()),
            )
            .with_hint("Created on first 'laere index'"),
        );
        return results;
    }

    let size = std::fs::metadata(&db_path)
        .map(|m| format_size(m.len()))
        .unwrap_or_else(|_| "unknown size".to_string());

    results.push(match index_stats(&db_path).await {
        Ok((sources, chunks)) => CheckResult::ok(
            "Knowledge base",
            format!("{} source(s), {} chunk(s) ({})", sources, chunks, size),
        ),
        Err(e) => CheckResult::error("Knowledge base", format!("failed to open: {}", e))
            .with_hint("If the file is corrupt, delete it and re-run 'laere index'"),
    });

    results
}

async fn index_stats(db_path: &Path) -> crate::error::Result<(usize, usize)> {
    let store = SqliteVectorStore::new(db_path)?;
    let sources = store.list_sources().await?.len();
    let chunks = store.chunk_count().await?;
    Ok((sources, chunks))
}

/// Config file presence, plus the custom prompt directory when one is set.
/// A missing custom course.toml falls back to built-in prompts silently, so
/// surface it here.
fn check_configuration(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let config_path = Settings::default_config_path();
    results.push(if config_path.exists() {
        CheckResult::ok("Config file", config_path.display().to_string())
    } else {
        CheckResult::warning("Config file", "using defaults")
            .with_hint("Create with: laere config edit")
    });

    if let Some(custom_dir) = &settings.prompts.custom_dir {
        let dir = Settings::expand_path(custom_dir);
        results.push(if dir.join("course.toml").exists() {
            CheckResult::ok("Custom prompts", dir.display().to_string())
        } else if dir.exists() {
            CheckResult::warning(
                "Custom prompts",
                format!("{} has no course.toml", dir.display()),
            )
            .with_hint("Built-in prompts are used until one exists")
        } else {
            CheckResult::warning(
                "Custom prompts",
                format!("{} does not exist", dir.display()),
            )
            .with_hint("Built-in prompts are used until it does")
        });
    }

    results
}

fn mask_key(key: &str) -> String {
    format!("{}...{}", &key[..7], &key[key.len() - 4..])
}

/// Format file size in human-readable form.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_without_hint() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_with_hint() {
        let result = CheckResult::error("test", "failed").with_hint("fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key_keeps_edges_only() {
        let masked = mask_key("sk-proj-abcdefghijklmnop");
        assert_eq!(masked, "sk-proj...mnop");
        assert!(!masked.contains("abcdefgh"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}