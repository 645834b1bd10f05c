//! Generate command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::discovery::SourcePriority;
use crate::generator::{CourseGenerator, GenerateRequest};
use anyhow::Result;

/// Run the generate command.
pub async fn run_generate(
    prompt: &str,
    github_token: Option<String>,
    files_url: Option<String>,
    priority: Option<String>,
    model: Option<String>,
    output: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    preflight::check(preflight::Operation::Generate)?;

    let priority = priority
        .as_deref()
        .map(str::parse::<SourcePriority>)
        .transpose()?;

    if let Some(model) = model {
        settings.agent.model = model;
    }

    let generator = CourseGenerator::new(settings)?;

    let request = GenerateRequest {
        prompt: prompt.to_string(),
        github_token,
        drive_token: None,
        files_url,
        priority,
    };

    let spinner = Output::spinner("Generating course...");
    let result = generator.generate(&request).await;
    spinner.finish_and_clear();

    let course = match result {
        Ok(course) => course,
        Err(e) => {
            Output::error(&format!("Course generation failed: {}", e));
            return Err(e.into());
        }
    };

    let json = serde_json::to_string_pretty(&course)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json)?;
            Output::success(&format!("Course written to {}", path));
            Output::kv("Title", &course.title);
            Output::kv("Difficulty", &course.difficulty.to_string());
            Output::kv("Duration", &format!("{} hours", course.estimated_duration));
            Output::kv("Modules", &course.modules.len().to_string());
            Output::kv("Sources", &course.source_from.len().to_string());
        }
        // Bare JSON on stdout so the output can be piped
        None => println!("{}", json),
    }

    Ok(())
}
