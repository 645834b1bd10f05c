//! Index command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::generator::CourseGenerator;
use anyhow::Result;
use std::path::PathBuf;

/// Run the index command.
pub async fn run_index(paths: &[PathBuf], force: bool, settings: Settings) -> Result<()> {
    preflight::check(preflight::Operation::Index)?;

    let generator = CourseGenerator::new(settings)?;

    let spinner = Output::spinner("Indexing files...");
    let result = generator.index_paths(paths, force).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcomes) if outcomes.is_empty() => {
            Output::warning("No files found to index.");
        }
        Ok(outcomes) => {
            let mut indexed = 0usize;
            let mut chunks = 0usize;
            let mut skipped = 0usize;

            for outcome in &outcomes {
                if outcome.skipped {
                    skipped += 1;
                    Output::list_item(&format!("{} (already indexed)", outcome.source_path));
                } else {
                    indexed += 1;
                    chunks += outcome.chunks_indexed;
                    Output::list_item(&format!(
                        "{} ({} chunks)",
                        outcome.source_path, outcome.chunks_indexed
                    ));
                }
            }

            println!();
            Output::success(&format!(
                "Indexed {} file(s), {} chunks ({} skipped)",
                indexed, chunks, skipped
            ));
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
