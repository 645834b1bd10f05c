//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::generator::CourseGenerator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let generator = CourseGenerator::new(settings)?;

    match generator.vector_store().list_sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("No sources indexed yet. Use 'laere index <path>' to add content.");
            } else {
                Output::header(&format!("Indexed Sources ({})", sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(
                        &source.source_title,
                        &source.source_path,
                        source.chunk_count,
                        &source.indexed_at.format("%Y-%m-%d").to_string(),
                    );
                }

                let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
                println!();
                Output::kv("Total sources", &sources.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list sources: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
