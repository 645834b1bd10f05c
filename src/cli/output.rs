//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Informational line.
    pub fn info(msg: &str) {
        println!("{} {}", style("»").cyan().bold(), msg);
    }

    /// Success line.
    pub fn success(msg: &str) {
        println!("{} {}", style("✓").green().bold(), msg);
    }

    /// Warning line, to stderr.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style("!").yellow().bold(), msg);
    }

    /// Error line, to stderr.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style("✗").red().bold(), msg);
    }

    /// Underlined section header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Indented key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Indented list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("•").cyan(), msg);
    }

    /// One indexed source with its chunk count and index date.
    pub fn source_info(title: &str, path: &str, chunks: u32, indexed_at: &str) {
        println!(
            "  {} {} ({}, {} chunks, indexed {})",
            style("•").cyan(),
            style(title).bold(),
            style(path).dim(),
            chunks,
            indexed_at
        );
    }

    /// One discovered source with its origin and relevance score.
    pub fn search_result(title: &str, origin: &str, score: f32, snippet: &str, uri: Option<&str>) {
        println!(
            "\n{} {} [{}] (score: {:.2})",
            style("→").green(),
            style(title).bold(),
            style(origin).cyan(),
            score
        );
        if !snippet.trim().is_empty() {
            println!("   {}", content_preview(snippet, 200));
        }
        if let Some(u) = uri {
            println!("   {}", style(u).dim());
        }
    }

    /// Spinner for long-running operations.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten to one line and truncate with an ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview_flattens_and_truncates() {
        assert_eq!(content_preview("one\ntwo", 100), "one two");
        assert_eq!(content_preview("abcdef", 4), "abcd...");
    }
}