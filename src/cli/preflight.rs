//! Pre-flight checks before expensive operations.
//!
//! Catches missing configuration up front, before any model calls or
//! filesystem writes happen.

use crate::error::{LaereError, Result};

/// Operations with distinct requirements.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Generation drives the chat model.
    Generate,
    /// Indexing embeds chunks.
    Index,
    /// Search degrades to whatever origins are configured.
    Search,
}

impl Operation {
    /// Whether the operation calls OpenAI and therefore needs a key.
    fn requires_openai(self) -> bool {
        matches!(self, Operation::Generate | Operation::Index)
    }
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    if operation.requires_openai() {
        require_openai_key()?;
    }
    Ok(())
}

/// The key must be present and non-blank.
fn require_openai_key() -> Result<()> {
    let state = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => return Ok(()),
        Ok(_) => "is empty",
        Err(_) => "is not set",
    };

    Err(LaereError::Config(format!(
        "OPENAI_API_KEY {}. Set it with: export OPENAI_API_KEY='sk-...'",
        state
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_has_no_requirements() {
        assert!(check(Operation::Search).is_ok());
    }

    #[test]
    fn test_openai_requirement_by_operation() {
        assert!(Operation::Generate.requires_openai());
        assert!(Operation::Index.requires_openai());
        assert!(!Operation::Search.requires_openai());
    }
}