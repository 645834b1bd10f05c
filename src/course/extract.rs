//! JSON extraction from free-form model output.

use serde_json::Value;

use crate::error::ExtractionError;

/// Extract the first balanced JSON object embedded in `text`.
///
/// Single left-to-right scan. The first `{` starts the candidate span; from
/// there string and escape state are tracked so braces and quotes inside
/// string literals do not affect nesting depth. When the depth returns to
/// zero the inclusive span is parsed. Tolerates leading prose, markdown
/// fences, and trailing commentary.
pub fn extract_json(text: &str) -> Result<Value, ExtractionError> {
    let mut start: Option<usize> = None;
    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escape_pending = false;

    for (pos, ch) in text.char_indices() {
        if escape_pending {
            escape_pending = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_pending = true,
            '"' if start.is_some() => in_string = !in_string,
            '{' if !in_string => {
                if start.is_none() {
                    start = Some(pos);
                }
                depth += 1;
            }
            '}' if !in_string => {
                if let Some(open) = start {
                    depth -= 1;
                    if depth == 0 {
                        let candidate = &text[open..=pos];
                        return serde_json::from_str(candidate).map_err(|source| {
                            ExtractionError::MalformedJson {
                                start: open,
                                end: pos,
                                source,
                            }
                        });
                    }
                }
            }
            _ => {}
        }
    }

    Err(ExtractionError::NoJsonFound)
}
