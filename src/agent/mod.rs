//! Agent system for course generation with tool calling.
//!
//! Provides an LLM agent that drives source discovery through tools and
//! produces the course draft consumed by extraction and normalization.

mod events;
mod runner;
mod tools;

pub use events::{collect_text, TurnEvent};
pub use runner::{CourseAgent, TurnOutcome};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext};
