//! Tool definitions and implementations for the course agent.

use crate::course::Difficulty;
use crate::discovery::{DiscoveryOrchestrator, RepositorySource, SourcePriority, SourceTracker};
use crate::error::{LaereError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Cap on query variations handed back to the model.
const MAX_SEARCH_QUERIES: usize = 8;

/// Code search matches per tool call.
const CODE_SEARCH_RESULTS: usize = 10;

/// Topic keyword tables, checked in order with first match winning.
const TECH_CATEGORIES: [(&str, &[&str]); 5] = [
    (
        "machine_learning",
        &[
            "ml",
            "machine",
            "learning",
            "ai",
            "tensorflow",
            "pytorch",
            "xgboost",
            "sklearn",
            "merlin",
        ],
    ),
    (
        "cloud_computing",
        &[
            "cloud",
            "aws",
            "gcp",
            "azure",
            "kubernetes",
            "docker",
            "serverless",
        ],
    ),
    (
        "web_development",
        &[
            "web", "react", "vue", "angular", "flask", "django", "fastapi", "node",
        ],
    ),
    (
        "data_engineering",
        &["data", "pipeline", "etl", "spark", "airflow", "kafka"],
    ),
    (
        "devops",
        &["devops", "ci", "cd", "jenkins", "github", "actions", "deployment"],
    ),
];

const COMPLEXITY_INDICATORS: [(&str, &[&str]); 3] = [
    (
        "Advanced",
        &[
            "production",
            "scaling",
            "distributed",
            "optimization",
            "mlops",
            "enterprise",
        ],
    ),
    (
        "Beginner",
        &[
            "introduction",
            "basics",
            "getting",
            "started",
            "tutorial",
            "hello",
            "simple",
        ],
    ),
    (
        "Intermediate",
        &["deployment", "implementation", "building", "creating"],
    ),
];

const ML_FRAMEWORKS: [&str; 6] = [
    "lgbm",
    "lightgbm",
    "xgboost",
    "tensorflow",
    "pytorch",
    "sklearn",
];

const CLOUD_PLATFORMS: [&str; 4] = ["gcp", "google cloud", "aws", "azure"];

const ML_CONCEPTS: [&str; 4] = ["deployment", "machine learning", "model", "training"];

/// Available tools for the course agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Discover sources for a topic across all configured origins.
    DiscoverSources { topic: String },

    /// Categorize a topic and suggest a difficulty.
    AnalyzeTechStack { topic: String },

    /// Produce focused query variations for a topic.
    GenerateSearchQueries { topic: String },

    /// Fetch one file from a repository.
    FetchRepositoryFile { repository: String, path: String },

    /// Search code across public repositories.
    SearchCode { pattern: String },

    /// List every source tracked so far.
    TrackedSources,
}

/// Tool execution context with access to discovery and tracking.
pub struct ToolContext {
    pub orchestrator: Arc<DiscoveryOrchestrator>,
    pub tracker: Arc<SourceTracker>,
    pub repository: Arc<RepositorySource>,
    pub priority: SourcePriority,
    pub default_difficulty: Difficulty,
    pub default_duration: String,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(
        orchestrator: Arc<DiscoveryOrchestrator>,
        tracker: Arc<SourceTracker>,
        repository: Arc<RepositorySource>,
        priority: SourcePriority,
        default_difficulty: Difficulty,
        default_duration: String,
    ) -> Self {
        Self {
            orchestrator,
            tracker,
            repository,
            priority,
            default_difficulty,
            default_duration,
        }
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::DiscoverSources { topic } => self.execute_discover(topic).await,
            ToolCall::AnalyzeTechStack { topic } => Ok(self.execute_analyze(topic)),
            ToolCall::GenerateSearchQueries { topic } => Ok(self.execute_generate_queries(topic)),
            ToolCall::FetchRepositoryFile { repository, path } => {
                self.execute_fetch_file(repository, path).await
            }
            ToolCall::SearchCode { pattern } => self.execute_search_code(pattern).await,
            ToolCall::TrackedSources => Ok(self.execute_tracked_sources()),
        }
    }

    async fn execute_discover(&self, topic: &str) -> Result<String> {
        let sources = self.orchestrator.discover(topic, self.priority).await?;
        self.tracker.record_all(&sources);

        if sources.is_empty() {
            return Ok(format!(
                "No sources found for '{topic}'. Try generate_search_queries for variations."
            ));
        }

        let formatted = sources
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "{}. [{}] {} (relevance {:.2})\n   {}\n   {}",
                    i + 1,
                    s.origin,
                    s.title,
                    s.relevance_score,
                    s.uri,
                    s.snippet
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(format!("Found {} sources:\n\n{}", sources.len(), formatted))
    }

    fn execute_analyze(&self, topic: &str) -> String {
        let lowered = topic.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        let category = detect_category(&words);
        let complexity = detect_complexity(&lowered)
            .map(str::to_string)
            .unwrap_or_else(|| self.default_difficulty.to_string());

        let primary = words.first().copied().unwrap_or("unknown");
        let related = if words.len() > 1 {
            words[1..].join(", ")
        } else {
            "none".to_string()
        };

        format!(
            "Technology analysis for \"{topic}\":\n\
             - Primary technology: {primary}\n\
             - Category: {category}\n\
             - Suggested difficulty: {complexity}\n\
             - Related terms: {related}\n\
             - Suggested duration: {}",
            self.default_duration
        )
    }

    fn execute_generate_queries(&self, topic: &str) -> String {
        let (queries, components) = build_search_queries(topic);

        let formatted = queries
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q))
            .collect::<Vec<_>>()
            .join("\n");

        let components = if components.is_empty() {
            "none".to_string()
        } else {
            components.join(", ")
        };

        format!("Search queries for \"{topic}\":\n{formatted}\n\nComponents found: {components}")
    }

    async fn execute_fetch_file(&self, repository: &str, path: &str) -> Result<String> {
        let content = self.repository.fetch_file(repository, path).await?;

        if content.trim().is_empty() {
            return Ok(format!("{path} in {repository} is empty."));
        }

        Ok(format!("Contents of {path} from {repository}:\n\n{content}"))
    }

    async fn execute_search_code(&self, pattern: &str) -> Result<String> {
        let matches = self
            .repository
            .search_code(pattern, CODE_SEARCH_RESULTS)
            .await?;

        if matches.is_empty() {
            return Ok(format!("No code found matching '{pattern}'."));
        }

        let formatted = matches
            .iter()
            .enumerate()
            .map(|(i, m)| format!("{}. {} in {}\n   {}", i + 1, m.path, m.repository, m.url))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(format!(
            "Found {} matching files:\n\n{}",
            matches.len(),
            formatted
        ))
    }

    fn execute_tracked_sources(&self) -> String {
        let uris = self.tracker.uris();

        if uris.is_empty() {
            return "No sources tracked yet. Run discover_sources first.".to_string();
        }

        let formatted = uris
            .iter()
            .map(|uri| format!("- {uri}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!("Tracked sources ({}):\n\n{}", uris.len(), formatted)
    }
}

/// Pick a category by exact word membership, first table entry winning.
fn detect_category(words: &[&str]) -> &'static str {
    for (category, keywords) in TECH_CATEGORIES {
        if keywords.iter().any(|keyword| words.contains(keyword)) {
            return category;
        }
    }
    "software_development"
}

/// Pick a difficulty by substring match on the lowered topic.
fn detect_complexity(topic_lower: &str) -> Option<&'static str> {
    for (level, indicators) in COMPLEXITY_INDICATORS {
        if indicators
            .iter()
            .any(|indicator| topic_lower.contains(indicator))
        {
            return Some(level);
        }
    }
    None
}

/// Expand a topic into deduplicated query variations plus the components found.
fn build_search_queries(topic: &str) -> (Vec<String>, Vec<String>) {
    let lowered = topic.to_lowercase();

    let mut queries = vec![topic.to_string()];
    let mut components: Vec<String> = Vec::new();

    for framework in ML_FRAMEWORKS {
        if lowered.contains(framework) {
            components.push(framework.to_string());
            queries.push(format!("{framework} tutorial"));
            queries.push(format!("{framework} deployment"));
        }
    }

    for platform in CLOUD_PLATFORMS {
        let collapsed = platform.replace(' ', "");
        if lowered.contains(platform) || lowered.contains(&collapsed) {
            components.push(platform.to_string());
            queries.push(format!("machine learning {platform}"));
            queries.push(format!("ml deployment {platform}"));
        }
    }

    for concept in ML_CONCEPTS {
        if lowered.contains(concept) {
            components.push(concept.to_string());
        }
    }

    if components.len() >= 2 {
        queries.push(format!("{} {}", components[0], components[1]));
    }

    queries.push("machine learning deployment".to_string());
    queries.push("ml model deployment".to_string());
    queries.push("mlops tutorial".to_string());

    let mut seen = HashSet::new();
    queries.retain(|query| seen.insert(query.clone()));
    queries.truncate(MAX_SEARCH_QUERIES);

    (queries, components)
}

/// Get OpenAI function/tool definitions for the course agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "discover_sources".to_string(),
                description: Some(
                    "Discover learning sources for a topic across the internal knowledge base, \
                    GitHub repositories, and web search. Results are tracked automatically. \
                    Use this first for any course topic."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "topic": {
                            "type": "string",
                            "description": "The course topic to find sources for"
                        }
                    },
                    "required": ["topic"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "analyze_tech_stack".to_string(),
                description: Some(
                    "Analyze the technology stack and complexity of a topic. \
                    Use this to pick a category and difficulty before structuring the course."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "topic": {
                            "type": "string",
                            "description": "The course topic to analyze"
                        }
                    },
                    "required": ["topic"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "generate_search_queries".to_string(),
                description: Some(
                    "Generate focused search query variations for a topic. \
                    Use these with discover_sources when a first pass returns too little."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "topic": {
                            "type": "string",
                            "description": "The course topic to expand into queries"
                        }
                    },
                    "required": ["topic"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "fetch_repository_file".to_string(),
                description: Some(
                    "Fetch one file from a GitHub repository, such as a README or example. \
                    Use this to pull concrete content from discovered repositories."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "repository": {
                            "type": "string",
                            "description": "Repository as owner/name or a GitHub URL"
                        },
                        "path": {
                            "type": "string",
                            "description": "File path inside the repository"
                        }
                    },
                    "required": ["repository", "path"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "search_code".to_string(),
                description: Some(
                    "Search code across public GitHub repositories. \
                    Use this to find implementation examples for a specific API or pattern."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "pattern": {
                            "type": "string",
                            "description": "The code search query"
                        }
                    },
                    "required": ["pattern"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "tracked_sources".to_string(),
                description: Some(
                    "List every source tracked during this run. \
                    Use this before writing the final course to fill in source_from."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {}
                })),
                strict: None,
            },
        },
    ]
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| LaereError::Agent(format!("Invalid tool arguments: {}", e)))?;

    match name {
        "discover_sources" => {
            let topic = args["topic"]
                .as_str()
                .ok_or_else(|| LaereError::Agent("Missing 'topic' argument".to_string()))?
                .to_string();
            Ok(ToolCall::DiscoverSources { topic })
        }
        "analyze_tech_stack" => {
            let topic = args["topic"]
                .as_str()
                .ok_or_else(|| LaereError::Agent("Missing 'topic' argument".to_string()))?
                .to_string();
            Ok(ToolCall::AnalyzeTechStack { topic })
        }
        "generate_search_queries" => {
            let topic = args["topic"]
                .as_str()
                .ok_or_else(|| LaereError::Agent("Missing 'topic' argument".to_string()))?
                .to_string();
            Ok(ToolCall::GenerateSearchQueries { topic })
        }
        "fetch_repository_file" => {
            let repository = args["repository"]
                .as_str()
                .ok_or_else(|| LaereError::Agent("Missing 'repository' argument".to_string()))?
                .to_string();
            let path = args["path"]
                .as_str()
                .ok_or_else(|| LaereError::Agent("Missing 'path' argument".to_string()))?
                .to_string();
            Ok(ToolCall::FetchRepositoryFile { repository, path })
        }
        "search_code" => {
            let pattern = args["pattern"]
                .as_str()
                .ok_or_else(|| LaereError::Agent("Missing 'pattern' argument".to_string()))?
                .to_string();
            Ok(ToolCall::SearchCode { pattern })
        }
        "tracked_sources" => Ok(ToolCall::TrackedSources),
        _ => Err(LaereError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discover_tool() {
        let tool = parse_tool_call("discover_sources", r#"{"topic": "rust async"}"#).unwrap();
        match tool {
            ToolCall::DiscoverSources { topic } => assert_eq!(topic, "rust async"),
            _ => panic!("Expected DiscoverSources tool"),
        }
    }

    #[test]
    fn test_parse_fetch_file_tool() {
        let tool = parse_tool_call(
            "fetch_repository_file",
            r#"{"repository": "rust-lang/book", "path": "README.md"}"#,
        )
        .unwrap();
        match tool {
            ToolCall::FetchRepositoryFile { repository, path } => {
                assert_eq!(repository, "rust-lang/book");
                assert_eq!(path, "README.md");
            }
            _ => panic!("Expected FetchRepositoryFile tool"),
        }
    }

    #[test]
    fn test_parse_missing_argument() {
        let result = parse_tool_call("fetch_repository_file", r#"{"repository": "a/b"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_unknown_tool() {
        let result = parse_tool_call("delete_everything", "{}");
        assert!(result.is_err());
    }

    #[test]
    fn test_detect_category_first_match_wins() {
        assert_eq!(
            detect_category(&["xgboost", "deployment", "pipeline"]),
            "machine_learning"
        );
        assert_eq!(detect_category(&["deployment"]), "devops");
        assert_eq!(detect_category(&["sourdough", "baking"]), "software_development");
    }

    #[test]
    fn test_detect_complexity() {
        assert_eq!(detect_complexity("production scaling tips"), Some("Advanced"));
        assert_eq!(detect_complexity("getting started with rust"), Some("Beginner"));
        assert_eq!(detect_complexity("building a web service"), Some("Intermediate"));
        assert_eq!(detect_complexity("quantum chromodynamics"), None);
    }

    #[test]
    fn test_build_search_queries_expands_components() {
        let (queries, components) = build_search_queries("XGBoost deployment on GCP");

        assert_eq!(components, vec!["xgboost", "gcp", "deployment"]);
        assert_eq!(queries.len(), MAX_SEARCH_QUERIES);
        assert_eq!(queries[0], "XGBoost deployment on GCP");
        assert!(queries.contains(&"xgboost tutorial".to_string()));
        assert!(queries.contains(&"machine learning gcp".to_string()));
        assert!(queries.contains(&"xgboost gcp".to_string()));
    }

    #[test]
    fn test_build_search_queries_plain_topic() {
        let (queries, components) = build_search_queries("medieval history");

        assert!(components.is_empty());
        assert_eq!(
            queries,
            vec![
                "medieval history".to_string(),
                "machine learning deployment".to_string(),
                "ml model deployment".to_string(),
                "mlops tutorial".to_string(),
            ]
        );
    }
}
