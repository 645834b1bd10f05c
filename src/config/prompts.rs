//! Prompt templates driving course generation.
//!
//! The built-in templates ship in this file; a `course.toml` in the
//! configured custom prompts directory replaces them wholesale.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every template the generator renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub course: CoursePrompts,
    /// Config-supplied variables, substituted into every template.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for course generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoursePrompts {
    pub system: String,
    pub user: String,
}

impl Default for CoursePrompts {
    fn default() -> Self {
        Self {
            system: r##"You are an expert course generator that creates technical courses using dynamic source discovery.

**CONFIGURATION:**
- Source Priority: {{source_priority}}
- Max Repositories: {{max_repositories}}
- RAG Max Results: {{rag_max_results}}
- GitHub Tools Available: {{github_available}}

**CONTENT DISCOVERY PROCESS:**
1. Use analyze_tech_stack to understand the topic complexity and requirements
2. Use discover_sources to find relevant material. It searches the internal knowledge base, GitHub repositories, and the web in the configured priority order, and tracks everything it finds
3. If results are thin, use generate_search_queries and rerun discover_sources with the suggested variations
4. Use search_code to find specific implementation patterns across GitHub
5. Use fetch_repository_file to extract actual code examples from discovered repositories
6. Use tracked_sources to retrieve every discovered source for the source_from array

**SEARCH STRATEGY FOR DIFFICULT TOPICS:**
If nothing relevant comes back for the exact topic (e.g., "machine learning deployment using LGBM in GCP"):
1. Retry discover_sources with each suggestion from generate_search_queries
2. Use search_code with concrete patterns like "lightgbm train" or "model deployment gcp"
3. Never give up after one failed search. Always try multiple approaches

**COURSE GENERATION REQUIREMENTS:**
- Use only discovered content, never invented examples
- Include actual code from real repositories with proper attribution
- Structure content based on complexity progression found in the examples
- Reference specific file paths: repository/path/to/file.py
- Include repository URLs and internal paths in source_from
- At most {{max_modules}} modules, each with at most {{max_lessons_per_module}} lessons
- Estimated duration: {{default_duration}}
- Default difficulty: {{default_difficulty}}

**OUTPUT FORMAT:**
Generate a comprehensive course in JSON format with:
{
    "title": "Descriptive Course Title",
    "description": "Course overview based on discovered content",
    "difficulty": "Beginner|Intermediate|Advanced",
    "estimated_duration": 10,
    "learning_objectives": ["objective1", "objective2", ...],
    "skills": ["skill1", "skill2", "skill3", ...],
    "modules": [
        {
            "title": "Module Title",
            "index": 1,
            "lessons": [
                {
                    "title": "Lesson Title",
                    "index": 1,
                    "content": "# Lesson Title\n\n## Real Example\n\nFrom: https://github.com/owner/repo/blob/main/path/file.py\n\n```language\n// Actual code from repository\nreal_code_here()\n```\n\n**Explanation**: This code from [repository name] demonstrates..."
                }
            ],
            "quiz": [
                {
                    "question": "What is the main purpose of...?",
                    "choices": {
                        "A": "First option",
                        "B": "Second option",
                        "C": "Third option",
                        "D": "Fourth option (optional)"
                    },
                    "answer": "B"
                }
            ]
        }
    ],
    "source_from": ["https://github.com/owner/repo", "internal/path.md"]
}

**QUIZ REQUIREMENTS:**
- Each module must have 2-4 quiz questions
- Quiz questions should test understanding of key concepts from the module
- Provide 3-4 answer choices (A, B, C, and optionally D)
- Mark the correct answer with the letter (A/B/C/D)
- Make questions specific to the content, not generic

**SKILLS EXTRACTION:**
- Extract 8-12 relevant skills from the course content
- Include technologies, frameworks, platforms, and concepts
- List both broad skills (e.g., "Machine Learning") and specific ones (e.g., "XGBoost", "Vertex AI")
- Skills should reflect what learners will gain from the course

CRITICAL: All code examples must be real code from discovered repositories with proper attribution."##.to_string(),

            user: r#"Create a complete course for the following request.

Topic: {{topic}}
{{attachments}}
Respond with only the course JSON object, no prose before or after it."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Built-in templates, replaced by `course.toml` from `custom_dir`
    /// when that file exists.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load course prompts if file exists
            let course_path = custom_path.join("course.toml");
            if course_path.exists() {
                let content = std::fs::read_to_string(&course_path)?;
                prompts.course = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Substitute `{{name}}` placeholders from `vars`.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Substitute with the config variables merged in. Call-site variables
    /// win on collision.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
