//! GitHub repository search as a discovery origin.
//!
//! Talks to the GitHub REST API directly with a per-request token. Besides
//! the [`SearchSource`] implementation this exposes the two repository
//! extraction calls the agent tools use: fetching a file and searching code.

use async_trait::async_trait;
use regex::Regex;
use reqwest::header;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::discovery::{
    DiscoveredSource, SearchQuery, SearchSource, SourceOrigin, DEFAULT_UNSCORED_RELEVANCE,
};
use crate::error::{LaereError, Result};

const GITHUB_API_BASE: &str = "https://api.github.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bound on file content returned to the agent.
const MAX_FILE_CHARS: usize = 10_000;

/// Discovery origin backed by GitHub repository search.
pub struct RepositorySource {
    http: reqwest::Client,
    token: Option<String>,
    base_url: String,
    max_repositories: usize,
    repo_ref_regex: Regex,
}

impl RepositorySource {
    /// Create a repository source with an optional access token.
    pub fn new(token: Option<String>, max_repositories: usize) -> Self {
        Self::with_base_url(token, max_repositories, GITHUB_API_BASE)
    }

    /// Create a repository source against a custom API base URL.
    pub fn with_base_url(
        token: Option<String>,
        max_repositories: usize,
        base_url: &str,
    ) -> Self {
        // Matches full GitHub URLs and bare owner/repo slugs
        let repo_ref_regex = Regex::new(
            r"(?x)
            (?:
                # Full GitHub URLs
                (?:https?://)?
                (?:www\.)?
                github\.com[:/]
                ([A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9][A-Za-z0-9_.-]*)
            )
            |
            # Bare owner/repo slug
            ^([A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9][A-Za-z0-9_.-]*)$
        ",
        )
        .expect("Invalid regex");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("laere")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_repositories: max_repositories.max(1),
            repo_ref_regex,
        }
    }

    /// Extract an `owner/repo` slug from a URL or bare reference.
    pub fn extract_repo_ref(&self, input: &str) -> Option<String> {
        let caps = self.repo_ref_regex.captures(input.trim())?;

        // Try group 1 (URL format) then group 2 (bare slug)
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim_end_matches(".git").to_string())
    }

    fn get(&self, url: &str, accept: &'static str) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url).header(header::ACCEPT, accept);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Fetch one file's contents from a repository, capped in length.
    pub async fn fetch_file(&self, repository: &str, path: &str) -> Result<String> {
        let repo = self.extract_repo_ref(repository).ok_or_else(|| {
            LaereError::InvalidInput(format!(
                "Not a recognizable repository reference: {repository}"
            ))
        })?;

        let url = format!(
            "{}/repos/{}/contents/{}",
            self.base_url,
            repo,
            path.trim_start_matches('/')
        );

        let response = self.get(&url, "application/vnd.github.raw").send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(LaereError::SourceSearch(format!(
                "Fetching {path} from {repo} returned {status}"
            )));
        }

        Ok(cap_chars(&response.text().await?, MAX_FILE_CHARS))
    }

    /// Search code across repositories.
    pub async fn search_code(&self, pattern: &str, max_results: usize) -> Result<Vec<CodeMatch>> {
        let url = format!("{}/search/code", self.base_url);
        let response = self
            .get(&url, "application/vnd.github+json")
            .query(&[
                ("q", pattern.to_string()),
                ("per_page", max_results.max(1).to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LaereError::SourceSearch(format!(
                "Code search returned {status}: {body}"
            )));
        }

        let parsed: CodeSearchResponse = response.json().await?;
        Ok(parsed
            .items
            .into_iter()
            .take(max_results)
            .map(|item| CodeMatch {
                repository: item.repository.full_name,
                path: item.path,
                url: item.html_url,
            })
            .collect())
    }
}

#[async_trait]
impl SearchSource for RepositorySource {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Repository
    }

    fn is_available(&self) -> bool {
        self.token.is_some()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<DiscoveredSource>> {
        let per_page = query.max_results.min(self.max_repositories).max(1);
        let url = format!("{}/search/repositories", self.base_url);

        let response = self
            .get(&url, "application/vnd.github+json")
            .query(&[
                ("q", query.query.clone()),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LaereError::SourceSearch(format!(
                "Repository search returned {status}: {body}"
            )));
        }

        let parsed: RepoSearchResponse = response.json().await?;
        debug!("Repository search returned {} items", parsed.items.len());

        Ok(parsed
            .items
            .iter()
            .take(per_page)
            .map(repo_to_source)
            .collect())
    }
}

/// One code search hit.
#[derive(Debug, Clone)]
pub struct CodeMatch {
    pub repository: String,
    pub path: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct RepoSearchResponse {
    #[serde(default)]
    items: Vec<RepoItem>,
}

#[derive(Debug, Deserialize)]
struct RepoItem {
    full_name: String,
    html_url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct CodeSearchResponse {
    #[serde(default)]
    items: Vec<CodeItem>,
}

#[derive(Debug, Deserialize)]
struct CodeItem {
    path: String,
    html_url: String,
    repository: CodeItemRepo,
}

#[derive(Debug, Deserialize)]
struct CodeItemRepo {
    full_name: String,
}

/// Repositories carry no similarity score, so every result gets the
/// deterministic default relevance.
fn repo_to_source(item: &RepoItem) -> DiscoveredSource {
    let mut snippet = item.description.clone().unwrap_or_default();
    if let Some(language) = &item.language {
        if !snippet.is_empty() {
            snippet.push(' ');
        }
        snippet.push_str(&format!("[{}, {} stars]", language, item.stargazers_count));
    }

    DiscoveredSource::new(
        item.html_url.clone(),
        item.full_name.clone(),
        snippet,
        SourceOrigin::Repository,
        DEFAULT_UNSCORED_RELEVANCE,
    )
}

fn cap_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut capped: String = text.chars().take(max_chars).collect();
        capped.push_str("\n[truncated]");
        capped
    }
}
