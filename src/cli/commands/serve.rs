//! HTTP API server for course generation.
//!
//! Exposes the generation pipeline to other systems, with errors reported
//! as `{"detail": ...}` bodies.

use crate::cli::Output;
use crate::config::Settings;
use crate::discovery::SourcePriority;
use crate::error::{LaereError, TurnError};
use crate::generator::{CourseGenerator, GenerateRequest};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    generator: CourseGenerator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let generator = CourseGenerator::new(settings)?;

    let state = Arc::new(AppState { generator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root))
        .route("/course/generate", post(generate_course))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Laere API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Liveness", "GET  /");
    Output::kv("Generate", "POST /course/generate");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct CourseRequest {
    /// What the course should teach
    prompt: String,
    /// GitHub token for repository discovery
    #[serde(default)]
    token_github: String,
    /// Drive token, accepted from callers that send one
    #[serde(default)]
    token_drive: String,
    /// Location of supplementary files
    #[serde(default)]
    files_url: String,
    /// Optional source priority override
    #[serde(default)]
    priority: Option<SourcePriority>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Course generator API is running"
    }))
}

async fn generate_course(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CourseRequest>,
) -> impl IntoResponse {
    let request = GenerateRequest {
        prompt: req.prompt,
        github_token: none_if_empty(req.token_github),
        drive_token: none_if_empty(req.token_drive),
        files_url: none_if_empty(req.files_url),
        priority: req.priority,
    };

    match state.generator.generate(&request).await {
        Ok(course) => Json(course).into_response(),
        Err(e) => {
            let (status, detail) = error_status(&e);
            (status, Json(ErrorResponse { detail })).into_response()
        }
    }
}

/// Treat empty and blank request fields as absent.
fn none_if_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Map a pipeline error to an HTTP status and response detail.
///
/// Failures of the upstream model and of discovery are gateway errors;
/// invalid course output is our own failure and names the offending field.
fn error_status(err: &LaereError) -> (StatusCode, String) {
    match err {
        LaereError::Extraction(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        LaereError::Normalization(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Invalid course output in field '{}': {}", e.field(), e),
        ),
        LaereError::Discovery(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        LaereError::Turn(TurnError::Timeout { .. }) => {
            (StatusCode::GATEWAY_TIMEOUT, err.to_string())
        }
        LaereError::Turn(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        LaereError::InvalidInput(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DiscoveryError, ExtractionError, NormalizationError};

    #[test]
    fn test_upstream_failures_are_gateway_errors() {
        let (status, _) = error_status(&LaereError::Extraction(ExtractionError::NoJsonFound));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = error_status(&LaereError::Discovery(DiscoveryError::AllOriginsFailed {
            detail: "internal: down; repository: down; web: down".to_string(),
        }));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = error_status(&LaereError::Turn(TurnError::EmptyResponse));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = error_status(&LaereError::Turn(TurnError::Upstream {
            detail: "rate limited".to_string(),
        }));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        let (status, detail) =
            error_status(&LaereError::Turn(TurnError::Timeout { limit_secs: 300 }));
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(detail.contains("300"));
    }

    #[test]
    fn test_normalization_failure_names_the_field() {
        let (status, detail) = error_status(&LaereError::Normalization(
            NormalizationError::MissingField("title"),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(detail.contains("'title'"));
    }

    #[test]
    fn test_invalid_input_is_bad_request() {
        let (status, detail) = error_status(&LaereError::InvalidInput(
            "Course prompt is empty".to_string(),
        ));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail, "Course prompt is empty");
    }

    #[test]
    fn test_remaining_errors_are_internal() {
        let (status, _) = error_status(&LaereError::Config("bad config".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = error_status(&LaereError::Agent("iterations exhausted".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_none_if_empty() {
        assert_eq!(none_if_empty(String::new()), None);
        assert_eq!(none_if_empty("   ".to_string()), None);
        assert_eq!(
            none_if_empty(" ghp_example ".to_string()),
            Some("ghp_example".to_string())
        );
    }
}
