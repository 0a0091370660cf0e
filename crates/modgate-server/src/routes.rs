//! HTTP routes and handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use modgate_core::{Classification, Error};
use modgate_pipeline::{Submission, SubmissionPayload};
use modgate_store::{overall_summary, submitter_summary};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/v1/moderate/text", post(moderate_text))
        .route("/api/v1/moderate/image", post(moderate_image))
        .route("/api/v1/analytics/summary", get(analytics_summary))
        .route("/api/v1/analytics/summary/all", get(analytics_summary_all))
        .fallback(fallback)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Health and metrics
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "metrics exporter not installed" })),
        )
            .into_response(),
    }
}

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "no such route" })),
    )
}

// ============================================================================
// Moderation endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TextModerationRequest {
    pub email: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageModerationRequest {
    pub email: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModerationResponse {
    pub success: bool,
    pub request_id: String,
    pub classification: Classification,
    pub confidence: f64,
    pub reasoning: String,
    pub message: String,
}

async fn moderate_text(
    State(state): State<AppState>,
    Json(request): Json<TextModerationRequest>,
) -> Result<Json<ModerationResponse>, ApiError> {
    validate_email(&request.email)?;

    let outcome = state
        .orchestrator
        .submit(Submission::text(request.email, request.text))
        .await?;

    Ok(Json(moderation_response(outcome)))
}

async fn moderate_image(
    State(state): State<AppState>,
    Json(request): Json<ImageModerationRequest>,
) -> Result<Json<ModerationResponse>, ApiError> {
    validate_email(&request.email)?;

    let payload = match (request.image_url, request.image_base64) {
        (Some(url), None) => {
            let (bytes, mime) = state.fetcher.fetch_url(&url).await?;
            SubmissionPayload::ImageUrl { url, bytes, mime }
        }
        (None, Some(encoded)) => {
            let (bytes, mime) = state.fetcher.decode_inline(&encoded)?;
            SubmissionPayload::ImageInline { bytes, mime }
        }
        _ => {
            return Err(Error::invalid_input(
                "exactly one of image_url or image_base64 must be provided",
            )
            .into())
        }
    };

    let outcome = state
        .orchestrator
        .submit(Submission {
            submitter: request.email,
            payload,
        })
        .await?;

    Ok(Json(moderation_response(outcome)))
}

fn moderation_response(outcome: modgate_pipeline::Outcome) -> ModerationResponse {
    let message = if outcome.cached {
        "Content analyzed successfully (cached result)"
    } else {
        "Content analyzed successfully"
    };

    ModerationResponse {
        success: true,
        request_id: outcome.request_id,
        classification: outcome.verdict.classification,
        confidence: outcome.verdict.confidence,
        reasoning: outcome.verdict.reasoning,
        message: message.to_string(),
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(Error::invalid_input("email must be a valid address").into());
    }
    Ok(())
}

// ============================================================================
// Analytics endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub user: String,
}

async fn analytics_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, ApiError> {
    let summary = submitter_summary(state.store.as_ref(), &query.user).await?;
    let message = if summary.total_requests == 0 {
        "No moderation requests found for this user"
    } else {
        "Analytics summary retrieved successfully"
    };
    Ok(Json(json!({
        "success": true,
        "data": summary,
        "message": message,
    }))
    .into_response())
}

async fn analytics_summary_all(State(state): State<AppState>) -> Result<Response, ApiError> {
    let overall = overall_summary(state.store.as_ref()).await?;
    Ok(Json(json!({
        "success": true,
        "overall_stats": overall.stats,
        "user_analytics": overall.submitters,
        "message": "All users analytics summary retrieved successfully",
    }))
    .into_response())
}

// ============================================================================
// Error mapping
// ============================================================================

/// Wraps pipeline errors for HTTP responses.
///
/// Callers get a generic message plus the stable error code; the full
/// error detail goes to the logs only.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidInput(_) | Error::InvalidContent(_) => StatusCode::BAD_REQUEST,
            Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::Store(_) | Error::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        if self.0.is_caller_error() {
            "The submitted content could not be accepted"
        } else {
            "Failed to analyze the submitted content"
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(code = self.0.code(), "{}", self.0);

        (
            self.status(),
            Json(json!({
                "success": false,
                "error": self.0.code(),
                "message": self.message(),
            })),
        )
            .into_response()
    }
}
