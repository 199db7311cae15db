// HTTP routes: generate, history, latest content, single job, health.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use newsangle_core::db::Database;
use newsangle_core::jobs;
use newsangle_core::model::{GenerationJob, JobSummary, Stance};
use newsangle_llm::client::LlmClient;
use newsangle_llm::generate::generate_content;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::ui;

const GENERATE_FAILED: &str = "Failed to generate content";
const HISTORY_FAILED: &str = "Failed to fetch history";
const CONTENT_FAILED: &str = "Failed to fetch content";

/// Shared handler state.
pub struct AppState {
    pub db: Database,
    pub llm: LlmClient,
}

impl AppState {
    pub fn new(db: Database, llm: LlmClient) -> Self {
        Self { db, llm }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ui::admin_page))
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/history", get(history))
        .route("/api/content", get(content))
        .route("/api/jobs/{id}", get(job_by_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub url: Option<String>,
    pub stance: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub job: GenerationJob,
}

/// Check `url` and `stance`, returning the trimmed URL and parsed stance.
fn validate_request(req: &GenerateRequest) -> Result<(String, Stance), ApiError> {
    let url = req
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: url"))?;

    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => return Err(ApiError::bad_request("Invalid url: expected an http(s) URL")),
    }

    let stance = req
        .stance
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: stance"))?
        .parse::<Stance>()
        .map_err(|_| ApiError::bad_request("Invalid stance: expected PRO or ANTI"))?;

    Ok((url.to_string(), stance))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(req) =
        payload.map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;
    let (url, stance) = validate_request(&req)?;

    let pairs = generate_content(&state.llm, &url, stance)
        .await
        .map_err(|e| ApiError::internal(GENERATE_FAILED, e))?;
    let job = GenerationJob::new(url, stance, pairs).map_err(|e| ApiError::internal(GENERATE_FAILED, e))?;
    jobs::save_job(&state.db, &job).map_err(|e| ApiError::internal(GENERATE_FAILED, e))?;

    info!(job_id = %job.id, source_url = %job.source_url, %stance, "generation job stored");
    Ok(Json(GenerateResponse { success: true, job }))
}

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub jobs: Vec<JobSummary>,
}

async fn history(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(params) =
        params.map_err(|_| ApiError::bad_request("Invalid limit: expected a non-negative integer"))?;
    let jobs = jobs::list_jobs(&state.db, params.limit).map_err(|e| ApiError::internal(HISTORY_FAILED, e))?;
    Ok(Json(HistoryResponse { jobs }))
}

async fn content(State(state): State<Arc<AppState>>) -> Result<Json<GenerationJob>, ApiError> {
    jobs::latest_job(&state.db)
        .map_err(|e| ApiError::internal(CONTENT_FAILED, e))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No content generated yet".to_string()))
}

async fn job_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GenerationJob>, ApiError> {
    jobs::get_job(&state.db, &id)
        .map_err(|e| ApiError::internal(CONTENT_FAILED, e))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {id}")))
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let count = jobs::job_count(&state.db).map_err(|e| ApiError::internal("Health check failed", e))?;
    let llm = if state.llm.is_active() { "configured" } else { "disabled" };
    Ok(Json(json!({
        "status": "ok",
        "jobs": count,
        "llm": llm,
    })))
}
