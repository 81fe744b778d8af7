pub mod errors;

use anyhow::{Context, Result};
use axum::{extract::{rejection::PathRejection, Path, State}, http::{HeaderMap, HeaderValue}, routing::{get, post}, Json, Router};
use bytes::Bytes;
use errors::AppError;
use jobrank_core::analysis::{PatternExtractor, ResumeAnalysis, ResumeAnalyzer};
use jobrank_core::{open_store, JobPosting, PostingStore, RecommendationIndex, ScoredPosting, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_n: Option<i64>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub jobs: Vec<ScoredPosting>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub num_postings: usize,
}

#[derive(Serialize)]
pub struct ResumeResponse {
    pub analysis: ResumeAnalysis,
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<RecommendationIndex>,
    pub store: Arc<dyn PostingStore>,
    pub resume: Arc<ResumeAnalyzer<PatternExtractor>>,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Load the index from `store`, seeding it first when empty.
    pub fn load(store: Arc<dyn PostingStore>, seed: &[JobPosting], admin_token: Option<String>) -> Result<Self> {
        let index = RecommendationIndex::load(store.as_ref(), seed).context("loading recommendation index")?;
        Ok(Self { index: Arc::new(index), store, resume: Arc::new(ResumeAnalyzer::new(PatternExtractor)), admin_token })
    }
}

/// Open the posting store, load the index once, and build the router.
pub fn build_app(store_uri: &str, seed: &[JobPosting]) -> Result<Router> {
    let store: Arc<dyn PostingStore> = Arc::from(open_store(store_uri).with_context(|| format!("opening posting store {store_uri}"))?);
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState::load(store, seed, admin_token)?;
    Ok(build_router(state).layer(cors_from_env()).layer(TraceLayer::new_for_http()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Json(serde_json::json!({ "message": "Welcome to the Job Recommendation API" })) }))
        .route("/health", get(|| async { "ok" }))
        .route("/api/jobs/search", post(search_handler))
        .route("/api/jobs/refresh", post(refresh_handler))
        .route("/api/jobs/:id", get(job_handler))
        .route("/api/resume/parse", post(resume_handler))
        .with_state(state)
}

// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_from_env() -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    if origins.is_empty() { base.allow_origin(Any) } else { base.allow_origin(AllowOrigin::list(origins)) }
}

pub async fn search_handler(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> Result<Json<SearchResponse>, AppError> {
    let top_n = match req.top_n {
        None => DEFAULT_TOP_N,
        Some(n) => usize::try_from(n)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| jobrank_core::MatchError::InvalidArgument(format!("top_n must be a positive integer, got {n}")))?,
    };
    let index = state.index.clone();
    let query = req.query;
    // ranking is CPU-bound; keep it off the async workers
    let jobs = tokio::task::spawn_blocking(move || index.recommend(&query, top_n))
        .await
        .context("recommend task panicked")??;
    Ok(Json(SearchResponse { jobs }))
}

pub async fn refresh_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<RefreshResponse>, AppError> {
    authorize(&state, &headers)?;
    let (index, store) = (state.index.clone(), state.store.clone());
    let num_postings = tokio::task::spawn_blocking(move || index.refresh(store.as_ref()))
        .await
        .context("refresh task panicked")??;
    Ok(Json(RefreshResponse { num_postings }))
}

pub async fn job_handler(State(state): State<AppState>, id: Result<Path<i64>, PathRejection>) -> Result<Json<JobPosting>, AppError> {
    let Path(id) = id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    state
        .index
        .snapshot()
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("job {id}")))
}

pub async fn resume_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<ResumeResponse>, AppError> {
    let text = String::from_utf8(body.to_vec())
        .map_err(|_| AppError::UnprocessableEntity("resume must be UTF-8 text".into()))?;
    Ok(Json(ResumeResponse { analysis: state.resume.analyze(&text) }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(AppError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required.as_str() {
        Ok(())
    } else {
        tracing::warn!("rejected admin request with invalid token");
        Err(AppError::Unauthorized("invalid admin token".into()))
    }
}
