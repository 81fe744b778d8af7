use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jobrank_core::analysis::{PatternExtractor, ResumeAnalyzer};
use jobrank_core::store::MemoryStore;
use jobrank_core::{default_seed, JobPosting, MatchError, PostingStore, RecommendationIndex};
use serde_json::Value;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn app_with(store: Arc<MemoryStore>, admin_token: Option<&str>) -> Router {
    let state = server::AppState::load(store, &default_seed(), admin_token.map(str::to_string)).unwrap();
    server::build_router(state)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn search(body: &str) -> Request<Body> {
    Request::post("/api/jobs/search")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let app = app_with(Arc::new(MemoryStore::default()), None);
    let (status, json) = call(app, search(r#"{"query":"Python web development"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = json["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["id"].as_i64().unwrap(), 1);
    assert_eq!(jobs[0]["title"], "Software Engineer");
    assert_eq!(jobs[1]["id"].as_i64().unwrap(), 2);
}

#[tokio::test]
async fn top_n_limits_results() {
    let app = app_with(Arc::new(MemoryStore::default()), None);
    let (status, json) = call(app, search(r#"{"query":"data models","top_n":1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = json["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"].as_i64().unwrap(), 2);
}

#[tokio::test]
async fn non_positive_top_n_is_bad_request() {
    for top_n in [0, -3] {
        let app = app_with(Arc::new(MemoryStore::default()), None);
        let (status, json) = call(app, search(&format!(r#"{{"query":"python","top_n":{top_n}}}"#))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_ARGUMENT");
    }
}

#[tokio::test]
async fn refresh_requires_admin_token_and_picks_up_new_postings() {
    let store = Arc::new(MemoryStore::default());
    let app = app_with(store.clone(), Some("s3cret"));

    let denied = Request::post("/api/jobs/refresh").body(Body::empty()).unwrap();
    let (status, _) = call(app.clone(), denied).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    store.insert_many(&[JobPosting::new(3, "Rust Engineer", "Write async Rust services")]).unwrap();
    let allowed = Request::post("/api/jobs/refresh").header("X-ADMIN-TOKEN", "s3cret").body(Body::empty()).unwrap();
    let (status, json) = call(app.clone(), allowed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_postings"], 3);

    let (_, json) = call(app, search(r#"{"query":"async rust","top_n":1}"#)).await;
    assert_eq!(json["jobs"][0]["id"].as_i64().unwrap(), 3);
}

#[tokio::test]
async fn job_lookup_by_id() {
    let app = app_with(Arc::new(MemoryStore::default()), None);
    let (status, json) = call(app.clone(), Request::get("/api/jobs/2").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Data Scientist");

    let (status, _) = call(app, Request::get("/api/jobs/99").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resume_parse_reports_entities() {
    let app = app_with(Arc::new(MemoryStore::default()), None);
    let req = Request::post("/api/resume/parse")
        .body(Body::from("Contact: dev@example.com. Skilled in Rust and Docker."))
        .unwrap();
    let (status, json) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    let entities = json["analysis"]["entities"].as_array().unwrap();
    assert!(entities.iter().any(|e| e["label"] == "EMAIL" && e["span"] == "dev@example.com"));
    assert!(entities.iter().any(|e| e["label"] == "SKILL" && e["span"] == "docker"));

    let bad = Request::post("/api/resume/parse").body(Body::from(vec![0xff, 0xfe, 0x00])).unwrap();
    let (status, _) = call(app, bad).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn build_app_from_json_store_seeds_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.json");
    let app = server::build_app(&format!("json:{}", path.display()), &default_seed()).unwrap();
    assert!(path.exists());

    let (status, json) = call(app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Welcome to the Job Recommendation API");
}

#[tokio::test]
async fn non_numeric_job_id_uses_error_envelope() {
    let app = app_with(Arc::new(MemoryStore::default()), None);
    let (status, json) = call(app, Request::get("/api/jobs/abc").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn empty_corpus_is_conflict() {
    let state = server::AppState::load(Arc::new(MemoryStore::default()), &[], None).unwrap();
    let app = server::build_router(state);
    let (status, json) = call(app, search(r#"{"query":"python"}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "EMPTY_CORPUS");
}

/// Store that answers every call with the same failure.
struct BrokenStore(fn() -> MatchError);

impl PostingStore for BrokenStore {
    fn count(&self) -> jobrank_core::Result<usize> { Err((self.0)()) }
    fn insert_many(&self, _: &[JobPosting]) -> jobrank_core::Result<()> { Err((self.0)()) }
    fn fetch_all(&self) -> jobrank_core::Result<Vec<JobPosting>> { Err((self.0)()) }
}

fn app_over_broken(fail: fn() -> MatchError) -> Router {
    let state = server::AppState {
        index: Arc::new(RecommendationIndex::from_postings(default_seed())),
        store: Arc::new(BrokenStore(fail)),
        resume: Arc::new(ResumeAnalyzer::new(PatternExtractor)),
        admin_token: Some("s3cret".into()),
    };
    server::build_router(state)
}

fn refresh() -> Request<Body> {
    Request::post("/api/jobs/refresh").header("X-ADMIN-TOKEN", "s3cret").body(Body::empty()).unwrap()
}

#[tokio::test]
async fn unreachable_store_on_refresh_is_service_unavailable() {
    let app = app_over_broken(|| MatchError::connection("sled:/srv/jobs", "connection refused"));
    let (status, json) = call(app.clone(), refresh()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "STORE_UNREACHABLE");

    // the previous snapshot keeps serving
    let (status, json) = call(app, search(r#"{"query":"python"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["jobs"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn corrupt_store_on_refresh_is_internal_error() {
    let app = app_over_broken(|| MatchError::Store("corrupt posting record".into()));
    let (status, json) = call(app, refresh()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "STORE_ERROR");
}
