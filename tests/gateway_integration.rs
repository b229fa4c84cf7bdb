//! End-to-end routing tests for the anonymous capture/replay gateway

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use warcgate::gateway::dispatch::{BackendHosts, UpstreamSpec};
use warcgate::gateway::renderer::{ContentRenderer, TopFrameParams};
use warcgate::gateway::session::{AnonSession, Session, SessionProvider};
use warcgate::gateway::store::{InMemoryStore, RecordingStore};
use warcgate::gateway::types::{GatewayResult, ResolvedRequest};
use warcgate::gateway::GatewayService;

const USER: &str = "anon/testuser";

/// Renderer double that reports the resolved tuple as JSON.
struct StubRenderer;

#[async_trait]
impl ContentRenderer for StubRenderer {
    async fn render_resolved(
        &self,
        resolved: &ResolvedRequest,
        _upstream: &UpstreamSpec,
        frame: Option<TopFrameParams>,
    ) -> GatewayResult<Response<Body>> {
        let body = json!({
            "mode": resolved.mode.to_string(),
            "user": resolved.user.as_ref(),
            "coll": resolved.coll,
            "rec": resolved.rec.as_str(),
            "wb_url": resolved.wb_url,
            "closest": resolved.closest,
            "frame_mode": frame.map(|f| f.curr_mode.to_string()),
        });
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?)
    }
}

/// Session provider pinned to one identity so user paths are predictable.
struct FixedSessionProvider(Arc<AnonSession>);

impl FixedSessionProvider {
    fn new() -> Self {
        Self(Arc::new(AnonSession::with_id("@anon-testuser")))
    }
}

impl SessionProvider for FixedSessionProvider {
    fn session(&self, _headers: &axum::http::HeaderMap) -> Arc<dyn Session> {
        Arc::clone(&self.0) as Arc<dyn Session>
    }
}

fn hosts(record: &str, replay: &str) -> BackendHosts {
    BackendHosts {
        record: record.to_string(),
        replay: replay.to_string(),
    }
}

fn app_with(store: Arc<InMemoryStore>, backends: BackendHosts) -> Router {
    GatewayService::new(backends, Duration::from_secs(5))
        .with_store(store)
        .with_sessions(Arc::new(FixedSessionProvider::new()))
        .with_renderer(Arc::new(StubRenderer))
        .into_router()
}

fn app(store: Arc<InMemoryStore>) -> Router {
    app_with(
        store,
        hosts("http://record.invalid", "http://replay.invalid"),
    )
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_endpoint_responds() {
    let response = app(Arc::new(InMemoryStore::new()))
        .oneshot(get_request("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn bare_record_redirects_to_default_recording() {
    let response = app(Arc::new(InMemoryStore::new()))
        .oneshot(get_request("/record/https://example.com/?q=1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/anonymous/my-recording/record/https://example.com/?q=1"
    );
}

#[tokio::test]
async fn bare_replay_redirects_to_anonymous() {
    let response = app(Arc::new(InMemoryStore::new()))
        .oneshot(get_request("/replay/https://example.com/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/anonymous/https://example.com/"
    );
}

#[tokio::test]
async fn live_passes_through_without_provisioning() {
    let store = Arc::new(InMemoryStore::new());
    let response = app(Arc::clone(&store))
        .oneshot(get_request("/live/https://example.com/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mode"], "live");
    assert_eq!(body["wb_url"], "https://example.com/");
    assert_eq!(body["frame_mode"], Value::Null);
    assert!(!store.has_collection(USER, "anonymous").await);
}

// Scenario A: first record request with an unsanitized title provisions the
// resources and redirects to the canonical path.
#[tokio::test]
async fn first_record_request_provisions_and_redirects() {
    let store = Arc::new(InMemoryStore::new());
    let response = app(Arc::clone(&store))
        .oneshot(get_request(
            "/anonymous/My%20Recording!/record/https://example.com/",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/anonymous/my-recording/record/https://example.com/"
    );

    assert!(store.has_collection(USER, "anonymous").await);
    let info = store
        .get_recording(USER, "anonymous", "my-recording")
        .await
        .unwrap();
    assert_eq!(info.title, "My Recording!");
}

// Scenario B: a pre-existing recording records without redirecting.
#[tokio::test]
async fn record_to_existing_recording_renders_directly() {
    let store = Arc::new(InMemoryStore::new());
    store
        .create_recording(USER, "anonymous", "my-recording", "my-recording")
        .await
        .unwrap();

    let response = app(Arc::clone(&store))
        .oneshot(get_request(
            "/anonymous/my-recording/record/https://example.com/",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mode"], "record");
    assert_eq!(body["rec"], "my-recording");
    assert_eq!(body["user"], USER);
    assert_eq!(body["wb_url"], "https://example.com/");
    assert_eq!(body["frame_mode"], "record");
}

// No redirect loop: following the scenario A redirect resolves cleanly.
#[tokio::test]
async fn redirect_target_resolves_without_further_redirects() {
    let store = Arc::new(InMemoryStore::new());

    let first = app(Arc::clone(&store))
        .oneshot(get_request(
            "/anonymous/My%20Recording!/record/https://example.com/",
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::FOUND);
    let location = first
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let second = app(Arc::clone(&store))
        .oneshot(get_request(&location))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
}

// Scenario C: a URL-shaped path with no recording segment is
// whole-collection replay.
#[tokio::test]
async fn url_shaped_path_is_collection_replay() {
    let response = app(Arc::new(InMemoryStore::new()))
        .oneshot(get_request("/anonymous/https://example.com/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mode"], "replay-coll");
    assert_eq!(body["rec"], "*");
    assert_eq!(body["wb_url"], "https://example.com/");
    assert_eq!(body["closest"], "now");
}

#[tokio::test]
async fn timestamped_replay_carries_closest_hint() {
    let response = app(Arc::new(InMemoryStore::new()))
        .oneshot(get_request("/anonymous/2016/https://example.com/"))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["mode"], "replay-coll");
    assert_eq!(body["closest"], "2016");
}

// Scenario D: replay of an unknown recording is a 404 and never creates.
#[tokio::test]
async fn replay_of_missing_recording_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let response = app(Arc::clone(&store))
        .oneshot(get_request("/anonymous/missing-rec/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "No Such Recording");
    assert_eq!(body["id"], "missing-rec");

    assert!(!store.has_recording(USER, "anonymous", "missing-rec").await);
}

#[tokio::test]
async fn replay_of_existing_recording_resolves() {
    let store = Arc::new(InMemoryStore::new());
    store
        .create_recording(USER, "anonymous", "rec1", "Test")
        .await
        .unwrap();

    let response = app(Arc::clone(&store))
        .oneshot(get_request("/anonymous/rec1/https://example.com/page"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mode"], "replay");
    assert_eq!(body["rec"], "rec1");
    assert_eq!(body["wb_url"], "https://example.com/page");
}

// Scenario E: a successful export streams the backend body byte-identical
// with the computed attachment filename.
#[tokio::test]
async fn recording_download_streams_backend_body() {
    let backend = Router::new().route(
        "/download",
        get(|| async {
            Response::builder()
                .status(StatusCode::OK)
                .header("content-length", "10")
                .body(Body::from("warc-bytes"))
                .unwrap()
        }),
    );
    let record_host = spawn_backend(backend).await;

    let store = Arc::new(InMemoryStore::new());
    store
        .create_recording(USER, "anonymous", "rec1", "Test")
        .await
        .unwrap();

    let response = app_with(
        Arc::clone(&store),
        hosts(&record_host, "http://replay.invalid"),
    )
    .oneshot(get_request("/anonymous/rec1/download"))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );
    assert_eq!(response.headers().get("content-length").unwrap(), "10");

    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=Test-"));
    assert!(disposition.ends_with(".warc.gz"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"warc-bytes");
}

#[tokio::test]
async fn download_of_missing_recording_is_not_found() {
    let response = app(Arc::new(InMemoryStore::new()))
        .oneshot(get_request("/anonymous/rec1/download"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Recording not found");
    assert_eq!(body["id"], "rec1");
}

#[tokio::test]
async fn collection_download_requires_existing_collection() {
    let response = app(Arc::new(InMemoryStore::new()))
        .oneshot(get_request("/anonymous/download"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Collection not found");
    assert_eq!(body["id"], "anonymous");
}

#[tokio::test]
async fn collection_download_streams_whole_collection_export() {
    let backend = Router::new().route(
        "/download",
        get(|| async { Response::new(Body::from("collection-warc")) }),
    );
    let record_host = spawn_backend(backend).await;

    let store = Arc::new(InMemoryStore::new());
    store.create_collection(USER, "anonymous").await.unwrap();

    let response = app_with(
        Arc::clone(&store),
        hosts(&record_host, "http://replay.invalid"),
    )
    .oneshot(get_request("/anonymous/download"))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"collection-warc");
}

// Scenario F: a failing backend surfaces a 400 with no partial body.
#[tokio::test]
async fn failed_backend_download_surfaces_bad_request() {
    let backend = Router::new().route(
        "/download",
        get(|| async {
            Response::builder()
                .status(StatusCode::SERVICE_UNAVAILABLE)
                .body(Body::from("backend exploded"))
                .unwrap()
        }),
    );
    let record_host = spawn_backend(backend).await;

    let store = Arc::new(InMemoryStore::new());
    store
        .create_recording(USER, "anonymous", "rec1", "Test")
        .await
        .unwrap();

    let response = app_with(
        Arc::clone(&store),
        hosts(&record_host, "http://replay.invalid"),
    )
    .oneshot(get_request("/anonymous/rec1/download"))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "DOWNLOAD_FAILED");
    assert_eq!(body["message"], "Unable to download WARC");
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let response = app(Arc::new(InMemoryStore::new()))
        .oneshot(get_request("/health"))
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
