//! Gateway service: route table and request control flow
//!
//! The service owns the collaborator seams (store, sessions, renderer) and
//! the dispatch configuration, and exposes an axum router implementing the
//! anonymous capture/replay routes. Each handler resolves the ambiguous
//! inbound path into a `{user, collection, recording, mode}` tuple, then
//! either redirects to the canonical path, streams a download, or hands the
//! resolved request to the rewrite renderer.

use crate::gateway::classifier::{add_query, closest_hint, PathClassifier};
use crate::gateway::dispatch::{BackendHosts, DispatchRouter, DownloadKind, UpstreamSpec};
use crate::gateway::download::DownloadProxy;
use crate::gateway::error_response::ErrorResponseExt;
use crate::gateway::headers::{paths, LOCATION};
use crate::gateway::middleware::request_id_middleware;
use crate::gateway::provisioner::ensure_recording;
use crate::gateway::redirect::{absolute_redirect, resolve_redirect};
use crate::gateway::renderer::{top_frame_params, ContentRenderer, PassthroughRenderer};
use crate::gateway::session::{anon_user, AnonSessionProvider, SessionProvider};
use crate::gateway::store::{InMemoryStore, RecordingStore};
use crate::gateway::types::{
    GatewayError, GatewayResult, Mode, RecordingToken, ResolvedRequest, ANONYMOUS_COLLECTION,
    DEFAULT_RECORDING_NAME,
};
use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, instrument};

/// Gateway service wiring collaborators to the route table
pub struct GatewayService {
    store: Arc<dyn RecordingStore>,
    sessions: Arc<dyn SessionProvider>,
    renderer: Arc<dyn ContentRenderer>,
    classifier: PathClassifier,
    downloads: DownloadProxy,
}

impl GatewayService {
    /// Create a service against the given backend hosts, with the
    /// in-process collaborator stand-ins.
    pub fn new(hosts: BackendHosts, request_timeout: Duration) -> Self {
        let router = Arc::new(DispatchRouter::new(hosts));

        Self {
            store: Arc::new(InMemoryStore::new()),
            sessions: Arc::new(AnonSessionProvider::new()),
            renderer: Arc::new(PassthroughRenderer::new(
                Arc::clone(&router),
                request_timeout,
            )),
            classifier: PathClassifier::new(),
            downloads: DownloadProxy::new(router, request_timeout),
        }
    }

    /// Swap in an external metadata store.
    pub fn with_store(mut self, store: Arc<dyn RecordingStore>) -> Self {
        self.store = store;
        self
    }

    /// Swap in an external session provider.
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionProvider>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Swap in the real rewrite renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn ContentRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Swap in an alternative URL-shape policy.
    pub fn with_classifier(mut self, classifier: PathClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Build the axum router for this service.
    ///
    /// The replay route is the `/anonymous` fallback rather than a
    /// `/{*wb_url}` route: axum's matcher rejects a catch-all alongside the
    /// `/{rec_name}/…` routes, and a nested fallback matches the same set of
    /// paths.
    pub fn into_router(self) -> Router {
        let anonymous = Router::new()
            .route("/record/{*wb_url}", any(redir_record_handler))
            .route("/download", get(download_collection_handler))
            .route("/{rec_name}/download", get(download_recording_handler))
            .route("/{rec_name}/record/{*wb_url}", any(record_handler))
            .fallback(any(replay_handler));

        Router::new()
            .route(paths::HEALTH, get(health_handler))
            .route("/record/{*wb_url}", any(redir_record_handler))
            .route("/replay/{*wb_url}", any(redir_replay_handler))
            .route("/live/{*wb_url}", any(live_handler))
            .nest("/anonymous", anonymous)
            .with_state(Arc::new(self))
            .layer(axum::middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }
}

/// Error conversion for axum responses using the standardized format
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.to_error_response().into_response_with_status(status)
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

/// `/record/<url>` and `/anonymous/record/<url>`: send the client to the
/// default recording under the anonymous collection.
async fn redir_record_handler(
    Path(wb_url): Path<String>,
    RawQuery(query): RawQuery,
) -> GatewayResult<Response> {
    let wb_url = add_query(&wb_url, query.as_deref());
    Ok(found(&format!(
        "/anonymous/{DEFAULT_RECORDING_NAME}/record/{wb_url}"
    )))
}

/// `/replay/<url>`: the anonymous route tree handles replay.
async fn redir_replay_handler(
    Path(wb_url): Path<String>,
    RawQuery(query): RawQuery,
) -> GatewayResult<Response> {
    let wb_url = add_query(&wb_url, query.as_deref());
    Ok(found(&format!("/anonymous/{wb_url}")))
}

async fn live_handler(
    State(service): State<Arc<GatewayService>>,
    Path(wb_url): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> GatewayResult<Response> {
    let wb_url = add_query(&wb_url, query.as_deref());
    handle_content(
        &service,
        &headers,
        Mode::Live,
        RecordingToken::Wildcard,
        wb_url,
        "/live/".to_string(),
    )
    .await
}

async fn record_handler(
    State(service): State<Arc<GatewayService>>,
    Path((rec_name, wb_url)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> GatewayResult<Response> {
    let wb_url = add_query(&wb_url, query.as_deref());
    let script_path = format!("/anonymous/{rec_name}/record/");
    handle_content(
        &service,
        &headers,
        Mode::Record,
        RecordingToken::Named(rec_name),
        wb_url,
        script_path,
    )
    .await
}

/// `/anonymous/<path>`: disambiguate between named-recording replay and
/// whole-collection replay.
///
/// Runs as the `/anonymous` nest fallback, where `Path` is unavailable; the
/// nested `Uri` carries the prefix-stripped path, decoded here to match the
/// catch-all extractor's behavior.
async fn replay_handler(
    State(service): State<Arc<GatewayService>>,
    uri: Uri,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> GatewayResult<Response> {
    let path = uri.path();
    let raw = path.strip_prefix('/').unwrap_or(path);
    let wb_url = match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    };
    let (token, remaining) = service.classifier.classify(&wb_url);
    let wb_url = add_query(&remaining, query.as_deref());

    let (mode, script_path) = match &token {
        RecordingToken::Named(rec) => (Mode::Replay, format!("/anonymous/{rec}/")),
        RecordingToken::Wildcard => (Mode::ReplayColl, "/anonymous/".to_string()),
    };

    handle_content(&service, &headers, mode, token, wb_url, script_path).await
}

async fn download_recording_handler(
    State(service): State<Arc<GatewayService>>,
    Path(rec_name): Path<String>,
    headers: HeaderMap,
) -> GatewayResult<Response<Body>> {
    let session = service.sessions.session(&headers);
    let user = anon_user(session.as_ref())?;
    let coll = ANONYMOUS_COLLECTION;

    let info = service
        .store
        .get_recording(user.as_ref(), coll, &rec_name)
        .await
        .ok_or_else(|| GatewayError::RecordingNotFound {
            id: rec_name.clone(),
        })?;

    service
        .downloads
        .stream(
            DownloadKind::Recording,
            user.as_ref(),
            coll,
            &rec_name,
            &info.title,
        )
        .await
}

async fn download_collection_handler(
    State(service): State<Arc<GatewayService>>,
    headers: HeaderMap,
) -> GatewayResult<Response<Body>> {
    let session = service.sessions.session(&headers);
    let user = anon_user(session.as_ref())?;
    let coll = ANONYMOUS_COLLECTION;

    let info = service
        .store
        .get_collection(user.as_ref(), coll)
        .await
        .ok_or_else(|| GatewayError::CollectionNotFound {
            id: coll.to_string(),
        })?;

    service
        .downloads
        .stream(
            DownloadKind::Collection,
            user.as_ref(),
            coll,
            RecordingToken::Wildcard.as_str(),
            &info.title,
        )
        .await
}

/// Shared content control flow: resolve identity, provision lazily,
/// short-circuit with a canonical-path redirect when the title sanitized
/// differently, then hand off to the renderer.
#[instrument(skip(service, headers), level = "debug")]
async fn handle_content(
    service: &GatewayService,
    headers: &HeaderMap,
    mode: Mode,
    token: RecordingToken,
    wb_url: String,
    script_path: String,
) -> GatewayResult<Response> {
    let session = service.sessions.session(headers);
    let user = anon_user(session.as_ref())?;
    let coll = ANONYMOUS_COLLECTION;

    let mut rec = token;

    if mode.provisions() {
        if mode == Mode::Record && !session.is_anon() {
            session.set_anon();
        }

        let title = rec
            .name()
            .ok_or_else(|| {
                GatewayError::Contract(format!("{mode} reached provisioning with a wildcard"))
            })?
            .to_string();

        let provisioned =
            ensure_recording(service.store.as_ref(), user.as_ref(), coll, &title, mode).await?;

        if provisioned.needs_redirect {
            let target = resolve_redirect(&script_path, &title, &provisioned.rec, &wb_url)
                .ok_or_else(|| {
                    GatewayError::Contract("redirect requested for identical identifier".into())
                })?;
            debug!(%title, rec = %provisioned.rec, "redirecting to canonical recording path");
            return Ok(found(&absolute_redirect(headers, &target)));
        }

        rec = RecordingToken::Named(provisioned.rec);
    }

    let closest = closest_hint(&wb_url);
    let resolved = ResolvedRequest {
        user,
        coll: coll.to_string(),
        rec,
        mode,
        wb_url,
        closest,
    };

    let upstream = UpstreamSpec::for_request(&resolved)?;
    let frame = top_frame_params(service.store.as_ref(), &resolved).await?;

    service
        .renderer
        .render_resolved(&resolved, &upstream, frame)
        .await
}

/// 302 redirect response, matching the original controller's behavior.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_sets_location_and_302() {
        let response = found("/anonymous/my-recording/record/https://example.com/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/anonymous/my-recording/record/https://example.com/"
        );
    }
}
