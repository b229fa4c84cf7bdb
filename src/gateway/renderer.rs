//! Rewrite-renderer collaborator seam
//!
//! The content rewriting engine is an external component: the gateway hands
//! it a resolved request plus the computed upstream spec and returns its
//! response verbatim. The passthrough implementation forwards straight to
//! the upstream resource endpoint, which is enough for standalone operation
//! and tests.

use crate::gateway::dispatch::{DispatchRouter, UpstreamSpec};
use crate::gateway::store::RecordingStore;
use crate::gateway::types::{GatewayError, GatewayResult, Mode, ResolvedRequest};
use async_trait::async_trait;
use axum::body::Body;
use hyper::{Request, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Per-request metadata handed to the renderer's top-level frame.
///
/// Live mode gets none; every other mode carries the current mode and the
/// store's inject info serialized as JSON.
#[derive(Clone, Debug, Serialize)]
pub struct TopFrameParams {
    pub curr_mode: Mode,
    pub info: String,
}

/// Build the top-level frame params for a resolved request.
pub async fn top_frame_params(
    store: &dyn RecordingStore,
    resolved: &ResolvedRequest,
) -> GatewayResult<Option<TopFrameParams>> {
    if resolved.mode == Mode::Live {
        return Ok(None);
    }

    let info = store
        .content_inject_info(resolved.user.as_ref(), &resolved.coll, resolved.rec.as_str())
        .await;
    let info = serde_json::to_string(&info)
        .map_err(|e| GatewayError::Internal(format!("inject info serialization: {e}")))?;

    Ok(Some(TopFrameParams {
        curr_mode: resolved.mode,
        info,
    }))
}

/// External rewrite renderer serving already-resolved requests
#[async_trait]
pub trait ContentRenderer: Send + Sync {
    async fn render_resolved(
        &self,
        resolved: &ResolvedRequest,
        upstream: &UpstreamSpec,
        frame: Option<TopFrameParams>,
    ) -> GatewayResult<Response<Body>>;
}

/// Renderer stand-in that forwards to the upstream resource endpoint
/// without rewriting
pub struct PassthroughRenderer {
    router: Arc<DispatchRouter>,
    client: hyper_util::client::legacy::Client<
        hyper_util::client::legacy::connect::HttpConnector,
        Body,
    >,
    request_timeout: Duration,
}

impl PassthroughRenderer {
    pub fn new(router: Arc<DispatchRouter>, request_timeout: Duration) -> Self {
        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build_http();

        Self {
            router,
            client,
            request_timeout,
        }
    }
}

#[async_trait]
impl ContentRenderer for PassthroughRenderer {
    async fn render_resolved(
        &self,
        _resolved: &ResolvedRequest,
        upstream: &UpstreamSpec,
        _frame: Option<TopFrameParams>,
    ) -> GatewayResult<Response<Body>> {
        let url = self.router.upstream_url(upstream);

        let request = Request::builder()
            .method(hyper::Method::POST)
            .uri(url.as_str())
            .body(Body::empty())?;

        let response = tokio::time::timeout(self.request_timeout, self.client.request(request))
            .await
            .map_err(|_| GatewayError::Upstream(format!("timed out calling {url}")))?
            .map_err(|e| GatewayError::Upstream(format!("calling {url}: {e}")))?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
