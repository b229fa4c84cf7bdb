//! Streaming WARC export proxy
//!
//! Relays the record backend's export byte stream to the client without
//! buffering. Only `Content-Length` and `Transfer-Encoding` are forwarded
//! from the backend response; a failed backend call surfaces as a 400-level
//! error with the backend body discarded.

use crate::gateway::dispatch::{DispatchRouter, DownloadKind};
use crate::gateway::headers::{
    CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, OCTET_STREAM, TRANSFER_ENCODING,
};
use crate::gateway::types::{GatewayError, GatewayResult};
use axum::body::Body;
use chrono::{DateTime, Utc};
use hyper::{Request, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Compact sortable timestamp used in export filenames.
const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Build the export filename for a title at a point in time.
pub fn warc_filename(title: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}.warc.gz", title, now.format(FILENAME_TIMESTAMP_FORMAT))
}

/// Streaming proxy for WARC exports
pub struct DownloadProxy {
    router: Arc<DispatchRouter>,
    client: hyper_util::client::legacy::Client<
        hyper_util::client::legacy::connect::HttpConnector,
        Body,
    >,
    request_timeout: Duration,
}

impl DownloadProxy {
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

    /// Stream one export to the client.
    ///
    /// The timeout covers connecting and receiving the backend's response
    /// head; the body copy itself runs for as long as the client keeps the
    /// connection open, and dropping the response releases the backend
    /// stream.
    pub async fn stream(
        &self,
        kind: DownloadKind,
        user: &str,
        coll: &str,
        rec: &str,
        title: &str,
    ) -> GatewayResult<Response<Body>> {
        let filename = warc_filename(title, Utc::now());
        let download_url = self.router.download_url(kind, user, coll, rec, &filename);

        let request = Request::builder()
            .uri(download_url.as_str())
            .body(Body::empty())?;

        let response_future = self.client.request(request);
        let upstream = match tokio::time::timeout(self.request_timeout, response_future).await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                warn!(%error, url = %download_url, "download backend request failed");
                return Err(GatewayError::DownloadFailed);
            }
            Err(_) => {
                warn!(url = %download_url, "download backend request timed out");
                return Err(GatewayError::DownloadFailed);
            }
        };

        if upstream.status().as_u16() >= 400 {
            warn!(status = %upstream.status(), url = %download_url, "download backend returned error status");
            // Dropping the response releases the backend connection; the
            // error body is never forwarded.
            return Err(GatewayError::DownloadFailed);
        }

        let (parts, body) = upstream.into_parts();

        let mut builder = Response::builder()
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename={}", urlencoding::encode(&filename)),
            );

        for header in [CONTENT_LENGTH, TRANSFER_ENCODING] {
            if let Some(value) = parts.headers.get(&header) {
                builder = builder.header(header, value);
            }
        }

        Ok(builder.body(Body::new(body))?)
    }
}
