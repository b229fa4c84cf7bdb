//! HTTP header constants and well-known paths for the gateway

use ::http::header;

/// Header name for request ID used for tracing and correlation
pub const X_REQUEST_ID: &str = "x-request-id";

/// Forwarded-proto header consulted when rebuilding absolute redirect URLs
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Content type for WARC export downloads
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Standard header re-exports for convenience
pub use header::{
    CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HOST, LOCATION, TRANSFER_ENCODING,
};

/// Well-known paths
pub mod paths {
    /// Health check endpoint path
    pub const HEALTH: &str = "/health";

    /// Route prefix for the anonymous-session flow
    pub const ANONYMOUS_PREFIX: &str = "/anonymous";
}
