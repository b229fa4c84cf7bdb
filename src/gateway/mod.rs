//! Gateway module: path disambiguation, lazy provisioning, and dispatch
//!
//! Control flow per request: the classifier splits the ambiguous path into
//! a recording token and target URL, the provisioner resolves (and lazily
//! creates) the backing resources, a canonical-path redirect short-circuits
//! renamed titles, and the dispatcher routes the resolved tuple to the
//! right backend. Downloads bypass rendering and stream bytes straight
//! through.

pub mod classifier;
pub mod dispatch;
pub mod download;
pub mod error_response;
pub mod headers;
pub mod middleware;
pub mod provisioner;
pub mod redirect;
pub mod renderer;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

pub use dispatch::BackendHosts;
pub use service::GatewayService;
pub use types::{GatewayError, GatewayResult, Mode};
