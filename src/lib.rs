//! Warcgate - request dispatch and disambiguation gateway
//!
//! Sits in front of a web-archive capture/replay backend: classifies
//! ambiguous `/anonymous/...` paths, lazily provisions collections and
//! recordings on first reference, routes resolved requests to the right
//! backend service, and streams WARC exports without buffering.

pub mod application;
pub mod config;
pub mod error;
pub mod gateway;

pub use application::Application;
pub use error::{Error, Result};
