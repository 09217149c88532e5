//! # API Adapters
//!
//! HTTP transport for the help-desk core. With `web-axum` enabled this
//! crate exposes [`router`], which maps every route onto the services in
//! [`AppState`]. Handlers only extract, delegate and serialize; every
//! decision is made in `services`.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

// Re-exporting for easier access in other crates
pub use metrics::{DenialReason, Metrics};

#[cfg(feature = "web-axum")]
pub use error::{ApiError, ErrorBody};
#[cfg(feature = "web-axum")]
pub use routes::{cors_layer, router};
#[cfg(feature = "web-axum")]
pub use state::AppState;
