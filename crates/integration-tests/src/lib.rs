//! # Test harness
//!
//! Builds the full router over the in-memory store, the Argon2 hasher and
//! the real JWT codec, and drives it with `tower::ServiceExt::oneshot`.
//! [`contracts`] holds the persistence checks every store adapter must pass.

pub mod contracts;

#[cfg(feature = "web-axum")]
mod app;

#[cfg(feature = "web-axum")]
pub use app::{Reply, Seeded, TestApp, SEED_PASSWORD, TEST_SIGNING_KEY};
