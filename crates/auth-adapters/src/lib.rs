//! # Auth Adapters
//!
//! Implementations of the `PasswordHasher` and `TokenService` ports.

mod argon2_config;
pub mod password;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

// Re-exporting for easier access in other crates
pub use password::Argon2PasswordHasher;

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtTokenService};
