//! # DomainError
//!
//! Centralized error handling for the help-desk core.
//! Every port and service returns this taxonomy; adapters translate their
//! driver errors into it at the boundary.

use thiserror::Error;

use crate::models::TicketStatus;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No `Authorization` header on the request.
    #[error("missing credential")]
    MissingCredential,

    /// Header present but not of the form `Bearer <token>`.
    #[error("malformed credential")]
    MalformedCredential,

    /// Signature, expiry, issuer or role claim rejected, or the subject no
    /// longer exists in the user directory.
    #[error("invalid credential")]
    InvalidCredential,

    /// Role gate or record ownership denial. Never downgraded to `NotFound`.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced record absent (e.g. "ticket", "requester", "assignee").
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed request body or field values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Illegal status change, e.g. reopening a closed ticket.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },

    /// Resource already exists (e.g. duplicate e-mail)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence collaborator failure. Opaque to callers.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// True for the three credential failures (401-equivalent).
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential | Self::MalformedCredential | Self::InvalidCredential
        )
    }
}

/// A specialized Result type for help-desk logic.
pub type Result<T> = std::result::Result<T, DomainError>;
