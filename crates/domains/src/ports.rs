//! # Ports
//!
//! Capability interfaces the core consumes. Storage and auth adapters
//! implement these; services only ever see the traits.
//!
//! Lookups return `Ok(None)` for a missing row and `Err(DomainError::Storage)`
//! for a collaborator failure, so callers can tell the two apart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{
    Actor, Comment, IssuedToken, NewComment, NewTicket, NewUser, Role, Ticket, TicketId, User,
    UserId,
};

/// Ticket persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn get(&self, id: TicketId) -> Result<Option<Ticket>>;
    async fn list_all(&self) -> Result<Vec<Ticket>>;
    async fn list_by_requester(&self, requester_id: UserId) -> Result<Vec<Ticket>>;
    async fn list_by_assignee(&self, assignee_id: UserId) -> Result<Vec<Ticket>>;
    async fn insert(&self, ticket: NewTicket) -> Result<Ticket>;
    /// Overwrites the stored row. `NotFound("ticket")` if it vanished.
    async fn update(&self, ticket: Ticket) -> Result<Ticket>;
}

/// Comment persistence. Comments are insert-only.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Comment>>;
    /// Comments of one ticket in creation order.
    async fn list_by_ticket(&self, ticket_id: TicketId) -> Result<Vec<Comment>>;
    async fn insert(&self, comment: NewComment) -> Result<Comment>;
}

/// The user directory.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_by_reset_token(&self, token_hash: &str) -> Result<Option<User>>;
    async fn list(&self) -> Result<Vec<User>>;
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>>;
    /// `Conflict` when the e-mail is already taken.
    async fn insert(&self, user: NewUser) -> Result<User>;
    async fn update(&self, user: User) -> Result<User>;
    /// Returns false when no row matched. `Conflict` while the user is a
    /// ticket requester or a comment author; assignments to the user are
    /// cleared.
    async fn delete(&self, id: UserId) -> Result<bool>;
}

/// Password hashing primitive.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    /// False on mismatch or on an unparseable stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Token signing primitive. Stateless; the key is fixed at construction.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenService: Send + Sync {
    fn issue(&self, actor: &Actor, now: DateTime<Utc>) -> Result<IssuedToken>;
    /// Checks signature, expiry, issuer and role claim.
    /// Any failure is `InvalidCredential`.
    fn verify(&self, token: &str) -> Result<Actor>;
}
