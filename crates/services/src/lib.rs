//! # Services
//!
//! The help-desk core: credential verification, the access guard, the
//! ticket lifecycle engine, comment visibility and the record access
//! mediator, plus the application services that compose them over the
//! ports declared in `domains`.
//!
//! Every operation takes the calling [`domains::Actor`] explicitly.

pub mod access;
pub mod accounts;
pub mod comments;
pub mod credentials;
pub mod lifecycle;
pub mod mediator;
pub mod tickets;
pub mod visibility;

// Re-exporting for easier access in other crates
pub use access::{authorize, authorize_scope, RouteScope};
pub use accounts::AccountService;
pub use comments::CommentService;
pub use credentials::{bearer_token, CredentialVerifier};
pub use mediator::{can_act_on_ticket, ensure_can_act, TicketIntent};
pub use tickets::TicketService;
