//! Shared state handed to every handler.

use std::sync::Arc;

use domains::{CommentRepository, PasswordHasher, TicketRepository, TokenService, UserRepository};
use services::{AccountService, CommentService, CredentialVerifier, TicketService};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub verifier: CredentialVerifier,
    pub tickets: TicketService,
    pub comments: CommentService,
    pub accounts: AccountService,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wires the services over one set of ports.
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        comments: Arc<dyn CommentRepository>,
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            verifier: CredentialVerifier::new(tokens.clone(), users.clone()),
            tickets: TicketService::new(tickets.clone(), comments.clone(), users.clone()),
            comments: CommentService::new(tickets, comments),
            accounts: AccountService::new(users, hasher, tokens),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
