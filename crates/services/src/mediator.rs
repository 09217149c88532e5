//! # Record Access Mediator
//!
//! The single definition of "may this actor act on this ticket". Ticket
//! lifecycle and comment logic both route through here.
//!
//! | Role     | Read | Comment | Close | Update             | Reassign        |
//! |----------|------|---------|-------|--------------------|-----------------|
//! | Admin    | yes  | yes     | yes   | yes                | yes             |
//! | Agent    | yes  | yes     | own   | unassigned or own  | to self only    |
//! | Customer | own  | own     | own   | no                 | no              |
//!
//! "Own" for Close means the actor is the ticket's requester, whatever
//! their role.

use domains::{Actor, DomainError, Result, Role, Ticket, UserId};
use tracing::warn;

/// What the caller wants to do with a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketIntent {
    Read,
    Comment,
    Close,
    /// Status/priority edit without touching the assignee.
    Update,
    /// Set the assignee to `to`.
    Reassign { to: UserId },
}

impl TicketIntent {
    fn label(self) -> &'static str {
        match self {
            TicketIntent::Read => "read",
            TicketIntent::Comment => "comment on",
            TicketIntent::Close => "close",
            TicketIntent::Update => "update",
            TicketIntent::Reassign { .. } => "reassign",
        }
    }
}

pub fn can_act_on_ticket(actor: &Actor, ticket: &Ticket, intent: TicketIntent) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Agent => match intent {
            TicketIntent::Read | TicketIntent::Comment => true,
            TicketIntent::Close => ticket.requester_id == actor.id,
            TicketIntent::Update => ticket.assignee_id.map_or(true, |a| a == actor.id),
            // Self-claim is the only cross-ownership mutation an agent gets.
            TicketIntent::Reassign { to } => to == actor.id,
        },
        Role::Customer => match intent {
            TicketIntent::Read | TicketIntent::Comment | TicketIntent::Close => {
                ticket.requester_id == actor.id
            }
            TicketIntent::Update | TicketIntent::Reassign { .. } => false,
        },
    }
}

/// [`can_act_on_ticket`] as a `Result`; denial is always `Forbidden`.
pub fn ensure_can_act(actor: &Actor, ticket: &Ticket, intent: TicketIntent) -> Result<()> {
    if can_act_on_ticket(actor, ticket, intent) {
        return Ok(());
    }
    warn!(
        actor_id = %actor.id,
        role = %actor.role,
        ticket_id = %ticket.id,
        intent = intent.label(),
        "ownership check denied access"
    );
    Err(DomainError::forbidden(format!(
        "not allowed to {} ticket {}",
        intent.label(),
        ticket.id
    )))
}
