//! # Ticket Lifecycle Engine
//!
//! Pure state-machine and field-update rules. Nothing here touches
//! storage; referential checks (does the requester/assignee exist) are the
//! caller's job and must happen before these functions are invoked.
//!
//! ```text
//!   Open <──> Pending
//!     \         /
//!      v       v
//!       Closed ──x──> (no reopen)
//! ```
//!
//! Three update paths, one per role:
//! - Admin: any field except `requester_id`.
//! - Agent: `status`, `priority`, self-claim via `assignee_id`.
//! - Customer: `status -> Closed` on their own ticket, nothing else.

use chrono::{DateTime, Utc};
use domains::{
    Actor, AdminTicketUpdate, AgentTicketUpdate, DomainError, NewTicket, Result, Ticket,
    TicketPriority, TicketStatus, UserId,
};

use crate::mediator::{ensure_can_act, TicketIntent};

/// Fields common to both creation paths after the requester is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    pub requester_id: UserId,
    pub assignee_id: Option<UserId>,
}

/// Every ticket starts `Open` with no close stamp.
pub fn open(draft: TicketDraft, now: DateTime<Utc>) -> Result<NewTicket> {
    let title = non_empty_title(&draft.title)?;
    Ok(NewTicket {
        title,
        description: draft.description,
        status: TicketStatus::Open,
        priority: draft.priority.unwrap_or_default(),
        requester_id: draft.requester_id,
        assignee_id: draft.assignee_id,
        created_at: now,
        updated_at: now,
        closed_at: None,
    })
}

/// Only leaving `Closed` is illegal.
pub fn check_transition(from: TicketStatus, to: TicketStatus) -> Result<()> {
    match (from, to) {
        (TicketStatus::Closed, TicketStatus::Open | TicketStatus::Pending) => {
            Err(DomainError::InvalidTransition { from, to })
        }
        _ => Ok(()),
    }
}

pub fn update_as_admin(
    mut ticket: Ticket,
    patch: &AdminTicketUpdate,
    now: DateTime<Utc>,
) -> Result<Ticket> {
    if let Some(requester) = patch.requester_id {
        if requester != ticket.requester_id {
            return Err(DomainError::validation("requester_id is immutable"));
        }
    }
    if let Some(status) = patch.status {
        check_transition(ticket.status, status)?;
    }

    if let Some(title) = &patch.title {
        ticket.title = non_empty_title(title)?;
    }
    if let Some(description) = &patch.description {
        ticket.description = description.clone();
    }
    if let Some(priority) = patch.priority {
        ticket.priority = priority;
    }
    if let Some(assignee) = patch.assignee_id {
        ticket.assignee_id = assignee;
    }
    if let Some(status) = patch.status {
        set_status(&mut ticket, status, now);
    }
    ticket.updated_at = now;
    Ok(ticket)
}

/// Agent path. The requested assignee, when present, is always resolved to
/// the caller; an agent cannot hand a ticket to a third party here.
pub fn update_as_agent(
    actor: &Actor,
    mut ticket: Ticket,
    patch: &AgentTicketUpdate,
    now: DateTime<Utc>,
) -> Result<Ticket> {
    let claim = patch.assignee_id.map(|_| actor.id);
    let intent = match claim {
        Some(to) => TicketIntent::Reassign { to },
        None => TicketIntent::Update,
    };
    ensure_can_act(actor, &ticket, intent)?;

    if let Some(status) = patch.status {
        check_transition(ticket.status, status)?;
    }

    if let Some(priority) = patch.priority {
        ticket.priority = priority;
    }
    if claim.is_some() {
        ticket.assignee_id = claim;
    }
    if let Some(status) = patch.status {
        set_status(&mut ticket, status, now);
    }
    ticket.updated_at = now;
    Ok(ticket)
}

pub fn close_as_customer(actor: &Actor, mut ticket: Ticket, now: DateTime<Utc>) -> Result<Ticket> {
    ensure_can_act(actor, &ticket, TicketIntent::Close)?;
    set_status(&mut ticket, TicketStatus::Closed, now);
    ticket.updated_at = now;
    Ok(ticket)
}

/// Keeps `closed_at` in step with `status`. Re-closing keeps the first stamp.
fn set_status(ticket: &mut Ticket, status: TicketStatus, now: DateTime<Utc>) {
    ticket.closed_at = match status {
        TicketStatus::Closed => ticket.closed_at.or(Some(now)),
        TicketStatus::Open | TicketStatus::Pending => None,
    };
    ticket.status = status;
}

fn non_empty_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    Ok(trimmed.to_string())
}
