use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, TicketId, UserId};

/// A message on a ticket. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub body: String,
    /// Internal comments are visible to Admin and Agent only.
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub body: String,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn with_id(self, id: CommentId) -> Comment {
        Comment {
            id,
            ticket_id: self.ticket_id,
            author_id: self.author_id,
            body: self.body,
            is_internal: self.is_internal,
            created_at: self.created_at,
        }
    }
}

/// Body of a comment post on a ticket-scoped route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentCreate {
    pub body: String,
    #[serde(default)]
    pub is_internal: bool,
}

/// Body of `POST /admin/comments`, where the ticket travels in the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminCommentCreate {
    pub ticket_id: TicketId,
    pub body: String,
    #[serde(default)]
    pub is_internal: bool,
}
