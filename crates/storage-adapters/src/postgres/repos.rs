use async_trait::async_trait;
use domains::{
    Comment, CommentRepository, DomainError, NewComment, NewTicket, NewUser, Result, Role, Ticket,
    TicketId, TicketRepository, User, UserId, UserRepository,
};

use super::{comment_from_row, map_err, ticket_from_row, user_from_row, PgStore};

const TICKET_COLUMNS: &str = "id, title, description, status, priority, requester_id, \
     assignee_id, created_at, updated_at, closed_at";
const COMMENT_COLUMNS: &str = "id, ticket_id, author_id, body, is_internal, created_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, role, reset_token_hash, \
     reset_expires_at, created_at";

#[async_trait]
impl TicketRepository for PgStore {
    async fn get(&self, id: TicketId) -> Result<Option<Ticket>> {
        let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Ticket>> {
        sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(ticket_from_row)
            .collect()
    }

    async fn list_by_requester(&self, requester_id: UserId) -> Result<Vec<Ticket>> {
        sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE requester_id = $1 ORDER BY id"
        ))
        .bind(requester_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?
        .iter()
        .map(ticket_from_row)
        .collect()
    }

    async fn list_by_assignee(&self, assignee_id: UserId) -> Result<Vec<Ticket>> {
        sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE assignee_id = $1 ORDER BY id"
        ))
        .bind(assignee_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?
        .iter()
        .map(ticket_from_row)
        .collect()
    }

    async fn insert(&self, ticket: NewTicket) -> Result<Ticket> {
        let row = sqlx::query(&format!(
            "INSERT INTO tickets (title, description, status, priority, requester_id, \
             assignee_id, created_at, updated_at, closed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {TICKET_COLUMNS}"
        ))
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.requester_id.value())
        .bind(ticket.assignee_id.map(UserId::value))
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .bind(ticket.closed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        ticket_from_row(&row)
    }

    async fn update(&self, ticket: Ticket) -> Result<Ticket> {
        let row = sqlx::query(&format!(
            "UPDATE tickets SET title = $2, description = $3, status = $4, priority = $5, \
             requester_id = $6, assignee_id = $7, updated_at = $8, closed_at = $9 \
             WHERE id = $1 RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket.id.value())
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.requester_id.value())
        .bind(ticket.assignee_id.map(UserId::value))
        .bind(ticket.updated_at)
        .bind(ticket.closed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or_else(|| DomainError::not_found("ticket"))?;
        ticket_from_row(&row)
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn list_all(&self) -> Result<Vec<Comment>> {
        sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(comment_from_row)
            .collect()
    }

    async fn list_by_ticket(&self, ticket_id: TicketId) -> Result<Vec<Comment>> {
        sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE ticket_id = $1 ORDER BY id"
        ))
        .bind(ticket_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?
        .iter()
        .map(comment_from_row)
        .collect()
    }

    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let row = sqlx::query(&format!(
            "INSERT INTO comments (ticket_id, author_id, body, is_internal, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment.ticket_id.value())
        .bind(comment.author_id.value())
        .bind(&comment.body)
        .bind(comment.is_internal)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        comment_from_row(&row)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_by_reset_token(&self, token_hash: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(user_from_row)
            .collect()
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY id"
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?
        .iter()
        .map(user_from_row)
        .collect()
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (name, email, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        user_from_row(&row)
    }

    async fn update(&self, user: User) -> Result<User> {
        let row = sqlx::query(&format!(
            "UPDATE users SET name = $2, email = $3, password_hash = $4, role = $5, \
             reset_token_hash = $6, reset_expires_at = $7 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id.value())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.reset_token_hash.as_deref())
        .bind(user.reset_expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or_else(|| DomainError::not_found("user"))?;
        user_from_row(&row)
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(done.rows_affected() > 0)
    }
}
