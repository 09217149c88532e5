//! # PostgreSQL adapter
//!
//! Maps the relational model in `migrations/` onto the domain models.
//! Enum columns are stored as their canonical names (`"Admin"`, `"Open"`, ...).

mod repos;

use std::str::FromStr;

use domains::{
    Comment, CommentId, DomainError, Result, Role, Ticket, TicketId, TicketPriority,
    TicketStatus, User, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(DomainError::storage)?;
        info!(max_connections, "postgres pool ready");
        Ok(Self { pool })
    }

    /// Applies the bundled migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(DomainError::storage)?;
        info!("migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Unique and foreign-key violations become `Conflict`; everything else is
/// an opaque storage failure.
pub(crate) fn map_err(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DomainError::Conflict("e-mail is taken".into());
        }
        if db.is_foreign_key_violation() {
            return DomainError::Conflict("record is still referenced".into());
        }
    }
    DomainError::storage(err)
}

fn parse_column<T: FromStr>(row: &PgRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column).map_err(map_err)?;
    raw.parse()
        .map_err(|_| DomainError::Storage(format!("unexpected {column} value {raw:?}")))
}

pub(crate) fn ticket_from_row(row: &PgRow) -> Result<Ticket> {
    Ok(Ticket {
        id: TicketId(row.try_get("id").map_err(map_err)?),
        title: row.try_get("title").map_err(map_err)?,
        description: row.try_get("description").map_err(map_err)?,
        status: parse_column::<TicketStatus>(row, "status")?,
        priority: parse_column::<TicketPriority>(row, "priority")?,
        requester_id: UserId(row.try_get("requester_id").map_err(map_err)?),
        assignee_id: row
            .try_get::<Option<i64>, _>("assignee_id")
            .map_err(map_err)?
            .map(UserId),
        created_at: row.try_get("created_at").map_err(map_err)?,
        updated_at: row.try_get("updated_at").map_err(map_err)?,
        closed_at: row.try_get("closed_at").map_err(map_err)?,
    })
}

pub(crate) fn comment_from_row(row: &PgRow) -> Result<Comment> {
    Ok(Comment {
        id: CommentId(row.try_get("id").map_err(map_err)?),
        ticket_id: TicketId(row.try_get("ticket_id").map_err(map_err)?),
        author_id: UserId(row.try_get("author_id").map_err(map_err)?),
        body: row.try_get("body").map_err(map_err)?,
        is_internal: row.try_get("is_internal").map_err(map_err)?,
        created_at: row.try_get("created_at").map_err(map_err)?,
    })
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: UserId(row.try_get("id").map_err(map_err)?),
        name: row.try_get("name").map_err(map_err)?,
        email: row.try_get("email").map_err(map_err)?,
        password_hash: row.try_get("password_hash").map_err(map_err)?,
        role: parse_column::<Role>(row, "role")?,
        reset_token_hash: row.try_get("reset_token_hash").map_err(map_err)?,
        reset_expires_at: row.try_get("reset_expires_at").map_err(map_err)?,
        created_at: row.try_get("created_at").map_err(map_err)?,
    })
}
