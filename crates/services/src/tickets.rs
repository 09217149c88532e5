//! # TicketService
//!
//! Orchestrates the flow between callers and the ticket/comment/user
//! ports: role gate, referential checks, ownership check, lifecycle rule,
//! persistence. Referential checks always complete before any write.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Actor, AdminTicketCreate, AdminTicketUpdate, AgentTicketUpdate, CommentRepository,
    CustomerTicketCreate, CustomerTicketUpdate, DomainError, Result, Ticket, TicketDetail,
    TicketId, TicketRepository, TicketStatus, UserId, UserRepository,
};
use tracing::info;

use crate::access::{authorize_scope, RouteScope};
use crate::lifecycle::{self, TicketDraft};
use crate::mediator::{ensure_can_act, TicketIntent};
use crate::visibility;

#[derive(Clone)]
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserRepository>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        comments: Arc<dyn CommentRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            tickets,
            comments,
            users,
        }
    }

    /// Self-service creation. The requester is always the caller.
    pub async fn create_for_self(&self, actor: &Actor, req: CustomerTicketCreate) -> Result<Ticket> {
        authorize_scope(actor, RouteScope::Customer)?;
        let draft = TicketDraft {
            title: req.title,
            description: req.description,
            priority: req.priority,
            requester_id: actor.id,
            assignee_id: None,
        };
        let ticket = self.tickets.insert(lifecycle::open(draft, Utc::now())?).await?;
        info!(ticket_id = %ticket.id, requester_id = %ticket.requester_id, "ticket created");
        Ok(ticket)
    }

    /// Admin creation on behalf of an existing user.
    pub async fn create_as_admin(&self, actor: &Actor, req: AdminTicketCreate) -> Result<Ticket> {
        authorize_scope(actor, RouteScope::Admin)?;
        self.require_user(req.requester_id, "requester").await?;
        if let Some(assignee) = req.assignee_id {
            self.require_user(assignee, "assignee").await?;
        }

        let draft = TicketDraft {
            title: req.title,
            description: req.description,
            priority: req.priority,
            requester_id: req.requester_id,
            assignee_id: req.assignee_id,
        };
        let ticket = self.tickets.insert(lifecycle::open(draft, Utc::now())?).await?;
        info!(
            ticket_id = %ticket.id,
            requester_id = %ticket.requester_id,
            created_by = %actor.id,
            "ticket created by admin"
        );
        Ok(ticket)
    }

    /// Ticket plus the comments this caller may see.
    pub async fn get(&self, actor: &Actor, id: TicketId) -> Result<TicketDetail> {
        let ticket = self.load(id).await?;
        ensure_can_act(actor, &ticket, TicketIntent::Read)?;
        let comments = self.comments.list_by_ticket(id).await?;
        Ok(TicketDetail {
            ticket,
            comments: visibility::filter(comments, actor.role),
        })
    }

    /// Every ticket; the Admin listing and the Agent all-tickets view.
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Ticket>> {
        authorize_scope(actor, RouteScope::Agent)?;
        self.tickets.list_all().await
    }

    pub async fn list_assigned(&self, actor: &Actor) -> Result<Vec<Ticket>> {
        authorize_scope(actor, RouteScope::Agent)?;
        self.tickets.list_by_assignee(actor.id).await
    }

    pub async fn list_requested(&self, actor: &Actor) -> Result<Vec<Ticket>> {
        authorize_scope(actor, RouteScope::Customer)?;
        self.tickets.list_by_requester(actor.id).await
    }

    pub async fn update_as_admin(
        &self,
        actor: &Actor,
        id: TicketId,
        patch: AdminTicketUpdate,
    ) -> Result<Ticket> {
        authorize_scope(actor, RouteScope::Admin)?;
        let ticket = self.load(id).await?;
        if let Some(Some(assignee)) = patch.assignee_id {
            self.require_user(assignee, "assignee").await?;
        }
        let updated = lifecycle::update_as_admin(ticket, &patch, Utc::now())?;
        let updated = self.tickets.update(updated).await?;
        info!(ticket_id = %id, actor_id = %actor.id, status = %updated.status, "ticket updated by admin");
        Ok(updated)
    }

    pub async fn update_as_agent(
        &self,
        actor: &Actor,
        id: TicketId,
        patch: AgentTicketUpdate,
    ) -> Result<Ticket> {
        authorize_scope(actor, RouteScope::Agent)?;
        let ticket = self.load(id).await?;
        let updated = lifecycle::update_as_agent(actor, ticket, &patch, Utc::now())?;
        let updated = self.tickets.update(updated).await?;
        info!(
            ticket_id = %id,
            actor_id = %actor.id,
            status = %updated.status,
            claimed = patch.assignee_id.is_some(),
            "ticket updated by agent"
        );
        Ok(updated)
    }

    /// The customer update path only ever closes the caller's own ticket.
    pub async fn update_as_customer(
        &self,
        actor: &Actor,
        id: TicketId,
        patch: CustomerTicketUpdate,
    ) -> Result<Ticket> {
        authorize_scope(actor, RouteScope::Customer)?;
        let ticket = self.load(id).await?;
        ensure_can_act(actor, &ticket, TicketIntent::Close)?;

        if let Some(status) = patch.status {
            lifecycle::check_transition(ticket.status, status)?;
        }
        if patch.has_non_status_fields() {
            return Err(DomainError::validation(
                "only the status may be changed, and only to Closed",
            ));
        }
        if patch.status != Some(TicketStatus::Closed) {
            return Err(DomainError::validation("status must be Closed"));
        }

        let closed = lifecycle::close_as_customer(actor, ticket, Utc::now())?;
        let closed = self.tickets.update(closed).await?;
        info!(ticket_id = %id, actor_id = %actor.id, "ticket closed by requester");
        Ok(closed)
    }

    async fn load(&self, id: TicketId) -> Result<Ticket> {
        self.tickets
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("ticket"))
    }

    async fn require_user(&self, id: UserId, what: &str) -> Result<()> {
        match self.users.get(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found(what)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{
        MockCommentRepository, MockTicketRepository, MockUserRepository, NewTicket, Role,
        TicketPriority, User,
    };

    fn user(id: UserId) -> User {
        User {
            id,
            name: "u".into(),
            email: format!("u{id}@example.com"),
            password_hash: String::new(),
            role: Role::Customer,
            reset_token_hash: None,
            reset_expires_at: None,
            created_at: Utc::now(),
        }
    }

    fn service(
        tickets: MockTicketRepository,
        comments: MockCommentRepository,
        users: MockUserRepository,
    ) -> TicketService {
        TicketService::new(Arc::new(tickets), Arc::new(comments), Arc::new(users))
    }

    fn admin_create(requester: i64, assignee: Option<i64>) -> AdminTicketCreate {
        AdminTicketCreate {
            title: "Billing question".into(),
            description: String::new(),
            priority: Some(TicketPriority::Low),
            requester_id: UserId(requester),
            assignee_id: assignee.map(UserId),
        }
    }

    #[tokio::test]
    async fn admin_create_with_unknown_requester_inserts_nothing() {
        let mut tickets = MockTicketRepository::new();
        tickets.expect_insert().never();
        let mut users = MockUserRepository::new();
        users.expect_get().returning(|_| Ok(None));

        let svc = service(tickets, MockCommentRepository::new(), users);
        let admin = Actor::new(1, Role::Admin);
        let err = svc
            .create_as_admin(&admin, admin_create(404, None))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("requester"));
    }

    #[tokio::test]
    async fn admin_create_with_unknown_assignee_inserts_nothing() {
        let mut tickets = MockTicketRepository::new();
        tickets.expect_insert().never();
        let mut users = MockUserRepository::new();
        users
            .expect_get()
            .returning(|id| Ok((id == UserId(2)).then(|| user(id))));

        let svc = service(tickets, MockCommentRepository::new(), users);
        let admin = Actor::new(1, Role::Admin);
        let err = svc
            .create_as_admin(&admin, admin_create(2, Some(77)))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("assignee"));
    }

    #[tokio::test]
    async fn customer_self_create_forces_requester_and_open_state() {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_insert()
            .withf(|t: &NewTicket| {
                t.requester_id == UserId(42)
                    && t.status == TicketStatus::Open
                    && t.assignee_id.is_none()
                    && t.closed_at.is_none()
            })
            .times(1)
            .returning(|t| Ok(t.with_id(TicketId(1))));

        let svc = service(tickets, MockCommentRepository::new(), MockUserRepository::new());
        let customer = Actor::new(42, Role::Customer);
        let ticket = svc
            .create_for_self(
                &customer,
                CustomerTicketCreate {
                    title: "Broken link".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ticket.requester_id, UserId(42));
    }

    #[tokio::test]
    async fn customer_cannot_reach_admin_creation() {
        let svc = service(
            MockTicketRepository::new(),
            MockCommentRepository::new(),
            MockUserRepository::new(),
        );
        let customer = Actor::new(42, Role::Customer);
        let err = svc
            .create_as_admin(&customer, admin_create(42, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    fn stored(requester: i64) -> Ticket {
        lifecycle::open(
            TicketDraft {
                title: "x".into(),
                description: String::new(),
                priority: None,
                requester_id: UserId(requester),
                assignee_id: None,
            },
            Utc::now(),
        )
        .unwrap()
        .with_id(TicketId(9))
    }

    #[tokio::test]
    async fn customer_priority_change_is_rejected_without_write() {
        let mut tickets = MockTicketRepository::new();
        tickets.expect_get().returning(|_| Ok(Some(stored(42))));
        tickets.expect_update().never();

        let svc = service(tickets, MockCommentRepository::new(), MockUserRepository::new());
        let customer = Actor::new(42, Role::Customer);
        let patch = CustomerTicketUpdate {
            priority: Some(TicketPriority::Urgent),
            ..Default::default()
        };
        let err = svc
            .update_as_customer(&customer, TicketId(9), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn customer_reopen_is_an_invalid_transition() {
        let mut tickets = MockTicketRepository::new();
        tickets.expect_get().returning(|_| {
            let mut closed = stored(42);
            closed.status = TicketStatus::Closed;
            closed.closed_at = Some(Utc::now());
            Ok(Some(closed))
        });
        tickets.expect_update().never();

        let svc = service(tickets, MockCommentRepository::new(), MockUserRepository::new());
        let customer = Actor::new(42, Role::Customer);
        let patch = CustomerTicketUpdate {
            status: Some(TicketStatus::Open),
            ..Default::default()
        };
        let err = svc
            .update_as_customer(&customer, TicketId(9), patch)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: TicketStatus::Closed,
                to: TicketStatus::Open,
            }
        );
    }

    #[tokio::test]
    async fn foreign_customer_gets_forbidden_before_validation() {
        let mut tickets = MockTicketRepository::new();
        tickets.expect_get().returning(|_| Ok(Some(stored(42))));
        tickets.expect_update().never();

        let svc = service(tickets, MockCommentRepository::new(), MockUserRepository::new());
        let stranger = Actor::new(43, Role::Customer);
        let err = svc
            .update_as_customer(&stranger, TicketId(9), CustomerTicketUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_ticket_is_not_found() {
        let mut tickets = MockTicketRepository::new();
        tickets.expect_get().returning(|_| Ok(None));

        let svc = service(tickets, MockCommentRepository::new(), MockUserRepository::new());
        let agent = Actor::new(3, Role::Agent);
        let err = svc
            .update_as_agent(&agent, TicketId(9), AgentTicketUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("ticket"));
    }

    #[tokio::test]
    async fn storage_failures_propagate_unchanged() {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_list_all()
            .returning(|| Err(DomainError::storage("connection reset")));

        let svc = service(tickets, MockCommentRepository::new(), MockUserRepository::new());
        let admin = Actor::new(1, Role::Admin);
        assert!(matches!(
            svc.list_all(&admin).await,
            Err(DomainError::Storage(_))
        ));
    }
}
