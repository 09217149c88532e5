//! # CommentService
//!
//! Creation is gated by the mediator's `Comment` intent; every listing is
//! passed through the visibility filter before it leaves this module.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Actor, Comment, CommentCreate, CommentRepository, DomainError, NewComment, Result, Role,
    Ticket, TicketId, TicketRepository,
};
use tracing::info;

use crate::access::{authorize_scope, RouteScope};
use crate::mediator::{ensure_can_act, TicketIntent};
use crate::visibility;

#[derive(Clone)]
pub struct CommentService {
    tickets: Arc<dyn TicketRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(tickets: Arc<dyn TicketRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { tickets, comments }
    }

    /// The author is always the caller. Customer comments are always
    /// external whatever the request says.
    pub async fn create(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        req: CommentCreate,
    ) -> Result<Comment> {
        let body = req.body.trim();
        if body.is_empty() {
            return Err(DomainError::validation("comment body must not be empty"));
        }
        let ticket = self.load_ticket(ticket_id).await?;
        ensure_can_act(actor, &ticket, TicketIntent::Comment)?;

        let is_internal = match actor.role {
            Role::Customer => false,
            Role::Admin | Role::Agent => req.is_internal,
        };
        let comment = self
            .comments
            .insert(NewComment {
                ticket_id,
                author_id: actor.id,
                body: body.to_string(),
                is_internal,
                created_at: Utc::now(),
            })
            .await?;
        info!(
            comment_id = %comment.id,
            ticket_id = %ticket_id,
            author_id = %actor.id,
            internal = is_internal,
            "comment created"
        );
        Ok(comment)
    }

    /// Every comment in the system, filtered for the caller.
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Comment>> {
        authorize_scope(actor, RouteScope::Admin)?;
        let all = self.comments.list_all().await?;
        Ok(visibility::filter(all, actor.role))
    }

    pub async fn list_for_ticket(&self, actor: &Actor, ticket_id: TicketId) -> Result<Vec<Comment>> {
        let ticket = self.load_ticket(ticket_id).await?;
        ensure_can_act(actor, &ticket, TicketIntent::Read)?;
        let comments = self.comments.list_by_ticket(ticket_id).await?;
        Ok(visibility::filter(comments, actor.role))
    }

    async fn load_ticket(&self, id: TicketId) -> Result<Ticket> {
        self.tickets
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("ticket"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        CommentId, MockCommentRepository, MockTicketRepository, TicketPriority, TicketStatus,
        UserId,
    };

    fn ticket(requester: i64) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: TicketId(5),
            title: "Slow dashboard".into(),
            description: String::new(),
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            requester_id: UserId(requester),
            assignee_id: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    fn with_ticket(requester: i64) -> MockTicketRepository {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_get()
            .returning(move |_| Ok(Some(ticket(requester))));
        tickets
    }

    #[tokio::test]
    async fn customer_internal_flag_is_forced_off() {
        let mut comments = MockCommentRepository::new();
        comments
            .expect_insert()
            .withf(|c: &NewComment| !c.is_internal && c.author_id == UserId(8))
            .times(1)
            .returning(|c| Ok(c.with_id(CommentId(1))));

        let svc = CommentService::new(Arc::new(with_ticket(8)), Arc::new(comments));
        let customer = Actor::new(8, Role::Customer);
        let comment = svc
            .create(
                &customer,
                TicketId(5),
                CommentCreate {
                    body: "any update?".into(),
                    is_internal: true,
                },
            )
            .await
            .unwrap();
        assert!(!comment.is_internal);
    }

    #[tokio::test]
    async fn customer_cannot_comment_on_foreign_ticket() {
        let mut comments = MockCommentRepository::new();
        comments.expect_insert().never();

        let svc = CommentService::new(Arc::new(with_ticket(8)), Arc::new(comments));
        let stranger = Actor::new(9, Role::Customer);
        let err = svc
            .create(
                &stranger,
                TicketId(5),
                CommentCreate {
                    body: "hello".into(),
                    is_internal: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn agent_keeps_internal_flag() {
        let mut comments = MockCommentRepository::new();
        comments
            .expect_insert()
            .withf(|c: &NewComment| c.is_internal)
            .returning(|c| Ok(c.with_id(CommentId(2))));

        let svc = CommentService::new(Arc::new(with_ticket(8)), Arc::new(comments));
        let agent = Actor::new(20, Role::Agent);
        let comment = svc
            .create(
                &agent,
                TicketId(5),
                CommentCreate {
                    body: "escalating to billing".into(),
                    is_internal: true,
                },
            )
            .await
            .unwrap();
        assert!(comment.is_internal);
    }

    #[tokio::test]
    async fn blank_body_is_validation_error() {
        let svc = CommentService::new(
            Arc::new(MockTicketRepository::new()),
            Arc::new(MockCommentRepository::new()),
        );
        let agent = Actor::new(20, Role::Agent);
        let err = svc
            .create(&agent, TicketId(5), CommentCreate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn customer_listing_hides_internal_comments() {
        let mut comments = MockCommentRepository::new();
        comments.expect_list_by_ticket().returning(|ticket_id| {
            Ok([false, true, false]
                .into_iter()
                .enumerate()
                .map(|(i, internal)| Comment {
                    id: CommentId(i as i64),
                    ticket_id,
                    author_id: UserId(20),
                    body: "b".into(),
                    is_internal: internal,
                    created_at: Utc::now(),
                })
                .collect())
        });

        let svc = CommentService::new(Arc::new(with_ticket(8)), Arc::new(comments));
        let owner = Actor::new(8, Role::Customer);
        let visible = svc.list_for_ticket(&owner, TicketId(5)).await.unwrap();
        assert_eq!(
            visible.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![CommentId(0), CommentId(2)]
        );
    }
}
