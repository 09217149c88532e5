//! # In-memory store
//!
//! A single [`InMemoryStore`] implements all three repository ports over
//! `DashMap`s. Ids come from per-table atomic sequences starting at 1.
//!
//! Listings are returned in id order, which is also creation order.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    Comment, CommentId, CommentRepository, DomainError, NewComment, NewTicket, NewUser, Result,
    Role, Ticket, TicketId, TicketRepository, User, UserId, UserRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    tickets: DashMap<TicketId, Ticket>,
    comments: DashMap<CommentId, Comment>,
    users: DashMap<UserId, User>,
    /// email -> owner, kept in step with `users` for uniqueness checks.
    emails: DashMap<String, UserId>,
    ticket_seq: AtomicI64,
    comment_seq: AtomicI64,
    user_seq: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::SeqCst) + 1
}

fn collect_sorted<K, V, F>(map: &DashMap<K, V>, keep: F) -> Vec<V>
where
    K: Eq + std::hash::Hash + Ord + Copy,
    V: Clone,
    F: Fn(&V) -> bool,
{
    let mut rows: Vec<(K, V)> = map
        .iter()
        .filter(|r| keep(r.value()))
        .map(|r| (*r.key(), r.value().clone()))
        .collect();
    rows.sort_by_key(|(k, _)| *k);
    rows.into_iter().map(|(_, v)| v).collect()
}

fn email_taken(email: &str) -> DomainError {
    DomainError::Conflict(format!("e-mail {email} is taken"))
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn get(&self, id: TicketId) -> Result<Option<Ticket>> {
        Ok(self.tickets.get(&id).map(|t| t.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Ticket>> {
        Ok(collect_sorted(&self.tickets, |_| true))
    }

    async fn list_by_requester(&self, requester_id: UserId) -> Result<Vec<Ticket>> {
        Ok(collect_sorted(&self.tickets, |t| t.requester_id == requester_id))
    }

    async fn list_by_assignee(&self, assignee_id: UserId) -> Result<Vec<Ticket>> {
        Ok(collect_sorted(&self.tickets, |t| {
            t.assignee_id == Some(assignee_id)
        }))
    }

    async fn insert(&self, ticket: NewTicket) -> Result<Ticket> {
        let ticket = ticket.with_id(TicketId(next(&self.ticket_seq)));
        self.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn update(&self, ticket: Ticket) -> Result<Ticket> {
        let mut slot = self
            .tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| DomainError::not_found("ticket"))?;
        *slot = ticket.clone();
        Ok(ticket)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Comment>> {
        Ok(collect_sorted(&self.comments, |_| true))
    }

    async fn list_by_ticket(&self, ticket_id: TicketId) -> Result<Vec<Comment>> {
        Ok(collect_sorted(&self.comments, |c| c.ticket_id == ticket_id))
    }

    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let comment = comment.with_id(CommentId(next(&self.comment_seq)));
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.emails.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_by_reset_token(&self, token_hash: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.reset_token_hash.as_deref() == Some(token_hash))
            .map(|u| u.clone()))
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(collect_sorted(&self.users, |_| true))
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        Ok(collect_sorted(&self.users, |u| u.role == role))
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        // The email entry is held while the row is written.
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(email_taken(&user.email)),
            Entry::Vacant(slot) => {
                let user = user.with_id(UserId(next(&self.user_seq)));
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn update(&self, user: User) -> Result<User> {
        let previous_email = self
            .users
            .get(&user.id)
            .map(|u| u.email.clone())
            .ok_or_else(|| DomainError::not_found("user"))?;

        if previous_email != user.email {
            match self.emails.entry(user.email.clone()) {
                Entry::Occupied(owner) if *owner.get() != user.id => {
                    return Err(email_taken(&user.email));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(user.id);
                }
            }
            self.emails.remove(&previous_email);
        }

        let mut slot = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| DomainError::not_found("user"))?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        if !self.users.contains_key(&id) {
            return Ok(false);
        }
        let referenced = self.tickets.iter().any(|t| t.requester_id == id)
            || self.comments.iter().any(|c| c.author_id == id);
        if referenced {
            return Err(DomainError::Conflict("record is still referenced".into()));
        }

        let Some((_, user)) = self.users.remove(&id) else {
            return Ok(false);
        };
        self.emails.remove(&user.email);
        for mut ticket in self.tickets.iter_mut() {
            if ticket.assignee_id == Some(id) {
                ticket.assignee_id = None;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{TicketPriority, TicketStatus};

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "n".into(),
            email: email.into(),
            password_hash: "h".into(),
            role,
            created_at: Utc::now(),
        }
    }

    fn new_ticket(requester: i64, assignee: Option<i64>) -> NewTicket {
        let now = Utc::now();
        NewTicket {
            title: "t".into(),
            description: String::new(),
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            requester_id: UserId(requester),
            assignee_id: assignee.map(UserId),
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_per_table() {
        let store = InMemoryStore::new();
        let a = TicketRepository::insert(&store, new_ticket(1, None)).await.unwrap();
        let b = TicketRepository::insert(&store, new_ticket(1, None)).await.unwrap();
        let u = UserRepository::insert(&store, new_user("a@x.io", Role::Admin))
            .await
            .unwrap();
        assert_eq!((a.id, b.id, u.id), (TicketId(1), TicketId(2), UserId(1)));
    }

    #[tokio::test]
    async fn deleting_a_requester_is_conflict() {
        let store = InMemoryStore::new();
        let alice = UserRepository::insert(&store, new_user("alice@x.io", Role::Customer))
            .await
            .unwrap();
        TicketRepository::insert(&store, new_ticket(alice.id.value(), None))
            .await
            .unwrap();

        let err = store.delete(alice.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(UserRepository::get(&store, alice.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_an_assignee_unassigns_their_tickets() {
        let store = InMemoryStore::new();
        let alice = UserRepository::insert(&store, new_user("alice@x.io", Role::Customer))
            .await
            .unwrap();
        let bob = UserRepository::insert(&store, new_user("bob@x.io", Role::Agent))
            .await
            .unwrap();
        let t = TicketRepository::insert(
            &store,
            new_ticket(alice.id.value(), Some(bob.id.value())),
        )
        .await
        .unwrap();

        assert!(store.delete(bob.id).await.unwrap());
        let t = TicketRepository::get(&store, t.id).await.unwrap().unwrap();
        assert_eq!(t.assignee_id, None);
        assert!(store.get_by_email("bob@x.io").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let store = InMemoryStore::new();
        UserRepository::insert(&store, new_user("a@x.io", Role::Agent))
            .await
            .unwrap();
        let err = UserRepository::insert(&store, new_user("a@x.io", Role::Customer))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn email_change_moves_the_index() {
        let store = InMemoryStore::new();
        let mut user = UserRepository::insert(&store, new_user("old@x.io", Role::Agent))
            .await
            .unwrap();
        user.email = "new@x.io".into();
        UserRepository::update(&store, user).await.unwrap();

        assert!(store.get_by_email("old@x.io").await.unwrap().is_none());
        assert!(store.get_by_email("new@x.io").await.unwrap().is_some());
        // The old address is free again.
        UserRepository::insert(&store, new_user("old@x.io", Role::Customer))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn listings_filter_by_requester_and_assignee() {
        let store = InMemoryStore::new();
        TicketRepository::insert(&store, new_ticket(7, Some(20))).await.unwrap();
        TicketRepository::insert(&store, new_ticket(8, None)).await.unwrap();
        TicketRepository::insert(&store, new_ticket(7, None)).await.unwrap();

        let mine = store.list_by_requester(UserId(7)).await.unwrap();
        assert_eq!(
            mine.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![TicketId(1), TicketId(3)]
        );
        let assigned = store.list_by_assignee(UserId(20)).await.unwrap();
        assert_eq!(assigned.len(), 1);
    }

    #[tokio::test]
    async fn updating_missing_ticket_is_not_found() {
        let store = InMemoryStore::new();
        let ghost = new_ticket(1, None).with_id(TicketId(42));
        assert_eq!(
            TicketRepository::update(&store, ghost).await,
            Err(DomainError::not_found("ticket"))
        );
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_matched() {
        let store = InMemoryStore::new();
        let u = UserRepository::insert(&store, new_user("a@x.io", Role::Agent))
            .await
            .unwrap();
        assert!(store.delete(u.id).await.unwrap());
        assert!(!store.delete(u.id).await.unwrap());
        assert!(store.get_by_email("a@x.io").await.unwrap().is_none());
    }
}
