//! Behaviour every persistence adapter must share. Each check takes a fresh
//! or shared store and only touches rows it creates itself, so the whole set
//! can run one after another against a single database.

use chrono::{DateTime, TimeZone, Utc};
use domains::{
    CommentRepository, DomainError, NewComment, NewTicket, NewUser, Role, Ticket, TicketId,
    TicketPriority, TicketRepository, TicketStatus, User, UserId, UserRepository,
};

/// Whole seconds, so stores with microsecond columns compare equal.
fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

async fn user<S: UserRepository>(store: &S, email: &str, role: Role) -> User {
    UserRepository::insert(
        store,
        NewUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".into(),
            role,
            created_at: at(8),
        },
    )
    .await
    .expect("insert user")
}

fn ticket(requester: UserId, assignee: Option<UserId>) -> NewTicket {
    NewTicket {
        title: "Contract".into(),
        description: "row mapping".into(),
        status: TicketStatus::Pending,
        priority: TicketPriority::Urgent,
        requester_id: requester,
        assignee_id: assignee,
        created_at: at(9),
        updated_at: at(10),
        closed_at: None,
    }
}

pub async fn missing_rows_are_none<S>(store: &S)
where
    S: TicketRepository + UserRepository,
{
    assert_eq!(TicketRepository::get(store, TicketId(900_001)).await, Ok(None));
    assert_eq!(UserRepository::get(store, UserId(900_001)).await, Ok(None));
    assert_eq!(store.get_by_email("nobody@contract.test").await, Ok(None));
    assert_eq!(store.get_by_reset_token("deadbeef").await, Ok(None));
}

pub async fn ticket_fields_round_trip<S>(store: &S)
where
    S: TicketRepository + UserRepository,
{
    let requester = user(store, "rt-requester@contract.test", Role::Customer).await;
    let agent = user(store, "rt-agent@contract.test", Role::Agent).await;

    let stored = TicketRepository::insert(store, ticket(requester.id, Some(agent.id)))
        .await
        .expect("insert ticket");
    let fetched = TicketRepository::get(store, stored.id).await.expect("get");
    assert_eq!(fetched.as_ref(), Some(&stored));
    assert_eq!(stored.status, TicketStatus::Pending);
    assert_eq!(stored.priority, TicketPriority::Urgent);
    assert_eq!(stored.assignee_id, Some(agent.id));

    let closed = Ticket {
        status: TicketStatus::Closed,
        closed_at: Some(at(11)),
        updated_at: at(11),
        assignee_id: None,
        ..stored
    };
    let updated = TicketRepository::update(store, closed.clone())
        .await
        .expect("update ticket");
    assert_eq!(updated, closed);
    let mine = store.list_by_requester(requester.id).await.expect("list");
    assert_eq!(mine, vec![closed]);
}

pub async fn updating_a_missing_row_is_not_found<S>(store: &S)
where
    S: TicketRepository + UserRepository,
{
    let requester = user(store, "nf@contract.test", Role::Customer).await;
    let ghost = ticket(requester.id, None).with_id(TicketId(900_002));
    let err = TicketRepository::update(store, ghost).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)), "{err:?}");

    let mut gone = requester.clone();
    gone.id = UserId(900_003);
    gone.email = "nf-ghost@contract.test".into();
    let err = UserRepository::update(store, gone).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)), "{err:?}");
}

pub async fn comments_come_back_in_creation_order<S>(store: &S)
where
    S: TicketRepository + CommentRepository + UserRepository,
{
    let author = user(store, "order@contract.test", Role::Customer).await;
    let t = TicketRepository::insert(store, ticket(author.id, None))
        .await
        .expect("insert ticket");
    for (i, internal) in [false, true, false].into_iter().enumerate() {
        CommentRepository::insert(
            store,
            NewComment {
                ticket_id: t.id,
                author_id: author.id,
                body: format!("c{i}"),
                is_internal: internal,
                created_at: at(12),
            },
        )
        .await
        .expect("insert comment");
    }
    let listed = store.list_by_ticket(t.id).await.expect("list");
    let bodies: Vec<_> = listed.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["c0", "c1", "c2"]);
    assert_eq!(
        listed.iter().map(|c| c.is_internal).collect::<Vec<_>>(),
        vec![false, true, false]
    );
    assert!(store
        .list_by_ticket(TicketId(900_004))
        .await
        .expect("list")
        .is_empty());
}

pub async fn user_emails_are_unique<S: UserRepository>(store: &S) {
    let first = user(store, "dup@contract.test", Role::Agent).await;
    let again = NewUser {
        name: "dup".into(),
        email: "dup@contract.test".into(),
        password_hash: String::new(),
        role: Role::Admin,
        created_at: at(8),
    };
    let err = UserRepository::insert(store, again).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)), "{err:?}");

    let other = user(store, "dup-other@contract.test", Role::Agent).await;
    let stolen = User {
        email: first.email.clone(),
        ..other
    };
    let err = UserRepository::update(store, stolen).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)), "{err:?}");
}

pub async fn reset_tokens_are_found_by_digest<S: UserRepository>(store: &S) {
    let mut grace = user(store, "reset@contract.test", Role::Customer).await;
    grace.reset_token_hash = Some("c0ffee".into());
    grace.reset_expires_at = Some(at(13));
    UserRepository::update(store, grace.clone())
        .await
        .expect("update user");
    assert_eq!(store.get_by_reset_token("c0ffee").await, Ok(Some(grace)));
}

pub async fn referenced_users_cannot_be_deleted<S>(store: &S)
where
    S: TicketRepository + CommentRepository + UserRepository,
{
    let requester = user(store, "del-requester@contract.test", Role::Customer).await;
    let author = user(store, "del-author@contract.test", Role::Agent).await;
    let t = TicketRepository::insert(store, ticket(requester.id, None))
        .await
        .expect("insert ticket");
    CommentRepository::insert(
        store,
        NewComment {
            ticket_id: t.id,
            author_id: author.id,
            body: "on it".into(),
            is_internal: true,
            created_at: at(12),
        },
    )
    .await
    .expect("insert comment");

    for id in [requester.id, author.id] {
        let err = store.delete(id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)), "{err:?}");
        assert!(UserRepository::get(store, id).await.expect("get").is_some());
    }
}

pub async fn deleting_an_assignee_unassigns<S>(store: &S)
where
    S: TicketRepository + UserRepository,
{
    let requester = user(store, "unassign-requester@contract.test", Role::Customer).await;
    let agent = user(store, "unassign-agent@contract.test", Role::Agent).await;
    let t = TicketRepository::insert(store, ticket(requester.id, Some(agent.id)))
        .await
        .expect("insert ticket");

    assert_eq!(store.delete(agent.id).await, Ok(true));
    assert_eq!(store.delete(agent.id).await, Ok(false));
    let t = TicketRepository::get(store, t.id)
        .await
        .expect("get")
        .expect("ticket survives");
    assert_eq!(t.assignee_id, None);
    assert_eq!(store.get_by_email(&agent.email).await, Ok(None));
}

/// Runs every check above against one store.
pub async fn run_all<S>(store: &S)
where
    S: TicketRepository + CommentRepository + UserRepository,
{
    missing_rows_are_none(store).await;
    ticket_fields_round_trip(store).await;
    updating_a_missing_row_is_not_found(store).await;
    comments_come_back_in_creation_order(store).await;
    user_emails_are_unique(store).await;
    reset_tokens_are_found_by_digest(store).await;
    referenced_users_cannot_be_deleted(store).await;
    deleting_an_assignee_unassigns(store).await;
}
