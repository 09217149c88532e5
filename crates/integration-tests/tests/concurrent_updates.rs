//! Concurrent agent updates on one ticket are not serialized. Both calls
//! succeed and whichever write lands last is what gets stored.

use axum::http::StatusCode;
use domains::{Role, TicketId, TicketRepository};
use integration_tests::TestApp;
use serde_json::json;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_claims_end_with_one_of_the_claimants() {
    let app = Arc::new(TestApp::new());
    let alice = app.seed("Alice", Role::Customer).await;
    let bob = app.seed("Bob", Role::Agent).await;
    let carol = app.seed("Carol", Role::Agent).await;

    let t = app
        .post("/customer/tickets", &alice.token, json!({"title": "Race"}))
        .await
        .id();
    let uri = format!("/agent/tickets/{t}");

    let (first, second) = tokio::join!(
        tokio::spawn({
            let app = app.clone();
            let uri = uri.clone();
            let token = bob.token.clone();
            async move {
                app.put(&uri, &token, json!({"assignee_id": 0, "priority": "High"}))
                    .await
            }
        }),
        tokio::spawn({
            let app = app.clone();
            let uri = uri.clone();
            let token = carol.token.clone();
            async move {
                app.put(&uri, &token, json!({"assignee_id": 0, "priority": "Low"}))
                    .await
            }
        }),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);

    let stored = app.store.get(TicketId(t)).await.unwrap().unwrap();
    let winner = stored.assignee_id.expect("someone holds the ticket");
    assert!(winner == bob.id || winner == carol.id);
    // Priority and assignee come from the same write.
    let expected_priority = if winner == bob.id { "High" } else { "Low" };
    assert_eq!(stored.priority.as_str(), expected_priority);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_status_edits_by_the_assignee_both_succeed() {
    let app = Arc::new(TestApp::new());
    let alice = app.seed("Alice", Role::Customer).await;
    let bob = app.seed("Bob", Role::Agent).await;

    let t = app
        .post("/customer/tickets", &alice.token, json!({"title": "Race"}))
        .await
        .id();
    let uri = format!("/agent/tickets/{t}");
    app.put(&uri, &bob.token, json!({"assignee_id": bob.id})).await;

    let mut handles = Vec::new();
    for status in ["Pending", "Open", "Pending", "Open"] {
        let app = app.clone();
        let uri = uri.clone();
        let token = bob.token.clone();
        handles.push(tokio::spawn(async move {
            app.put(&uri, &token, json!({"status": status})).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().status, StatusCode::OK);
    }

    let stored = app.store.get(TicketId(t)).await.unwrap().unwrap();
    assert_eq!(stored.assignee_id, Some(bob.id));
    assert!(stored.closed_at.is_none());
}
