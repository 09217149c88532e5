use std::sync::Arc;

use api_adapters::{router, AppState};
use auth_adapters::{Argon2PasswordHasher, JwtTokenService};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use domains::{Actor, NewUser, PasswordHasher, Role, TokenService, UserId, UserRepository};
use serde_json::Value;
use storage_adapters::InMemoryStore;
use tower::ServiceExt;

pub const TEST_SIGNING_KEY: &[u8] = b"integration-test-signing-key";

/// Password given to every seeded account.
pub const SEED_PASSWORD: &str = "hunter2-but-longer";

pub struct TestApp {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    pub tokens: Arc<JwtTokenService>,
    hasher: Arc<Argon2PasswordHasher>,
}

/// A user inserted directly into the directory, with a ready-made token.
#[derive(Debug, Clone)]
pub struct Seeded {
    pub id: UserId,
    pub email: String,
    pub token: String,
}

#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// The `message` of an error body, or "" for success bodies.
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn id(&self) -> i64 {
        self.body["id"].as_i64().expect("response carries an id")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let tokens = Arc::new(JwtTokenService::new(
            TEST_SIGNING_KEY,
            "helpdesk",
            Duration::hours(24),
        ));
        let hasher = Arc::new(Argon2PasswordHasher::new());
        let state = AppState::new(
            store.clone(),
            store.clone(),
            store.clone(),
            hasher.clone(),
            tokens.clone(),
        );
        Self {
            app: router(state),
            store,
            tokens,
            hasher,
        }
    }

    pub async fn seed(&self, name: &str, role: Role) -> Seeded {
        let email = format!("{}@example.com", name.to_lowercase());
        let user = self
            .store
            .insert(NewUser {
                name: name.to_string(),
                email: email.clone(),
                password_hash: self.hasher.hash(SEED_PASSWORD).expect("hash"),
                role,
                created_at: Utc::now(),
            })
            .await
            .expect("seed user");
        let token = self
            .tokens
            .issue(&Actor::new(user.id, role), Utc::now())
            .expect("issue token")
            .token;
        Seeded {
            id: user.id,
            email,
            token,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => req.body(Body::empty()),
        }
        .expect("request");

        let resp = self.app.clone().oneshot(req).await.expect("infallible");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> Reply {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }
}
