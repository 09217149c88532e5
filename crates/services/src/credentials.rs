//! # Credential Verifier
//!
//! Turns the raw `Authorization` header into an [`Actor`]. Signature and
//! expiry checks are delegated to the [`TokenService`] port; this module
//! owns the header grammar and the per-request directory lookup.

use std::sync::Arc;

use domains::{Actor, DomainError, Result, TokenService, UserRepository};
use tracing::{debug, warn};

const BEARER: &str = "bearer ";

/// Extracts the token from `Bearer <token>`.
///
/// `MissingCredential` when there is no header, `MalformedCredential` when
/// the scheme is wrong or the token is empty.
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or(DomainError::MissingCredential)?;
    let scheme = header
        .get(..BEARER.len())
        .ok_or(DomainError::MalformedCredential)?;
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(DomainError::MalformedCredential);
    }
    let token = header[BEARER.len()..].trim();
    if token.is_empty() {
        return Err(DomainError::MalformedCredential);
    }
    Ok(token)
}

#[derive(Clone)]
pub struct CredentialVerifier {
    tokens: Arc<dyn TokenService>,
    users: Arc<dyn UserRepository>,
}

impl CredentialVerifier {
    pub fn new(tokens: Arc<dyn TokenService>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }

    /// Stateless check: header grammar plus signature/expiry/role claim.
    pub fn verify(&self, header: Option<&str>) -> Result<Actor> {
        let token = bearer_token(header)?;
        self.tokens.verify(token)
    }

    /// [`verify`](Self::verify), then re-resolve the subject in the user
    /// directory so that role changes and deletions apply on the very next
    /// request. Nothing is cached between requests.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Actor> {
        let claimed = self.verify(header)?;
        let Some(user) = self.users.get(claimed.id).await? else {
            warn!(actor_id = %claimed.id, "credential subject no longer exists");
            return Err(DomainError::InvalidCredential);
        };
        if user.role != claimed.role {
            debug!(
                actor_id = %claimed.id,
                claimed = %claimed.role,
                current = %user.role,
                "role claim is stale, using directory role"
            );
        }
        Ok(user.actor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{MockTokenService, MockUserRepository, Role, User, UserId};

    #[test]
    fn header_grammar() {
        assert_eq!(bearer_token(None), Err(DomainError::MissingCredential));
        assert_eq!(
            bearer_token(Some("Token abc")),
            Err(DomainError::MalformedCredential)
        );
        assert_eq!(bearer_token(Some("abc")), Err(DomainError::MalformedCredential));
        assert_eq!(
            bearer_token(Some("Bearer ")),
            Err(DomainError::MalformedCredential)
        );
        assert_eq!(bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(Some("bearer abc")), Ok("abc"));
    }

    fn user(id: i64, role: Role) -> User {
        User {
            id: UserId(id),
            name: "someone".into(),
            email: "someone@example.com".into(),
            password_hash: String::new(),
            role,
            reset_token_hash: None,
            reset_expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn directory_role_wins_over_stale_claim() {
        let mut tokens = MockTokenService::new();
        tokens
            .expect_verify()
            .returning(|_| Ok(Actor::new(5, Role::Agent)));
        let mut users = MockUserRepository::new();
        users
            .expect_get()
            .returning(|id| Ok(Some(user(id.value(), Role::Customer))));

        let verifier = CredentialVerifier::new(Arc::new(tokens), Arc::new(users));
        let actor = verifier.authenticate(Some("Bearer t")).await.unwrap();
        assert_eq!(actor, Actor::new(5, Role::Customer));
    }

    #[tokio::test]
    async fn deleted_subject_is_invalid_credential() {
        let mut tokens = MockTokenService::new();
        tokens
            .expect_verify()
            .returning(|_| Ok(Actor::new(5, Role::Admin)));
        let mut users = MockUserRepository::new();
        users.expect_get().returning(|_| Ok(None));

        let verifier = CredentialVerifier::new(Arc::new(tokens), Arc::new(users));
        assert_eq!(
            verifier.authenticate(Some("Bearer t")).await,
            Err(DomainError::InvalidCredential)
        );
    }

    #[tokio::test]
    async fn token_is_not_consulted_without_a_header() {
        let mut tokens = MockTokenService::new();
        tokens.expect_verify().never();
        let mut users = MockUserRepository::new();
        users.expect_get().never();

        let verifier = CredentialVerifier::new(Arc::new(tokens), Arc::new(users));
        assert_eq!(
            verifier.authenticate(None).await,
            Err(DomainError::MissingCredential)
        );
    }
}
