//! # AccountService
//!
//! Login, self-registration, password reset and admin user administration
//! over the user-directory port.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::{
    Actor, DomainError, IssuedToken, LoginRequest, NewUser, PasswordHasher, PasswordResetIssued,
    RegisterRequest, ResetPasswordRequest, Result, Role, TokenService, User, UserCreate, UserId,
    UserRepository, UserUpdate,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::access::{authorize_scope, RouteScope};

/// Reset tokens are valid for one hour.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;
const RESET_TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Unknown e-mail and wrong password are indistinguishable.
    pub async fn login(&self, req: LoginRequest) -> Result<IssuedToken> {
        let email = normalize_email(&req.email)?;
        let Some(user) = self.users.get_by_email(&email).await? else {
            warn!("login attempt for unknown account");
            return Err(DomainError::InvalidCredential);
        };
        if !self.hasher.verify(&req.password, &user.password_hash) {
            warn!(user_id = %user.id, "login attempt with wrong password");
            return Err(DomainError::InvalidCredential);
        }
        let issued = self.tokens.issue(&user.actor(), Utc::now())?;
        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(issued)
    }

    /// Public sign-up. The role is always Customer.
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let user = self
            .insert_user(req.name, req.email, req.password, Role::Customer)
            .await?;
        info!(user_id = %user.id, "customer registered");
        Ok(user)
    }

    /// Issues a fresh reset token, replacing any outstanding one. Only the
    /// SHA-256 digest is persisted.
    pub async fn forgot_password(&self, email: &str) -> Result<PasswordResetIssued> {
        let email = normalize_email(email)?;
        let mut user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))?;

        let token = reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        user.reset_token_hash = Some(digest(&token));
        user.reset_expires_at = Some(expires_at);
        let user = self.users.update(user).await?;

        info!(user_id = %user.id, "password reset token issued");
        Ok(PasswordResetIssued { token, expires_at })
    }

    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<()> {
        let invalid = || DomainError::validation("invalid or expired token");
        if req.token.trim().is_empty() {
            return Err(invalid());
        }
        let new_password = non_empty_password(&req.new_password)?;

        let mut user = self
            .users
            .get_by_reset_token(&digest(req.token.trim()))
            .await?
            .ok_or_else(invalid)?;
        match user.reset_expires_at {
            Some(expires) if expires > Utc::now() => {}
            _ => return Err(invalid()),
        }

        user.password_hash = self.hasher.hash(new_password)?;
        user.reset_token_hash = None;
        user.reset_expires_at = None;
        let user = self.users.update(user).await?;
        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    pub async fn list_users(&self, actor: &Actor) -> Result<Vec<User>> {
        authorize_scope(actor, RouteScope::Admin)?;
        self.users.list().await
    }

    pub async fn list_users_by_role(&self, actor: &Actor, role: Role) -> Result<Vec<User>> {
        authorize_scope(actor, RouteScope::Admin)?;
        self.users.list_by_role(role).await
    }

    pub async fn get_user(&self, actor: &Actor, id: UserId) -> Result<User> {
        authorize_scope(actor, RouteScope::Admin)?;
        self.load(id).await
    }

    pub async fn create_user(&self, actor: &Actor, req: UserCreate) -> Result<User> {
        authorize_scope(actor, RouteScope::Admin)?;
        let user = self
            .insert_user(req.name, req.email, req.password, req.role)
            .await?;
        info!(user_id = %user.id, role = %user.role, created_by = %actor.id, "user created");
        Ok(user)
    }

    /// A role change here applies on the user's next request, since the
    /// guard re-reads the directory every time.
    pub async fn update_user(&self, actor: &Actor, id: UserId, req: UserUpdate) -> Result<User> {
        authorize_scope(actor, RouteScope::Admin)?;
        let mut user = self.load(id).await?;
        if let Some(name) = req.name {
            user.name = non_empty_name(&name)?;
        }
        if let Some(email) = req.email {
            let email = normalize_email(&email)?;
            if email != user.email {
                if let Some(existing) = self.users.get_by_email(&email).await? {
                    if existing.id != user.id {
                        return Err(DomainError::Conflict(format!("e-mail {email} is taken")));
                    }
                }
            }
            user.email = email;
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        let user = self.users.update(user).await?;
        info!(user_id = %user.id, role = %user.role, updated_by = %actor.id, "user updated");
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &Actor, id: UserId) -> Result<()> {
        authorize_scope(actor, RouteScope::Admin)?;
        if !self.users.delete(id).await? {
            return Err(DomainError::not_found("user"));
        }
        info!(user_id = %id, deleted_by = %actor.id, "user deleted");
        Ok(())
    }

    async fn insert_user(
        &self,
        name: String,
        email: String,
        password: String,
        role: Role,
    ) -> Result<User> {
        let name = non_empty_name(&name)?;
        let email = normalize_email(&email)?;
        let password = non_empty_password(&password)?;
        let password_hash = self.hasher.hash(password)?;
        self.users
            .insert(NewUser {
                name,
                email,
                password_hash,
                role,
                created_at: Utc::now(),
            })
            .await
    }

    async fn load(&self, id: UserId) -> Result<User> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }
}

/// 32 random bytes, hex encoded.
fn reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::validation("a valid e-mail address is required")),
    }
}

fn non_empty_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    Ok(name.to_string())
}

fn non_empty_password(raw: &str) -> Result<&str> {
    if raw.is_empty() {
        return Err(DomainError::validation("password must not be empty"));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockPasswordHasher, MockTokenService, MockUserRepository};

    fn stored(id: i64, role: Role) -> User {
        User {
            id: UserId(id),
            name: "Grace".into(),
            email: "grace@example.com".into(),
            password_hash: "hash:pw".into(),
            role,
            reset_token_hash: None,
            reset_expires_at: None,
            created_at: Utc::now(),
        }
    }

    fn fake_hasher() -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|pw| Ok(format!("hash:{pw}")));
        hasher
            .expect_verify()
            .returning(|pw, hash| hash == format!("hash:{pw}"));
        hasher
    }

    #[tokio::test]
    async fn register_forces_customer_role() {
        let mut users = MockUserRepository::new();
        users
            .expect_insert()
            .withf(|u: &NewUser| u.role == Role::Customer && u.email == "new@example.com")
            .returning(|u| Ok(u.with_id(UserId(11))));

        let svc = AccountService::new(
            Arc::new(users),
            Arc::new(fake_hasher()),
            Arc::new(MockTokenService::new()),
        );
        let user = svc
            .register(RegisterRequest {
                name: "New".into(),
                email: " New@Example.com ".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.password_hash, "hash:pw");
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_invalid_credential() {
        let mut users = MockUserRepository::new();
        users
            .expect_get_by_email()
            .returning(|_| Ok(Some(stored(3, Role::Agent))));
        let mut tokens = MockTokenService::new();
        tokens.expect_issue().never();

        let svc = AccountService::new(Arc::new(users), Arc::new(fake_hasher()), Arc::new(tokens));
        let err = svc
            .login(LoginRequest {
                email: "grace@example.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidCredential);
    }

    #[tokio::test]
    async fn login_issues_token_for_directory_role() {
        let mut users = MockUserRepository::new();
        users
            .expect_get_by_email()
            .returning(|_| Ok(Some(stored(3, Role::Agent))));
        let mut tokens = MockTokenService::new();
        tokens
            .expect_issue()
            .withf(|actor, _| *actor == Actor::new(3, Role::Agent))
            .returning(|_, now| {
                Ok(IssuedToken {
                    token: "signed".into(),
                    expires_at: now + Duration::hours(24),
                })
            });

        let svc = AccountService::new(Arc::new(users), Arc::new(fake_hasher()), Arc::new(tokens));
        let issued = svc
            .login(LoginRequest {
                email: "grace@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();
        assert_eq!(issued.token, "signed");
    }

    #[tokio::test]
    async fn forgot_password_stores_only_the_digest() {
        let mut users = MockUserRepository::new();
        users
            .expect_get_by_email()
            .returning(|_| Ok(Some(stored(3, Role::Customer))));
        users
            .expect_update()
            .withf(|u: &User| {
                u.reset_token_hash.as_ref().is_some_and(|h| h.len() == 64)
                    && u.reset_expires_at.is_some()
            })
            .returning(Ok);

        let svc = AccountService::new(
            Arc::new(users),
            Arc::new(fake_hasher()),
            Arc::new(MockTokenService::new()),
        );
        let issued = svc.forgot_password("grace@example.com").await.unwrap();
        assert_eq!(hex::decode(&issued.token).unwrap().len(), 32);
        assert_ne!(issued.token, reset_token());
        assert!(issued.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let mut users = MockUserRepository::new();
        users.expect_get_by_reset_token().returning(|_| {
            let mut u = stored(3, Role::Customer);
            u.reset_token_hash = Some("x".into());
            u.reset_expires_at = Some(Utc::now() - Duration::minutes(1));
            Ok(Some(u))
        });
        users.expect_update().never();

        let svc = AccountService::new(
            Arc::new(users),
            Arc::new(fake_hasher()),
            Arc::new(MockTokenService::new()),
        );
        let err = svc
            .reset_password(ResetPasswordRequest {
                token: "abc".into(),
                new_password: "new".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn non_admin_cannot_list_users() {
        let svc = AccountService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(fake_hasher()),
            Arc::new(MockTokenService::new()),
        );
        let agent = Actor::new(2, Role::Agent);
        assert!(matches!(
            svc.list_users(&agent).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn deleting_missing_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_delete().returning(|_| Ok(false));
        let svc = AccountService::new(
            Arc::new(users),
            Arc::new(fake_hasher()),
            Arc::new(MockTokenService::new()),
        );
        let admin = Actor::new(1, Role::Admin);
        assert_eq!(
            svc.delete_user(&admin, UserId(99)).await,
            Err(DomainError::not_found("user"))
        );
    }
}
