//! # Extractors
//!
//! [`Authorized`] runs the Credential Verifier and the Access Guard before a
//! handler body executes and yields the [`Actor`] that the handler passes
//! on explicitly. The `Api*` wrappers turn axum's rejections into
//! `Validation` errors so every 4xx shares one body shape.

use std::marker::PhantomData;

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use domains::{Actor, DomainError};
use serde::de::DeserializeOwned;
use services::{authorize_scope, RouteScope};

use crate::error::ApiError;
use crate::state::AppState;

/// Compile-time binding of a route group to its [`RouteScope`].
pub trait Scope: Send + Sync + 'static {
    const SCOPE: RouteScope;
}

pub struct AdminScope;
pub struct AgentScope;
pub struct CustomerScope;

impl Scope for AdminScope {
    const SCOPE: RouteScope = RouteScope::Admin;
}

impl Scope for AgentScope {
    const SCOPE: RouteScope = RouteScope::Agent;
}

impl Scope for CustomerScope {
    const SCOPE: RouteScope = RouteScope::Customer;
}

/// An actor whose credential verified and whose current role is in the
/// scope's allow-list.
pub struct Authorized<S: Scope> {
    pub actor: Actor,
    _scope: PhantomData<S>,
}

impl<S: Scope> FromRequestParts<AppState> for Authorized<S> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| DomainError::MalformedCredential))
            .transpose()?;

        let actor = state.verifier.authenticate(header).await?;
        authorize_scope(&actor, S::SCOPE).map_err(ApiError::role_denied)?;

        tracing::debug!(actor_id = %actor.id, role = %actor.role, scope = S::SCOPE.as_str(), "authorized");
        Ok(Self {
            actor,
            _scope: PhantomData,
        })
    }
}

pub type AdminActor = Authorized<AdminScope>;
pub type AgentActor = Authorized<AgentScope>;
pub type CustomerActor = Authorized<CustomerScope>;

/// JSON body; malformed input is a `Validation` error.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(DomainError::validation(rejection.body_text()).into()),
        }
    }
}

/// Path parameters; a non-numeric id is a `Validation` error.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(DomainError::validation(rejection.body_text()).into()),
        }
    }
}

pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(DomainError::validation(rejection.body_text()).into()),
        }
    }
}
