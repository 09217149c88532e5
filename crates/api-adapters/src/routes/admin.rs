//! `/admin/...`: Admin only.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use domains::{
    AdminCommentCreate, AdminTicketCreate, AdminTicketUpdate, Comment, CommentCreate, Role,
    Ticket, TicketDetail, TicketId, User, UserCreate, UserId, UserUpdate,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::{AdminActor, ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/tickets", get(list_tickets).post(create_ticket))
        .route("/admin/tickets/{id}", get(get_ticket).put(update_ticket))
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/admin/comments", get(list_comments).post(create_comment))
        .route("/admin/comments/ticket/{id}", get(list_ticket_comments))
        .route("/admin/metrics", get(metrics))
}

async fn list_tickets(
    State(state): State<AppState>,
    auth: AdminActor,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list_all(&auth.actor).await?))
}

async fn create_ticket(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiJson(req): ApiJson<AdminTicketCreate>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let ticket = state.tickets.create_as_admin(&auth.actor, req).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn get_ticket(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiPath(id): ApiPath<TicketId>,
) -> ApiResult<Json<TicketDetail>> {
    Ok(Json(state.tickets.get(&auth.actor, id).await?))
}

async fn update_ticket(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiPath(id): ApiPath<TicketId>,
    ApiJson(patch): ApiJson<AdminTicketUpdate>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.tickets.update_as_admin(&auth.actor, id, patch).await?))
}

#[derive(Debug, Deserialize)]
struct UserFilter {
    role: Option<Role>,
}

async fn list_users(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<Json<Vec<User>>> {
    let users = match filter.role {
        Some(role) => state.accounts.list_users_by_role(&auth.actor, role).await?,
        None => state.accounts.list_users(&auth.actor).await?,
    };
    Ok(Json(users))
}

async fn create_user(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiJson(req): ApiJson<UserCreate>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.accounts.create_user(&auth.actor, req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.accounts.get_user(&auth.actor, id).await?))
}

async fn update_user(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(req): ApiJson<UserUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.accounts.update_user(&auth.actor, id, req).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<StatusCode> {
    state.accounts.delete_user(&auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_comments(
    State(state): State<AppState>,
    auth: AdminActor,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.list_all(&auth.actor).await?))
}

async fn create_comment(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiJson(req): ApiJson<AdminCommentCreate>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let body = CommentCreate {
        body: req.body,
        is_internal: req.is_internal,
    };
    let comment = state.comments.create(&auth.actor, req.ticket_id, body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_ticket_comments(
    State(state): State<AppState>,
    auth: AdminActor,
    ApiPath(id): ApiPath<TicketId>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.list_for_ticket(&auth.actor, id).await?))
}

async fn metrics(State(state): State<AppState>, _auth: AdminActor) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
        state.metrics.render(),
    )
}
