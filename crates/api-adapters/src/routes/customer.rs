//! `/customer/...`: every role. Ownership is enforced per ticket.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use domains::{
    Comment, CommentCreate, CustomerTicketCreate, CustomerTicketUpdate, Ticket, TicketDetail,
    TicketId,
};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, CustomerActor};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customer/tickets", get(list_requested).post(create_ticket))
        .route("/customer/tickets/{id}", get(get_ticket).put(update_ticket))
        .route(
            "/customer/tickets/{id}/comments",
            get(list_comments).post(create_comment),
        )
}

/// Tickets the caller opened.
async fn list_requested(
    State(state): State<AppState>,
    auth: CustomerActor,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list_requested(&auth.actor).await?))
}

async fn create_ticket(
    State(state): State<AppState>,
    auth: CustomerActor,
    ApiJson(req): ApiJson<CustomerTicketCreate>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let ticket = state.tickets.create_for_self(&auth.actor, req).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn get_ticket(
    State(state): State<AppState>,
    auth: CustomerActor,
    ApiPath(id): ApiPath<TicketId>,
) -> ApiResult<Json<TicketDetail>> {
    Ok(Json(state.tickets.get(&auth.actor, id).await?))
}

/// Only `{"status": "Closed"}` is accepted here.
async fn update_ticket(
    State(state): State<AppState>,
    auth: CustomerActor,
    ApiPath(id): ApiPath<TicketId>,
    ApiJson(patch): ApiJson<CustomerTicketUpdate>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.tickets.update_as_customer(&auth.actor, id, patch).await?))
}

async fn list_comments(
    State(state): State<AppState>,
    auth: CustomerActor,
    ApiPath(id): ApiPath<TicketId>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.list_for_ticket(&auth.actor, id).await?))
}

async fn create_comment(
    State(state): State<AppState>,
    auth: CustomerActor,
    ApiPath(id): ApiPath<TicketId>,
    ApiJson(req): ApiJson<CommentCreate>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state.comments.create(&auth.actor, id, req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
