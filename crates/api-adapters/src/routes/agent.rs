//! `/agent/...`: Admin and Agent.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use domains::{AgentTicketUpdate, Comment, CommentCreate, Ticket, TicketDetail, TicketId};

use crate::error::ApiResult;
use crate::extract::{AgentActor, ApiJson, ApiPath};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/agent/tickets", get(list_assigned))
        .route("/agent/tickets/all", get(list_all))
        .route("/agent/tickets/{id}", get(get_ticket).put(update_ticket))
        .route(
            "/agent/tickets/{id}/comments",
            get(list_comments).post(create_comment),
        )
}

/// Tickets assigned to the caller.
async fn list_assigned(
    State(state): State<AppState>,
    auth: AgentActor,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list_assigned(&auth.actor).await?))
}

async fn list_all(State(state): State<AppState>, auth: AgentActor) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list_all(&auth.actor).await?))
}

async fn get_ticket(
    State(state): State<AppState>,
    auth: AgentActor,
    ApiPath(id): ApiPath<TicketId>,
) -> ApiResult<Json<TicketDetail>> {
    Ok(Json(state.tickets.get(&auth.actor, id).await?))
}

async fn update_ticket(
    State(state): State<AppState>,
    auth: AgentActor,
    ApiPath(id): ApiPath<TicketId>,
    ApiJson(patch): ApiJson<AgentTicketUpdate>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.tickets.update_as_agent(&auth.actor, id, patch).await?))
}

async fn list_comments(
    State(state): State<AppState>,
    auth: AgentActor,
    ApiPath(id): ApiPath<TicketId>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.list_for_ticket(&auth.actor, id).await?))
}

async fn create_comment(
    State(state): State<AppState>,
    auth: AgentActor,
    ApiPath(id): ApiPath<TicketId>,
    ApiJson(req): ApiJson<CommentCreate>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state.comments.create(&auth.actor, id, req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
