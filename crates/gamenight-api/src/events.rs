use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};

use gamenight_db::EventSelector;
use gamenight_engine::format::{event_path, updated_at_line};
use gamenight_engine::{EngineError, Invalid, MutationOutcome, PushStatus};
use gamenight_types::api::{EventResponse, GameResponse, IndexQuery, IndexResponse};
use gamenight_types::links::validate_event_id;
use gamenight_types::models::Event;

use crate::AppState;
use crate::error::ApiError;

/// Mini-app entry point. A start parameter is forwarded to its event view.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Response, ApiError> {
    let Some(event_id) = query.event_id() else {
        let bot_name = state.coordinator.settings().bot_name.clone();
        return Ok(Json(IndexResponse { bot_name }).into_response());
    };

    if !validate_event_id(event_id) {
        return Err(EngineError::Validation(Invalid::EventId).into());
    }
    Ok(Redirect::to(&event_path(event_id)).into_response())
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state.coordinator.load(&EventSelector::ById(event_id)).await?;
    Ok(Json(event_response(&state, event, None).await?))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path((event_id, game_id)): Path<(String, i64)>,
) -> Result<Json<GameResponse>, ApiError> {
    let event = state.coordinator.load(&EventSelector::ById(event_id)).await?;
    let game = event
        .board_game(game_id)
        .cloned()
        .ok_or(EngineError::NotFound("game"))?;

    Ok(Json(GameResponse {
        event_id: event.id,
        event_name: event.name,
        game,
    }))
}

/// Web rendering of a mutation result. A failed chat push becomes a warning.
pub(crate) async fn outcome_response(
    state: &AppState,
    outcome: MutationOutcome,
) -> Result<EventResponse, ApiError> {
    let warning = match outcome.push {
        PushStatus::Failed(reason) => Some(reason),
        _ => None,
    };
    event_response(state, outcome.event, warning).await
}

async fn event_response(
    state: &AppState,
    event: Event,
    warning: Option<String>,
) -> Result<EventResponse, ApiError> {
    let language = state.coordinator.language_for(event.chat_id).await?;
    let updated_at = updated_at_line(&state.coordinator.format_context(&language));
    Ok(EventResponse {
        event,
        updated_at,
        warning,
    })
}
