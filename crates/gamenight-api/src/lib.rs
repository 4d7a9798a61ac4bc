pub mod error;
pub mod events;
pub mod games;
pub mod participants;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use gamenight_engine::Coordinator;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub coordinator: Coordinator,
}

/// Web view routes. Layers (tracing, CORS) are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(events::index))
        .route("/events/{event_id}", get(events::get_event))
        .route("/events/{event_id}/games/{game_id}", get(events::get_game))
        .route("/events/{event_id}/games/{game_id}", post(games::update_game))
        .route("/events/{event_id}/games/{game_id}/delete", post(games::delete_game))
        .route("/events/{event_id}/add-game", post(games::add_game))
        .route("/events/{event_id}/join", post(participants::join))
        .route("/events/{event_id}/leave", post(participants::leave))
        .with_state(state)
}
