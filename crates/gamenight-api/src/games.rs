use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use gamenight_db::EventSelector;
use gamenight_engine::coordinator::{GameTarget, GameUpdate, NewGame};
use gamenight_types::api::{AddGameRequest, DeleteGameRequest, EventResponse, UpdateGameRequest};

use crate::AppState;
use crate::error::ApiError;
use crate::events::outcome_response;

pub async fn add_game(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(req): Json<AddGameRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let added = state
        .coordinator
        .add_game(
            &EventSelector::ById(event_id),
            NewGame {
                name: req.name,
                max_players: req.max_players,
                catalog_url: req.catalog_url,
                requester_id: req.user_id,
                join_as: req.user_name,
            },
        )
        .await?;
    info!("Web: game {} added by {}", added.board_game_id, req.user_id);

    Ok(Json(outcome_response(&state, added.outcome).await?))
}

pub async fn update_game(
    State(state): State<AppState>,
    Path((event_id, game_id)): Path<(String, i64)>,
    Json(req): Json<UpdateGameRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let outcome = state
        .coordinator
        .update_game(
            GameTarget::InEvent {
                event_id,
                board_game_id: game_id,
            },
            req.user_id,
            GameUpdate {
                max_players: req.max_players,
                catalog_url: req.catalog_url,
                unlink: req.unlink,
            },
        )
        .await?;

    Ok(Json(outcome_response(&state, outcome).await?))
}

pub async fn delete_game(
    State(state): State<AppState>,
    Path((event_id, game_id)): Path<(String, i64)>,
    Json(req): Json<DeleteGameRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let outcome = state
        .coordinator
        .delete_game(&event_id, game_id, req.user_id)
        .await?;
    info!("Web: game {} deleted by {}", game_id, req.user_id);

    Ok(Json(outcome_response(&state, outcome).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{app, call, seeded_event};

    #[tokio::test]
    async fn add_game_defaults_to_five_seats() {
        let app = app();
        let event_id = seeded_event(&app, "Friday Night").await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/events/{event_id}/add-game"),
            Some(json!({ "name": "Catan", "user_id": 42, "user_name": "alice" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let game = &body["board_games"][0];
        assert_eq!(game["name"], "Catan");
        assert_eq!(game["max_players"], 5);
        assert_eq!(game["catalog"], serde_json::Value::Null);
        assert_eq!(game["participants"][0]["display_name"], "alice");
        assert_eq!(*app.messenger.edits.lock().unwrap(), vec![77]);
    }

    #[tokio::test]
    async fn add_game_validates_input() {
        let app = app();
        let event_id = seeded_event(&app, "Friday Night").await;
        let uri = format!("/events/{event_id}/add-game");

        for body in [
            json!({ "name": "Catan", "user_id": 42, "max_players": 0 }),
            json!({ "name": "Catan", "user_id": 42, "catalog_url": "https://example.com/boardgame/13/catan" }),
            json!({ "name": "", "user_id": 42 }),
        ] {
            let (status, _) = call(&app, "POST", &uri, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (_, body) = call(&app, "GET", &format!("/events/{event_id}"), None).await;
        assert_eq!(body["board_games"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn locked_event_rejects_other_users() {
        let app = app();
        let event_id = seeded_event(&app, "🔒 Friday Night").await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/events/{event_id}/add-game"),
            Some(json!({ "name": "Catan", "user_id": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "event is locked");
    }

    #[tokio::test]
    async fn update_then_delete_game() {
        let app = app();
        let event_id = seeded_event(&app, "Friday Night").await;
        let (_, body) = call(
            &app,
            "POST",
            &format!("/events/{event_id}/add-game"),
            Some(json!({ "name": "Azul", "user_id": 42 })),
        )
        .await;
        let game_id = body["board_games"][0]["id"].as_i64().unwrap();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/events/{event_id}/games/{game_id}"),
            Some(json!({ "max_players": 3, "user_id": 7, "unlink": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["board_games"][0]["max_players"], 3);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/events/{event_id}/games/{game_id}/delete"),
            Some(json!({ "user_id": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["board_games"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn failed_chat_push_is_a_warning() {
        let app = app();
        let event_id = seeded_event(&app, "Friday Night").await;
        *app.messenger.broken.lock().unwrap() = true;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/events/{event_id}/add-game"),
            Some(json!({ "name": "Azul", "user_id": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["board_games"][0]["name"], "Azul");
        assert!(body["warning"].as_str().unwrap().contains("bot was kicked"));
    }
}
