use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use gamenight_types::api::{JoinRequest, LeaveRequest};

use crate::AppState;
use crate::error::ApiError;
use crate::events::outcome_response;

pub async fn join(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(req): Json<JoinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .coordinator
        .join(&event_id, req.game_id, req.user_id, &req.user_name)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome_response(&state, outcome).await?)))
}

pub async fn leave(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(req): Json<LeaveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.coordinator.leave(&event_id, req.user_id).await?;
    Ok(Json(outcome_response(&state, outcome).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::test_support::{app, call, seeded_event};

    async fn add(app: &crate::test_support::TestApp, event_id: &str, name: &str) -> i64 {
        let (_, body) = call(
            app,
            "POST",
            &format!("/events/{event_id}/add-game"),
            Some(json!({ "name": name, "user_id": 42 })),
        )
        .await;
        body["board_games"]
            .as_array()
            .unwrap()
            .iter()
            .find(|g| g["name"] == name)
            .and_then(|g| g["id"].as_i64())
            .unwrap()
    }

    fn seats(body: &Value) -> Vec<(String, String)> {
        body["board_games"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|g| {
                g["participants"].as_array().unwrap().iter().map(move |p| {
                    (
                        g["name"].as_str().unwrap().to_string(),
                        p["display_name"].as_str().unwrap().to_string(),
                    )
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn join_moves_seat_and_leave_clears_it() {
        let app = app();
        let event_id = seeded_event(&app, "Friday Night").await;
        let azul = add(&app, &event_id, "Azul").await;
        let brass = add(&app, &event_id, "Brass").await;
        let uri = format!("/events/{event_id}/join");

        let (status, _) = call(&app, "POST", &uri, Some(json!({ "game_id": azul, "user_id": 7, "user_name": "bob" }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = call(&app, "POST", &uri, Some(json!({ "game_id": brass, "user_id": 7, "user_name": "bob" }))).await;
        assert_eq!(seats(&body), vec![("Brass".to_string(), "bob".to_string())]);

        let leave = format!("/events/{event_id}/leave");
        let (status, body) = call(&app, "POST", &leave, Some(json!({ "user_id": 7 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(seats(&body).is_empty());

        let (status, _) = call(&app, "POST", &leave, Some(json!({ "user_id": 7 }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn join_unknown_game_is_404() {
        let app = app();
        let event_id = seeded_event(&app, "Friday Night").await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/events/{event_id}/join"),
            Some(json!({ "game_id": 404, "user_id": 7, "user_name": "bob" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "game not found");
    }
}
