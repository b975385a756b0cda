use crate::interface_adapters::handlers::{
    activate_checkpoint, finish, get_state, get_tower, join, leaderboard, leave, personal_best,
    reset_to_checkpoint, update_height,
};
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/tower", get(get_tower))
        .route("/leaderboard", get(leaderboard))
        .route("/players", post(join))
        .route("/players/{player_id}", delete(leave))
        .route("/players/{player_id}/height", post(update_height))
        .route("/players/{player_id}/checkpoints", post(activate_checkpoint))
        .route("/players/{player_id}/reset", post(reset_to_checkpoint))
        .route("/players/{player_id}/finish", post(finish))
        .route("/players/{player_id}/personal-best", get(personal_best))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::{GameplayTuning, TowerConfig};
    use crate::interface_adapters::state::InMemoryPlayerStore;
    use crate::interface_adapters::utils::rng::PcgRandom;
    use crate::use_cases::test_support::FixedClock;
    use crate::use_cases::{TowerHandle, TowerLifecycle, TowerSettings};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const T: u64 = 1_700_000_000;

    fn build_test_app() -> Router {
        build_test_app_with_tuning(GameplayTuning::default())
    }

    fn build_test_app_with_tuning(tuning: GameplayTuning) -> Router {
        let lifecycle =
            TowerLifecycle::new(TowerConfig::default(), tuning, PcgRandom::seeded(21), T)
                .expect("default config should generate");
        let tower = TowerHandle::spawn(
            lifecycle,
            Arc::new(InMemoryPlayerStore::default()),
            Arc::new(FixedClock::at(T)),
            &TowerSettings {
                command_channel_capacity: 64,
                event_broadcast_capacity: 64,
                tick_interval: Duration::from_millis(250),
                autosave_interval: Duration::from_secs(60),
            },
        );
        app(AppState { tower })
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("expected request to build")
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("expected request to build")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        serde_json::from_slice(&body).expect("expected json body")
    }

    #[tokio::test]
    async fn when_state_is_requested_then_returns_live_tower() {
        let app = build_test_app();

        let response = app.oneshot(empty_request("GET", "/state")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["time_remaining"], 300);
        assert_eq!(payload["total_height"], 375.0);
        assert_eq!(payload["is_active"], true);
        assert_eq!(payload["checkpoints"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn when_tower_is_requested_then_returns_sections_and_finish() {
        let app = build_test_app();

        let response = app.oneshot(empty_request("GET", "/tower")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["sections"].as_array().map(Vec::len), Some(15));
        assert_eq!(payload["finish"]["height"], 375.0);
    }

    #[tokio::test]
    async fn when_player_joins_then_returns_joined_with_tower_id() {
        let app = build_test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/players",
                r#"{"player_id":7,"display_name":"Climber"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["status"], "joined");
        assert!(payload["tower_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn when_display_name_is_blank_then_returns_400_and_error_message() {
        let app = build_test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/players",
                r#"{"player_id":7,"display_name":"   "}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid display_name");
    }

    #[tokio::test]
    async fn when_tower_is_full_then_join_returns_409() {
        let app = build_test_app_with_tuning(GameplayTuning {
            max_players: 1,
            ..GameplayTuning::default()
        });
        let first = app
            .clone()
            .oneshot(json_request("POST", "/players", r#"{"player_id":1,"display_name":"A"}"#))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(json_request("POST", "/players", r#"{"player_id":2,"display_name":"B"}"#))
            .await
            .unwrap();

        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(second).await["error"], "tower is full");
    }

    #[tokio::test]
    async fn when_height_is_reported_then_returns_acceptance() {
        let app = build_test_app();
        app.clone()
            .oneshot(json_request("POST", "/players", r#"{"player_id":3,"display_name":"C"}"#))
            .await
            .unwrap();

        let accepted = app
            .clone()
            .oneshot(json_request("POST", "/players/3/height", r#"{"height":50.0}"#))
            .await
            .unwrap();
        assert_eq!(accepted.status(), StatusCode::OK);
        let payload = body_json(accepted).await;
        assert_eq!(payload["accepted"], true);
        assert_eq!(payload["new_best"], true);

        let rejected = app
            .oneshot(json_request("POST", "/players/3/height", r#"{"height":101.0}"#))
            .await
            .unwrap();
        let payload = body_json(rejected).await;
        assert_eq!(payload["accepted"], false);
        assert_eq!(payload["current_height"], 50.0);
    }

    #[tokio::test]
    async fn when_checkpoint_is_activated_then_reset_returns_its_position() {
        let app = build_test_app();
        app.clone()
            .oneshot(json_request("POST", "/players", r#"{"player_id":4,"display_name":"D"}"#))
            .await
            .unwrap();

        let activated = app
            .clone()
            .oneshot(json_request("POST", "/players/4/checkpoints", r#"{"checkpoint_id":0}"#))
            .await
            .unwrap();
        assert_eq!(body_json(activated).await["activated"], true);

        let reset = app
            .oneshot(empty_request("POST", "/players/4/reset"))
            .await
            .unwrap();
        let payload = body_json(reset).await;
        assert_eq!(payload["position"]["y"], 10.0);
    }

    #[tokio::test]
    async fn when_player_has_no_checkpoint_then_reset_position_is_null() {
        let app = build_test_app();

        let reset = app
            .oneshot(empty_request("POST", "/players/4/reset"))
            .await
            .unwrap();

        assert_eq!(reset.status(), StatusCode::OK);
        assert!(body_json(reset).await["position"].is_null());
    }

    #[tokio::test]
    async fn when_finish_is_reported_from_the_bottom_then_it_is_not_accepted() {
        let app = build_test_app();
        app.clone()
            .oneshot(json_request("POST", "/players", r#"{"player_id":5,"display_name":"E"}"#))
            .await
            .unwrap();

        let response = app
            .oneshot(json_request("POST", "/players/5/finish", r#"{}"#))
            .await
            .unwrap();

        let payload = body_json(response).await;
        assert_eq!(payload["accepted"], false);
        assert!(payload["completion_secs"].is_null());
    }

    #[tokio::test]
    async fn when_personal_best_is_requested_for_offline_player_then_returns_404() {
        let app = build_test_app();

        let response = app
            .oneshot(empty_request("GET", "/players/99/personal-best"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "player not found");
    }

    #[tokio::test]
    async fn when_player_climbs_then_leaderboard_lists_them() {
        let app = build_test_app();
        app.clone()
            .oneshot(json_request("POST", "/players", r#"{"player_id":6,"display_name":"F"}"#))
            .await
            .unwrap();
        app.clone()
            .oneshot(json_request("POST", "/players/6/height", r#"{"height":30.0}"#))
            .await
            .unwrap();

        let response = app
            .oneshot(empty_request("GET", "/leaderboard"))
            .await
            .unwrap();

        let payload = body_json(response).await;
        assert_eq!(payload[0]["player_id"], "6");
        assert_eq!(payload[0]["height"], 30.0);
        assert_eq!(payload[0]["is_online"], true);
    }

    #[tokio::test]
    async fn when_player_leaves_then_returns_removed() {
        let app = build_test_app();
        app.clone()
            .oneshot(json_request("POST", "/players", r#"{"player_id":8,"display_name":"G"}"#))
            .await
            .unwrap();

        let response = app
            .oneshot(empty_request("DELETE", "/players/8"))
            .await
            .unwrap();

        assert_eq!(body_json(response).await["removed"], true);
    }

    #[tokio::test]
    async fn when_player_id_is_not_numeric_then_returns_400() {
        let app = build_test_app();

        let response = app
            .oneshot(empty_request("POST", "/players/abc/reset"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn when_height_payload_is_missing_fields_then_returns_422() {
        let app = build_test_app();

        let response = app
            .oneshot(json_request("POST", "/players/1/height", r#"{}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn when_route_is_called_with_wrong_method_then_returns_405() {
        let app = build_test_app();

        let response = app
            .oneshot(empty_request("GET", "/players"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
