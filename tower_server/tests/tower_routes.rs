mod support;

use futures::StreamExt;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

fn unique_player_id() -> u64 {
    // Tests share one server, so ids must not collide across tests.
    (uuid::Uuid::new_v4().as_u128() as u64) | 1
}

async fn join(client: &reqwest::Client, base_url: &str, player_id: u64) -> Value {
    let res = client
        .post(format!("{base_url}/players"))
        .json(&json!({ "player_id": player_id, "display_name": "Climber" }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    res.json().await.expect("json body")
}

#[tokio::test]
async fn test_state_reports_live_tower() {
    let base_url = support::ensure_server();

    let res = reqwest::get(format!("{base_url}/state"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let state: Value = res.json().await.expect("json body");
    assert!(state["tower_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(state["total_height"], 375.0);
    assert!(state["time_remaining"].as_u64().is_some_and(|t| t <= 300));
}

#[tokio::test]
async fn test_climb_updates_personal_best_and_leaderboard() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let player_id = unique_player_id();
    let joined = join(&client, base_url, player_id).await;
    assert_eq!(joined["status"], "joined");

    let height: Value = client
        .post(format!("{base_url}/players/{player_id}/height"))
        .json(&json!({ "height": 40.0, "tower_id": joined["tower_id"] }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    assert_eq!(height["accepted"], true);
    assert_eq!(height["new_best"], true);

    let best: Value = client
        .get(format!("{base_url}/players/{player_id}/personal-best"))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    assert_eq!(best["personal_best"], 40.0);

    let board: Vec<Value> = client
        .get(format!("{base_url}/leaderboard"))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    assert!(board
        .iter()
        .any(|entry| entry["player_id"] == player_id.to_string()));

    let left: Value = client
        .delete(format!("{base_url}/players/{player_id}"))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    assert_eq!(left["removed"], true);
}

#[tokio::test]
async fn test_update_for_unknown_tower_is_not_accepted() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let player_id = unique_player_id();
    join(&client, base_url, player_id).await;

    let res: Value = client
        .post(format!("{base_url}/players/{player_id}/height"))
        .json(&json!({ "height": 10.0, "tower_id": "retired-tower" }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");

    assert_eq!(res["accepted"], false);
    assert_eq!(res["current_height"], 0.0);
}

#[tokio::test]
async fn test_event_stream_sends_state_then_progress() {
    let base_url = support::ensure_server();
    let (mut stream, _) = tokio_tungstenite::connect_async(support::ws_url(base_url))
        .await
        .expect("websocket should connect");

    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("initial message in time")
        .expect("stream open")
        .expect("valid frame");
    let first: Value = serde_json::from_str(first.to_text().expect("text frame")).expect("json");
    assert_eq!(first["type"], "GameState");

    let client = reqwest::Client::new();
    let player_id = unique_player_id();
    join(&client, base_url, player_id).await;

    let progress = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(frame) = stream.next().await {
            let Ok(Message::Text(text)) = frame else {
                continue;
            };
            let message: Value = serde_json::from_str(text.as_str()).expect("json");
            if message["type"] == "ProgressUpdated"
                && message["data"]["player_id"] == player_id.to_string()
            {
                return message;
            }
        }
        panic!("stream closed before progress arrived");
    })
    .await
    .expect("progress event in time");

    assert_eq!(progress["data"]["current_height"], 0.0);
    assert_eq!(progress["data"]["last_checkpoint"], -1);
}
