use crate::domain::TowerDefinition;
use crate::interface_adapters::http::{ApiError, error_response};
use crate::interface_adapters::protocol::{
    CheckpointRequest, CheckpointResponse, FinishRequest, FinishResponseDto, GameStateDto,
    HeightRequest, HeightResponseDto, JoinRequest, JoinResponse, JoinStatus,
    LeaderboardEntryDto, LeaveResponse, PersonalBestResponse, ResetResponse,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::TowerError;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::warn;

const MAX_DISPLAY_NAME_LEN: usize = 32;

// Handler for the current tower state.
pub async fn get_state(State(state): State<AppState>) -> Json<GameStateDto> {
    Json(GameStateDto::from(state.tower.game_state()))
}

// Handler for the full layout of the live tower.
pub async fn get_tower(State(state): State<AppState>) -> Result<Json<TowerDefinition>, ApiError> {
    let tower = state.tower.tower().await.map_err(map_tower_error)?;
    Ok(Json(tower.as_ref().clone()))
}

// Handler for a player entering the climb.
pub async fn join(
    State(state): State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    if payload.player_id == 0 {
        return Err(error_response(StatusCode::BAD_REQUEST, "player_id is required"));
    }
    let display_name = payload.display_name.trim();
    if display_name.is_empty() || display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(error_response(StatusCode::BAD_REQUEST, "invalid display_name"));
    }

    let outcome = state
        .tower
        .join(payload.player_id, display_name.to_string())
        .await
        .map_err(map_tower_error)?;
    let Some(status) = JoinStatus::from_outcome(outcome) else {
        return Err(error_response(StatusCode::CONFLICT, "tower is full"));
    };

    Ok(Json(JoinResponse {
        status,
        tower_id: state.tower.game_state().tower_id,
    }))
}

// Handler for a player leaving; their record is saved in the background.
pub async fn leave(
    State(state): State<AppState>,
    Path(player_id): Path<u64>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let removed = state.tower.leave(player_id).await.map_err(map_tower_error)?;
    Ok(Json(LeaveResponse { removed }))
}

pub async fn update_height(
    State(state): State<AppState>,
    Path(player_id): Path<u64>,
    Json(payload): Json<HeightRequest>,
) -> Result<Json<HeightResponseDto>, ApiError> {
    let response = state
        .tower
        .update_height(player_id, payload.tower_id, payload.height)
        .await
        .map_err(map_tower_error)?;
    Ok(Json(response.into()))
}

pub async fn activate_checkpoint(
    State(state): State<AppState>,
    Path(player_id): Path<u64>,
    Json(payload): Json<CheckpointRequest>,
) -> Result<Json<CheckpointResponse>, ApiError> {
    let activated = state
        .tower
        .activate_checkpoint(player_id, payload.tower_id, payload.checkpoint_id)
        .await
        .map_err(map_tower_error)?;
    Ok(Json(CheckpointResponse { activated }))
}

pub async fn reset_to_checkpoint(
    State(state): State<AppState>,
    Path(player_id): Path<u64>,
) -> Result<Json<ResetResponse>, ApiError> {
    let position = state
        .tower
        .reset_to_checkpoint(player_id)
        .await
        .map_err(map_tower_error)?;
    Ok(Json(ResetResponse { position }))
}

pub async fn finish(
    State(state): State<AppState>,
    Path(player_id): Path<u64>,
    Json(payload): Json<FinishRequest>,
) -> Result<Json<FinishResponseDto>, ApiError> {
    let response = state
        .tower
        .finished(player_id, payload.tower_id)
        .await
        .map_err(map_tower_error)?;
    Ok(Json(response.into()))
}

// Only online players have a cached best.
pub async fn personal_best(
    State(state): State<AppState>,
    Path(player_id): Path<u64>,
) -> Result<Json<PersonalBestResponse>, ApiError> {
    let personal_best = state
        .tower
        .personal_best(player_id)
        .await
        .map_err(map_tower_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "player not found"))?;
    Ok(Json(PersonalBestResponse {
        player_id: player_id.to_string(),
        personal_best,
    }))
}

pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntryDto>>, ApiError> {
    let entries = state.tower.leaderboard().await.map_err(map_tower_error)?;
    Ok(Json(entries.into_iter().map(LeaderboardEntryDto::from).collect()))
}

fn map_tower_error(err: TowerError) -> ApiError {
    match err {
        TowerError::Closed => {
            warn!(error = %err, "tower task unavailable");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "tower unavailable")
        }
    }
}
