// Wire protocol DTOs and conversions for the public tower server API.
// Player ids travel as strings so JavaScript clients keep full u64 precision.

use crate::domain::{Checkpoint, Vec3};
use crate::use_cases::{
    FinishResponse, GameStateSnapshot, HeightResponse, JoinOutcome, LeaderboardEntry,
    PlayerProgressSnapshot, TowerEvent,
};
use serde::{Deserialize, Serialize};

/// Messages the server pushes to subscribers over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Full state, sent on connect and whenever it changes.
    GameState(GameStateDto),
    TowerReset {
        tower_id: String,
        reset_time: u64,
    },
    ProgressUpdated(PlayerProgressDto),
    CheckpointActivated {
        player_id: String,
        display_name: String,
        checkpoint_id: u32,
    },
    PlayerFinished {
        player_id: String,
        display_name: String,
        completion_secs: u64,
        new_best: bool,
        achievements: Vec<String>,
    },
    NewPersonalBest {
        player_id: String,
        display_name: String,
        height: f32,
    },
}

impl From<TowerEvent> for ServerMessage {
    fn from(event: TowerEvent) -> Self {
        match event {
            TowerEvent::TowerReset {
                tower_id,
                reset_time,
            } => ServerMessage::TowerReset {
                tower_id,
                reset_time,
            },
            TowerEvent::ProgressUpdated { progress } => {
                ServerMessage::ProgressUpdated(PlayerProgressDto::from(&progress))
            }
            TowerEvent::CheckpointActivated {
                player_id,
                display_name,
                checkpoint_id,
            } => ServerMessage::CheckpointActivated {
                player_id: player_id.to_string(),
                display_name,
                checkpoint_id,
            },
            TowerEvent::PlayerFinished {
                player_id,
                display_name,
                completion_secs,
                new_best,
                achievements,
            } => ServerMessage::PlayerFinished {
                player_id: player_id.to_string(),
                display_name,
                completion_secs,
                new_best,
                achievements,
            },
            TowerEvent::NewPersonalBest {
                player_id,
                display_name,
                height,
            } => ServerMessage::NewPersonalBest {
                player_id: player_id.to_string(),
                display_name,
                height,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameStateDto {
    pub tower_id: String,
    pub tower_start_time: u64,
    pub tower_duration: u64,
    pub time_remaining: u64,
    pub is_active: bool,
    pub total_height: f32,
    pub players: Vec<PlayerProgressDto>,
    pub checkpoints: Vec<CheckpointDto>,
}

impl From<GameStateSnapshot> for GameStateDto {
    fn from(state: GameStateSnapshot) -> Self {
        Self {
            tower_id: state.tower_id,
            tower_start_time: state.tower_start_time,
            tower_duration: state.tower_duration,
            time_remaining: state.time_remaining,
            is_active: state.is_active,
            total_height: state.total_height,
            players: state.players.iter().map(PlayerProgressDto::from).collect(),
            checkpoints: state.checkpoints.iter().map(CheckpointDto::from).collect(),
        }
    }
}

/// Per-player progress. `last_checkpoint` is -1 until one is reached.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerProgressDto {
    pub player_id: String,
    pub display_name: String,
    pub current_height: f32,
    pub last_checkpoint: i64,
    pub start_time: u64,
    pub completed_sections: Vec<u32>,
}

impl From<&PlayerProgressSnapshot> for PlayerProgressDto {
    fn from(progress: &PlayerProgressSnapshot) -> Self {
        Self {
            player_id: progress.player_id.to_string(),
            display_name: progress.display_name.clone(),
            current_height: progress.current_height,
            last_checkpoint: progress.last_checkpoint.map_or(-1, i64::from),
            start_time: progress.start_time,
            completed_sections: progress.completed_sections.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckpointDto {
    pub id: u32,
    pub height: f32,
    pub position: Vec3,
    pub activated: bool,
}

impl From<&Checkpoint> for CheckpointDto {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            id: checkpoint.id,
            height: checkpoint.height,
            position: checkpoint.position,
            activated: checkpoint.activated,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntryDto {
    pub player_id: String,
    pub display_name: String,
    pub height: f32,
    pub is_online: bool,
}

impl From<LeaderboardEntry> for LeaderboardEntryDto {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            player_id: entry.player_id.to_string(),
            display_name: entry.display_name,
            height: entry.height,
            is_online: entry.is_online,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    pub player_id: u64,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    Joined,
    AlreadyJoined,
    Deferred,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub status: JoinStatus,
    pub tower_id: String,
}

impl JoinStatus {
    /// `None` when the join was refused.
    pub fn from_outcome(outcome: JoinOutcome) -> Option<Self> {
        match outcome {
            JoinOutcome::Joined => Some(JoinStatus::Joined),
            JoinOutcome::AlreadyJoined => Some(JoinStatus::AlreadyJoined),
            JoinOutcome::Deferred => Some(JoinStatus::Deferred),
            JoinOutcome::Full => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveResponse {
    pub removed: bool,
}

/// Height report from the client. `tower_id` pins it to a tower generation.
#[derive(Debug, Clone, Deserialize)]
pub struct HeightRequest {
    pub height: f32,
    #[serde(default)]
    pub tower_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeightResponseDto {
    pub accepted: bool,
    pub new_best: bool,
    pub current_height: Option<f32>,
}

impl From<HeightResponse> for HeightResponseDto {
    fn from(response: HeightResponse) -> Self {
        Self {
            accepted: response.accepted,
            new_best: response.new_best,
            current_height: response.current_height,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointRequest {
    pub checkpoint_id: u32,
    #[serde(default)]
    pub tower_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckpointResponse {
    pub activated: bool,
}

/// Respawn point. A null position means "use the tower spawn".
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub position: Option<Vec3>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinishRequest {
    #[serde(default)]
    pub tower_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishResponseDto {
    pub accepted: bool,
    pub completion_secs: Option<u64>,
    pub new_best: bool,
}

impl From<FinishResponse> for FinishResponseDto {
    fn from(response: FinishResponse) -> Self {
        Self {
            accepted: response.accepted,
            completion_secs: response.completion_secs,
            new_best: response.new_best,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalBestResponse {
    pub player_id: String,
    pub personal_best: f32,
}
