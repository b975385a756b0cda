// Use-case level inputs/outputs for the tower task.

use crate::domain::{Checkpoint, PlayerProgress, PlayerRecord, TowerDefinition, Vec3};
use crate::use_cases::lifecycle::JoinOutcome;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Read-only copy of one player's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProgressSnapshot {
    pub player_id: u64,
    pub display_name: String,
    pub current_height: f32,
    pub last_checkpoint: Option<u32>,
    pub start_time: u64,
    pub completed_sections: Vec<u32>,
}

impl From<&PlayerProgress> for PlayerProgressSnapshot {
    fn from(p: &PlayerProgress) -> Self {
        Self {
            player_id: p.player_id,
            display_name: p.display_name.clone(),
            current_height: p.current_height,
            last_checkpoint: p.last_checkpoint,
            start_time: p.start_time,
            completed_sections: p.completed_sections.iter().copied().collect(),
        }
    }
}

/// Read-only copy of the live game state, published after every tick and mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct GameStateSnapshot {
    pub tower_id: String,
    pub tower_start_time: u64,
    pub tower_duration: u64,
    pub time_remaining: u64,
    pub is_active: bool,
    pub total_height: f32,
    pub players: Vec<PlayerProgressSnapshot>,
    pub checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub player_id: u64,
    pub display_name: String,
    pub height: f32,
    pub is_online: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightResponse {
    pub accepted: bool,
    pub new_best: bool,
    pub current_height: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishResponse {
    pub accepted: bool,
    pub completion_secs: Option<u64>,
    pub new_best: bool,
}

/// Commands consumed by the tower task. Replies travel back on the embedded channel.
#[derive(Debug)]
pub enum TowerCommand {
    Join {
        player_id: u64,
        display_name: String,
        reply: oneshot::Sender<JoinOutcome>,
    },
    Leave {
        player_id: u64,
        reply: oneshot::Sender<bool>,
    },
    UpdateHeight {
        player_id: u64,
        tower_id: Option<String>,
        height: f32,
        reply: oneshot::Sender<HeightResponse>,
    },
    ActivateCheckpoint {
        player_id: u64,
        tower_id: Option<String>,
        checkpoint_id: u32,
        reply: oneshot::Sender<bool>,
    },
    ResetToCheckpoint {
        player_id: u64,
        reply: oneshot::Sender<Option<Vec3>>,
    },
    Finished {
        player_id: u64,
        tower_id: Option<String>,
        reply: oneshot::Sender<FinishResponse>,
    },
    GetPersonalBest {
        player_id: u64,
        reply: oneshot::Sender<Option<f32>>,
    },
    GetLeaderboard {
        reply: oneshot::Sender<Vec<LeaderboardEntry>>,
    },
    GetTower {
        reply: oneshot::Sender<Arc<TowerDefinition>>,
    },
    // Persistence results reported back by spawned I/O tasks.
    RecordLoaded {
        player_id: u64,
        // None when the store could not be read.
        record: Option<PlayerRecord>,
    },
    SaveFailed {
        records: Vec<(u64, PlayerRecord)>,
    },
}

/// Change notifications fanned out to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum TowerEvent {
    TowerReset {
        tower_id: String,
        reset_time: u64,
    },
    ProgressUpdated {
        progress: PlayerProgressSnapshot,
    },
    CheckpointActivated {
        player_id: u64,
        display_name: String,
        checkpoint_id: u32,
    },
    PlayerFinished {
        player_id: u64,
        display_name: String,
        completion_secs: u64,
        new_best: bool,
        achievements: Vec<String>,
    },
    NewPersonalBest {
        player_id: u64,
        display_name: String,
        height: f32,
    },
}
