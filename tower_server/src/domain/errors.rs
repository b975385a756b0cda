// Domain-level errors for tower generation and player progress.

use thiserror::Error;

/// Invalid generation parameters. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("difficulty weights must sum to 1.0 (got {sum})")]
    WeightsDoNotSumToOne { sum: f64 },
    #[error("difficulty weights must be finite and non-negative")]
    InvalidWeight,
    #[error("section count must be greater than zero")]
    NoSections,
    #[error("checkpoint interval must be greater than zero")]
    ZeroCheckpointInterval,
    #[error("section height must be a positive number (got {0})")]
    InvalidSectionHeight(f32),
    #[error("obstacle counts must not decrease from easy to extreme")]
    ObstacleCountsDecrease,
    #[error("footprint must be a positive number (got {0})")]
    InvalidFootprint(f32),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressError {
    #[error("unknown player {0}")]
    UnknownPlayer(u64),
    /// Height jump beyond the anti-cheat bound; state is left untouched.
    #[error("suspicious height update for player {player_id}: {candidate} exceeds {current} + {max_delta}")]
    SuspiciousUpdate {
        player_id: u64,
        candidate: f32,
        current: f32,
        max_delta: f32,
    },
    #[error("height must be a finite number")]
    InvalidHeight,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckpointError {
    #[error("unknown checkpoint {0}")]
    UnknownCheckpoint(u32),
    #[error("checkpoint {checkpoint_id} is not past the player's last checkpoint")]
    AlreadyReached { checkpoint_id: u32 },
}
