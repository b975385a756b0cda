// Use cases layer: tower generation, lifecycle and the task that serializes them.

pub mod generator;
pub mod lifecycle;
pub mod player_data;
pub mod tower_task;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use lifecycle::{JoinOutcome, LifecycleError, Phase, TowerLifecycle};
pub use tower_task::{TowerError, TowerHandle, TowerSettings};
pub use types::{
    FinishResponse, GameStateSnapshot, HeightResponse, LeaderboardEntry, PlayerProgressSnapshot,
    TowerCommand, TowerEvent,
};
