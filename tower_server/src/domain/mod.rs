// Domain layer: tower layout, progress rules and the ports they depend on.

pub mod checkpoints;
pub mod clock;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod progress;
pub mod tower;
pub mod tuning;

pub use checkpoints::{Activation, CheckpointRegistry};
pub use clock::{ClockReading, GameClock};
pub use entities::PlayerRecord;
pub use errors::{CheckpointError, ConfigError, ProgressError};
pub use progress::{HeightUpdate, PlayerProgress, ProgressTracker};
pub use tower::{
    Checkpoint, Difficulty, FinishMarker, Obstacle, ObstacleKind, ObstacleType, TowerDefinition,
    TowerSection, Vec3,
};
