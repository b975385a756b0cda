// Gameplay tuning values, kept apart from runtime configuration.

pub mod tower;

pub use tower::{DifficultyWeights, GameplayTuning, ObstacleCounts, TowerConfig};
