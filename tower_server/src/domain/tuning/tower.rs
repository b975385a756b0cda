//! Generation and gameplay tuning for the tower.
//!
//! Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).
//! Every field has a default so partial TOML files stay valid.

use crate::domain::errors::ConfigError;
use crate::domain::tower::Difficulty;
use serde::Deserialize;

// Tolerance for floating point drift in configured weights.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DifficultyWeights {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
    pub extreme: f64,
}

impl DifficultyWeights {
    pub fn weight(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Extreme => self.extreme,
        }
    }

    pub fn sum(&self) -> f64 {
        Difficulty::ALL.iter().map(|d| self.weight(*d)).sum()
    }
}

impl Default for DifficultyWeights {
    fn default() -> Self {
        Self {
            easy: 0.4,
            medium: 0.3,
            hard: 0.2,
            extreme: 0.1,
        }
    }
}

/// Obstacles per section for each tier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ObstacleCounts {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub extreme: u32,
}

impl ObstacleCounts {
    pub fn count(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Extreme => self.extreme,
        }
    }
}

impl Default for ObstacleCounts {
    fn default() -> Self {
        Self {
            easy: 3,
            medium: 5,
            hard: 7,
            extreme: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    pub sections_count: u32,
    /// World units per section.
    pub section_height: f32,
    /// A checkpoint is placed every N sections, starting at section 0.
    pub checkpoint_interval: u32,
    /// Height of a checkpoint above its section base.
    pub checkpoint_offset: f32,
    /// Half-width of the square obstacles are scattered over.
    pub footprint: f32,
    pub difficulty_weights: DifficultyWeights,
    pub obstacle_counts: ObstacleCounts,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            sections_count: 15,
            section_height: 25.0,
            checkpoint_interval: 3,
            checkpoint_offset: 10.0,
            footprint: 20.0,
            difficulty_weights: DifficultyWeights::default(),
            obstacle_counts: ObstacleCounts::default(),
        }
    }
}

impl TowerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sections_count == 0 {
            return Err(ConfigError::NoSections);
        }
        if self.checkpoint_interval == 0 {
            return Err(ConfigError::ZeroCheckpointInterval);
        }
        if !self.section_height.is_finite() || self.section_height <= 0.0 {
            return Err(ConfigError::InvalidSectionHeight(self.section_height));
        }
        if !self.footprint.is_finite() || self.footprint <= 0.0 {
            return Err(ConfigError::InvalidFootprint(self.footprint));
        }

        let weights = self.difficulty_weights;
        if Difficulty::ALL
            .iter()
            .any(|d| !weights.weight(*d).is_finite() || weights.weight(*d) < 0.0)
        {
            return Err(ConfigError::InvalidWeight);
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }

        let counts = self.obstacle_counts;
        if Difficulty::ALL
            .windows(2)
            .any(|pair| counts.count(pair[0]) > counts.count(pair[1]))
        {
            return Err(ConfigError::ObstacleCountsDecrease);
        }

        Ok(())
    }

    pub fn total_height(&self) -> f32 {
        self.sections_count as f32 * self.section_height
    }
}

/// Round rules applied by the lifecycle orchestrator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameplayTuning {
    /// Seconds a tower stays up before it is torn down and regenerated.
    pub reset_interval_secs: u64,
    /// Largest height gain accepted from a single update (anti-cheat bound).
    pub max_height_delta: f32,
    pub max_players: usize,
    pub leaderboard_size: usize,
    pub autosave_interval_secs: u64,
}

impl Default for GameplayTuning {
    fn default() -> Self {
        Self {
            reset_interval_secs: 300,
            max_height_delta: 50.0,
            max_players: 20,
            leaderboard_size: 10,
            autosave_interval_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_defaults_are_used_then_config_is_valid() {
        assert_eq!(TowerConfig::default().validate(), Ok(()));
        assert_eq!(TowerConfig::default().total_height(), 375.0);
    }

    #[test]
    fn when_weights_do_not_sum_to_one_then_returns_config_error() {
        let config = TowerConfig {
            difficulty_weights: DifficultyWeights {
                easy: 0.5,
                medium: 0.5,
                hard: 0.5,
                extreme: 0.0,
            },
            ..TowerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightsDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn when_weights_drift_within_tolerance_then_config_is_valid() {
        let config = TowerConfig {
            difficulty_weights: DifficultyWeights {
                easy: 0.4,
                medium: 0.3,
                hard: 0.2,
                extreme: 0.1004,
            },
            ..TowerConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn when_weight_is_negative_then_returns_invalid_weight() {
        let config = TowerConfig {
            difficulty_weights: DifficultyWeights {
                easy: 1.2,
                medium: -0.2,
                hard: 0.0,
                extreme: 0.0,
            },
            ..TowerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidWeight));
    }

    #[test]
    fn when_section_count_is_zero_then_returns_no_sections() {
        let config = TowerConfig {
            sections_count: 0,
            ..TowerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoSections));
    }

    #[test]
    fn when_checkpoint_interval_is_zero_then_returns_config_error() {
        let config = TowerConfig {
            checkpoint_interval: 0,
            ..TowerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCheckpointInterval));
    }

    #[test]
    fn when_obstacle_counts_decrease_then_returns_config_error() {
        let config = TowerConfig {
            obstacle_counts: ObstacleCounts {
                easy: 4,
                medium: 3,
                hard: 7,
                extreme: 10,
            },
            ..TowerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ObstacleCountsDecrease));
    }

    #[test]
    fn when_section_height_is_not_positive_then_returns_config_error() {
        let config = TowerConfig {
            section_height: 0.0,
            ..TowerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidSectionHeight(0.0))
        );
    }
}
