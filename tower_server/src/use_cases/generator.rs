// Procedural tower generation from tuning and an injected random source.

use crate::domain::ports::RandomSource;
use crate::domain::tower::{
    Checkpoint, DisappearPattern, Difficulty, Easing, FinishMarker, MovePattern, Obstacle,
    ObstacleKind, ObstacleType, RotatePattern, TowerDefinition, TowerSection, Vec3,
};
use crate::domain::tuning::{DifficultyWeights, TowerConfig};
use crate::domain::ConfigError;

// Obstacle geometry ranges, in world units and seconds.
const SIZE_XZ: (f32, f32) = (2.0, 10.0);
const SIZE_Y: (f32, f32) = (1.0, 3.0);
const MOVE_REACH: f32 = 10.0;
const MOVE_DURATION: (f32, f32) = (2.0, 5.0);
const ROTATE_SPEED: (f32, f32) = (90.0, 270.0);
const DISAPPEAR_VISIBLE: (f32, f32) = (1.0, 3.0);
const DISAPPEAR_HIDDEN: (f32, f32) = (1.0, 3.0);
const DISAPPEAR_OFFSET: (f32, f32) = (0.0, 2.0);

/// Builds a complete tower. Identical config and draw stream give an identical tower.
pub fn generate(
    config: &TowerConfig,
    rng: &mut dyn RandomSource,
) -> Result<TowerDefinition, ConfigError> {
    config.validate()?;

    let mut sections = Vec::with_capacity(config.sections_count as usize);
    let mut checkpoints = Vec::new();

    for index in 0..config.sections_count {
        let base_height = index as f32 * config.section_height;
        let difficulty = select_difficulty(&config.difficulty_weights, rng.next_unit());
        let obstacle_count = config.obstacle_counts.count(difficulty);

        let obstacles = (0..obstacle_count)
            .map(|_| generate_obstacle(config, base_height, difficulty, rng))
            .collect();

        sections.push(TowerSection {
            id: index,
            base_height,
            difficulty,
            obstacles,
        });

        if index % config.checkpoint_interval == 0 {
            let height = base_height + config.checkpoint_offset;
            checkpoints.push(Checkpoint {
                id: checkpoints.len() as u32,
                height,
                position: Vec3::new(0.0, height, 0.0),
                activated: false,
            });
        }
    }

    let total_height = config.total_height();
    Ok(TowerDefinition {
        sections,
        checkpoints,
        finish: FinishMarker {
            height: total_height,
            position: Vec3::new(0.0, total_height, 0.0),
        },
        section_height: config.section_height,
    })
}

/// Weighted draw over the difficulty tiers.
///
/// Scans tiers in order, accumulating weights; the first tier whose cumulative weight
/// reaches `draw` wins. Rounding can leave a draw close to 1.0 unmatched, in which case
/// the easiest tier is returned.
pub fn select_difficulty(weights: &DifficultyWeights, draw: f64) -> Difficulty {
    let mut cumulative = 0.0;
    for difficulty in Difficulty::ALL {
        cumulative += weights.weight(difficulty);
        if cumulative >= draw {
            return difficulty;
        }
    }
    Difficulty::Easy
}

/// Uniform draw over the obstacle types allowed for `difficulty`.
pub fn select_obstacle_type(difficulty: Difficulty, draw: f64) -> ObstacleType {
    let candidates = difficulty.obstacle_candidates();
    let index = ((draw * candidates.len() as f64) as usize).min(candidates.len() - 1);
    candidates[index]
}

fn generate_obstacle(
    config: &TowerConfig,
    base_height: f32,
    difficulty: Difficulty,
    rng: &mut dyn RandomSource,
) -> Obstacle {
    let obstacle_type = select_obstacle_type(difficulty, rng.next_unit());
    let half = config.footprint;

    let position = Vec3::new(
        rng.next_range(-half, half),
        base_height + rng.next_range(0.0, config.section_height),
        rng.next_range(-half, half),
    );
    let size = Vec3::new(
        rng.next_range(SIZE_XZ.0, SIZE_XZ.1),
        rng.next_range(SIZE_Y.0, SIZE_Y.1),
        rng.next_range(SIZE_XZ.0, SIZE_XZ.1),
    );

    let kind = match obstacle_type {
        ObstacleType::Static => ObstacleKind::Static,
        ObstacleType::Hazard => ObstacleKind::Hazard,
        ObstacleType::Moving => ObstacleKind::Moving(MovePattern {
            start: position,
            end: position.offset(
                rng.next_range(-MOVE_REACH, MOVE_REACH),
                0.0,
                rng.next_range(-MOVE_REACH, MOVE_REACH),
            ),
            duration: rng.next_range(MOVE_DURATION.0, MOVE_DURATION.1),
            easing: Easing::Sine,
        }),
        ObstacleType::Rotating => ObstacleKind::Rotating(RotatePattern {
            speed: rng.next_range(ROTATE_SPEED.0, ROTATE_SPEED.1),
            axis: Vec3::new(0.0, 1.0, 0.0),
        }),
        ObstacleType::Disappearing => ObstacleKind::Disappearing(DisappearPattern {
            visible_secs: rng.next_range(DISAPPEAR_VISIBLE.0, DISAPPEAR_VISIBLE.1),
            hidden_secs: rng.next_range(DISAPPEAR_HIDDEN.0, DISAPPEAR_HIDDEN.1),
            phase_offset_secs: rng.next_range(DISAPPEAR_OFFSET.0, DISAPPEAR_OFFSET.1),
        }),
    };

    Obstacle {
        kind,
        position,
        size,
    }
}
