// Tower layout types produced by the generator and shared read-only with adapters.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: f32, dy: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// Difficulty tiers, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    /// All tiers in scan order for weighted draws.
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Extreme,
    ];

    /// Obstacle types a section of this tier may contain.
    pub fn obstacle_candidates(self) -> &'static [ObstacleType] {
        match self {
            Difficulty::Easy => &[ObstacleType::Static],
            Difficulty::Medium => &[ObstacleType::Static, ObstacleType::Moving],
            Difficulty::Hard => &[
                ObstacleType::Static,
                ObstacleType::Moving,
                ObstacleType::Rotating,
                ObstacleType::Disappearing,
            ],
            Difficulty::Extreme => &[
                ObstacleType::Static,
                ObstacleType::Moving,
                ObstacleType::Rotating,
                ObstacleType::Disappearing,
                ObstacleType::Hazard,
            ],
        }
    }
}

/// Obstacle tag without motion data, used for candidate draws and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleType {
    Static,
    Moving,
    Rotating,
    Disappearing,
    Hazard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    Sine,
    Bounce,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovePattern {
    pub start: Vec3,
    pub end: Vec3,
    /// Seconds for one leg of the back-and-forth.
    pub duration: f32,
    pub easing: Easing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotatePattern {
    /// Degrees per second.
    pub speed: f32,
    pub axis: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisappearPattern {
    pub visible_secs: f32,
    pub hidden_secs: f32,
    pub phase_offset_secs: f32,
}

/// Obstacle behavior. Motion parameters live on the variants that need them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "motion", rename_all = "snake_case")]
pub enum ObstacleKind {
    Static,
    Moving(MovePattern),
    Rotating(RotatePattern),
    Disappearing(DisappearPattern),
    Hazard,
}

impl ObstacleKind {
    pub fn obstacle_type(&self) -> ObstacleType {
        match self {
            ObstacleKind::Static => ObstacleType::Static,
            ObstacleKind::Moving(_) => ObstacleType::Moving,
            ObstacleKind::Rotating(_) => ObstacleType::Rotating,
            ObstacleKind::Disappearing(_) => ObstacleType::Disappearing,
            ObstacleKind::Hazard => ObstacleType::Hazard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub position: Vec3,
    pub size: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TowerSection {
    pub id: u32,
    pub base_height: f32,
    pub difficulty: Difficulty,
    pub obstacles: Vec<Obstacle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    pub id: u32,
    pub height: f32,
    pub position: Vec3,
    /// Latched once any player touches the checkpoint.
    pub activated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinishMarker {
    pub height: f32,
    pub position: Vec3,
}

/// One generated tower. Never mutated after generation; a reset swaps in a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TowerDefinition {
    pub sections: Vec<TowerSection>,
    /// Checkpoints in ascending id and height order, all unactivated.
    pub checkpoints: Vec<Checkpoint>,
    pub finish: FinishMarker,
    pub section_height: f32,
}

impl TowerDefinition {
    pub fn total_height(&self) -> f32 {
        self.sections.len() as f32 * self.section_height
    }

    pub fn obstacle_count(&self) -> usize {
        self.sections.iter().map(|s| s.obstacles.len()).sum()
    }
}
