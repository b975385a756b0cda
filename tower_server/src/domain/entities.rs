use serde::{Deserialize, Serialize};

// Persisted per-player record, keyed by player id in the data store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub personal_best: f32,
    pub total_plays: u32,
    pub last_played: u64,
    pub achievements: Vec<String>,
}
