use async_trait::async_trait;

use crate::domain::entities::PlayerRecord;

// Port for uniform random draws used by tower generation.
pub trait RandomSource: Send {
    /// Next draw, uniform in [0, 1).
    fn next_unit(&mut self) -> f64;

    /// Uniform draw in [min, max).
    fn next_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        let value = (min as f64 + self.next_unit() * (max as f64 - min as f64)) as f32;
        // Narrowing to f32 can round a draw just under `max` up to it.
        if value < max { value } else { below(max).max(min) }
    }
}

/// Largest f32 strictly less than `value` (finite input).
fn below(value: f32) -> f32 {
    if value > 0.0 {
        f32::from_bits(value.to_bits() - 1)
    } else if value == 0.0 {
        -f32::from_bits(1)
    } else {
        f32::from_bits(value.to_bits() + 1)
    }
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

// Port for the player record store (opaque key-value backend).
#[async_trait]
pub trait PlayerDataStore: Send + Sync {
    async fn load(&self, player_id: u64) -> Result<Option<PlayerRecord>, String>;
    async fn save(&self, player_id: u64, record: &PlayerRecord) -> Result<(), String>;
}
