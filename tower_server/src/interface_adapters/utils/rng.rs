use crate::domain::ports::RandomSource;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Returns a process-unique, monotonically increasing identifier.
///
/// Used to correlate logs for event stream connections.
pub fn rand_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_nanos()));
    counter.fetch_add(1, Ordering::Relaxed)
}

/// PCG32-backed random source for tower generation.
///
/// Seeding it explicitly reproduces a tower sequence exactly.
pub struct PcgRandom {
    rng: Pcg32,
}

impl PcgRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Seeds from the OS entropy source.
    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }
}

impl RandomSource for PcgRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}
