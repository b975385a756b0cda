use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entities::PlayerRecord;
use crate::domain::ports::{Clock, PlayerDataStore, RandomSource};

pub(crate) type RecordTable = Arc<Mutex<HashMap<u64, PlayerRecord>>>;

// Scripted random source; cycles through the given draws.
pub(crate) struct SequenceRng {
    draws: Vec<f64>,
    next: usize,
}

impl SequenceRng {
    pub(crate) fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "sequence rng needs at least one draw");
        Self { draws, next: 0 }
    }
}

impl RandomSource for SequenceRng {
    fn next_unit(&mut self) -> f64 {
        let draw = self.draws[self.next % self.draws.len()];
        self.next += 1;
        draw
    }
}

// Shared time source that tests can move forward.
#[derive(Clone)]
pub(crate) struct FixedClock(pub(crate) Arc<AtomicU64>);

impl FixedClock {
    pub(crate) fn at(now: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    pub(crate) fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub load: bool,
    pub save: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingStore {
    records: RecordTable,
    failures: Arc<Mutex<FailureFlags>>,
    save_calls: Arc<AtomicU64>,
    load_delay: Duration,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(FailureFlags::default())),
            save_calls: Arc::new(AtomicU64::new(0)),
            load_delay: Duration::ZERO,
        }
    }

    // Loads finish only after `delay`, like a slow backend.
    pub(crate) fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub(crate) fn with_failures(self, failures: FailureFlags) -> Self {
        self.set_failures(failures);
        self
    }

    pub(crate) fn set_failures(&self, failures: FailureFlags) {
        let mut guard = self.failures.lock().expect("failures mutex poisoned");
        *guard = failures;
    }

    pub(crate) fn insert_test_record(&self, player_id: u64, record: PlayerRecord) {
        let mut guard = self.records.lock().expect("records mutex poisoned");
        guard.insert(player_id, record);
    }

    pub(crate) fn get_test_record(&self, player_id: u64) -> Option<PlayerRecord> {
        let guard = self.records.lock().expect("records mutex poisoned");
        guard.get(&player_id).cloned()
    }

    pub(crate) fn save_calls(&self) -> u64 {
        self.save_calls.load(Ordering::SeqCst)
    }

    fn failures(&self) -> FailureFlags {
        *self.failures.lock().expect("failures mutex poisoned")
    }
}

#[async_trait]
impl PlayerDataStore for RecordingStore {
    async fn load(&self, player_id: u64) -> Result<Option<PlayerRecord>, String> {
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if self.failures().load {
            return Err("load failed".to_string());
        }

        let guard = self.records.lock().expect("records mutex poisoned");
        Ok(guard.get(&player_id).cloned())
    }

    async fn save(&self, player_id: u64, record: &PlayerRecord) -> Result<(), String> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.failures().save {
            return Err("save failed".to_string());
        }

        let mut guard = self.records.lock().expect("records mutex poisoned");
        guard.insert(player_id, record.clone());
        Ok(())
    }
}
