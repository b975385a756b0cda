use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::domain::entities::PlayerRecord;
use crate::domain::ports::{Clock, PlayerDataStore};
use crate::use_cases::TowerHandle;

// Application state shared by every route.
#[derive(Clone)]
pub struct AppState {
    // Handle to the task that owns the live tower.
    pub tower: TowerHandle,
}

// In-memory player record store; contents are lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryPlayerStore {
    pub records: Arc<Mutex<HashMap<u64, PlayerRecord>>>,
}

#[async_trait]
impl PlayerDataStore for InMemoryPlayerStore {
    async fn load(&self, player_id: u64) -> Result<Option<PlayerRecord>, String> {
        let records = self.records.lock().await;
        Ok(records.get(&player_id).cloned())
    }

    async fn save(&self, player_id: u64, record: &PlayerRecord) -> Result<(), String> {
        let mut records = self.records.lock().await;
        records.insert(player_id, record.clone());
        Ok(())
    }
}

// System clock adapter used by the tower task.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn when_record_is_saved_then_it_loads_back() {
        let store = InMemoryPlayerStore::default();
        let record = PlayerRecord {
            personal_best: 75.0,
            total_plays: 2,
            last_played: 10,
            achievements: vec!["first_finish".into()],
        };

        store.save(7, &record).await.expect("save");

        assert_eq!(store.load(7).await, Ok(Some(record)));
        assert_eq!(store.load(8).await, Ok(None));
    }

    #[test]
    fn when_system_clock_is_read_then_it_is_past_2020() {
        assert!(SystemClock.now_epoch_seconds() > 1_577_836_800);
    }
}
