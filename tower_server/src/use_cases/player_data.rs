// Cached player records (personal bests, plays, achievements) and their persistence.
//
// The cache is owned by the tower task and never awaits; store I/O happens in the
// async helpers below, which run on spawned tasks.

use crate::domain::PlayerRecord;
use crate::domain::ports::PlayerDataStore;
use crate::use_cases::types::LeaderboardEntry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

pub const FIRST_FINISH_ACHIEVEMENT: &str = "first_finish";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    // Store load still in flight; the record holds only this session's progress.
    Pending,
    Loaded,
    // The store could not be read. Progress is kept in memory but never saved.
    Unavailable,
}

#[derive(Debug, Clone)]
struct CachedPlayer {
    display_name: String,
    record: PlayerRecord,
    load: LoadState,
    // Join order, used to break leaderboard ties.
    arrival: u64,
}

/// What became of a record that arrived from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadApplied {
    /// Merged into an online player's record.
    Online,
    /// The player left with unsaved progress; the merged record is ready to save.
    Departed(PlayerRecord),
    /// Nothing was waiting for this load.
    Ignored,
}

#[derive(Debug, Default)]
pub struct PlayerDataCache {
    players: HashMap<u64, CachedPlayer>,
    dirty: HashSet<u64>,
    // Records of players who already left but whose last save failed.
    offline_pending: HashMap<u64, PlayerRecord>,
    // Unsaved progress of players who left before their stored record arrived.
    awaiting_load: HashMap<u64, PlayerRecord>,
    next_arrival: u64,
}

impl PlayerDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking an online player.
    ///
    /// Returns true when the caller must load the stored record. A player coming back
    /// with a pending save already holds the merged record; one whose load is still in
    /// flight waits for that load.
    pub fn register(&mut self, player_id: u64, display_name: &str) -> bool {
        if let Some(cached) = self.players.get_mut(&player_id) {
            cached.display_name = display_name.to_string();
            return false;
        }

        let (record, load, needs_load) =
            if let Some(record) = self.offline_pending.remove(&player_id) {
                self.dirty.insert(player_id);
                (record, LoadState::Loaded, false)
            } else if let Some(record) = self.awaiting_load.remove(&player_id) {
                self.dirty.insert(player_id);
                (record, LoadState::Pending, false)
            } else {
                (PlayerRecord::default(), LoadState::Pending, true)
            };

        let arrival = self.next_arrival;
        self.next_arrival += 1;
        self.players.insert(
            player_id,
            CachedPlayer {
                display_name: display_name.to_string(),
                record,
                load,
                arrival,
            },
        );
        needs_load
    }

    /// Applies the result of a store load. `None` means the store could not be read.
    ///
    /// Progress made before the load finished is kept. A load only counts once per
    /// record; later deliveries are ignored.
    pub fn apply_loaded(&mut self, player_id: u64, loaded: Option<PlayerRecord>) -> LoadApplied {
        if let Some(cached) = self.players.get_mut(&player_id) {
            if cached.load != LoadState::Pending {
                return LoadApplied::Ignored;
            }
            match loaded {
                Some(loaded) => {
                    merge_loaded(&mut cached.record, loaded);
                    cached.load = LoadState::Loaded;
                    info!(
                        player_id,
                        personal_best = cached.record.personal_best,
                        "player data loaded"
                    );
                }
                None => {
                    cached.load = LoadState::Unavailable;
                    warn!(player_id, "player data unavailable; progress will not be saved");
                }
            }
            return LoadApplied::Online;
        }

        let Some(mut record) = self.awaiting_load.remove(&player_id) else {
            return LoadApplied::Ignored;
        };
        match loaded {
            Some(loaded) => {
                merge_loaded(&mut record, loaded);
                LoadApplied::Departed(record)
            }
            None => {
                warn!(player_id, "player data unavailable; dropping unsaved progress");
                LoadApplied::Ignored
            }
        }
    }

    pub fn personal_best(&self, player_id: u64) -> Option<f32> {
        self.players
            .get(&player_id)
            .map(|cached| cached.record.personal_best)
    }

    pub fn display_name(&self, player_id: u64) -> Option<&str> {
        self.players
            .get(&player_id)
            .map(|cached| cached.display_name.as_str())
    }

    pub fn record(&self, player_id: u64) -> Option<&PlayerRecord> {
        self.players.get(&player_id).map(|cached| &cached.record)
    }

    /// Raises the personal best. Returns true when `height` beats the stored best.
    pub fn update_personal_best(&mut self, player_id: u64, height: f32, now: u64) -> bool {
        let Some(cached) = self.players.get_mut(&player_id) else {
            return false;
        };
        if height <= cached.record.personal_best {
            return false;
        }
        cached.record.personal_best = height;
        cached.record.last_played = now;
        self.dirty.insert(player_id);
        info!(player_id, height, "new personal best");
        true
    }

    /// Counts a completed climb and returns achievements earned by it.
    pub fn record_finish(&mut self, player_id: u64, now: u64) -> Vec<String> {
        let Some(cached) = self.players.get_mut(&player_id) else {
            return Vec::new();
        };
        cached.record.total_plays += 1;
        cached.record.last_played = now;
        self.dirty.insert(player_id);

        let mut earned = Vec::new();
        if self.add_achievement(player_id, FIRST_FINISH_ACHIEVEMENT) {
            earned.push(FIRST_FINISH_ACHIEVEMENT.to_string());
        }
        earned
    }

    pub fn add_achievement(&mut self, player_id: u64, achievement: &str) -> bool {
        let Some(cached) = self.players.get_mut(&player_id) else {
            return false;
        };
        if cached.record.achievements.iter().any(|a| a == achievement) {
            return false;
        }
        cached.record.achievements.push(achievement.to_string());
        self.dirty.insert(player_id);
        info!(player_id, achievement, "achievement earned");
        true
    }

    /// Stops tracking a player. Returns the record when it has unsaved changes that are
    /// safe to write.
    pub fn remove(&mut self, player_id: u64) -> Option<PlayerRecord> {
        let was_dirty = self.dirty.remove(&player_id);
        let cached = self.players.remove(&player_id)?;
        match cached.load {
            LoadState::Loaded if was_dirty => Some(cached.record),
            LoadState::Pending if was_dirty => {
                // Saved once the stored record arrives and is merged.
                self.awaiting_load.insert(player_id, cached.record);
                None
            }
            _ => None,
        }
    }

    /// Drains every record that is ready to save.
    ///
    /// Records still waiting on their load stay dirty for a later batch.
    pub fn take_dirty(&mut self) -> Vec<(u64, PlayerRecord)> {
        let mut batch = Vec::new();
        for player_id in std::mem::take(&mut self.dirty) {
            let Some(cached) = self.players.get(&player_id) else {
                continue;
            };
            match cached.load {
                LoadState::Loaded => batch.push((player_id, cached.record.clone())),
                LoadState::Pending => {
                    self.dirty.insert(player_id);
                }
                LoadState::Unavailable => {}
            }
        }
        batch.extend(self.offline_pending.drain());
        batch.sort_by_key(|(player_id, _)| *player_id);
        batch
    }

    /// Puts records from a failed save back in line for the next batch.
    pub fn requeue(&mut self, records: Vec<(u64, PlayerRecord)>) {
        for (player_id, record) in records {
            if self.players.contains_key(&player_id) {
                // The cached copy is at least as new as the one that failed.
                self.dirty.insert(player_id);
            } else {
                self.offline_pending.insert(player_id, record);
            }
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len() + self.offline_pending.len() + self.awaiting_load.len()
    }

    /// Online players with a positive personal best, highest first, ties by join order.
    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<(u64, &CachedPlayer)> = self
            .players
            .iter()
            .filter(|(_, cached)| cached.record.personal_best > 0.0)
            .map(|(player_id, cached)| (*player_id, cached))
            .collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.record
                .personal_best
                .total_cmp(&a.record.personal_best)
                .then(a.arrival.cmp(&b.arrival))
        });

        ranked
            .into_iter()
            .take(limit)
            .map(|(player_id, cached)| LeaderboardEntry {
                player_id,
                display_name: cached.display_name.clone(),
                height: cached.record.personal_best,
                is_online: true,
            })
            .collect()
    }
}

/// Loads a player's record. A missing record is a fresh default; `None` means the store
/// failed and nothing must be written over what it holds.
pub async fn load_record(store: &dyn PlayerDataStore, player_id: u64) -> Option<PlayerRecord> {
    match store.load(player_id).await {
        Ok(Some(record)) => Some(record),
        Ok(None) => {
            debug!(player_id, "no stored player data; starting fresh");
            Some(PlayerRecord::default())
        }
        Err(error) => {
            warn!(player_id, %error, "failed to load player data; using defaults");
            None
        }
    }
}

fn merge_loaded(local: &mut PlayerRecord, loaded: PlayerRecord) {
    // `local` started empty at join, so its plays are this session's only.
    local.personal_best = local.personal_best.max(loaded.personal_best);
    local.total_plays += loaded.total_plays;
    local.last_played = local.last_played.max(loaded.last_played);
    for achievement in loaded.achievements {
        if !local.achievements.contains(&achievement) {
            local.achievements.push(achievement);
        }
    }
}

/// Saves a batch and returns the records that failed, for a later retry.
pub async fn save_records(
    store: &dyn PlayerDataStore,
    batch: Vec<(u64, PlayerRecord)>,
) -> Vec<(u64, PlayerRecord)> {
    let total = batch.len();
    let mut failed = Vec::new();
    for (player_id, record) in batch {
        if let Err(error) = store.save(player_id, &record).await {
            warn!(player_id, %error, "failed to save player data");
            failed.push((player_id, record));
        }
    }
    if total > 0 {
        info!(saved = total - failed.len(), failed = failed.len(), "player data saved");
    }
    failed
}
