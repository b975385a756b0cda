// Per-player climb state for the live tower generation.

use crate::domain::errors::ProgressError;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProgress {
    pub player_id: u64,
    pub display_name: String,
    /// Highest accepted height this generation.
    pub current_height: f32,
    /// Highest activated checkpoint id, `None` until the first one.
    pub last_checkpoint: Option<u32>,
    /// Epoch seconds when this progress entry was created.
    pub start_time: u64,
    pub completed_sections: BTreeSet<u32>,
}

impl PlayerProgress {
    pub fn new(player_id: u64, display_name: impl Into<String>, now: u64) -> Self {
        Self {
            player_id,
            display_name: display_name.into(),
            current_height: 0.0,
            last_checkpoint: None,
            start_time: now,
            completed_sections: BTreeSet::new(),
        }
    }
}

/// Result of an accepted height observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightUpdate {
    pub current_height: f32,
    pub is_new_personal_best: bool,
}

/// Holds every connected player's progress and enforces the anti-cheat bound.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    players: HashMap<u64, PlayerProgress>,
    max_height_delta: f32,
    section_height: f32,
    sections_count: u32,
}

impl ProgressTracker {
    pub fn new(max_height_delta: f32, section_height: f32, sections_count: u32) -> Self {
        Self {
            players: HashMap::new(),
            max_height_delta,
            section_height,
            sections_count,
        }
    }

    /// Inserts fresh progress. Returns false if the player was already tracked.
    pub fn on_player_joined(&mut self, player_id: u64, display_name: &str, now: u64) -> bool {
        if self.players.contains_key(&player_id) {
            return false;
        }
        self.players
            .insert(player_id, PlayerProgress::new(player_id, display_name, now));
        true
    }

    pub fn on_player_left(&mut self, player_id: u64) -> Option<PlayerProgress> {
        self.players.remove(&player_id)
    }

    /// Applies a reported height if it is within `max_height_delta` of the current one.
    ///
    /// Smaller heights are accepted but never lower the stored value, so late or
    /// reordered reports cannot regress progress.
    pub fn observe_height(
        &mut self,
        player_id: u64,
        candidate: f32,
        prior_best: f32,
    ) -> Result<HeightUpdate, ProgressError> {
        if !candidate.is_finite() {
            return Err(ProgressError::InvalidHeight);
        }
        let progress = self
            .players
            .get_mut(&player_id)
            .ok_or(ProgressError::UnknownPlayer(player_id))?;

        if candidate > progress.current_height + self.max_height_delta {
            return Err(ProgressError::SuspiciousUpdate {
                player_id,
                candidate,
                current: progress.current_height,
                max_delta: self.max_height_delta,
            });
        }

        progress.current_height = progress.current_height.max(candidate);
        mark_completed_sections(progress, self.section_height, self.sections_count);

        Ok(HeightUpdate {
            current_height: progress.current_height,
            is_new_personal_best: progress.current_height > prior_best,
        })
    }

    /// Lowers a player's height to `height`. Only used when respawning at a checkpoint.
    pub fn rewind_to(&mut self, player_id: u64, height: f32) -> Result<f32, ProgressError> {
        let progress = self
            .players
            .get_mut(&player_id)
            .ok_or(ProgressError::UnknownPlayer(player_id))?;
        progress.current_height = progress.current_height.min(height.max(0.0));
        Ok(progress.current_height)
    }

    pub fn get(&self, player_id: u64) -> Option<&PlayerProgress> {
        self.players.get(&player_id)
    }

    pub fn get_mut(&mut self, player_id: u64) -> Option<&mut PlayerProgress> {
        self.players.get_mut(&player_id)
    }

    pub fn contains(&self, player_id: u64) -> bool {
        self.players.contains_key(&player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerProgress> {
        self.players.values()
    }
}

fn mark_completed_sections(
    progress: &mut PlayerProgress,
    section_height: f32,
    sections_count: u32,
) {
    let cleared = (progress.current_height / section_height).floor();
    let cleared = (cleared.max(0.0) as u32).min(sections_count);
    progress.completed_sections.extend(0..cleared);
}
