// Tower lifecycle: owns the live game state and swaps it out when the clock expires.

use crate::domain::ports::RandomSource;
use crate::domain::tuning::{GameplayTuning, TowerConfig};
use crate::domain::{
    CheckpointError, CheckpointRegistry, ClockReading, ConfigError, GameClock, HeightUpdate,
    PlayerProgress, ProgressError, ProgressTracker, TowerDefinition, Vec3,
};
use crate::use_cases::generator::generate;
use crate::use_cases::types::{GameStateSnapshot, PlayerProgressSnapshot};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    /// Transient while the tower is regenerated; joins are queued.
    Resetting,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("update targets tower {given} but the live tower is {live}")]
    StaleTower { given: String, live: String },
    #[error("unknown player {0}")]
    UnknownPlayer(u64),
    #[error("player {0} has not reached the finish")]
    FinishNotReached(u64),
    #[error("player {0} already finished this tower")]
    AlreadyFinished(u64),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
    /// Queued until the running reset completes.
    Deferred,
    Full,
}

/// Everything that belongs to one tower generation. Replaced as a whole on reset.
#[derive(Debug, Clone)]
pub struct GameState {
    pub tower_id: String,
    pub clock: GameClock,
    pub is_active: bool,
    pub tower: Arc<TowerDefinition>,
    pub progress: ProgressTracker,
    pub checkpoints: CheckpointRegistry,
    finished: HashSet<u64>,
}

impl GameState {
    fn new(tower: TowerDefinition, now: u64, tuning: &GameplayTuning) -> Self {
        let progress = ProgressTracker::new(
            tuning.max_height_delta,
            tower.section_height,
            tower.sections.len() as u32,
        );
        let checkpoints = CheckpointRegistry::from_definition(&tower);
        Self {
            tower_id: Uuid::new_v4().to_string(),
            clock: GameClock::new(now, tuning.reset_interval_secs),
            is_active: true,
            tower: Arc::new(tower),
            progress,
            checkpoints,
            finished: HashSet::new(),
        }
    }

    pub fn total_height(&self) -> f32 {
        self.tower.total_height()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TowerReset {
    pub previous_tower_id: String,
    pub tower_id: String,
    pub reset_time: u64,
    /// Players whose progress was reinitialised on the new tower.
    pub reseeded: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub reading: ClockReading,
    pub reset: Option<TowerReset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeightAccepted {
    pub update: HeightUpdate,
    pub progress: PlayerProgressSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointReached {
    pub player_id: u64,
    pub display_name: String,
    pub checkpoint_id: u32,
    pub first_activation: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finish {
    pub player_id: u64,
    pub display_name: String,
    pub completion_secs: u64,
    pub height: f32,
}

/// Single owner of the live [`GameState`]; every mutation goes through here.
pub struct TowerLifecycle<R> {
    config: TowerConfig,
    tuning: GameplayTuning,
    rng: R,
    state: GameState,
    phase: Phase,
    deferred_joins: Vec<(u64, String)>,
}

impl<R: RandomSource> TowerLifecycle<R> {
    /// Generates the first tower. Fails on invalid tuning instead of building a bad tower.
    pub fn new(
        config: TowerConfig,
        tuning: GameplayTuning,
        mut rng: R,
        now: u64,
    ) -> Result<Self, ConfigError> {
        let tower = generate(&config, &mut rng)?;
        let state = GameState::new(tower, now, &tuning);
        info!(
            tower_id = %state.tower_id,
            sections = state.tower.sections.len(),
            obstacles = state.tower.obstacle_count(),
            total_height = state.total_height(),
            "tower generated"
        );
        Ok(Self {
            config,
            tuning,
            rng,
            state,
            phase: Phase::Active,
            deferred_joins: Vec::new(),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tower_id(&self) -> &str {
        &self.state.tower_id
    }

    pub fn tower(&self) -> Arc<TowerDefinition> {
        self.state.tower.clone()
    }

    pub fn tuning(&self) -> &GameplayTuning {
        &self.tuning
    }

    /// Reads the clock and resets the tower if it expired.
    pub fn tick(&mut self, now: u64) -> TickOutcome {
        let reading = self.state.clock.tick(now);
        if !reading.expired {
            return TickOutcome {
                reading,
                reset: None,
            };
        }

        match self.reset(now) {
            Ok(reset) => TickOutcome {
                reading: self.state.clock.tick(now),
                reset: Some(reset),
            },
            Err(e) => {
                // The old generation stays live; the next tick retries.
                error!(error = %e, "tower regeneration failed");
                TickOutcome {
                    reading,
                    reset: None,
                }
            }
        }
    }

    pub fn reset(&mut self, now: u64) -> Result<TowerReset, ConfigError> {
        self.begin_reset();
        self.complete_reset(now)
    }

    fn begin_reset(&mut self) {
        info!(tower_id = %self.state.tower_id, "resetting tower");
        self.phase = Phase::Resetting;
        self.state.is_active = false;
    }

    fn complete_reset(&mut self, now: u64) -> Result<TowerReset, ConfigError> {
        let generated = generate(&self.config, &mut self.rng);
        let result = generated.map(|tower| {
            let mut next = GameState::new(tower, now, &self.tuning);

            let mut roster: Vec<(u64, String)> = self
                .state
                .progress
                .players()
                .map(|p| (p.player_id, p.display_name.clone()))
                .collect();
            roster.sort_by_key(|(player_id, _)| *player_id);
            for (player_id, display_name) in &roster {
                next.progress.on_player_joined(*player_id, display_name, now);
            }

            let previous = std::mem::replace(&mut self.state, next);
            info!(
                previous_tower_id = %previous.tower_id,
                tower_id = %self.state.tower_id,
                players = roster.len(),
                obstacles = self.state.tower.obstacle_count(),
                "tower regenerated"
            );
            TowerReset {
                previous_tower_id: previous.tower_id,
                tower_id: self.state.tower_id.clone(),
                reset_time: now,
                reseeded: roster.into_iter().map(|(player_id, _)| player_id).collect(),
            }
        });

        self.phase = Phase::Active;
        self.state.is_active = true;
        for (player_id, display_name) in std::mem::take(&mut self.deferred_joins) {
            self.player_joined(player_id, &display_name, now);
        }
        result
    }

    pub fn player_joined(&mut self, player_id: u64, display_name: &str, now: u64) -> JoinOutcome {
        if self.phase == Phase::Resetting {
            debug!(player_id, "join deferred until reset completes");
            self.deferred_joins
                .push((player_id, display_name.to_string()));
            return JoinOutcome::Deferred;
        }
        if self.state.progress.contains(player_id) {
            return JoinOutcome::AlreadyJoined;
        }
        if self.state.progress.len() >= self.tuning.max_players {
            warn!(player_id, max_players = self.tuning.max_players, "tower full; join refused");
            return JoinOutcome::Full;
        }

        self.state.progress.on_player_joined(player_id, display_name, now);
        info!(player_id, display_name, tower_id = %self.state.tower_id, "player joined the climb");
        JoinOutcome::Joined
    }

    pub fn player_left(&mut self, player_id: u64) -> bool {
        self.deferred_joins.retain(|(id, _)| *id != player_id);
        let removed = self.state.progress.on_player_left(player_id).is_some();
        if removed {
            self.state.finished.remove(&player_id);
            info!(player_id, "player left the climb");
        }
        removed
    }

    pub fn observe_height(
        &mut self,
        player_id: u64,
        tower_id: Option<&str>,
        height: f32,
        prior_best: f32,
    ) -> Result<HeightAccepted, LifecycleError> {
        self.ensure_live(tower_id)?;
        let update = self
            .state
            .progress
            .observe_height(player_id, height, prior_best)
            .inspect_err(|e| {
                if let ProgressError::SuspiciousUpdate { .. } = e {
                    warn!(player_id, height, error = %e, "suspicious height update rejected");
                }
            })?;
        let progress = self.progress_of(player_id)?;
        debug!(player_id, height = update.current_height, "height accepted");
        Ok(HeightAccepted {
            update,
            progress: PlayerProgressSnapshot::from(progress),
        })
    }

    pub fn activate_checkpoint(
        &mut self,
        player_id: u64,
        tower_id: Option<&str>,
        checkpoint_id: u32,
    ) -> Result<CheckpointReached, LifecycleError> {
        self.ensure_live(tower_id)?;
        let GameState {
            progress,
            checkpoints,
            ..
        } = &mut self.state;
        let player = progress
            .get_mut(player_id)
            .ok_or(LifecycleError::UnknownPlayer(player_id))?;
        let activation = checkpoints.activate(player, checkpoint_id)?;

        info!(player_id, checkpoint_id, "checkpoint activated");
        Ok(CheckpointReached {
            player_id,
            display_name: player.display_name.clone(),
            checkpoint_id: activation.checkpoint_id,
            first_activation: activation.first_activation,
        })
    }

    /// Respawn point for the player; also drops their height to that point.
    ///
    /// Returns `None` when no checkpoint is activated yet and the caller should use
    /// the tower spawn.
    pub fn reset_to_checkpoint(&mut self, player_id: u64) -> Result<Option<Vec3>, LifecycleError> {
        let progress = self.progress_of(player_id)?;
        let position = self.state.checkpoints.reset_position_for(progress);
        let height = progress
            .last_checkpoint
            .and_then(|id| self.state.checkpoints.get(id))
            .map(|cp| cp.height)
            .unwrap_or(0.0);
        self.state.progress.rewind_to(player_id, height)?;
        Ok(position)
    }

    pub fn player_finished(
        &mut self,
        player_id: u64,
        tower_id: Option<&str>,
        now: u64,
    ) -> Result<Finish, LifecycleError> {
        self.ensure_live(tower_id)?;
        let progress = self.progress_of(player_id)?;
        if self.state.finished.contains(&player_id) {
            return Err(LifecycleError::AlreadyFinished(player_id));
        }
        // Finish touches must be within one update of the top.
        if progress.current_height + self.tuning.max_height_delta < self.state.tower.finish.height {
            warn!(
                player_id,
                height = progress.current_height,
                "finish reported below the top; ignored"
            );
            return Err(LifecycleError::FinishNotReached(player_id));
        }

        let finish = Finish {
            player_id,
            display_name: progress.display_name.clone(),
            completion_secs: now.saturating_sub(progress.start_time),
            height: self.state.tower.finish.height,
        };
        self.state.finished.insert(player_id);
        info!(
            player_id,
            completion_secs = finish.completion_secs,
            "player finished the tower"
        );
        Ok(finish)
    }

    pub fn progress_of(&self, player_id: u64) -> Result<&PlayerProgress, LifecycleError> {
        self.state
            .progress
            .get(player_id)
            .ok_or(LifecycleError::UnknownPlayer(player_id))
    }

    pub fn snapshot(&self, now: u64) -> GameStateSnapshot {
        let state = &self.state;
        let reading = state.clock.tick(now);
        let mut players: Vec<PlayerProgressSnapshot> = state
            .progress
            .players()
            .map(PlayerProgressSnapshot::from)
            .collect();
        players.sort_by_key(|p| p.player_id);

        GameStateSnapshot {
            tower_id: state.tower_id.clone(),
            tower_start_time: state.clock.start,
            tower_duration: state.clock.duration,
            time_remaining: reading.time_remaining,
            is_active: state.is_active,
            total_height: state.total_height(),
            players,
            checkpoints: state.checkpoints.checkpoints().cloned().collect(),
        }
    }

    fn ensure_live(&self, tower_id: Option<&str>) -> Result<(), LifecycleError> {
        match tower_id {
            Some(given) if given != self.state.tower_id => {
                debug!(given, live = %self.state.tower_id, "discarding update for stale tower");
                Err(LifecycleError::StaleTower {
                    given: given.to_string(),
                    live: self.state.tower_id.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}
