// The tower task: single owner of the live tower, driven by commands and a fixed tick.

use crate::domain::ports::{Clock, PlayerDataStore, RandomSource};
use crate::domain::{PlayerRecord, TowerDefinition, Vec3};
use crate::use_cases::lifecycle::{JoinOutcome, TowerLifecycle};
use crate::use_cases::player_data::{LoadApplied, PlayerDataCache, load_record, save_records};
use crate::use_cases::types::{
    FinishResponse, GameStateSnapshot, HeightResponse, LeaderboardEntry, PlayerProgressSnapshot,
    TowerCommand, TowerEvent,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Channel sizes and cadences for the tower task.
#[derive(Debug, Clone)]
pub struct TowerSettings {
    /// Capacity for inbound commands.
    pub command_channel_capacity: usize,
    /// Capacity for broadcast change events.
    pub event_broadcast_capacity: usize,
    /// Interval at which the reset clock is evaluated.
    pub tick_interval: Duration,
    /// Interval between batch saves of dirty player records.
    pub autosave_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TowerError {
    #[error("tower task is not running")]
    Closed,
}

/// Cloneable access to a running tower task.
#[derive(Clone)]
pub struct TowerHandle {
    command_tx: mpsc::Sender<TowerCommand>,
    event_tx: broadcast::Sender<TowerEvent>,
    state_rx: watch::Receiver<GameStateSnapshot>,
}

impl TowerHandle {
    /// Spawns the tower task around an already generated lifecycle.
    pub fn spawn<R: RandomSource + 'static>(
        lifecycle: TowerLifecycle<R>,
        store: Arc<dyn PlayerDataStore>,
        clock: Arc<dyn Clock>,
        settings: &TowerSettings,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(settings.command_channel_capacity);
        let (event_tx, _event_rx) = broadcast::channel(settings.event_broadcast_capacity);
        let (state_tx, state_rx) =
            watch::channel(lifecycle.snapshot(clock.now_epoch_seconds()));

        let task = TowerTask {
            lifecycle,
            cache: PlayerDataCache::new(),
            store,
            clock,
            callbacks: command_tx.downgrade(),
            event_tx: event_tx.clone(),
            state_tx,
        };
        tokio::spawn(tower_task(task, command_rx, settings.clone()));

        Self {
            command_tx,
            event_tx,
            state_rx,
        }
    }

    pub async fn join(&self, player_id: u64, display_name: String) -> Result<JoinOutcome, TowerError> {
        self.request(|reply| TowerCommand::Join {
            player_id,
            display_name,
            reply,
        })
        .await
    }

    pub async fn leave(&self, player_id: u64) -> Result<bool, TowerError> {
        self.request(|reply| TowerCommand::Leave { player_id, reply })
            .await
    }

    pub async fn update_height(
        &self,
        player_id: u64,
        tower_id: Option<String>,
        height: f32,
    ) -> Result<HeightResponse, TowerError> {
        self.request(|reply| TowerCommand::UpdateHeight {
            player_id,
            tower_id,
            height,
            reply,
        })
        .await
    }

    pub async fn activate_checkpoint(
        &self,
        player_id: u64,
        tower_id: Option<String>,
        checkpoint_id: u32,
    ) -> Result<bool, TowerError> {
        self.request(|reply| TowerCommand::ActivateCheckpoint {
            player_id,
            tower_id,
            checkpoint_id,
            reply,
        })
        .await
    }

    pub async fn reset_to_checkpoint(&self, player_id: u64) -> Result<Option<Vec3>, TowerError> {
        self.request(|reply| TowerCommand::ResetToCheckpoint { player_id, reply })
            .await
    }

    pub async fn finished(
        &self,
        player_id: u64,
        tower_id: Option<String>,
    ) -> Result<FinishResponse, TowerError> {
        self.request(|reply| TowerCommand::Finished {
            player_id,
            tower_id,
            reply,
        })
        .await
    }

    pub async fn personal_best(&self, player_id: u64) -> Result<Option<f32>, TowerError> {
        self.request(|reply| TowerCommand::GetPersonalBest { player_id, reply })
            .await
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, TowerError> {
        self.request(|reply| TowerCommand::GetLeaderboard { reply })
            .await
    }

    pub async fn tower(&self) -> Result<Arc<TowerDefinition>, TowerError> {
        self.request(|reply| TowerCommand::GetTower { reply }).await
    }

    /// Latest published state; never waits on the tower task.
    pub fn game_state(&self) -> GameStateSnapshot {
        self.state_rx.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<GameStateSnapshot> {
        self.state_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TowerEvent> {
        self.event_tx.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> TowerCommand,
    ) -> Result<T, TowerError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(build(reply))
            .await
            .map_err(|_| TowerError::Closed)?;
        response.await.map_err(|_| TowerError::Closed)
    }
}

struct TowerTask<R> {
    lifecycle: TowerLifecycle<R>,
    cache: PlayerDataCache,
    store: Arc<dyn PlayerDataStore>,
    clock: Arc<dyn Clock>,
    // Weak so that in-flight I/O never keeps the task alive after every handle is gone.
    callbacks: mpsc::WeakSender<TowerCommand>,
    event_tx: broadcast::Sender<TowerEvent>,
    state_tx: watch::Sender<GameStateSnapshot>,
}

async fn tower_task<R: RandomSource>(
    mut task: TowerTask<R>,
    mut command_rx: mpsc::Receiver<TowerCommand>,
    settings: TowerSettings,
) {
    // Evaluate the reset clock at a fixed cadence.
    let mut tick = tokio::time::interval(settings.tick_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut autosave = tokio::time::interval_at(
        Instant::now() + settings.autosave_interval,
        settings.autosave_interval,
    );

    info!(tower_id = %task.lifecycle.tower_id(), "tower task started");
    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(command) => task.handle(command),
                None => break,
            },
            _ = tick.tick() => task.on_tick(),
            _ = autosave.tick() => task.flush_dirty(),
        }
    }

    // Every handle is gone; persist whatever is still dirty before exiting.
    let failed = save_records(task.store.as_ref(), task.cache.take_dirty()).await;
    info!(unsaved = failed.len(), "tower task stopped");
}

impl<R: RandomSource> TowerTask<R> {
    // Mutations publish the new state before replying, so a caller that reads
    // `game_state` after its reply sees its own change.
    fn handle(&mut self, command: TowerCommand) {
        let now = self.clock.now_epoch_seconds();
        match command {
            TowerCommand::Join {
                player_id,
                display_name,
                reply,
            } => {
                let outcome = self.lifecycle.player_joined(player_id, &display_name, now);
                if matches!(outcome, JoinOutcome::Joined | JoinOutcome::Deferred) {
                    if self.cache.register(player_id, &display_name) {
                        self.spawn_load(player_id);
                    }
                    self.emit_progress(player_id);
                }
                self.publish_state(now);
                let _ = reply.send(outcome);
            }
            TowerCommand::Leave { player_id, reply } => {
                let removed = self.lifecycle.player_left(player_id);
                if let Some(record) = self.cache.remove(player_id) {
                    self.spawn_save(vec![(player_id, record)]);
                }
                self.publish_state(now);
                let _ = reply.send(removed);
            }
            TowerCommand::UpdateHeight {
                player_id,
                tower_id,
                height,
                reply,
            } => {
                let response = self.update_height(player_id, tower_id.as_deref(), height, now);
                self.publish_state(now);
                let _ = reply.send(response);
            }
            TowerCommand::ActivateCheckpoint {
                player_id,
                tower_id,
                checkpoint_id,
                reply,
            } => {
                let activated =
                    match self
                        .lifecycle
                        .activate_checkpoint(player_id, tower_id.as_deref(), checkpoint_id)
                    {
                        Ok(reached) => {
                            self.emit(TowerEvent::CheckpointActivated {
                                player_id,
                                display_name: reached.display_name,
                                checkpoint_id: reached.checkpoint_id,
                            });
                            true
                        }
                        Err(e) => {
                            debug!(player_id, checkpoint_id, error = %e, "checkpoint not activated");
                            false
                        }
                    };
                self.publish_state(now);
                let _ = reply.send(activated);
            }
            TowerCommand::ResetToCheckpoint { player_id, reply } => {
                let position = match self.lifecycle.reset_to_checkpoint(player_id) {
                    Ok(position) => {
                        self.emit_progress(player_id);
                        position
                    }
                    Err(e) => {
                        debug!(player_id, error = %e, "reset to checkpoint refused");
                        None
                    }
                };
                self.publish_state(now);
                let _ = reply.send(position);
            }
            TowerCommand::Finished {
                player_id,
                tower_id,
                reply,
            } => {
                let response = self.finished(player_id, tower_id.as_deref(), now);
                self.publish_state(now);
                let _ = reply.send(response);
            }
            TowerCommand::GetPersonalBest { player_id, reply } => {
                let _ = reply.send(self.cache.personal_best(player_id));
            }
            TowerCommand::GetLeaderboard { reply } => {
                let size = self.lifecycle.tuning().leaderboard_size;
                let _ = reply.send(self.cache.leaderboard(size));
            }
            TowerCommand::GetTower { reply } => {
                let _ = reply.send(self.lifecycle.tower());
            }
            TowerCommand::RecordLoaded { player_id, record } => {
                match self.cache.apply_loaded(player_id, record) {
                    LoadApplied::Online => {}
                    LoadApplied::Departed(record) => {
                        debug!(player_id, "saving progress of departed player");
                        self.spawn_save(vec![(player_id, record)]);
                    }
                    LoadApplied::Ignored => {
                        debug!(player_id, "player data load not needed");
                    }
                }
            }
            TowerCommand::SaveFailed { records } => {
                self.cache.requeue(records);
            }
        }
    }

    fn update_height(
        &mut self,
        player_id: u64,
        tower_id: Option<&str>,
        height: f32,
        now: u64,
    ) -> HeightResponse {
        let prior_best = self.cache.personal_best(player_id).unwrap_or(0.0);
        match self
            .lifecycle
            .observe_height(player_id, tower_id, height, prior_best)
        {
            Ok(accepted) => {
                let current_height = accepted.update.current_height;
                let new_best = accepted.update.is_new_personal_best
                    && self
                        .cache
                        .update_personal_best(player_id, current_height, now);
                let display_name = accepted.progress.display_name.clone();
                self.emit(TowerEvent::ProgressUpdated {
                    progress: accepted.progress,
                });
                if new_best {
                    self.emit(TowerEvent::NewPersonalBest {
                        player_id,
                        display_name,
                        height: current_height,
                    });
                }
                HeightResponse {
                    accepted: true,
                    new_best,
                    current_height: Some(current_height),
                }
            }
            Err(e) => {
                debug!(player_id, height, error = %e, "height update not applied");
                HeightResponse {
                    accepted: false,
                    new_best: false,
                    current_height: self
                        .lifecycle
                        .progress_of(player_id)
                        .ok()
                        .map(|p| p.current_height),
                }
            }
        }
    }

    fn finished(&mut self, player_id: u64, tower_id: Option<&str>, now: u64) -> FinishResponse {
        let finish = match self.lifecycle.player_finished(player_id, tower_id, now) {
            Ok(finish) => finish,
            Err(e) => {
                debug!(player_id, error = %e, "finish not recorded");
                return FinishResponse {
                    accepted: false,
                    completion_secs: None,
                    new_best: false,
                };
            }
        };

        let achievements = self.cache.record_finish(player_id, now);
        let new_best = self
            .cache
            .update_personal_best(player_id, finish.height, now);
        if new_best {
            self.emit(TowerEvent::NewPersonalBest {
                player_id,
                display_name: finish.display_name.clone(),
                height: finish.height,
            });
        }
        self.emit(TowerEvent::PlayerFinished {
            player_id,
            display_name: finish.display_name,
            completion_secs: finish.completion_secs,
            new_best,
            achievements,
        });
        FinishResponse {
            accepted: true,
            completion_secs: Some(finish.completion_secs),
            new_best,
        }
    }

    fn on_tick(&mut self) {
        let now = self.clock.now_epoch_seconds();
        let outcome = self.lifecycle.tick(now);
        if let Some(reset) = outcome.reset {
            self.emit(TowerEvent::TowerReset {
                tower_id: reset.tower_id,
                reset_time: reset.reset_time,
            });
            for player_id in reset.reseeded {
                self.emit_progress(player_id);
            }
        }
        self.publish_state(now);
    }

    fn flush_dirty(&mut self) {
        let batch = self.cache.take_dirty();
        if batch.is_empty() {
            return;
        }
        debug!(records = batch.len(), "autosaving player data");
        self.spawn_save(batch);
    }

    fn spawn_load(&self, player_id: u64) {
        let Some(callbacks) = self.callbacks.upgrade() else {
            return;
        };
        let store = self.store.clone();
        tokio::spawn(async move {
            let record = load_record(store.as_ref(), player_id).await;
            let _ = callbacks
                .send(TowerCommand::RecordLoaded { player_id, record })
                .await;
        });
    }

    fn spawn_save(&self, batch: Vec<(u64, PlayerRecord)>) {
        let callbacks = self.callbacks.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            let failed = save_records(store.as_ref(), batch).await;
            if failed.is_empty() {
                return;
            }
            if let Some(callbacks) = callbacks.upgrade() {
                let _ = callbacks
                    .send(TowerCommand::SaveFailed { records: failed })
                    .await;
            }
        });
    }

    fn emit_progress(&self, player_id: u64) {
        if let Ok(progress) = self.lifecycle.progress_of(player_id) {
            self.emit(TowerEvent::ProgressUpdated {
                progress: PlayerProgressSnapshot::from(progress),
            });
        }
    }

    fn emit(&self, event: TowerEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    fn publish_state(&self, now: u64) {
        let snapshot = self.lifecycle.snapshot(now);
        self.state_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
