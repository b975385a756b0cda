// Checkpoint activation state for one tower generation.

use crate::domain::errors::CheckpointError;
use crate::domain::progress::PlayerProgress;
use crate::domain::tower::{Checkpoint, TowerDefinition, Vec3};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub checkpoint_id: u32,
    /// True for the first player to touch this checkpoint in the generation.
    pub first_activation: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CheckpointRegistry {
    checkpoints: BTreeMap<u32, Checkpoint>,
}

impl CheckpointRegistry {
    /// Builds a registry with every checkpoint of `tower` unactivated.
    pub fn from_definition(tower: &TowerDefinition) -> Self {
        let checkpoints = tower
            .checkpoints
            .iter()
            .map(|cp| {
                (
                    cp.id,
                    Checkpoint {
                        activated: false,
                        ..cp.clone()
                    },
                )
            })
            .collect();
        Self { checkpoints }
    }

    /// Advances `progress` to `checkpoint_id` if it is strictly past its last checkpoint.
    pub fn activate(
        &mut self,
        progress: &mut PlayerProgress,
        checkpoint_id: u32,
    ) -> Result<Activation, CheckpointError> {
        let checkpoint = self
            .checkpoints
            .get_mut(&checkpoint_id)
            .ok_or(CheckpointError::UnknownCheckpoint(checkpoint_id))?;

        if progress
            .last_checkpoint
            .is_some_and(|last| checkpoint_id <= last)
        {
            return Err(CheckpointError::AlreadyReached { checkpoint_id });
        }

        progress.last_checkpoint = Some(checkpoint_id);
        let first_activation = !checkpoint.activated;
        checkpoint.activated = true;

        Ok(Activation {
            checkpoint_id,
            first_activation,
        })
    }

    pub fn position_of(&self, checkpoint_id: u32) -> Option<Vec3> {
        self.checkpoints.get(&checkpoint_id).map(|cp| cp.position)
    }

    pub fn get(&self, checkpoint_id: u32) -> Option<&Checkpoint> {
        self.checkpoints.get(&checkpoint_id)
    }

    /// Respawn point for `progress`, or `None` when the caller should use the tower spawn.
    pub fn reset_position_for(&self, progress: &PlayerProgress) -> Option<Vec3> {
        progress
            .last_checkpoint
            .and_then(|id| self.position_of(id))
    }

    /// Checkpoints in ascending id order.
    pub fn checkpoints(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.values()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}
