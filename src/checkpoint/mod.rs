//! Checkpoint and resume functionality for state machines.
//!
//! A checkpoint records which machine it came from, the current state name
//! and the transition history. States themselves are never serialized:
//! restoring resolves the state name against the current rules, exactly as
//! initializing a machine from a stored state name does.

use crate::core::StateHistory;
use crate::machine::StateMachine;
use crate::rules::RuleManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineCheckpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Machine name the rules were loaded for
    pub machine_name: String,

    /// Current state name, `None` for an uninitialized machine
    pub current_state: Option<String>,

    /// Committed transitions
    pub history: StateHistory,
}

impl MachineCheckpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }

    /// The last recorded transition must end in the recorded current state.
    fn check_consistency(&self) -> Result<(), CheckpointError> {
        let Some(last) = self.history.transitions().last() else {
            return Ok(());
        };
        match self.current_state.as_deref() {
            Some(current) if current == last.to => Ok(()),
            other => Err(CheckpointError::ValidationFailed(format!(
                "history ends in [{}] but current state is [{}]",
                last.to,
                other.unwrap_or("<none>")
            ))),
        }
    }
}

impl StateMachine {
    /// Snapshot the current state name and history.
    pub fn checkpoint(&self) -> MachineCheckpoint {
        MachineCheckpoint {
            version: CHECKPOINT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            machine_name: self.machine_name().to_string(),
            current_state: self.current_state_name().map(str::to_string),
            history: self.history().clone(),
        }
    }

    /// Rebuild a machine from `checkpoint` using `rules`.
    ///
    /// No hooks run; the restored state is a fresh instance resolved by name.
    pub fn restore(
        rules: Arc<RuleManager>,
        checkpoint: &MachineCheckpoint,
    ) -> Result<Self, CheckpointError> {
        checkpoint.check_version()?;
        if checkpoint.machine_name != rules.machine_name() {
            return Err(CheckpointError::MachineMismatch {
                expected: rules.machine_name().to_string(),
                found: checkpoint.machine_name.clone(),
            });
        }
        checkpoint.check_consistency()?;

        let mut machine = StateMachine::new(rules);
        if let Some(state) = &checkpoint.current_state {
            machine.initialize_state(state)?;
        }
        machine.restore_history(checkpoint.history.clone());

        tracing::debug!(
            machine = machine.machine_name(),
            checkpoint = %checkpoint.id,
            state = ?checkpoint.current_state,
            "state machine restored from checkpoint"
        );
        Ok(machine)
    }
}
