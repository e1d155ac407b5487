use std::path::PathBuf;

use crate::cc::config::StateUpdateConfig;
use crate::cc::transition::StateTransition;
use crate::metadata::SerializedType;
use serde::{Deserialize, Serialize};

/// Where and how `Engine::update` saves its states
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct SaveEngineConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub ser_type: SerializedType,
}

/// Configuration for `Engine.update`
///
/// Sets the number of iterations, timeout, transitions, the rows and columns
/// the transitions may touch, and output.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineUpdateConfig {
    /// Maximum number of iterations to run.
    pub n_iters: usize,
    /// Timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// If defined, states are saved to this directory after the run or at
    /// checkpoints
    #[serde(default)]
    pub save_config: Option<SaveEngineConfig>,
    /// Which transitions to run. Empty runs the default sweep.
    #[serde(default)]
    pub transitions: Vec<StateTransition>,
    /// Rows the row kernels may reassign
    #[serde(default)]
    pub row_ixs: Option<Vec<usize>>,
    /// Columns the column kernels may move or update
    #[serde(default)]
    pub col_ixs: Option<Vec<usize>>,
    /// Number of iterations after which each state should be saved
    #[serde(default)]
    pub checkpoint: Option<usize>,
}

impl EngineUpdateConfig {
    pub fn new() -> Self {
        Self {
            n_iters: 1,
            timeout: None,
            transitions: Vec::new(),
            row_ixs: None,
            col_ixs: None,
            save_config: None,
            checkpoint: None,
        }
    }

    pub fn with_default_transitions() -> Self {
        Self::new().default_transitions()
    }

    /// Run the default sweep. Clears any listed transitions.
    pub fn default_transitions(mut self) -> Self {
        self.transitions.clear();
        self
    }

    pub fn transitions(mut self, transitions: Vec<StateTransition>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    pub fn transition(mut self, transition: StateTransition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Restrict row reassignment to `row_ixs`
    pub fn row_ixs(mut self, row_ixs: Vec<usize>) -> Self {
        self.row_ixs = Some(row_ixs);
        self
    }

    /// Restrict column reassignment and hyperparameter updates to `col_ixs`
    pub fn col_ixs(mut self, col_ixs: Vec<usize>) -> Self {
        self.col_ixs = Some(col_ixs);
        self
    }

    /// Emit a `StateUpdateConfig` with the same settings
    pub fn state_config(&self) -> StateUpdateConfig {
        StateUpdateConfig {
            n_iters: self.n_iters,
            timeout: self.timeout,
            transitions: self.transitions.clone(),
            row_ixs: self.row_ixs.clone(),
            col_ixs: self.col_ixs.clone(),
        }
    }

    pub fn n_iters(mut self, n_iters: usize) -> Self {
        self.n_iters = n_iters;
        self
    }

    pub fn checkpoint(mut self, checkpoint: Option<usize>) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn timeout(mut self, seconds: Option<u64>) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn save_config(mut self, save_config: SaveEngineConfig) -> Self {
        self.save_config = Some(save_config);
        self
    }
}

impl Default for EngineUpdateConfig {
    fn default() -> Self {
        Self::new()
    }
}
