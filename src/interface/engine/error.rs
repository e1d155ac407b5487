use crate::cc::{BuildStateError, NumericalError};
use crate::codebook::CodebookError;
use crate::metadata::{ConformanceError, Error as MetadataError};
use thiserror::Error;

/// Errors that can arise when creating a new engine
#[derive(Debug, Error)]
pub enum NewEngineError {
    /// Asked for zero states. The Engine must have at least one state.
    #[error("attempted to create an engine with zero states")]
    ZeroStatesRequested,
    /// The table does not match the codebook
    #[error("codebook error: {0}")]
    Codebook(#[from] CodebookError),
    /// A chain could not be initialized
    #[error("could not build state: {0}")]
    BuildState(#[from] BuildStateError),
    /// A supplied snapshot does not describe the table
    #[error("snapshot for state {state_id} does not conform: {source}")]
    Conformance {
        state_id: usize,
        source: ConformanceError,
    },
    /// Snapshot and state id lists differ in length
    #[error("{n_ids} state ids supplied for {n_states} snapshots")]
    StateIdsMismatch { n_ids: usize, n_states: usize },
}

/// Errors that can arise while running the chains
#[derive(Debug, Error)]
pub enum EngineUpdateError {
    /// One or more chains hit a numerical failure. Each failed chain keeps
    /// its state from before the update; the others keep their progress.
    #[error("{} chain(s) failed: {}", .0.len(), describe_failures(.0))]
    ChainsFailed(Vec<(usize, NumericalError)>),
    /// Saving a checkpoint or the final states failed
    #[error("failed to save states: {0}")]
    Save(#[from] MetadataError),
}

fn describe_failures(failures: &[(usize, NumericalError)]) -> String {
    failures
        .iter()
        .map(|(id, err)| format!("state {id}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can arise when loading an engine from disk
#[derive(Debug, Error)]
pub enum LoadEngineError {
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
    /// The table does not match the saved codebook
    #[error("codebook error: {0}")]
    Codebook(#[from] CodebookError),
    /// A saved state does not describe the supplied table
    #[error("state {state_id} does not conform to the table: {source}")]
    Conformance {
        state_id: usize,
        source: ConformanceError,
    },
    /// No state files were found in the directory
    #[error("no states found in the save directory")]
    NoStates,
}
