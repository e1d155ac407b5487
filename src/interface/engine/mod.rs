//! The Engine
mod builder;
pub mod error;
pub mod update_handler;

pub use builder::EngineBuilder;

use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;

use crate::cc::config::StateUpdateConfig;
use crate::cc::feature::ColModel;
use crate::cc::state::{Builder as StateBuilder, State};
use crate::cc::NumericalError;
use crate::codebook::Codebook;
use crate::config::{EngineUpdateConfig, SaveEngineConfig};
use crate::data::Table;
use crate::interface::{HasCodebook, HasData, HasStates};
use crate::metadata::{
    self, FileConfig, LatentState, Metadata, SerializedType, METADATA_VERSION,
};
use crate::stats::prior_process::InitMode;
use error::{EngineUpdateError, LoadEngineError, NewEngineError};
use update_handler::UpdateHandler;

/// The engine runs states in parallel
#[derive(Clone, Debug)]
pub struct Engine {
    /// Vector of states
    pub states: Vec<State>,
    /// The id of each state. Names the state's save file.
    pub state_ids: Vec<usize>,
    pub codebook: Codebook,
    /// The data every state describes
    pub table: Table,
    pub rng: Xoshiro256Plus,
}

// Why a single chain stopped early
enum ChainError {
    Numerical(NumericalError),
    Save(metadata::Error),
}

impl From<NumericalError> for ChainError {
    fn from(err: NumericalError) -> Self {
        ChainError::Numerical(err)
    }
}

impl From<metadata::Error> for ChainError {
    fn from(err: metadata::Error) -> Self {
        ChainError::Save(err)
    }
}

impl HasStates for Engine {
    #[inline]
    fn states(&self) -> &Vec<State> {
        &self.states
    }

    #[inline]
    fn states_mut(&mut self) -> &mut Vec<State> {
        &mut self.states
    }
}

impl HasData for Engine {
    #[inline]
    fn table(&self) -> &Table {
        &self.table
    }
}

impl HasCodebook for Engine {
    #[inline]
    fn codebook(&self) -> &Codebook {
        &self.codebook
    }
}

impl Engine {
    /// Create a new engine
    ///
    /// # Arguments
    /// - n_states: number of states
    /// - codebook: the column types of `table`
    /// - table: the data
    /// - id_offset: the state ids will be `id_offset..id_offset + n_states`
    /// - rng: Random number generator
    /// - column_init_mode: how columns are first assigned to views
    /// - row_init_mode: how rows are first assigned to clusters
    pub fn new(
        n_states: usize,
        codebook: Codebook,
        table: Table,
        id_offset: usize,
        mut rng: Xoshiro256Plus,
        column_init_mode: InitMode,
        row_init_mode: InitMode,
    ) -> Result<Self, NewEngineError> {
        if n_states == 0 {
            return Err(NewEngineError::ZeroStatesRequested);
        }

        codebook.validate()?;
        codebook.validate_table(&table)?;

        info!(
            "Initializing {} states on a {}x{} table",
            n_states,
            table.n_rows(),
            table.n_cols()
        );

        let states = (0..n_states)
            .map(|_| {
                let ftrs =
                    ColModel::features_from_table(&codebook, &table, &mut rng);
                StateBuilder::new(ftrs)
                    .column_init_mode(column_init_mode)
                    .row_init_mode(row_init_mode)
                    .seed_from_rng(&mut rng)
                    .build()
            })
            .collect::<Result<Vec<State>, _>>()?;

        let state_ids = (id_offset..id_offset + n_states).collect();

        Ok(Engine {
            states,
            state_ids,
            codebook,
            table,
            rng,
        })
    }

    /// Rebuild an engine from snapshots of its states. Every snapshot is
    /// checked against `table`.
    pub fn from_snapshots(
        codebook: Codebook,
        table: Table,
        snapshots: Vec<LatentState>,
        state_ids: Vec<usize>,
        rng: Xoshiro256Plus,
    ) -> Result<Self, NewEngineError> {
        if snapshots.is_empty() {
            return Err(NewEngineError::ZeroStatesRequested);
        }

        if snapshots.len() != state_ids.len() {
            return Err(NewEngineError::StateIdsMismatch {
                n_ids: state_ids.len(),
                n_states: snapshots.len(),
            });
        }

        codebook.validate_table(&table)?;

        let states = snapshots
            .into_par_iter()
            .zip(state_ids.par_iter())
            .map(|(snapshot, &state_id)| {
                snapshot.into_state(&codebook, &table).map_err(|source| {
                    NewEngineError::Conformance { state_id, source }
                })
            })
            .collect::<Result<Vec<State>, _>>()?;

        Ok(Engine {
            states,
            state_ids,
            codebook,
            table,
            rng,
        })
    }

    /// Load an engine from a save directory. The table is not saved, so the
    /// caller supplies it again.
    pub fn load<P: AsRef<Path>>(
        path: P,
        table: Table,
    ) -> Result<Self, LoadEngineError> {
        let Metadata {
            states,
            state_ids,
            codebook,
            rng,
        } = metadata::load_metadata(path.as_ref())?;

        if states.is_empty() {
            return Err(LoadEngineError::NoStates);
        }

        codebook.validate_table(&table)?;

        let states = states
            .into_par_iter()
            .zip(state_ids.par_iter())
            .map(|(snapshot, &state_id)| {
                snapshot.into_state(&codebook, &table).map_err(|source| {
                    LoadEngineError::Conformance { state_id, source }
                })
            })
            .collect::<Result<Vec<State>, _>>()?;

        info!("Loaded {} states from {:?}", states.len(), path.as_ref());

        Ok(Engine {
            states,
            state_ids,
            codebook,
            table,
            rng: rng.unwrap_or_else(Xoshiro256Plus::from_entropy),
        })
    }

    /// Save the codebook, the rng, and a snapshot of every state to `path`
    pub fn save<P: AsRef<Path>>(
        &self,
        path: P,
        ser_type: SerializedType,
    ) -> Result<(), metadata::Error> {
        let metadata = Metadata {
            states: self.snapshots(),
            state_ids: self.state_ids.clone(),
            codebook: self.codebook.clone(),
            rng: Some(self.rng.clone()),
        };
        metadata::save_metadata(&metadata, path, ser_type)
    }

    /// The X_L/X_D snapshot of every state
    pub fn snapshots(&self) -> Vec<LatentState> {
        self.states.par_iter().map(LatentState::from).collect()
    }

    /// Re-seed the random number generator
    pub fn seed_from_u64(&mut self, seed: u64) {
        self.rng = Xoshiro256Plus::seed_from_u64(seed);
    }

    /// Run every state for `n_iters` sweeps of the default transitions
    pub fn run(&mut self, n_iters: usize) -> Result<(), EngineUpdateError> {
        let config = EngineUpdateConfig::new().n_iters(n_iters);
        self.update(&config, ())
    }

    /// Run states in parallel
    ///
    /// Each state gets its own generator seeded from the engine's. A state
    /// whose sweep fails is restored to where it was before the update; the
    /// other states keep their progress and the failures are reported
    /// together.
    pub fn update<U>(
        &mut self,
        config: &EngineUpdateConfig,
        mut update_handler: U,
    ) -> Result<(), EngineUpdateError>
    where
        U: UpdateHandler,
    {
        update_handler.global_init(config, &self.states);

        if let Some(save_config) = config.save_config.as_ref() {
            self.save(&save_config.path, save_config.ser_type)?;
        }

        let mut trngs: Vec<Xoshiro256Plus> = (0..self.states.len())
            .map(|_| Xoshiro256Plus::seed_from_u64(self.rng.next_u64()))
            .collect();

        let state_config = config.state_config();
        let checkpoint = match (config.checkpoint, config.save_config.as_ref())
        {
            (Some(every), Some(save_config)) if every > 0 => {
                Some((save_config, every))
            }
            _ => None,
        };

        let outcomes: Vec<(usize, Result<(), ChainError>)> = self
            .states
            .par_iter_mut()
            .zip(trngs.par_iter_mut())
            .zip(self.state_ids.par_iter())
            .map(|((state, trng), &state_id)| {
                let mut handler = update_handler.clone();
                let backup = state.clone();
                let outcome = run_chain(
                    state,
                    state_id,
                    &state_config,
                    checkpoint,
                    &mut handler,
                    trng,
                );
                if let Err(ChainError::Numerical(ref err)) = outcome {
                    warn!("state {state_id} failed and was restored: {err}");
                    handler.state_failed(state_id, err);
                    *state = backup;
                }
                (state_id, outcome)
            })
            .collect();

        let mut failures = Vec::new();
        let mut save_error = None;
        for (state_id, outcome) in outcomes {
            match outcome {
                Ok(()) => (),
                Err(ChainError::Numerical(err)) => failures.push((state_id, err)),
                Err(ChainError::Save(err)) => {
                    save_error.get_or_insert(err);
                }
            }
        }

        update_handler.finalize();

        if let Some(err) = save_error {
            return Err(EngineUpdateError::Save(err));
        }

        if let Some(save_config) = config.save_config.as_ref() {
            self.save(&save_config.path, save_config.ser_type)?;
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EngineUpdateError::ChainsFailed(failures))
        }
    }
}

fn run_chain<U: UpdateHandler, R: Rng>(
    state: &mut State,
    state_id: usize,
    config: &StateUpdateConfig,
    checkpoint: Option<(&SaveEngineConfig, usize)>,
    handler: &mut U,
    rng: &mut R,
) -> Result<(), ChainError> {
    handler.new_state_init(state_id, state);
    let started = Instant::now();

    for iter in 0..config.n_iters {
        if handler.stop_engine() || handler.stop_state(state_id) {
            debug!("state {state_id} stopped by handler after {iter} sweeps");
            break;
        }

        state.step(
            &config.transitions,
            config.row_ixs.as_deref(),
            config.col_ixs.as_deref(),
            rng,
        )?;
        state.push_diagnostics();
        handler.state_updated(state_id, state);

        debug!(
            "state {} sweep {}: score = {:.4}, n_views = {}",
            state_id,
            iter + 1,
            state.score(),
            state.n_views()
        );

        if let Some((save_config, every)) = checkpoint {
            if (iter + 1) % every == 0 {
                let file_config = FileConfig {
                    metadata_version: METADATA_VERSION,
                    serialized_type: save_config.ser_type,
                };
                metadata::save_state(
                    &save_config.path,
                    &LatentState::from(&*state),
                    state_id,
                    &file_config,
                )?;
            }
        }

        if config.check_over_time(started.elapsed().as_secs()) {
            warn!(
                "state {} hit the {}s timeout after {} sweeps",
                state_id,
                config.timeout.unwrap_or(0),
                iter + 1
            );
            break;
        }
    }

    handler.state_complete(state_id, state);
    Ok(())
}
