use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use super::error::NewEngineError;
use super::Engine;
use crate::codebook::Codebook;
use crate::consts::DEFAULT_N_STATES;
use crate::data::Table;
use crate::stats::prior_process::InitMode;

const DEFAULT_ID_OFFSET: usize = 0;

/// Builds `Engine`s
pub struct EngineBuilder {
    n_states: Option<usize>,
    codebook: Codebook,
    table: Table,
    id_offset: Option<usize>,
    seed: Option<u64>,
    column_init_mode: InitMode,
    row_init_mode: InitMode,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(codebook: Codebook, table: Table) -> Self {
        Self {
            n_states: None,
            codebook,
            table,
            id_offset: None,
            seed: None,
            column_init_mode: InitMode::default(),
            row_init_mode: InitMode::default(),
        }
    }

    /// With a certain number of states
    #[must_use]
    pub fn with_nstates(mut self, n_states: usize) -> Self {
        self.n_states = Some(n_states);
        self
    }

    /// With state IDs starting at an offset
    #[must_use]
    pub fn id_offset(mut self, id_offset: usize) -> Self {
        self.id_offset = Some(id_offset);
        self
    }

    /// With a given random number generator
    #[must_use]
    pub fn seed_from_u64(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// How columns are initially assigned to views
    #[must_use]
    pub fn column_init_mode(mut self, mode: InitMode) -> Self {
        self.column_init_mode = mode;
        self
    }

    /// How rows are initially assigned to clusters in every view
    #[must_use]
    pub fn row_init_mode(mut self, mode: InitMode) -> Self {
        self.row_init_mode = mode;
        self
    }

    /// Build the `Engine`; consume the `Builder`.
    pub fn build(self) -> Result<Engine, NewEngineError> {
        let n_states = self.n_states.unwrap_or(DEFAULT_N_STATES);
        let id_offset = self.id_offset.unwrap_or(DEFAULT_ID_OFFSET);
        let rng = match self.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };

        Engine::new(
            n_states,
            self.codebook,
            self.table,
            id_offset,
            rng,
            self.column_init_mode,
            self.row_init_mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::gen_factorial_data;
    use crate::HasStates;
    use maplit::btreeset;
    use std::collections::BTreeSet;

    fn builder() -> EngineBuilder {
        let (table, codebook) =
            gen_factorial_data(1337, 2, 3, 30, 1, 10.0, 1.0).unwrap();
        EngineBuilder::new(codebook, table)
    }

    fn state_ids(engine: &Engine) -> BTreeSet<usize> {
        engine.state_ids.iter().copied().collect()
    }

    #[test]
    fn default_build_settings() {
        let engine = builder().build().unwrap();
        assert_eq!(engine.n_states(), 8);
        assert_eq!(state_ids(&engine), btreeset! {0, 1, 2, 3, 4, 5, 6, 7});
    }

    #[test]
    fn with_id_offset_3() {
        let engine = builder().id_offset(3).build().unwrap();
        assert_eq!(
            state_ids(&engine),
            btreeset! {3, 4, 5, 6, 7, 8, 9, 10}
        );
    }

    #[test]
    fn with_nstates_3() {
        let engine = builder().with_nstates(3).build().unwrap();
        assert_eq!(engine.n_states(), 3);
        assert_eq!(state_ids(&engine), btreeset! {0, 1, 2});
    }

    #[test]
    fn with_nstates_0_causes_error() {
        let result = builder().with_nstates(0).build();
        assert!(matches!(result, Err(NewEngineError::ZeroStatesRequested)));
    }

    #[test]
    fn seeding_engine_works() {
        let seed: u64 = 8_675_309;
        let e1 = builder().with_nstates(4).seed_from_u64(seed).build().unwrap();
        let e2 = builder().with_nstates(4).seed_from_u64(seed).build().unwrap();

        for (s1, s2) in e1.states.iter().zip(e2.states.iter()) {
            assert_eq!(s1.asgn().asgn, s2.asgn().asgn);
            for (v1, v2) in s1.views.iter().zip(s2.views.iter()) {
                assert_eq!(v1.asgn().asgn, v2.asgn().asgn);
            }
        }
    }

    #[test]
    fn together_init_gives_one_view_one_cluster() {
        let engine = builder()
            .with_nstates(2)
            .seed_from_u64(17)
            .column_init_mode(InitMode::Together)
            .row_init_mode(InitMode::Together)
            .build()
            .unwrap();

        for state in engine.states.iter() {
            assert_eq!(state.n_views(), 1);
            assert_eq!(state.views[0].n_cats(), 1);
        }
    }

    #[test]
    fn apart_init_gives_one_view_per_column() {
        let engine = builder()
            .with_nstates(2)
            .seed_from_u64(17)
            .column_init_mode(InitMode::Apart)
            .build()
            .unwrap();

        for state in engine.states.iter() {
            assert_eq!(state.n_views(), 3);
        }
    }
}
