use super::State;

use crate::error::BuildStateError;
use crate::feature::{ColModel, Feature};
use crate::view::{self, View};

use crosscat_stats::hyper_grid::crp_alpha_grid;
use crosscat_stats::prior_process::{Builder as PriorProcessBuilder, InitMode};
use crosscat_utils::choose_uniform;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// Builds a `State` from a set of features
///
/// The column and row alpha grids are built from the number of columns and
/// rows; initial alphas are drawn uniformly from them.
#[derive(Debug, Clone)]
pub struct Builder {
    ftrs: Vec<ColModel>,
    col_init: InitMode,
    row_init: InitMode,
    seed: Option<u64>,
}

impl Builder {
    pub fn new(ftrs: Vec<ColModel>) -> Self {
        Builder {
            ftrs,
            col_init: InitMode::FromThePrior,
            row_init: InitMode::FromThePrior,
            seed: None,
        }
    }

    /// How to initialize the assignment of columns to views
    #[must_use]
    pub fn column_init_mode(mut self, mode: InitMode) -> Self {
        self.col_init = mode;
        self
    }

    /// How to initialize the assignment of rows to clusters in every view
    #[must_use]
    pub fn row_init_mode(mut self, mode: InitMode) -> Self {
        self.row_init = mode;
        self
    }

    /// Seed from an RNG
    #[must_use]
    pub fn seed_from_rng<R: Rng>(mut self, rng: &mut R) -> Self {
        self.seed = Some(rng.next_u64());
        self
    }

    /// With an RNG seed
    #[must_use]
    pub fn seed_from_u64(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the `State`
    pub fn build(self) -> Result<State, BuildStateError> {
        let mut rng = match self.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };

        let n_cols = self.ftrs.len();
        let n_rows = match self.ftrs.first() {
            Some(ftr) => ftr.len(),
            None => return Err(BuildStateError::NoColumns),
        };

        for (col_ix, ftr) in self.ftrs.iter().enumerate() {
            if ftr.id() != col_ix {
                return Err(BuildStateError::BadColumnId {
                    col_ix,
                    id: ftr.id(),
                    n_cols,
                });
            }
            if ftr.len() != n_rows {
                return Err(BuildStateError::ColumnLengthMismatch {
                    col_ix,
                    n_rows: ftr.len(),
                    expected: n_rows,
                });
            }
        }

        let alpha_grid = crp_alpha_grid(n_cols);
        let view_alpha_grid = crp_alpha_grid(n_rows);

        let prior_process = PriorProcessBuilder::new(n_cols)
            .with_alpha(choose_uniform(&alpha_grid, &mut rng))
            .init_mode(self.col_init)
            .seed_from_rng(&mut rng)
            .build()?;

        let mut views = (0..prior_process.asgn.n_cats)
            .map(|_| {
                view::Builder::new(n_rows)
                    .alpha_grid(view_alpha_grid.clone())
                    .init_mode(self.row_init)
                    .seed_from_rng(&mut rng)
                    .build()
            })
            .collect::<Result<Vec<View>, _>>()?;

        for (&v, ftr) in prior_process.asgn.asgn.iter().zip(self.ftrs) {
            views[v].insert_feature(ftr);
        }

        Ok(State::new(views, prior_process, alpha_grid, view_alpha_grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crosscat_codebook::ColType;
    use crosscat_data::Table;

    fn features(n_rows: usize, n_cols: usize) -> Vec<ColModel> {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let cols = (0..n_cols)
            .map(|_| (0..n_rows).map(|_| rng.gen::<f64>()).collect())
            .collect();
        let table = Table::from_columns(cols).unwrap();
        (0..n_cols)
            .map(|ix| {
                ColModel::from_table(ix, &ColType::Continuous, &table, &mut rng)
            })
            .collect()
    }

    #[test]
    fn no_columns_is_an_error() {
        let res = Builder::new(vec![]).seed_from_u64(1).build();
        assert_eq!(res.unwrap_err(), BuildStateError::NoColumns);
    }

    #[test]
    fn out_of_order_ids_are_an_error() {
        let mut ftrs = features(5, 3);
        ftrs.swap(0, 2);
        let res = Builder::new(ftrs).seed_from_u64(1).build();
        assert!(matches!(res, Err(BuildStateError::BadColumnId { .. })));
    }

    #[test]
    fn init_modes() {
        let state = Builder::new(features(8, 4))
            .column_init_mode(InitMode::Apart)
            .row_init_mode(InitMode::Together)
            .seed_from_u64(1)
            .build()
            .unwrap();
        assert_eq!(state.n_views(), 4);
        assert!(state.views.iter().all(|view| view.n_cats() == 1));

        let state = Builder::new(features(8, 4))
            .column_init_mode(InitMode::Together)
            .row_init_mode(InitMode::Apart)
            .seed_from_u64(1)
            .build()
            .unwrap();
        assert_eq!(state.n_views(), 1);
        assert_eq!(state.views[0].n_cats(), 8);
    }

    #[test]
    fn alphas_come_from_the_grids() {
        let state = Builder::new(features(30, 6))
            .seed_from_u64(17)
            .build()
            .unwrap();
        assert!(state.alpha_grid.contains(&state.alpha()));
        assert!(state
            .views
            .iter()
            .all(|view| state.view_alpha_grid.contains(&view.alpha())));
    }

    #[test]
    fn seeded_builds_match() {
        let a = Builder::new(features(30, 6)).seed_from_u64(17).build();
        let b = Builder::new(features(30, 6)).seed_from_u64(17).build();
        assert_eq!(a, b);
    }
}
