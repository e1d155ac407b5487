use super::View;

use crate::feature::ColModel;
use crate::feature::Feature;

use std::collections::BTreeMap;

use crosscat_stats::assignment::Assignment;
use crosscat_stats::hyper_grid::crp_alpha_grid;
use crosscat_stats::prior_process::{
    Builder as PriorProcessBuilder, BuildPriorProcessError, Crp, InitMode,
    PriorProcess,
};
use crosscat_utils::choose_uniform;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// Builds a `View`
pub struct Builder {
    n_rows: usize,
    alpha: Option<f64>,
    alpha_grid: Option<Vec<f64>>,
    asgn: Option<Assignment>,
    init_mode: InitMode,
    ftrs: Option<Vec<ColModel>>,
    seed: Option<u64>,
}

impl Builder {
    /// Start building a view with a given number of rows
    pub fn new(n_rows: usize) -> Self {
        Builder {
            n_rows,
            alpha: None,
            alpha_grid: None,
            asgn: None,
            init_mode: InitMode::FromThePrior,
            ftrs: None,
            seed: None,
        }
    }

    /// Start building a view with a given row assignment.
    ///
    /// Note that the number of rows will be the assignment length.
    pub fn from_assignment(asgn: Assignment) -> Self {
        Builder {
            n_rows: asgn.len(),
            asgn: Some(asgn),
            ..Builder::new(0)
        }
    }

    pub fn from_prior_process(prior_process: PriorProcess) -> Self {
        Builder {
            n_rows: prior_process.asgn.len(),
            alpha: Some(prior_process.process.alpha),
            asgn: Some(prior_process.asgn),
            ..Builder::new(0)
        }
    }

    /// Set the CRP alpha. If not set, alpha is drawn from the grid.
    #[must_use]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Set the grid the CRP alpha is resampled from
    #[must_use]
    pub fn alpha_grid(mut self, grid: Vec<f64>) -> Self {
        self.alpha_grid = Some(grid);
        self
    }

    /// How to initialize the row partition if no assignment is given
    #[must_use]
    pub fn init_mode(mut self, init_mode: InitMode) -> Self {
        self.init_mode = init_mode;
        self
    }

    /// Add features to the `View`
    #[must_use]
    pub fn features(mut self, ftrs: Vec<ColModel>) -> Self {
        self.ftrs = Some(ftrs);
        self
    }

    /// Set the RNG seed
    #[must_use]
    pub fn seed_from_u64(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the RNG seed from another RNG
    #[must_use]
    pub fn seed_from_rng<R: Rng>(mut self, rng: &mut R) -> Self {
        self.seed = Some(rng.next_u64());
        self
    }

    /// Build the `View` and consume the builder
    pub fn build(self) -> Result<View, BuildPriorProcessError> {
        let mut rng = match self.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };

        let alpha_grid = self
            .alpha_grid
            .unwrap_or_else(|| crp_alpha_grid(self.n_rows));

        let alpha = self
            .alpha
            .unwrap_or_else(|| choose_uniform(&alpha_grid, &mut rng));

        let prior_process = match self.asgn {
            Some(asgn) => PriorProcess {
                process: Crp::new(alpha),
                asgn,
            },
            None => PriorProcessBuilder::new(self.n_rows)
                .with_alpha(alpha)
                .init_mode(self.init_mode)
                .seed_from_rng(&mut rng)
                .build()?,
        };

        let mut ftr_tree = BTreeMap::new();
        if let Some(mut ftrs) = self.ftrs {
            for mut ftr in ftrs.drain(..) {
                ftr.reassign(&prior_process.asgn);
                ftr_tree.insert(ftr.id(), ftr);
            }
        }

        Ok(View {
            ftrs: ftr_tree,
            prior_process,
            alpha_grid,
        })
    }
}
