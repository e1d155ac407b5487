mod builder;
mod gibbs;

pub use builder::Builder;

use std::time::Instant;

use crosscat_data::Datum;
use crosscat_stats::assignment::Assignment;
use crosscat_stats::prior_process::{Crp, PriorProcess};
use log::trace;
use rand::seq::SliceRandom as _;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::StateUpdateConfig;
use crate::error::NumericalError;
use crate::feature::{ColModel, FType, Feature};
use crate::misc::checked_ln_pflip;
use crate::transition::{StateTransition, ViewTransition};
use crate::view::View;

/// Stores some diagnostic info in the `State` at every iteration
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default)]
pub struct StateDiagnostics {
    /// The log score of the state
    pub score: Vec<f64>,
    /// The number of views
    pub n_views: Vec<usize>,
    /// The state CRP alpha
    pub state_alpha: Vec<f64>,
    /// The number of categories in the views with the fewest categories
    pub n_cats_min: Vec<usize>,
    /// The number of categories in the views with the most categories
    pub n_cats_max: Vec<usize>,
    /// The median number of categories in a view
    pub n_cats_median: Vec<f64>,
}

/// The three parts of the default sweep
#[derive(Clone, Copy, Debug)]
enum DefaultStep {
    Views,
    ColumnAssignments,
    ColumnAlpha,
}

/// A cross-categorization state
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    /// The views of columns
    pub views: Vec<View>,
    /// The assignment of columns to views
    pub prior_process: PriorProcess,
    /// The grid the column CRP alpha is resampled from
    pub alpha_grid: Vec<f64>,
    /// The grid each view's row CRP alpha is resampled from
    pub view_alpha_grid: Vec<f64>,
    /// The running diagnostics
    pub diagnostics: StateDiagnostics,
}

impl State {
    pub fn new(
        views: Vec<View>,
        prior_process: PriorProcess,
        alpha_grid: Vec<f64>,
        view_alpha_grid: Vec<f64>,
    ) -> Self {
        State {
            views,
            prior_process,
            alpha_grid,
            view_alpha_grid,
            diagnostics: StateDiagnostics::default(),
        }
    }

    /// The assignment of columns to views
    #[inline]
    pub fn asgn(&self) -> &Assignment {
        &self.prior_process.asgn
    }

    #[inline]
    pub fn asgn_mut(&mut self) -> &mut Assignment {
        &mut self.prior_process.asgn
    }

    /// The column CRP concentration
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.prior_process.process.alpha
    }

    /// Get a reference to the features at `col_ix`
    #[inline]
    pub fn feature(&self, col_ix: usize) -> &ColModel {
        let view_ix = self.asgn().asgn[col_ix];
        &self.views[view_ix].ftrs[&col_ix]
    }

    /// The view holding the column at `col_ix`
    #[inline]
    pub fn view_of(&self, col_ix: usize) -> &View {
        &self.views[self.asgn().asgn[col_ix]]
    }

    /// Get the number of rows
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.views.first().map_or(0, |v| v.n_rows())
    }

    /// Get the number of columns
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.views.iter().fold(0, |acc, v| acc + v.n_cols())
    }

    /// Get the number of views
    #[inline]
    pub fn n_views(&self) -> usize {
        self.views.len()
    }

    /// Returns true if the State has no view, no rows, or no columns
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty() || self.n_cols() == 0 || self.n_rows() == 0
    }

    /// Get the feature type (`FType`) of the column at `col_ix`
    #[inline]
    pub fn ftype(&self, col_ix: usize) -> FType {
        self.feature(col_ix).ftype()
    }

    #[inline]
    pub fn datum(&self, row_ix: usize, col_ix: usize) -> Datum {
        self.feature(col_ix).datum(row_ix)
    }

    /// Run one sweep of `transitions`. An empty list runs the default sweep.
    pub fn step<R: Rng>(
        &mut self,
        transitions: &[StateTransition],
        row_ixs: Option<&[usize]>,
        col_ixs: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<(), NumericalError> {
        if transitions.is_empty() {
            return self.default_step(row_ixs, col_ixs, rng);
        }

        for transition in transitions {
            trace!("running {transition}");
            match transition {
                StateTransition::ColumnPartitionHyperparameter => {
                    self.update_alpha(rng)?;
                }
                StateTransition::ColumnPartitionAssignments => {
                    self.reassign_cols_gibbs(col_ixs, rng)?;
                }
                StateTransition::RowPartitionHyperparameters => {
                    self.update_view_alphas(col_ixs, rng)?;
                }
                StateTransition::ColumnHyperparameters
                | StateTransition::RowPartitionAssignments => {
                    if let Some(t) = transition.view_transition() {
                        let ts = [t];
                        self.step_views(
                            Some(&ts[..]),
                            row_ixs,
                            col_ixs,
                            rng,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Run the per-view transitions, column reassignment, and column alpha
    /// in random order
    pub fn default_step<R: Rng>(
        &mut self,
        row_ixs: Option<&[usize]>,
        col_ixs: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<(), NumericalError> {
        let mut steps = [
            DefaultStep::Views,
            DefaultStep::ColumnAssignments,
            DefaultStep::ColumnAlpha,
        ];
        steps.shuffle(rng);

        for step in steps {
            trace!("running default {step:?}");
            match step {
                DefaultStep::Views => {
                    self.step_views(None, row_ixs, col_ixs, rng)?;
                }
                DefaultStep::ColumnAssignments => {
                    self.reassign_cols_gibbs(col_ixs, rng)?;
                }
                DefaultStep::ColumnAlpha => {
                    self.update_alpha(rng)?;
                }
            }
        }
        Ok(())
    }

    // Run view transitions in parallel on every view, or only on the views
    // holding a column in `col_ixs`. `None` runs each view's default step.
    fn step_views<R: Rng>(
        &mut self,
        transitions: Option<&[ViewTransition]>,
        row_ixs: Option<&[usize]>,
        col_ixs: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<(), NumericalError> {
        let mut rngs: Vec<Xoshiro256Plus> = (0..self.n_views())
            .map(|_| Xoshiro256Plus::seed_from_u64(rng.next_u64()))
            .collect();

        self.views
            .par_iter_mut()
            .zip_eq(rngs.par_iter_mut())
            .filter(|(view, _)| view.holds_any(col_ixs))
            .try_for_each(|(view, t_rng)| match transitions {
                Some(ts) => view.step(ts, row_ixs, col_ixs, t_rng),
                None => view.default_step(row_ixs, col_ixs, t_rng),
            })
    }

    /// Resample the row CRP alpha of each view, or only of the views holding
    /// a column in `col_ixs`
    pub fn update_view_alphas<R: Rng>(
        &mut self,
        col_ixs: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<f64, NumericalError> {
        let mut logp = 0.0;
        for view in self.views.iter_mut() {
            if view.holds_any(col_ixs) {
                logp += view.update_alpha(rng)?;
            }
        }
        Ok(logp)
    }

    /// Resample the column CRP alpha from its grid. Returns the new log
    /// probability of the column partition.
    pub fn update_alpha<R: Rng>(
        &mut self,
        rng: &mut R,
    ) -> Result<f64, NumericalError> {
        let logps = Crp::alpha_conditionals(&self.alpha_grid, self.asgn());
        let ix =
            checked_ln_pflip(&logps, "column_partition_hyperparameter", rng)?;
        self.prior_process.process.alpha = self.alpha_grid[ix];
        Ok(logps[ix])
    }

    /// Run `config.n_iters` sweeps, stopping early on timeout
    pub fn update<R: Rng>(
        &mut self,
        config: &StateUpdateConfig,
        rng: &mut R,
    ) -> Result<(), NumericalError> {
        let time_started = Instant::now();
        for iter in 0..config.n_iters {
            self.step(
                &config.transitions,
                config.row_ixs.as_deref(),
                config.col_ixs.as_deref(),
                rng,
            )?;
            self.push_diagnostics();

            if config.check_over_iters(iter + 1)
                || config.check_over_time(time_started.elapsed().as_secs())
            {
                break;
            }
        }
        Ok(())
    }

    pub fn push_diagnostics(&mut self) {
        // Sort the number of categories in each view
        let n_cats = {
            let mut n_cats: Vec<usize> =
                self.views.iter().map(|view| view.n_cats()).collect();

            n_cats.sort_unstable();
            n_cats
        };

        let n_views = n_cats.len();
        if n_views == 0 {
            return;
        }

        let n_cats_min = n_cats[0];
        let n_cats_max = n_cats[n_views - 1];
        let n_cats_median: f64 = if n_views % 2 == 0 {
            let split = n_views / 2;
            (n_cats[split - 1] + n_cats[split]) as f64 / 2.0
        } else {
            n_cats[n_views / 2] as f64
        };

        debug_assert!(n_cats_min as f64 <= n_cats_median);
        debug_assert!(n_cats_median <= n_cats_max as f64);

        let score = self.score();
        self.diagnostics.score.push(score);
        self.diagnostics.n_views.push(n_views);
        self.diagnostics.state_alpha.push(self.alpha());
        self.diagnostics.n_cats_median.push(n_cats_median);
        self.diagnostics.n_cats_min.push(n_cats_min);
        self.diagnostics.n_cats_max.push(n_cats_max);
    }

    /// The log likelihood of the data given both partitions, with all
    /// component parameters integrated out
    pub fn data_score(&self) -> f64 {
        self.views.iter().map(|view| view.score()).sum()
    }

    /// The log CRP probability of the column partition plus that of every
    /// row partition
    pub fn crp_score(&self) -> f64 {
        self.prior_process.ln_f_partition()
            + self.views.iter().map(|view| view.crp_score()).sum::<f64>()
    }

    /// The joint log score of the state
    pub fn score(&self) -> f64 {
        self.crp_score() + self.data_score()
    }

    /// Remove and return the view, but do not adjust any other metadata
    #[inline]
    fn drop_view(&mut self, view_ix: usize) -> View {
        self.views.remove(view_ix)
    }
}
