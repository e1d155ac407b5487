use std::collections::BTreeMap;

use crosscat_data::Datum;
use crosscat_stats::assignment::Assignment;
use crosscat_stats::prior_process::{Crp, PriorProcess};
use rand::Rng;

use crate::error::NumericalError;
use crate::feature::{ColModel, Feature};
use crate::misc::checked_ln_pflip;
use crate::transition::ViewTransition;

mod builder;
mod gibbs;

pub use builder::Builder;

/// A cross-categorization view of columns/features
///
/// View is a Dirichlet process mixture over its columns. Every column in the
/// view shares the row partition, and each column holds one sufficient
/// statistic per cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    /// A Map of features indexed by the feature ID
    pub ftrs: BTreeMap<usize, ColModel>,
    /// The assignment of rows to categories
    pub prior_process: PriorProcess,
    /// The grid the CRP alpha is resampled from
    pub alpha_grid: Vec<f64>,
}

impl View {
    pub fn asgn(&self) -> &Assignment {
        &self.prior_process.asgn
    }

    pub fn asgn_mut(&mut self) -> &mut Assignment {
        &mut self.prior_process.asgn
    }

    /// The CRP concentration
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.prior_process.process.alpha
    }

    /// The number of rows in the `View`
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.asgn().len()
    }

    /// The number of columns in the `View`
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.ftrs.len()
    }

    /// The number of columns/features
    #[inline]
    pub fn len(&self) -> usize {
        self.n_cols()
    }

    /// returns true if there are no features
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_cols() == 0
    }

    /// The number of categories
    #[inline]
    pub fn n_cats(&self) -> usize {
        self.asgn().n_cats
    }

    /// The probability of the row at `row_ix` belonging to cluster `k` given
    /// the data already assigned to category `k` with all component parameters
    /// marginalized away
    #[inline]
    pub fn predictive_score_at(&self, row_ix: usize, k: usize) -> f64 {
        self.ftrs
            .values()
            .fold(0.0, |acc, ftr| acc + ftr.predictive_score_at(row_ix, k))
    }

    #[inline]
    pub fn logm(&self, k: usize) -> f64 {
        self.ftrs.values().map(|ftr| ftr.logm(k)).sum()
    }

    /// The marginal likelihood of `row_ix`
    #[inline]
    pub fn singleton_score(&self, row_ix: usize) -> f64 {
        self.ftrs
            .values()
            .fold(0.0, |acc, ftr| acc + ftr.singleton_score(row_ix))
    }

    /// Whether the view holds any of `col_ixs`. `None` means every column.
    pub fn holds_any(&self, col_ixs: Option<&[usize]>) -> bool {
        col_ixs.map_or(true, |ixs| ixs.iter().any(|ix| self.ftrs.contains_key(ix)))
    }

    /// get the datum at `row_ix` under the feature with id `col_ix`
    #[inline]
    pub fn datum(&self, row_ix: usize, col_ix: usize) -> Option<Datum> {
        self.ftrs.get(&col_ix).map(|ftr| ftr.datum(row_ix))
    }

    /// Perform MCMC transitions on the view. `row_ixs` restricts the row
    /// reassignment and `col_ixs` the hyperparameter updates.
    pub fn step(
        &mut self,
        transitions: &[ViewTransition],
        row_ixs: Option<&[usize]>,
        col_ixs: Option<&[usize]>,
        rng: &mut impl Rng,
    ) -> Result<(), NumericalError> {
        for transition in transitions {
            match transition {
                ViewTransition::Alpha => {
                    self.update_alpha(rng)?;
                }
                ViewTransition::RowAssignments => {
                    self.reassign_rows_gibbs(row_ixs, rng)?;
                }
                ViewTransition::ColumnHyperparameters => {
                    self.update_hypers(col_ixs, rng)?;
                }
            }
        }
        Ok(())
    }

    /// Run every view transition once in random order
    pub fn default_step(
        &mut self,
        row_ixs: Option<&[usize]>,
        col_ixs: Option<&[usize]>,
        rng: &mut impl Rng,
    ) -> Result<(), NumericalError> {
        let transitions = ViewTransition::shuffled(rng);
        self.step(&transitions, row_ixs, col_ixs, rng)
    }

    /// Resample the CRP alpha from its grid given the partition. Returns the
    /// new log probability of the partition.
    pub fn update_alpha(
        &mut self,
        rng: &mut impl Rng,
    ) -> Result<f64, NumericalError> {
        let logps = Crp::alpha_conditionals(&self.alpha_grid, self.asgn());
        let ix = checked_ln_pflip(&logps, "row_partition_hyperparameters", rng)?;
        self.prior_process.process.alpha = self.alpha_grid[ix];
        Ok(logps[ix])
    }

    /// Resample the hyperparameters of each feature, or of the features with
    /// ids in `col_ixs`
    pub fn update_hypers(
        &mut self,
        col_ixs: Option<&[usize]>,
        rng: &mut impl Rng,
    ) -> Result<f64, NumericalError> {
        let mut score = 0.0;
        for (id, ftr) in self.ftrs.iter_mut() {
            if col_ixs.map_or(true, |ixs| ixs.contains(id)) {
                score += ftr.update_hypers(rng)?;
            }
        }
        Ok(score)
    }

    /// Insert a new `Feature` into the `View`
    #[inline]
    pub fn insert_feature(&mut self, mut ftr: ColModel) {
        let id = ftr.id();
        assert!(
            !self.ftrs.contains_key(&id),
            "Feature {} already in view",
            id
        );
        ftr.reassign(self.asgn());
        self.ftrs.insert(id, ftr);
    }

    /// Remove and return the `Feature` with `id`. Returns `None` if the `id`
    /// is not found.
    #[inline]
    pub fn remove_feature(&mut self, id: usize) -> Option<ColModel> {
        self.ftrs.remove(&id)
    }

    /// Recompute the sufficient statistics in each component
    #[inline]
    pub fn refresh_suffstats(&mut self) {
        for ftr in self.ftrs.values_mut() {
            ftr.reassign(&self.prior_process.asgn);
        }
    }

    /// Get the likelihood of the data in this view given the current assignment
    #[inline]
    pub fn score(&self) -> f64 {
        self.ftrs.values().fold(0.0, |acc, ftr| acc + ftr.score())
    }

    /// The log probability of the row partition under the CRP
    #[inline]
    pub fn crp_score(&self) -> f64 {
        self.prior_process.ln_f_partition()
    }

    /// The normalized CRP weights of each cluster with the weight of a new
    /// cluster appended
    pub fn weights(&self) -> Vec<f64> {
        self.prior_process.weight_vec(true)
    }
}

// private view functions
impl View {
    #[inline]
    fn append_empty_component(&mut self) {
        for ftr in self.ftrs.values_mut() {
            ftr.append_empty_component();
        }
    }

    #[inline]
    fn drop_component(&mut self, k: usize) {
        for ftr in self.ftrs.values_mut() {
            ftr.drop_component(k);
        }
    }

    /// Show the data in `row_ix` to the components `k`
    #[inline]
    fn observe_row(&mut self, row_ix: usize, k: usize) {
        self.ftrs
            .values_mut()
            .for_each(|ftr| ftr.observe_datum(row_ix, k));
    }

    /// Have the components `k` forgets the data in `row_ix`
    #[inline]
    fn forget_row(&mut self, row_ix: usize, k: usize) {
        self.ftrs
            .values_mut()
            .for_each(|ftr| ftr.forget_datum(row_ix, k));
    }
}
