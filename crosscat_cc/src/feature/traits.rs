//! Defines the `Feature` trait for cross-categorization columns
use crosscat_data::{Datum, FeatureData};
use crosscat_stats::assignment::Assignment;
use crosscat_stats::rv::dist::{
    Categorical, Gaussian, NormalGamma, SymmetricDirichlet,
};
use enum_dispatch::enum_dispatch;
use rand::Rng;

use crate::error::NumericalError;
use crate::feature::{ColModel, Column, FType};

/// A Cross-Categorization feature/column
///
/// Cluster-indexed methods take a component index `k`. In the query methods
/// (`cpnt_*` and `draw`) `k == self.k()` refers to a new, empty cluster.
#[enum_dispatch(ColModel)]
pub trait Feature {
    /// The feature ID
    fn id(&self) -> usize;
    /// Set the feature ID
    fn set_id(&mut self, id: usize);

    /// The number of rows
    fn len(&self) -> usize;
    /// Whether len is zero
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// The number of components
    fn k(&self) -> usize;
    fn ftype(&self) -> FType;

    /// Rebuild the component statistics from the data according to the
    /// assignment
    fn reassign(&mut self, asgn: &Assignment);
    /// The log marginal likelihood of the data under the current assignment
    fn score(&self) -> f64;
    /// The log marginal likelihood of the data under a different assignment
    fn asgn_score(&self, asgn: &Assignment) -> f64;
    /// Resample the hyperparameters from their grids. Returns the new score.
    fn update_hypers(
        &mut self,
        rng: &mut impl Rng,
    ) -> Result<f64, NumericalError>;
    /// Append a component with no data
    fn append_empty_component(&mut self);
    /// Remove the component at index `k`
    fn drop_component(&mut self, k: usize);
    /// The log posterior predictive of the datum at `row_ix` under
    /// component `k`. Missing data score zero.
    fn predictive_score_at(&self, row_ix: usize, k: usize) -> f64;
    /// The marginal likelihood of the datum on its own
    fn singleton_score(&self, row_ix: usize) -> f64;
    /// The marginal likelihood of the data in component k
    fn logm(&self, k: usize) -> f64;

    /// Have the component at index `k` observe the datum at row `row_ix`
    fn observe_datum(&mut self, row_ix: usize, k: usize);
    /// Have the component at index `k` forget the datum at row `row_ix`
    fn forget_datum(&mut self, row_ix: usize, k: usize);

    /// Returns `true` if the datum at index `ix` is missing
    fn is_missing(&self, ix: usize) -> bool;
    /// Returns `true` if the datum at index `ix` is not missing
    fn is_present(&self, ix: usize) -> bool {
        !self.is_missing(ix)
    }
    /// Get a datum
    fn datum(&self, ix: usize) -> Datum;
    /// Get a clone of the feature data
    fn clone_data(&self) -> FeatureData;

    /// Log posterior predictive of `x` under component `k` after
    /// conditioning on `constraints`
    fn cpnt_ln_pp(&self, k: usize, x: &Datum, constraints: &[Datum]) -> f64;
    /// Log probability of `x` under component `k`. Continuous values are
    /// scored by the mass of a small window around them.
    fn cpnt_ln_probability(
        &self,
        k: usize,
        x: &Datum,
        constraints: &[Datum],
    ) -> f64;
    /// Log density (continuous) or mass (categorical) of `x` under
    /// component `k`
    fn cpnt_ln_density(
        &self,
        k: usize,
        x: &Datum,
        constraints: &[Datum],
    ) -> f64;
    /// Draw from the posterior predictive of component `k`
    fn draw(
        &self,
        k: usize,
        constraints: &[Datum],
        rng: &mut impl Rng,
    ) -> Datum;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;
    use crosscat_data::DataContainer;
    use crosscat_stats::hyper_grid::NgGrid;
    use crosscat_stats::prior_process::Builder as PriorProcessBuilder;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn score_and_asgn_score_equivalency() {
        let n_rows = 100;
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        for _ in 0..20 {
            let asgn = PriorProcessBuilder::new(n_rows)
                .seed_from_rng(&mut rng)
                .build()
                .unwrap()
                .asgn;
            let xs: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>()).collect();
            let grid = NgGrid::new(&xs, n_rows);
            let data = DataContainer::new(xs);
            let prior = NormalGamma::new(0.0, 1.0, 1.0, 1.0).unwrap();
            let mut feature: Column<f64, Gaussian, NormalGamma> =
                Column::new(0, data, prior, grid);
            feature.reassign(&asgn);

            assert_relative_eq!(
                feature.score(),
                feature.asgn_score(&asgn),
                epsilon = 1E-8
            );
        }
    }
}
