use std::fmt::Debug;

use crosscat_data::{DataContainer, Datum, FeatureData};
use crosscat_stats::hyper_grid::{CsdGrid, NgGrid, NgParam};
use crosscat_stats::rv::data::{
    CategoricalSuffStat, DataOrSuffStat, GaussianSuffStat,
};
use crosscat_stats::rv::dist::{
    Categorical, Gaussian, NormalGamma, SymmetricDirichlet,
};
use crosscat_stats::rv::traits::{ConjugatePrior, HasSuffStat, Rv};
use crosscat_stats::StudentT;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::NumericalError;
use crate::misc::checked_ln_pflip;

/// A datum type that can live in a column
pub trait CcDatum:
    Clone + Default + Debug + PartialEq + Sync + Send + TryFrom<Datum>
{
    fn into_datum(self) -> Datum;

    /// Extract from a `Datum`, panicking if the variant does not match
    fn from_datum(datum: Datum) -> Self {
        match Self::try_from(datum) {
            Ok(x) => x,
            Err(_) => panic!("Invalid Datum variant for conversion: {datum:?}"),
        }
    }

    fn into_feature_data(xs: DataContainer<Self>) -> FeatureData;
}

impl CcDatum for f64 {
    fn into_datum(self) -> Datum {
        Datum::Continuous(self)
    }

    fn into_feature_data(xs: DataContainer<f64>) -> FeatureData {
        FeatureData::Continuous(xs)
    }
}

impl CcDatum for u32 {
    fn into_datum(self) -> Datum {
        Datum::Categorical(self)
    }

    fn into_feature_data(xs: DataContainer<u32>) -> FeatureData {
        FeatureData::Categorical(xs)
    }
}

/// A sufficient statistic a column can hold and clone
pub trait CcStat: Sync + Send + Debug + Clone + PartialEq {}

impl<X> CcStat for X where X: Sync + Send + Debug + Clone + PartialEq {}

/// A component likelihood, f(x)
pub trait CcLikelihood<X: CcDatum>:
    Rv<X> + HasSuffStat<X> + Clone + Debug + Sync + Send
{
}

impl<X, Fx> CcLikelihood<X> for Fx
where
    X: CcDatum,
    Fx: Rv<X> + HasSuffStat<X> + Clone + Debug + Sync + Send,
{
}

/// A conjugate prior whose hyperparameters are resampled from a grid
pub trait CcPrior<X, Fx>:
    ConjugatePrior<X, Fx> + Clone + Debug + PartialEq + Sync + Send
where
    X: CcDatum,
    Fx: CcLikelihood<X>,
{
    type Grid: Clone + Debug + PartialEq + Sync + Send;

    /// A statistic summarizing no data
    fn empty_suffstat(&self) -> Fx::Stat;

    /// Resample the hyperparameters given the statistics of every cluster.
    /// Returns the new log marginal likelihood of the column.
    fn update_from_grid<R: Rng>(
        &mut self,
        grid: &Self::Grid,
        stats: &[Fx::Stat],
        rng: &mut R,
    ) -> Result<f64, NumericalError>;

    /// Log marginal likelihood of the data summarized by `stat`
    fn ln_m_stat(&self, stat: &Fx::Stat) -> f64 {
        self.ln_m(&DataOrSuffStat::<X, Fx>::SuffStat(stat))
    }

    /// Log posterior predictive of `x` given the data summarized by `stat`
    fn ln_pp_stat(&self, x: &X, stat: &Fx::Stat) -> f64 {
        self.ln_pp(x, &DataOrSuffStat::<X, Fx>::SuffStat(stat))
    }

    /// Log probability of `x` for queries. Discrete models return the
    /// predictive mass; continuous models the mass of a small window around
    /// `x`.
    fn ln_pp_probability(&self, x: &X, stat: &Fx::Stat) -> f64 {
        self.ln_pp_stat(x, stat)
    }

    /// Log predictive density (or mass) of `x` for queries
    fn ln_pp_density(&self, x: &X, stat: &Fx::Stat) -> f64 {
        self.ln_pp_stat(x, stat)
    }

    /// Draw from the posterior predictive by drawing component parameters
    /// from the posterior, then a datum from the component
    fn draw_pp<R: Rng>(&self, stat: &Fx::Stat, rng: &mut R) -> X {
        let post = self.posterior(&DataOrSuffStat::<X, Fx>::SuffStat(stat));
        let fx: Fx = post.draw(rng);
        fx.draw(rng)
    }
}

impl CcPrior<f64, Gaussian> for NormalGamma {
    type Grid = NgGrid;

    fn empty_suffstat(&self) -> GaussianSuffStat {
        GaussianSuffStat::new()
    }

    fn update_from_grid<R: Rng>(
        &mut self,
        grid: &NgGrid,
        stats: &[GaussianSuffStat],
        rng: &mut R,
    ) -> Result<f64, NumericalError> {
        let mut params = NgParam::ALL;
        params.shuffle(rng);

        let mut score = 0.0;
        for param in params {
            let logps = grid.conditionals(self, param, stats);
            let ix = checked_ln_pflip(&logps, "column_hyperparameters", rng)?;
            param.set(self, grid.get(param)[ix]);
            score = logps[ix];
        }
        Ok(score)
    }

    fn ln_pp_probability(&self, x: &f64, stat: &GaussianSuffStat) -> f64 {
        let eps = crosscat_consts::PROBABILITY_EPSILON;
        let post = self.posterior(&DataOrSuffStat::<f64, Gaussian>::SuffStat(stat));
        let pp = StudentT::predictive(&post);
        (pp.cdf(x + eps) - pp.cdf(x - eps)).ln()
    }

    fn ln_pp_density(&self, x: &f64, stat: &GaussianSuffStat) -> f64 {
        let post = self.posterior(&DataOrSuffStat::<f64, Gaussian>::SuffStat(stat));
        StudentT::predictive(&post).ln_pdf(*x)
    }
}

impl CcPrior<u32, Categorical> for SymmetricDirichlet {
    type Grid = CsdGrid;

    fn empty_suffstat(&self) -> CategoricalSuffStat {
        CategoricalSuffStat::new(self.k())
    }

    fn update_from_grid<R: Rng>(
        &mut self,
        grid: &CsdGrid,
        stats: &[CategoricalSuffStat],
        rng: &mut R,
    ) -> Result<f64, NumericalError> {
        let logps = grid.conditionals(stats);
        let ix = checked_ln_pflip(&logps, "column_hyperparameters", rng)?;
        self.set_alpha_unchecked(grid.alpha[ix]);
        Ok(logps[ix])
    }
}
