use std::borrow::Cow;
use std::marker::PhantomData;

use crosscat_codebook::{Codebook, ColType};
use crosscat_data::{Container, DataContainer, Datum, FeatureData, Table};
use crosscat_stats::assignment::{Assignment, UNASSIGNED};
use crosscat_stats::hyper_grid::{CsdGrid, NgGrid};
use crosscat_stats::rv::dist::{
    Categorical, Gaussian, NormalGamma, SymmetricDirichlet,
};
use crosscat_stats::rv::traits::SuffStat;
use enum_dispatch::enum_dispatch;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NumericalError;
use crate::feature::traits::Feature;
use crate::feature::FType;
use crate::traits::{CcDatum, CcLikelihood, CcPrior, CcStat};

/// A partitioned column of data
///
/// Holds the column's data, the hyperparameters of its component model with
/// the grid they are resampled from, and one sufficient statistic per
/// cluster of the view the column belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct Column<X, Fx, Pr>
where
    X: CcDatum,
    Fx: CcLikelihood<X>,
    Fx::Stat: CcStat,
    Pr: CcPrior<X, Fx>,
{
    pub id: usize,
    pub data: DataContainer<X>,
    pub prior: Pr,
    pub grid: Pr::Grid,
    pub stats: Vec<Fx::Stat>,
    _phantom: PhantomData<Fx>,
}

/// The hyperparameters of a column's component model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hypers {
    Continuous(NormalGamma),
    Categorical(SymmetricDirichlet),
}

#[enum_dispatch]
#[derive(Clone, Debug, PartialEq)]
pub enum ColModel {
    Continuous(Column<f64, Gaussian, NormalGamma>),
    Categorical(Column<u32, Categorical, SymmetricDirichlet>),
}

impl ColModel {
    /// Build the column at `col_ix` of `table`. The hyperparameter grids are
    /// built from the column's data and the hyperparameters are drawn
    /// uniformly from them.
    pub fn from_table<R: Rng>(
        col_ix: usize,
        coltype: &ColType,
        table: &Table,
        rng: &mut R,
    ) -> Self {
        let n_rows = table.n_rows();
        match table.feature_data(col_ix, coltype.is_categorical()) {
            FeatureData::Continuous(data) => {
                let xs: Vec<f64> = data.present_cloned();
                let grid = NgGrid::new(&xs, n_rows);
                let prior = grid.draw(rng);
                ColModel::Continuous(Column::new(col_ix, data, prior, grid))
            }
            FeatureData::Categorical(data) => {
                let k = coltype.k().unwrap_or(1);
                let grid = CsdGrid::new(k, n_rows);
                let prior = grid.draw(rng);
                ColModel::Categorical(Column::new(col_ix, data, prior, grid))
            }
        }
    }

    /// Build the column at `col_ix` of `table` with known hyperparameters.
    /// Returns `None` if `hypers` are for the other kind of column.
    pub fn from_table_with_hypers(
        col_ix: usize,
        coltype: &ColType,
        table: &Table,
        hypers: Hypers,
    ) -> Option<Self> {
        let n_rows = table.n_rows();
        match (table.feature_data(col_ix, coltype.is_categorical()), hypers) {
            (FeatureData::Continuous(data), Hypers::Continuous(prior)) => {
                let grid = NgGrid::new(&data.present_cloned(), n_rows);
                let col = Column::new(col_ix, data, prior, grid);
                Some(ColModel::Continuous(col))
            }
            (FeatureData::Categorical(data), Hypers::Categorical(prior)) => {
                let grid = CsdGrid::new(prior.k(), n_rows);
                let col = Column::new(col_ix, data, prior, grid);
                Some(ColModel::Categorical(col))
            }
            _ => None,
        }
    }

    /// The current hyperparameters
    pub fn hypers(&self) -> Hypers {
        match self {
            ColModel::Continuous(col) => Hypers::Continuous(col.prior.clone()),
            ColModel::Categorical(col) => {
                Hypers::Categorical(col.prior.clone())
            }
        }
    }

    /// Build every column of `table` with the types in `codebook`
    pub fn features_from_table<R: Rng>(
        codebook: &Codebook,
        table: &Table,
        rng: &mut R,
    ) -> Vec<ColModel> {
        codebook
            .col_metadata
            .iter()
            .enumerate()
            .map(|(col_ix, md)| {
                Self::from_table(col_ix, &md.coltype, table, rng)
            })
            .collect()
    }

    /// The standard deviation of the present data. `None` for categorical
    /// and empty columns.
    pub fn std(&self) -> Option<f64> {
        match self {
            ColModel::Continuous(col) => {
                let xs = col.data.present_cloned();
                if xs.is_empty() {
                    None
                } else {
                    Some(crosscat_utils::var(&xs).sqrt())
                }
            }
            ColModel::Categorical(_) => None,
        }
    }
}

impl<X, Fx, Pr> Column<X, Fx, Pr>
where
    X: CcDatum,
    Fx: CcLikelihood<X>,
    Fx::Stat: CcStat,
    Pr: CcPrior<X, Fx>,
{
    pub fn new(
        id: usize,
        data: DataContainer<X>,
        prior: Pr,
        grid: Pr::Grid,
    ) -> Self {
        Column {
            id,
            data,
            prior,
            grid,
            stats: Vec::new(),
            _phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The statistic of component `k`, or an empty one for `k == self.k()`
    fn stat_or_empty(&self, k: usize) -> Cow<'_, Fx::Stat> {
        if k == self.stats.len() {
            Cow::Owned(self.prior.empty_suffstat())
        } else {
            Cow::Borrowed(&self.stats[k])
        }
    }

    /// The statistic of component `k` with `constraints` observed
    fn constrained_stat(
        &self,
        k: usize,
        constraints: &[Datum],
    ) -> Cow<'_, Fx::Stat> {
        let mut stat = self.stat_or_empty(k);
        if constraints.iter().any(|x| !x.is_missing()) {
            let stat = stat.to_mut();
            constraints
                .iter()
                .filter(|x| !x.is_missing())
                .for_each(|&x| stat.observe(&X::from_datum(x)));
        }
        stat
    }

    fn stats_for(&self, asgn: &Assignment) -> Vec<Fx::Stat> {
        let mut stats: Vec<Fx::Stat> =
            (0..asgn.n_cats).map(|_| self.prior.empty_suffstat()).collect();

        self.data.present_iter().for_each(|(row_ix, x)| {
            let z = asgn.asgn[row_ix];
            if z != UNASSIGNED {
                stats[z].observe(x);
            }
        });

        stats
    }
}

impl<X, Fx, Pr> Feature for Column<X, Fx, Pr>
where
    X: CcDatum,
    Fx: CcLikelihood<X>,
    Fx::Stat: CcStat,
    Pr: CcPrior<X, Fx>,
{
    #[inline]
    fn id(&self) -> usize {
        self.id
    }

    #[inline]
    fn set_id(&mut self, id: usize) {
        self.id = id
    }

    #[inline]
    fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn k(&self) -> usize {
        self.stats.len()
    }

    fn ftype(&self) -> FType {
        match X::default().into_datum() {
            Datum::Categorical(_) => FType::Categorical,
            _ => FType::Continuous,
        }
    }

    fn reassign(&mut self, asgn: &Assignment) {
        self.stats = self.stats_for(asgn);
    }

    fn score(&self) -> f64 {
        self.stats.iter().map(|stat| self.prior.ln_m_stat(stat)).sum()
    }

    fn asgn_score(&self, asgn: &Assignment) -> f64 {
        self.stats_for(asgn)
            .iter()
            .map(|stat| self.prior.ln_m_stat(stat))
            .sum()
    }

    fn update_hypers(
        &mut self,
        rng: &mut impl Rng,
    ) -> Result<f64, NumericalError> {
        let score = self.prior.update_from_grid(&self.grid, &self.stats, rng)?;
        if score.is_finite() {
            Ok(score)
        } else {
            Err(NumericalError::NonFiniteScore {
                col_ix: self.id,
                score,
            })
        }
    }

    #[inline]
    fn append_empty_component(&mut self) {
        self.stats.push(self.prior.empty_suffstat());
    }

    #[inline]
    fn drop_component(&mut self, k: usize) {
        let _stat = self.stats.remove(k);
    }

    fn predictive_score_at(&self, row_ix: usize, k: usize) -> f64 {
        match self.data.get(row_ix) {
            Some(x) => self.prior.ln_pp_stat(&x, &self.stats[k]),
            None => 0.0,
        }
    }

    fn singleton_score(&self, row_ix: usize) -> f64 {
        match self.data.get(row_ix) {
            Some(x) => {
                self.prior.ln_pp_stat(&x, &self.prior.empty_suffstat())
            }
            None => 0.0,
        }
    }

    #[inline]
    fn logm(&self, k: usize) -> f64 {
        self.prior.ln_m_stat(&self.stats[k])
    }

    fn observe_datum(&mut self, row_ix: usize, k: usize) {
        if let Some(x) = self.data.get(row_ix) {
            self.stats[k].observe(&x);
        }
    }

    fn forget_datum(&mut self, row_ix: usize, k: usize) {
        if let Some(x) = self.data.get(row_ix) {
            self.stats[k].forget(&x);
        }
    }

    #[inline]
    fn is_missing(&self, ix: usize) -> bool {
        !self.data.is_present(ix)
    }

    fn datum(&self, ix: usize) -> Datum {
        self.data
            .get(ix)
            .map_or(Datum::Missing, CcDatum::into_datum)
    }

    fn clone_data(&self) -> FeatureData {
        X::into_feature_data(self.data.clone())
    }

    fn cpnt_ln_pp(&self, k: usize, x: &Datum, constraints: &[Datum]) -> f64 {
        if x.is_missing() {
            return 0.0;
        }
        let stat = self.constrained_stat(k, constraints);
        self.prior.ln_pp_stat(&X::from_datum(*x), &stat)
    }

    fn cpnt_ln_probability(
        &self,
        k: usize,
        x: &Datum,
        constraints: &[Datum],
    ) -> f64 {
        if x.is_missing() {
            return 0.0;
        }
        let stat = self.constrained_stat(k, constraints);
        self.prior.ln_pp_probability(&X::from_datum(*x), &stat)
    }

    fn cpnt_ln_density(
        &self,
        k: usize,
        x: &Datum,
        constraints: &[Datum],
    ) -> f64 {
        if x.is_missing() {
            return 0.0;
        }
        let stat = self.constrained_stat(k, constraints);
        self.prior.ln_pp_density(&X::from_datum(*x), &stat)
    }

    fn draw(
        &self,
        k: usize,
        constraints: &[Datum],
        rng: &mut impl Rng,
    ) -> Datum {
        let stat = self.constrained_stat(k, constraints);
        self.prior.draw_pp(&stat, rng).into_datum()
    }
}
