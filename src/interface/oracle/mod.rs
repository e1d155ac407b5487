//! Predictive queries over one or more states
pub mod error;
pub mod utils;
mod validation;

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cc::feature::FType;
use crate::cc::state::{State, StateDiagnostics};
use crate::codebook::Codebook;
use crate::consts::CONFIDENCE_STD_FRACTION;
use crate::data::{Datum, SummaryStatistics, Table};
use crate::interface::{CanOracle, Engine, HasCodebook, HasData, HasStates};
use crate::utils::{
    argmax_ties, choose_uniform, logsumexp, median, quantile,
    random_permutation, var,
};
use crate::Given;
use error::{ImputeError, IndexError, ProbabilityError, SampleError};
use utils::LogpKind;
use validation::{
    col_indices_ok, find_given_errors, find_value_conflicts, state_indices_ok,
};

/// Oracle answers questions
#[derive(Clone, Debug)]
pub struct Oracle {
    /// Vector of states
    pub states: Vec<State>,
    /// Metadata for the rows and columns
    pub codebook: Codebook,
    /// The data the states describe
    pub table: Table,
}

impl Oracle {
    pub fn new(states: Vec<State>, codebook: Codebook, table: Table) -> Self {
        Oracle {
            states,
            codebook,
            table,
        }
    }
}

impl From<Engine> for Oracle {
    fn from(engine: Engine) -> Self {
        Oracle {
            states: engine.states,
            codebook: engine.codebook,
            table: engine.table,
        }
    }
}

impl HasStates for Oracle {
    #[inline]
    fn states(&self) -> &Vec<State> {
        &self.states
    }

    #[inline]
    fn states_mut(&mut self) -> &mut Vec<State> {
        &mut self.states
    }
}

impl HasData for Oracle {
    #[inline]
    fn table(&self) -> &Table {
        &self.table
    }
}

impl HasCodebook for Oracle {
    #[inline]
    fn codebook(&self) -> &Codebook {
        &self.codebook
    }
}

impl OracleT for Oracle {}

impl OracleT for Engine {}

/// A row and the size of its cluster
///
/// Drawing `n` rows from the cluster holding `row_ix`, in the columns
/// `col_ixs`, replicates the part of the table that the cluster describes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatingSample {
    /// The first row in the cluster
    pub row_ix: usize,
    /// The columns of the view the cluster belongs to
    pub col_ixs: Vec<usize>,
    /// The number of rows in the cluster
    pub n: usize,
}

fn all_state_ixs(n_states: usize, state_ixs: Option<&[usize]>) -> Vec<usize> {
    state_ixs.map_or_else(|| (0..n_states).collect(), <[usize]>::to_vec)
}

pub trait OracleT: CanOracle {
    /// Returns the diagnostics for each state
    fn state_diagnostics(&self) -> Vec<StateDiagnostics> {
        self.states()
            .iter()
            .map(|state| state.diagnostics.clone())
            .collect()
    }

    /// Returns a tuple containing the number of rows, the number of columns,
    /// and the number of states
    fn shape(&self) -> (usize, usize, usize) {
        (self.n_rows(), self.n_cols(), self.n_states())
    }

    /// Return the FType of the column `col_ix`
    ///
    /// # Example
    ///
    /// ```
    /// # use crosscat::synthetic::gen_factorial_data;
    /// # use crosscat::cc::feature::FType;
    /// use crosscat::{EngineBuilder, Oracle, OracleT};
    ///
    /// let (table, codebook) =
    ///     gen_factorial_data(1337, 2, 4, 20, 2, 10.0, 1.0).unwrap();
    /// let engine = EngineBuilder::new(codebook, table)
    ///     .with_nstates(2)
    ///     .seed_from_u64(1337)
    ///     .build()
    ///     .unwrap();
    /// let oracle = Oracle::from(engine);
    ///
    /// assert_eq!(oracle.ftype(0).unwrap(), FType::Continuous);
    /// assert!(oracle.ftype(4).is_err());
    /// ```
    fn ftype(&self, col_ix: usize) -> Result<FType, IndexError> {
        col_indices_ok(self.n_cols(), &[col_ix])?;
        Ok(self.states()[0].ftype(col_ix))
    }

    /// The value in the table at `(row_ix, col_ix)`
    fn datum(&self, row_ix: usize, col_ix: usize) -> Result<Datum, IndexError> {
        col_indices_ok(self.n_cols(), &[col_ix])?;
        let n_rows = self.n_rows();
        if row_ix >= n_rows {
            return Err(IndexError::RowIndexOutOfBounds { n_rows, row_ix });
        }
        let categorical = self.ftype(col_ix)?.is_categorical();
        Ok(self.table().datum(row_ix, col_ix, categorical))
    }

    /// Return a summary of the data in the column
    fn summarize_col(
        &self,
        col_ix: usize,
    ) -> Result<SummaryStatistics, IndexError> {
        let categorical = self.ftype(col_ix)?.is_categorical();
        Ok(self.table().feature_data(col_ix, categorical).summarize())
    }

    /// Draw `n` joint samples of the cells `col_ixs` in row `row_ix`
    ///
    /// `row_ix` may be past the last row, in which case the samples are for
    /// a new row. The draws are split evenly over the states in `state_ixs`
    /// (all states if `None`).
    ///
    /// # Example
    ///
    /// ```
    /// # use crosscat::synthetic::gen_factorial_data;
    /// use crosscat::{EngineBuilder, Given, OracleT};
    /// use rand::SeedableRng;
    /// use rand_xoshiro::Xoshiro256Plus;
    ///
    /// let (table, codebook) =
    ///     gen_factorial_data(1337, 2, 4, 20, 2, 10.0, 1.0).unwrap();
    /// let engine = EngineBuilder::new(codebook, table)
    ///     .with_nstates(2)
    ///     .seed_from_u64(1337)
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut rng = Xoshiro256Plus::seed_from_u64(1337);
    /// let xs = engine
    ///     .simple_predictive_sample(20, &[0, 2], &Given::Nothing, 15, None, &mut rng)
    ///     .unwrap();
    ///
    /// assert_eq!(xs.len(), 15);
    /// assert!(xs.iter().all(|draw| draw.len() == 2));
    /// ```
    fn simple_predictive_sample<R: Rng>(
        &self,
        row_ix: usize,
        col_ixs: &[usize],
        given: &Given,
        n: usize,
        state_ixs: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<Vec<Vec<Datum>>, SampleError> {
        if col_ixs.is_empty() {
            return Err(SampleError::NoTargets);
        }
        col_indices_ok(self.n_cols(), col_ixs)?;
        state_indices_ok(self.n_states(), state_ixs)?;
        find_given_errors(col_ixs, &self.states()[0], given)?;

        let state_ixs = all_state_ixs(self.n_states(), state_ixs);
        Ok(self._sample_unchecked(row_ix, col_ixs, given, n, &state_ixs, rng))
    }

    /// The log probability of the values `vals` in the cells `col_ixs` of
    /// row `row_ix`
    ///
    /// A continuous value is scored by the probability of a window of width
    /// `2 * PROBABILITY_EPSILON` around it. States are averaged.
    fn simple_predictive_probability(
        &self,
        row_ix: usize,
        col_ixs: &[usize],
        vals: &[Datum],
        given: &Given,
        state_ixs: Option<&[usize]>,
    ) -> Result<f64, ProbabilityError> {
        self._validate_logp(col_ixs, vals, given, state_ixs)?;
        let state_ixs = all_state_ixs(self.n_states(), state_ixs);
        Ok(self._logp_unchecked(
            row_ix,
            col_ixs,
            vals,
            given,
            &state_ixs,
            LogpKind::Probability,
        ))
    }

    /// Like `simple_predictive_probability` but continuous values are scored
    /// by their log density
    fn simple_predictive_density(
        &self,
        row_ix: usize,
        col_ixs: &[usize],
        vals: &[Datum],
        given: &Given,
        state_ixs: Option<&[usize]>,
    ) -> Result<f64, ProbabilityError> {
        self._validate_logp(col_ixs, vals, given, state_ixs)?;
        let state_ixs = all_state_ixs(self.n_states(), state_ixs);
        Ok(self._logp_unchecked(
            row_ix,
            col_ixs,
            vals,
            given,
            &state_ixs,
            LogpKind::Density,
        ))
    }

    /// Impute the cell `(row_ix, col_ix)` from `n` predictive samples
    fn impute<R: Rng>(
        &self,
        row_ix: usize,
        col_ix: usize,
        given: &Given,
        n: usize,
        rng: &mut R,
    ) -> Result<Datum, ImputeError> {
        self.impute_and_confidence(row_ix, col_ix, given, n, rng)
            .map(|(x, _)| x)
    }

    /// Impute the cell `(row_ix, col_ix)` and report how concentrated the
    /// samples are around the imputed value
    ///
    /// A continuous cell is imputed as the sample median and its confidence
    /// is the fraction of samples within `CONFIDENCE_STD_FRACTION` column
    /// standard deviations of the median. A categorical cell is imputed as
    /// the most frequent sample, with ties broken at random, and its
    /// confidence is that value's share of the samples.
    fn impute_and_confidence<R: Rng>(
        &self,
        row_ix: usize,
        col_ix: usize,
        given: &Given,
        n: usize,
        rng: &mut R,
    ) -> Result<(Datum, f64), ImputeError> {
        self._validate_impute(col_ix, given, n)?;

        let state_ixs: Vec<usize> = (0..self.n_states()).collect();
        let samples: Vec<Datum> = self
            ._sample_unchecked(row_ix, &[col_ix], given, n, &state_ixs, rng)
            .into_iter()
            .map(|mut draw| draw.remove(0))
            .collect();

        if self.ftype(col_ix)?.is_continuous() {
            let xs: Vec<f64> =
                samples.iter().filter_map(Datum::to_f64_opt).collect();
            let x = median(&xs);
            let std = self.states()[0]
                .feature(col_ix)
                .std()
                .unwrap_or_else(|| var(&xs).sqrt());
            let tol = CONFIDENCE_STD_FRACTION * std;
            let n_close = xs.iter().filter(|&&y| (y - x).abs() <= tol).count();
            Ok((Datum::Continuous(x), n_close as f64 / xs.len() as f64))
        } else {
            let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
            samples.iter().filter_map(Datum::to_u32_opt).for_each(|x| {
                *counts.entry(x).or_insert(0) += 1;
            });
            let (codes, cts): (Vec<u32>, Vec<usize>) = counts.into_iter().unzip();
            let ix = choose_uniform(&argmax_ties(&cts), rng);
            Ok((Datum::Categorical(codes[ix]), cts[ix] as f64 / n as f64))
        }
    }

    /// The central interval holding mass `p` of the predictive samples of a
    /// continuous cell
    fn confidence_interval<R: Rng>(
        &self,
        row_ix: usize,
        col_ix: usize,
        given: &Given,
        p: f64,
        n: usize,
        rng: &mut R,
    ) -> Result<(f64, f64), ImputeError> {
        self._validate_impute(col_ix, given, n)?;
        if !(p > 0.0 && p < 1.0) {
            return Err(ImputeError::InvalidIntervalMass(p));
        }
        if !self.ftype(col_ix)?.is_continuous() {
            return Err(ImputeError::NotContinuous { col_ix });
        }

        let state_ixs: Vec<usize> = (0..self.n_states()).collect();
        let xs: Vec<f64> = self
            ._sample_unchecked(row_ix, &[col_ix], given, n, &state_ixs, rng)
            .iter()
            .filter_map(|draw| draw[0].to_f64_opt())
            .collect();

        Ok((
            quantile(&xs, (1.0 - p) / 2.0),
            quantile(&xs, (1.0 + p) / 2.0),
        ))
    }

    /// For every view of a state, one `ReplicatingSample` per cluster
    fn replicating_samples_params(
        &self,
        state_ix: usize,
    ) -> Result<Vec<Vec<ReplicatingSample>>, IndexError> {
        state_indices_ok(self.n_states(), Some(&[state_ix]))?;
        let state = &self.states()[state_ix];

        let params = state
            .views
            .iter()
            .map(|view| {
                let col_ixs: Vec<usize> = view.ftrs.keys().copied().collect();
                let asgn = view.asgn();
                asgn.counts
                    .iter()
                    .enumerate()
                    .filter_map(|(k, &n)| {
                        asgn.asgn.iter().position(|&z| z == k).map(|row_ix| {
                            ReplicatingSample {
                                row_ix,
                                col_ixs: col_ixs.clone(),
                                n,
                            }
                        })
                    })
                    .collect()
            })
            .collect();

        Ok(params)
    }

    fn _validate_logp(
        &self,
        col_ixs: &[usize],
        vals: &[Datum],
        given: &Given,
        state_ixs: Option<&[usize]>,
    ) -> Result<(), ProbabilityError> {
        if col_ixs.is_empty() {
            return Err(ProbabilityError::NoTargets);
        }
        col_indices_ok(self.n_cols(), col_ixs)?;
        state_indices_ok(self.n_states(), state_ixs)?;

        let state = &self.states()[0];
        find_value_conflicts(col_ixs, vals, state)?;
        find_given_errors(col_ixs, state, given)?;
        Ok(())
    }

    fn _validate_impute(
        &self,
        col_ix: usize,
        given: &Given,
        n: usize,
    ) -> Result<(), ImputeError> {
        if n == 0 {
            return Err(ImputeError::NIsZero);
        }
        col_indices_ok(self.n_cols(), &[col_ix])?;
        find_given_errors(&[col_ix], &self.states()[0], given)?;
        Ok(())
    }

    /// Split `n` draws over the states. Each state gets `n / n_states`; the
    /// remainder goes to randomly chosen states.
    fn _sample_unchecked<R: Rng>(
        &self,
        row_ix: usize,
        col_ixs: &[usize],
        given: &Given,
        n: usize,
        state_ixs: &[usize],
        rng: &mut R,
    ) -> Vec<Vec<Datum>> {
        let n_chains = state_ixs.len();
        let mut counts = vec![n / n_chains; n_chains];
        random_permutation(n_chains, rng)
            .into_iter()
            .take(n % n_chains)
            .for_each(|ix| counts[ix] += 1);

        let mut samples = Vec::with_capacity(n);
        for (&state_ix, n_state) in state_ixs.iter().zip(counts) {
            let state = &self.states()[state_ix];
            samples.extend(utils::state_sample(
                state, row_ix, col_ixs, given, n_state, rng,
            ));
        }
        samples
    }

    /// The log of the mean probability over the states
    fn _logp_unchecked(
        &self,
        row_ix: usize,
        col_ixs: &[usize],
        vals: &[Datum],
        given: &Given,
        state_ixs: &[usize],
        kind: LogpKind,
    ) -> f64 {
        let logps: Vec<f64> = state_ixs
            .iter()
            .map(|&state_ix| {
                utils::state_logp(
                    &self.states()[state_ix],
                    row_ix,
                    col_ixs,
                    vals,
                    given,
                    kind,
                )
            })
            .collect();
        logsumexp(&logps) - (state_ixs.len() as f64).ln()
    }
}
