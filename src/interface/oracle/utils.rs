//! Per-state pieces of the predictive queries
//!
//! A query row is either observed (`row_ix < n_rows`), in which case it sits
//! in its assigned cluster of every view, or it is a new row whose cluster in
//! each view is unknown. For a new row the cluster weights are the CRP
//! conditional weights of the view, reweighted by how well each cluster
//! explains the `Given` values that fall in the view.
use std::collections::BTreeMap;

use rand::Rng;

use crate::cc::feature::Feature;
use crate::cc::state::State;
use crate::cc::view::View;
use crate::data::Datum;
use crate::stats::rv::misc::ln_pflip;
use crate::utils::{log_normalize, logsumexp};
use crate::Given;

/// How a target value is scored under a cluster
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogpKind {
    /// Probability mass. A continuous value gets the mass of a small window
    /// around it.
    Probability,
    /// Density of a continuous value or mass of a categorical one
    Density,
}

/// Normalized log weights over the clusters of `view`, with a new cluster
/// last, for the row at `row_ix`
pub fn single_view_weights(view: &View, row_ix: usize, given: &Given) -> Vec<f64> {
    let n_cats = view.n_cats();

    if row_ix < view.n_rows() {
        let z = view.asgn().asgn[row_ix];
        return (0..=n_cats)
            .map(|k| if k == z { 0.0 } else { f64::NEG_INFINITY })
            .collect();
    }

    let mut weights: Vec<f64> = view.weights().iter().map(|w| w.ln()).collect();

    if let Given::Conditions(conditions) = given {
        let mut conditioned = false;
        conditions
            .iter()
            .filter_map(|(col_ix, x)| view.ftrs.get(col_ix).map(|ftr| (ftr, x)))
            .for_each(|(ftr, x)| {
                conditioned = true;
                weights
                    .iter_mut()
                    .enumerate()
                    .for_each(|(k, w)| *w += ftr.cpnt_ln_pp(k, x, &[]));
            });

        if conditioned {
            log_normalize(&mut weights);
        }
    }

    weights
}

/// Cluster weights for every view holding one of `col_ixs`, keyed by view
/// index
pub fn single_state_weights(
    state: &State,
    col_ixs: &[usize],
    row_ix: usize,
    given: &Given,
) -> BTreeMap<usize, Vec<f64>> {
    let mut view_weights: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    col_ixs
        .iter()
        .map(|&col_ix| state.asgn().asgn[col_ix])
        .for_each(|view_ix| {
            view_weights.entry(view_ix).or_insert_with(|| {
                single_view_weights(&state.views[view_ix], row_ix, given)
            });
        });
    view_weights
}

/// Draw one cluster index per view from the log weights of
/// `single_state_weights`
pub fn draw_clusters<R: Rng>(
    view_weights: &BTreeMap<usize, Vec<f64>>,
    rng: &mut R,
) -> BTreeMap<usize, usize> {
    view_weights
        .iter()
        .map(|(&view_ix, weights)| (view_ix, ln_pflip(weights, 1, false, rng)[0]))
        .collect()
}

/// Draw `n` joint samples of `col_ixs` at `row_ix` from one state
///
/// Within a draw every column of the same view comes from the same cluster.
pub fn state_sample<R: Rng>(
    state: &State,
    row_ix: usize,
    col_ixs: &[usize],
    given: &Given,
    n: usize,
    rng: &mut R,
) -> Vec<Vec<Datum>> {
    let view_weights = single_state_weights(state, col_ixs, row_ix, given);
    let constraints: Vec<Vec<Datum>> =
        col_ixs.iter().map(|&col_ix| given.values_for(col_ix)).collect();

    (0..n)
        .map(|_| {
            let cpnt_ixs = draw_clusters(&view_weights, rng);
            col_ixs
                .iter()
                .zip(constraints.iter())
                .map(|(&col_ix, constraints)| {
                    let k = cpnt_ixs[&state.asgn().asgn[col_ix]];
                    state.feature(col_ix).draw(k, constraints, rng)
                })
                .collect()
        })
        .collect()
}

/// The joint log probability (or density) of `vals` in `col_ixs` at `row_ix`
/// under one state
pub fn state_logp(
    state: &State,
    row_ix: usize,
    col_ixs: &[usize],
    vals: &[Datum],
    given: &Given,
    kind: LogpKind,
) -> f64 {
    let mut view_weights = single_state_weights(state, col_ixs, row_ix, given);

    col_ixs.iter().zip(vals).for_each(|(&col_ix, x)| {
        let ftr = state.feature(col_ix);
        let constraints = given.values_for(col_ix);
        if let Some(weights) = view_weights.get_mut(&state.asgn().asgn[col_ix]) {
            weights.iter_mut().enumerate().for_each(|(k, w)| {
                *w += match kind {
                    LogpKind::Probability => {
                        ftr.cpnt_ln_probability(k, x, &constraints)
                    }
                    LogpKind::Density => ftr.cpnt_ln_density(k, x, &constraints),
                }
            });
        }
    });

    view_weights.values().map(|weights| logsumexp(weights)).sum()
}
