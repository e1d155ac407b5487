//! Checks that a snapshot is a well-formed latent state of a table
use crosscat_cc::feature::{ColModel, Hypers};
use crosscat_cc::state::State;
use crosscat_cc::view;
use crosscat_codebook::{Codebook, CodebookError, ColType};
use crosscat_data::Table;
use crosscat_stats::assignment::{Assignment, AssignmentError};
use crosscat_stats::rv::data::{CategoricalSuffStat, GaussianSuffStat};
use crosscat_stats::rv::dist::{NormalGamma, SymmetricDirichlet};
use crosscat_stats::rv::traits::SuffStat;
use crosscat_stats::hyper_grid::crp_alpha_grid;
use crosscat_stats::prior_process::{BuildPriorProcessError, Crp, PriorProcess};
use thiserror::Error;

use crate::snapshot::{LatentState, Suffstats};

const SUFFSTAT_TOL: f64 = 1E-8;

#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("the table does not fit the codebook: {0}")]
    Codebook(#[from] CodebookError),
    #[error("the snapshot has {n_snapshot} columns but the table has {n_table}")]
    ColumnCountMismatch { n_snapshot: usize, n_table: usize },
    #[error("view {view_ix} assigns {n_snapshot} rows but the table has {n_table}")]
    RowCountMismatch {
        view_ix: usize,
        n_snapshot: usize,
        n_table: usize,
    },
    #[error("X_L has {n_views} views but X_D has {n_xd} assignment vectors")]
    ViewCountMismatch { n_views: usize, n_xd: usize },
    #[error("invalid column partition: {0}")]
    ColumnPartition(AssignmentError),
    #[error("invalid row partition in view {view_ix}: {err}")]
    RowPartition {
        view_ix: usize,
        err: AssignmentError,
    },
    #[error("stored counts {stored:?} do not match the assignment counts {actual:?}")]
    CountsMismatch {
        stored: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("view {view_ix} lists columns {listed:?} but holds {assigned:?}")]
    ViewColumnsMismatch {
        view_ix: usize,
        listed: Vec<usize>,
        assigned: Vec<usize>,
    },
    #[error("column {col_ix} hyperparameters do not fit its column type")]
    HypersMismatch { col_ix: usize },
    #[error("column {col_ix} hyperparameters are invalid: {msg}")]
    InvalidHypers { col_ix: usize, msg: String },
    #[error("CRP concentration {alpha} is not positive and finite")]
    InvalidAlpha { alpha: f64 },
    #[error(
        "sufficient statistics of column {col_ix} in cluster {k} of view \
        {view_ix} do not match the data"
    )]
    SuffstatsMismatch {
        view_ix: usize,
        col_ix: usize,
        k: usize,
    },
    #[error("failed to rebuild a partition: {0}")]
    Partition(#[from] BuildPriorProcessError),
}

fn check_alpha(alpha: f64) -> Result<(), ConformanceError> {
    if alpha.is_finite() && alpha > 0.0 {
        Ok(())
    } else {
        Err(ConformanceError::InvalidAlpha { alpha })
    }
}

fn check_counts(
    stored: &[usize],
    asgn: &Assignment,
) -> Result<(), ConformanceError> {
    if stored == asgn.counts.as_slice() {
        Ok(())
    } else {
        Err(ConformanceError::CountsMismatch {
            stored: stored.to_vec(),
            actual: asgn.counts.clone(),
        })
    }
}

// Deserialized priors skip their constructors, so re-check the values
fn check_hypers(
    col_ix: usize,
    coltype: &ColType,
    hypers: &Hypers,
) -> Result<(), ConformanceError> {
    let invalid = |msg: String| ConformanceError::InvalidHypers { col_ix, msg };
    match (coltype, hypers) {
        (ColType::Continuous, Hypers::Continuous(ng)) => {
            let (m, r, s, v) = ng.params();
            NormalGamma::new(m, r, s, v)
                .map(|_| ())
                .map_err(|err| invalid(err.to_string()))
        }
        (ColType::Categorical { k, .. }, Hypers::Categorical(csd))
            if csd.k() == *k =>
        {
            SymmetricDirichlet::new(csd.alpha(), csd.k())
                .map(|_| ())
                .map_err(|err| invalid(err.to_string()))
        }
        _ => Err(ConformanceError::HypersMismatch { col_ix }),
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= SUFFSTAT_TOL * a.abs().max(b.abs()).max(1.0)
}

// Recompute the statistics of one column under a row assignment
fn data_suffstats(
    table: &Table,
    col_ix: usize,
    coltype: &ColType,
    asgn: &Assignment,
) -> Vec<Suffstats> {
    let rows = (0..table.n_rows())
        .filter_map(|row_ix| table.get(row_ix, col_ix).map(|x| (row_ix, x)));

    match coltype {
        ColType::Continuous => {
            let mut stats = vec![GaussianSuffStat::new(); asgn.n_cats];
            rows.for_each(|(row_ix, x)| stats[asgn.asgn[row_ix]].observe(&x));
            stats.into_iter().map(Suffstats::Continuous).collect()
        }
        ColType::Categorical { k, .. } => {
            let mut stats = vec![CategoricalSuffStat::new(*k); asgn.n_cats];
            rows.for_each(|(row_ix, x)| {
                stats[asgn.asgn[row_ix]].observe(&(x as u32))
            });
            stats.into_iter().map(Suffstats::Categorical).collect()
        }
    }
}

fn suffstats_match(stored: &Suffstats, actual: &Suffstats) -> bool {
    match (stored, actual) {
        (Suffstats::Continuous(a), Suffstats::Continuous(b)) => {
            a.n() == b.n()
                && close(a.sum_x(), b.sum_x())
                && close(a.sum_x_sq(), b.sum_x_sq())
        }
        (Suffstats::Categorical(a), Suffstats::Categorical(b)) => a == b,
        _ => false,
    }
}

/// Check that `latent` is a well-formed latent state of `table` under
/// `codebook`
///
/// The partitions must be valid with stored counts matching the assignments,
/// the views must hold exactly the columns assigned to them, every
/// hyperparameter set must fit its column type, and every stored sufficient
/// statistic must equal the statistic computed from the table.
pub fn validate_snapshot(
    codebook: &Codebook,
    table: &Table,
    latent: &LatentState,
) -> Result<(), ConformanceError> {
    codebook.validate_table(table)?;

    let n_cols = table.n_cols();
    let n_rows = table.n_rows();
    let x_l = &latent.x_l;

    if latent.n_cols() != n_cols || x_l.column_hypers.len() != n_cols {
        return Err(ConformanceError::ColumnCountMismatch {
            n_snapshot: latent.n_cols(),
            n_table: n_cols,
        });
    }

    let col_asgn =
        Assignment::from_vec(x_l.column_partition.assignments.clone())
            .map_err(ConformanceError::ColumnPartition)?;
    check_counts(&x_l.column_partition.counts, &col_asgn)?;
    check_alpha(x_l.column_partition.alpha)?;

    for (col_ix, (md, hypers)) in codebook
        .col_metadata
        .iter()
        .zip(x_l.column_hypers.iter())
        .enumerate()
    {
        check_hypers(col_ix, &md.coltype, hypers)?;
    }

    if x_l.view_states.len() != col_asgn.n_cats
        || latent.x_d.0.len() != col_asgn.n_cats
    {
        return Err(ConformanceError::ViewCountMismatch {
            n_views: x_l.view_states.len().max(col_asgn.n_cats),
            n_xd: latent.x_d.0.len(),
        });
    }

    for (view_ix, (view_state, row_asgn)) in x_l
        .view_states
        .iter()
        .zip(latent.x_d.0.iter())
        .enumerate()
    {
        let assigned = col_asgn.members(view_ix);
        if view_state.column_ixs != assigned
            || view_state.column_component_suffstats.len() != assigned.len()
        {
            return Err(ConformanceError::ViewColumnsMismatch {
                view_ix,
                listed: view_state.column_ixs.clone(),
                assigned,
            });
        }

        if row_asgn.len() != n_rows {
            return Err(ConformanceError::RowCountMismatch {
                view_ix,
                n_snapshot: row_asgn.len(),
                n_table: n_rows,
            });
        }

        let row_asgn = Assignment::from_vec(row_asgn.clone())
            .map_err(|err| ConformanceError::RowPartition { view_ix, err })?;
        check_counts(&view_state.row_partition_model.counts, &row_asgn)?;
        check_alpha(view_state.row_partition_model.alpha)?;

        for (&col_ix, stored) in view_state
            .column_ixs
            .iter()
            .zip(view_state.column_component_suffstats.iter())
        {
            let coltype = &codebook.col_metadata[col_ix].coltype;
            let actual = data_suffstats(table, col_ix, coltype, &row_asgn);
            if stored.len() != actual.len() {
                return Err(ConformanceError::SuffstatsMismatch {
                    view_ix,
                    col_ix,
                    k: stored.len().min(actual.len()),
                });
            }

            if let Some(k) = stored
                .iter()
                .zip(actual.iter())
                .position(|(s, a)| !suffstats_match(s, a))
            {
                return Err(ConformanceError::SuffstatsMismatch {
                    view_ix,
                    col_ix,
                    k,
                });
            }
        }
    }

    Ok(())
}

impl LatentState {
    /// Rebuild the `State` this snapshot describes. The snapshot is checked
    /// against the table first.
    pub fn into_state(
        self,
        codebook: &Codebook,
        table: &Table,
    ) -> Result<State, ConformanceError> {
        validate_snapshot(codebook, table, &self)?;

        let n_rows = table.n_rows();
        let view_alpha_grid = crp_alpha_grid(n_rows);
        let LatentState {
            x_l,
            x_d,
            diagnostics,
        } = self;

        let mut column_hypers: Vec<Option<Hypers>> =
            x_l.column_hypers.into_iter().map(Some).collect();

        let views = x_l
            .view_states
            .into_iter()
            .zip(x_d.0)
            .enumerate()
            .map(|(view_ix, (view_state, row_asgn))| {
                let ftrs = view_state
                    .column_ixs
                    .iter()
                    .map(|&col_ix| {
                        let coltype = &codebook.col_metadata[col_ix].coltype;
                        column_hypers[col_ix]
                            .take()
                            .and_then(|hypers| {
                                ColModel::from_table_with_hypers(
                                    col_ix, coltype, table, hypers,
                                )
                            })
                            .ok_or(ConformanceError::HypersMismatch { col_ix })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let prior_process = PriorProcess {
                    process: Crp::new(view_state.row_partition_model.alpha),
                    asgn: Assignment::from_vec(row_asgn).map_err(|err| {
                        ConformanceError::RowPartition { view_ix, err }
                    })?,
                };

                view::Builder::from_prior_process(prior_process)
                    .alpha_grid(view_alpha_grid.clone())
                    .features(ftrs)
                    .build()
                    .map_err(ConformanceError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let prior_process = PriorProcess {
            process: Crp::new(x_l.column_partition.alpha),
            asgn: Assignment::from_vec(x_l.column_partition.assignments)
                .map_err(ConformanceError::ColumnPartition)?,
        };

        let mut state = State::new(
            views,
            prior_process,
            crp_alpha_grid(table.n_cols()),
            view_alpha_grid,
        );
        state.diagnostics = diagnostics;
        Ok(state)
    }
}
