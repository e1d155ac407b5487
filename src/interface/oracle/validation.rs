use std::collections::HashSet;

use crate::cc::feature::{ColModel, FType};
use crate::cc::state::State;
use crate::data::Datum;
use crate::error::{GivenError, IndexError, ProbabilityError};
use crate::Given;

// The cardinality of a discrete column
fn n_categories(state: &State, col_ix: usize) -> Option<usize> {
    match state.feature(col_ix) {
        ColModel::Categorical(col) => Some(col.prior.k()),
        ColModel::Continuous(_) => None,
    }
}

// Why a datum cannot be scored or conditioned on in a column
enum DatumProblem {
    WrongType { ftype_req: FType, ftype: FType },
    Missing,
    OutOfRange { code: u32, k: usize },
    NonFinite(f64),
}

fn check_datum(
    state: &State,
    col_ix: usize,
    datum: &Datum,
) -> Result<(), DatumProblem> {
    let ftype = state.ftype(col_ix);
    match datum {
        Datum::Missing => Err(DatumProblem::Missing),
        _ if !ftype.datum_compatible(datum) => Err(DatumProblem::WrongType {
            ftype_req: ftype_of(datum),
            ftype,
        }),
        Datum::Continuous(x) if !x.is_finite() => {
            Err(DatumProblem::NonFinite(*x))
        }
        Datum::Categorical(code) => match n_categories(state, col_ix) {
            Some(k) if (*code as usize) >= k => {
                Err(DatumProblem::OutOfRange { code: *code, k })
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

fn ftype_of(datum: &Datum) -> FType {
    if datum.is_categorical() {
        FType::Categorical
    } else {
        FType::Continuous
    }
}

/// Every column index must be in bounds
pub fn col_indices_ok(
    n_cols: usize,
    col_ixs: &[usize],
) -> Result<(), IndexError> {
    col_ixs.iter().try_for_each(|&col_ix| {
        if col_ix < n_cols {
            Ok(())
        } else {
            Err(IndexError::ColumnIndexOutOfBounds { n_cols, col_ix })
        }
    })
}

/// `None` or a non-empty list of in-bounds state indices
pub fn state_indices_ok(
    n_states: usize,
    state_ixs: Option<&[usize]>,
) -> Result<(), IndexError> {
    match state_ixs {
        None => Ok(()),
        Some([]) => Err(IndexError::NoStateIndices),
        Some(ixs) => ixs.iter().try_for_each(|&state_ix| {
            if state_ix < n_states {
                Ok(())
            } else {
                Err(IndexError::StateIndexOutOfBounds { n_states, state_ix })
            }
        }),
    }
}

// Given a set of target indices on which to condition, determine whether
// any of the target columns are conditioned upon.
//
// A column should not be both a target and a condition.
fn given_target_conflict(targets: &[usize], given: &Given) -> Option<usize> {
    match given {
        Given::Conditions(conditions) => {
            let ixs: HashSet<usize> =
                conditions.iter().map(|(ix, _)| *ix).collect();
            targets.iter().find(|ix| ixs.contains(ix)).copied()
        }
        Given::Nothing => None,
    }
}

/// Finds errors in a query `Given`
pub fn find_given_errors(
    targets: &[usize],
    state: &State,
    given: &Given,
) -> Result<(), GivenError> {
    let conditions = match given {
        Given::Conditions(conditions) => conditions,
        Given::Nothing => return Ok(()),
    };

    let n_cols = state.n_cols();
    conditions.iter().try_for_each(|(col_ix, _)| {
        col_indices_ok(n_cols, &[*col_ix]).map_err(GivenError::IndexError)
    })?;

    if let Some(col_ix) = given_target_conflict(targets, given) {
        return Err(GivenError::ColumnIndexAppearsInTarget { col_ix });
    }

    conditions.iter().try_for_each(|(col_ix, datum)| {
        let col_ix = *col_ix;
        check_datum(state, col_ix, datum).map_err(|problem| match problem {
            DatumProblem::WrongType { ftype_req, ftype } => {
                GivenError::InvalidDatumForColumn {
                    col_ix,
                    ftype_req,
                    ftype,
                }
            }
            DatumProblem::Missing => GivenError::MissingDatum { col_ix },
            DatumProblem::OutOfRange { code, k } => {
                GivenError::CategoryOutOfRange { col_ix, code, k }
            }
            DatumProblem::NonFinite(value) => {
                GivenError::NonFiniteValue { col_ix, value }
            }
        })
    })
}

/// Determine whether the values are ill-sized or if there are any
/// incompatible `Datum`s
pub fn find_value_conflicts(
    targets: &[usize],
    vals: &[Datum],
    state: &State,
) -> Result<(), ProbabilityError> {
    if targets.len() != vals.len() {
        return Err(ProbabilityError::TargetsIndicesAndValuesMismatch {
            ntargets: targets.len(),
            nvals: vals.len(),
        });
    }

    targets
        .iter()
        .zip(vals.iter())
        .try_for_each(|(&col_ix, datum)| {
            // indices have been validated first
            check_datum(state, col_ix, datum).map_err(|problem| match problem {
                DatumProblem::WrongType { ftype_req, ftype } => {
                    ProbabilityError::InvalidDatumForColumn {
                        col_ix,
                        ftype_req,
                        ftype,
                    }
                }
                DatumProblem::Missing => {
                    ProbabilityError::RequestedProbabilityOfMissing { col_ix }
                }
                DatumProblem::OutOfRange { code, k } => {
                    ProbabilityError::CategoryOutOfRange { col_ix, code, k }
                }
                DatumProblem::NonFinite(value) => {
                    ProbabilityError::NonFiniteValue { col_ix, value }
                }
            })
        })
}
