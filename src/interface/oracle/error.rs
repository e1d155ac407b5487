//! Errors that can occur in Oracle functions
use crate::cc::feature::FType;
use thiserror::Error;

/// Describes errors that can occur from bad inputs to Oracle functions that
/// take indices are arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The provided row index is out of bounds
    #[error("Asked for row index {row_ix} but there are {n_rows} rows")]
    RowIndexOutOfBounds { n_rows: usize, row_ix: usize },
    /// The provided column index is out of bounds
    #[error("Asked for column index {col_ix} but there are {n_cols} columns")]
    ColumnIndexOutOfBounds { n_cols: usize, col_ix: usize },
    /// The provided state index is out of bounds
    #[error("Asked for state index {state_ix} but there are {n_states} states")]
    StateIndexOutOfBounds { n_states: usize, state_ix: usize },
    /// An empty list of state indices
    #[error("If state indices are given, there must be at least one")]
    NoStateIndices,
}

/// Describes errors arising from a bad `Given` in the context of an Oracle
/// query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GivenError {
    /// The `Datum` for the column at `col_ix` is the wrong type, for example it
    /// was categorical when the column is continuous.
    #[error(
        "Provided {ftype_req:?} datum for column {col_ix}, which is {ftype:?}"
    )]
    InvalidDatumForColumn {
        /// The column index of the offending condition
        col_ix: usize,
        /// The FType of the Datum requested
        ftype_req: FType,
        /// The actual FType of the feature at col_ix
        ftype: FType,
    },
    /// The user passed a Datum::Missing as a condition value
    #[error("Tried to condition on a 'missing' value in column {col_ix}")]
    MissingDatum { col_ix: usize },
    /// A discrete condition value is not a code of its column
    #[error("Category {code} is out of range for column {col_ix} with k = {k}")]
    CategoryOutOfRange { col_ix: usize, code: u32, k: usize },
    /// A continuous condition value is NaN or infinite
    #[error("Non-finite value {value} for column {col_ix}")]
    NonFiniteValue { col_ix: usize, value: f64 },
    /// The column `col_ix` appears both in the `Given` and the target
    #[error("Column index {col_ix} appears in the target")]
    ColumnIndexAppearsInTarget { col_ix: usize },
    /// A column index in the given is out of bounds
    #[error("Index error in given: {0}")]
    IndexError(#[from] IndexError),
}

/// Errors from `simple_predictive_sample`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// No target columns
    #[error("No target columns provided")]
    NoTargets,
    /// A target or state index is out of bounds
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    /// Invalid `Given`
    #[error("Invalid given: {0}")]
    Given(#[from] GivenError),
}

/// Errors from `simple_predictive_probability` and
/// `simple_predictive_density`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbabilityError {
    /// No target columns
    #[error("No target columns provided")]
    NoTargets,
    /// There is a different number of target columns and values
    #[error(
        "There are {ntargets} targets but {nvals} values were provided"
    )]
    TargetsIndicesAndValuesMismatch { ntargets: usize, nvals: usize },
    /// A target value is the wrong kind for its column
    #[error(
        "Provided {ftype_req:?} datum for column {col_ix}, which is {ftype:?}"
    )]
    InvalidDatumForColumn {
        col_ix: usize,
        ftype_req: FType,
        ftype: FType,
    },
    /// The probability of a missing value was requested
    #[error("Requested the probability of a missing value in column {col_ix}")]
    RequestedProbabilityOfMissing { col_ix: usize },
    /// A discrete target value is not a code of its column
    #[error("Category {code} is out of range for column {col_ix} with k = {k}")]
    CategoryOutOfRange { col_ix: usize, code: u32, k: usize },
    /// A continuous target value is NaN or infinite
    #[error("Non-finite value {value} for column {col_ix}")]
    NonFiniteValue { col_ix: usize, value: f64 },
    /// A target or state index is out of bounds
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    /// Invalid `Given`
    #[error("Invalid given: {0}")]
    Given(#[from] GivenError),
}

/// Errors from `impute`, `impute_and_confidence`, and
/// `confidence_interval`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImputeError {
    /// Asked for zero predictive samples
    #[error("Must request more than zero samples")]
    NIsZero,
    /// A confidence interval was requested for a discrete column
    #[error("Column {col_ix} is not continuous")]
    NotContinuous { col_ix: usize },
    /// The interval mass is not in (0, 1)
    #[error("Interval mass must be in (0, 1), got {0}")]
    InvalidIntervalMass(f64),
    /// A row, column, or state index is out of bounds
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    /// Invalid `Given`
    #[error("Invalid given: {0}")]
    Given(#[from] GivenError),
}
