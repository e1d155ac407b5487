use thiserror::Error;

/// A transition produced a weight vector that cannot be sampled from
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NumericalError {
    /// A log weight was NaN or +inf
    #[error("non-finite log weight {logp} at index {ix} in the {kernel} kernel")]
    NonFiniteWeight {
        kernel: &'static str,
        ix: usize,
        logp: f64,
    },
    /// Every option had zero probability
    #[error("every log weight in the {kernel} kernel is -inf")]
    AllWeightsZero { kernel: &'static str },
    /// The marginal likelihood of a column is not finite
    #[error("column {col_ix} has a non-finite marginal likelihood ({score})")]
    NonFiniteScore { col_ix: usize, score: f64 },
    #[error("cannot sample from an empty weight vector in the {kernel} kernel")]
    EmptyWeights { kernel: &'static str },
}

/// Errors from building a `State` or `View`
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BuildStateError {
    #[error("a state must have at least one column")]
    NoColumns,
    #[error("column {col_ix} has {n_rows} rows but the first has {expected}")]
    ColumnLengthMismatch {
        col_ix: usize,
        n_rows: usize,
        expected: usize,
    },
    #[error("column ids must be 0..{n_cols} in order, found {id} at {col_ix}")]
    BadColumnId {
        col_ix: usize,
        id: usize,
        n_cols: usize,
    },
    #[error("invalid partition: {0}")]
    Partition(#[from] crosscat_stats::prior_process::BuildPriorProcessError),
}
