use thiserror::Error;

/// Errors that can arise when reading or checking a codebook
#[derive(Debug, Error)]
pub enum CodebookError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse codebook: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The codebook and the table disagree on the number of columns
    #[error("codebook has {n_codebook} columns but the table has {n_table}")]
    ColumnCountMismatch { n_codebook: usize, n_table: usize },
    /// The codebook names rows but not as many as the table has
    #[error("codebook names {n_codebook} rows but the table has {n_table}")]
    RowCountMismatch { n_codebook: usize, n_table: usize },
    /// A discrete column has a cell that is not a valid code
    #[error(
        "cell ({row_ix}, {col_ix}) holds {value}, which is not a code in 0..{k}"
    )]
    InvalidCategoricalValue {
        row_ix: usize,
        col_ix: usize,
        value: f64,
        k: usize,
    },
    /// A discrete column has a cardinality of zero
    #[error("discrete column '{col_name}' has no categories")]
    EmptyCategorical { col_name: String },
    /// The value map of a discrete column does not have `k` entries
    #[error(
        "column '{col_name}' has k = {k} but its value map has {n_values} entries"
    )]
    ValueMapSizeMismatch {
        col_name: String,
        k: usize,
        n_values: usize,
    },
    /// The value-to-code and code-to-value maps are not inverses
    #[error("the value map of column '{col_name}' is not a bijection")]
    ValueMapNotBijective { col_name: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ColMetadataListError {
    #[error("duplicate column name '{0}'")]
    Duplicate(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RowNameListError {
    #[error("row name '{row_name}' appears at both {ix_1} and {ix_2}")]
    Duplicate {
        row_name: String,
        ix_1: usize,
        ix_2: usize,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("row name '{0}' already exists")]
pub struct InsertRowError(pub String);
