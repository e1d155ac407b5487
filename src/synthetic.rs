//! Synthetic tables with known structure
//!
//! `gen_factorial_data` builds a table out of independent column groups.
//! Within a group the rows are split into clusters and each (cluster, column)
//! pair draws Gaussian data from a mean and standard deviation picked from a
//! small grid. Each group permutes its rows separately, so the groups have
//! unrelated row partitions.
use std::collections::BTreeSet;

use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256Plus;
use thiserror::Error;

use crate::codebook::{Codebook, ColType, ValueMap};
use crate::data::{Table, TableError};
use crate::utils::{choose_uniform, linspace, log_linspace, random_permutation};

/// Number of values in the mean and standard deviation grids
const GEN_GRID_SIZE: usize = 11;

/// The smallest standard deviation in the grid
const MIN_STD: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum SyntheticDataError {
    #[error("at least one cluster, column, row, and split are required")]
    EmptyDimension,
    #[error("{n_cols} columns cannot be split evenly into {n_splits} groups")]
    UnevenSplit { n_cols: usize, n_splits: usize },
    #[error("{n_rows} rows cannot fill {n_clusters} clusters")]
    TooFewRows { n_rows: usize, n_clusters: usize },
    #[error("max_std must be finite and at least 0.1, got {0}")]
    InvalidMaxStd(f64),
    #[error("max_mean must be finite and non-negative, got {0}")]
    InvalidMaxMean(f64),
    #[error("column {col_ix} is out of bounds for {n_cols} columns")]
    ColumnIndexOutOfBounds { col_ix: usize, n_cols: usize },
    #[error("column {0} is already categorical")]
    AlreadyCategorical(usize),
    #[error("column {0} has no present values")]
    EmptyColumn(usize),
    #[error("table error: {0}")]
    Table(#[from] TableError),
}

/// Clustered Gaussian columns
///
/// Returns the columns (column-major) and the cluster of every row. Rows are
/// split into `n_clusters` contiguous blocks whose sizes differ by at most
/// one.
pub fn gen_data<R: Rng>(
    n_clusters: usize,
    n_cols: usize,
    n_rows: usize,
    max_mean: f64,
    max_std: f64,
    rng: &mut R,
) -> Result<(Vec<Vec<f64>>, Vec<usize>), SyntheticDataError> {
    if n_clusters == 0 || n_cols == 0 || n_rows == 0 {
        return Err(SyntheticDataError::EmptyDimension);
    }
    if n_rows < n_clusters {
        return Err(SyntheticDataError::TooFewRows { n_rows, n_clusters });
    }
    if !(max_mean.is_finite() && max_mean >= 0.0) {
        return Err(SyntheticDataError::InvalidMaxMean(max_mean));
    }
    if !(max_std.is_finite() && max_std >= MIN_STD) {
        return Err(SyntheticDataError::InvalidMaxStd(max_std));
    }

    let mu_grid = linspace(-max_mean, max_mean, GEN_GRID_SIZE);
    let sigma_grid = log_linspace(MIN_STD, max_std, GEN_GRID_SIZE);

    let zs: Vec<usize> = (0..n_rows).map(|ix| ix * n_clusters / n_rows).collect();

    // params[k][col] = (mu, sigma)
    let params: Vec<Vec<(f64, f64)>> = (0..n_clusters)
        .map(|_| {
            (0..n_cols)
                .map(|_| {
                    (
                        choose_uniform(&mu_grid, rng),
                        choose_uniform(&sigma_grid, rng),
                    )
                })
                .collect()
        })
        .collect();

    let cols = (0..n_cols)
        .map(|col_ix| {
            zs.iter()
                .map(|&k| {
                    let (mu, sigma) = params[k][col_ix];
                    // sigma is positive and finite so the draw cannot fail
                    Normal::new(mu, sigma).map_or(mu, |g| g.sample(rng))
                })
                .collect()
        })
        .collect();

    Ok((cols, zs))
}

/// A table of `n_cols` continuous columns in `n_splits` groups with
/// independent row structure, and its codebook
///
/// # Example
///
/// ```
/// use crosscat::synthetic::gen_factorial_data;
///
/// let (table, codebook) =
///     gen_factorial_data(0, 4, 6, 100, 2, 10.0, 1.0).unwrap();
///
/// assert_eq!(table.shape(), (100, 6));
/// assert_eq!(codebook.n_cols(), 6);
/// ```
pub fn gen_factorial_data(
    seed: u64,
    n_clusters: usize,
    n_cols: usize,
    n_rows: usize,
    n_splits: usize,
    max_mean: f64,
    max_std: f64,
) -> Result<(Table, Codebook), SyntheticDataError> {
    if n_splits == 0 || n_cols == 0 {
        return Err(SyntheticDataError::EmptyDimension);
    }
    if n_cols % n_splits != 0 {
        return Err(SyntheticDataError::UnevenSplit { n_cols, n_splits });
    }

    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let cols_per_split = n_cols / n_splits;

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(n_cols);
    for _ in 0..n_splits {
        let mut split_rng = Xoshiro256Plus::seed_from_u64(rng.next_u64());
        let (cols, _) = gen_data(
            n_clusters,
            cols_per_split,
            n_rows,
            max_mean,
            max_std,
            &mut split_rng,
        )?;

        let permutation = random_permutation(n_rows, &mut rng);
        columns.extend(cols.into_iter().map(|col| {
            permutation.iter().map(|&ix| col[ix]).collect::<Vec<f64>>()
        }));
    }

    let table = Table::from_columns(columns)?;
    let codebook = Codebook::all_continuous("synthetic", n_cols);
    Ok((table, codebook))
}

/// Turn continuous columns into discrete ones
///
/// The distinct present values of each column become its categories. The
/// value map holds each value's decimal representation and the table cells
/// are replaced by the codes.
pub fn convert_columns_to_categorical(
    table: &mut Table,
    codebook: &mut Codebook,
    col_ixs: &[usize],
) -> Result<(), SyntheticDataError> {
    let n_cols = table.n_cols();
    for &col_ix in col_ixs {
        if col_ix >= n_cols || col_ix >= codebook.n_cols() {
            return Err(SyntheticDataError::ColumnIndexOutOfBounds {
                col_ix,
                n_cols,
            });
        }
        if codebook.col_metadata[col_ix].coltype.is_categorical() {
            return Err(SyntheticDataError::AlreadyCategorical(col_ix));
        }
    }

    for &col_ix in col_ixs {
        let values: BTreeSet<String> = table
            .column_present(col_ix)
            .iter()
            .map(|x| x.to_string())
            .collect();

        if values.is_empty() {
            return Err(SyntheticDataError::EmptyColumn(col_ix));
        }

        let value_map = ValueMap::new(values);
        for row_ix in 0..table.n_rows() {
            if let Some(x) = table.get(row_ix, col_ix) {
                if let Some(code) = value_map.code(&x.to_string()) {
                    table.set(row_ix, col_ix, f64::from(code));
                }
            }
        }

        codebook.col_metadata[col_ix].coltype = ColType::Categorical {
            k: value_map.len(),
            value_map,
        };
    }

    Ok(())
}
