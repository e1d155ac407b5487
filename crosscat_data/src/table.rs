use thiserror::Error;

use crate::{DataContainer, Datum, FeatureData};

/// A rectangular table of reals stored row-major
///
/// Missing cells are `NaN`. Categorical columns store their integer codes as
/// reals.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    n_rows: usize,
    n_cols: usize,
    cells: Vec<f64>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// A row did not have the same number of cells as the first row
    #[error("row {row_ix} has {n_cells} cells but {expected} were expected")]
    Ragged {
        row_ix: usize,
        n_cells: usize,
        expected: usize,
    },
    /// A column did not have the same number of cells as the first column
    #[error("column {col_ix} has {n_cells} cells but {expected} were expected")]
    RaggedColumn {
        col_ix: usize,
        n_cells: usize,
        expected: usize,
    },
    /// The table has no rows or no columns
    #[error("the table is empty")]
    Empty,
}

impl Table {
    /// Build a table from a vector of rows
    ///
    /// # Example
    ///
    /// ```
    /// # use crosscat_data::{Table, TableError};
    /// let table = Table::from_rows(vec![
    ///     vec![1.0, 0.0],
    ///     vec![f64::NAN, 1.0],
    /// ]).unwrap();
    /// assert_eq!(table.shape(), (2, 2));
    /// assert_eq!(table.get(1, 0), None);
    ///
    /// let ragged = Table::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
    /// assert!(matches!(ragged, Err(TableError::Ragged { row_ix: 1, .. })));
    /// ```
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, TableError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|row| row.len()).unwrap_or(0);
        if n_rows == 0 || n_cols == 0 {
            return Err(TableError::Empty);
        }

        let mut cells = Vec::with_capacity(n_rows * n_cols);
        for (row_ix, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(TableError::Ragged {
                    row_ix,
                    n_cells: row.len(),
                    expected: n_cols,
                });
            }
            cells.extend(row);
        }

        Ok(Table {
            n_rows,
            n_cols,
            cells,
        })
    }

    /// Build a table from a vector of columns
    pub fn from_columns(cols: Vec<Vec<f64>>) -> Result<Self, TableError> {
        let n_rows = cols.first().map(|col| col.len()).unwrap_or(0);
        if let Some((col_ix, col)) =
            cols.iter().enumerate().find(|(_, col)| col.len() != n_rows)
        {
            return Err(TableError::RaggedColumn {
                col_ix,
                n_cells: col.len(),
                expected: n_rows,
            });
        }
        let rows = (0..n_rows)
            .map(|row_ix| cols.iter().map(|col| col[row_ix]).collect())
            .collect();
        Self::from_rows(rows)
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// `(n_rows, n_cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// The raw cell value, `NaN` if missing. Panics if out of bounds.
    #[inline]
    pub fn cell(&self, row_ix: usize, col_ix: usize) -> f64 {
        assert!(row_ix < self.n_rows && col_ix < self.n_cols);
        self.cells[row_ix * self.n_cols + col_ix]
    }

    /// The cell value if it is present
    pub fn get(&self, row_ix: usize, col_ix: usize) -> Option<f64> {
        let x = self.cell(row_ix, col_ix);
        if x.is_nan() {
            None
        } else {
            Some(x)
        }
    }

    /// The cell as a `Datum`
    pub fn datum(&self, row_ix: usize, col_ix: usize, categorical: bool) -> Datum {
        Datum::from_cell(self.cell(row_ix, col_ix), categorical)
    }

    /// Overwrite a cell
    pub fn set(&mut self, row_ix: usize, col_ix: usize, x: f64) {
        assert!(row_ix < self.n_rows && col_ix < self.n_cols);
        self.cells[row_ix * self.n_cols + col_ix] = x;
    }

    /// Mark a cell as missing and return its old value
    pub fn set_missing(&mut self, row_ix: usize, col_ix: usize) -> Option<f64> {
        let old = self.get(row_ix, col_ix);
        self.set(row_ix, col_ix, f64::NAN);
        old
    }

    pub fn row(&self, row_ix: usize) -> &[f64] {
        let start = row_ix * self.n_cols;
        &self.cells[start..start + self.n_cols]
    }

    /// A copy of a column's raw cells
    pub fn column(&self, col_ix: usize) -> Vec<f64> {
        (0..self.n_rows).map(|row_ix| self.cell(row_ix, col_ix)).collect()
    }

    /// The present values of a column
    pub fn column_present(&self, col_ix: usize) -> Vec<f64> {
        (0..self.n_rows)
            .filter_map(|row_ix| self.get(row_ix, col_ix))
            .collect()
    }

    /// A column as `FeatureData` of the requested kind
    pub fn feature_data(&self, col_ix: usize, categorical: bool) -> FeatureData {
        let xs = DataContainer::from_nan_coded(self.column(col_ix));
        if categorical {
            FeatureData::Categorical(DataContainer {
                data: xs.data.iter().map(|&x| x as u32).collect(),
                present: xs.present,
            })
        } else {
            FeatureData::Continuous(xs)
        }
    }
}
