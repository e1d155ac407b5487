use std::collections::HashSet;
use std::convert::TryFrom;

use crate::data::Datum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Observed values of the queried row that a query conditions on
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Given {
    /// `(column index, value)` pairs. `(3, Datum::Continuous(2.3))`
    /// conditions on column 3 of the queried row being 2.3.
    Conditions(Vec<(usize, Datum)>),
    /// No conditions
    #[default]
    Nothing,
}

impl Given {
    /// Determine whether there are no conditions
    ///
    /// # Example
    ///
    /// ```
    /// # use crosscat::data::Datum;
    /// # use crosscat::Given;
    /// let nothing_given = Given::Nothing;
    ///
    /// assert!(nothing_given.is_nothing());
    ///
    /// let something_given = Given::Conditions(vec![(1, Datum::Categorical(1))]);
    ///
    /// assert!(!something_given.is_nothing());
    /// ```
    pub fn is_nothing(&self) -> bool {
        matches!(self, Given::Nothing)
    }

    pub fn is_conditions(&self) -> bool {
        matches!(self, Given::Conditions(..))
    }

    /// The condition values that fall in the columns `col_ixs`
    pub fn conditions_in(&self, col_ixs: &[usize]) -> Vec<(usize, Datum)> {
        match self {
            Given::Conditions(conditions) => conditions
                .iter()
                .filter(|(ix, _)| col_ixs.contains(ix))
                .cloned()
                .collect(),
            Given::Nothing => Vec::new(),
        }
    }

    /// The condition values on column `col_ix`
    pub fn values_for(&self, col_ix: usize) -> Vec<Datum> {
        match self {
            Given::Conditions(conditions) => conditions
                .iter()
                .filter(|(ix, _)| *ix == col_ix)
                .map(|(_, x)| *x)
                .collect(),
            Given::Nothing => Vec::new(),
        }
    }
}

/// Errors converting condition lists into a `Given`
///
/// # Example
///
/// ```
/// # use crosscat::Given;
/// # use crosscat::error::IntoGivenError;
/// use std::convert::TryFrom;
/// use crosscat::data::Datum;
///
/// let conditions_good = vec![
///     (0, Datum::Categorical(0)),
///     (1, Datum::Categorical(0)),
/// ];
///
/// assert!(Given::try_from(conditions_good).is_ok());
///
/// // duplicate indices
/// let conditions_bad = vec![
///     (0, Datum::Categorical(0)),
///     (0, Datum::Categorical(0)),
/// ];
///
/// assert_eq!(
///     Given::try_from(conditions_bad).unwrap_err(),
///     IntoGivenError::DuplicateConditionIndices(0)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum IntoGivenError {
    /// Tried to convert `Some(vec![])` into a Given. Use `None` instead
    #[error("empty conditions; use `None` for no conditions")]
    EmptyConditions,
    /// The same column index appears more than once
    #[error("column {0} appears more than once in the conditions")]
    DuplicateConditionIndices(usize),
}

impl TryFrom<Vec<(usize, Datum)>> for Given {
    type Error = IntoGivenError;

    fn try_from(conditions: Vec<(usize, Datum)>) -> Result<Self, Self::Error> {
        if conditions.is_empty() {
            return Ok(Given::Nothing);
        }

        let mut seen: HashSet<usize> = HashSet::new();
        match conditions.iter().find(|(ix, _)| !seen.insert(*ix)) {
            Some((ix, _)) => Err(IntoGivenError::DuplicateConditionIndices(*ix)),
            None => Ok(Given::Conditions(conditions)),
        }
    }
}

impl TryFrom<Option<Vec<(usize, Datum)>>> for Given {
    type Error = IntoGivenError;

    fn try_from(
        conditions: Option<Vec<(usize, Datum)>>,
    ) -> Result<Self, Self::Error> {
        match conditions {
            Some(conditions) if conditions.is_empty() => {
                Err(IntoGivenError::EmptyConditions)
            }
            Some(conditions) => Given::try_from(conditions),
            None => Ok(Given::Nothing),
        }
    }
}
