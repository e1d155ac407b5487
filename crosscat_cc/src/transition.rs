use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// MCMC transitions in the `View`
#[derive(Deserialize, Serialize, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ViewTransition {
    /// Gibbs reassignment of rows to clusters
    RowAssignments,
    /// Resample the row CRP concentration from its grid
    Alpha,
    /// Resample the component-model hyperparameters of each column
    ColumnHyperparameters,
}

impl ViewTransition {
    /// The per-view part of the default sweep, in random order
    pub fn shuffled<R: Rng>(rng: &mut R) -> [ViewTransition; 3] {
        let mut transitions = [
            ViewTransition::ColumnHyperparameters,
            ViewTransition::RowAssignments,
            ViewTransition::Alpha,
        ];
        transitions.shuffle(rng);
        transitions
    }
}

/// MCMC transitions in the `State`
#[derive(Deserialize, Serialize, Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StateTransition {
    /// Resample the column CRP concentration
    ColumnPartitionHyperparameter,
    /// Gibbs reassignment of columns to views
    ColumnPartitionAssignments,
    /// Resample the component-model hyperparameters of each column
    ColumnHyperparameters,
    /// Resample the row CRP concentration of each view
    RowPartitionHyperparameters,
    /// Gibbs reassignment of rows to clusters in each view
    RowPartitionAssignments,
}

impl StateTransition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ColumnPartitionHyperparameter => {
                "column_partition_hyperparameter"
            }
            Self::ColumnPartitionAssignments => "column_partition_assignments",
            Self::ColumnHyperparameters => "column_hyperparameters",
            Self::RowPartitionHyperparameters => {
                "row_partition_hyperparameters"
            }
            Self::RowPartitionAssignments => "row_partition_assignments",
        }
    }

    /// The per-view transition, if this is one
    pub fn view_transition(&self) -> Option<ViewTransition> {
        match self {
            Self::ColumnHyperparameters => {
                Some(ViewTransition::ColumnHyperparameters)
            }
            Self::RowPartitionHyperparameters => Some(ViewTransition::Alpha),
            Self::RowPartitionAssignments => {
                Some(ViewTransition::RowAssignments)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for StateTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StateTransition {
    type Err = ParseError<String>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "column_partition_hyperparameter" => {
                Ok(Self::ColumnPartitionHyperparameter)
            }
            "column_partition_assignments" => {
                Ok(Self::ColumnPartitionAssignments)
            }
            "column_hyperparameters" => Ok(Self::ColumnHyperparameters),
            "row_partition_hyperparameters" => {
                Ok(Self::RowPartitionHyperparameters)
            }
            "row_partition_assignments" => Ok(Self::RowPartitionAssignments),
            _ => Err(ParseError(s.to_owned())),
        }
    }
}

/// Every transition, in the order a full explicit sweep runs them
pub const ALL_STATE_TRANSITIONS: [StateTransition; 5] = [
    StateTransition::ColumnHyperparameters,
    StateTransition::RowPartitionAssignments,
    StateTransition::RowPartitionHyperparameters,
    StateTransition::ColumnPartitionAssignments,
    StateTransition::ColumnPartitionHyperparameter,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for t in ALL_STATE_TRANSITIONS {
            assert_eq!(t.name().parse::<StateTransition>(), Ok(t));
        }
    }

    #[test]
    fn unknown_kernel_name_fails() {
        let res = "row_partition_assignment".parse::<StateTransition>();
        assert!(res.is_err());
    }

    #[test]
    fn serde_uses_kernel_names() {
        let t = StateTransition::RowPartitionHyperparameters;
        let s = serde_json::to_string(&t).unwrap();
        assert_eq!(s, "\"row_partition_hyperparameters\"");
        let t2: StateTransition = serde_json::from_str(&s).unwrap();
        assert_eq!(t, t2);
    }

    #[test]
    fn view_transitions() {
        assert_eq!(
            StateTransition::RowPartitionAssignments.view_transition(),
            Some(ViewTransition::RowAssignments)
        );
        assert_eq!(
            StateTransition::ColumnPartitionAssignments.view_transition(),
            None
        );
    }
}
