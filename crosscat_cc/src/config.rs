use crate::transition::StateTransition;
use serde::{Deserialize, Serialize};

/// Configuration for `State.update`
///
/// Sets the number of iterations, timeout, transitions, and which rows and
/// columns the transitions may touch. An empty `transitions` list runs the
/// default sweep.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StateUpdateConfig {
    /// Maximum number of iterations to run.
    pub n_iters: usize,
    /// Timeout in seconds, checked between sweeps
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Which transitions to run
    #[serde(default)]
    pub transitions: Vec<StateTransition>,
    /// Rows the row kernels may reassign. `None` means all rows.
    #[serde(default)]
    pub row_ixs: Option<Vec<usize>>,
    /// Columns the column kernels may move or update. `None` means all.
    #[serde(default)]
    pub col_ixs: Option<Vec<usize>>,
}

impl StateUpdateConfig {
    pub fn new() -> Self {
        StateUpdateConfig {
            n_iters: 1,
            timeout: None,
            transitions: Vec::new(),
            row_ixs: None,
            col_ixs: None,
        }
    }

    // Check whether we've exceeded the allotted number of iterations
    pub fn check_over_iters(&self, iter: usize) -> bool {
        iter >= self.n_iters
    }

    /// Check whether `elapsed` seconds is past the timeout
    pub fn check_over_time(&self, elapsed: u64) -> bool {
        self.timeout.map_or(false, |timeout| elapsed >= timeout)
    }
}

impl Default for StateUpdateConfig {
    fn default() -> Self {
        StateUpdateConfig::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn default_is_one_default_sweep() {
        let config = StateUpdateConfig::default();
        assert_eq!(config.n_iters, 1);
        assert!(config.transitions.is_empty());
        assert!(!config.check_over_iters(0));
        assert!(config.check_over_iters(1));
    }

    #[test]
    fn timeout_check() {
        let mut config = StateUpdateConfig::new();
        assert!(!config.check_over_time(1_000_000));
        config.timeout = Some(10);
        assert!(!config.check_over_time(9));
        assert!(config.check_over_time(10));
    }

    #[test]
    fn deserialize_from_yaml() {
        let yaml = indoc!(
            "
            n_iters: 50
            transitions:
              - row_partition_assignments
              - column_partition_assignments
            row_ixs: [0, 1, 2]
            "
        );
        let config: StateUpdateConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.n_iters, 50);
        assert_eq!(
            config.transitions,
            vec![
                StateTransition::RowPartitionAssignments,
                StateTransition::ColumnPartitionAssignments,
            ]
        );
        assert_eq!(config.row_ixs, Some(vec![0, 1, 2]));
        assert!(config.col_ixs.is_none());
        assert!(config.timeout.is_none());
    }
}
