//! The latent state of one chain as plain data
//!
//! `XL` holds the column partition, the hyperparameters of every column, and
//! for each view its row-partition model and the per-cluster sufficient
//! statistics of its columns. `XD` holds one row assignment vector per view.
//! The table itself is not part of a snapshot.
use crosscat_cc::feature::{ColModel, Feature, Hypers};
use crosscat_cc::state::{State, StateDiagnostics};
use crosscat_stats::rv::data::{CategoricalSuffStat, GaussianSuffStat};
use serde::{Deserialize, Serialize};

/// Assignment of columns to views
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ColumnPartition {
    /// The view index of each column
    pub assignments: Vec<usize>,
    /// The number of columns in each view
    pub counts: Vec<usize>,
    /// The column CRP concentration
    pub alpha: f64,
}

/// The CRP over the rows of one view
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RowPartitionModel {
    /// The number of rows in each cluster
    pub counts: Vec<usize>,
    /// The row CRP concentration
    pub alpha: f64,
}

/// Sufficient statistics of one column in one cluster
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Suffstats {
    Continuous(GaussianSuffStat),
    Categorical(CategoricalSuffStat),
}

impl Suffstats {
    /// The number of data observed
    pub fn n(&self) -> usize {
        match self {
            Self::Continuous(stat) => stat.n(),
            Self::Categorical(stat) => stat.n(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewState {
    pub row_partition_model: RowPartitionModel,
    /// Indices of the columns in this view, ascending
    pub column_ixs: Vec<usize>,
    /// `column_component_suffstats[i][k]` belongs to column `column_ixs[i]`
    /// in cluster `k`
    pub column_component_suffstats: Vec<Vec<Suffstats>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct XL {
    pub column_partition: ColumnPartition,
    /// Hyperparameters indexed by column
    pub column_hypers: Vec<Hypers>,
    pub view_states: Vec<ViewState>,
}

/// Row assignments, one vector per view
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct XD(pub Vec<Vec<usize>>);

/// The X_L/X_D pair plus the sweep diagnostics of one chain
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LatentState {
    pub x_l: XL,
    pub x_d: XD,
    #[serde(default)]
    pub diagnostics: StateDiagnostics,
}

impl LatentState {
    pub fn n_cols(&self) -> usize {
        self.x_l.column_partition.assignments.len()
    }

    pub fn n_views(&self) -> usize {
        self.x_l.view_states.len()
    }
}

fn suffstats(ftr: &ColModel) -> Vec<Suffstats> {
    match ftr {
        ColModel::Continuous(col) => {
            col.stats.iter().cloned().map(Suffstats::Continuous).collect()
        }
        ColModel::Categorical(col) => {
            col.stats.iter().cloned().map(Suffstats::Categorical).collect()
        }
    }
}

impl From<&State> for LatentState {
    fn from(state: &State) -> Self {
        let column_partition = ColumnPartition {
            assignments: state.asgn().asgn.clone(),
            counts: state.asgn().counts.clone(),
            alpha: state.alpha(),
        };

        let column_hypers = (0..state.n_cols())
            .map(|col_ix| state.feature(col_ix).hypers())
            .collect();

        let view_states = state
            .views
            .iter()
            .map(|view| ViewState {
                row_partition_model: RowPartitionModel {
                    counts: view.asgn().counts.clone(),
                    alpha: view.alpha(),
                },
                column_ixs: view.ftrs.values().map(|ftr| ftr.id()).collect(),
                column_component_suffstats: view
                    .ftrs
                    .values()
                    .map(suffstats)
                    .collect(),
            })
            .collect();

        let x_d = XD(state
            .views
            .iter()
            .map(|view| view.asgn().asgn.clone())
            .collect());

        LatentState {
            x_l: XL {
                column_partition,
                column_hypers,
                view_states,
            },
            x_d,
            diagnostics: state.diagnostics.clone(),
        }
    }
}

impl From<State> for LatentState {
    fn from(state: State) -> Self {
        Self::from(&state)
    }
}
