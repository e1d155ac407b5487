use serde::{Deserialize, Serialize};

use crate::{Container, DataContainer, Datum};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatistics {
    Continuous {
        min: f64,
        max: f64,
        mean: f64,
        median: f64,
        variance: f64,
    },
    Categorical {
        min: u32,
        max: u32,
        mode: Vec<u32>,
    },
    None,
}

/// The data of one column, pulled from a feature or from a table
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "snake_case")]
pub enum FeatureData {
    /// Univariate continuous data
    Continuous(DataContainer<f64>),
    /// Categorical codes
    Categorical(DataContainer<u32>),
}

impl FeatureData {
    pub fn len(&self) -> usize {
        match self {
            Self::Continuous(xs) => xs.len(),
            Self::Categorical(xs) => xs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_present(&self, ix: usize) -> bool {
        match self {
            Self::Continuous(xs) => xs.is_present(ix),
            Self::Categorical(xs) => xs.is_present(ix),
        }
    }

    /// Get the datum at `ix` as a `Datum`
    pub fn get(&self, ix: usize) -> Datum {
        match self {
            FeatureData::Continuous(xs) => {
                xs.get(ix).map(Datum::Continuous).unwrap_or(Datum::Missing)
            }
            FeatureData::Categorical(xs) => {
                xs.get(ix).map(Datum::Categorical).unwrap_or(Datum::Missing)
            }
        }
    }

    /// Get the summary statistic for a column
    pub fn summarize(&self) -> SummaryStatistics {
        match self {
            FeatureData::Continuous(ref container) => {
                summarize_continuous(container)
            }
            FeatureData::Categorical(ref container) => {
                summarize_categorical(container)
            }
        }
    }
}

pub fn summarize_continuous(
    container: &DataContainer<f64>,
) -> SummaryStatistics {
    use crosscat_utils::{mean, median, minmax, var};
    let xs: Vec<f64> = container.present_cloned();

    if xs.is_empty() {
        return SummaryStatistics::None;
    }

    let (min, max) = minmax(&xs);
    SummaryStatistics::Continuous {
        min,
        max,
        mean: mean(&xs),
        median: median(&xs),
        variance: var(&xs),
    }
}

pub fn summarize_categorical(
    container: &DataContainer<u32>,
) -> SummaryStatistics {
    use crosscat_utils::{argmax_ties, bincount, minmax};
    let xs: Vec<u32> = container.present_cloned();

    if xs.is_empty() {
        return SummaryStatistics::None;
    }

    let (min, max) = minmax(&xs);
    let ixs: Vec<usize> = xs.iter().map(|&x| x as usize).collect();
    let counts = bincount(&ixs, max as usize + 1);
    let mode = argmax_ties(&counts).iter().map(|&x| x as u32).collect();

    SummaryStatistics::Categorical { min, max, mode }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    #[test]
    fn summarize_continuous_ignores_missing() {
        let xs = DataContainer::from_nan_coded(vec![
            1.0,
            f64::NAN,
            2.0,
            3.0,
            4.0,
        ]);
        match FeatureData::Continuous(xs).summarize() {
            SummaryStatistics::Continuous {
                min,
                max,
                mean,
                median,
                variance,
            } => {
                assert_relative_eq!(min, 1.0);
                assert_relative_eq!(max, 4.0);
                assert_relative_eq!(mean, 2.5);
                assert_relative_eq!(median, 2.5);
                assert_relative_eq!(variance, 1.25);
            }
            _ => panic!("wrong summary"),
        }
    }

    #[test]
    fn summarize_categorical_reports_tied_modes() {
        let xs = DataContainer::new(vec![0_u32, 2, 2, 1, 0, 3]);
        let summary = FeatureData::Categorical(xs).summarize();
        assert_eq!(
            summary,
            SummaryStatistics::Categorical {
                min: 0,
                max: 3,
                mode: vec![0, 2]
            }
        );
    }

    #[test]
    fn all_missing_summarizes_to_none() {
        let xs: DataContainer<f64> = DataContainer::all_missing(3);
        assert_eq!(
            FeatureData::Continuous(xs).summarize(),
            SummaryStatistics::None
        );
    }
}
