pub use rv;

/// Number of points in every hyperparameter grid
pub const N_GRID: usize = 31;

/// Number of independent chains an engine runs when none is requested
pub const DEFAULT_N_STATES: usize = 8;

/// Half-width of the window over which the probability of a continuous
/// value is integrated
pub const PROBABILITY_EPSILON: f64 = 0.001;

/// A continuous imputation sample counts toward the confidence if it lies
/// within this fraction of the column standard deviation of the estimate
pub const CONFIDENCE_STD_FRACTION: f64 = 0.1;

/// Number of predictive samples drawn for an imputation
pub const DEFAULT_IMPUTE_SAMPLES: usize = 1000;

/// Lower bound on the sum of squared deviations used to build a
/// continuous column's `s` grid
pub const MIN_SUM_SQ_DEV: f64 = 1E-4;
