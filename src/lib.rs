//! A cross-categorization probabilistic database engine.
//!
//! Cross-categorization (CrossCat) partitions the columns of a table into
//! views, and within every view partitions the rows into clusters. Each
//! (column, cluster) pair has a conjugate component model, so the model can
//! be fit by collapsed Gibbs sampling and queried in closed form.
//!
//! # Example
//!
//! Fit a few chains to synthetic data with two independent column groups,
//! then ask questions of a new row.
//!
//! ```rust
//! use crosscat::synthetic::gen_factorial_data;
//! use crosscat::data::Datum;
//! use crosscat::{EngineBuilder, Given, Oracle, OracleT};
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let (table, codebook) =
//!     gen_factorial_data(1337, 3, 4, 50, 2, 10.0, 1.0).unwrap();
//!
//! let mut engine = EngineBuilder::new(codebook, table)
//!     .with_nstates(4)
//!     .seed_from_u64(1337)
//!     .build()
//!     .unwrap();
//!
//! engine.run(20).unwrap();
//!
//! let oracle = Oracle::from(engine);
//! let mut rng = Xoshiro256Plus::seed_from_u64(1337);
//!
//! // Draw column 1 of a row we have not seen, knowing its value in column 0
//! let given = Given::Conditions(vec![(0, Datum::Continuous(2.5))]);
//! let xs = oracle
//!     .simple_predictive_sample(50, &[1], &given, 100, None, &mut rng)
//!     .unwrap();
//! assert_eq!(xs.len(), 100);
//!
//! // The log density of a value in that cell
//! let logf = oracle
//!     .simple_predictive_density(50, &[1], &[Datum::Continuous(0.0)], &given, None)
//!     .unwrap();
//! assert!(logf.is_finite());
//! ```
//!
//! Imputing a cell reports a confidence with the estimate.
//!
//! ```rust
//! # use crosscat::synthetic::gen_factorial_data;
//! # use crosscat::{EngineBuilder, Given, OracleT};
//! # use rand::SeedableRng;
//! # use rand_xoshiro::Xoshiro256Plus;
//! # let (table, codebook) =
//! #     gen_factorial_data(1337, 3, 4, 50, 2, 10.0, 1.0).unwrap();
//! # let mut engine = EngineBuilder::new(codebook, table)
//! #     .with_nstates(2)
//! #     .seed_from_u64(1337)
//! #     .build()
//! #     .unwrap();
//! # engine.run(10).unwrap();
//! let mut rng = Xoshiro256Plus::seed_from_u64(1337);
//! let (x, confidence) = engine
//!     .impute_and_confidence(3, 2, &Given::Nothing, 500, &mut rng)
//!     .unwrap();
//!
//! assert!(x.is_continuous());
//! assert!((0.0..=1.0).contains(&confidence));
//! ```
#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone,
    clippy::perf
)]

pub mod config;
mod interface;
pub mod synthetic;

pub use config::{EngineUpdateConfig, SaveEngineConfig};

pub use interface::{
    update_handler, utils as oracle_utils, CanOracle, Engine, EngineBuilder,
    Given, HasCodebook, HasData, HasStates, Oracle, OracleT,
    ReplicatingSample,
};

pub mod error {
    pub use super::interface::error::*;
}

pub use crosscat_cc::feature::FType;
pub use crosscat_cc::state::StateDiagnostics;
pub use crosscat_cc::transition::StateTransition;
pub use crosscat_data::{Datum, SummaryStatistics};

pub mod consts {
    pub use crosscat_consts::*;
}

pub mod metadata {
    pub use crosscat_metadata::*;
}

pub mod codebook {
    pub use crosscat_codebook::*;
}

pub mod cc {
    pub use crosscat_cc::*;
}

pub mod stats {
    pub use crosscat_stats::*;
}

pub mod data {
    pub use crosscat_data::*;
}

pub mod utils {
    pub use crosscat_utils::*;
}
