#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]

//! Cross-categorization: views of columns sharing a row partition, and the
//! collapsed Gibbs kernels that move rows, columns, and hyperparameters.
pub mod config;
pub mod error;
pub mod feature;
pub mod misc;
pub mod state;
pub mod traits;
pub mod transition;
pub mod view;

pub use error::{BuildStateError, NumericalError};

use serde::Serialize;
use std::fmt::{Debug, Display};

/// A string that names no known variant
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ParseError<T: Serialize + Debug + Clone + PartialEq + Eq>(T);

impl<T> Display for ParseError<T>
where
    T: Serialize + Debug + Clone + PartialEq + Eq,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl<T> std::error::Error for ParseError<T> where
    T: Serialize + Debug + Clone + PartialEq + Eq
{
}
