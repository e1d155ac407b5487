//! The `Codebook` is a YAML file used to associate metadata with a table.
//! It names the table and each column, sets the model of each column, and
//! for discrete columns holds the map between raw values and integer codes.
//!
//! # Example
//!
//! An Example codebook for a two-column dataset.
//!
//! ```
//! # use crosscat_codebook::Codebook;
//! use indoc::indoc;
//!
//! let codebook_str = indoc!("
//!     ---
//!     table_name: two column dataset
//!     col_metadata:
//!       - name: col_1
//!         notes: a discrete column with named values
//!         coltype:
//!           !categorical
//!             k: 3
//!             value_map: !string
//!               0: red
//!               1: green
//!               2: blue
//!       - name: col_2
//!         coltype: continuous
//!     comments: An example codebook
//!     row_names:
//!       - A
//!       - B
//!       - C");
//!
//! let codebook: Codebook = serde_yaml::from_str(&codebook_str).unwrap();
//!
//! assert_eq!(codebook.col_metadata.len(), 2);
//! assert_eq!(codebook.value_map(0).unwrap().code("green"), Some(1));
//! ```
#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]

mod codebook;
mod error;
mod value_map;

pub use codebook::*;
pub use error::*;
pub use value_map::{CategoryMap, ValueMap};
