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

mod container;
mod datum;
mod feature;
mod table;
mod traits;

pub use container::DataContainer;
pub use datum::{Datum, DatumConversionError};
pub use feature::{FeatureData, SummaryStatistics};
pub use table::{Table, TableError};
pub use traits::{AccumScore, Container};
