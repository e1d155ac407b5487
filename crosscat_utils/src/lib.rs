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
mod grid;
mod misc;
mod random;

pub use grid::{linspace, log_linspace};
pub use misc::*;
pub use random::{choose_uniform, random_permutation};
