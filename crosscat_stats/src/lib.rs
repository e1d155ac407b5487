//! Partitions, the Chinese Restaurant Process, and the hyperparameter grids of
//! the conjugate component models used by CrossCat
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]
pub mod assignment;
pub mod hyper_grid;
pub mod prior_process;
mod students_t;

pub use assignment::{lcrp, Assignment, AssignmentError, UNASSIGNED};
pub use crosscat_consts::rv;
pub use hyper_grid::{crp_alpha_grid, csd_ln_m, ng_ln_m, CsdGrid, NgGrid, NgParam};
pub use prior_process::{Crp, InitMode, PriorProcess};
pub use students_t::{StudentT, StudentTError};
