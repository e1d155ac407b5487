mod column;
mod ftype;
mod traits;

pub use column::{ColModel, Column, Hypers};
pub use ftype::FType;
pub use traits::Feature;
