//! Coverage grid and target staffing curve (spec.md §3, §4.3).

pub mod grid;
pub mod target;

pub use grid::{accumulate_contribution, build_grid};
pub use target::Target;
