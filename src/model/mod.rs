//! Shift and ShiftRule algebra (spec.md §3, §4.1).

pub mod rule;
pub mod shift;

pub use rule::ShiftRule;
pub use shift::{Interval, Shift};
