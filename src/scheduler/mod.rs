//! Simulated-annealing scheduler and optimisation report (spec.md §4.6,
//! §4.7).

pub mod annealing;
pub mod report;

pub use annealing::{AbortFlag, AnnealingConfig, Scheduler, SchedulerState};
pub use report::{RecordKind, Report, ReportRecord};
