//! Workforce shift planning: a shift-rule algebra compiled to a Brzozowski-
//! derivative finite automaton, a uniform sampler over its accepted words, a
//! quantised staffing-coverage model, and a simulated-annealing scheduler
//! that assigns agents to rule-conformant shift sequences tracking a target
//! demand curve.

pub mod coverage;
pub mod energy;
pub mod error;
pub mod fsm;
pub mod model;
pub mod plan;
pub mod planner;
pub mod random;
pub mod scheduler;

pub use coverage::Target;
pub use energy::{ComfortPenalty, Energy, NoComfort, ShiftChangeComfort};
pub use error::{PlannerError, Result};
pub use model::{Interval, Shift, ShiftRule};
pub use plan::{Plan, SwapHandle};
pub use planner::StaffPlanner;
pub use random::{RandomSource, StdRandomSource};
pub use scheduler::{AbortFlag, AnnealingConfig, RecordKind, Report, ReportRecord, Scheduler, SchedulerState};
