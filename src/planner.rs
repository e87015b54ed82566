//! Top-level planner facade (spec.md §6's interface surface; not itself a
//! `[MODULE]` of spec.md, added per SPEC_FULL.md §3.8). Mirrors the thin
//! `addAgentRule`/`setStaffingTarget`/`run`/`getAgentPlan` wrapper shape of
//! the original implementation, but is the entire engine rather than a
//! wrapper over a native extension.

use crate::coverage::target::Target;
use crate::error::{PlannerError, Result};
use crate::model::rule::ShiftRule;
use crate::model::shift::Shift;
use crate::scheduler::{AbortFlag, AnnealingConfig, Report, Scheduler, SchedulerState};
use indexmap::IndexMap;
use std::rc::Rc;
use std::sync::Arc;

/// Owns the agent rule registry and, once `run` reaches a terminal state,
/// the resulting plan and optimisation report. Every accessor but the
/// mutation methods below requires `run` to have completed.
pub struct StaffPlanner {
    rules: IndexMap<String, ShiftRule>,
    target: Option<Arc<Target>>,
    config: AnnealingConfig,
    abort: AbortFlag,
    scheduler: Option<Scheduler>,
}

impl StaffPlanner {
    pub fn new(config: AnnealingConfig) -> Self {
        StaffPlanner {
            rules: IndexMap::new(),
            target: None,
            config,
            abort: AbortFlag::new(),
            scheduler: None,
        }
    }

    /// A handle the caller can use to request cooperative cancellation of an
    /// in-progress `run`.
    pub fn abort_handle(&self) -> AbortFlag {
        self.abort.clone()
    }

    /// Registers (or replaces) the rule governing `agent`'s assignments.
    /// Returns `Config` if `agent` is already registered with a rule that
    /// would otherwise silently be discarded by a second call.
    pub fn add_agent_rule(&mut self, agent: impl Into<String>, rule: ShiftRule) -> Result<()> {
        let agent = agent.into();
        if self.rules.contains_key(&agent) {
            return Err(PlannerError::Config(format!("agent '{}' already has a registered rule", agent)));
        }
        self.rules.insert(agent, rule);
        Ok(())
    }

    pub fn set_staffing_target(&mut self, target: Target) {
        self.target = Some(Arc::new(target));
    }

    /// Compiles every agent's rule, samples an initial plan, and runs
    /// simulated annealing to completion. Requires at least one agent rule
    /// and a staffing target to have been set.
    pub fn run(&mut self) -> Result<()> {
        let target = self
            .target
            .clone()
            .ok_or_else(|| PlannerError::Config("no staffing target set".to_string()))?;
        if self.rules.is_empty() {
            return Err(PlannerError::Config("no agent rules registered".to_string()));
        }

        let mut scheduler = Scheduler::new(&self.rules, target, self.config.clone(), self.abort.clone());
        scheduler.initialise()?;
        scheduler.run()?;
        self.scheduler = Some(scheduler);
        Ok(())
    }

    fn ready_scheduler(&self) -> Result<&Scheduler> {
        match &self.scheduler {
            Some(scheduler) if matches!(scheduler.state(), SchedulerState::Done | SchedulerState::Failed) => Ok(scheduler),
            _ => Err(PlannerError::NotReady),
        }
    }

    pub fn get_agent_plan(&self, agent: &str) -> Result<Vec<Rc<Shift>>> {
        let scheduler = self.ready_scheduler()?;
        let plan = scheduler.plan().ok_or(PlannerError::NotReady)?;
        plan.get_agent_plan(agent)
            .map(|s| s.to_vec())
            .ok_or_else(|| PlannerError::Config(format!("no such agent '{}'", agent)))
    }

    pub fn get_target_staffing(&self) -> Result<Vec<f64>> {
        let scheduler = self.ready_scheduler()?;
        let plan = scheduler.plan().ok_or(PlannerError::NotReady)?;
        Ok(plan.get_target_staffing().to_vec())
    }

    pub fn get_planned_staffing(&self) -> Result<Vec<f64>> {
        let scheduler = self.ready_scheduler()?;
        let plan = scheduler.plan().ok_or(PlannerError::NotReady)?;
        Ok(plan.get_planned_staffing().to_vec())
    }

    pub fn get_report(&self) -> Result<&Report> {
        let scheduler = self.ready_scheduler()?;
        Ok(scheduler.report())
    }
}
