//! Per-agent day-indexed assignment table (spec.md §3, §4.5 "Plan").

use crate::coverage::grid::{accumulate_contribution, build_grid, slot_contributions};
use crate::coverage::target::Target;
use crate::model::shift::Shift;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// A reversible handle returned by `Plan::swap_agent`, carrying the previous
/// assignment (for revert) and, for every slot whose planned value actually
/// changed, its value immediately before and after the swap. This is enough
/// for the energy function to update `E_cov` incrementally without a full
/// rescan (spec §4.4).
pub struct SwapHandle {
    pub agent: String,
    pub previous: Vec<Rc<Shift>>,
    pub touched_slots: BTreeMap<usize, (f64, f64)>,
}

/// Maps agent code to an ordered sequence of `Shift` literals, one per day of
/// the horizon (`days + offset_days`), plus the coverage grid it induces.
///
/// Invariant: at every observation point, `planned[i] = sum over agents of
/// contribution_i(current_assignment)`.
pub struct Plan {
    target: Arc<Target>,
    horizon_days: usize,
    agents: IndexMap<String, Vec<Rc<Shift>>>,
    grid: Vec<f64>,
}

impl Plan {
    pub fn new(target: Arc<Target>, horizon_days: usize) -> Self {
        let total_slots = target.total_slots();
        Plan {
            target,
            horizon_days,
            agents: IndexMap::new(),
            grid: vec![0.0; total_slots],
        }
    }

    pub fn horizon_days(&self) -> usize {
        self.horizon_days
    }

    /// Installs the initial sampled assignment for `agent`, folding its
    /// contribution into the coverage grid.
    pub fn insert_initial(&mut self, agent: impl Into<String>, assignment: Vec<Rc<Shift>>) {
        let agent = agent.into();
        accumulate_contribution(&mut self.grid, &assignment, self.target.slot_length_minutes, 1.0);
        self.agents.insert(agent, assignment);
    }

    pub fn get_agent_plan(&self, code: &str) -> Option<&[Rc<Shift>]> {
        self.agents.get(code).map(|v| v.as_slice())
    }

    pub fn agent_codes(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(|s| s.as_str())
    }

    pub fn get_target_staffing(&self) -> &[f64] {
        &self.target.values
    }

    pub fn get_planned_staffing(&self) -> &[f64] {
        &self.grid
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Atomically replaces `agent`'s assignment, updating the grid in place.
    /// Returns a handle carrying the previous assignment (for revert) and the
    /// set of slots whose planned value changed, each with its before/after
    /// value.
    pub fn swap_agent(&mut self, agent: &str, new_assignment: Vec<Rc<Shift>>) -> SwapHandle {
        let previous = self
            .agents
            .get(agent)
            .expect("swap_agent called for an unregistered agent")
            .clone();
        let touched = self.apply_delta(&previous, &new_assignment);
        self.agents.insert(agent.to_string(), new_assignment);
        SwapHandle {
            agent: agent.to_string(),
            previous,
            touched_slots: touched,
        }
    }

    /// Reverts a swap using its handle (used on annealing rejection). The
    /// caller should apply the *inverse* delta to its energy tracker using
    /// the returned map (before/after are swapped relative to the original).
    pub fn revert(&mut self, handle: SwapHandle) -> BTreeMap<usize, (f64, f64)> {
        let current = self
            .agents
            .get(handle.agent.as_str())
            .expect("revert called for an unregistered agent")
            .clone();
        let touched = self.apply_delta(&current, &handle.previous);
        self.agents.insert(handle.agent, handle.previous);
        touched
    }

    /// Removes `old`'s contribution and adds `new`'s, touching only the
    /// slots either one maps to, and returns each touched slot's (before,
    /// after) planned value.
    fn apply_delta(&mut self, old: &[Rc<Shift>], new: &[Rc<Shift>]) -> BTreeMap<usize, (f64, f64)> {
        let m = self.target.slot_length_minutes;
        let total = self.grid.len();
        let removed = slot_contributions(old, m, total);
        let added = slot_contributions(new, m, total);
        let slots: std::collections::BTreeSet<usize> = removed.keys().chain(added.keys()).copied().collect();
        let mut touched = BTreeMap::new();
        for slot in slots {
            let before = self.grid[slot];
            let after = before - removed.get(&slot).copied().unwrap_or(0.0) + added.get(&slot).copied().unwrap_or(0.0);
            self.grid[slot] = after;
            touched.insert(slot, (before, after));
        }
        touched
    }

    /// Rebuilds the grid from scratch from the current assignments. Used to
    /// verify that incremental updates match a full recomputation (spec §8
    /// invariant 3/4).
    pub fn rebuild_grid_from_scratch(&self) -> Vec<f64> {
        build_grid(self.target.total_slots(), self.agents.values(), self.target.slot_length_minutes)
    }

    /// A clone of every agent's current assignment, used by the annealing
    /// scheduler to remember the best plan seen so far.
    pub fn snapshot(&self) -> IndexMap<String, Vec<Rc<Shift>>> {
        self.agents.clone()
    }

    /// Replaces every agent's assignment wholesale and rebuilds the grid.
    /// Used to restore the best-seen plan once the scheduler finishes.
    pub fn restore_snapshot(&mut self, snapshot: IndexMap<String, Vec<Rc<Shift>>>) {
        self.agents = snapshot;
        self.grid = self.rebuild_grid_from_scratch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::shift::Interval;

    fn work(start: u32, end: u32) -> Rc<Shift> {
        Rc::new(Shift::new("W", vec![Interval::new(start, end)]).unwrap())
    }
    fn rest() -> Rc<Shift> {
        Rc::new(Shift::rest("R"))
    }

    #[test]
    fn swap_matches_full_rebuild() {
        let target = Arc::new(Target::new(vec![0.0; 7 * 24], 7, 60).unwrap());
        let mut plan = Plan::new(target, 7);
        plan.insert_initial("a1", vec![work(9 * 60, 17 * 60), rest(), rest(), rest(), rest(), rest(), rest()]);
        let new_assignment = vec![rest(), work(9 * 60, 17 * 60), rest(), rest(), rest(), rest(), rest()];
        plan.swap_agent("a1", new_assignment);

        let incremental = plan.get_planned_staffing().to_vec();
        let rebuilt = plan.rebuild_grid_from_scratch();
        for (a, b) in incremental.iter().zip(rebuilt.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn revert_restores_previous_grid() {
        let target = Arc::new(Target::new(vec![0.0; 7 * 24], 7, 60).unwrap());
        let mut plan = Plan::new(target, 7);
        let original = vec![work(9 * 60, 17 * 60), rest(), rest(), rest(), rest(), rest(), rest()];
        plan.insert_initial("a1", original.clone());
        let before = plan.get_planned_staffing().to_vec();

        let handle = plan.swap_agent("a1", vec![rest(), rest(), rest(), rest(), rest(), rest(), rest()]);
        plan.revert(handle);

        assert_eq!(plan.get_agent_plan("a1").unwrap(), original.as_slice());
        let after = plan.get_planned_staffing().to_vec();
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
