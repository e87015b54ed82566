//! Energy function combining coverage error and per-agent comfort
//! (spec.md §4.4): `E = E_cov + w * E_comfort`.

use crate::model::shift::Shift;
use crate::plan::{Plan, SwapHandle};
use std::collections::BTreeMap;
use std::rc::Rc;

/// A pluggable per-agent comfort penalty: a non-negative real computed from
/// an agent's assignment sequence. The spec's default is the count of
/// transitions between distinct shift codes across consecutive days.
pub trait ComfortPenalty {
    fn penalty(&self, assignment: &[Rc<Shift>]) -> f64;
}

/// Default comfort penalty: number of consecutive-day boundaries where the
/// assigned shift code changes.
pub struct ShiftChangeComfort;

impl ComfortPenalty for ShiftChangeComfort {
    fn penalty(&self, assignment: &[Rc<Shift>]) -> f64 {
        assignment.windows(2).filter(|w| w[0].code != w[1].code).count() as f64
    }
}

/// No comfort term (`E_comfort = 0` for every agent).
pub struct NoComfort;
impl ComfortPenalty for NoComfort {
    fn penalty(&self, _assignment: &[Rc<Shift>]) -> f64 {
        0.0
    }
}

/// Tracks `E_cov` and the per-agent `E_comfort` terms incrementally,
/// combining them into the total energy with a configurable weight.
pub struct Energy {
    comfort_weight: f64,
    e_cov: f64,
    comfort_by_agent: BTreeMap<String, f64>,
}

impl Energy {
    /// Builds the tracker from scratch by scanning every slot and every
    /// agent's assignment once.
    pub fn from_scratch(plan: &Plan, comfort: &dyn ComfortPenalty, comfort_weight: f64) -> Self {
        let planned = plan.get_planned_staffing();
        let target = plan.get_target_staffing();
        let e_cov = planned
            .iter()
            .zip(target.iter())
            .map(|(p, t)| (p - t).powi(2))
            .sum();

        let mut comfort_by_agent = BTreeMap::new();
        for code in plan.agent_codes() {
            let assignment = plan.get_agent_plan(code).expect("agent_codes are always present in the plan");
            comfort_by_agent.insert(code.to_string(), comfort.penalty(assignment));
        }

        Energy {
            comfort_weight,
            e_cov,
            comfort_by_agent,
        }
    }

    pub fn total(&self) -> f64 {
        self.e_cov + self.comfort_weight * self.comfort_by_agent.values().sum::<f64>()
    }

    pub fn e_cov(&self) -> f64 {
        self.e_cov
    }

    /// Applies a `Plan::swap_agent` result: updates `E_cov` using only the
    /// touched slots, and recomputes comfort only for the swapped agent.
    pub fn apply_swap(&mut self, handle: &SwapHandle, new_assignment: &[Rc<Shift>], target: &[f64], comfort: &dyn ComfortPenalty) {
        for (&slot, &(before, after)) in &handle.touched_slots {
            let t = target[slot];
            self.e_cov += (after - t).powi(2) - (before - t).powi(2);
        }
        self.comfort_by_agent
            .insert(handle.agent.clone(), comfort.penalty(new_assignment));
    }

    /// Inverse of `apply_swap`, used when the scheduler reverts a rejected
    /// proposal: `handle.touched_slots` holds (pre-swap, post-swap) values,
    /// so reverting swaps the role of before/after.
    pub fn apply_revert(&mut self, handle: &SwapHandle, reverted_assignment: &[Rc<Shift>], target: &[f64], comfort: &dyn ComfortPenalty) {
        for (&slot, &(before, after)) in &handle.touched_slots {
            let t = target[slot];
            // after the revert, the slot value goes back from `after` to `before`.
            self.e_cov += (before - t).powi(2) - (after - t).powi(2);
        }
        self.comfort_by_agent
            .insert(handle.agent.clone(), comfort.penalty(reverted_assignment));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::target::Target;
    use crate::model::shift::Interval;
    use std::sync::Arc;

    fn work(start: u32, end: u32) -> Rc<Shift> {
        Rc::new(Shift::new("W", vec![Interval::new(start, end)]).unwrap())
    }
    fn work_coded(code: &str, start: u32, end: u32) -> Rc<Shift> {
        Rc::new(Shift::new(code, vec![Interval::new(start, end)]).unwrap())
    }
    fn rest() -> Rc<Shift> {
        Rc::new(Shift::rest("R"))
    }

    #[test]
    fn incremental_matches_from_scratch() {
        let target = Arc::new(Target::new(vec![0.5; 7 * 24], 7, 60).unwrap());
        let mut plan = Plan::new(target, 7);
        plan.insert_initial(
            "a1",
            vec![work(9 * 60, 17 * 60), rest(), rest(), rest(), rest(), rest(), rest()],
        );
        plan.insert_initial(
            "a2",
            vec![rest(), work(9 * 60, 17 * 60), rest(), rest(), rest(), rest(), rest()],
        );

        let comfort = ShiftChangeComfort;
        let mut energy = Energy::from_scratch(&plan, &comfort, 0.2);

        let new_assignment = vec![rest(), rest(), work(9 * 60, 17 * 60), rest(), rest(), rest(), rest()];
        let handle = plan.swap_agent("a1", new_assignment.clone());
        energy.apply_swap(&handle, &new_assignment, plan.get_target_staffing(), &comfort);

        let recomputed = Energy::from_scratch(&plan, &comfort, 0.2);
        assert!((energy.total() - recomputed.total()).abs() / recomputed.total().max(1.0) < 1e-9);
    }

    #[test]
    fn comfort_weight_can_dominate_coverage() {
        // Two plans with identical coverage (same interval every day) but
        // different transition counts, since "A" and "B" cover the same
        // hours and differ only in code.
        let target = Arc::new(Target::new(vec![1.0; 7 * 24], 7, 60).unwrap());
        let make_plan = |stable: bool| {
            let mut plan = Plan::new(target.clone(), 7);
            let assignment = if stable {
                vec![work_coded("A", 9 * 60, 17 * 60); 7]
            } else {
                (0..7)
                    .map(|d| {
                        if d % 2 == 0 {
                            work_coded("A", 9 * 60, 17 * 60)
                        } else {
                            work_coded("B", 9 * 60, 17 * 60)
                        }
                    })
                    .collect()
            };
            plan.insert_initial("a1", assignment);
            plan
        };
        let comfort = ShiftChangeComfort;
        let stable = Energy::from_scratch(&make_plan(true), &comfort, 1e6);
        let unstable = Energy::from_scratch(&make_plan(false), &comfort, 1e6);
        assert!(stable.total() < unstable.total());
    }
}
