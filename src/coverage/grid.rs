//! Quantised time-slot staffing arithmetic (spec.md §4.3).

use crate::model::shift::Shift;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Maps each slot index touched by `assignment` to the total minutes
/// (prorated, divided by the slot length) it contributes there. Each assigned
/// literal shift at day `d` contributes to slots `⌊(d*1440+s)/m⌋ ..
/// ⌊(d*1440+e-1)/m⌋` for its intervals `[s,e)`. Slots at or beyond
/// `total_slots` are discarded (the cross-midnight tail is not double-counted
/// when the caller plans with `offset_days`).
pub fn slot_contributions(assignment: &[Rc<Shift>], slot_length_minutes: u32, total_slots: usize) -> BTreeMap<usize, f64> {
    let m = slot_length_minutes as i64;
    let mut out: BTreeMap<usize, f64> = BTreeMap::new();
    for (day, shift) in assignment.iter().enumerate() {
        let day_start = day as i64 * 1440;
        for interval in &shift.intervals {
            let abs_start = day_start + interval.start as i64;
            let abs_end = day_start + interval.end as i64;
            let first_slot = abs_start.div_euclid(m);
            let last_slot = (abs_end - 1).div_euclid(m);
            for slot in first_slot..=last_slot {
                if slot < 0 {
                    continue;
                }
                let idx = slot as usize;
                if idx >= total_slots {
                    continue;
                }
                let slot_begin = slot * m;
                let slot_end = slot_begin + m;
                let overlap_start = abs_start.max(slot_begin);
                let overlap_end = abs_end.min(slot_end);
                let overlap_minutes = (overlap_end - overlap_start).max(0);
                *out.entry(idx).or_insert(0.0) += overlap_minutes as f64 / m as f64;
            }
        }
    }
    out
}

/// Adds (or, with `sign = -1.0`, removes) one agent's assignment contribution
/// to `grid`.
pub fn accumulate_contribution(grid: &mut [f64], assignment: &[Rc<Shift>], slot_length_minutes: u32, sign: f64) {
    for (idx, amount) in slot_contributions(assignment, slot_length_minutes, grid.len()) {
        grid[idx] += sign * amount;
    }
}

/// Builds a fresh coverage grid of length `total_slots` from a full set of
/// per-agent assignments.
pub fn build_grid<'a>(
    total_slots: usize,
    assignments: impl Iterator<Item = &'a Vec<Rc<Shift>>>,
    slot_length_minutes: u32,
) -> Vec<f64> {
    let mut grid = vec![0.0; total_slots];
    for assignment in assignments {
        accumulate_contribution(&mut grid, assignment, slot_length_minutes, 1.0);
    }
    grid
}
