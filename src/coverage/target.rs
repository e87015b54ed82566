//! Desired staffing curve (spec.md §3 "Target").

use crate::error::PlannerError;
use serde::{Deserialize, Serialize};

/// A quantised target staffing curve: `values.len() == days * (1440 /
/// slot_length_minutes)`, all non-negative, in "agents present" units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub slot_length_minutes: u32,
    pub days: u32,
    pub values: Vec<f64>,
}

impl Target {
    pub fn new(values: Vec<f64>, days: u32, slot_length_minutes: u32) -> crate::error::Result<Self> {
        if slot_length_minutes == 0 || 1440 % slot_length_minutes != 0 {
            return Err(PlannerError::Config(format!(
                "slot_length_minutes must evenly divide 1440, got {}",
                slot_length_minutes
            )));
        }
        if days == 0 {
            return Err(PlannerError::Config("days must be positive".to_string()));
        }
        let expected_len = (days as usize) * (1440 / slot_length_minutes as usize);
        if values.len() != expected_len {
            return Err(PlannerError::Config(format!(
                "target has {} values, expected {} ({} days * {} slots/day)",
                values.len(),
                expected_len,
                days,
                1440 / slot_length_minutes
            )));
        }
        if values.iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(PlannerError::Config("target values must be non-negative and finite".to_string()));
        }
        Ok(Target {
            slot_length_minutes,
            days,
            values,
        })
    }

    #[inline]
    pub fn slots_per_day(&self) -> usize {
        1440 / self.slot_length_minutes as usize
    }

    #[inline]
    pub fn total_slots(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_length_mismatch() {
        let err = Target::new(vec![1.0; 10], 7, 60).unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
    }

    #[test]
    fn rejects_negative_values() {
        let err = Target::new(vec![-1.0; 7 * 24], 7, 60).unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
    }

    #[test]
    fn accepts_well_formed_target() {
        let t = Target::new(vec![1.0; 7 * 24], 7, 60).unwrap();
        assert_eq!(t.total_slots(), 168);
    }
}
