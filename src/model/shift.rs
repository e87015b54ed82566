//! The atomic daily work-or-rest assignment (spec.md §3 "Shift").

use crate::error::PlannerError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open minute interval `[start, end)` within an extended day.
/// `end` may exceed 1440 when the shift spills into the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn new(start: u32, end: u32) -> Self {
        Interval { start, end }
    }

    #[inline]
    pub fn len_minutes(&self) -> u32 {
        self.end - self.start
    }
}

/// An atomic daily shift: a code, a work/rest flag, and (if work) a sorted,
/// non-overlapping list of minute intervals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shift {
    pub code: String,
    pub intervals: Vec<Interval>,
}

impl Shift {
    /// Constructs a work shift. `intervals` must be sorted and non-overlapping;
    /// this is checked and reported as `PlannerError::Config` rather than assumed.
    pub fn new(code: impl Into<String>, intervals: Vec<Interval>) -> crate::error::Result<Self> {
        let code = code.into();
        for w in intervals.windows(2) {
            if w[1].start < w[0].end {
                return Err(PlannerError::Config(format!(
                    "shift '{}' has overlapping or unsorted intervals {:?}",
                    code, intervals
                )));
            }
        }
        Ok(Shift { code, intervals })
    }

    /// Constructs a rest shift (no intervals).
    pub fn rest(code: impl Into<String>) -> Self {
        Shift {
            code: code.into(),
            intervals: Vec::new(),
        }
    }

    #[inline]
    pub fn is_work(&self) -> bool {
        !self.intervals.is_empty()
    }

    /// Parses `"HH:MM-HH:MM, HH:MM-HH:MM"` into structured intervals. Whitespace
    /// is ignored, commas separate intervals, an empty string means rest.
    /// This mirrors the external shift-spec parser (spec §6); the core only
    /// ever consumes the structured intervals it returns.
    pub fn from_spec(code: impl Into<String>, spec: &str) -> crate::error::Result<Self> {
        let code = code.into();
        let trimmed: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
        if trimmed.is_empty() {
            return Ok(Shift::rest(code));
        }
        let mut intervals = Vec::new();
        for token in trimmed.split(',') {
            intervals.push(parse_interval(token).map_err(|_| {
                PlannerError::Parse(format!("invalid shift specification '{}'", token))
            })?);
        }
        Shift::new(code, intervals)
    }

    /// Start time-of-day of the first interval, for a literal work shift.
    pub fn start_time(&self) -> Option<NaiveTime> {
        self.intervals.first().map(|i| minute_of_day_to_time(i.start))
    }

    /// End time-of-day of the last interval, for a literal work shift. Times
    /// at or beyond 24:00 wrap modulo 1440 (the day the shift spills into).
    pub fn end_time(&self) -> Option<NaiveTime> {
        self.intervals.last().map(|i| minute_of_day_to_time(i.end))
    }

    /// Day offset (0-based) contributed by this literal, i.e. how many whole
    /// days its latest interval spills past the nominal day boundary.
    pub fn offset_days(&self) -> u32 {
        self.intervals
            .iter()
            .map(|i| i.end.saturating_sub(1) / 1440)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

fn minute_of_day_to_time(minutes: u32) -> NaiveTime {
    let m = minutes % 1440;
    NaiveTime::from_hms_opt(m / 60, m % 60, 0).expect("minute-of-day is always in range")
}

fn parse_interval(token: &str) -> std::result::Result<Interval, ()> {
    let (a, b) = token.split_once('-').ok_or(())?;
    let start = parse_hhmm(a)?;
    let end = parse_hhmm(b)?;
    if end <= start {
        return Err(());
    }
    Ok(Interval::new(start, end))
}

fn parse_hhmm(s: &str) -> std::result::Result<u32, ()> {
    let (h, m) = s.split_once(':').ok_or(())?;
    let h: u32 = h.parse().map_err(|_| ())?;
    let m: u32 = m.parse().map_err(|_| ())?;
    if h > 23 || m > 59 {
        return Err(());
    }
    Ok(h * 60 + m)
}
