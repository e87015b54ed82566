//! The `ShiftRule` algebra (spec.md §3, §4.1): literals, same-day choice,
//! day-concatenation, and bounded repetition, built into a tree.

use crate::error::PlannerError;
use crate::model::shift::Shift;
use std::collections::BTreeSet;
use std::rc::Rc;

/// A regular-expression-like term over daily `Shift`s. Leaves are literals;
/// `Choice` is same-day alternation, `Concat` is next-day sequencing, `Star`
/// is zero-or-more day repetition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShiftRule {
    /// Matches only the zero-day (empty) word. The concatenation identity.
    Epsilon,
    /// Matches no word at all. Never constructed by the public algebra; it
    /// only ever arises as a Brzozowski derivative (e.g. `d/da(rest)`).
    Fail,
    Literal(Rc<Shift>),
    Choice(Rc<ShiftRule>, Rc<ShiftRule>),
    Concat(Rc<ShiftRule>, Rc<ShiftRule>),
    Star(Rc<ShiftRule>),
}

impl ShiftRule {
    /// Constructs a literal rule for a single shift.
    pub fn literal(shift: Shift) -> Self {
        ShiftRule::Literal(Rc::new(shift))
    }

    /// Same-day alternative assignment (union). Requires that the two sides'
    /// reachable literal codes are either disjoint or textually identical,
    /// so no two different atoms share a code.
    pub fn choice(a: ShiftRule, b: ShiftRule) -> crate::error::Result<Self> {
        let codes_a = a.shift_codes();
        let codes_b = b.shift_codes();
        for code in codes_a.intersection(&codes_b) {
            let lit_a = a.literal_with_code(code);
            let lit_b = b.literal_with_code(code);
            if lit_a != lit_b {
                return Err(PlannerError::Config(format!(
                    "choice operands both define distinct shifts with code '{}'",
                    code
                )));
            }
        }
        Ok(ShiftRule::Choice(Rc::new(a), Rc::new(b)))
    }

    /// Next-day sequencing (concatenation). Unconstrained.
    pub fn concat(a: ShiftRule, b: ShiftRule) -> Self {
        ShiftRule::Concat(Rc::new(a), Rc::new(b))
    }

    /// Zero-or-more day repetitions.
    pub fn star(a: ShiftRule) -> Self {
        ShiftRule::Star(Rc::new(a))
    }

    /// `a ** n`: `a` concatenated with itself `n` times. `n == 0` yields the
    /// rule accepting only the empty (zero-day) word.
    pub fn repeat(a: &ShiftRule, n: usize) -> Self {
        if n == 0 {
            return ShiftRule::Epsilon;
        }
        let mut acc = a.clone();
        for _ in 1..n {
            acc = ShiftRule::concat(acc, a.clone());
        }
        acc
    }

    /// The set of literal shifts reachable from this rule.
    pub fn shifts(&self) -> BTreeSet<Rc<Shift>> {
        let mut out = BTreeSetShifts::new();
        self.collect_shifts(&mut out);
        out.0
    }

    fn collect_shifts(&self, out: &mut BTreeSetShifts) {
        match self {
            ShiftRule::Epsilon | ShiftRule::Fail => {}
            ShiftRule::Literal(s) => {
                out.0.insert(s.clone());
            }
            ShiftRule::Choice(a, b) | ShiftRule::Concat(a, b) => {
                a.collect_shifts(out);
                b.collect_shifts(out);
            }
            ShiftRule::Star(a) => a.collect_shifts(out),
        }
    }

    fn shift_codes(&self) -> BTreeSet<String> {
        self.shifts().iter().map(|s| s.code.clone()).collect()
    }

    fn literal_with_code(&self, code: &str) -> Option<Rc<Shift>> {
        self.shifts().into_iter().find(|s| s.code == code)
    }

    /// `offset_days` of a rule: `max(end_of_each_literal) div 1440`, used to
    /// extend a `Plan`'s length so cross-midnight tails fit.
    pub fn offset_days(&self) -> u32 {
        self.shifts().iter().map(|s| s.offset_days()).max().unwrap_or(0)
    }
}

/// Newtype so `Rc<Shift>` can be ordered for the `BTreeSet` by `(code,
/// intervals)` rather than by pointer identity.
struct BTreeSetShifts(BTreeSet<Rc<Shift>>);
impl BTreeSetShifts {
    fn new() -> Self {
        BTreeSetShifts(BTreeSet::new())
    }
}

impl PartialOrd for Shift {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Shift {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.code, &self.intervals).cmp(&(&other.code, &other.intervals))
    }
}
