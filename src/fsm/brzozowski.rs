//! Brzozowski derivatives of a `ShiftRule`, canonicalised so structurally
//! equivalent terms (modulo associativity/commutativity/idempotence of
//! `Choice` and the identities of `Epsilon`/`Fail`) hash and compare equal.

use crate::model::rule::ShiftRule;
use std::collections::BTreeSet;
use std::rc::Rc;

/// True iff `term` accepts the empty (zero-day) word.
pub fn nullable(term: &ShiftRule) -> bool {
    match term {
        ShiftRule::Epsilon | ShiftRule::Star(_) => true,
        ShiftRule::Fail | ShiftRule::Literal(_) => false,
        ShiftRule::Choice(a, b) => nullable(a) || nullable(b),
        ShiftRule::Concat(a, b) => nullable(a) && nullable(b),
    }
}

/// The Brzozowski derivative of `term` with respect to one day assigned the
/// shift with code `code`, already reduced to canonical form.
pub fn derivative(term: &ShiftRule, code: &str) -> ShiftRule {
    normalize(raw_derivative(term, code))
}

fn raw_derivative(term: &ShiftRule, code: &str) -> ShiftRule {
    match term {
        ShiftRule::Epsilon | ShiftRule::Fail => ShiftRule::Fail,
        ShiftRule::Literal(s) => {
            if s.code == code {
                ShiftRule::Epsilon
            } else {
                ShiftRule::Fail
            }
        }
        ShiftRule::Choice(a, b) => {
            ShiftRule::Choice(Rc::new(raw_derivative(a, code)), Rc::new(raw_derivative(b, code)))
        }
        ShiftRule::Concat(a, b) => {
            let da_b = ShiftRule::Concat(Rc::new(raw_derivative(a, code)), b.clone());
            if nullable(a) {
                ShiftRule::Choice(Rc::new(da_b), Rc::new(raw_derivative(b, code)))
            } else {
                da_b
            }
        }
        ShiftRule::Star(a) => ShiftRule::Concat(Rc::new(raw_derivative(a, code)), Rc::new(ShiftRule::Star(a.clone()))),
    }
}

/// Reduces a term to canonical form: flattens nested `Choice`, dedupes and
/// sorts its members, drops `Fail` members, collapses `Epsilon`/`Fail`
/// identities under `Concat` and `Star`.
pub fn normalize(term: ShiftRule) -> ShiftRule {
    match term {
        ShiftRule::Epsilon => ShiftRule::Epsilon,
        ShiftRule::Fail => ShiftRule::Fail,
        ShiftRule::Literal(s) => ShiftRule::Literal(s),
        ShiftRule::Star(a) => match normalize((*a).clone()) {
            ShiftRule::Epsilon | ShiftRule::Fail => ShiftRule::Epsilon,
            ShiftRule::Star(inner) => ShiftRule::Star(inner),
            other => ShiftRule::Star(Rc::new(other)),
        },
        ShiftRule::Concat(a, b) => {
            let na = normalize((*a).clone());
            let nb = normalize((*b).clone());
            match (&na, &nb) {
                (ShiftRule::Fail, _) | (_, ShiftRule::Fail) => ShiftRule::Fail,
                (ShiftRule::Epsilon, _) => nb,
                (_, ShiftRule::Epsilon) => na,
                _ => ShiftRule::Concat(Rc::new(na), Rc::new(nb)),
            }
        }
        ShiftRule::Choice(a, b) => {
            let na = normalize((*a).clone());
            let nb = normalize((*b).clone());
            let mut members: BTreeSet<ShiftRule> = BTreeSet::new();
            collect_choice_members(na, &mut members);
            collect_choice_members(nb, &mut members);
            members.remove(&ShiftRule::Fail);
            match members.len() {
                0 => ShiftRule::Fail,
                1 => members.into_iter().next().unwrap(),
                _ => {
                    let mut it = members.into_iter().rev();
                    let first = it.next().unwrap();
                    it.fold(first, |acc, x| ShiftRule::Choice(Rc::new(x), Rc::new(acc)))
                }
            }
        }
    }
}

fn collect_choice_members(term: ShiftRule, out: &mut BTreeSet<ShiftRule>) {
    match term {
        ShiftRule::Choice(a, b) => {
            collect_choice_members((*a).clone(), out);
            collect_choice_members((*b).clone(), out);
        }
        other => {
            out.insert(other);
        }
    }
}
