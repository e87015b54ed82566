//! Compiles a `ShiftRule` into a deterministic finite automaton by exhaustive
//! Brzozowski differentiation, memoising states by canonical derivative term
//! (spec.md §4.2). States are stored in a flat arena, not a pointer graph
//! (Design Note "FSM transition table"), and transitions are kept sorted by
//! `(from, symbol)`.

use crate::fsm::brzozowski::{derivative, nullable, normalize};
use crate::model::rule::ShiftRule;
use crate::model::shift::Shift;
use std::collections::HashMap;
use std::rc::Rc;

/// One automaton state: the (canonical) derivative term it corresponds to,
/// whether it accepts the empty suffix, and its fan-out.
#[derive(Debug, Clone)]
pub struct DfaState {
    pub term: ShiftRule,
    pub accepting: bool,
}

/// A deterministic automaton over the alphabet of literal shift codes
/// reachable from the compiled rule.
#[derive(Debug, Clone)]
pub struct Dfa {
    pub states: Vec<DfaState>,
    /// Sorted by `(from, symbol)`, one entry per reachable `(state, symbol)`
    /// pair that doesn't dead-end.
    pub transitions: Vec<(usize, String, usize)>,
    pub alphabet: Vec<Rc<Shift>>,
    pub initial: usize,
}

impl Dfa {
    /// Compiles `rule` into a DFA. The initial state is the rule itself
    /// (canonicalised); accepting states are nullable derivatives.
    pub fn compile(rule: &ShiftRule) -> Self {
        let alphabet: Vec<Rc<Shift>> = rule.shifts().into_iter().collect();

        let mut state_index: HashMap<ShiftRule, usize> = HashMap::new();
        let mut states: Vec<DfaState> = Vec::new();
        let mut transitions: Vec<(usize, String, usize)> = Vec::new();

        let root = normalize(rule.clone());
        let root_id = intern(&mut state_index, &mut states, root);

        let mut frontier = vec![root_id];
        while let Some(state_id) = frontier.pop() {
            let term = states[state_id].term.clone();
            for shift in &alphabet {
                let next_term = derivative(&term, &shift.code);
                if matches!(next_term, ShiftRule::Fail) {
                    continue;
                }
                let is_new = !state_index.contains_key(&next_term);
                let next_id = intern(&mut state_index, &mut states, next_term);
                transitions.push((state_id, shift.code.clone(), next_id));
                if is_new {
                    frontier.push(next_id);
                }
            }
        }

        transitions.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

        Dfa {
            states,
            transitions,
            alphabet,
            initial: root_id,
        }
    }

    /// Outgoing transitions from `state_id`, already sorted by symbol since
    /// the global table is sorted by `(from, symbol)`.
    pub fn transitions_from(&self, state_id: usize) -> impl Iterator<Item = (&str, usize)> {
        let start = self.transitions.partition_point(|(from, _, _)| *from < state_id);
        self.transitions[start..]
            .iter()
            .take_while(move |(from, _, _)| *from == state_id)
            .map(|(_, sym, to)| (sym.as_str(), *to))
    }

    pub fn is_accepting(&self, state_id: usize) -> bool {
        self.states[state_id].accepting
    }

    /// Textual dump of states, transitions and accept flags, consumed by an
    /// external diagram emitter (spec §6). Not a rendering of the diagram
    /// itself; that collaborator is out of scope.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (id, state) in self.states.iter().enumerate() {
            out.push_str(&format!("state {} accepting={}\n", id, state.accepting));
        }
        for (from, sym, to) in &self.transitions {
            out.push_str(&format!("{} -{}-> {}\n", from, sym, to));
        }
        out
    }
}

fn intern(index: &mut HashMap<ShiftRule, usize>, states: &mut Vec<DfaState>, term: ShiftRule) -> usize {
    if let Some(&id) = index.get(&term) {
        return id;
    }
    let id = states.len();
    states.push(DfaState {
        accepting: nullable(&term),
        term: term.clone(),
    });
    index.insert(term, id);
    id
}
