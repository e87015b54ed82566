//! Uniform-by-counting sampler over the accepted words of a fixed length
//! (spec.md §4.2). `N[q][l]` is the number of accepting words of length
//! exactly `l` starting from state `q`; the next symbol is chosen with
//! probability `N[delta(q,a)][l-1] / N[q][l]`.

use crate::error::PlannerError;
use crate::fsm::compiler::Dfa;
use crate::model::shift::Shift;
use crate::random::RandomSource;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::rc::Rc;

/// A sampler bound to one compiled `Dfa`, with the `N[q][l]` table
/// precomputed up to `max_len`.
pub struct Sampler {
    dfa: Dfa,
    /// `counts[l][q]` = number of accepting words of length `l` from state `q`.
    counts: Vec<Vec<BigUint>>,
    max_len: usize,
}

impl Sampler {
    /// Builds the sampler for `dfa`, precomputing counts for every length in
    /// `0..=max_len`.
    pub fn new(dfa: Dfa, max_len: usize) -> Self {
        let n_states = dfa.states.len();
        let mut counts: Vec<Vec<BigUint>> = Vec::with_capacity(max_len + 1);
        let base: Vec<BigUint> = (0..n_states)
            .map(|q| if dfa.is_accepting(q) { BigUint::one() } else { BigUint::zero() })
            .collect();
        counts.push(base);

        for l in 1..=max_len {
            let mut row = vec![BigUint::zero(); n_states];
            for q in 0..n_states {
                let mut total = BigUint::zero();
                for (_, to) in dfa.transitions_from(q) {
                    total += &counts[l - 1][to];
                }
                row[q] = total;
            }
            counts.push(row);
        }

        Sampler { dfa, counts, max_len }
    }

    /// Number of accepted words of length `len` from the initial state.
    pub fn accepting_count(&self, len: usize) -> &BigUint {
        &self.counts[len][self.dfa.initial]
    }

    /// Draws one uniformly-random accepted word of length `len`, or
    /// `UnsatisfiableRule` if none exists.
    pub fn sample(&self, rng: &mut dyn RandomSource, len: usize, agent: &str) -> crate::error::Result<Vec<Rc<Shift>>> {
        assert!(len <= self.max_len, "sampler was not precomputed for this length");
        if self.accepting_count(len).is_zero() {
            return Err(PlannerError::UnsatisfiableRule {
                agent: agent.to_string(),
                horizon: len,
            });
        }

        let shift_by_code: std::collections::HashMap<&str, Rc<Shift>> =
            self.dfa.alphabet.iter().map(|s| (s.code.as_str(), s.clone())).collect();

        let mut state = self.dfa.initial;
        let mut remaining = len;
        let mut word = Vec::with_capacity(len);

        while remaining > 0 {
            let total = &self.counts[remaining][state];
            let mut draw = rng.next_uniform_biguint(total);
            let mut chosen: Option<(&str, usize)> = None;
            for (symbol, to) in self.dfa.transitions_from(state) {
                let weight = &self.counts[remaining - 1][to];
                if &draw < weight {
                    chosen = Some((symbol, to));
                    break;
                }
                draw -= weight;
            }
            let (symbol, to) = chosen.expect("counts invariant guarantees a transition covers the draw");
            word.push(shift_by_code.get(symbol).expect("alphabet contains every transition symbol").clone());
            state = to;
            remaining -= 1;
        }

        Ok(word)
    }

    /// Draws `n` independent samples of length `len`, each uniformly and
    /// independently over the accepted words (spec §9 Design Note; grounded
    /// on `pywfplan/fsm.py`'s `Fsm.samples(n)` convenience). Used by tests and
    /// by the annealing scheduler's initial-temperature calibration batch
    /// (spec §4.6).
    pub fn samples(&self, rng: &mut dyn RandomSource, len: usize, agent: &str, n: usize) -> crate::error::Result<Vec<Vec<Rc<Shift>>>> {
        (0..n).map(|_| self.sample(rng, len, agent)).collect()
    }
}
