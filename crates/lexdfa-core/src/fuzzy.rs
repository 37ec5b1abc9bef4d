//! Approximate matching within a Levenshtein error budget.
//!
//! A fuzzy walk is a depth-first traversal of configurations
//! `(state, pos, errors)`: the automaton state, how much of the query has
//! been consumed and how many edits were spent to get there. From each
//! configuration three kinds of moves are explored:
//!
//! - *horizontal*: consume `query[pos]` along its exact transition, free;
//! - *diagonal*: consume `query[pos]` along any transition, one error
//!   (substitution);
//! - *vertical*: consume `query[pos]` without moving the automaton, one
//!   error (insertion into the key).
//!
//! Deletions consume nothing from the query: every push is transitively
//! closed over all outgoing transitions at one error each, so a
//! configuration never sits on the stack with an unexpanded deletion
//! neighbourhood. Pushes past the error budget or the query end are
//! dropped.

use crate::dfa::{Dfa, State};

#[derive(Clone, Copy, Debug)]
struct FuzzyState {
    errors: usize,
    pos: usize,
    state: State,
}

/// The mutable stack of one approximate search.
///
/// Each concurrent search owns its stack; the underlying [`Dfa`] is only
/// read.
pub struct FuzzyStack<'a> {
    stack: Vec<FuzzyState>,
    dfa: &'a Dfa,
    query: Vec<u8>,
    max: usize,
}

impl FuzzyStack<'_> {
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Push `s` and, below the error budget, its whole deletion closure.
    fn push(&mut self, s: FuzzyState) {
        if s.errors < self.max {
            let dfa = self.dfa;
            for (_, target) in dfa.transitions(s.state) {
                self.push(FuzzyState {
                    errors: s.errors + 1,
                    pos: s.pos,
                    state: target,
                });
            }
        }
        if s.errors <= self.max && s.pos <= self.query.len() && s.state.is_valid() {
            self.stack.push(s);
        }
    }

    fn pop(&mut self) -> Option<FuzzyState> {
        self.stack.pop()
    }

    fn delta_diagonal(&mut self, s: FuzzyState) {
        if self.max <= s.errors || self.query.len() <= s.pos {
            return;
        }
        let dfa = self.dfa;
        for (_, target) in dfa.transitions(s.state) {
            self.push(FuzzyState {
                errors: s.errors + 1,
                pos: s.pos + 1,
                state: target,
            });
        }
    }

    fn delta_horizontal(&mut self, s: FuzzyState) {
        if self.query.len() <= s.pos {
            return;
        }
        let next = self.dfa.delta(s.state, self.query[s.pos]);
        if !next.is_valid() {
            return;
        }
        self.push(FuzzyState {
            errors: s.errors,
            pos: s.pos + 1,
            state: next,
        });
    }

    fn delta_vertical(&mut self, s: FuzzyState) {
        if self.max <= s.errors || self.query.len() <= s.pos {
            return;
        }
        self.push(FuzzyState {
            errors: s.errors + 1,
            pos: s.pos + 1,
            state: s.state,
        });
    }
}

/// Approximate matcher over a [`Dfa`] with a fixed error limit.
pub struct FuzzyDfa<'a> {
    dfa: &'a Dfa,
    k: usize,
}

impl<'a> FuzzyDfa<'a> {
    pub fn new(k: usize, dfa: &'a Dfa) -> FuzzyDfa<'a> {
        FuzzyDfa { dfa, k }
    }

    /// The maximum number of edits a match may spend.
    pub fn max_error(&self) -> usize {
        self.k
    }

    /// The initial stack for a search of `query`: the initial automaton
    /// state together with its deletion closure.
    pub fn initial(&self, query: &[u8]) -> FuzzyStack<'a> {
        let mut stack = FuzzyStack {
            stack: Vec::new(),
            dfa: self.dfa,
            query: query.to_vec(),
            max: self.k,
        };
        stack.push(FuzzyState {
            errors: 0,
            pos: 0,
            state: self.dfa.initial(),
        });
        stack
    }

    /// Expand the top of the stack once.
    ///
    /// If the popped configuration sits on a final state, `cb` receives
    /// `(errors, pos, data)`; `pos` is how much of the query the match
    /// consumed, so whole-string callers filter on `pos == query.len()`.
    /// Returns `false` once the stack is exhausted.
    pub fn delta<F>(&self, stack: &mut FuzzyStack<'_>, mut cb: F) -> bool
    where
        F: FnMut(usize, usize, u32),
    {
        let Some(top) = stack.pop() else {
            return false;
        };
        stack.delta_diagonal(top);
        stack.delta_horizontal(top);
        stack.delta_vertical(top);
        if let Some(data) = self.dfa.final_data(top.state) {
            cb(top.errors, top.pos, data);
        }
        true
    }
}
