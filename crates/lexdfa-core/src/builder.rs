//! Incremental construction of a minimized DFA from sorted keys.
//!
//! The builder keeps one staging state per prefix length of the key most
//! recently added. When the next key arrives, everything past the common
//! prefix of the two keys can never change again, so those suffix states
//! are finalized bottom-up into the sparse table. A register maps each
//! finalized state's shape (final flag, data, transition list) to its
//! table index; a suffix state equal to one already in the table reuses
//! that index instead of allocating. Equal subtrees therefore collapse as
//! they are emitted, and the finished automaton is minimal without a
//! separate minimization pass.
//!
//! Keys must arrive in strictly ascending byte order. That order is what
//! guarantees each staging state's transition list is itself ascending:
//! a new transition at depth `i` always carries a byte strictly greater
//! than the last one appended at that depth.

use crate::dfa::{Dfa, State};
use crate::table::{SparseTable, TmpState, TmpTransition};
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("keys not in lexicographical order: {:?} >= {:?}",
        String::from_utf8_lossy(prev), String::from_utf8_lossy(next))]
    OutOfOrder { prev: Vec<u8>, next: Vec<u8> },
}

/// Builds a minimized sparse-table DFA from `(key, value)` pairs added in
/// strictly ascending key order.
pub struct Builder {
    register: FxHashMap<TmpState, u32>,
    table: SparseTable,
    tmp: Vec<TmpState>,
    cur_key: Option<Vec<u8>>,
    cur_val: u32,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            register: FxHashMap::default(),
            table: SparseTable::default(),
            tmp: Vec::new(),
            cur_key: None,
            cur_val: 0,
        }
    }

    /// Stage `key` with its associated value.
    ///
    /// The previous key's unshared suffix is finalized into the table.
    /// Fails if `key` is not strictly greater than the previous key;
    /// equal keys are rejected as well.
    pub fn add(&mut self, key: &[u8], value: u32) -> Result<(), BuildError> {
        match self.cur_key.take() {
            None => {
                self.cur_key = Some(key.to_vec());
                self.cur_val = value;
            }
            Some(cur) => {
                if cur.as_slice() >= key {
                    let prev = cur.clone();
                    self.cur_key = Some(cur);
                    return Err(BuildError::OutOfOrder {
                        prev,
                        next: key.to_vec(),
                    });
                }
                self.seal_final(cur.len());
                let prefix = common_prefix(&cur, key);
                self.flush_suffix(&cur, prefix);
                self.cur_key = Some(key.to_vec());
                self.cur_val = value;
            }
        }
        Ok(())
    }

    /// Finalize the last key and emit the initial state.
    ///
    /// An empty builder yields the empty automaton.
    pub fn build(mut self) -> Dfa {
        let Some(cur) = self.cur_key.take() else {
            return Dfa::default();
        };
        self.seal_final(cur.len());
        self.flush_suffix(&cur, 0);
        let initial = self.table.add(&self.tmp[0]);
        log::debug!(
            "built dfa: {} cells, {} states",
            self.table.cells().len(),
            self.register.len() + 1
        );
        Dfa::from_parts(self.table.into_cells(), State(initial))
    }

    /// Mark the staging state at depth `n` as accepting the current key.
    fn seal_final(&mut self, n: usize) {
        if self.tmp.len() < n + 1 {
            self.tmp.resize_with(n + 1, TmpState::default);
        }
        self.tmp[n].is_final = true;
        self.tmp[n].data = self.cur_val;
    }

    /// Finalize the staging states for `key` below depth `prefix`,
    /// bottom-up, linking each into its parent.
    fn flush_suffix(&mut self, key: &[u8], prefix: usize) {
        for i in (prefix + 1..=key.len()).rev() {
            let tmp = std::mem::take(&mut self.tmp[i]);
            let target = self.replace_or_register(tmp);
            self.tmp[i - 1].transitions.push(TmpTransition {
                ch: key[i - 1],
                target,
            });
        }
    }

    fn replace_or_register(&mut self, tmp: TmpState) -> u32 {
        if let Some(&target) = self.register.get(&tmp) {
            return target;
        }
        let target = self.table.add(&tmp);
        self.register.insert(tmp, target);
        target
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts(dfa: &Dfa, key: &[u8]) -> bool {
        let mut s = dfa.initial();
        for &c in key {
            s = dfa.delta(s, c);
        }
        dfa.final_data(s).is_some()
    }

    fn state_count(dfa: &Dfa) -> usize {
        dfa.cells().iter().filter(|c| c.is_state()).count()
    }

    #[test]
    fn test_rejects_unordered_keys() {
        let mut b = Builder::new();
        b.add(b"b", 1).unwrap();
        let err = b.add(b"a", 1).unwrap_err();
        assert!(matches!(err, BuildError::OutOfOrder { .. }));
        assert!(err.to_string().contains("lexicographical order"));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let mut b = Builder::new();
        b.add(b"a", 1).unwrap();
        assert!(b.add(b"a", 2).is_err());
    }

    #[test]
    fn test_failed_add_keeps_builder_usable() {
        let mut b = Builder::new();
        b.add(b"b", 1).unwrap();
        b.add(b"a", 2).unwrap_err();
        b.add(b"c", 3).unwrap();
        let dfa = b.build();
        assert!(accepts(&dfa, b"b"));
        assert!(accepts(&dfa, b"c"));
        assert!(!accepts(&dfa, b"a"));
    }

    #[test]
    fn test_empty_builder() {
        let dfa = Builder::new().build();
        assert!(!dfa.initial().is_valid());
        assert!(!accepts(&dfa, b""));
        assert!(!accepts(&dfa, b"a"));
    }

    #[test]
    fn test_empty_key_is_final_initial() {
        let mut b = Builder::new();
        b.add(b"", 17).unwrap();
        let dfa = b.build();
        assert!(dfa.initial().is_valid());
        assert_eq!(dfa.final_data(dfa.initial()), Some(17));
        assert!(!accepts(&dfa, b"a"));
    }

    #[test]
    fn test_values_come_back_out() {
        let mut b = Builder::new();
        b.add(b"ab", 3).unwrap();
        b.add(b"ac", 4).unwrap();
        b.add(b"b", 5).unwrap();
        let dfa = b.build();
        let walk = |key: &[u8]| {
            let mut s = dfa.initial();
            for &c in key {
                s = dfa.delta(s, c);
            }
            dfa.final_data(s)
        };
        assert_eq!(walk(b"ab"), Some(3));
        assert_eq!(walk(b"ac"), Some(4));
        assert_eq!(walk(b"b"), Some(5));
        assert_eq!(walk(b"a"), None);
    }

    #[test]
    fn test_suffix_sharing_is_minimal() {
        // "ab" and "bb" end in equivalent states, so the minimal automaton
        // has initial, one shared middle and one shared final state.
        let dfa = Dfa::from_dictionary(["ab", "bb"]).unwrap();
        assert_eq!(state_count(&dfa), 3);
    }

    #[test]
    fn test_repeated_builds_agree() {
        let keys = ["abcabc", "abcde", "ddeabc", "floabc", "very-long-string"];
        let a = Dfa::from_dictionary(keys).unwrap();
        let b = Dfa::from_dictionary(keys).unwrap();
        assert_eq!(a.cells().len(), b.cells().len());
        assert_eq!(state_count(&a), state_count(&b));
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(b"", b"a"), 0);
        assert_eq!(common_prefix(b"abc", b"abd"), 2);
        assert_eq!(common_prefix(b"ab", b"abc"), 2);
        assert_eq!(common_prefix(b"xa", b"ya"), 0);
    }
}
