//! Read-only queries over a finished sparse-table automaton.

use crate::builder::{BuildError, Builder};
use crate::cell::Cell;
use thiserror::Error;

/// Index of the active cell in the automaton's table.
///
/// All query operations are total: anything that cannot advance returns
/// [`State::INVALID`], and every operation on an invalid state is a no-op,
/// so transition lookups compose without error handling.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct State(pub(crate) u32);

impl State {
    pub const INVALID: State = State(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DfaError {
    /// A transition chain contains a byte that cannot start or continue a
    /// well-formed UTF-8 sequence.
    #[error("invalid utf-8 byte 0x{byte:02x} in transition chain")]
    InvalidUtf8 { byte: u8 },
}

/// A minimized, immutable DFA over byte strings.
///
/// Obtained from [`Builder::build`]; owns its cell table exclusively.
/// Queries only read, so one `Dfa` may serve any number of concurrent
/// exact or approximate searches.
#[derive(Debug)]
pub struct Dfa {
    table: Vec<Cell>,
    initial: State,
}

impl Default for Dfa {
    /// The empty automaton: no cells, invalid initial state, accepts nothing.
    fn default() -> Dfa {
        Dfa {
            table: Vec::new(),
            initial: State::INVALID,
        }
    }
}

// Expected byte length of a UTF-8 sequence by the high nibble of its
// leading byte; 0 marks continuation bytes.
const UTF8_LEN: [usize; 16] = [1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 2, 2, 3, 4];

#[inline]
fn is_continuation(c: u8) -> bool {
    c & 0xc0 == 0x80
}

impl Dfa {
    pub(crate) fn from_parts(table: Vec<Cell>, initial: State) -> Dfa {
        Dfa { table, initial }
    }

    /// Build a DFA from a dictionary of keys in any order, each mapped to
    /// the value 1. Keys are sorted before insertion; duplicates fail.
    pub fn from_dictionary<I, S>(keys: I) -> Result<Dfa, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut keys: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        keys.sort();
        let mut builder = Builder::new();
        for key in &keys {
            builder.add(key, 1)?;
        }
        Ok(builder.build())
    }

    #[inline]
    pub fn initial(&self) -> State {
        self.initial
    }

    pub fn cells(&self) -> &[Cell] {
        &self.table
    }

    /// One transition step from `s` on byte `c` in constant time.
    #[inline]
    pub fn delta(&self, s: State, c: u8) -> State {
        let n = self.table.len();
        if !s.is_valid() || s.index() >= n || !self.table[s.index()].is_state() {
            return State::INVALID;
        }
        let pos = s.index() + c as usize;
        if pos >= n {
            return State::INVALID;
        }
        let cell = self.table[pos];
        if !cell.is_transition() || cell.ch() != c {
            return State::INVALID;
        }
        State(cell.target())
    }

    /// The value stored at `s` if it is a final state.
    #[inline]
    pub fn final_data(&self, s: State) -> Option<u32> {
        if !s.is_valid() || s.index() >= self.table.len() {
            return None;
        }
        let cell = self.table[s.index()];
        if cell.is_final() {
            Some(cell.data())
        } else {
            None
        }
    }

    /// Iterate the outgoing transitions of `s` in ascending byte order.
    ///
    /// Walks the linked chain of label offsets instead of probing all 256
    /// slots. Yields nothing for invalid or non-state inputs.
    pub fn transitions(&self, s: State) -> Transitions<'_> {
        let off = if s.is_valid() && s.index() < self.table.len() && self.table[s.index()].is_state()
        {
            self.table[s.index()].next()
        } else {
            0
        };
        Transitions {
            table: &self.table,
            pos: s.index(),
            off,
        }
    }

    /// Callback form of [`Dfa::transitions`].
    pub fn each_transition<F: FnMut(u8, State)>(&self, s: State, mut f: F) {
        for (c, target) in self.transitions(s) {
            f(c, target);
        }
    }

    /// Iterate the outgoing edges of `s` by Unicode code point.
    ///
    /// Follows chains of continuation-byte cells until a full scalar is
    /// assembled, then reports it with the state the last byte leads to.
    /// A byte that cannot lead a sequence, or a chain that does not decode,
    /// aborts the iteration.
    pub fn each_utf8_transition<F>(&self, s: State, f: &mut F) -> Result<(), DfaError>
    where
        F: FnMut(char, State),
    {
        for (c, target) in self.transitions(s) {
            let mut buf = [0u8; 4];
            buf[0] = c;
            match UTF8_LEN[(c >> 4) as usize] {
                0 => return Err(DfaError::InvalidUtf8 { byte: c }),
                1 => f(c as char, target),
                len => self.fold_utf8(&mut buf, 1, len, target, f)?,
            }
        }
        Ok(())
    }

    fn fold_utf8<F>(
        &self,
        buf: &mut [u8; 4],
        i: usize,
        len: usize,
        s: State,
        f: &mut F,
    ) -> Result<(), DfaError>
    where
        F: FnMut(char, State),
    {
        for (c, target) in self.transitions(s) {
            if !is_continuation(c) {
                // A fresh start byte under a shared state belongs to some
                // other code point's chain.
                continue;
            }
            buf[i] = c;
            if i + 1 == len {
                match std::str::from_utf8(&buf[..len]) {
                    // from_utf8 on a non-empty valid slice yields a char.
                    Ok(seq) => f(seq.chars().next().unwrap(), target),
                    Err(_) => return Err(DfaError::InvalidUtf8 { byte: c }),
                }
            } else {
                self.fold_utf8(buf, i + 1, len, target, f)?;
            }
        }
        Ok(())
    }
}

/// Iterator over `(label, destination)` pairs of one state's transitions.
pub struct Transitions<'a> {
    table: &'a [Cell],
    pos: usize,
    off: u8,
}

impl Iterator for Transitions<'_> {
    type Item = (u8, State);

    fn next(&mut self) -> Option<(u8, State)> {
        if self.off == 0 {
            return None;
        }
        self.pos += self.off as usize;
        debug_assert!(self.pos < self.table.len());
        let cell = self.table[self.pos];
        debug_assert!(cell.is_transition(), "chain points at {:?}", cell);
        self.off = cell.next();
        Some((cell.ch(), State(cell.target())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEYS: [&str; 7] = [
        "",
        "abcde",
        "very-long-string",
        "some-non-ascii-chars-ü-äåÅßß",
        "abcabc",
        "ddeabc",
        "floabc",
    ];

    fn accepts(dfa: &Dfa, key: &str) -> bool {
        let mut s = dfa.initial();
        for &c in key.as_bytes() {
            if !s.is_valid() {
                break;
            }
            s = dfa.delta(s, c);
        }
        dfa.final_data(s).is_some()
    }

    #[test]
    fn test_empty_dfa() {
        let dfa = Dfa::default();
        assert!(!dfa.initial().is_valid());
        for key in TEST_KEYS {
            assert!(!accepts(&dfa, key), "empty dfa accepts {key:?}");
        }
    }

    #[test]
    fn test_single_entry() {
        for key in TEST_KEYS {
            let dfa = Dfa::from_dictionary([key]).unwrap();
            for probe in TEST_KEYS {
                assert_eq!(
                    accepts(&dfa, probe),
                    probe == key,
                    "dict {{{key:?}}} probed with {probe:?}"
                );
            }
        }
    }

    #[test]
    fn test_dictionary_roundtrip() {
        let dfa = Dfa::from_dictionary(TEST_KEYS).unwrap();
        for key in TEST_KEYS {
            assert!(accepts(&dfa, key), "dfa does not accept {key:?}");
        }
        for probe in ["abc", "abcd", "abcdef"] {
            assert!(!accepts(&dfa, probe), "dfa accepts {probe:?}");
        }
    }

    #[test]
    fn test_initial_transitions() {
        let dfa = Dfa::from_dictionary(TEST_KEYS).unwrap();
        let labels: Vec<u8> = dfa.transitions(dfa.initial()).map(|(c, _)| c).collect();
        assert_eq!(labels, vec![b'a', b'd', b'f', b's', b'v']);
    }

    #[test]
    fn test_enumeration_matches_delta() {
        let dfa = Dfa::from_dictionary(TEST_KEYS).unwrap();
        for (i, cell) in dfa.cells().iter().enumerate() {
            if !cell.is_state() {
                continue;
            }
            let s = State(i as u32);
            let mut last: Option<u8> = None;
            let mut enumerated = Vec::new();
            for (c, target) in dfa.transitions(s) {
                if let Some(prev) = last {
                    assert!(prev < c, "labels out of order at state {i}");
                }
                last = Some(c);
                enumerated.push(c);
                assert_eq!(dfa.delta(s, c), target);
            }
            for c in 0..=255u8 {
                let via_delta = dfa.delta(s, c).is_valid();
                assert_eq!(
                    via_delta,
                    enumerated.contains(&c),
                    "state {i} disagrees on byte {c}"
                );
            }
        }
    }

    #[test]
    fn test_delta_rejects_garbage() {
        let dfa = Dfa::from_dictionary(["ab"]).unwrap();
        assert!(!dfa.delta(State::INVALID, b'a').is_valid());
        assert!(!dfa.delta(State(9999), b'a').is_valid());
        // A transition cell is not a state.
        let s = dfa.initial();
        let t = State(s.0 + b'a' as u32);
        assert!(!dfa.delta(t, b'b').is_valid());
        assert_eq!(dfa.final_data(State::INVALID), None);
    }

    #[test]
    fn test_utf8_transitions() {
        let dfa = Dfa::from_dictionary(["ab", "aü", "a€"]).unwrap();
        let s = dfa.delta(dfa.initial(), b'a');
        assert!(s.is_valid());
        let mut seen = Vec::new();
        dfa.each_utf8_transition(s, &mut |r, target| {
            seen.push(r);
            assert!(target.is_valid());
        })
        .unwrap();
        seen.sort();
        assert_eq!(seen, vec!['b', 'ü', '€']);
    }

    #[test]
    fn test_utf8_transitions_follow_to_final() {
        let dfa = Dfa::from_dictionary(["€"]).unwrap();
        let mut hits = 0;
        dfa.each_utf8_transition(dfa.initial(), &mut |r, target| {
            assert_eq!(r, '€');
            assert_eq!(dfa.final_data(target), Some(1));
            hits += 1;
        })
        .unwrap();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_random_dictionary() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz\
                                ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                                äöüßÄÖÜ,.~[]{}():!? ";
        let chars: Vec<char> = ALPHABET.chars().collect();
        let seed = 0xc0ffee;
        let mut rng = StdRng::seed_from_u64(seed);
        let random_key = |rng: &mut StdRng| -> String {
            let n = rng.gen_range(0..100);
            (0..n).map(|_| chars[rng.gen_range(0..chars.len())]).collect()
        };

        let mut keys: Vec<String> = (0..100).map(|_| random_key(&mut rng)).collect();
        keys.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
        keys.dedup();
        let dfa = Dfa::from_dictionary(&keys).unwrap();

        for key in &keys {
            assert!(accepts(&dfa, key), "missing {key:?} (seed {seed})");
        }
        for _ in 0..10_000 {
            let probe = random_key(&mut rng);
            assert_eq!(
                accepts(&dfa, &probe),
                keys.binary_search(&probe).is_ok(),
                "probe {probe:?} (seed {seed})"
            );
        }
    }
}
