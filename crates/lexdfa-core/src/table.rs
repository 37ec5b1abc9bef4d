//! Sparse transition table.
//!
//! States and their outgoing transitions share one flat cell array: a state
//! placed at index `i` keeps its transition for byte `c` at index `i + c`.
//! Unused offsets in between are free to hold cells of other states, which
//! is what keeps the table far below the dense `256 * states` footprint
//! while a transition lookup stays a single indexed read.

use crate::cell::Cell;

/// An outgoing transition of a state under construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TmpTransition {
    pub ch: u8,
    pub target: u32,
}

/// A state that has not been placed into the table yet.
///
/// `transitions` must be sorted by `ch` ascending; the builder produces
/// them in that order. The derived `Hash`/`Eq` make the whole record the
/// lookup key for the builder's register of finalized states.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct TmpState {
    pub is_final: bool,
    pub data: u32,
    pub transitions: Vec<TmpTransition>,
}

/// Append-grown cell array plus the cursor of the lowest free slot.
#[derive(Default, Debug)]
pub struct SparseTable {
    cells: Vec<Cell>,
    free: u32,
}

impl SparseTable {
    /// Place `tmp` into the table and return the index of its state cell.
    ///
    /// The chosen index `i` is the smallest one at or past the free cursor
    /// where `i` itself and `i + ch` for every transition label are empty.
    /// The table grows as needed; there is no failure path.
    pub fn add(&mut self, tmp: &TmpState) -> u32 {
        debug_assert!(
            tmp.transitions.windows(2).all(|w| w[0].ch < w[1].ch),
            "transitions must be sorted by label"
        );
        let start = self.find_slot(tmp);
        self.insert_at(start, tmp);
        self.advance_free();
        start
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    fn find_slot(&mut self, tmp: &TmpState) -> u32 {
        let span = tmp.transitions.last().map_or(0, |t| t.ch as u32);
        let mut i = self.free;
        loop {
            self.grow_to(i + span);
            if self.fits(i, tmp) {
                return i;
            }
            i += 1;
        }
    }

    fn grow_to(&mut self, end: u32) {
        if self.cells.len() as u32 <= end {
            self.cells.resize(end as usize + 1, Cell::default());
        }
    }

    fn fits(&self, i: u32, tmp: &TmpState) -> bool {
        self.cells[i as usize].is_empty()
            && tmp
                .transitions
                .iter()
                .all(|t| self.cells[(i + t.ch as u32) as usize].is_empty())
    }

    fn insert_at(&mut self, i: u32, tmp: &TmpState) {
        // The state cell links to its first transition by label; each
        // transition links onward by label distance. Labels are strictly
        // ascending, so every link step fits in the one-byte `next`.
        let first = tmp.transitions.first().map_or(0, |t| t.ch);
        self.cells[i as usize] = if tmp.is_final {
            Cell::final_state(tmp.data, first)
        } else {
            Cell::non_final(first)
        };
        for (j, t) in tmp.transitions.iter().enumerate() {
            let step = tmp.transitions.get(j + 1).map_or(0, |n| n.ch - t.ch);
            self.cells[(i + t.ch as u32) as usize] = Cell::transition(t.target, t.ch, step);
        }
    }

    fn advance_free(&mut self) {
        loop {
            if self.cells.len() as u32 <= self.free {
                self.cells.push(Cell::default());
            }
            if self.cells[self.free as usize].is_empty() {
                break;
            }
            self.free += 1;
        }
    }
}
