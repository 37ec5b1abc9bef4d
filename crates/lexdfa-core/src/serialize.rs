//! Stable on-disk layout for a finished automaton.
//!
//! The stream is, in order:
//!
//! 1. cell count, `u32` little-endian;
//! 2. one 8-byte record per cell: payload `u32` little-endian, then the
//!    `ch`, type and `next` bytes, then one zero pad byte;
//! 3. the initial-state index, `u32` little-endian, `u32::MAX` for the
//!    empty automaton.
//!
//! Records are 8-byte aligned from the start of the cell section, so a
//! file produced by [`Dfa::write_to`] can be memory-mapped and the cell
//! region viewed in place.

use crate::cell::Cell;
use crate::dfa::{Dfa, State};
use std::io::{self, Read, Write};

impl Dfa {
    /// Serialize the automaton to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let cells = self.cells();
        w.write_all(&(cells.len() as u32).to_le_bytes())?;
        for cell in cells {
            w.write_all(&cell.to_bytes())?;
        }
        w.write_all(&self.initial().0.to_le_bytes())
    }

    /// Read an automaton previously written with [`Dfa::write_to`].
    ///
    /// Unknown cell tags and an out-of-range initial index surface as
    /// [`io::ErrorKind::InvalidData`].
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Dfa> {
        let mut word = [0u8; 4];
        r.read_exact(&mut word)?;
        let count = u32::from_le_bytes(word) as usize;

        let mut cells = Vec::with_capacity(count);
        let mut record = [0u8; 8];
        for i in 0..count {
            r.read_exact(&mut record)?;
            let cell = Cell::from_bytes(record).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("cell {i}: unknown type tag {}", record[5]),
                )
            })?;
            cells.push(cell);
        }

        r.read_exact(&mut word)?;
        let initial = State(u32::from_le_bytes(word));
        if initial.is_valid() && initial.0 as usize >= count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("initial state {} out of range ({count} cells)", initial.0),
            ));
        }
        Ok(Dfa::from_parts(cells, initial))
    }
}
