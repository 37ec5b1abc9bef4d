pub mod automaton;
pub mod builder;
pub mod cell;
pub mod dfa;
pub mod fuzzy;
pub mod serialize;
pub mod table;

#[cfg(feature = "python")]
pub mod py;

pub use automaton::{accepts, delta_star, Automaton, Walker};
pub use builder::{BuildError, Builder};
pub use cell::Cell;
pub use dfa::{Dfa, DfaError, State, Transitions};
pub use fuzzy::{FuzzyDfa, FuzzyStack};
pub use table::{SparseTable, TmpState, TmpTransition};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn lexdfa_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<py::PyBuilder>()?;
    m.add_class::<py::PyDfa>()?;
    Ok(())
}
