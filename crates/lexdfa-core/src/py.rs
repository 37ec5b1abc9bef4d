//! Python-visible wrappers around the builder and query surface.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::automaton::{accepts, delta_star, Walker};
use crate::builder::Builder;
use crate::dfa::Dfa;
use crate::fuzzy::FuzzyDfa;

/// A finished dictionary automaton. Constructed by [`PyBuilder::build`].
#[pyclass]
pub struct PyDfa {
    pub(crate) inner: Dfa,
}

#[pymethods]
impl PyDfa {
    /// The value stored for `key`, or `None` if the key is not in the
    /// dictionary.
    fn lookup(&self, key: &[u8]) -> Option<u32> {
        accepts(&mut Walker::new(&self.inner), key)
    }

    /// Longest accepted prefix of `input`: `(value, length)`, with the
    /// position of the first `sync` byte as the fallback length.
    fn longest_prefix(&self, input: &[u8], sync: u8) -> (Option<u32>, usize) {
        delta_star(&mut Walker::new(&self.inner), input, sync)
    }

    /// All final configurations within `k` edits of `query`, as
    /// `(errors, position, value)` tuples. Whole-string matches are the
    /// ones with `position == len(query)`.
    fn fuzzy_search(&self, query: &[u8], k: usize) -> Vec<(usize, usize, u32)> {
        let fuzzy = FuzzyDfa::new(k, &self.inner);
        let mut stack = fuzzy.initial(query);
        let mut hits = Vec::new();
        while fuzzy.delta(&mut stack, |errors, pos, data| {
            hits.push((errors, pos, data));
        }) {}
        hits
    }

    fn cell_count(&self) -> usize {
        self.inner.cells().len()
    }

    fn __repr__(&self) -> String {
        format!("Dfa({} cells)", self.inner.cells().len())
    }
}

/// Incremental builder; keys must be added in ascending byte order.
#[pyclass]
pub struct PyBuilder {
    inner: Option<Builder>,
}

#[pymethods]
impl PyBuilder {
    #[new]
    fn new() -> Self {
        PyBuilder {
            inner: Some(Builder::new()),
        }
    }

    fn add(&mut self, key: &[u8], value: u32) -> PyResult<()> {
        let builder = self
            .inner
            .as_mut()
            .ok_or_else(|| PyValueError::new_err("builder already consumed by build()"))?;
        builder
            .add(key, value)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn build(&mut self) -> PyResult<PyDfa> {
        let builder = self
            .inner
            .take()
            .ok_or_else(|| PyValueError::new_err("builder already consumed by build()"))?;
        Ok(PyDfa {
            inner: builder.build(),
        })
    }
}
