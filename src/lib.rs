pub mod error;
pub mod geometry;
pub mod lib_tracing;
pub mod search;

#[cfg(feature = "python")]
mod python;

pub use error::{Result, SearchError};
pub use geometry::{Heading, Point};

#[cfg(feature = "python")]
use pyo3::prelude::*;

// A module to wrap the Python functions and classes
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)
}
