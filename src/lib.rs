//! Python bindings for the precipitation isotope query engine.
//!
//! The engine itself lives in [`apic_core`]; this crate only exposes it to
//! the Python presentation layer.

use pyo3::prelude::*;

pub mod python;

#[pymodule]
#[pyo3(name = "_lib")]
fn apic(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    python::register(m)?;
    Ok(())
}
