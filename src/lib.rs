//! [Matplotlib][] figures for [LaTeX][] documents, from [Rust][].
//!
//! Usage
//! -----
//!
//! The first use of [`figure`], [`subplots`] or [`savefig`] configures
//! Matplotlib with [`Style::default()`]: the PGF backend, text typeset
//! by `pdflatex` with the document fonts, and figures as wide as a
//! single column with a golden ratio aspect.  Figures are then saved
//! both as PDF (to preview) and PGF (to `\input` in the document).
//!
//! ```no_run
//! let (fig, mut axes) = texfig::subplots(1, 1)?;
//! axes[[0, 0]].xy(&[1., 2., 3., 4.], &[1., 4., 2., 3.]).plot()?;
//! fig.save().to_files("target/basic")?; // basic.pdf, basic.pgf
//! # Ok::<(), texfig::Error>(())
//! ```
//!
//! Use [`TexFig::new`] with a custom [`Style`] for other settings.
//!
//! [Rust]: https://www.rust-lang.org/
//! [Matplotlib]: https://matplotlib.org/
//! [LaTeX]: https://www.latex-project.org/

use std::path::{Path, PathBuf};
use lazy_static::lazy_static;
use ndarray::Array2;
use pyo3::prelude::*;

/// Import and return a handle to the module `$m`.
macro_rules! pyimport { ($m: literal) => {
    Python::with_gil(|py|
        PyModule::import_bound(py, $m).map(|m| m.unbind()))
}}

/// Return a handle to the module `$m`.
/// ⚠ This may try to lock Python's GIL.  Make sure it is executed
/// outside a call to `Python::with_gil`.
macro_rules! pymod { ($m: expr) => {
    $m.as_ref().map_err(|_| $crate::Error::NoMatplotlib)
}}

mod error;
mod figure;
pub mod style;
mod value;

pub use error::Error;
pub use figure::{Axes, Figure, NewFigure, Savefig, TexFig, XY};
pub use style::{Context, Style, DEFAULT_FORMATS, DEFAULT_RATIO, DEFAULT_WIDTH};
pub use value::{Options, Value};

lazy_static! {
    // Import matplotlib modules.
    static ref MATPLOTLIB: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib")
    };
    static ref PYPLOT: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib.pyplot")
    };
    static ref DEFAULT: Result<TexFig, Error> = {
        TexFig::new(Style::default())
    };
}

/// Configure Matplotlib with [`Style::default()`], once per process,
/// and return the resulting handle.
pub fn init() -> Result<&'static TexFig, Error> {
    match &*DEFAULT {
        Ok(tf) => Ok(tf),
        Err(Error::NoMatplotlib) => Err(Error::NoMatplotlib),
        Err(e) => Err(Error::Init(e.to_string())),
    }
}

/// Return a new figure with the default size.
pub fn figure() -> Result<Figure, Error> {
    init()?.figure()
}

/// Return a new figure of the default size with a `nrows` × `ncols`
/// grid of axes.
pub fn subplots(nrows: usize, ncols: usize)
                -> Result<(Figure, Array2<Axes>), Error> {
    init()?.subplots(nrows, ncols)
}

/// Save pyplot's current figure to `base.pdf` and `base.pgf`.
pub fn savefig(base: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    init()?.savefig(base)
}

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
