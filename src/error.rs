use std::path::PathBuf;
use pyo3::{
    prelude::*,
    exceptions::{PyFileNotFoundError, PyPermissionError},
};
use thiserror::Error;

/// Possible errors of texfig functions.
#[derive(Debug, Error)]
pub enum Error {
    /// The Python library "matplotlib" was not found.
    #[error("The matplotlib library has not been found.\n\
             Please install it.  See https://matplotlib.org/\n\
             If you use Anaconda, see https://github.com/PyO3/pyo3/issues/1554")]
    NoMatplotlib,
    /// The path contains an element that is not a directory or does
    /// not exist.
    #[error("{0:?}: a path element is not a directory or does not exist")]
    FileNotFound(PathBuf),
    /// Permission denied to access or create the filesystem path.
    #[error("{0:?}: permission denied to access or create the path")]
    PermissionDenied(PathBuf),
    /// The default style could not be applied.
    #[error("The default style could not be applied: {0}")]
    Init(String),
    /// Other Python errors.
    #[error("Python error: {0}")]
    Python(#[from] PyErr),
}

impl Error {
    /// Classify an error raised while writing `path`.
    pub(crate) fn from_save(py: Python<'_>, e: PyErr, path: PathBuf) -> Self {
        if e.is_instance_of::<PyFileNotFoundError>(py) {
            Error::FileNotFound(path)
        } else if e.is_instance_of::<PyPermissionError>(py) {
            Error::PermissionDenied(path)
        } else {
            Error::Python(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let e = Error::FileNotFound(PathBuf::from("no/such/dir/fig.pdf"));
        assert!(e.to_string().contains("no/such/dir/fig.pdf"));
        let e = Error::Init("boom".into());
        assert!(e.to_string().ends_with("boom"));
    }
}
