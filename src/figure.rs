//! Figures sized for documents, and their multi-format saving.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::Arc,
};
use ndarray::Array2;
use numpy::{PyArray1, PyArray2, PyArrayMethods};
use pyo3::{prelude::*, types::PyTuple};
use tracing::{debug, info};
use crate::{Error, style::Style, value::{Options, Value}};

/// Matplotlib configured with a [`Style`].  Figures created from it
/// follow the style's default size and are saved in its formats.
/// Their creation and saving run with the style's rc parameters, even
/// if another `TexFig` was created since.
#[derive(Debug)]
pub struct TexFig {
    style: Arc<Style>,
}

impl TexFig {
    /// Apply `style` to Matplotlib and return a handle to create
    /// figures with it.
    pub fn new(style: Style) -> Result<Self, Error> {
        style.apply()?;
        let (w, h) = style.figsize();
        info!(width = w, height = h, formats = ?style.formats,
              "texfig ready");
        Ok(TexFig { style: Arc::new(style) })
    }

    pub fn style(&self) -> &Style { &self.style }

    /// Options for a new figure, initialized from the style.
    pub fn new_figure(&self) -> NewFigure<'_> {
        NewFigure {
            texfig: self,
            width: self.style.width,
            ratio: self.style.ratio,
            tight_layout: false,
            pad: 0.,
            kwargs: Options::new(),
        }
    }

    /// Return a new figure with the default size.
    pub fn figure(&self) -> Result<Figure, Error> {
        self.new_figure().figure()
    }

    /// Return a new figure with a `nrows` × `ncols` grid of axes.
    pub fn subplots(&self, nrows: usize, ncols: usize)
                    -> Result<(Figure, Array2<Axes>), Error> {
        self.new_figure().subplots(nrows, ncols)
    }

    /// Save pyplot's current figure in all formats of the style.
    /// See [`Savefig::to_files`].
    pub fn savefig(&self, base: impl AsRef<Path>)
                   -> Result<Vec<PathBuf>, Error> {
        let pyplot = pymod!(crate::PYPLOT)?;
        let fig = Python::with_gil(|py| -> PyResult<PyObject> {
            Ok(pyplot.bind(py).call_method0("gcf")?.unbind())
        })?;
        self.wrap(fig).save().to_files(base)
    }

    fn wrap(&self, fig: PyObject) -> Figure {
        Figure { fig, style: Arc::clone(&self.style) }
    }
}

/// Size and layout of a figure to create.
#[must_use]
pub struct NewFigure<'a> {
    texfig: &'a TexFig,
    width: f64,
    ratio: f64,
    tight_layout: bool,
    pad: f64,
    kwargs: Options,
}

impl NewFigure<'_> {
    /// Width of the figure, in inches.
    pub fn width(&mut self, width: f64) -> &mut Self {
        self.width = width;
        self
    }

    /// Height/width ratio of the figure.
    pub fn ratio(&mut self, ratio: f64) -> &mut Self {
        self.ratio = ratio;
        self
    }

    /// Trim the whitespace around the subplots, leaving `pad`
    /// (a fraction of the font size) around the decorations.
    pub fn tight_layout(&mut self, pad: f64) -> &mut Self {
        self.tight_layout = true;
        self.pad = pad;
        self
    }

    /// Keyword argument forwarded as is to Matplotlib.  `figsize` is
    /// always set from the width and ratio.
    pub fn kwarg(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.kwargs.set(key, value);
        self
    }

    pub fn kwargs(&mut self, kwargs: &Options) -> &mut Self {
        self.kwargs.extend(kwargs);
        self
    }

    /// `(width, width × ratio)`, in inches.
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.width * self.ratio)
    }

    /// Create the figure.
    pub fn figure(&self) -> Result<Figure, Error> {
        let pyplot = pymod!(crate::PYPLOT)?;
        let size = self.size();
        let fig = self.texfig.style.scoped(|py| {
            let kwargs = self.kwargs.to_dict(py)?;
            kwargs.set_item("figsize", size)?;
            let fig = pyplot.bind(py).call_method("figure", (), Some(&kwargs))?;
            self.layout(&fig)?;
            Ok(fig.unbind())
        })?;
        debug!(width = size.0, height = size.1, tight = self.tight_layout,
               "figure created");
        Ok(self.texfig.wrap(fig))
    }

    /// Create the figure with a `nrows` × `ncols` grid of axes.
    pub fn subplots(&self, nrows: usize, ncols: usize)
                    -> Result<(Figure, Array2<Axes>), Error> {
        let pyplot = pymod!(crate::PYPLOT)?;
        let size = self.size();
        let (fig, axes) = self.texfig.style.scoped(
            |py| -> Result<(PyObject, Array2<Axes>), Error> {
                let kwargs = self.kwargs.to_dict(py)?;
                kwargs.set_item("figsize", size)?;
                kwargs.set_item("squeeze", false)?;
                let (fig, axs): (Bound<PyAny>, Bound<PyAny>) = pyplot.bind(py)
                    .call_method("subplots", (nrows, ncols), Some(&kwargs))?
                    .extract()?;
                self.layout(&fig)?;
                let axs = axs.downcast::<PyArray2<PyObject>>()
                    .map_err(PyErr::from)?;
                let axes = axs.to_owned_array()
                    .map(|ax| Axes { ax: ax.clone() });
                Ok((fig.unbind(), axes))
            })?;
        debug!(width = size.0, height = size.1, nrows, ncols,
               tight = self.tight_layout, "subplots created");
        Ok((self.texfig.wrap(fig), axes))
    }

    fn layout(&self, fig: &Bound<'_, PyAny>) -> PyResult<()> {
        if !self.tight_layout {
            return Ok(())
        }
        let pad = Options::new().with("pad", self.pad).to_dict(fig.py())?;
        // `set_tight_layout` is deprecated since Matplotlib 3.6.
        if fig.hasattr("set_layout_engine")? {
            fig.call_method("set_layout_engine", ("tight",), Some(&pad))?;
        } else {
            fig.call_method1("set_tight_layout", (pad,))?;
        }
        Ok(())
    }
}

/// The top level container for all the plot elements.
#[derive(Debug)]
pub struct Figure {
    fig: PyObject, // instance of matplotlib.figure.Figure
    style: Arc<Style>,
}

impl Figure {
    /// Width and height of the figure, in inches.
    pub fn size(&self) -> Result<(f64, f64), Error> {
        let [w, h] = Python::with_gil(|py| -> PyResult<[f64; 2]> {
            self.fig.bind(py).call_method0("get_size_inches")?
                .call_method0("tolist")?.extract()
        })?;
        Ok((w, h))
    }

    pub fn save(&self) -> Savefig {
        Savefig {
            fig: self.fig.clone(),
            style: Arc::clone(&self.style),
            formats: self.style.formats.clone(),
            kwargs: Options::new(),
        }
    }

    /// Remove the figure from pyplot's figure manager.  Only needed
    /// for long running processes creating many figures.
    pub fn close(self) -> Result<(), Error> {
        let pyplot = pymod!(crate::PYPLOT)?;
        Python::with_gil(|py| -> Result<(), Error> {
            pyplot.bind(py).call_method1("close", (self.fig.clone_ref(py),))?;
            Ok(())
        })
    }
}

/// Options to save a figure.
#[must_use]
pub struct Savefig {
    fig: PyObject,
    style: Arc<Style>,
    formats: Vec<String>,
    kwargs: Options,
}

impl Savefig {
    /// Set the formats written by [`Savefig::to_files`].
    pub fn formats<S: AsRef<str>>(&mut self, formats: &[S]) -> &mut Self {
        self.formats = formats.iter().map(|f| f.as_ref().to_string())
            .collect();
        self
    }

    /// The resolution for raster parts.  If `dpi` ≤ 0, use the one
    /// of the figure.
    pub fn dpi(&mut self, dpi: f64) -> &mut Self {
        if dpi > 0. {
            self.kwargs.set("dpi", dpi);
        } else {
            self.kwargs.remove("dpi");
        }
        self
    }

    /// Keyword argument forwarded to every `savefig` call.
    pub fn kwarg(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.kwargs.set(key, value);
        self
    }

    /// Save the figure to exactly `path`; the format is deduced from
    /// its extension.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        self.style.scoped(|py| {
            let kwargs = self.kwargs.to_dict(py)?;
            self.fig.bind(py)
                .call_method("savefig", (path,), Some(&kwargs))
                .map_err(|e| Error::from_save(py, e, path.to_path_buf()))?;
            Ok(())
        })?;
        debug!(path = %path.display(), "figure saved");
        Ok(())
    }

    /// Save the figure once per format, to `base` followed by `.` and
    /// the format.  Stop at the first failure; files already written
    /// are kept.  Return the paths written.
    pub fn to_files(&self, base: impl AsRef<Path>)
                    -> Result<Vec<PathBuf>, Error> {
        let base = base.as_ref();
        let mut written = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            let path = append_extension(base, format);
            self.to_file(&path)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// `base.ext`, keeping any extension `base` already has.
fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut p = OsString::from(base.as_os_str());
    p.push(".");
    p.push(ext);
    PathBuf::from(p)
}

/// A plotting area of a [`Figure`].
#[derive(Debug, Clone)]
pub struct Axes {
    ax: PyObject,
}

impl Axes {
    fn call1(&self, name: &str, args: impl IntoPy<Py<PyTuple>>)
             -> Result<(), Error> {
        Python::with_gil(|py| -> Result<(), Error> {
            self.ax.bind(py).call_method1(name, args)?;
            Ok(())
        })
    }

    /// Plot `y` versus `x` as lines and/or markers.
    ///
    /// # Example
    ///
    /// ```no_run
    /// let (fig, mut axes) = texfig::subplots(1, 1)?;
    /// axes[[0, 0]].xy(&[1., 2., 3., 4.], &[1., 4., 2., 3.]).plot()?;
    /// fig.save().to_files("target/xy")?;
    /// # Ok::<(), texfig::Error>(())
    /// ```
    pub fn xy<'a>(&'a mut self, x: &'a [f64], y: &'a [f64]) -> XY<'a> {
        // `self` is borrowed mutably because `.plot()` mutates the
        // underlying Python object.
        XY { axes: self, x, y, fmt: "", label: "", linewidth: None }
    }

    pub fn set_title(&mut self, v: &str) -> Result<&mut Self, Error> {
        self.call1("set_title", (v,))?;
        Ok(self)
    }

    pub fn set_xlabel(&mut self, label: &str) -> Result<&mut Self, Error> {
        self.call1("set_xlabel", (label,))?;
        Ok(self)
    }

    pub fn set_ylabel(&mut self, label: &str) -> Result<&mut Self, Error> {
        self.call1("set_ylabel", (label,))?;
        Ok(self)
    }

    pub fn grid(&mut self) -> Result<&mut Self, Error> {
        self.call1("grid", (true,))?;
        Ok(self)
    }

    pub fn legend(&mut self) -> Result<&mut Self, Error> {
        self.call1("legend", ())?;
        Ok(self)
    }
}

/// A dataset to plot on an [`Axes`].
#[must_use]
pub struct XY<'a> {
    axes: &'a mut Axes,
    x: &'a [f64],
    y: &'a [f64],
    fmt: &'a str,
    label: &'a str,
    linewidth: Option<f64>,
}

impl<'a> XY<'a> {
    /// Format string, e.g. `"r."`.
    pub fn fmt(mut self, fmt: &'a str) -> Self {
        self.fmt = fmt;
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub fn linewidth(mut self, w: f64) -> Self {
        self.linewidth = Some(w);
        self
    }

    pub fn plot(self) -> Result<(), Error> {
        let mut kwargs = Options::new();
        if !self.label.is_empty() {
            kwargs.set("label", self.label);
        }
        if let Some(w) = self.linewidth {
            kwargs.set("linewidth", w);
        }
        Python::with_gil(|py| -> Result<(), Error> {
            let x = PyArray1::from_slice_bound(py, self.x);
            let y = PyArray1::from_slice_bound(py, self.y);
            self.axes.ax.bind(py).call_method(
                "plot", (x, y, self.fmt), Some(&kwargs.to_dict(py)?))?;
            Ok(())
        })
    }
}
