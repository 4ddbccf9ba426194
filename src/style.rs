//! Process-wide Matplotlib configuration for figures embedded in
//! LaTeX documents.

use std::sync::{Mutex, MutexGuard};
use pyo3::prelude::*;
use tracing::info;
use crate::{Error, value::{Options, Value}};

/// Width of a typical single column document, in inches.
pub const DEFAULT_WIDTH: f64 = 5.78853;

/// Reciprocal of the golden ratio, (√5 − 1)/2.
pub const DEFAULT_RATIO: f64 = 0.6180339887498949;

/// Formats written by [`crate::Savefig::to_files`], in order.
pub const DEFAULT_FORMATS: [&str; 2] = ["pdf", "pgf"];

/// LaTeX preamble injected in the generated output so that the text
/// of the figures uses the macros of the surrounding document.
pub const PREAMBLE: [&str; 6] = [
    r"\usepackage[utf8x]{inputenc}",
    r"\usepackage[T1]{fontenc}",
    r"\usepackage{amsmath}",
    r"\usepackage{bm}",
    r"\usepackage{relsize}",
    r"\usepackage{calc}",
];

/// Font scale matching an 11pt document in the [`Context::Paper`]
/// context.
pub const FONT_SCALE: f64 = 10. / 12. / 0.8;

/// Font related parameters of the notebook context.
const FONT_CONTEXT: [(&str, f64); 7] = [
    ("font.size", 12.),
    ("axes.labelsize", 12.),
    ("axes.titlesize", 12.),
    ("xtick.labelsize", 11.),
    ("ytick.labelsize", 11.),
    ("legend.fontsize", 11.),
    ("legend.title_fontsize", 12.),
];

/// Line and tick parameters of the notebook context.
const LINE_CONTEXT: [(&str, f64); 13] = [
    ("axes.linewidth", 1.25),
    ("grid.linewidth", 1.),
    ("lines.linewidth", 1.5),
    ("lines.markersize", 6.),
    ("patch.linewidth", 1.),
    ("xtick.major.width", 1.25),
    ("ytick.major.width", 1.25),
    ("xtick.minor.width", 1.),
    ("ytick.minor.width", 1.),
    ("xtick.major.size", 6.),
    ("ytick.major.size", 6.),
    ("xtick.minor.size", 4.),
    ("ytick.minor.size", 4.),
];

/// Plotting context: scales fonts, lines and ticks relative to the
/// notebook sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Context {
    #[default]
    Paper,
    Notebook,
    Talk,
    Poster,
}

impl Context {
    pub fn scale(self) -> f64 {
        match self {
            Context::Paper => 0.8,
            Context::Notebook => 1.,
            Context::Talk => 1.5,
            Context::Poster => 2.,
        }
    }

    /// The rc parameters of this context, fonts being further
    /// multiplied by `font_scale`.
    pub fn rc_params(self, font_scale: f64) -> Options {
        let s = self.scale();
        let mut o = Options::new();
        for (k, v) in LINE_CONTEXT {
            o.set(k, v * s);
        }
        for (k, v) in FONT_CONTEXT {
            o.set(k, v * s * font_scale);
        }
        o
    }
}

/// Matplotlib configuration.  The default produces PGF/PDF figures
/// whose text is typeset by `pdflatex` with the document's fonts.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Matplotlib backend.
    pub backend: String,
    /// Typeset all text with LaTeX.
    pub usetex: bool,
    /// TeX engine used by the PGF backend.
    pub texsystem: String,
    /// Whether the PGF backend sets up fonts from the rc parameters.
    pub rcfonts: bool,
    pub font_family: String,
    /// Default figure width, in inches.
    pub width: f64,
    /// Default height/width ratio.
    pub ratio: f64,
    pub preamble: Vec<String>,
    pub xtick_labelsize: String,
    pub context: Context,
    pub font_scale: f64,
    /// Extensions written by a multi-format save.
    pub formats: Vec<String>,
    /// Additional rc parameters, applied last.
    pub extra: Options,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            backend: "pgf".into(),
            usetex: true,
            texsystem: "pdflatex".into(),
            rcfonts: false,
            font_family: "serif".into(),
            width: DEFAULT_WIDTH,
            ratio: DEFAULT_RATIO,
            preamble: PREAMBLE.iter().map(|s| s.to_string()).collect(),
            xtick_labelsize: "small".into(),
            context: Context::Paper,
            font_scale: FONT_SCALE,
            formats: DEFAULT_FORMATS.iter().map(|s| s.to_string()).collect(),
            extra: Options::new(),
        }
    }
}

impl Style {
    /// Default figure size `(width, width × ratio)`, in inches.
    pub fn figsize(&self) -> (f64, f64) {
        (self.width, self.width * self.ratio)
    }

    /// The rc parameters set by [`Style::apply`].  The context is
    /// applied after the base settings, thus its tick label size
    /// supersedes `xtick_labelsize`.
    pub fn rc_params(&self) -> Options {
        let (w, h) = self.figsize();
        let none = Value::List(vec![]);
        let mut o = Options::new();
        o.set("text.usetex", self.usetex)
            .set("pgf.texsystem", self.texsystem.as_str())
            .set("pgf.rcfonts", self.rcfonts)
            .set("font.family", self.font_family.as_str())
            .set("font.serif", none.clone())
            .set("font.sans-serif", none.clone())
            .set("font.monospace", none)
            .set("figure.figsize", vec![w, h])
            .set("pgf.preamble", self.preamble.join("\n"))
            .set("xtick.labelsize", self.xtick_labelsize.as_str());
        o.extend(&self.context.rc_params(self.font_scale));
        o.extend(&self.extra);
        o
    }

    /// Select the backend and update `matplotlib.rcParams`.  Applying
    /// the same style again leaves the configuration unchanged.
    pub fn apply(&self) -> Result<(), Error> {
        let mpl = pymod!(crate::MATPLOTLIB)?;
        let _rc = lock_rc();
        self.update(mpl)?;
        info!(backend = %self.backend, "matplotlib style applied");
        Ok(())
    }

    fn update(&self, mpl: &Py<PyModule>) -> Result<(), Error> {
        let params = self.rc_params();
        Python::with_gil(|py| -> Result<(), Error> {
            let mpl = mpl.bind(py);
            let kwargs = Options::new().with("force", true).to_dict(py)?;
            mpl.call_method("use", (self.backend.as_str(),), Some(&kwargs))?;
            mpl.getattr("rcParams")?
                .call_method1("update", (params.to_dict(py)?,))?;
            Ok(())
        })
    }

    /// Run `f` with `rcParams` reset to the rc file values and then
    /// set to this style; the previous values are restored afterwards.
    /// The backend is not changed.
    /// ⚠ This takes a process-wide lock.  Make sure it is executed
    /// outside a call to `Python::with_gil`.
    pub(crate) fn scoped<T>(
        &self, f: impl FnOnce(Python<'_>) -> Result<T, Error>
    ) -> Result<T, Error> {
        let mpl = pymod!(crate::MATPLOTLIB)?;
        let params = self.rc_params();
        let _rc = lock_rc();
        Python::with_gil(|py| -> Result<T, Error> {
            let mpl = mpl.bind(py);
            let ctx = mpl.call_method0("rc_context")?;
            ctx.call_method0("__enter__")?;
            let r = mpl.call_method0("rc_file_defaults")
                .and_then(|_| mpl.getattr("rcParams")?
                          .call_method1("update", (params.to_dict(py)?,)))
                .map_err(Error::from)
                .and_then(|_| f(py));
            ctx.call_method1("__exit__", (py.None(), py.None(), py.None()))?;
            r
        })
    }
}

/// Serializes the changes of `matplotlib.rcParams`.
static RC: Mutex<()> = Mutex::new(());

fn lock_rc() -> MutexGuard<'static, ()> {
    RC.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float(o: &Options, k: &str) -> f64 {
        match o.get(k) {
            Some(Value::Float(x)) => *x,
            v => panic!("{k}: {v:?}"),
        }
    }

    #[test]
    fn default_figsize() {
        let (w, h) = Style::default().figsize();
        assert_eq!(w, 5.78853);
        assert!((h - 3.5775083).abs() < 1e-6, "h = {h}");
        assert!((DEFAULT_RATIO - (5f64.sqrt() - 1.) / 2.).abs() < 1e-15);
        let o = Style::default().rc_params();
        assert_eq!(o.get("figure.figsize"),
                   Some(&Value::List(vec![Value::Float(w), Value::Float(h)])));
    }

    #[test]
    fn latex_settings() {
        let o = Style::default().rc_params();
        assert_eq!(o.get("text.usetex"), Some(&Value::Bool(true)));
        assert_eq!(o.get("pgf.rcfonts"), Some(&Value::Bool(false)));
        assert_eq!(o.get("pgf.texsystem"), Some(&Value::from("pdflatex")));
        assert_eq!(o.get("font.family"), Some(&Value::from("serif")));
        for k in ["font.serif", "font.sans-serif", "font.monospace"] {
            assert_eq!(o.get(k), Some(&Value::List(vec![])), "{k}");
        }
        let Some(Value::Str(preamble)) = o.get("pgf.preamble") else {
            panic!("pgf.preamble must be a string")
        };
        let lines: Vec<_> = preamble.lines().collect();
        assert_eq!(lines, PREAMBLE);
    }

    #[test]
    fn paper_context_for_11pt() {
        let o = Style::default().rc_params();
        assert!((float(&o, "font.size") - 10.).abs() < 1e-12);
        assert!((float(&o, "xtick.labelsize") - 11. * 10. / 12.).abs()
                < 1e-12);
        assert!((float(&o, "lines.linewidth") - 1.2).abs() < 1e-12);
    }

    #[test]
    fn tick_labels_without_context_override() {
        let mut s = Style::default();
        s.extra.set("xtick.labelsize", "small");
        assert_eq!(s.rc_params().get("xtick.labelsize"),
                   Some(&Value::from("small")));
    }

    #[test]
    fn context_scales() {
        let talk = Context::Talk.rc_params(1.);
        assert_eq!(float(&talk, "font.size"), 18.);
        assert_eq!(float(&talk, "xtick.minor.size"), 6.);
        let poster = Context::Poster.rc_params(0.5);
        assert_eq!(float(&poster, "font.size"), 12.);
        assert_eq!(float(&poster, "axes.linewidth"), 2.5);
    }

    #[test]
    fn rc_params_are_deterministic() {
        let s = Style::default();
        assert_eq!(s.rc_params(), s.rc_params());
    }

    /// Every parameter of `s`, as currently stored in `rcParams`.
    fn read_back(s: &Style) -> PyResult<Vec<(String, PyObject)>> {
        Python::with_gil(|py| -> PyResult<Vec<(String, PyObject)>> {
            let rc = py.import_bound("matplotlib")?.getattr("rcParams")?;
            s.rc_params().iter()
                .map(|(k, _)| -> PyResult<(String, PyObject)> {
                    Ok((k.to_string(), rc.get_item(k)?.unbind()))
                })
                .collect()
        })
    }

    #[test]
    fn apply_twice_is_idempotent() -> Result<(), Error> {
        let s = Style::default();
        let mpl = pymod!(crate::MATPLOTLIB)?;
        let _rc = lock_rc();
        s.update(mpl)?;
        let first = read_back(&s)?;
        s.update(mpl)?;
        let second = read_back(&s)?;
        assert_eq!(first.len(), s.rc_params().len());
        Python::with_gil(|py| -> PyResult<()> {
            for ((k, a), (_, b)) in first.iter().zip(&second) {
                assert!(a.bind(py).eq(b)?, "{k} changed");
            }
            let (w, h) = s.figsize();
            let size: Vec<f64> = first.iter()
                .find(|(k, _)| k == "figure.figsize")
                .expect("figure.figsize").1.bind(py).extract()?;
            assert_eq!(size, vec![w, h]);
            let backend: String = py.import_bound("matplotlib")?
                .call_method0("get_backend")?.extract()?;
            assert_eq!(backend, "pgf");
            Ok(())
        })?;
        Ok(())
    }

    #[test]
    fn scoped_uses_own_parameters() -> Result<(), Error> {
        let read = |py: Python<'_>, k: &str| -> Result<f64, Error> {
            let rc = py.import_bound("matplotlib")?.getattr("rcParams")?;
            Ok(rc.get_item(k)?.extract()?)
        };
        let mut talk = Style { context: Context::Talk, ..Style::default() };
        talk.extra.set("figure.dpi", 50.);
        let paper = Style::default();
        talk.apply()?;
        assert_eq!(talk.scoped(|py| read(py, "figure.dpi"))?, 50.);
        let size = paper.scoped(|py| read(py, "font.size"))?;
        assert!((size - 10.).abs() < 1e-12, "font.size = {size}");
        let dpi = paper.scoped(|py| read(py, "figure.dpi"))?;
        assert_ne!(dpi, 50.);
        let size = talk.scoped(|py| read(py, "font.size"))?;
        assert!((size - 18. * FONT_SCALE).abs() < 1e-12, "font.size = {size}");
        Ok(())
    }
}
