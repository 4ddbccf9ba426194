//! Values forwarded verbatim to Matplotlib, either as keyword
//! arguments or as `rcParams` entries.

use std::collections::BTreeMap;
use pyo3::{
    prelude::*,
    types::{PyDict, PyList},
};

/// A Python value understood by Matplotlib.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl ToPyObject for Value {
    fn to_object(&self, py: Python<'_>) -> PyObject {
        match self {
            Value::Bool(b) => b.to_object(py),
            Value::Int(i) => i.to_object(py),
            Value::Float(x) => x.to_object(py),
            Value::Str(s) => s.to_object(py),
            Value::List(v) => {
                PyList::new_bound(py, v.iter().map(|x| x.to_object(py)))
                    .into_any().unbind()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Int(i.into()) }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self { Value::Int(i as i64) }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// An opaque bag of named options.  Entries are passed to Python
/// without any interpretation; setting a key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(BTreeMap<String, Value>);

impl Options {
    pub fn new() -> Self { Self::default() }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>)
               -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>)
                -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Add all entries of `other`, overriding those already present.
    pub fn extend(&mut self, other: &Options) {
        for (k, v) in other.iter() {
            self.0.insert(k.to_string(), v.clone());
        }
    }

    /// Convert to a new Python `dict`.
    pub fn to_dict<'py>(&self, py: Python<'py>)
                        -> PyResult<Bound<'py, PyDict>> {
        let d = PyDict::new_bound(py);
        for (k, v) in self.iter() {
            d.set_item(k, v.to_object(py))?;
        }
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_value_wins() {
        let mut o = Options::new();
        o.set("dpi", 100).set("dpi", 300.);
        assert_eq!(o.len(), 1);
        assert_eq!(o.get("dpi"), Some(&Value::Float(300.)));
        assert_eq!(o.remove("dpi"), Some(Value::Float(300.)));
        assert!(o.is_empty());
    }

    #[test]
    fn extend_overrides() {
        let mut a = Options::new().with("a", 1).with("b", "x");
        a.extend(&Options::new().with("b", true));
        assert_eq!(a.get("a"), Some(&Value::Int(1)));
        assert_eq!(a.get("b"), Some(&Value::Bool(true)));
    }

    #[test]
    fn lists_convert() {
        let v: Value = vec![1.5, 2.].into();
        assert_eq!(v, Value::List(vec![Value::Float(1.5), Value::Float(2.)]));
        let empty: Value = Vec::<String>::new().into();
        assert_eq!(empty, Value::List(vec![]));
    }

    #[test]
    fn to_python_dict() -> PyResult<()> {
        let o = Options::new()
            .with("figure.figsize", vec![4., 3.])
            .with("text.usetex", true)
            .with("font.serif", Vec::<String>::new());
        Python::with_gil(|py| {
            let d = o.to_dict(py)?;
            assert_eq!(d.len(), 3);
            let size: Vec<f64> = d.get_item("figure.figsize")?
                .expect("figsize").extract()?;
            assert_eq!(size, vec![4., 3.]);
            let usetex: bool = d.get_item("text.usetex")?
                .expect("usetex").extract()?;
            assert!(usetex);
            let serif: Vec<String> = d.get_item("font.serif")?
                .expect("serif").extract()?;
            assert!(serif.is_empty());
            Ok(())
        })
    }
}
