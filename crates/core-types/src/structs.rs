use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A single tested parameter value as exported by the optimizer.
///
/// Numeric values compare numerically regardless of whether they were exported
/// as integers or decimals, and every numeric value sorts before any text value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// The numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }
}

impl Ord for ParamValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ParamValue::Text(a), ParamValue::Text(b)) => a.cmp(b),
            (ParamValue::Text(_), _) => Ordering::Greater,
            (_, ParamValue::Text(_)) => Ordering::Less,
            (ParamValue::Int(a), ParamValue::Int(b)) => a.cmp(b),
            (a, b) => {
                // Both numeric here, so both views exist.
                let a = a.as_f64().unwrap_or_default();
                let b = b.as_f64().unwrap_or_default();
                a.total_cmp(&b)
            }
        }
    }
}

impl PartialOrd for ParamValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ParamValue {}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// One optimizer pass: a tested parameter combination and its backtest metrics.
///
/// This is the only input type of the analysis pipeline. The extractor is expected
/// to hand over every pass of a run with the same set of parameter names, and to
/// leave a metric out (or set it to NaN) when its text could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pass {
    /// Export order index, unique within one run.
    pub id: usize,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl Pass {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            parameters: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    /// Returns the metric only when it is present and finite.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().filter(|v| v.is_finite())
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }
}
