use configuration::Normalization;

/// Value every present observation receives when a metric does not vary.
/// Ties are not penalized.
pub const NO_VARIATION_SCORE: f64 = 1.0;

/// Normalized value assigned to a metric a pass did not report.
pub const MISSING_SCORE: f64 = 0.0;

/// Maps raw values of one metric onto 0..1, fitted to the values present in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalizer {
    /// The metric does not vary; everything maps to `NO_VARIATION_SCORE`.
    Constant,
    MinMax { min: f64, max: f64 },
    /// `mean` and `std_dev` are in units of `scale`, which is 1.0 unless the values
    /// are too large to square.
    ZScore { mean: f64, std_dev: f64, scale: f64 },
}

/// Above this magnitude squared deviations can overflow, so z-scores are fitted on rescaled values.
const SAFE_MAGNITUDE: f64 = 1e150;

impl Normalizer {
    /// Fits a normalizer to the finite values of one metric. Returns `None` when
    /// there is nothing to fit.
    pub fn fit(method: Normalization, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let normalizer = match method {
            Normalization::MinMax => {
                let (min, max) = find_min_max(values);
                if min == max {
                    Normalizer::Constant
                } else {
                    Normalizer::MinMax { min, max }
                }
            }
            Normalization::ZScore => {
                let scale = magnitude(values);
                let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
                match sample_std_dev(&scaled) {
                    Some((mean, std_dev)) if std_dev > 0.0 => {
                        Normalizer::ZScore { mean, std_dev, scale }
                    }
                    _ => Normalizer::Constant,
                }
            }
        };
        Some(normalizer)
    }

    /// Normalizes a value to a 0.0-1.0 scale, before any direction adjustment.
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Normalizer::Constant => NO_VARIATION_SCORE,
            Normalizer::MinMax { min, max } => {
                let span = max - min;
                let unit = if span.is_finite() {
                    (value - min) / span
                } else {
                    // The range itself overflows; halving keeps every difference finite.
                    (value / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0)
                };
                unit.clamp(0.0, 1.0)
            }
            Normalizer::ZScore { mean, std_dev, scale } => {
                sigmoid((value / scale - mean) / std_dev)
            }
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Normalizer::Constant)
    }
}

/// A helper function to find the min and max of a slice of finite values.
fn find_min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &val| {
            (min.min(val), max.max(val))
        })
}

/// Divisor applied before fitting z-scores; 1.0 unless some value exceeds `SAFE_MAGNITUDE`.
fn magnitude(values: &[f64]) -> f64 {
    let largest = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if largest > SAFE_MAGNITUDE { largest } else { 1.0 }
}

/// Mean and sample (n - 1) standard deviation. `None` for fewer than two values.
fn sample_std_dev(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
