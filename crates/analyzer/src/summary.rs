use chrono::{DateTime, Utc};
use core_types::Pass;
use itertools::Itertools;
use serde::Serialize;

/// Headline figures of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub parameter_count: usize,
    /// Passes handed to the analyzer.
    pub total_passes: usize,
    /// Passes dropped by the hard filters.
    pub filtered_out: usize,
    /// Passes that survived filtering and were analyzed.
    pub analyzed_passes: usize,
    /// Passes present in the ranking (fewer than analyzed under the exclude policy).
    pub scored_passes: usize,
    /// Analyzed passes with a positive profit.
    pub profitable_passes: usize,
    pub pareto_front_size: usize,
    pub incomparable_passes: usize,
    pub generated_at: DateTime<Utc>,
}

/// Tested range of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterRange {
    pub parameter: String,
    /// Name with the platform's `inp` input prefix removed.
    pub label: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Gap between the two smallest distinct values; 0 when only one value was tested.
    pub step: Option<f64>,
    pub distinct_values: usize,
}

/// Strips the `inp` prefix the optimizer puts in front of input parameters.
pub fn display_label(parameter: &str) -> &str {
    parameter.strip_prefix("inp").unwrap_or(parameter)
}

/// Reports min, max and step of every parameter over the given passes.
pub fn parameter_ranges(passes: &[Pass], parameter_names: &[String]) -> Vec<ParameterRange> {
    parameter_names
        .iter()
        .map(|name| {
            let values = passes.iter().filter_map(|p| p.parameter(name));
            let distinct_values = values.clone().sorted().dedup().count();
            let numeric: Vec<f64> = values
                .filter_map(|v| v.as_f64())
                .sorted_by(f64::total_cmp)
                .dedup()
                .collect();

            let step = match numeric.as_slice() {
                [] => None,
                [_] => Some(0.0),
                [first, second, ..] => Some(format_step(second - first)),
            };
            ParameterRange {
                parameter: name.clone(),
                label: display_label(name).to_string(),
                min: numeric.first().copied(),
                max: numeric.last().copied(),
                step,
                distinct_values,
            }
        })
        .collect()
}

/// Removes floating point noise from a step, e.g. 0.020000000000000018 -> 0.02.
///
/// Uses the fewest decimals (up to 8) that reproduce the value within 1e-10,
/// falling back to 6 decimals.
pub fn format_step(value: f64) -> f64 {
    (0..=8)
        .map(|digits| round_to(value, digits))
        .find(|rounded| (rounded - value).abs() < 1e-10)
        .unwrap_or_else(|| round_to(value, 6))
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
