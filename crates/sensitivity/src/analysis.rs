use configuration::SensitivityAggregate;
use core_types::ParamValue;
use scoring::ScoredPass;
use serde::Serialize;
use std::collections::BTreeMap;

/// Composite-score statistics for one tested value of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterLevel {
    pub value: ParamValue,
    pub mean_score: f64,
    pub median_score: f64,
    /// Number of passes that tested this value.
    pub sample_count: usize,
}

impl ParameterLevel {
    pub fn aggregate_score(&self, aggregate: SensitivityAggregate) -> f64 {
        match aggregate {
            SensitivityAggregate::Mean => self.mean_score,
            SensitivityAggregate::Median => self.median_score,
        }
    }
}

/// Sensitivity of the composite score to one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityResult {
    pub parameter: String,
    /// One entry per distinct tested value, ascending by value.
    pub levels: Vec<ParameterLevel>,
    pub aggregate: SensitivityAggregate,
    /// Spread of the aggregate score across `levels`; 0 with fewer than two values.
    pub sensitivity: f64,
}

/// Computes the sensitivity of every named parameter and ranks the results.
///
/// Results are ordered by descending sensitivity. Equal sensitivities keep the
/// order of `parameter_names`, so identical input always yields identical output.
pub fn analyze(
    scored: &[ScoredPass],
    parameter_names: &[String],
    aggregate: SensitivityAggregate,
) -> Vec<SensitivityResult> {
    let mut results: Vec<SensitivityResult> = parameter_names
        .iter()
        .map(|name| analyze_parameter(scored, name, aggregate))
        .collect();

    // Stable sort: ties stay in declaration order.
    results.sort_by(|a, b| b.sensitivity.total_cmp(&a.sensitivity));
    tracing::info!(parameters = results.len(), "Parameter sensitivity computed");
    results
}

fn analyze_parameter(
    scored: &[ScoredPass],
    parameter: &str,
    aggregate: SensitivityAggregate,
) -> SensitivityResult {
    let mut groups: BTreeMap<&ParamValue, Vec<f64>> = BTreeMap::new();
    for pass in scored {
        if let Some(value) = pass.pass.parameter(parameter) {
            groups.entry(value).or_default().push(pass.composite_score);
        }
    }
    if groups.is_empty() && !scored.is_empty() {
        tracing::warn!(parameter, "No scored pass carries this parameter");
    }

    let levels: Vec<ParameterLevel> = groups
        .into_iter()
        .map(|(value, mut scores)| ParameterLevel {
            value: value.clone(),
            mean_score: mean(&scores),
            median_score: median(&mut scores),
            sample_count: scores.len(),
        })
        .collect();

    let sensitivity = spread(levels.iter().map(|level| level.aggregate_score(aggregate)));
    tracing::debug!(parameter, values = levels.len(), sensitivity, "Parameter analyzed");

    SensitivityResult {
        parameter: parameter.to_string(),
        levels,
        aggregate,
        sensitivity,
    }
}

fn mean(scores: &[f64]) -> f64 {
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn median(scores: &mut [f64]) -> f64 {
    scores.sort_by(f64::total_cmp);
    let mid = scores.len() / 2;
    if scores.len() % 2 == 0 {
        (scores[mid - 1] + scores[mid]) / 2.0
    } else {
        scores[mid]
    }
}

/// max - min, or 0.0 for fewer than two values.
fn spread(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });
    if min.is_finite() && max.is_finite() { max - min } else { 0.0 }
}
