use crate::error::ConfigError;
use core_types::Direction;
use serde::{Deserialize, Serialize};

/// Configuration for scoring, Pareto analysis, sensitivity and suggestions.
/// This is deserialized from an `analysis.toml` file; every section is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Metrics used by the composite score. Weights do not have to sum to 1.0.
    pub metrics: Vec<MetricSpec>,
    /// Metrics the Pareto front is computed over.
    pub objectives: Vec<Objective>,
    /// What a pass missing a weighted metric receives.
    pub missing_metric_policy: MissingMetricPolicy,
    /// Hard filters to discard unusable passes before scoring.
    pub filters: Filters,
    pub sensitivity: SensitivitySettings,
    pub suggestions: SuggestionSettings,
    pub ranking: RankingSettings,
}

/// Scoring rule for a single metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Column name as it appears in the pass records (e.g. "Profit").
    pub metric: String,
    /// Zero excludes the metric from scoring.
    #[serde(default)]
    pub weight: f64,
    #[serde(default = "default_direction")]
    pub direction: Direction,
    #[serde(default)]
    pub normalization: Normalization,
}

impl MetricSpec {
    pub fn new(metric: &str, weight: f64, direction: Direction, normalization: Normalization) -> Self {
        Self {
            metric: metric.to_string(),
            weight,
            direction,
            normalization,
        }
    }
}

/// One axis of the Pareto comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub metric: String,
    #[serde(default = "default_direction")]
    pub direction: Direction,
}

impl Objective {
    pub fn new(metric: &str, direction: Direction) -> Self {
        Self {
            metric: metric.to_string(),
            direction,
        }
    }
}

fn default_direction() -> Direction {
    Direction::HigherIsBetter
}

/// How raw metric values are mapped onto the common 0..1 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    /// `(v - min) / (max - min)` over every present value in the run.
    #[default]
    MinMax,
    /// Sample z-score squashed into 0..1 with the logistic sigmoid.
    ZScore,
}

/// Treatment of a pass that lacks a weighted metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum MissingMetricPolicy {
    /// The missing metric contributes the worst normalized value, 0.0.
    #[default]
    Worst,
    /// The pass is left out of the scored output altogether.
    Exclude,
}

/// Which per-value aggregate drives a parameter's sensitivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum SensitivityAggregate {
    #[default]
    Mean,
    Median,
}

/// Hard filters applied before any scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Passes with fewer trades than this are dropped. A pass without a trade count
    /// counts as zero when any pass reports one.
    pub min_total_trades: usize,
    pub trades_metric: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivitySettings {
    pub aggregate: SensitivityAggregate,
}

/// Inputs for the recommended-parameter cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionSettings {
    pub profit_metric: String,
    pub drawdown_metric: String,
    pub sharpe_metric: String,
    /// The aggressive pick ignores passes with fewer trades than this.
    pub aggressive_min_trades: usize,
    /// Share of the ranking used for the robust parameter ranges.
    pub top_fraction: f64,
    /// Lower bound on the number of passes used for the robust ranges.
    pub top_min: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    /// Number of ranked passes shown by default.
    pub top_n: usize,
}

// --- Default Implementations ---
// This allows a user to omit any section from their toml
// and still have it work with sensible defaults.

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            metrics: default_metrics(),
            objectives: default_objectives(),
            missing_metric_policy: MissingMetricPolicy::default(),
            filters: Filters::default(),
            sensitivity: SensitivitySettings::default(),
            suggestions: SuggestionSettings::default(),
            ranking: RankingSettings::default(),
        }
    }
}

/// Weights used by the report when the user has not tuned anything.
fn default_metrics() -> Vec<MetricSpec> {
    use Direction::*;
    let z = Normalization::ZScore;
    vec![
        MetricSpec::new("Profit", 0.30, HigherIsBetter, z),
        MetricSpec::new("Equity DD %", 0.25, LowerIsBetter, z),
        MetricSpec::new("Sharpe Ratio", 0.20, HigherIsBetter, z),
        MetricSpec::new("Profit Factor", 0.10, HigherIsBetter, z),
        MetricSpec::new("Recovery Factor", 0.10, HigherIsBetter, z),
        MetricSpec::new("Expected Payoff", 0.05, HigherIsBetter, z),
    ]
}

fn default_objectives() -> Vec<Objective> {
    vec![
        Objective::new("Profit", Direction::HigherIsBetter),
        Objective::new("Sharpe Ratio", Direction::HigherIsBetter),
        Objective::new("Equity DD %", Direction::LowerIsBetter),
    ]
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            min_total_trades: 1, // Zero-trade passes carry no information
            trades_metric: "Trades".to_string(),
        }
    }
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            profit_metric: "Profit".to_string(),
            drawdown_metric: "Equity DD %".to_string(),
            sharpe_metric: "Sharpe Ratio".to_string(),
            aggressive_min_trades: 10,
            top_fraction: 0.2,
            top_min: 10,
        }
    }
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self { top_n: 30 }
    }
}

impl AnalysisConfig {
    /// Rejects settings that can never produce a meaningful analysis.
    ///
    /// Metric names are not checked here; whether they exist depends on the pass set
    /// and is reported by the scoring and Pareto stages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for spec in &self.metrics {
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "weight for '{}' must be a finite, non-negative number (got {})",
                    spec.metric, spec.weight
                )));
            }
        }
        if self.metrics.iter().all(|spec| spec.weight == 0.0) {
            return Err(ConfigError::ValidationError(
                "at least one metric needs a non-zero weight".to_string(),
            ));
        }
        if self.objectives.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one Pareto objective is required".to_string(),
            ));
        }
        let fraction = self.suggestions.top_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "suggestions.top_fraction must be in (0, 1] (got {})",
                fraction
            )));
        }
        Ok(())
    }

    /// Metric specs that take part in scoring.
    pub fn weighted_metrics(&self) -> impl Iterator<Item = &MetricSpec> {
        self.metrics.iter().filter(|spec| spec.weight != 0.0)
    }
}
