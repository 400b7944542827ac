use thiserror::Error;

/// Raised when a scoring or Pareto configuration cannot produce a meaningful result.
/// Always aborts the run; nothing is partially computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Metric '{0}' is not present in any pass")]
    UnknownMetric(String),

    #[error("Metric '{0}' is configured more than once")]
    DuplicateMetric(String),

    #[error("Metric '{metric}' has an invalid weight {weight}; weights must be finite and non-negative")]
    InvalidWeight { metric: String, weight: f64 },

    #[error("No metric carries a non-zero weight, nothing to score")]
    NoWeightedMetrics,

    #[error("Objective metric '{0}' is not present in any pass")]
    UnknownObjective(String),

    #[error("Objective metric '{0}' is listed more than once")]
    DuplicateObjective(String),

    #[error("At least one objective is required for Pareto analysis")]
    NoObjectives,
}
