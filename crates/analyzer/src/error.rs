use configuration::error::ConfigError;
use pareto::ParetoError;
use scoring::ScoringError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("No passes were supplied for analysis")]
    NoPassesFound,

    #[error("Pass {pass_id} does not carry the same parameter names as the first pass")]
    InconsistentParameters { pass_id: usize },

    #[error("Pass id {0} appears more than once")]
    DuplicatePassId(usize),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Pareto analysis error: {0}")]
    Pareto(#[from] ParetoError),
}
