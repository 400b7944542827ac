use core_types::ConfigurationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParetoError {
    #[error("Invalid Pareto objectives: {0}")]
    Configuration(#[from] ConfigurationError),
}
