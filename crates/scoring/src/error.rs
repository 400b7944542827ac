use core_types::ConfigurationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Invalid scoring configuration: {0}")]
    Configuration(#[from] ConfigurationError),
}
