use serde::{Deserialize, Serialize};

/// Which way a metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "higher-is-better")]
    HigherIsBetter,
    #[serde(rename = "lower-is-better")]
    LowerIsBetter,
}

impl Direction {
    /// Returns the opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            Direction::HigherIsBetter => Direction::LowerIsBetter,
            Direction::LowerIsBetter => Direction::HigherIsBetter,
        }
    }

    /// Maps a raw value onto an axis where larger always means better.
    pub fn orient(&self, value: f64) -> f64 {
        match self {
            Direction::HigherIsBetter => value,
            Direction::LowerIsBetter => -value,
        }
    }

    /// Adjusts a value already normalized into 0..1 so that 1.0 is the best outcome.
    pub fn adjust_unit(&self, normalized: f64) -> f64 {
        match self {
            Direction::HigherIsBetter => normalized,
            Direction::LowerIsBetter => 1.0 - normalized,
        }
    }
}
