//! Multi-objective Pareto analysis of optimizer passes.
//!
//! A pass is on the front when no other pass is at least as good on every
//! objective and strictly better on one. Passes that lack an objective metric
//! cannot be compared and are reported as `Incomparable` instead of being
//! counted as dominated or non-dominated.

pub mod dominance;
pub mod error;
pub mod front;

pub use dominance::{dominates, orient};
pub use error::ParetoError;
pub use front::{ParetoResult, ParetoStatus, pareto_front};
