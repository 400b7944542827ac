//! # Parameter Sensitivity
//!
//! Measures how much the choice of each parameter's value moves the composite score.
//!
//! For every parameter the scored passes are grouped by the value they tested, and
//! the mean and median composite score of each group is computed. A parameter's
//! `sensitivity` is the spread (max - min) of the selected aggregate across its
//! values, and parameters are ranked by it.
//!
//! ## Limitations
//!
//! This is a marginal view. Each parameter is analyzed on its own, averaging over
//! whatever the other parameters happened to be in each pass; nothing is held
//! constant and interaction effects are not modeled. A large spread says the
//! parameter's value co-varies with the score in this pass set, not that it causes it.

pub mod analysis;

pub use analysis::{ParameterLevel, SensitivityResult, analyze};
