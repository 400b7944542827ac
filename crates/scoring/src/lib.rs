//! # Composite Scoring Engine
//!
//! Reduces the differently scaled, differently directioned metrics of every
//! optimizer pass into one comparable composite score.
//!
//! ## Architectural Principles
//!
//! - **Stateless Calculation:** `ScoringEngine` holds only its policy. All statistics
//!   are derived from the pass set handed to `score`, so two runs with different
//!   configurations can never influence each other.
//! - **Common Scale:** every weighted metric is normalized into 0..1 and adjusted so
//!   that 1.0 is always the best value before weights are applied.
//! - **Run-local Scores:** composite scores are only comparable within one pass set
//!   and one weight configuration. Weights are applied as given, never renormalized.
//!
//! ## Public API
//!
//! - `ScoringEngine`: normalizes metrics and computes composite scores.
//! - `ScoredPass`: a pass with its composite score and normalized metrics.
//! - `ScoringError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod normalize;
pub mod scored;

// Re-export the key components to create a clean, public-facing API.
pub use engine::ScoringEngine;
pub use error::ScoringError;
pub use normalize::Normalizer;
pub use scored::ScoredPass;
