use core_types::Pass;
use serde::Serialize;
use std::collections::BTreeMap;

/// A pass together with its position on the common scoring scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPass {
    #[serde(flatten)]
    pub pass: Pass,
    /// Weighted sum of the normalized metrics. Only comparable within one run.
    pub composite_score: f64,
    /// Every weighted metric mapped into 0..1, where 1.0 is best.
    pub normalized_metrics: BTreeMap<String, f64>,
    /// Weighted metrics this pass did not report (scored as 0.0).
    pub missing_metrics: Vec<String>,
}

impl ScoredPass {
    pub fn id(&self) -> usize {
        self.pass.id
    }

    pub fn is_complete(&self) -> bool {
        self.missing_metrics.is_empty()
    }
}
