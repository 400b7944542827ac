use crate::error::AnalyzerError;
use crate::suggest::{Suggestions, build_suggestions};
use crate::summary::{ParameterRange, RunSummary, parameter_ranges};
use chrono::Utc;
use configuration::AnalysisConfig;
use core_types::Pass;
use pareto::{ParetoResult, pareto_front};
use scoring::{ScoredPass, ScoringEngine};
use sensitivity::SensitivityResult;
use serde::Serialize;
use std::collections::HashSet;

pub mod error;
pub mod suggest;
pub mod summary;

/// Everything the report renderer needs from one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: RunSummary,
    /// Scored passes, best composite score first.
    pub ranking: Vec<ScoredPass>,
    /// Pareto outcome per analyzed pass, in input order.
    pub pareto: Vec<ParetoResult>,
    /// Parameters by descending sensitivity.
    pub sensitivity: Vec<SensitivityResult>,
    pub parameter_ranges: Vec<ParameterRange>,
    pub suggestions: Suggestions,
}

/// The main analysis engine.
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Filters, scores, ranks and explains all passes of one optimizer run.
    pub fn run(&self, passes: Vec<Pass>) -> Result<AnalysisReport, AnalyzerError> {
        self.config.validate()?;

        // 1. Validate
        if passes.is_empty() {
            return Err(AnalyzerError::NoPassesFound);
        }
        let parameter_names = parameter_names(&passes)?;
        check_unique_ids(&passes)?;
        let total_passes = passes.len();

        // 2. Filter
        let filtered = self.filter_passes(passes);
        let filtered_out = total_passes - filtered.len();
        if filtered.is_empty() {
            tracing::warn!("All {} passes were removed by the filters.", total_passes);
            return Ok(self.empty_report(&parameter_names, total_passes));
        }

        // 3. Score, rank and explain. Pareto does not need scores, so it runs alongside.
        let (scored, pareto) = rayon::join(
            || self.score_and_explain(&filtered, &parameter_names),
            || pareto_front(&filtered, &self.config.objectives),
        );
        let (ranking, sensitivity) = scored?;
        let pareto = pareto?;

        // 4. Summarize
        let summary = RunSummary {
            parameter_count: parameter_names.len(),
            total_passes,
            filtered_out,
            analyzed_passes: filtered.len(),
            scored_passes: ranking.len(),
            profitable_passes: filtered
                .iter()
                .filter(|p| p.metric(&self.config.suggestions.profit_metric).is_some_and(|v| v > 0.0))
                .count(),
            pareto_front_size: pareto.iter().filter(|r| r.is_on_front()).count(),
            incomparable_passes: pareto.iter().filter(|r| r.is_incomparable()).count(),
            generated_at: Utc::now(),
        };
        let suggestions = build_suggestions(
            &ranking,
            &parameter_names,
            &self.config.suggestions,
            &self.config.filters,
        );

        tracing::info!(
            analyzed = summary.analyzed_passes,
            front = summary.pareto_front_size,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            summary,
            parameter_ranges: parameter_ranges(&filtered, &parameter_names),
            ranking,
            pareto,
            sensitivity,
            suggestions,
        })
    }

    /// Applies hard filters to remove unusable passes.
    ///
    /// When the export has a trade-count column, a pass with no usable value in it
    /// counts as zero trades. Without the column nothing is filtered.
    fn filter_passes(&self, passes: Vec<Pass>) -> Vec<Pass> {
        let filters = &self.config.filters;
        let has_trades = passes
            .iter()
            .any(|p| p.metrics.contains_key(&filters.trades_metric));
        if !has_trades {
            tracing::warn!(
                "No pass reports '{}', the trade filter is skipped.",
                filters.trades_metric
            );
            return passes;
        }
        passes
            .into_iter()
            .filter(|p| {
                p.metric(&filters.trades_metric).unwrap_or(0.0) >= filters.min_total_trades as f64
            })
            .collect()
    }

    fn score_and_explain(
        &self,
        passes: &[Pass],
        parameter_names: &[String],
    ) -> Result<(Vec<ScoredPass>, Vec<SensitivityResult>), AnalyzerError> {
        let engine = ScoringEngine::new(self.config.missing_metric_policy);
        let ranking = rank(engine.score(passes, &self.config.metrics)?);
        let sensitivity =
            sensitivity::analyze(&ranking, parameter_names, self.config.sensitivity.aggregate);
        Ok((ranking, sensitivity))
    }

    fn empty_report(&self, parameter_names: &[String], total_passes: usize) -> AnalysisReport {
        AnalysisReport {
            summary: RunSummary {
                parameter_count: parameter_names.len(),
                total_passes,
                filtered_out: total_passes,
                analyzed_passes: 0,
                scored_passes: 0,
                profitable_passes: 0,
                pareto_front_size: 0,
                incomparable_passes: 0,
                generated_at: Utc::now(),
            },
            ranking: Vec::new(),
            pareto: Vec::new(),
            sensitivity: Vec::new(),
            parameter_ranges: Vec::new(),
            suggestions: Suggestions::default(),
        }
    }
}

/// Sorts by composite score, best first. Equal scores keep export order.
fn rank(mut scored: Vec<ScoredPass>) -> Vec<ScoredPass> {
    scored.sort_by(|a, b| {
        b.composite_score
            .total_cmp(&a.composite_score)
            .then_with(|| a.id().cmp(&b.id()))
    });
    scored
}

/// Parameter names of the run, checking every pass carries the same set.
fn parameter_names(passes: &[Pass]) -> Result<Vec<String>, AnalyzerError> {
    let first = &passes[0];
    if let Some(odd) = passes
        .iter()
        .find(|p| !p.parameters.keys().eq(first.parameters.keys()))
    {
        return Err(AnalyzerError::InconsistentParameters { pass_id: odd.id });
    }
    Ok(first.parameters.keys().cloned().collect())
}

fn check_unique_ids(passes: &[Pass]) -> Result<(), AnalyzerError> {
    let mut seen = HashSet::with_capacity(passes.len());
    match passes.iter().find(|p| !seen.insert(p.id)) {
        Some(duplicate) => Err(AnalyzerError::DuplicatePassId(duplicate.id)),
        None => Ok(()),
    }
}
