use configuration::{Filters, SuggestionSettings};
use core_types::ParamValue;
use scoring::ScoredPass;
use serde::Serialize;
use std::collections::BTreeMap;

/// Recommended parameter sets for different risk appetites.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Suggestions {
    /// Highest profit among passes with enough trades.
    pub aggressive: Option<Suggestion>,
    /// Highest composite score.
    pub balanced: Option<Suggestion>,
    /// Lowest drawdown among passes that are profitable with a positive Sharpe ratio.
    pub conservative: Option<Suggestion>,
    /// Interquartile ranges of each numeric parameter over the best-scoring passes.
    pub robust_ranges: Vec<RobustRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub pass_id: usize,
    pub parameters: BTreeMap<String, ParamValue>,
    pub composite_score: f64,
    pub profit: Option<f64>,
    pub sharpe: Option<f64>,
    pub drawdown: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobustRange {
    pub parameter: String,
    pub q1: f64,
    pub q3: f64,
    pub sample_count: usize,
}

/// Builds the suggestion cards from the ranking (best composite score first).
///
/// Missing profit, Sharpe, drawdown or trade values count as 0.
pub fn build_suggestions(
    ranking: &[ScoredPass],
    parameter_names: &[String],
    settings: &SuggestionSettings,
    filters: &Filters,
) -> Suggestions {
    if ranking.is_empty() {
        return Suggestions::default();
    }
    let value = |pass: &ScoredPass, metric: &str| pass.pass.metric(metric).unwrap_or(0.0);
    let profit = |p: &ScoredPass| value(p, settings.profit_metric.as_str());
    let sharpe = |p: &ScoredPass| value(p, settings.sharpe_metric.as_str());
    let drawdown = |p: &ScoredPass| value(p, settings.drawdown_metric.as_str());
    let trades = |p: &ScoredPass| value(p, filters.trades_metric.as_str());

    let active = subset_or_all(ranking, |p| trades(p) >= settings.aggressive_min_trades as f64);
    let aggressive = first_best(&active, |a, b| profit(a) > profit(b));

    let positive = subset_or_all(ranking, |p| profit(p) > 0.0 && sharpe(p) > 0.0);
    let conservative = first_best(&positive, |a, b| drawdown(a) < drawdown(b));

    let top_n = top_count(ranking.len(), settings);
    let robust_ranges = robust_ranges(&ranking[..top_n], parameter_names);

    let card = |p: &ScoredPass| Suggestion {
        pass_id: p.id(),
        parameters: p.pass.parameters.clone(),
        composite_score: p.composite_score,
        profit: p.pass.metric(&settings.profit_metric),
        sharpe: p.pass.metric(&settings.sharpe_metric),
        drawdown: p.pass.metric(&settings.drawdown_metric),
    };

    Suggestions {
        aggressive: aggressive.map(card),
        balanced: ranking.first().map(card),
        conservative: conservative.map(card),
        robust_ranges,
    }
}

/// Number of top passes used for the robust ranges: `max(top_min, n * top_fraction)`, at most `n`.
pub fn top_count(len: usize, settings: &SuggestionSettings) -> usize {
    let fraction = (len as f64 * settings.top_fraction).floor() as usize;
    fraction.max(settings.top_min).min(len)
}

fn subset_or_all<'a>(
    ranking: &'a [ScoredPass],
    keep: impl Fn(&ScoredPass) -> bool,
) -> Vec<&'a ScoredPass> {
    let subset: Vec<&ScoredPass> = ranking.iter().filter(|&p| keep(p)).collect();
    if subset.is_empty() {
        ranking.iter().collect()
    } else {
        subset
    }
}

/// The first pass no later pass beats; earlier (better-ranked) passes win ties.
fn first_best<'a>(
    candidates: &[&'a ScoredPass],
    beats: impl Fn(&ScoredPass, &ScoredPass) -> bool,
) -> Option<&'a ScoredPass> {
    candidates.iter().copied().fold(None, |best, candidate| match best {
        Some(current) if !beats(candidate, current) => Some(current),
        _ => Some(candidate),
    })
}

fn robust_ranges(top: &[ScoredPass], parameter_names: &[String]) -> Vec<RobustRange> {
    parameter_names
        .iter()
        .filter_map(|name| {
            let mut values: Vec<f64> = top
                .iter()
                .filter_map(|p| p.pass.parameter(name).and_then(ParamValue::as_f64))
                .collect();
            if values.is_empty() {
                return None;
            }
            values.sort_by(f64::total_cmp);
            Some(RobustRange {
                parameter: name.clone(),
                q1: quantile(&values, 0.25),
                q3: quantile(&values, 0.75),
                sample_count: values.len(),
            })
        })
        .collect()
}

/// Linearly interpolated quantile of sorted, non-empty values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}
