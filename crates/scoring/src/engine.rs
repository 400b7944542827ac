use crate::error::ScoringError;
use crate::normalize::{MISSING_SCORE, Normalizer};
use crate::scored::ScoredPass;
use configuration::{MetricSpec, MissingMetricPolicy};
use core_types::{ConfigurationError, Pass};
use std::collections::{BTreeMap, HashSet};

/// A weighted metric with its normalizer fitted to the current pass set.
struct FittedMetric<'a> {
    spec: &'a MetricSpec,
    normalizer: Normalizer,
}

impl FittedMetric<'_> {
    /// Direction-adjusted value in 0..1 where 1.0 is best.
    fn normalize(&self, value: f64) -> f64 {
        let normalized = self.normalizer.apply(value);
        if self.normalizer.is_constant() {
            // No discrimination is possible, so direction has nothing to flip.
            normalized
        } else {
            self.spec.direction.adjust_unit(normalized)
        }
    }
}

/// A stateless calculator for composite pass scores.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringEngine {
    policy: MissingMetricPolicy,
}

impl ScoringEngine {
    pub fn new(policy: MissingMetricPolicy) -> Self {
        Self { policy }
    }

    /// The main entry point for scoring a pass set.
    ///
    /// # Arguments
    ///
    /// * `passes` - Every pass of the run. Statistics are computed over this whole set.
    /// * `specs` - Scoring rule per metric. Zero-weight specs are ignored.
    ///
    /// # Returns
    ///
    /// The scored passes in input order, or a `ScoringError` if the configuration
    /// cannot produce a meaningful score. Passes missing a weighted metric are
    /// handled by the missing-metric policy and never cause an error.
    pub fn score(
        &self,
        passes: &[Pass],
        specs: &[MetricSpec],
    ) -> Result<Vec<ScoredPass>, ScoringError> {
        let fitted = fit_metrics(passes, specs)?;

        let mut excluded = 0usize;
        let scored: Vec<ScoredPass> = passes
            .iter()
            .filter_map(|pass| {
                let scored = score_pass(pass, &fitted);
                if self.policy == MissingMetricPolicy::Exclude && !scored.is_complete() {
                    tracing::debug!(
                        pass_id = pass.id,
                        missing = ?scored.missing_metrics,
                        "Excluding pass with missing weighted metrics"
                    );
                    excluded += 1;
                    return None;
                }
                Some(scored)
            })
            .collect();

        if excluded > 0 {
            tracing::warn!("{} passes were excluded for missing weighted metrics.", excluded);
        }
        tracing::info!(
            passes = scored.len(),
            metrics = fitted.len(),
            "Composite scores computed"
        );
        Ok(scored)
    }
}

/// Validates the specs and fits one normalizer per weighted metric.
fn fit_metrics<'a>(
    passes: &[Pass],
    specs: &'a [MetricSpec],
) -> Result<Vec<FittedMetric<'a>>, ConfigurationError> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.metric.as_str()) {
            return Err(ConfigurationError::DuplicateMetric(spec.metric.clone()));
        }
        if !spec.weight.is_finite() || spec.weight < 0.0 {
            return Err(ConfigurationError::InvalidWeight {
                metric: spec.metric.clone(),
                weight: spec.weight,
            });
        }
    }

    let weighted: Vec<&MetricSpec> = specs.iter().filter(|spec| spec.weight > 0.0).collect();
    if weighted.is_empty() {
        return Err(ConfigurationError::NoWeightedMetrics);
    }

    weighted
        .into_iter()
        .map(|spec| {
            let values: Vec<f64> = passes.iter().filter_map(|p| p.metric(&spec.metric)).collect();
            let normalizer = Normalizer::fit(spec.normalization, &values)
                .ok_or_else(|| ConfigurationError::UnknownMetric(spec.metric.clone()))?;
            tracing::debug!(
                metric = %spec.metric,
                present = values.len(),
                normalizer = ?normalizer,
                "Fitted metric normalizer"
            );
            Ok(FittedMetric { spec, normalizer })
        })
        .collect()
}

fn score_pass(pass: &Pass, fitted: &[FittedMetric<'_>]) -> ScoredPass {
    let mut normalized_metrics = BTreeMap::new();
    let mut missing_metrics = Vec::new();
    let mut composite_score = 0.0;

    for metric in fitted {
        let name = &metric.spec.metric;
        let normalized = match pass.metric(name) {
            Some(value) => metric.normalize(value),
            None => {
                missing_metrics.push(name.clone());
                MISSING_SCORE
            }
        };
        composite_score += metric.spec.weight * normalized;
        normalized_metrics.insert(name.clone(), normalized);
    }

    ScoredPass {
        pass: pass.clone(),
        composite_score,
        normalized_metrics,
        missing_metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::Normalization;
    use core_types::Direction;
    use proptest::prelude::*;

    fn pass(id: usize, profit: f64, drawdown: f64) -> Pass {
        Pass::new(id)
            .with_metric("profit", profit)
            .with_metric("drawdown", drawdown)
    }

    fn specs(normalization: Normalization) -> Vec<MetricSpec> {
        vec![
            MetricSpec::new("profit", 1.0, Direction::HigherIsBetter, normalization),
            MetricSpec::new("drawdown", 1.0, Direction::LowerIsBetter, normalization),
        ]
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn min_max_with_mixed_directions() {
        let passes = vec![pass(1, 100.0, 50.0), pass(2, 200.0, 80.0), pass(3, 150.0, 30.0)];
        let scored = ScoringEngine::default()
            .score(&passes, &specs(Normalization::MinMax))
            .unwrap();

        // profit: 0, 1, 0.5 ; drawdown inverted: 0.6, 0, 1
        assert!(close(scored[0].composite_score, 0.6));
        assert!(close(scored[1].composite_score, 1.0));
        assert!(close(scored[2].composite_score, 1.5));
        assert!(close(scored[2].normalized_metrics["drawdown"], 1.0));
        assert_eq!(scored.iter().map(|s| s.id()).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_metric_scores_worst_without_nan() {
        let passes = vec![
            pass(1, 100.0, 50.0),
            pass(2, 200.0, 80.0),
            Pass::new(3).with_metric("profit", 150.0),
        ];
        let scored = ScoringEngine::new(MissingMetricPolicy::Worst)
            .score(&passes, &specs(Normalization::MinMax))
            .unwrap();

        let incomplete = &scored[2];
        assert_eq!(incomplete.normalized_metrics["drawdown"], MISSING_SCORE);
        assert_eq!(incomplete.missing_metrics, vec!["drawdown".to_string()]);
        assert!(incomplete.composite_score.is_finite());
        assert!(close(incomplete.composite_score, 0.5));
    }

    #[test]
    fn nan_metric_is_treated_as_missing() {
        let passes = vec![pass(1, 100.0, 50.0), pass(2, f64::NAN, 80.0), pass(3, 300.0, 20.0)];
        let scored = ScoringEngine::default()
            .score(&passes, &specs(Normalization::ZScore))
            .unwrap();
        assert!(scored.iter().all(|s| s.composite_score.is_finite()));
        assert_eq!(scored[1].normalized_metrics["profit"], MISSING_SCORE);
    }

    #[test]
    fn exclude_policy_drops_incomplete_passes() {
        let passes = vec![
            pass(1, 100.0, 50.0),
            Pass::new(2).with_metric("profit", 400.0),
            pass(3, 150.0, 30.0),
        ];
        let scored = ScoringEngine::new(MissingMetricPolicy::Exclude)
            .score(&passes, &specs(Normalization::MinMax))
            .unwrap();
        assert_eq!(scored.iter().map(|s| s.id()).collect::<Vec<_>>(), vec![1, 3]);
        // Pass 2 still counts toward the profit range.
        assert!(close(scored[1].normalized_metrics["profit"], 50.0 / 300.0));
    }

    #[test]
    fn constant_metric_is_not_penalized_in_either_direction() {
        let passes = vec![pass(1, 10.0, 5.0), pass(2, 20.0, 5.0)];
        let scored = ScoringEngine::default()
            .score(&passes, &specs(Normalization::MinMax))
            .unwrap();
        assert!(scored.iter().all(|s| s.normalized_metrics["drawdown"] == 1.0));
    }

    #[test]
    fn weights_are_not_renormalized() {
        let passes = vec![pass(1, 100.0, 50.0), pass(2, 200.0, 80.0), pass(3, 150.0, 30.0)];
        let single = specs(Normalization::MinMax);
        let doubled: Vec<MetricSpec> = single
            .iter()
            .cloned()
            .map(|mut s| {
                s.weight *= 2.0;
                s
            })
            .collect();
        let engine = ScoringEngine::default();
        let a = engine.score(&passes, &single).unwrap();
        let b = engine.score(&passes, &doubled).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!(close(2.0 * x.composite_score, y.composite_score));
        }
    }

    #[test]
    fn zero_weight_metrics_are_ignored() {
        let passes = vec![pass(1, 100.0, 50.0), pass(2, 200.0, 80.0)];
        let mut config = specs(Normalization::MinMax);
        config[1].weight = 0.0;
        config.push(MetricSpec::new("absent", 0.0, Direction::HigherIsBetter, Normalization::MinMax));
        let scored = ScoringEngine::default().score(&passes, &config).unwrap();
        assert!(!scored[0].normalized_metrics.contains_key("drawdown"));
        assert!(close(scored[1].composite_score, 1.0));
    }

    #[test]
    fn configuration_errors() {
        let passes = vec![pass(1, 100.0, 50.0)];
        let engine = ScoringEngine::default();

        let unknown = vec![MetricSpec::new("sharpe", 1.0, Direction::HigherIsBetter, Normalization::MinMax)];
        assert_eq!(
            engine.score(&passes, &unknown),
            Err(ScoringError::Configuration(ConfigurationError::UnknownMetric("sharpe".into())))
        );

        let mut zero = specs(Normalization::MinMax);
        zero.iter_mut().for_each(|s| s.weight = 0.0);
        assert_eq!(
            engine.score(&passes, &zero),
            Err(ScoringError::Configuration(ConfigurationError::NoWeightedMetrics))
        );
        assert_eq!(
            engine.score(&passes, &[]),
            Err(ScoringError::Configuration(ConfigurationError::NoWeightedMetrics))
        );

        let mut duplicated = specs(Normalization::MinMax);
        duplicated.push(duplicated[0].clone());
        assert!(matches!(
            engine.score(&passes, &duplicated),
            Err(ScoringError::Configuration(ConfigurationError::DuplicateMetric(_)))
        ));

        let mut negative = specs(Normalization::MinMax);
        negative[0].weight = -1.0;
        assert!(matches!(
            engine.score(&passes, &negative),
            Err(ScoringError::Configuration(ConfigurationError::InvalidWeight { .. }))
        ));
    }

    #[test]
    fn extreme_metric_range_never_yields_nan() {
        let passes: Vec<Pass> = [-1e308, 0.0, 1e308]
            .iter()
            .enumerate()
            .map(|(i, v)| Pass::new(i).with_metric("m", *v))
            .collect();
        for normalization in [Normalization::MinMax, Normalization::ZScore] {
            let spec = [MetricSpec::new("m", 1.0, Direction::HigherIsBetter, normalization)];
            let scored = ScoringEngine::default().score(&passes, &spec).unwrap();
            let scores: Vec<f64> = scored.iter().map(|s| s.composite_score).collect();
            assert!(scores.iter().all(|v| v.is_finite()), "{:?}: {:?}", normalization, scores);
            assert!(scores[0] < scores[1] && scores[1] < scores[2], "{:?}: {:?}", normalization, scores);
        }
    }

    fn normalization_strategy() -> impl Strategy<Value = Normalization> {
        prop_oneof![Just(Normalization::MinMax), Just(Normalization::ZScore)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn min_max_values_stay_in_unit_range(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..40),
        ) {
            let passes: Vec<Pass> = values
                .iter()
                .enumerate()
                .map(|(i, v)| Pass::new(i).with_metric("m", *v))
                .collect();
            let spec = [MetricSpec::new("m", 1.0, Direction::HigherIsBetter, Normalization::MinMax)];
            let scored = ScoringEngine::default().score(&passes, &spec).unwrap();
            for s in &scored {
                let v = s.normalized_metrics["m"];
                prop_assert!((0.0..=1.0).contains(&v), "normalized {} outside [0,1]", v);
            }
        }

        #[test]
        fn inverting_values_and_direction_keeps_scores(
            rows in prop::collection::vec((-1.0e4f64..1.0e4, 0.0f64..100.0), 1..30),
            normalization in normalization_strategy(),
        ) {
            let original: Vec<Pass> = rows
                .iter()
                .enumerate()
                .map(|(i, (p, d))| pass(i, *p, *d))
                .collect();
            let inverted: Vec<Pass> = rows
                .iter()
                .enumerate()
                .map(|(i, (p, d))| pass(i, -*p, -*d))
                .collect();
            let forward = specs(normalization);
            let flipped: Vec<MetricSpec> = forward
                .iter()
                .cloned()
                .map(|mut s| {
                    s.direction = s.direction.opposite();
                    s
                })
                .collect();

            let engine = ScoringEngine::default();
            let a = engine.score(&original, &forward).unwrap();
            let b = engine.score(&inverted, &flipped).unwrap();
            for (x, y) in a.iter().zip(&b) {
                prop_assert!(
                    (x.composite_score - y.composite_score).abs() < 1e-9,
                    "pass {}: {} != {}", x.id(), x.composite_score, y.composite_score
                );
            }
        }
    }
}
