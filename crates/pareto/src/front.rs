use crate::dominance::{dominates, orient};
use crate::error::ParetoError;
use configuration::Objective;
use core_types::{ConfigurationError, Pass};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// Pareto outcome for a single pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoResult {
    pub pass_id: usize,
    pub status: ParetoStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParetoStatus {
    Comparable {
        /// True exactly when `dominated_by_count == 0`.
        is_on_front: bool,
        /// Number of comparable passes that dominate this one.
        dominated_by_count: usize,
        /// 1-based layer from non-dominated sorting; 1 is the front itself.
        front_rank: usize,
    },
    /// The pass lacks at least one objective and took no part in the comparison.
    Incomparable { missing_objectives: Vec<String> },
}

impl ParetoResult {
    pub fn is_on_front(&self) -> bool {
        matches!(self.status, ParetoStatus::Comparable { is_on_front: true, .. })
    }

    pub fn is_incomparable(&self) -> bool {
        matches!(self.status, ParetoStatus::Incomparable { .. })
    }

    pub fn dominated_by_count(&self) -> Option<usize> {
        match self.status {
            ParetoStatus::Comparable { dominated_by_count, .. } => Some(dominated_by_count),
            ParetoStatus::Incomparable { .. } => None,
        }
    }

    pub fn front_rank(&self) -> Option<usize> {
        match self.status {
            ParetoStatus::Comparable { front_rank, .. } => Some(front_rank),
            ParetoStatus::Incomparable { .. } => None,
        }
    }
}

/// Computes Pareto front membership, dominance counts and front ranks.
///
/// Results are returned in input order. Membership depends only on the multiset
/// of objective vectors, never on the order of `passes`.
pub fn pareto_front(
    passes: &[Pass],
    objectives: &[Objective],
) -> Result<Vec<ParetoResult>, ParetoError> {
    validate_objectives(passes, objectives)?;

    let oriented: Vec<Result<Vec<f64>, Vec<String>>> =
        passes.iter().map(|pass| orient(pass, objectives)).collect();

    let vectors: Vec<&[f64]> = oriented.iter().filter_map(|v| v.as_deref().ok()).collect();

    // For every comparable pass, the positions (within `vectors`) of the passes it dominates.
    let dominated_sets: Vec<Vec<usize>> = vectors
        .par_iter()
        .map(|a| {
            vectors
                .iter()
                .enumerate()
                .filter(|(_, b)| dominates(a, b))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut dominated_by = vec![0usize; vectors.len()];
    for set in &dominated_sets {
        for &j in set {
            dominated_by[j] += 1;
        }
    }
    let ranks = non_dominated_ranks(&dominated_sets, &dominated_by);

    // Comparable passes appear in `vectors` in input order.
    let mut position = 0;
    let results: Vec<ParetoResult> = passes
        .iter()
        .zip(&oriented)
        .map(|(pass, vector)| {
            let status = match vector {
                Ok(_) => {
                    let dominated_by_count = dominated_by[position];
                    let front_rank = ranks[position];
                    position += 1;
                    ParetoStatus::Comparable {
                        is_on_front: dominated_by_count == 0,
                        dominated_by_count,
                        front_rank,
                    }
                }
                Err(missing) => ParetoStatus::Incomparable {
                    missing_objectives: missing.clone(),
                },
            };
            ParetoResult { pass_id: pass.id, status }
        })
        .collect();

    let front = results.iter().filter(|r| r.is_on_front()).count();
    let incomparable = passes.len() - vectors.len();
    if incomparable > 0 {
        tracing::warn!("{} passes lack an objective metric and were marked incomparable.", incomparable);
    }
    tracing::info!(front, comparable = vectors.len(), "Pareto front computed");
    Ok(results)
}

fn validate_objectives(passes: &[Pass], objectives: &[Objective]) -> Result<(), ConfigurationError> {
    if objectives.is_empty() {
        return Err(ConfigurationError::NoObjectives);
    }
    let mut seen = HashSet::new();
    for objective in objectives {
        if !seen.insert(objective.metric.as_str()) {
            return Err(ConfigurationError::DuplicateObjective(objective.metric.clone()));
        }
        if !passes.iter().any(|p| p.metric(&objective.metric).is_some()) {
            return Err(ConfigurationError::UnknownObjective(objective.metric.clone()));
        }
    }
    Ok(())
}

/// Peels successive non-dominated layers off the comparable set.
fn non_dominated_ranks(dominated_sets: &[Vec<usize>], dominated_by: &[usize]) -> Vec<usize> {
    let mut remaining = dominated_by.to_vec();
    let mut ranks = vec![0usize; remaining.len()];
    let mut layer: Vec<usize> = (0..remaining.len()).filter(|&i| remaining[i] == 0).collect();
    let mut rank = 1;
    while !layer.is_empty() {
        let mut next_layer = Vec::new();
        for &p in &layer {
            ranks[p] = rank;
            for &q in &dominated_sets[p] {
                remaining[q] -= 1;
                if remaining[q] == 0 {
                    next_layer.push(q);
                }
            }
        }
        layer = next_layer;
        rank += 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Direction;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn objectives() -> Vec<Objective> {
        vec![
            Objective::new("profit", Direction::HigherIsBetter),
            Objective::new("drawdown", Direction::LowerIsBetter),
        ]
    }

    fn pass(id: usize, profit: f64, drawdown: f64) -> Pass {
        Pass::new(id)
            .with_metric("profit", profit)
            .with_metric("drawdown", drawdown)
    }

    fn front_ids(results: &[ParetoResult]) -> BTreeSet<usize> {
        results.iter().filter(|r| r.is_on_front()).map(|r| r.pass_id).collect()
    }

    #[test]
    fn trade_offs_share_the_front() {
        let passes = vec![pass(1, 100.0, 50.0), pass(2, 200.0, 80.0), pass(3, 150.0, 30.0)];
        let results = pareto_front(&passes, &objectives()).unwrap();

        assert_eq!(front_ids(&results), BTreeSet::from([2, 3]));
        assert_eq!(results[0].dominated_by_count(), Some(1));
        assert_eq!(results[0].front_rank(), Some(2));
        assert_eq!(results[1].dominated_by_count(), Some(0));
        assert_eq!(results[2].front_rank(), Some(1));
    }

    #[test]
    fn identical_vectors_are_both_on_front() {
        let passes = vec![pass(1, 10.0, 5.0), pass(2, 10.0, 5.0), pass(3, 5.0, 5.0)];
        let results = pareto_front(&passes, &objectives()).unwrap();
        assert_eq!(front_ids(&results), BTreeSet::from([1, 2]));
        assert_eq!(results[2].dominated_by_count(), Some(2));
    }

    #[test]
    fn missing_objective_is_incomparable() {
        let passes = vec![
            pass(1, 100.0, 50.0),
            Pass::new(2).with_metric("profit", 1000.0),
            pass(3, 150.0, 30.0),
        ];
        let results = pareto_front(&passes, &objectives()).unwrap();

        assert!(results[1].is_incomparable());
        assert!(!results[1].is_on_front());
        assert_eq!(results[1].dominated_by_count(), None);
        assert_eq!(
            results[1].status,
            ParetoStatus::Incomparable { missing_objectives: vec!["drawdown".to_string()] }
        );
        // The incomparable pass cannot knock anyone off the front.
        assert_eq!(front_ids(&results), BTreeSet::from([3]));
    }

    #[test]
    fn ranks_follow_layers() {
        let passes = vec![
            pass(1, 1.0, 10.0),
            pass(2, 2.0, 9.0),
            pass(3, 3.0, 8.0),
            pass(4, 3.0, 9.5),
        ];
        let results = pareto_front(&passes, &objectives()).unwrap();
        let ranks: Vec<_> = results.iter().map(|r| r.front_rank().unwrap()).collect();
        assert_eq!(ranks, vec![3, 2, 1, 2]);
    }

    #[test]
    fn objective_errors() {
        let passes = vec![pass(1, 1.0, 1.0)];
        assert_eq!(
            pareto_front(&passes, &[]),
            Err(ParetoError::Configuration(ConfigurationError::NoObjectives))
        );
        let unknown = vec![Objective::new("sharpe", Direction::HigherIsBetter)];
        assert_eq!(
            pareto_front(&passes, &unknown),
            Err(ParetoError::Configuration(ConfigurationError::UnknownObjective("sharpe".into())))
        );
        let mut duplicated = objectives();
        duplicated.push(duplicated[0].clone());
        assert!(matches!(
            pareto_front(&passes, &duplicated),
            Err(ParetoError::Configuration(ConfigurationError::DuplicateObjective(_)))
        ));
    }

    #[test]
    fn serializes_with_status_tag() {
        let passes = vec![pass(1, 1.0, 1.0)];
        let results = pareto_front(&passes, &objectives()).unwrap();
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["status"]["status"], "comparable");
        assert_eq!(json["status"]["is_on_front"], true);
    }

    fn rows() -> impl Strategy<Value = Vec<(f64, f64)>> {
        // A coarse grid makes ties and partial ties common.
        prop::collection::vec((0u8..8, 0u8..8), 1..40)
            .prop_map(|v| v.into_iter().map(|(p, d)| (p as f64, d as f64)).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn front_is_closed_under_dominance(rows in rows()) {
            let passes: Vec<Pass> = rows
                .iter()
                .enumerate()
                .map(|(i, (p, d))| pass(i, *p, *d))
                .collect();
            let results = pareto_front(&passes, &objectives()).unwrap();
            let vectors: Vec<Vec<f64>> = passes
                .iter()
                .map(|p| orient(p, &objectives()).unwrap())
                .collect();

            for (i, result) in results.iter().enumerate() {
                let has_dominator = vectors.iter().any(|q| dominates(q, &vectors[i]));
                prop_assert_eq!(result.is_on_front(), !has_dominator);
                prop_assert_eq!(result.is_on_front(), result.dominated_by_count() == Some(0));
                prop_assert_eq!(result.is_on_front(), result.front_rank() == Some(1));
            }
        }

        #[test]
        fn front_is_independent_of_input_order(
            (rows, shuffled) in rows().prop_flat_map(|rows| {
                let indexed: Vec<(usize, (f64, f64))> = rows.iter().copied().enumerate().collect();
                (Just(rows), Just(indexed).prop_shuffle())
            }),
        ) {
            let passes: Vec<Pass> = rows
                .iter()
                .enumerate()
                .map(|(i, (p, d))| pass(i, *p, *d))
                .collect();
            let reordered: Vec<Pass> = shuffled
                .iter()
                .map(|(i, (p, d))| pass(*i, *p, *d))
                .collect();

            let a = pareto_front(&passes, &objectives()).unwrap();
            let b = pareto_front(&reordered, &objectives()).unwrap();
            prop_assert_eq!(front_ids(&a), front_ids(&b));
        }
    }
}
