use configuration::Objective;
use core_types::Pass;

/// Returns true if `a` dominates `b`.
///
/// Both vectors must already be oriented so that larger is better on every
/// coordinate (see `orient`). Identical vectors never dominate each other.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    debug_assert_eq!(a.len(), b.len(), "objective vectors differ in length");
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x < y {
            return false;
        }
        if x > y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Builds the oriented objective vector of a pass, or the list of objectives it lacks.
pub fn orient(pass: &Pass, objectives: &[Objective]) -> Result<Vec<f64>, Vec<String>> {
    let mut vector = Vec::with_capacity(objectives.len());
    let mut missing = Vec::new();
    for objective in objectives {
        match pass.metric(&objective.metric) {
            Some(value) => vector.push(objective.direction.orient(value)),
            None => missing.push(objective.metric.clone()),
        }
    }
    if missing.is_empty() { Ok(vector) } else { Err(missing) }
}
