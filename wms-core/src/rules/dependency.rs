//! Job dependency evaluation
//!
//! An edge `(job_id, required_job_id)` means a barcode must have been
//! scanned under `required_job_id` before it may be scanned under `job_id`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A prerequisite job, as listed for a dependent job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequiredJob {
    pub job_id: i64,
    pub job_name: String,
}

/// Required jobs with no scan of the barcode, sorted by job name.
///
/// `scanned_job_ids` is every job id the barcode has ever been scanned
/// under. An empty result means the scan may proceed.
pub fn missing_requirements(
    required: &[RequiredJob],
    scanned_job_ids: &HashSet<i64>,
) -> Vec<RequiredJob> {
    let mut missing: Vec<RequiredJob> = required
        .iter()
        .filter(|r| !scanned_job_ids.contains(&r.job_id))
        .cloned()
        .collect();
    missing.sort_by(|a, b| a.job_name.cmp(&b.job_name));
    missing.dedup_by_key(|r| r.job_id);
    missing
}

/// Whether adding `job_id -> required_job_id` to `edges` closes a cycle.
///
/// Self-edges count as cycles. Otherwise a cycle exists when `job_id` is
/// already reachable from `required_job_id`.
pub fn would_create_cycle(edges: &[(i64, i64)], job_id: i64, required_job_id: i64) -> bool {
    if job_id == required_job_id {
        return true;
    }

    let mut adjacency: HashMap<i64, Vec<i64>> = HashMap::new();
    for &(from, to) in edges {
        adjacency.entry(from).or_default().push(to);
    }

    let mut stack = vec![required_job_id];
    let mut seen = HashSet::new();
    while let Some(node) = stack.pop() {
        if node == job_id {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = adjacency.get(&node) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: i64, name: &str) -> RequiredJob {
        RequiredJob {
            job_id: id,
            job_name: name.to_owned(),
        }
    }

    #[test]
    fn nothing_missing_when_all_scanned() {
        let required = vec![req(1, "1.Release"), req(2, "2.Inprocess")];
        let scanned: HashSet<i64> = [1, 2, 9].into_iter().collect();
        assert!(missing_requirements(&required, &scanned).is_empty());
    }

    #[test]
    fn reports_every_missing_job_by_name() {
        let required = vec![req(3, "3.Outbound"), req(1, "1.Release"), req(2, "2.Inprocess")];
        let scanned: HashSet<i64> = [2].into_iter().collect();
        let missing = missing_requirements(&required, &scanned);
        let names: Vec<&str> = missing.iter().map(|r| r.job_name.as_str()).collect();
        assert_eq!(names, vec!["1.Release", "3.Outbound"]);
    }

    #[test]
    fn no_requirements_never_blocks() {
        assert!(missing_requirements(&[], &HashSet::new()).is_empty());
    }

    #[test]
    fn self_edge_is_cycle() {
        assert!(would_create_cycle(&[], 4, 4));
    }

    #[test]
    fn direct_reverse_edge_is_cycle() {
        // 4 requires 1; adding 1 requires 4 closes the loop
        assert!(would_create_cycle(&[(4, 1)], 1, 4));
    }

    #[test]
    fn transitive_cycle_detected() {
        // 3 -> 2 -> 1; adding 1 -> 3 closes 1 -> 3 -> 2 -> 1
        let edges = [(3, 2), (2, 1)];
        assert!(would_create_cycle(&edges, 1, 3));
    }

    #[test]
    fn diamond_is_not_cycle() {
        let edges = [(4, 2), (4, 3), (2, 1), (3, 1)];
        assert!(!would_create_cycle(&edges, 5, 4));
        assert!(!would_create_cycle(&edges, 4, 1));
    }
}
