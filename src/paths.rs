// All simple paths between two vertices.
//
// Stack-based rather than recursive: mainStack holds the candidate path,
// viceStack holds each layer's not-yet-explored out-neighbors, filtered
// against the path so no vertex repeats. The algorithm is described at
// https://boycgit.github.io/all-paths-between-two-vertex/
//
// The search space is exponential in the worst case, so the loop carries a
// wall-clock budget: every 100k iterations it checks the clock and gives up
// past the deadline, discarding partial results.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::collapse::CollapsedEdge;
use crate::constants::{PATHS_GUARD_INTERVAL, PATHS_ITERATION_WARN, PATHS_TIME_BUDGET};
use crate::error::EngineError;
use crate::metrics;

/// Out-neighbor sets, ordered so enumeration is deterministic.
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Adjacency of a collapsed subgraph. Every endpoint becomes a vertex.
pub fn adjacency_from_edges(edges: &[CollapsedEdge]) -> Adjacency {
    let mut adjacency = Adjacency::new();
    for edge in edges {
        adjacency
            .entry(edge.from.clone())
            .or_default()
            .insert(edge.to.clone());
        adjacency.entry(edge.to.clone()).or_default();
    }
    adjacency
}

/// Out-neighbors of `vertex` not already on the candidate path. The vertex
/// itself is excluded too, which rejects self-loop edges.
fn remaining_neighbors(adjacency: &Adjacency, vertex: &str, path: &[String]) -> Vec<String> {
    adjacency
        .get(vertex)
        .map(|out| {
            out.iter()
                .filter(|n| n.as_str() != vertex && !path.iter().any(|p| p == *n))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Every simple path from `source` to `sink`, within the engine's 5 s budget.
pub fn all_simple_paths(
    adjacency: &Adjacency,
    source: &str,
    sink: &str,
) -> Result<Vec<Vec<String>>, EngineError> {
    all_paths_within(adjacency, source, sink, PATHS_TIME_BUDGET)
}

pub(crate) fn all_paths_within(
    adjacency: &Adjacency,
    source: &str,
    sink: &str,
    budget: Duration,
) -> Result<Vec<Vec<String>>, EngineError> {
    metrics::PATH_SEARCHES.inc();

    let mut main_stack: Vec<String> = Vec::new();
    let mut vice_stack: Vec<Vec<String>> = Vec::new();
    let neighbors = remaining_neighbors(adjacency, source, &main_stack);
    main_stack.push(source.to_string());
    vice_stack.push(neighbors);

    let mut paths: Vec<Vec<String>> = Vec::new();
    let started = Instant::now();
    let mut iterations: u64 = 0;

    while !main_stack.is_empty() {
        iterations += 1;
        if iterations % PATHS_GUARD_INTERVAL == 0 {
            if started.elapsed() > budget {
                metrics::PATH_TIMEOUTS.inc();
                return Err(EngineError::Timeout(budget));
            }
            if iterations > PATHS_ITERATION_WARN {
                warn!(
                    iterations,
                    path_len = main_stack.len(),
                    "path enumeration is running long"
                );
            }
        }

        let next = vice_stack.last_mut().and_then(Vec::pop);
        match next {
            Some(next) => {
                let neighbors = remaining_neighbors(adjacency, &next, &main_stack);
                main_stack.push(next);
                vice_stack.push(neighbors);
            }
            None => {
                if main_stack.last().map(String::as_str) == Some(sink) {
                    paths.push(main_stack.clone());
                }
                main_stack.pop();
                vice_stack.pop();
            }
        }
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(edges: &[(&str, &str)]) -> Adjacency {
        let mut adjacency = Adjacency::new();
        for (from, to) in edges {
            adjacency
                .entry(from.to_string())
                .or_default()
                .insert(to.to_string());
            adjacency.entry(to.to_string()).or_default();
        }
        adjacency
    }

    fn sorted(mut paths: Vec<Vec<String>>) -> Vec<Vec<String>> {
        paths.sort();
        paths
    }

    fn path(hops: &[&str]) -> Vec<String> {
        hops.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_diamond_yields_both_paths() {
        let adjacency = adjacency(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        let paths = all_simple_paths(&adjacency, "A", "D").unwrap();
        assert_eq!(
            sorted(paths),
            vec![path(&["A", "B", "D"]), path(&["A", "C", "D"])]
        );
    }

    #[test]
    fn test_cycle_is_rejected_by_on_path_filter() {
        let adjacency = adjacency(&[("A", "B"), ("B", "A"), ("B", "C")]);
        let paths = all_simple_paths(&adjacency, "A", "C").unwrap();
        assert_eq!(paths, vec![path(&["A", "B", "C"])]);
    }

    #[test]
    fn test_no_path_between_disconnected_vertices() {
        let adjacency = adjacency(&[("A", "B"), ("C", "D")]);
        let paths = all_simple_paths(&adjacency, "A", "D").unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_unknown_source_yields_nothing() {
        let adjacency = adjacency(&[("A", "B")]);
        let paths = all_simple_paths(&adjacency, "Z", "B").unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_direction_is_respected() {
        let adjacency = adjacency(&[("B", "A")]);
        let paths = all_simple_paths(&adjacency, "A", "B").unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_self_loop_edge_is_ignored() {
        let adjacency = adjacency(&[("A", "A"), ("A", "B")]);
        let paths = all_simple_paths(&adjacency, "A", "B").unwrap();
        assert_eq!(paths, vec![path(&["A", "B"])]);
    }

    #[test]
    fn test_every_path_is_simple_and_valid() {
        let adjacency = adjacency(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "D"),
            ("A", "C"),
            ("B", "D"),
            ("C", "A"),
            ("D", "B"),
        ]);
        let paths = all_simple_paths(&adjacency, "A", "D").unwrap();
        assert!(!paths.is_empty());
        for path in &paths {
            assert_eq!(path.first().map(String::as_str), Some("A"));
            assert_eq!(path.last().map(String::as_str), Some("D"));
            let unique: BTreeSet<&String> = path.iter().collect();
            assert_eq!(unique.len(), path.len(), "repeated vertex in {:?}", path);
            for pair in path.windows(2) {
                assert!(
                    adjacency[&pair[0]].contains(&pair[1]),
                    "missing edge {:?}",
                    pair
                );
            }
        }
    }

    #[test]
    fn test_complete_graph_times_out() {
        // complete digraph on 20 vertices: far too many simple paths to
        // enumerate, so the clock guard must fire
        let names: Vec<String> = (0..20).map(|i| format!("v{:02}", i)).collect();
        let mut adjacency = Adjacency::new();
        for from in &names {
            let out: BTreeSet<String> = names.iter().filter(|n| *n != from).cloned().collect();
            adjacency.insert(from.clone(), out);
        }
        let err =
            all_paths_within(&adjacency, "v00", "v19", Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, EngineError::Timeout(_)));
    }

    fn collapsed(id: &str, from: &str, to: &str) -> CollapsedEdge {
        use bigdecimal::{BigDecimal, Zero};
        CollapsedEdge {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            count: 1,
            flow_by_currency: Default::default(),
            total_usd_flow: BigDecimal::zero(),
        }
    }

    #[test]
    fn test_adjacency_from_edges_collects_all_vertices() {
        let edges = vec![collapsed("0", "A", "B"), collapsed("1", "B", "C")];
        let adjacency = adjacency_from_edges(&edges);
        assert_eq!(adjacency.len(), 3);
        assert!(adjacency["A"].contains("B"));
        assert!(adjacency["C"].is_empty());
    }
}
