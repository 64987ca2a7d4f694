/// Engine-wide constants.
///
/// Traversal and path-search budgets live here so the caps that keep
/// adversarial fan-out (exchanges, mixers, dust attackers) tractable are in
/// one place instead of scattered as magic numbers.
use std::time::Duration;

/// Addresses with more recorded transactions than this are recorded but never
/// expanded. This is the high-fan-out firewall: one exchange hot wallet can
/// have millions of neighbors.
pub const TRAVERSE_MAX_DEGREE: i64 = 300;

/// Total transactions a breadth-first collection may accumulate across all
/// workers. Backs the shared [`crate::limiter::AtomicLimiter`].
pub const GRAPH_LIMIT: i64 = 500_000;

/// Wei per native unit; native amounts are scaled down by this at parse time.
pub const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

/// The store truncates per-address block lists to this many entries per call,
/// newest first.
pub const ADDRESS_BLOCKS_CAP: usize = 1001;

/// Upper block bound applied when a request omits `toBlock`.
pub const DEFAULT_TO_BLOCK: u64 = 99_999_999;

/// Depth of the output-flow scan backing the paths endpoint.
pub const PATH_DFS_MAX_DEPTH: u32 = 100;

/// Size cap of the subgraph scanned for the paths endpoint.
pub const PATH_GRAPH_LIMIT: usize = 500_000;

/// Wall-clock budget of the all-simple-paths enumerator.
pub const PATHS_TIME_BUDGET: Duration = Duration::from_secs(5);

/// The enumerator checks the clock once per this many iterations.
pub const PATHS_GUARD_INTERVAL: u64 = 100_000;

/// Past this many iterations the enumerator logs a diagnostic warning. It
/// never aborts on the counter alone.
pub const PATHS_ITERATION_WARN: u64 = 1_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_constants() {
        assert_eq!(TRAVERSE_MAX_DEGREE, 300);
        assert_eq!(GRAPH_LIMIT, 500_000);
        assert_eq!(PATHS_TIME_BUDGET, Duration::from_secs(5));
    }

    #[test]
    fn test_wei_scale() {
        assert_eq!(WEI_PER_ETH, 10u64.pow(18));
    }
}
