// Breadth-first neighborhood collection.
//
// Layer-synchronous: each layer runs three fan-out phases (degree hydration,
// block-list union, block scan) and joins between them, so no task ever sees
// a half-built frontier. Worker tasks return owned results; the orchestrator
// merges. The only shared mutable state is the atomic transaction budget.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::constants::TRAVERSE_MAX_DEGREE;
use crate::error::EngineError;
use crate::graph::{Addr, Graph, Tx};
use crate::limiter::AtomicLimiter;
use crate::metrics;
use crate::parser::parse_block_for_frontier;
use crate::store::BlockStore;

/// Phase 1: look up every frontier degree concurrently. Addresses above the
/// cap, and addresses whose lookup failed, stay in the frontier but are no
/// longer traversable. Applies to the root as well.
async fn hydrate_degrees(frontier: &mut HashMap<String, Addr>, store: &Arc<dyn BlockStore>) {
    let tasks: Vec<_> = frontier
        .keys()
        .cloned()
        .map(|hash| {
            let store = Arc::clone(store);
            tokio::spawn(async move {
                let degree = store.address_degree(&hash).await;
                (hash, degree)
            })
        })
        .collect();

    for joined in join_all(tasks).await {
        let Ok((hash, degree)) = joined else { continue };
        let Some(entry) = frontier.get_mut(&hash) else {
            continue;
        };
        match degree {
            Ok(cnt) => {
                entry.cnt = cnt;
                if cnt > TRAVERSE_MAX_DEGREE {
                    entry.need_traverse = false;
                }
            }
            Err(err) => {
                warn!(address = %hash, error = %err, "degree hydration failed");
                metrics::STORE_MISSES.inc();
                entry.need_traverse = false;
            }
        }
    }
}

/// Phase 2: union the block lists of every traversable frontier address.
async fn frontier_blocks(
    frontier: &Arc<HashMap<String, Addr>>,
    store: &Arc<dyn BlockStore>,
) -> HashSet<u64> {
    let tasks: Vec<_> = frontier
        .values()
        .filter(|addr| addr.need_traverse)
        .map(|addr| {
            let store = Arc::clone(store);
            let hash = addr.hash.clone();
            tokio::spawn(async move {
                let blocks = store.address_blocks(&hash).await;
                (hash, blocks)
            })
        })
        .collect();

    let mut union = HashSet::new();
    for joined in join_all(tasks).await {
        let Ok((hash, blocks)) = joined else { continue };
        match blocks {
            Ok(blocks) => union.extend(blocks),
            Err(err) => {
                warn!(address = %hash, error = %err, "block list lookup failed");
                metrics::STORE_MISSES.inc();
            }
        }
    }
    union
}

/// Phase 3: fetch and parse every block in the union, one task per block.
/// The frontier snapshot is read-only here; kept lines draw on the shared
/// budget.
async fn scan_blocks(
    blocks: HashSet<u64>,
    frontier: &Arc<HashMap<String, Addr>>,
    store: &Arc<dyn BlockStore>,
    from_block: u64,
    to_block: u64,
    limiter: &Arc<AtomicLimiter>,
) -> Result<Vec<Tx>, EngineError> {
    let tasks: Vec<_> = blocks
        .into_iter()
        .map(|number| {
            let store = Arc::clone(store);
            let frontier = Arc::clone(frontier);
            let limiter = Arc::clone(limiter);
            tokio::spawn(async move {
                if number < from_block || number > to_block {
                    return Ok(Vec::new());
                }
                let blob = match store.block(number).await {
                    Ok(Some(blob)) => blob,
                    Ok(None) => return Ok(Vec::new()),
                    Err(err) => {
                        warn!(block = number, error = %err, "block fetch failed");
                        metrics::STORE_MISSES.inc();
                        return Ok(Vec::new());
                    }
                };
                parse_block_for_frontier(&blob, &frontier, &limiter)
            })
        })
        .collect();

    let mut txs = Vec::new();
    for joined in join_all(tasks).await {
        match joined {
            Ok(Ok(block_txs)) => txs.extend(block_txs),
            Ok(Err(err)) => return Err(err),
            Err(err) => error!(error = %err, "block scan task failed"),
        }
    }
    Ok(txs)
}

/// Collect the neighborhood of `address` layer by layer.
///
/// Every transaction touching a traversable frontier address is kept — there
/// is no flow filter on this path. Total kept transactions across all layers
/// and workers are bounded by the engine-wide budget.
pub async fn collect_bfs(
    address: &str,
    depth: u32,
    from_block: u64,
    to_block: u64,
    store: Arc<dyn BlockStore>,
    cancel: CancellationToken,
) -> Result<Graph, EngineError> {
    info!(address, depth, from_block, to_block, "collect_bfs");
    let timer = metrics::TRAVERSAL_DURATION
        .with_label_values(&["bfs"])
        .start_timer();

    let limiter = Arc::new(AtomicLimiter::new());
    let mut graph = Graph::new();
    let mut all_txs: Vec<Tx> = Vec::new();

    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(address.to_string());
    let mut frontier: HashMap<String, Addr> = HashMap::new();
    frontier.insert(
        address.to_string(),
        Addr {
            hash: address.to_string(),
            cnt: -1,
            need_traverse: true,
        },
    );

    for layer in 0..depth {
        if frontier.is_empty() {
            break;
        }
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        hydrate_degrees(&mut frontier, &store).await;
        // the traversable subset is frozen for the rest of the layer
        let snapshot = Arc::new(std::mem::take(&mut frontier));

        let blocks = frontier_blocks(&snapshot, &store).await;
        debug!(layer, blocks = blocks.len(), "block union built");
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let layer_txs =
            scan_blocks(blocks, &snapshot, &store, from_block, to_block, &limiter).await?;
        debug!(layer, txs = layer_txs.len(), "layer scanned");

        for addr in snapshot.values() {
            graph.insert_addr(addr.clone());
        }

        // next frontier: endpoints this traversal has not seen in any layer
        let mut next: HashMap<String, Addr> = HashMap::new();
        for tx in &layer_txs {
            for hash in [&tx.from, &tx.to] {
                if seen.contains(hash.as_str()) || next.contains_key(hash.as_str()) {
                    continue;
                }
                next.insert(
                    hash.clone(),
                    Addr {
                        hash: hash.clone(),
                        cnt: 0,
                        need_traverse: true,
                    },
                );
            }
        }
        seen.extend(next.keys().cloned());
        all_txs.extend(layer_txs);
        frontier = next;
    }

    for tx in all_txs {
        graph.insert_tx(tx);
    }
    graph.complete_endpoints();

    metrics::TRAVERSALS_TOTAL.with_label_values(&["bfs"]).inc();
    metrics::TXS_COLLECTED
        .with_label_values(&["bfs"])
        .inc_by(graph.txs.len() as u64);
    timer.observe_duration();
    info!(
        addrs = graph.addrs.len(),
        txs = graph.txs.len(),
        "collect_bfs done"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBlockStore;
    use crate::store::{AddressLabels, StoreError};
    use async_trait::async_trait;

    #[tokio::test]
    async fn test_single_layer() {
        let store: Arc<dyn BlockStore> = Arc::new(
            MemoryBlockStore::new()
                .with_address_blocks("A", &[100])
                .with_block(100, "A;tx1;B;1000000000000000000;3000;nil;0;0\n"),
        );
        let graph = collect_bfs("A", 1, 0, 200, store, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(graph.txs.len(), 1);
        assert!(graph.addrs.contains_key("A"));
        assert!(graph.addrs.contains_key("B"));
        assert!(!graph.addrs["B"].need_traverse);
    }

    #[tokio::test]
    async fn test_two_layers_follow_neighbors() {
        let store: Arc<dyn BlockStore> = Arc::new(
            MemoryBlockStore::new()
                .with_address_blocks("A", &[100])
                .with_address_blocks("B", &[101])
                .with_block(100, "A;tx1;B;0;10;nil;0;0\n")
                .with_block(101, "B;tx2;C;0;20;nil;0;0\n"),
        );
        let graph = collect_bfs("A", 2, 0, 200, store, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(graph.txs.len(), 2);
        for hash in ["A", "B", "C"] {
            assert!(graph.addrs.contains_key(hash));
        }
    }

    #[tokio::test]
    async fn test_high_degree_root_is_not_expanded() {
        // unlike DFS, BFS applies the degree cap to the root as well
        let store: Arc<dyn BlockStore> = Arc::new(
            MemoryBlockStore::new()
                .with_address_blocks("A", &[100])
                .with_block(100, "A;tx1;B;0;10;nil;0;0\n")
                .with_degree("A", 5000),
        );
        let graph = collect_bfs("A", 2, 0, 200, store, CancellationToken::new())
            .await
            .unwrap();

        assert!(graph.txs.is_empty());
        assert_eq!(graph.addrs.len(), 1);
        assert!(!graph.addrs["A"].need_traverse);
    }

    #[tokio::test]
    async fn test_block_range_filters_scan() {
        let store: Arc<dyn BlockStore> = Arc::new(
            MemoryBlockStore::new()
                .with_address_blocks("A", &[100, 150])
                .with_block(100, "A;tx1;B;0;10;nil;0;0\n")
                .with_block(150, "A;tx2;C;0;10;nil;0;0\n"),
        );
        let graph = collect_bfs("A", 1, 120, 200, store, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(graph.txs.len(), 1);
        assert!(graph.txs.contains_key("tx2"));
    }

    #[tokio::test]
    async fn test_ignores_flow_direction() {
        // an incoming edge is followed just like an outgoing one
        let store: Arc<dyn BlockStore> = Arc::new(
            MemoryBlockStore::new()
                .with_address_blocks("A", &[100])
                .with_block(100, "B;tx1;A;0;10;nil;0;0\n"),
        );
        let graph = collect_bfs("A", 1, 0, 200, store, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(graph.txs.len(), 1);
        assert!(graph.addrs.contains_key("B"));
    }

    /// Store whose degree lookups always fail.
    struct DegreelessStore(MemoryBlockStore);

    #[async_trait]
    impl BlockStore for DegreelessStore {
        async fn address_blocks(&self, addr: &str) -> Result<Vec<u64>, StoreError> {
            self.0.address_blocks(addr).await
        }
        async fn block(&self, number: u64) -> Result<Option<String>, StoreError> {
            self.0.block(number).await
        }
        async fn address_degree(&self, _addr: &str) -> Result<i64, StoreError> {
            Err(StoreError::Backend("degree store offline".to_string()))
        }
        async fn address_labels(&self, addr: &str) -> Result<Option<AddressLabels>, StoreError> {
            self.0.address_labels(addr).await
        }
    }

    #[tokio::test]
    async fn test_degree_error_freezes_address() {
        let inner = MemoryBlockStore::new()
            .with_address_blocks("A", &[100])
            .with_block(100, "A;tx1;B;0;10;nil;0;0\n");
        let store: Arc<dyn BlockStore> = Arc::new(DegreelessStore(inner));
        let graph = collect_bfs("A", 1, 0, 200, store, CancellationToken::new())
            .await
            .unwrap();

        // the root could not be hydrated, so nothing was expanded
        assert!(graph.txs.is_empty());
        assert!(!graph.addrs["A"].need_traverse);
    }

    #[tokio::test]
    async fn test_cancellation_propagates() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
        let err = collect_bfs("A", 1, 0, 200, store, cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
