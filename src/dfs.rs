// Depth-first neighborhood collection.
//
// Single orchestrating task, explicit LIFO stack. The only parallelism is
// per-block within one address expansion: block blobs are independent, so
// each fetch+parse runs as its own task and the orchestrator gathers them
// before touching the graph.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::constants::TRAVERSE_MAX_DEGREE;
use crate::error::EngineError;
use crate::graph::{Addr, Graph, Tx};
use crate::metrics;
use crate::parser::{parse_block_for_address, Flow};
use crate::store::BlockStore;

/// Inputs for one bounded depth-first collection.
#[derive(Debug, Clone)]
pub struct DfsParams {
    pub address: String,
    pub depth: u32,
    pub from_block: u64,
    pub to_block: u64,
    pub flow: Flow,
    /// Hard cap on both `|addrs|` and `|txs|` of the result.
    pub size_limit: usize,
    /// Stop the top-level loop once the pop counter exceeds `depth`,
    /// mirroring the historical collector. With the guard off only the
    /// per-entry depth bound and the size caps terminate the walk.
    pub iteration_guard: bool,
}

impl fmt::Display for DfsParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "address: {}, depth: {}, fromBlock: {}, toBlock: {}, flow: {}, sizeLimit: {}",
            self.address, self.depth, self.from_block, self.to_block, self.flow, self.size_limit
        )
    }
}

/// Flow-filtered transactions of one address inside the block range, fetched
/// with one task per block.
async fn transactions_from(
    store: &Arc<dyn BlockStore>,
    addr: &str,
    from_block: u64,
    to_block: u64,
    flow: Flow,
) -> Result<Vec<Tx>, EngineError> {
    let blocks = match store.address_blocks(addr).await {
        Ok(blocks) => blocks,
        Err(err) => {
            warn!(address = addr, error = %err, "block list lookup failed");
            metrics::STORE_MISSES.inc();
            return Ok(Vec::new());
        }
    };

    let tasks: Vec<_> = blocks
        .into_iter()
        .filter(|number| *number >= from_block && *number <= to_block)
        .map(|number| {
            let store = Arc::clone(store);
            let addr = addr.to_string();
            tokio::spawn(async move {
                let blob = match store.block(number).await {
                    Ok(Some(blob)) => blob,
                    Ok(None) => return Ok(Vec::new()),
                    Err(err) => {
                        warn!(block = number, error = %err, "block fetch failed");
                        metrics::STORE_MISSES.inc();
                        return Ok(Vec::new());
                    }
                };
                parse_block_for_address(&blob, &addr, flow)
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

/// Collect the bounded neighborhood of `params.address` depth-first.
///
/// Addresses above the degree cap are recorded but never expanded, except at
/// the root. Transactions whose far endpoint would land beyond the depth
/// bound are dropped unless they are self-loops. Size caps hold at every
/// step; endpoint completion afterwards guarantees both ends of every kept
/// transaction resolve in `addrs`.
pub async fn collect_dfs(
    params: DfsParams,
    store: Arc<dyn BlockStore>,
    cancel: CancellationToken,
) -> Result<Graph, EngineError> {
    info!(%params, "collect_dfs");
    let timer = metrics::TRAVERSAL_DURATION
        .with_label_values(&["dfs"])
        .start_timer();

    let mut graph = Graph::new();
    let mut stack: Vec<(String, u32)> = vec![(params.address.clone(), 0)];
    let mut pop_cnt: u32 = 0;

    while !stack.is_empty()
        && graph.addrs.len() < params.size_limit
        && graph.txs.len() < params.size_limit
    {
        if params.iteration_guard && pop_cnt > params.depth {
            debug!(pop_cnt, "iteration guard reached");
            break;
        }
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let Some((hash, entry_depth)) = stack.pop() else {
            break;
        };
        pop_cnt += 1;

        if entry_depth > params.depth || graph.addrs.contains_key(&hash) {
            continue;
        }

        let cnt = match store.address_degree(&hash).await {
            Ok(cnt) => cnt,
            Err(err) => {
                warn!(address = %hash, error = %err, "degree lookup failed");
                metrics::STORE_MISSES.inc();
                0
            }
        };
        let mut need_traverse = true;
        if entry_depth != 0 && cnt > TRAVERSE_MAX_DEGREE {
            debug!(address = %hash, cnt, "skipping high-degree address");
            need_traverse = false;
        }
        graph.insert_addr(Addr {
            hash: hash.clone(),
            cnt,
            need_traverse,
        });
        if !need_traverse {
            continue;
        }

        let txs =
            transactions_from(&store, &hash, params.from_block, params.to_block, params.flow)
                .await?;
        for tx in txs {
            if graph.txs.len() >= params.size_limit {
                break;
            }
            let next = if tx.to == hash {
                tx.from.clone()
            } else {
                tx.to.clone()
            };
            if next == hash {
                // self-transfer: record it, nothing new to follow
                graph.insert_tx(tx);
                continue;
            }
            if entry_depth + 1 > params.depth {
                continue;
            }
            graph.insert_tx(tx);
            stack.push((next, entry_depth + 1));
        }
        if stack.len() % 100 == 0 {
            debug!(stack = stack.len(), "stack length");
        }
        if let Some(entry) = graph.addrs.get_mut(&hash) {
            entry.need_traverse = false;
        }
    }

    graph.complete_endpoints();
    metrics::TRAVERSALS_TOTAL.with_label_values(&["dfs"]).inc();
    metrics::TXS_COLLECTED
        .with_label_values(&["dfs"])
        .inc_by(graph.txs.len() as u64);
    timer.observe_duration();
    info!(
        addrs = graph.addrs.len(),
        txs = graph.txs.len(),
        "collect_dfs done"
    );
    Ok(graph)
}
