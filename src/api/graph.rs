use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::helpers::fetch_address;
use super::types::{CollapsedGraphResponse, GraphQuery, GraphResponse, Node};
use super::{engine_error_response, AppState};
use crate::bfs::collect_bfs;
use crate::collapse::{collapse_edges, Edge};
use crate::constants::DEFAULT_TO_BLOCK;
use crate::dfs::{collect_dfs, DfsParams};
use crate::graph::Graph;
use crate::parser::Flow;

/// GET /orb/eth/{address}
///
/// Collect the bounded neighborhood of an address and return it as
/// `{nodes, edges}`. `depth` and a valid `flow` are required; `algo` picks
/// the traversal (default dfs; bfs ignores the flow filter);
/// `collapseTrxs=false` returns raw per-transaction edges.
pub async fn collect_graph_handler(
    Path(address): Path<String>,
    Query(query): Query<GraphQuery>,
    Extension(state): Extension<AppState>,
) -> Result<Response, (StatusCode, String)> {
    let started = Instant::now();

    let Some(depth) = query.depth else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Invalid depth parameter".to_string(),
        ));
    };
    let from_block = query.from_block.unwrap_or(0);
    let to_block = query.to_block.unwrap_or(DEFAULT_TO_BLOCK);
    let flow: Flow = query
        .flow
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid flow parameter".to_string()))?;
    let algo = match query.algo.as_deref() {
        Some("bfs") => "bfs",
        _ => "dfs",
    };
    let collapse = query.collapse_trxs.as_deref() != Some("false");

    let cancel = CancellationToken::new();
    let graph = if algo == "dfs" {
        let params = DfsParams {
            address: address.clone(),
            depth,
            from_block,
            to_block,
            flow,
            size_limit: state.graph_size_limit,
            iteration_guard: state.dfs_iteration_guard,
        };
        collect_dfs(params, Arc::clone(&state.store), cancel).await
    } else {
        collect_bfs(
            &address,
            depth,
            from_block,
            to_block,
            Arc::clone(&state.store),
            cancel,
        )
        .await
    }
    .map_err(engine_error_response)?;

    let (nodes, edges) = render_graph(&graph, &address, &state).await;
    info!(
        algo,
        nodes = nodes.len(),
        edges = edges.len(),
        elapsed = ?started.elapsed(),
        "graph collected"
    );

    if collapse {
        let collapsed = collapse_edges(&edges);
        Ok(Json(CollapsedGraphResponse {
            nodes,
            edges: collapsed,
        })
        .into_response())
    } else {
        Ok(Json(GraphResponse { nodes, edges }).into_response())
    }
}

/// Project the engine graph onto the wire schema, enriching every address
/// concurrently. The query target is the picked node.
async fn render_graph(graph: &Graph, target: &str, state: &AppState) -> (Vec<Node>, Vec<Edge>) {
    let edges: Vec<Edge> = graph.txs.values().map(Edge::from).collect();
    let tasks = graph.addrs.keys().cloned().map(|hash| {
        let store = Arc::clone(&state.store);
        let target = target.to_string();
        async move {
            let mut node = fetch_address(&store, &hash).await;
            node.picked = hash == target;
            node
        }
    });
    let nodes = join_all(tasks).await;
    (nodes, edges)
}
