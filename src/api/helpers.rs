use std::sync::Arc;

use tracing::warn;

use super::types::Node;
use crate::metrics;
use crate::store::BlockStore;

/// Secondary label that upgrades an address to high risk.
const OFAC_LABEL: &str = "OFAC Sanctions Lists";

/// Fallback display label: the address tail.
fn short_label(address: &str) -> String {
    let tail = address.len().saturating_sub(8);
    match address.get(tail..) {
        Some(suffix) => suffix.to_string(),
        None => address.to_string(),
    }
}

/// Enrich one address into a renderable [`Node`]: cached degree plus labels,
/// with `picked` left unset for the caller. Lookup failures degrade to the
/// unlabeled form.
pub async fn fetch_address(store: &Arc<dyn BlockStore>, address: &str) -> Node {
    let cnt = match store.address_degree(address).await {
        Ok(cnt) => cnt,
        Err(err) => {
            warn!(address, error = %err, "degree lookup failed");
            metrics::STORE_MISSES.inc();
            0
        }
    };
    let labels = match store.address_labels(address).await {
        Ok(labels) => labels,
        Err(err) => {
            warn!(address, error = %err, "label lookup failed");
            metrics::STORE_MISSES.inc();
            None
        }
    };

    let (label, node_type) = match labels {
        Some(labels) => {
            let label = if labels.prime.is_empty() {
                short_label(address)
            } else {
                labels.prime
            };
            let mut node_type = labels.label_type;
            if labels.secondary.iter().any(|l| l == OFAC_LABEL) {
                node_type = "high_risk".to_string();
            }
            (label, node_type)
        }
        None => (short_label(address), String::new()),
    };

    Node {
        id: address.to_string(),
        label,
        cnt,
        picked: false,
        node_type,
    }
}
