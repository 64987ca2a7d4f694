// Edge collapse: all parallel transactions between one ordered address pair
// fold into a single summary edge, so a busy pair ships as one record
// instead of thousands.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::graph::Tx;

/// Wire projection of a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    #[serde(rename = "start")]
    pub from: String,
    #[serde(rename = "end")]
    pub to: String,
    pub flow_by_currency: HashMap<String, BigDecimal>,
    pub total_usd_flow: BigDecimal,
}

impl From<&Tx> for Edge {
    fn from(tx: &Tx) -> Self {
        Edge {
            id: tx.tx_hash.clone(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            flow_by_currency: tx.flow_by_currency.clone(),
            total_usd_flow: tx.total_usd_flow.clone(),
        }
    }
}

/// Summary of every transaction between one ordered `(from, to)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollapsedEdge {
    pub id: String,
    #[serde(rename = "start")]
    pub from: String,
    #[serde(rename = "end")]
    pub to: String,
    #[serde(rename = "value")]
    pub count: u64,
    pub flow_by_currency: HashMap<String, BigDecimal>,
    pub total_usd_flow: BigDecimal,
}

/// Fold parallel edges. Counts accumulate, USD totals and per-currency
/// amounts sum exactly, ticker sets union. Ids are assigned zero-based in
/// first-seen order; output order is unspecified.
pub fn collapse_edges(edges: &[Edge]) -> Vec<CollapsedEdge> {
    let mut folded: HashMap<(String, String), CollapsedEdge> = HashMap::new();
    let mut next_id: u64 = 0;

    for edge in edges {
        match folded.entry((edge.from.clone(), edge.to.clone())) {
            Entry::Occupied(mut slot) => {
                let collapsed = slot.get_mut();
                collapsed.count += 1;
                collapsed.total_usd_flow = &collapsed.total_usd_flow + &edge.total_usd_flow;
                for (currency, amount) in &edge.flow_by_currency {
                    let sum = collapsed
                        .flow_by_currency
                        .entry(currency.clone())
                        .or_default();
                    *sum = &*sum + amount;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(CollapsedEdge {
                    id: next_id.to_string(),
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    count: 1,
                    flow_by_currency: edge.flow_by_currency.clone(),
                    total_usd_flow: edge.total_usd_flow.clone(),
                });
                next_id += 1;
            }
        }
    }

    folded.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::Zero;

    fn edge(id: &str, from: &str, to: &str, usd: i64, flows: &[(&str, i64)]) -> Edge {
        Edge {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            flow_by_currency: flows
                .iter()
                .map(|(ticker, amount)| (ticker.to_string(), BigDecimal::from(*amount)))
                .collect(),
            total_usd_flow: BigDecimal::from(usd),
        }
    }

    fn by_pair(collapsed: Vec<CollapsedEdge>) -> HashMap<(String, String), CollapsedEdge> {
        collapsed
            .into_iter()
            .map(|c| ((c.from.clone(), c.to.clone()), c))
            .collect()
    }

    #[test]
    fn test_multi_currency_collapse() {
        let edges = vec![
            edge("tx1", "A", "B", 3000, &[("ETH", 1)]),
            edge("tx2", "A", "B", 500, &[("USDT", 500)]),
            edge("tx3", "A", "C", 6000, &[("ETH", 2)]),
        ];
        let collapsed = by_pair(collapse_edges(&edges));
        assert_eq!(collapsed.len(), 2);

        let ab = &collapsed[&("A".to_string(), "B".to_string())];
        assert_eq!(ab.count, 2);
        assert_eq!(ab.total_usd_flow, BigDecimal::from(3500));
        assert_eq!(ab.flow_by_currency["ETH"], BigDecimal::from(1));
        assert_eq!(ab.flow_by_currency["USDT"], BigDecimal::from(500));

        let ac = &collapsed[&("A".to_string(), "C".to_string())];
        assert_eq!(ac.count, 1);
        assert_eq!(ac.total_usd_flow, BigDecimal::from(6000));
        assert_eq!(ac.flow_by_currency["ETH"], BigDecimal::from(2));
    }

    #[test]
    fn test_ids_assigned_in_first_seen_order() {
        let edges = vec![
            edge("tx1", "A", "B", 1, &[]),
            edge("tx2", "C", "D", 1, &[]),
            edge("tx3", "A", "B", 1, &[]),
        ];
        let collapsed = by_pair(collapse_edges(&edges));
        assert_eq!(collapsed[&("A".to_string(), "B".to_string())].id, "0");
        assert_eq!(collapsed[&("C".to_string(), "D".to_string())].id, "1");
    }

    #[test]
    fn test_totals_are_preserved() {
        let edges = vec![
            edge("tx1", "A", "B", 10, &[("ETH", 1)]),
            edge("tx2", "A", "B", 20, &[("ETH", 2), ("USDT", 5)]),
            edge("tx3", "B", "A", 40, &[("ETH", 4)]),
        ];
        let collapsed = collapse_edges(&edges);

        let mut input_total = BigDecimal::zero();
        for e in &edges {
            input_total = &input_total + &e.total_usd_flow;
        }
        let mut output_total = BigDecimal::zero();
        for c in &collapsed {
            output_total = &output_total + &c.total_usd_flow;
        }
        assert_eq!(input_total, output_total);

        let mut input_eth = BigDecimal::zero();
        for e in &edges {
            if let Some(amount) = e.flow_by_currency.get("ETH") {
                input_eth = &input_eth + amount;
            }
        }
        let mut output_eth = BigDecimal::zero();
        for c in &collapsed {
            if let Some(amount) = c.flow_by_currency.get("ETH") {
                output_eth = &output_eth + amount;
            }
        }
        assert_eq!(input_eth, output_eth);
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let edges = vec![
            edge("tx1", "A", "B", 10, &[("ETH", 1)]),
            edge("tx2", "A", "B", 20, &[("USDT", 5)]),
            edge("tx3", "B", "C", 40, &[("ETH", 4)]),
        ];
        let once = collapse_edges(&edges);

        // re-collapsing the collapsed set must not change any summary
        let reprojected: Vec<Edge> = once
            .iter()
            .map(|c| Edge {
                id: c.id.clone(),
                from: c.from.clone(),
                to: c.to.clone(),
                flow_by_currency: c.flow_by_currency.clone(),
                total_usd_flow: c.total_usd_flow.clone(),
            })
            .collect();
        let twice = by_pair(collapse_edges(&reprojected));
        let once = by_pair(once);

        assert_eq!(once.len(), twice.len());
        for (pair, first) in &once {
            let second = &twice[pair];
            assert_eq!(second.total_usd_flow, first.total_usd_flow);
            assert_eq!(second.flow_by_currency, first.flow_by_currency);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(collapse_edges(&[]).is_empty());
    }
}
