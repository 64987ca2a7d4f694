use std::collections::HashMap;

use bigdecimal::BigDecimal;

/// An address encountered during a traversal.
///
/// `need_traverse` starts true and flips false once the address has been
/// expanded or ruled out by the degree cap. Instances are created on first
/// encounter and never shared across traversals.
#[derive(Debug, Clone, PartialEq)]
pub struct Addr {
    pub hash: String,
    /// Cached transaction count from the store; -1 before hydration.
    pub cnt: i64,
    pub need_traverse: bool,
}

/// One value transfer, with an optional token leg folded in.
///
/// `flow_by_currency` always carries an "ETH" entry; a token transfer adds at
/// most one more. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tx {
    pub tx_hash: String,
    pub from: String,
    pub to: String,
    pub total_usd_flow: BigDecimal,
    pub flow_by_currency: HashMap<String, BigDecimal>,
}

/// Accumulated traversal result. Both maps are insertion sets keyed by hash;
/// duplicates are suppressed, first sighting wins.
#[derive(Debug, Default)]
pub struct Graph {
    pub addrs: HashMap<String, Addr>,
    pub txs: HashMap<String, Tx>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_addr(&mut self, addr: Addr) {
        self.addrs.entry(addr.hash.clone()).or_insert(addr);
    }

    pub fn insert_tx(&mut self, tx: Tx) {
        self.txs.entry(tx.tx_hash.clone()).or_insert(tx);
    }

    /// Insert every transaction endpoint missing from `addrs` as a
    /// non-traversable address. Runs once, after construction, so that each
    /// `Tx` endpoint is resolvable in the finished graph.
    pub fn complete_endpoints(&mut self) {
        let mut missing: Vec<String> = Vec::new();
        for tx in self.txs.values() {
            for hash in [&tx.from, &tx.to] {
                if !self.addrs.contains_key(hash.as_str()) {
                    missing.push(hash.clone());
                }
            }
        }
        for hash in missing {
            self.addrs.entry(hash.clone()).or_insert(Addr {
                hash,
                cnt: 0,
                need_traverse: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::{BigDecimal, Zero};

    fn tx(hash: &str, from: &str, to: &str) -> Tx {
        Tx {
            tx_hash: hash.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            total_usd_flow: BigDecimal::zero(),
            flow_by_currency: HashMap::new(),
        }
    }

    #[test]
    fn test_insert_addr_keeps_first_sighting() {
        let mut graph = Graph::new();
        graph.insert_addr(Addr {
            hash: "a1".to_string(),
            cnt: 7,
            need_traverse: true,
        });
        graph.insert_addr(Addr {
            hash: "a1".to_string(),
            cnt: 99,
            need_traverse: false,
        });
        assert_eq!(graph.addrs.len(), 1);
        assert_eq!(graph.addrs["a1"].cnt, 7);
    }

    #[test]
    fn test_insert_tx_dedups_by_hash() {
        let mut graph = Graph::new();
        graph.insert_tx(tx("t1", "a", "b"));
        graph.insert_tx(tx("t1", "a", "c"));
        assert_eq!(graph.txs.len(), 1);
        assert_eq!(graph.txs["t1"].to, "b");
    }

    #[test]
    fn test_complete_endpoints_fills_missing_addrs() {
        let mut graph = Graph::new();
        graph.insert_addr(Addr {
            hash: "a".to_string(),
            cnt: 1,
            need_traverse: false,
        });
        graph.insert_tx(tx("t1", "a", "b"));
        graph.insert_tx(tx("t2", "c", "a"));
        graph.complete_endpoints();

        assert_eq!(graph.addrs.len(), 3);
        assert!(!graph.addrs["b"].need_traverse);
        assert_eq!(graph.addrs["c"].cnt, 0);
    }
}
