// Block blob decoding.
//
// A stored block is a utf8 blob with one transaction per line, eight
// semicolon-delimited fields:
//
//   from;txHash;to;nativeValue;nativeUsdOnDay;tokenTicker;tokenValue;tokenUsdOnDay
//
// A ticker of "nil" means the transaction carried no token leg. Numeric
// fields that fail to parse degrade to zero; the record is still kept, the
// downstream is tolerant. A wrong field count is a contract violation with
// the indexer and aborts the whole parse.

use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use tracing::warn;

use crate::constants::WEI_PER_ETH;
use crate::error::EngineError;
use crate::graph::{Addr, Tx};
use crate::limiter::AtomicLimiter;

const LINE_FIELDS: usize = 8;

/// Directional filter applied when expanding a single address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Input,
    Output,
    All,
}

impl FromStr for Flow {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Flow::Input),
            "output" => Ok(Flow::Output),
            "all" => Ok(Flow::All),
            other => Err(EngineError::InvalidParameter(format!(
                "flow must be one of input, output, all; got {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Input => write!(f, "input"),
            Flow::Output => write!(f, "output"),
            Flow::All => write!(f, "all"),
        }
    }
}

fn decimal_or_zero(raw: &str) -> BigDecimal {
    BigDecimal::from_str(raw).unwrap_or_else(|_| BigDecimal::zero())
}

fn split_line(line: &str) -> Result<Vec<&str>, EngineError> {
    let vals: Vec<&str> = line.split(';').collect();
    if vals.len() != LINE_FIELDS {
        return Err(EngineError::MalformedBlock(format!(
            "expected {} fields, got {}",
            LINE_FIELDS,
            vals.len()
        )));
    }
    Ok(vals)
}

/// Decode one well-formed line into a [`Tx`].
fn decode_line(vals: &[&str]) -> Tx {
    let eth_amount = decimal_or_zero(vals[3]) / BigDecimal::from(WEI_PER_ETH);
    let eth_usd = decimal_or_zero(vals[4]);

    let mut flow_by_currency = HashMap::new();
    flow_by_currency.insert("ETH".to_string(), eth_amount);
    let mut total_usd_flow = eth_usd;

    // An empty ticker is treated like "nil": the line falls back to its
    // native leg only.
    let ticker = vals[5];
    if ticker != "nil" && !ticker.is_empty() {
        flow_by_currency.insert(ticker.to_string(), decimal_or_zero(vals[6]));
        total_usd_flow = total_usd_flow + decimal_or_zero(vals[7]);
    }

    Tx {
        from: vals[0].to_string(),
        tx_hash: vals[1].to_string(),
        to: vals[2].to_string(),
        total_usd_flow,
        flow_by_currency,
    }
}

/// Transactions in `blob` that touch `addr` under the given flow filter.
/// This is the depth-first expansion path.
pub fn parse_block_for_address(blob: &str, addr: &str, flow: Flow) -> Result<Vec<Tx>, EngineError> {
    let mut txs = Vec::new();
    for line in blob.lines() {
        if line.is_empty() {
            continue;
        }
        let vals = split_line(line)?;
        let (from, to) = (vals[0], vals[2]);
        let keep = match flow {
            Flow::Input => to == addr,
            Flow::Output => from == addr,
            Flow::All => from == addr || to == addr,
        };
        if keep {
            txs.push(decode_line(&vals));
        }
    }
    Ok(txs)
}

/// Transactions in `blob` that touch the current breadth-first frontier.
///
/// A line survives only if at least one endpoint is a frontier address that
/// is still traversable. High-degree addresses stay in the frontier with
/// `need_traverse` unset: transactions that brought them in are kept, the
/// rest of their traffic is dropped here.
///
/// Every kept line consumes one unit of the shared `limiter`; once it is
/// exhausted the scan of this blob stops, retaining what was already parsed.
pub fn parse_block_for_frontier(
    blob: &str,
    frontier: &HashMap<String, Addr>,
    limiter: &AtomicLimiter,
) -> Result<Vec<Tx>, EngineError> {
    let mut txs = Vec::new();
    for line in blob.lines() {
        if limiter.is_exhausted() {
            warn!("transaction budget exhausted, truncating block scan");
            break;
        }
        if line.is_empty() {
            continue;
        }
        let vals = split_line(line)?;
        let keep = match (frontier.get(vals[0]), frontier.get(vals[2])) {
            (None, None) => false,
            (Some(from), Some(to)) => from.need_traverse || to.need_traverse,
            (Some(from), None) => from.need_traverse,
            (None, Some(to)) => to.need_traverse,
        };
        if !keep {
            continue;
        }
        txs.push(decode_line(&vals));
        limiter.consume();
    }
    Ok(txs)
}
