//! Top-spender ranking over a time window
//!
//! Reporting only: reads the purchase ledger, never changes it. Only the
//! purchases each customer still has in their window are counted, so the
//! report is complete only when `T` covers a customer's activity in the period.

use crate::purchase_ledger::PurchaseLedger;
use crate::EngineError;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Timestamp layout used by the logs
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpenderTotal {
    pub customer_id: String,
    pub total: f64,
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, EngineError> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| EngineError::MalformedTimestamp(text.to_string()))
}

/// Total spend per customer for purchases within `window` of `reference`
/// (either side), highest first. Equal totals order by descending customer id.
pub fn rank_spenders(
    ledger: &PurchaseLedger,
    reference: &str,
    window: Duration,
) -> Result<Vec<SpenderTotal>, EngineError> {
    let reference = parse_timestamp(reference)?;
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for (customer, purchases) in ledger.iter() {
        for purchase in purchases {
            let at = parse_timestamp(&purchase.timestamp)?;
            let distance = if at > reference {
                at - reference
            } else {
                reference - at
            };
            if distance <= window {
                *totals.entry(customer).or_insert(0.0) += purchase.amount;
            }
        }
    }

    let mut ranking: Vec<SpenderTotal> = totals
        .into_iter()
        .map(|(customer_id, total)| SpenderTotal {
            customer_id: customer_id.to_string(),
            total,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| b.customer_id.cmp(&a.customer_id))
    });

    Ok(ranking)
}
