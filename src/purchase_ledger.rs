//! Bounded per-customer purchase history

use crate::{CustomerId, EngineError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::OnceLock;

static EMPTY_WINDOW: VecDeque<PurchaseRecord> = VecDeque::new();

/// A recorded purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Global insertion rank; higher is more recent
    pub sequence: u64,
    pub amount: f64,
    /// Amount exactly as it appeared in the log
    pub raw_amount: String,
    pub timestamp: String,
}

impl PurchaseRecord {
    /// Build a record from the textual amount of a log line
    pub fn new(sequence: u64, raw_amount: &str, timestamp: &str) -> Result<Self, EngineError> {
        Ok(Self {
            sequence,
            amount: parse_amount(raw_amount)?,
            raw_amount: raw_amount.to_string(),
            timestamp: timestamp.to_string(),
        })
    }
}

/// Parse a decimal purchase amount. `NaN`, infinities and anything that is not
/// a plain decimal literal are rejected.
pub fn parse_amount(text: &str) -> Result<f64, EngineError> {
    static AMOUNT: OnceLock<Regex> = OnceLock::new();
    let pattern = AMOUNT.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("static amount pattern")
    });

    let trimmed = text.trim();
    if !pattern.is_match(trimmed) {
        return Err(EngineError::MalformedAmount(text.to_string()));
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| EngineError::MalformedAmount(text.to_string()))
}

/// Per-customer FIFO windows holding at most `capacity` purchases each
#[derive(Debug, Clone)]
pub struct PurchaseLedger {
    capacity: usize,
    windows: HashMap<CustomerId, VecDeque<PurchaseRecord>>,
}

impl PurchaseLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: HashMap::new(),
        }
    }

    /// Maximum number of records kept per customer
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push `record` onto the tail of the customer's window, evicting the
    /// oldest record once the window exceeds capacity.
    pub fn append(&mut self, customer: &str, record: PurchaseRecord) {
        let capacity = self.capacity;
        let window = self
            .windows
            .entry(customer.to_string())
            .or_insert_with(|| VecDeque::with_capacity(capacity.min(64)));

        window.push_back(record);
        if window.len() > capacity {
            window.pop_front();
        }
    }

    /// Current window for a customer, oldest first. Unknown customers have an
    /// empty window.
    pub fn window(&self, customer: &str) -> &VecDeque<PurchaseRecord> {
        self.windows.get(customer).unwrap_or(&EMPTY_WINDOW)
    }

    /// Iterate all customers with their windows
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VecDeque<PurchaseRecord>)> {
        self.windows
            .iter()
            .map(|(customer, window)| (customer.as_str(), window))
    }

    /// Number of customers that have purchased at least once
    pub fn customer_count(&self) -> usize {
        self.windows.len()
    }

    /// Number of records currently retained across all customers
    pub fn retained_count(&self) -> usize {
        self.windows.values().map(VecDeque::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sequence: u64, amount: &str) -> PurchaseRecord {
        PurchaseRecord::new(sequence, amount, "2017-06-13 11:33:01").unwrap()
    }

    fn sequences(ledger: &PurchaseLedger, customer: &str) -> Vec<u64> {
        ledger.window(customer).iter().map(|r| r.sequence).collect()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("16.83").unwrap(), 16.83);
        assert_eq!(parse_amount("100").unwrap(), 100.0);
        assert_eq!(parse_amount(" 1e3 ").unwrap(), 1000.0);
        assert_eq!(parse_amount(".5").unwrap(), 0.5);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        for text in ["", "abc", "NaN", "inf", "-infinity", "12,50", "$10", "1.2.3"] {
            assert_eq!(
                parse_amount(text),
                Err(EngineError::MalformedAmount(text.to_string())),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_unknown_customer_window_is_empty() {
        let ledger = PurchaseLedger::new(3);
        assert!(ledger.window("nobody").is_empty());
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut ledger = PurchaseLedger::new(3);
        assert_eq!(ledger.capacity(), 3);
        for sequence in 0..10 {
            ledger.append("A", record(sequence, "1.00"));
            assert!(ledger.window("A").len() <= 3);
        }
        assert_eq!(ledger.retained_count(), 3);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut ledger = PurchaseLedger::new(2);
        ledger.append("A", record(0, "1"));
        ledger.append("A", record(1, "2"));
        assert_eq!(sequences(&ledger, "A"), vec![0, 1]);

        ledger.append("A", record(2, "3"));
        assert_eq!(sequences(&ledger, "A"), vec![1, 2]);
        assert_eq!(ledger.window("A")[1].raw_amount, "3");
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut ledger = PurchaseLedger::new(0);
        assert_eq!(ledger.capacity(), 0);
        ledger.append("A", record(0, "5"));
        assert!(ledger.window("A").is_empty());
        assert_eq!(ledger.customer_count(), 1);
    }

    #[test]
    fn test_windows_are_per_customer() {
        let mut ledger = PurchaseLedger::new(2);
        ledger.append("A", record(0, "1"));
        ledger.append("B", record(1, "2"));
        ledger.append("A", record(2, "3"));

        assert_eq!(sequences(&ledger, "A"), vec![0, 2]);
        assert_eq!(sequences(&ledger, "B"), vec![1]);
        assert_eq!(ledger.iter().count(), 2);
    }
}
