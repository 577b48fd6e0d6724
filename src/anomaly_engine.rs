//! Anomalous purchase detection over a customer's social network
//!
//! The engine owns the friendship graph and the purchase ledger. A purchase
//! is judged against the most recent `T` purchases of the purchaser's
//! `D`-degree network as it stood *before* the purchase, then recorded.

use crate::events::Event;
use crate::neighborhood::within_degree;
use crate::purchase_ledger::{parse_amount, PurchaseLedger, PurchaseRecord};
use crate::social_graph::SocialGraph;
use crate::window_merger::merge_latest;
use crate::{EngineConfig, EngineError};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

/// Number of standard deviations above the mean that marks an anomaly
pub const SIGMA_MULTIPLIER: f64 = 3.0;

/// Mean and population standard deviation of a network's purchase window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodStats {
    pub mean: f64,
    pub sd: f64,
    /// Purchases the figures were computed from
    pub sample_size: usize,
}

impl NeighborhoodStats {
    /// Statistics of `amounts`, each rounded to cents. An empty window yields
    /// `(0, 0)`.
    pub fn from_amounts(amounts: &[f64]) -> Self {
        if amounts.is_empty() {
            return Self {
                mean: 0.0,
                sd: 0.0,
                sample_size: 0,
            };
        }

        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean: round_cents(mean),
            sd: round_cents(variance.sqrt()),
            sample_size: amounts.len(),
        }
    }

    /// Amount above which a purchase is flagged
    pub fn threshold(&self) -> f64 {
        self.mean + SIGMA_MULTIPLIER * self.sd
    }

    pub fn is_anomalous(&self, amount: f64) -> bool {
        amount > self.threshold()
    }
}

/// Round to cents through decimal formatting, which rounds the exact binary
/// value instead of a scaled (and already rounded) copy of it
fn round_cents(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}

/// A purchase flagged as anomalous, in output field order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedPurchase {
    pub event_type: &'static str,
    pub timestamp: String,
    pub id: String,
    /// Amount as originally given, unrounded
    pub amount: String,
    #[serde(serialize_with = "two_decimals")]
    pub mean: f64,
    #[serde(serialize_with = "two_decimals")]
    pub sd: f64,
}

impl FlaggedPurchase {
    fn new(customer: &str, raw_amount: &str, timestamp: &str, stats: &NeighborhoodStats) -> Self {
        Self {
            event_type: "purchase",
            timestamp: timestamp.to_string(),
            id: customer.to_string(),
            amount: raw_amount.to_string(),
            mean: stats.mean,
            sd: stats.sd,
        }
    }

    /// Export as a single JSON line
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub customers_in_graph: usize,
    pub friendships: usize,
    pub purchasers: usize,
    pub purchases_recorded: u64,
    pub purchases_retained: usize,
    pub flagged: usize,
}

/// Social network purchase anomaly engine
#[derive(Debug)]
pub struct AnomalyEngine {
    config: EngineConfig,
    graph: SocialGraph,
    ledger: PurchaseLedger,
    next_sequence: u64,
    flagged: Vec<FlaggedPurchase>,
}

impl AnomalyEngine {
    /// Create an empty engine
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            graph: SocialGraph::new(),
            ledger: PurchaseLedger::new(config.window_size),
            next_sequence: 0,
            flagged: Vec::new(),
        }
    }

    /// Build an engine from a batch log: `config_record` carries `D` and `T`,
    /// `events` establish the initial network without anomaly detection.
    pub fn from_batch<'e, I>(config_record: &serde_json::Value, events: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = &'e Event>,
    {
        let mut engine = Self::new(EngineConfig::from_record(config_record)?);
        for event in events {
            engine.ingest(event)?;
        }
        Ok(engine)
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    pub fn ledger(&self) -> &PurchaseLedger {
        &self.ledger
    }

    /// Apply an event without anomaly detection
    pub fn ingest(&mut self, event: &Event) -> Result<(), EngineError> {
        match event {
            Event::Befriend { id1, id2 } => self.apply_friend_event(id1, id2, true),
            Event::Unfriend { id1, id2 } => self.apply_friend_event(id1, id2, false),
            Event::Purchase {
                id,
                amount,
                timestamp,
            } => self.record_purchase(id, amount.as_str(), timestamp),
            Event::Unknown => Ok(()),
        }
    }

    /// Apply an event with anomaly detection on purchases
    pub fn process(&mut self, event: &Event) -> Result<Option<FlaggedPurchase>, EngineError> {
        match event {
            Event::Purchase {
                id,
                amount,
                timestamp,
            } => self.process_purchase(id, amount.as_str(), timestamp),
            other => self.ingest(other).map(|()| None),
        }
    }

    /// Befriend (`is_befriend`) or unfriend two customers
    pub fn apply_friend_event(
        &mut self,
        customer: &str,
        friend: &str,
        is_befriend: bool,
    ) -> Result<(), EngineError> {
        if is_befriend {
            let added = self.graph.add_edge(customer, friend);
            debug!(customer, friend, added, "befriend");
        } else {
            self.graph.remove_edge(customer, friend)?;
            debug!(customer, friend, "unfriend");
        }
        Ok(())
    }

    /// Statistics of the most recent `T` purchases in `customer`'s
    /// `D`-degree network, excluding the customer's own purchases
    pub fn statistics(&self, customer: &str) -> NeighborhoodStats {
        let network = within_degree(&self.graph, customer, self.config.degree);
        let window = merge_latest(&self.ledger, network, self.config.window_size);
        let amounts: Vec<f64> = window.iter().map(|record| record.amount).collect();

        NeighborhoodStats::from_amounts(&amounts)
    }

    /// Evaluate a purchase against the current network state, then record it.
    ///
    /// Malformed amounts are rejected before anything is evaluated or stored.
    pub fn process_purchase(
        &mut self,
        customer: &str,
        raw_amount: &str,
        timestamp: &str,
    ) -> Result<Option<FlaggedPurchase>, EngineError> {
        let amount = parse_amount(raw_amount)?;
        let stats = self.statistics(customer);

        let flagged = if stats.is_anomalous(amount) {
            let flagged = FlaggedPurchase::new(customer, raw_amount, timestamp, &stats);
            info!(
                customer,
                amount = raw_amount,
                mean = stats.mean,
                sd = stats.sd,
                window = stats.sample_size,
                "Anomalous purchase flagged"
            );
            self.flagged.push(flagged.clone());
            Some(flagged)
        } else {
            None
        };

        self.record_purchase(customer, raw_amount, timestamp)?;
        Ok(flagged)
    }

    /// Record a purchase without evaluating it
    fn record_purchase(&mut self, customer: &str, raw_amount: &str, timestamp: &str) -> Result<(), EngineError> {
        let record = PurchaseRecord::new(self.next_sequence, raw_amount, timestamp)?;
        self.ledger.append(customer, record);
        self.next_sequence += 1;
        Ok(())
    }

    /// Flagged purchases in detection order
    pub fn flagged(&self) -> &[FlaggedPurchase] {
        &self.flagged
    }

    /// Drain the flagged purchases collected so far
    pub fn take_flagged(&mut self) -> Vec<FlaggedPurchase> {
        std::mem::take(&mut self.flagged)
    }

    /// Customers with the highest total spend within `days` of `reference`
    #[cfg(feature = "ranking")]
    pub fn top_spenders(
        &self,
        reference: &str,
        days: i64,
    ) -> Result<Vec<crate::spending_rank::SpenderTotal>, EngineError> {
        crate::spending_rank::rank_spenders(&self.ledger, reference, chrono::Duration::days(days))
    }

    /// Get engine statistics
    pub fn stats(&self) -> EngineStats {
        let graph = self.graph.get_stats();
        EngineStats {
            customers_in_graph: graph.node_count,
            friendships: graph.edge_count,
            purchasers: self.ledger.customer_count(),
            purchases_recorded: self.next_sequence,
            purchases_retained: self.ledger.retained_count(),
            flagged: self.flagged.len(),
        }
    }
}
