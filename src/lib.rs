//! # Rust Purchase Anomaly Detector
//!
//! Detects anomalous purchases inside an evolving social network of customers.
//!
//! ## Features
//!
//! - **Social Graph**: Undirected friendship graph with strict, typed unfriend semantics
//! - **Bounded Purchase Windows**: The `T` most recent purchases per customer
//! - **Degree-Bounded Neighborhoods**: Breadth-first walk up to `D` hops
//! - **Top-T Window Merge**: Bounded heap merge across a whole neighborhood
//! - **Anomaly Flagging**: A purchase is flagged when `amount > mean + 3 * sd`
//! - **Spending Ranking**: Optional top-spender report over a time window
//!
//! ## Processing Model
//!
//! The first batch record configures `D` and `T`. The rest of the batch builds
//! the initial network without detection; every streamed purchase is then
//! evaluated against its neighborhood *before* it is recorded.

pub mod anomaly_engine;
pub mod events;
pub mod log_io;
pub mod neighborhood;
pub mod purchase_ledger;
pub mod social_graph;
#[cfg(feature = "ranking")]
pub mod spending_rank;
pub mod window_merger;

pub use anomaly_engine::{AnomalyEngine, EngineStats, FlaggedPurchase, NeighborhoodStats};
pub use events::{Event, RawAmount};
pub use log_io::{ErrorPolicy, FlaggedWriter, LogError, StreamSummary};
pub use purchase_ledger::{PurchaseLedger, PurchaseRecord};
pub use social_graph::{GraphStats, SocialGraph};
#[cfg(feature = "ranking")]
pub use spending_rank::SpenderTotal;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque customer identifier as it appears in the logs.
pub type CustomerId = String;

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No friendship between {customer} and {friend}")]
    EdgeNotFound { customer: String, friend: String },

    #[error("Malformed purchase amount: {0}")]
    MalformedAmount(String),

    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),
}

/// Network parameters, fixed for the lifetime of one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of degrees (`D`) that defines a customer's social network
    pub degree: usize,
    /// Number of consecutive purchases (`T`) considered per network
    pub window_size: usize,
}

impl EngineConfig {
    pub fn new(degree: usize, window_size: usize) -> Self {
        Self {
            degree,
            window_size,
        }
    }

    /// Decode the configuration record that opens a batch log, e.g.
    /// `{"D":"3","T":"50"}`. Values may be JSON strings or numbers.
    pub fn from_record(record: &serde_json::Value) -> Result<Self, EngineError> {
        Ok(Self {
            degree: config_value(record, "D")?,
            window_size: config_value(record, "T")?,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            degree: 1,
            window_size: 50,
        }
    }
}

fn config_value(record: &serde_json::Value, key: &str) -> Result<usize, EngineError> {
    let value = record
        .get(key)
        .ok_or_else(|| EngineError::InvalidConfiguration(format!("missing {}", key)))?;

    let parsed = match value {
        serde_json::Value::String(text) => text.trim().parse::<usize>().ok(),
        serde_json::Value::Number(number) => {
            number.as_u64().and_then(|n| usize::try_from(n).ok())
        }
        _ => None,
    };

    parsed.ok_or_else(|| {
        EngineError::InvalidConfiguration(format!(
            "{} must be a non-negative integer, got {}",
            key, value
        ))
    })
}
