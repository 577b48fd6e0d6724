//! Typed log events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Purchase amount exactly as written in the log.
///
/// Logs carry amounts as strings (`"16.83"`), but bare JSON numbers are
/// accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AmountField", into = "String")]
pub struct RawAmount(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountField {
    Text(String),
    Number(serde_json::Number),
}

impl From<AmountField> for RawAmount {
    fn from(field: AmountField) -> Self {
        match field {
            AmountField::Text(text) => Self(text),
            AmountField::Number(number) => Self(number.to_string()),
        }
    }
}

impl From<RawAmount> for String {
    fn from(amount: RawAmount) -> Self {
        amount.0
    }
}

impl From<&str> for RawAmount {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl RawAmount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of a batch or stream log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "lowercase")]
pub enum Event {
    Befriend {
        id1: String,
        id2: String,
    },
    Unfriend {
        id1: String,
        id2: String,
    },
    Purchase {
        id: String,
        amount: RawAmount,
        timestamp: String,
    },
    /// Any other `event_type`; ignored by the engine
    #[serde(other)]
    Unknown,
}

impl Event {
    pub fn befriend(id1: &str, id2: &str) -> Self {
        Event::Befriend {
            id1: id1.to_string(),
            id2: id2.to_string(),
        }
    }

    pub fn unfriend(id1: &str, id2: &str) -> Self {
        Event::Unfriend {
            id1: id1.to_string(),
            id2: id2.to_string(),
        }
    }

    pub fn purchase(id: &str, amount: &str, timestamp: &str) -> Self {
        Event::Purchase {
            id: id.to_string(),
            amount: RawAmount::from(amount),
            timestamp: timestamp.to_string(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Befriend { id1, id2 } => write!(f, "befriend({}, {})", id1, id2),
            Event::Unfriend { id1, id2 } => write!(f, "unfriend({}, {})", id1, id2),
            Event::Purchase { id, amount, .. } => write!(f, "purchase({}, {})", id, amount),
            Event::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_friend_events() {
        let event: Event = serde_json::from_str(
            r#"{"event_type":"befriend", "timestamp":"2017-06-13 11:33:01", "id1":"1", "id2":"2"}"#,
        )
        .unwrap();
        assert_eq!(event, Event::befriend("1", "2"));

        let event: Event =
            serde_json::from_str(r#"{"event_type":"unfriend", "id1":"1", "id2":"3"}"#).unwrap();
        assert_eq!(event, Event::unfriend("1", "3"));
    }

    #[test]
    fn test_decode_purchase_keeps_amount_text() {
        let event: Event = serde_json::from_str(
            r#"{"event_type":"purchase", "timestamp":"2017-06-13 11:33:01", "id":"1", "amount":"16.80"}"#,
        )
        .unwrap();
        assert_eq!(event, Event::purchase("1", "16.80", "2017-06-13 11:33:01"));
    }

    #[test]
    fn test_decode_numeric_amount() {
        let event: Event = serde_json::from_str(
            r#"{"event_type":"purchase", "timestamp":"t", "id":"1", "amount":42.5}"#,
        )
        .unwrap();
        match event {
            Event::Purchase { amount, .. } => assert_eq!(amount.as_str(), "42.5"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_type() {
        let event: Event =
            serde_json::from_str(r#"{"event_type":"refund", "id":"1", "amount":"3.00"}"#).unwrap();
        assert_eq!(event, Event::Unknown);
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert!(serde_json::from_str::<Event>(r#"{"event_type":"purchase", "id":"1"}"#).is_err());
        assert!(serde_json::from_str::<Event>(r#"{"id1":"1", "id2":"2"}"#).is_err());
    }
}
