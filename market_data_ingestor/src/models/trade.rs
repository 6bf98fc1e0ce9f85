//! Canonical in-memory representation of a single executed trade (tick).
//!
//! This struct is the standard output of every [`TradeProvider`](crate::providers::TradeProvider)
//! implementation, independent of the vendor's wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One executed trade as reported by the consolidated tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution time (UTC, sub-second precision).
    pub timestamp: DateTime<Utc>,

    /// Execution price.
    pub price: f64,

    /// Number of shares.
    pub size: u64,

    /// Sale condition codes attached by the exchange.
    pub conditions: Vec<String>,

    /// Exchange code. Not all providers supply this.
    pub exchange: Option<String>,

    /// Trade id, unique per exchange. Not all providers supply this.
    pub id: Option<u64>,

    /// Tape (A, B or C). Not all providers supply this.
    pub tape: Option<String>,
}
