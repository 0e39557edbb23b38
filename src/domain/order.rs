//! Order intents, commands, and ledger receipts.

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::position::PositionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// An unexecuted trading instruction produced by a strategy.
/// Immutable; consumed exactly once by the execution engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    /// Strategy-assigned rationale tag, e.g. `mean_reversion deviation=-2.31`.
    pub rationale: String,
    pub timestamp: NaiveDateTime,
}

/// The ledger's unit of work: an intent plus the position snapshots needed
/// to reverse it exactly. Snapshots are captured by the ledger at apply time;
/// `pre` stays `None` when the apply created the position.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCommand {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub rationale: String,
    pub timestamp: NaiveDateTime,
    pub pre: Option<PositionSnapshot>,
    pub post: Option<PositionSnapshot>,
}

impl OrderCommand {
    pub fn from_intent(intent: OrderIntent) -> Self {
        OrderCommand {
            symbol: intent.symbol,
            side: intent.side,
            quantity: intent.quantity,
            price: intent.price,
            rationale: intent.rationale,
            timestamp: intent.timestamp,
            pre: None,
            post: None,
        }
    }
}

/// What a receipt records: the ledger operation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    Applied,
    Undone,
    Redone,
}

impl fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptKind::Applied => write!(f, "applied"),
            ReceiptKind::Undone => write!(f, "undone"),
            ReceiptKind::Redone => write!(f, "redone"),
        }
    }
}

/// Audit record of one ledger operation, with before/after position state.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub kind: ReceiptKind,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub before: Option<PositionSnapshot>,
    pub after: Option<PositionSnapshot>,
    pub timestamp: NaiveDateTime,
}
