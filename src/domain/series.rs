//! Market ticks and per-instrument price series.

use chrono::NaiveDateTime;

/// One price observation as delivered by the ingestion layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketTick {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("out-of-order tick for {symbol}: {timestamp} is not after {last}")]
    OutOfOrder {
        symbol: String,
        timestamp: NaiveDateTime,
        last: NaiveDateTime,
    },

    #[error("duplicate timestamp for {symbol}: {timestamp}")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: NaiveDateTime,
    },
}

/// Append-only, chronologically ordered price history for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    points: Vec<(NaiveDateTime, f64)>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>) -> Self {
        PriceSeries {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    /// Append a point, enforcing strict chronological order.
    pub fn push(&mut self, timestamp: NaiveDateTime, price: f64) -> Result<(), SeriesError> {
        if let Some(&(last, _)) = self.points.last() {
            if timestamp == last {
                return Err(SeriesError::DuplicateTimestamp {
                    symbol: self.symbol.clone(),
                    timestamp,
                });
            }
            if timestamp < last {
                return Err(SeriesError::OutOfOrder {
                    symbol: self.symbol.clone(),
                    timestamp,
                    last,
                });
            }
        }
        self.points.push((timestamp, price));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|&(_, price)| price)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(_, price)| price)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NaiveDateTime, f64)> {
        self.points.iter()
    }
}
