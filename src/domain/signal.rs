//! Signal events, observers, and the synchronous publish/subscribe bus.

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::order::Side;

/// What a signal event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTag {
    Executed,
    Rejected,
    Undone,
    Redone,
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTag::Executed => write!(f, "executed"),
            EventTag::Rejected => write!(f, "rejected"),
            EventTag::Undone => write!(f, "undone"),
            EventTag::Redone => write!(f, "redone"),
        }
    }
}

/// Immutable event broadcast once per ledger outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    pub tag: EventTag,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub note: String,
    pub timestamp: NaiveDateTime,
}

impl SignalEvent {
    pub fn notional(&self) -> f64 {
        self.quantity.abs() * self.price
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("observer error: {reason}")]
pub struct ObserverError {
    pub reason: String,
}

/// Something that wants to hear about signal and execution events.
pub trait Observer {
    fn name(&self) -> &str;

    fn on_event(&mut self, event: &SignalEvent) -> Result<(), ObserverError>;
}

/// Synchronous publish/subscribe hub. Publishing fails open: an erroring
/// observer is reported to stderr and skipped, and delivery continues to the
/// remaining observers.
#[derive(Default)]
pub struct SignalBus {
    observers: Vec<Box<dyn Observer>>,
}

impl SignalBus {
    pub fn new() -> Self {
        SignalBus {
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn publish(&mut self, event: &SignalEvent) {
        for observer in &mut self.observers {
            if let Err(e) = observer.on_event(event) {
                eprintln!(
                    "Warning: observer {} failed on {} {}: {}",
                    observer.name(),
                    event.tag,
                    event.symbol,
                    e
                );
            }
        }
    }
}

/// Records every event and echoes it to stderr.
#[derive(Default)]
pub struct LoggerObserver {
    pub records: Vec<SignalEvent>,
}

impl LoggerObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer for LoggerObserver {
    fn name(&self) -> &str {
        "logger"
    }

    fn on_event(&mut self, event: &SignalEvent) -> Result<(), ObserverError> {
        eprintln!(
            "[{}] {} {} {} x {} @ {}",
            event.timestamp, event.tag, event.side, event.symbol, event.quantity, event.price
        );
        self.records.push(event.clone());
        Ok(())
    }
}

/// Records events whose notional meets the configured threshold.
pub struct AlertObserver {
    threshold_notional: f64,
    pub alerts: Vec<SignalEvent>,
}

impl AlertObserver {
    pub fn new(threshold_notional: f64) -> Self {
        AlertObserver {
            threshold_notional,
            alerts: Vec::new(),
        }
    }
}

impl Observer for AlertObserver {
    fn name(&self) -> &str {
        "alert"
    }

    fn on_event(&mut self, event: &SignalEvent) -> Result<(), ObserverError> {
        if event.notional() >= self.threshold_notional {
            eprintln!(
                "Alert: {} {} {} notional {:.2} >= {:.2}",
                event.tag,
                event.side,
                event.symbol,
                event.notional(),
                self.threshold_notional
            );
            self.alerts.push(event.clone());
        }
        Ok(())
    }
}
