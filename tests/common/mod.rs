#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::rc::Rc;

use papertrader::domain::error::PapertraderError;
use papertrader::domain::instrument::{Instrument, InstrumentKind};
use papertrader::domain::ledger::{LedgerPolicy, OrderLedger};
use papertrader::domain::portfolio::PortfolioTree;
use papertrader::domain::series::MarketTick;
use papertrader::domain::signal::{Observer, ObserverError, SignalEvent};
use papertrader::domain::strategy::{build_strategy, StrategyParams};
use papertrader::domain::engine::ExecutionEngine;
use papertrader::ports::data_port::DataPort;

pub fn ts(secs: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
        + chrono::Duration::seconds(secs as i64)
}

pub fn tick(symbol: &str, seq: u32, price: f64) -> MarketTick {
    MarketTick {
        timestamp: ts(seq),
        symbol: symbol.to_string(),
        price,
    }
}

pub fn ticks_for(symbol: &str, prices: &[f64]) -> Vec<MarketTick> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| tick(symbol, i as u32, price))
        .collect()
}

pub struct MockDataPort {
    pub instruments: Vec<Instrument>,
    pub ticks: Vec<MarketTick>,
    pub fail_with: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            instruments: Vec::new(),
            ticks: Vec::new(),
            fail_with: None,
        }
    }

    pub fn with_equity(mut self, symbol: &str) -> Self {
        self.instruments
            .push(Instrument::new(symbol, InstrumentKind::Equity));
        self
    }

    pub fn with_ticks(mut self, ticks: Vec<MarketTick>) -> Self {
        self.ticks.extend(ticks);
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.fail_with = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_instruments(&self) -> Result<Vec<Instrument>, PapertraderError> {
        if let Some(reason) = &self.fail_with {
            return Err(PapertraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.instruments.clone())
    }

    fn load_ticks(
        &self,
        symbols: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<MarketTick>, PapertraderError> {
        if let Some(reason) = &self.fail_with {
            return Err(PapertraderError::Data {
                reason: reason.clone(),
            });
        }
        let filtered: Vec<MarketTick> = self
            .ticks
            .iter()
            .filter(|tick| symbols.is_empty() || symbols.contains(&tick.symbol))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(filtered)
    }
}

pub fn long_only_policy() -> LedgerPolicy {
    LedgerPolicy {
        allow_shorting: false,
        short_floor: 0.0,
        default_parent: String::new(),
    }
}

pub fn sample_params() -> StrategyParams {
    StrategyParams {
        lookback_window: 3,
        threshold: 1.0,
        order_size: 10.0,
    }
}

pub fn mean_reversion_engine() -> ExecutionEngine {
    let strategy = build_strategy("mean_reversion", sample_params()).unwrap();
    ExecutionEngine::new(
        strategy,
        PortfolioTree::new("Main", None),
        OrderLedger::new(long_only_policy()),
    )
}

/// Observer recording every event into shared storage, for assertions.
pub struct EventRecorder {
    pub seen: Rc<RefCell<Vec<SignalEvent>>>,
}

impl EventRecorder {
    pub fn shared() -> (Self, Rc<RefCell<Vec<SignalEvent>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        (Self { seen: seen.clone() }, seen)
    }
}

impl Observer for EventRecorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_event(&mut self, event: &SignalEvent) -> Result<(), ObserverError> {
        self.seen.borrow_mut().push(event.clone());
        Ok(())
    }
}

/// Observer that always errors, for fail-open tests.
pub struct BrokenObserver;

impl Observer for BrokenObserver {
    fn name(&self) -> &str {
        "broken"
    }

    fn on_event(&mut self, _event: &SignalEvent) -> Result<(), ObserverError> {
        Err(ObserverError {
            reason: "always fails".into(),
        })
    }
}
