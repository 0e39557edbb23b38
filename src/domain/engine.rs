//! Execution engine: strategy → ledger → tree → bus, one pass at a time.

use std::collections::HashMap;

use crate::domain::error::PapertraderError;
use crate::domain::ledger::{LedgerError, OrderLedger};
use crate::domain::order::{OrderCommand, Receipt};
use crate::domain::portfolio::{PortfolioTree, TreeError};
use crate::domain::series::MarketTick;
use crate::domain::signal::{EventTag, Observer, SignalBus, SignalEvent};
use crate::domain::strategy::Strategy;

/// Aggregate counters for one engine pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassSummary {
    pub ticks: usize,
    pub intents: usize,
    pub executed: usize,
    pub rejected: usize,
}

/// Owns the mutable core state. No external actor mutates the tree or ledger
/// directly; everything funnels through the pass loop and undo/redo.
pub struct ExecutionEngine {
    strategy: Box<dyn Strategy>,
    tree: PortfolioTree,
    ledger: OrderLedger,
    bus: SignalBus,
    latest_prices: HashMap<String, f64>,
}

impl ExecutionEngine {
    pub fn new(strategy: Box<dyn Strategy>, tree: PortfolioTree, ledger: OrderLedger) -> Self {
        ExecutionEngine {
            strategy,
            tree,
            ledger,
            bus: SignalBus::new(),
            latest_prices: HashMap::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.bus.subscribe(observer);
    }

    /// One synchronous pass over a tick feed. Rejected orders
    /// (insufficient position) are announced and skipped; any other ledger
    /// or tree error aborts the pass.
    pub fn run_pass(&mut self, ticks: &[MarketTick]) -> Result<PassSummary, PapertraderError> {
        let mut summary = PassSummary::default();

        for tick in ticks {
            summary.ticks += 1;
            self.latest_prices.insert(tick.symbol.clone(), tick.price);

            for intent in self.strategy.on_tick(tick) {
                summary.intents += 1;
                let note = intent.rationale.clone();
                let (side, quantity, price) = (intent.side, intent.quantity, intent.price);
                let cmd = OrderCommand::from_intent(intent);

                match self.ledger.apply(cmd, &mut self.tree) {
                    Ok(receipt) => {
                        summary.executed += 1;
                        self.publish(EventTag::Executed, &receipt, note);
                    }
                    Err(err @ LedgerError::InsufficientPosition { .. }) => {
                        summary.rejected += 1;
                        self.bus.publish(&SignalEvent {
                            tag: EventTag::Rejected,
                            symbol: tick.symbol.clone(),
                            side,
                            quantity,
                            price,
                            note: err.to_string(),
                            timestamp: tick.timestamp,
                        });
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        Ok(summary)
    }

    /// Undo the most recent ledger command and announce it.
    pub fn undo_last(&mut self) -> Result<Receipt, PapertraderError> {
        let receipt = self.ledger.undo(&mut self.tree)?;
        self.publish(EventTag::Undone, &receipt, String::new());
        Ok(receipt)
    }

    /// Redo the most recently undone command and announce it.
    pub fn redo_last(&mut self) -> Result<Receipt, PapertraderError> {
        let receipt = self.ledger.redo(&mut self.tree)?;
        self.publish(EventTag::Redone, &receipt, String::new());
        Ok(receipt)
    }

    /// Swap the active strategy between passes. Tree and ledger state stay;
    /// the outgoing strategy's rolling windows go with it.
    pub fn switch_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.strategy = strategy;
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Valuation of the node at `path` against the latest observed prices.
    pub fn valuation(&self, path: &str) -> Result<f64, TreeError> {
        self.tree.value_of(path, &self.latest_prices)
    }

    pub fn tree(&self) -> &PortfolioTree {
        &self.tree
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    pub fn latest_prices(&self) -> &HashMap<String, f64> {
        &self.latest_prices
    }

    fn publish(&mut self, tag: EventTag, receipt: &Receipt, note: String) {
        self.bus.publish(&SignalEvent {
            tag,
            symbol: receipt.symbol.clone(),
            side: receipt.side,
            quantity: receipt.quantity,
            price: receipt.price,
            note,
            timestamp: receipt.timestamp,
        });
    }
}
