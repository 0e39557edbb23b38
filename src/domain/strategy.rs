//! Signal-generation strategies over rolling price windows.
//!
//! Strategies are tick-driven: each call feeds one observation into the
//! per-symbol rolling state and returns zero or more order intents. Rolling
//! state is strategy-local and is discarded when the engine swaps strategies.

use std::collections::{HashMap, VecDeque};

use crate::domain::error::PapertraderError;
use crate::domain::order::{OrderIntent, Side};
use crate::domain::series::MarketTick;

/// Parameters shared by the built-in strategies, read from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub lookback_window: usize,
    /// Mean-reversion: standard deviations from the rolling mean.
    /// Breakout: fractional margin beyond the rolling high/low.
    pub threshold: f64,
    pub order_size: f64,
}

/// Fixed-capacity sliding buffer of recent prices. Oldest evicted on insert
/// once full.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        RollingWindow {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Population standard deviation over the window.
    pub fn std_dev(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / self.values.len() as f64;
        variance.sqrt()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().fold(None, |acc, v| {
            Some(acc.map_or(v, |m: f64| m.max(v)))
        })
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().fold(None, |acc, v| {
            Some(acc.map_or(v, |m: f64| m.min(v)))
        })
    }
}

/// A signal generator. Implementations keep their own rolling state.
pub trait Strategy: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Feed one tick; return the intents it triggers, in emission order.
    fn on_tick(&mut self, tick: &MarketTick) -> Vec<OrderIntent>;
}

/// Buys when the latest price sits more than `threshold` standard deviations
/// below the rolling mean, sells when above by the same margin. A flat window
/// (zero variance) emits nothing.
#[derive(Debug)]
pub struct MeanReversionStrategy {
    params: StrategyParams,
    windows: HashMap<String, RollingWindow>,
}

impl MeanReversionStrategy {
    pub fn new(params: StrategyParams) -> Self {
        MeanReversionStrategy {
            params,
            windows: HashMap::new(),
        }
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn on_tick(&mut self, tick: &MarketTick) -> Vec<OrderIntent> {
        let window = self
            .windows
            .entry(tick.symbol.clone())
            .or_insert_with(|| RollingWindow::new(self.params.lookback_window));
        window.push(tick.price);

        if !window.is_full() {
            return Vec::new();
        }

        let std_dev = window.std_dev();
        if std_dev == 0.0 {
            return Vec::new();
        }

        let z = (tick.price - window.mean()) / std_dev;
        let side = if z <= -self.params.threshold {
            Side::Buy
        } else if z >= self.params.threshold {
            Side::Sell
        } else {
            return Vec::new();
        };

        vec![OrderIntent {
            symbol: tick.symbol.clone(),
            side,
            quantity: self.params.order_size,
            price: tick.price,
            rationale: format!("mean_reversion z={z:.2}"),
            timestamp: tick.timestamp,
        }]
    }
}

/// Buys when price clears the rolling high by the configured margin, sells
/// when it breaks the rolling low by the same margin. High/low exclude the
/// current tick.
#[derive(Debug)]
pub struct BreakoutStrategy {
    params: StrategyParams,
    windows: HashMap<String, RollingWindow>,
}

impl BreakoutStrategy {
    pub fn new(params: StrategyParams) -> Self {
        BreakoutStrategy {
            params,
            windows: HashMap::new(),
        }
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        "breakout"
    }

    fn on_tick(&mut self, tick: &MarketTick) -> Vec<OrderIntent> {
        let window = self
            .windows
            .entry(tick.symbol.clone())
            .or_insert_with(|| RollingWindow::new(self.params.lookback_window));

        let intent = if window.is_full() {
            let high = window.max().unwrap_or(tick.price);
            let low = window.min().unwrap_or(tick.price);
            if tick.price > high * (1.0 + self.params.threshold) {
                let up = tick.price / high - 1.0;
                Some((Side::Buy, format!("breakout up={up:.4}")))
            } else if tick.price < low * (1.0 - self.params.threshold) {
                let down = tick.price / low - 1.0;
                Some((Side::Sell, format!("breakout down={down:.4}")))
            } else {
                None
            }
        } else {
            None
        };

        window.push(tick.price);

        match intent {
            Some((side, rationale)) => vec![OrderIntent {
                symbol: tick.symbol.clone(),
                side,
                quantity: self.params.order_size,
                price: tick.price,
                rationale,
                timestamp: tick.timestamp,
            }],
            None => Vec::new(),
        }
    }
}

/// Instantiate a strategy by its configured name.
pub fn build_strategy(
    name: &str,
    params: StrategyParams,
) -> Result<Box<dyn Strategy>, PapertraderError> {
    match name {
        "mean_reversion" => Ok(Box::new(MeanReversionStrategy::new(params))),
        "breakout" => Ok(Box::new(BreakoutStrategy::new(params))),
        _ => Err(PapertraderError::UnknownStrategy {
            name: name.to_string(),
        }),
    }
}
