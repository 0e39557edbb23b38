//! Position state: signed quantity and cost basis for one instrument.

use crate::domain::order::Side;

/// Exact position state captured for undo/redo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSnapshot {
    pub quantity: f64,
    pub cost_basis: f64,
}

/// A holding in one instrument. Leaf of the portfolio tree; mutated only by
/// the order ledger applying a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    /// Average cost per unit of the current holding.
    pub cost_basis: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>, quantity: f64, cost_basis: f64) -> Self {
        Position {
            symbol: symbol.into(),
            quantity,
            cost_basis,
        }
    }

    /// A freshly created, empty position.
    pub fn flat(symbol: impl Into<String>) -> Self {
        Position::new(symbol, 0.0, 0.0)
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.cost_basis)
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            quantity: self.quantity,
            cost_basis: self.cost_basis,
        }
    }

    pub fn restore(&mut self, snapshot: PositionSnapshot) {
        self.quantity = snapshot.quantity;
        self.cost_basis = snapshot.cost_basis;
    }

    /// Apply a fill. Fills extending the position in its current direction
    /// blend the cost basis by quantity; reducing fills leave the basis
    /// untouched; a fill that flips the sign resets the basis to the fill
    /// price for the surviving portion.
    pub fn apply_fill(&mut self, side: Side, quantity: f64, price: f64) {
        let delta = match side {
            Side::Buy => quantity,
            Side::Sell => -quantity,
        };
        let new_quantity = self.quantity + delta;

        if self.quantity == 0.0 || self.quantity.signum() == delta.signum() {
            // Extending (or opening): weighted-average basis.
            let old_abs = self.quantity.abs();
            let total_abs = old_abs + delta.abs();
            if total_abs > 0.0 {
                self.cost_basis =
                    (old_abs * self.cost_basis + delta.abs() * price) / total_abs;
            }
        } else if new_quantity != 0.0 && new_quantity.signum() != self.quantity.signum() {
            // Flipped through zero.
            self.cost_basis = price;
        }
        // Plain reduction keeps the basis.

        self.quantity = new_quantity;
        if self.quantity == 0.0 {
            self.cost_basis = 0.0;
        }
    }
}
