//! Append-only order ledger with linear undo/redo.
//!
//! All position mutation funnels through [`OrderLedger::apply`],
//! [`OrderLedger::undo`], and [`OrderLedger::redo`]. Undo restores the exact
//! pre-apply snapshot captured in the command; it never re-derives state by
//! negating the order, so cost-basis round-trips are exact.

use crate::domain::order::{OrderCommand, Receipt, ReceiptKind};
use crate::domain::portfolio::{PortfolioTree, TreeError};
use crate::domain::position::{Position, PositionSnapshot};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient position in {symbol}: sell {requested} exceeds available {available}")]
    InsufficientPosition {
        symbol: String,
        requested: f64,
        available: f64,
    },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Short-selling policy and placement of ledger-created positions.
/// All three fields come from configuration; there is no built-in floor.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPolicy {
    pub allow_shorting: bool,
    /// Lowest quantity a sell may leave behind when shorting is allowed.
    pub short_floor: f64,
    /// Group path that receives positions opened for previously unheld symbols.
    pub default_parent: String,
}

impl LedgerPolicy {
    fn floor(&self) -> f64 {
        if self.allow_shorting {
            self.short_floor
        } else {
            0.0
        }
    }
}

/// Owns the applied/redo stacks and the receipt audit log. Borrows the
/// portfolio tree mutably per operation; it never holds onto it.
#[derive(Debug)]
pub struct OrderLedger {
    policy: LedgerPolicy,
    applied: Vec<OrderCommand>,
    redo_stack: Vec<OrderCommand>,
    receipts: Vec<Receipt>,
}

impl OrderLedger {
    pub fn new(policy: LedgerPolicy) -> Self {
        OrderLedger {
            policy,
            applied: Vec::new(),
            redo_stack: Vec::new(),
            receipts: Vec::new(),
        }
    }

    /// Validate and execute a command against the tree. On success the
    /// command lands on the applied stack and the redo stack is discarded
    /// (linear history, no branching).
    pub fn apply(
        &mut self,
        mut cmd: OrderCommand,
        tree: &mut PortfolioTree,
    ) -> Result<Receipt, LedgerError> {
        use crate::domain::order::Side;

        let existing = tree.position(&cmd.symbol).map(|pos| pos.snapshot());
        let held = existing.map(|snap| snap.quantity).unwrap_or(0.0);

        if cmd.side == Side::Sell {
            let floor = self.policy.floor();
            if held - cmd.quantity < floor {
                return Err(LedgerError::InsufficientPosition {
                    symbol: cmd.symbol.clone(),
                    requested: cmd.quantity,
                    available: held - floor,
                });
            }
        }

        if existing.is_none() {
            tree.add_position(&self.policy.default_parent, Position::flat(&cmd.symbol))?;
        }

        // Freshly created above, so the lookup cannot miss.
        let pos = tree
            .position_mut(&cmd.symbol)
            .ok_or_else(|| TreeError::PathNotFound {
                path: cmd.symbol.clone(),
            })?;
        pos.apply_fill(cmd.side, cmd.quantity, cmd.price);
        let post = pos.snapshot();

        cmd.pre = existing;
        cmd.post = Some(post);

        let receipt = Receipt {
            kind: ReceiptKind::Applied,
            symbol: cmd.symbol.clone(),
            side: cmd.side,
            quantity: cmd.quantity,
            price: cmd.price,
            before: cmd.pre,
            after: cmd.post,
            timestamp: cmd.timestamp,
        };

        self.applied.push(cmd);
        self.redo_stack.clear();
        self.receipts.push(receipt.clone());
        Ok(receipt)
    }

    /// Reverse the most recent command exactly, moving it to the redo stack.
    pub fn undo(&mut self, tree: &mut PortfolioTree) -> Result<Receipt, LedgerError> {
        let cmd = self.applied.pop().ok_or(LedgerError::NothingToUndo)?;

        match cmd.pre {
            Some(snapshot) => self.restore(tree, &cmd.symbol, snapshot)?,
            // The apply created this position; undo removes it again.
            None => {
                tree.remove_position(&cmd.symbol);
            }
        }

        let receipt = Receipt {
            kind: ReceiptKind::Undone,
            symbol: cmd.symbol.clone(),
            side: cmd.side,
            quantity: cmd.quantity,
            price: cmd.price,
            before: cmd.post,
            after: cmd.pre,
            timestamp: cmd.timestamp,
        };

        self.redo_stack.push(cmd);
        self.receipts.push(receipt.clone());
        Ok(receipt)
    }

    /// Re-apply the most recently undone command. Valid only while no new
    /// apply has intervened; does not clear the redo stack.
    pub fn redo(&mut self, tree: &mut PortfolioTree) -> Result<Receipt, LedgerError> {
        let cmd = self.redo_stack.pop().ok_or(LedgerError::NothingToRedo)?;

        match cmd.post {
            Some(snapshot) => self.restore(tree, &cmd.symbol, snapshot)?,
            None => unreachable!("applied command always carries a post snapshot"),
        }

        let receipt = Receipt {
            kind: ReceiptKind::Redone,
            symbol: cmd.symbol.clone(),
            side: cmd.side,
            quantity: cmd.quantity,
            price: cmd.price,
            before: cmd.pre,
            after: cmd.post,
            timestamp: cmd.timestamp,
        };

        self.applied.push(cmd);
        self.receipts.push(receipt.clone());
        Ok(receipt)
    }

    fn restore(
        &self,
        tree: &mut PortfolioTree,
        symbol: &str,
        snapshot: PositionSnapshot,
    ) -> Result<(), TreeError> {
        if tree.position(symbol).is_none() {
            tree.add_position(&self.policy.default_parent, Position::flat(symbol))?;
        }
        if let Some(pos) = tree.position_mut(symbol) {
            pos.restore(snapshot);
        }
        Ok(())
    }

    /// Full audit log, in operation order.
    pub fn history(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn undo_depth(&self) -> usize {
        self.applied.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }
}
