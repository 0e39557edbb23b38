//! Instrument reference data.

use chrono::NaiveDate;

/// Instrument category. Bonds carry an optional maturity date; other static
/// attributes are shared.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentKind {
    Equity,
    Bond { maturity: Option<NaiveDate> },
    Fund,
}

impl InstrumentKind {
    /// Parse a kind from its wire name (`equity`, `bond`, `fund`).
    pub fn parse(name: &str, maturity: Option<NaiveDate>) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "equity" | "stock" => Some(InstrumentKind::Equity),
            "bond" => Some(InstrumentKind::Bond { maturity }),
            "fund" | "etf" => Some(InstrumentKind::Fund),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InstrumentKind::Equity => "equity",
            InstrumentKind::Bond { .. } => "bond",
            InstrumentKind::Fund => "fund",
        }
    }
}

/// A financial instrument. Immutable once created; prices live in the
/// per-instrument [`PriceSeries`](crate::domain::series::PriceSeries),
/// not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub kind: InstrumentKind,
    pub sector: Option<String>,
    pub issuer: Option<String>,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, kind: InstrumentKind) -> Self {
        Instrument {
            symbol: symbol.into(),
            kind,
            sector: None,
            issuer: None,
        }
    }

    pub fn is_bond(&self) -> bool {
        matches!(self.kind, InstrumentKind::Bond { .. })
    }
}
