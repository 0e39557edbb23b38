//! JSON portfolio-structure adapter.
//!
//! Reads a nested document of groups, owners, and initial positions and
//! builds the portfolio tree the engine starts from:
//!
//! ```json
//! {
//!   "name": "Main",
//!   "owner": "desk",
//!   "positions": [{"symbol": "AAPL", "quantity": 10, "price": 150.0}],
//!   "sub_portfolios": [{"name": "income", "positions": [...]}]
//! }
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::domain::error::PapertraderError;
use crate::domain::portfolio::PortfolioTree;
use crate::domain::position::Position;

#[derive(Debug, Deserialize)]
struct PortfolioDoc {
    name: Option<String>,
    owner: Option<String>,
    #[serde(default)]
    positions: Vec<PositionDoc>,
    #[serde(default)]
    sub_portfolios: Vec<GroupDoc>,
}

#[derive(Debug, Deserialize)]
struct GroupDoc {
    name: String,
    owner: Option<String>,
    #[serde(default)]
    positions: Vec<PositionDoc>,
    #[serde(default)]
    sub_portfolios: Vec<GroupDoc>,
}

#[derive(Debug, Deserialize)]
struct PositionDoc {
    symbol: String,
    #[serde(default)]
    quantity: f64,
    /// Acquisition price, used as the starting cost basis.
    #[serde(default)]
    price: f64,
}

/// Load a portfolio tree from a JSON file.
pub fn load_portfolio<P: AsRef<Path>>(path: P) -> Result<PortfolioTree, PapertraderError> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| PapertraderError::Data {
        reason: format!("failed to read {}: {}", path.as_ref().display(), e),
    })?;
    parse_portfolio(&content)
}

/// Parse a portfolio tree from a JSON string.
pub fn parse_portfolio(content: &str) -> Result<PortfolioTree, PapertraderError> {
    let doc: PortfolioDoc = serde_json::from_str(content).map_err(|e| PapertraderError::Data {
        reason: format!("portfolio JSON parse error: {}", e),
    })?;

    let mut tree = PortfolioTree::new(
        doc.name.unwrap_or_else(|| "Portfolio".to_string()),
        doc.owner,
    );
    for position in doc.positions {
        tree.add_position("", position.into_position())?;
    }
    for group in doc.sub_portfolios {
        add_group(&mut tree, "", group)?;
    }
    Ok(tree)
}

fn add_group(
    tree: &mut PortfolioTree,
    parent_path: &str,
    group: GroupDoc,
) -> Result<(), PapertraderError> {
    tree.add_group(parent_path, &group.name, group.owner)?;
    let path = if parent_path.is_empty() {
        group.name.clone()
    } else {
        format!("{}/{}", parent_path, group.name)
    };
    for position in group.positions {
        tree.add_position(&path, position.into_position())?;
    }
    for sub in group.sub_portfolios {
        add_group(tree, &path, sub)?;
    }
    Ok(())
}

impl PositionDoc {
    fn into_position(self) -> Position {
        Position::new(self.symbol, self.quantity, self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::TreeError;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"{
        "name": "Main",
        "owner": "desk",
        "positions": [
            {"symbol": "SPY", "quantity": 5, "price": 480.0}
        ],
        "sub_portfolios": [
            {
                "name": "tech",
                "positions": [
                    {"symbol": "AAPL", "quantity": 10, "price": 150.0},
                    {"symbol": "MSFT", "quantity": 4, "price": 300.0}
                ]
            },
            {
                "name": "income",
                "owner": "fixed income desk",
                "sub_portfolios": [
                    {
                        "name": "govvies",
                        "positions": [{"symbol": "GOV10", "quantity": 100, "price": 98.0}]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_nested_structure() {
        let tree = parse_portfolio(SAMPLE).unwrap();
        assert_eq!(tree.root_name(), "Main");

        let paths: Vec<String> = tree.traverse().map(|(path, _)| path).collect();
        assert_eq!(
            paths,
            vec![
                "SPY",
                "tech",
                "tech/AAPL",
                "tech/MSFT",
                "income",
                "income/govvies",
                "income/govvies/GOV10",
            ]
        );
    }

    #[test]
    fn positions_carry_quantity_and_basis() {
        let tree = parse_portfolio(SAMPLE).unwrap();
        let aapl = tree.position("AAPL").unwrap();
        assert_relative_eq!(aapl.quantity, 10.0);
        assert_relative_eq!(aapl.cost_basis, 150.0);
    }

    #[test]
    fn valuation_invariant_holds_at_construction() {
        let tree = parse_portfolio(SAMPLE).unwrap();
        let quotes: HashMap<String, f64> = [
            ("SPY", 500.0),
            ("AAPL", 160.0),
            ("MSFT", 310.0),
            ("GOV10", 99.0),
        ]
        .into_iter()
        .map(|(sym, price)| (sym.to_string(), price))
        .collect();

        let total = tree.value_of("", &quotes).unwrap();
        assert_relative_eq!(total, 5.0 * 500.0 + 10.0 * 160.0 + 4.0 * 310.0 + 100.0 * 99.0);
        assert_relative_eq!(
            tree.value_of("income", &quotes).unwrap(),
            tree.value_of("income/govvies", &quotes).unwrap()
        );
    }

    #[test]
    fn defaults_for_missing_fields() {
        let tree = parse_portfolio(r#"{"positions": [{"symbol": "XYZ"}]}"#).unwrap();
        assert_eq!(tree.root_name(), "Portfolio");
        let pos = tree.position("XYZ").unwrap();
        assert_relative_eq!(pos.quantity, 0.0);
        assert_relative_eq!(pos.cost_basis, 0.0);
    }

    #[test]
    fn malformed_json_is_a_data_error() {
        let err = parse_portfolio("{not json").unwrap_err();
        assert!(matches!(err, PapertraderError::Data { .. }));
    }

    #[test]
    fn duplicate_position_symbol_rejected() {
        let content = r#"{
            "positions": [
                {"symbol": "XYZ", "quantity": 1},
                {"symbol": "XYZ", "quantity": 2}
            ]
        }"#;
        let err = parse_portfolio(content).unwrap_err();
        assert!(matches!(
            err,
            PapertraderError::Tree(TreeError::DuplicateChild { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let err = load_portfolio("/nonexistent/portfolio.json").unwrap_err();
        assert!(matches!(err, PapertraderError::Data { .. }));
    }
}
