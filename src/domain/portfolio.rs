//! Composite portfolio tree: positions and nested groups with recursive,
//! always-recomputed valuation.
//!
//! Paths are `/`-separated child names relative to the root group; the empty
//! string addresses the root itself. Nodes carry no parent pointers — all
//! lookup is path-based.

use std::collections::HashMap;

use crate::domain::position::Position;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("portfolio path not found: {path}")]
    PathNotFound { path: String },

    #[error("duplicate child {name:?} under {parent:?}")]
    DuplicateChild { parent: String, name: String },
}

/// A node is either a position leaf or a group of child nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum PortfolioNode {
    Position(Position),
    Group(PortfolioGroup),
}

impl PortfolioNode {
    /// The identifier this node carries within its parent: the group name
    /// or the position's symbol.
    pub fn name(&self) -> &str {
        match self {
            PortfolioNode::Position(pos) => &pos.symbol,
            PortfolioNode::Group(group) => &group.name,
        }
    }

    /// Market value: positions from the price map, groups by recursive
    /// summation. Symbols without a quote contribute nothing.
    pub fn value(&self, prices: &HashMap<String, f64>) -> f64 {
        match self {
            PortfolioNode::Position(pos) => prices
                .get(&pos.symbol)
                .map(|&price| pos.market_value(price))
                .unwrap_or(0.0),
            PortfolioNode::Group(group) => {
                group.children.iter().map(|child| child.value(prices)).sum()
            }
        }
    }
}

/// An ordered collection of child nodes with an owner label. Holds no
/// instrument state of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioGroup {
    pub name: String,
    pub owner: Option<String>,
    pub children: Vec<PortfolioNode>,
}

impl PortfolioGroup {
    pub fn new(name: impl Into<String>, owner: Option<String>) -> Self {
        PortfolioGroup {
            name: name.into(),
            owner,
            children: Vec::new(),
        }
    }
}

/// Exclusive owner of the node tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioTree {
    root: PortfolioGroup,
}

/// Positions / distinct symbols / total value, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSummary {
    pub positions: usize,
    pub symbols: usize,
    pub total_value: f64,
}

impl PortfolioTree {
    pub fn new(name: impl Into<String>, owner: Option<String>) -> Self {
        PortfolioTree {
            root: PortfolioGroup::new(name, owner),
        }
    }

    pub fn root_name(&self) -> &str {
        &self.root.name
    }

    fn group_mut(&mut self, path: &str) -> Result<&mut PortfolioGroup, TreeError> {
        let mut current = &mut self.root;
        if path.is_empty() {
            return Ok(current);
        }
        for segment in path.split('/') {
            let child = current
                .children
                .iter_mut()
                .find(|node| node.name() == segment);
            current = match child {
                Some(PortfolioNode::Group(group)) => group,
                _ => {
                    return Err(TreeError::PathNotFound {
                        path: path.to_string(),
                    })
                }
            };
        }
        Ok(current)
    }

    fn insert(&mut self, parent_path: &str, node: PortfolioNode) -> Result<(), TreeError> {
        let name = node.name().to_string();
        let parent = self.group_mut(parent_path)?;
        if parent.children.iter().any(|child| child.name() == name) {
            return Err(TreeError::DuplicateChild {
                parent: parent_path.to_string(),
                name,
            });
        }
        parent.children.push(node);
        Ok(())
    }

    /// Add a position leaf under the group at `parent_path`.
    pub fn add_position(&mut self, parent_path: &str, position: Position) -> Result<(), TreeError> {
        self.insert(parent_path, PortfolioNode::Position(position))
    }

    /// Add an empty group under the group at `parent_path`.
    pub fn add_group(
        &mut self,
        parent_path: &str,
        name: &str,
        owner: Option<String>,
    ) -> Result<(), TreeError> {
        self.insert(
            parent_path,
            PortfolioNode::Group(PortfolioGroup::new(name, owner)),
        )
    }

    /// Market value of the node at `path`, recomputed on every call.
    pub fn value_of(&self, path: &str, prices: &HashMap<String, f64>) -> Result<f64, TreeError> {
        if path.is_empty() {
            return Ok(self
                .root
                .children
                .iter()
                .map(|child| child.value(prices))
                .sum());
        }
        let node = self.node_at(path)?;
        Ok(node.value(prices))
    }

    /// Value of the node at `path` relative to its parent. The root weighs 1.0;
    /// a zero-valued parent yields 0.0.
    pub fn weight_of(&self, path: &str, prices: &HashMap<String, f64>) -> Result<f64, TreeError> {
        if path.is_empty() {
            return Ok(1.0);
        }
        let child_value = self.value_of(path, prices)?;
        let parent_path = match path.rfind('/') {
            Some(idx) => &path[..idx],
            None => "",
        };
        let parent_value = self.value_of(parent_path, prices)?;
        if parent_value == 0.0 {
            Ok(0.0)
        } else {
            Ok(child_value / parent_value)
        }
    }

    fn node_at(&self, path: &str) -> Result<&PortfolioNode, TreeError> {
        let mut children = &self.root.children;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            let node = children
                .iter()
                .find(|node| node.name() == segment)
                .ok_or_else(|| TreeError::PathNotFound {
                    path: path.to_string(),
                })?;
            if segments.peek().is_none() {
                return Ok(node);
            }
            children = match node {
                PortfolioNode::Group(group) => &group.children,
                PortfolioNode::Position(_) => {
                    return Err(TreeError::PathNotFound {
                        path: path.to_string(),
                    })
                }
            };
        }
        Err(TreeError::PathNotFound {
            path: path.to_string(),
        })
    }

    /// Depth-first, parent-before-children traversal of all nodes below the
    /// root. Restartable: each call builds a fresh iterator.
    pub fn traverse(&self) -> Traverse<'_> {
        let stack: Vec<(String, &PortfolioNode)> = self
            .root
            .children
            .iter()
            .rev()
            .map(|node| (node.name().to_string(), node))
            .collect();
        Traverse { stack }
    }

    /// First position holding `symbol`, depth-first.
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.traverse().find_map(|(_, node)| match node {
            PortfolioNode::Position(pos) if pos.symbol == symbol => Some(pos),
            _ => None,
        })
    }

    pub fn position_mut(&mut self, symbol: &str) -> Option<&mut Position> {
        fn walk<'a>(group: &'a mut PortfolioGroup, symbol: &str) -> Option<&'a mut Position> {
            for child in &mut group.children {
                match child {
                    PortfolioNode::Position(pos) if pos.symbol == symbol => return Some(pos),
                    PortfolioNode::Group(sub) => {
                        if let Some(found) = walk(sub, symbol) {
                            return Some(found);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        walk(&mut self.root, symbol)
    }

    /// Remove the first position holding `symbol`. Used when undoing a
    /// command that created the position.
    pub fn remove_position(&mut self, symbol: &str) -> Option<Position> {
        fn walk(group: &mut PortfolioGroup, symbol: &str) -> Option<Position> {
            if let Some(idx) = group.children.iter().position(
                |child| matches!(child, PortfolioNode::Position(pos) if pos.symbol == symbol),
            ) {
                match group.children.remove(idx) {
                    PortfolioNode::Position(pos) => return Some(pos),
                    PortfolioNode::Group(_) => unreachable!(),
                }
            }
            for child in &mut group.children {
                if let PortfolioNode::Group(sub) = child {
                    if let Some(found) = walk(sub, symbol) {
                        return Some(found);
                    }
                }
            }
            None
        }
        walk(&mut self.root, symbol)
    }

    /// Position count, distinct symbol count, and total value.
    pub fn summary(&self, prices: &HashMap<String, f64>) -> TreeSummary {
        let mut positions = 0;
        let mut symbols = std::collections::HashSet::new();
        for (_, node) in self.traverse() {
            if let PortfolioNode::Position(pos) = node {
                positions += 1;
                symbols.insert(pos.symbol.clone());
            }
        }
        TreeSummary {
            positions,
            symbols: symbols.len(),
            total_value: self
                .root
                .children
                .iter()
                .map(|child| child.value(prices))
                .sum(),
        }
    }
}

/// Lazy depth-first pre-order iterator over `(path, node)` pairs.
pub struct Traverse<'a> {
    stack: Vec<(String, &'a PortfolioNode)>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = (String, &'a PortfolioNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        if let PortfolioNode::Group(group) = node {
            for child in group.children.iter().rev() {
                self.stack.push((format!("{}/{}", path, child.name()), child));
            }
        }
        Some((path, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn prices(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs
            .iter()
            .map(|&(sym, price)| (sym.to_string(), price))
            .collect()
    }

    fn sample_tree() -> PortfolioTree {
        let mut tree = PortfolioTree::new("Main", Some("desk".into()));
        tree.add_group("", "tech", None).unwrap();
        tree.add_group("", "income", Some("fixed income desk".into()))
            .unwrap();
        tree.add_position("tech", Position::new("AAPL", 10.0, 150.0))
            .unwrap();
        tree.add_position("tech", Position::new("MSFT", 5.0, 300.0))
            .unwrap();
        tree.add_position("income", Position::new("GOV10", 100.0, 98.0))
            .unwrap();
        tree
    }

    #[test]
    fn root_value_is_recursive_sum() {
        let tree = sample_tree();
        let quotes = prices(&[("AAPL", 160.0), ("MSFT", 310.0), ("GOV10", 99.0)]);
        // 10*160 + 5*310 + 100*99
        assert_relative_eq!(tree.value_of("", &quotes).unwrap(), 1600.0 + 1550.0 + 9900.0);
    }

    #[test]
    fn group_value_sums_children_only() {
        let tree = sample_tree();
        let quotes = prices(&[("AAPL", 160.0), ("MSFT", 310.0), ("GOV10", 99.0)]);
        assert_relative_eq!(tree.value_of("tech", &quotes).unwrap(), 3150.0);
        assert_relative_eq!(tree.value_of("income", &quotes).unwrap(), 9900.0);
    }

    #[test]
    fn position_value_by_path() {
        let tree = sample_tree();
        let quotes = prices(&[("AAPL", 160.0)]);
        assert_relative_eq!(tree.value_of("tech/AAPL", &quotes).unwrap(), 1600.0);
    }

    #[test]
    fn missing_quote_contributes_nothing() {
        let tree = sample_tree();
        let quotes = prices(&[("AAPL", 160.0)]);
        assert_relative_eq!(tree.value_of("tech", &quotes).unwrap(), 1600.0);
    }

    #[test]
    fn value_of_unknown_path() {
        let tree = sample_tree();
        let quotes = prices(&[]);
        let err = tree.value_of("nope/xyz", &quotes).unwrap_err();
        assert!(matches!(err, TreeError::PathNotFound { .. }));
    }

    #[test]
    fn add_under_missing_parent_fails() {
        let mut tree = sample_tree();
        let err = tree
            .add_position("missing", Position::flat("XYZ"))
            .unwrap_err();
        assert!(matches!(err, TreeError::PathNotFound { .. }));
    }

    #[test]
    fn add_under_position_parent_fails() {
        let mut tree = sample_tree();
        let err = tree
            .add_position("tech/AAPL", Position::flat("XYZ"))
            .unwrap_err();
        assert!(matches!(err, TreeError::PathNotFound { .. }));
    }

    #[test]
    fn duplicate_child_rejected() {
        let mut tree = sample_tree();
        let err = tree
            .add_position("tech", Position::flat("AAPL"))
            .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateChild { .. }));

        let err = tree.add_group("", "tech", None).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateChild { .. }));
    }

    #[test]
    fn traverse_is_preorder() {
        let tree = sample_tree();
        let paths: Vec<String> = tree.traverse().map(|(path, _)| path).collect();
        assert_eq!(
            paths,
            vec![
                "tech",
                "tech/AAPL",
                "tech/MSFT",
                "income",
                "income/GOV10"
            ]
        );
    }

    #[test]
    fn traverse_is_restartable() {
        let tree = sample_tree();
        let first: Vec<String> = tree.traverse().map(|(path, _)| path).collect();
        let second: Vec<String> = tree.traverse().map(|(path, _)| path).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn weight_within_parent() {
        let tree = sample_tree();
        let quotes = prices(&[("AAPL", 100.0), ("MSFT", 100.0), ("GOV10", 0.0)]);
        // tech = 1000 + 500, income = 0, root = 1500
        assert_relative_eq!(tree.weight_of("", &quotes).unwrap(), 1.0);
        assert_relative_eq!(tree.weight_of("tech", &quotes).unwrap(), 1.0);
        assert_relative_eq!(tree.weight_of("tech/AAPL", &quotes).unwrap(), 1000.0 / 1500.0);
        assert_relative_eq!(tree.weight_of("income", &quotes).unwrap(), 0.0);
    }

    #[test]
    fn position_lookup_and_removal() {
        let mut tree = sample_tree();
        assert!(tree.position("MSFT").is_some());
        assert!(tree.position("XYZ").is_none());

        tree.position_mut("MSFT").unwrap().quantity = 7.0;
        assert_relative_eq!(tree.position("MSFT").unwrap().quantity, 7.0);

        let removed = tree.remove_position("MSFT").unwrap();
        assert_relative_eq!(removed.quantity, 7.0);
        assert!(tree.position("MSFT").is_none());
    }

    #[test]
    fn summary_counts() {
        let tree = sample_tree();
        let quotes = prices(&[("AAPL", 100.0), ("MSFT", 100.0), ("GOV10", 1.0)]);
        let summary = tree.summary(&quotes);
        assert_eq!(summary.positions, 3);
        assert_eq!(summary.symbols, 3);
        assert_relative_eq!(summary.total_value, 1000.0 + 500.0 + 100.0);
    }

    #[test]
    fn valuation_invariant_after_mutations() {
        let mut tree = sample_tree();
        let quotes = prices(&[("AAPL", 160.0), ("MSFT", 310.0), ("GOV10", 99.0), ("NVDA", 700.0)]);

        tree.add_group("tech", "growth", None).unwrap();
        tree.add_position("tech/growth", Position::new("NVDA", 2.0, 650.0))
            .unwrap();
        tree.position_mut("AAPL").unwrap().quantity = 20.0;

        let leaf_sum: f64 = tree
            .traverse()
            .filter_map(|(_, node)| match node {
                PortfolioNode::Position(pos) => {
                    Some(pos.market_value(*quotes.get(&pos.symbol).unwrap()))
                }
                _ => None,
            })
            .sum();
        assert_relative_eq!(tree.value_of("", &quotes).unwrap(), leaf_sum);
    }
}
