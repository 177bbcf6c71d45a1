//! Expression AST for formula analysis
//!
//! Formulas are infix arithmetic over named parameters. The tree is only
//! ever inspected for the names it references; nothing here evaluates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// CORE AST TYPES
// =============================================================================

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// Unary sign operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Pos,
}

/// A parsed arithmetic expression
///
/// Numeric literals keep their source text; values are never computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(String),
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Every identifier referenced in the tree, sorted and deduplicated
    pub fn identifiers(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        self.collect_identifiers(&mut names);
        names.into_iter().collect()
    }

    fn collect_identifiers(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Identifier(name) => {
                names.insert(name.clone());
            }
            Expr::Unary { operand, .. } => operand.collect_identifiers(names),
            Expr::Binary { left, right, .. } => {
                left.collect_identifiers(names);
                right.collect_identifiers(names);
            }
        }
    }
}
