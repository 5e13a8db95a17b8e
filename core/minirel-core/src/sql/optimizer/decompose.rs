//! Predicate decomposition — splits the WHERE conjunction by the set of
//! relations each atom touches.

use crate::error::{MinirelError, MinirelResult};
use crate::sql::optimizer::RelationInfo;
use crate::sql::optimizer::union_find::Attribute;
use crate::sql::planner::{CompareOp, Expr};
use crate::types::ColumnRef;
use std::collections::{BTreeMap, BTreeSet};

/// WHERE atoms classified by how many relations they reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decomposition {
    /// Single-relation atoms, indexed by FROM position.
    pub selections: Vec<Vec<Expr>>,
    /// Two-relation atoms keyed by the ordered relation pair.
    pub join_edges: BTreeMap<(usize, usize), Vec<Expr>>,
    /// Atoms over three or more relations.
    pub residual: Vec<Expr>,
    /// Atoms with no column at all.
    pub constants: Vec<Expr>,
}

impl Decomposition {
    /// The AND of every edge between the two relations, in either order.
    pub fn join_edge(&self, a: usize, b: usize) -> Option<Expr> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.join_edges
            .get(&key)
            .and_then(|atoms| Expr::conjunction(atoms.clone()))
    }
}

/// Resolve a column to (relation, column). Qualified names must match an
/// alias; unqualified names bind to the first relation that has them.
pub fn resolve_attribute(relations: &[RelationInfo], column: &ColumnRef) -> MinirelResult<Attribute> {
    for (index, relation) in relations.iter().enumerate() {
        if let Some(table) = column.table.as_deref() {
            if table != relation.alias {
                continue;
            }
        }
        if let Some(position) = relation.header.find(Some(relation.alias.as_str()), &column.name) {
            return Ok(Attribute::new(index, position));
        }
    }
    Err(MinirelError::ColumnNotFound {
        column: column.to_string(),
        schema: relations
            .iter()
            .map(|r| r.header.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Rewrite every column reference to its alias-qualified form, collecting
/// the relations touched.
fn qualify(
    expr: &Expr,
    relations: &[RelationInfo],
    touched: &mut BTreeSet<usize>,
) -> MinirelResult<Expr> {
    let pair = |l: &Expr, r: &Expr, touched: &mut BTreeSet<usize>| -> MinirelResult<(Box<Expr>, Box<Expr>)> {
        Ok((
            Box::new(qualify(l, relations, touched)?),
            Box::new(qualify(r, relations, touched)?),
        ))
    };
    Ok(match expr {
        Expr::Column(column) => {
            let attr = resolve_attribute(relations, column)?;
            touched.insert(attr.relation);
            Expr::Column(ColumnRef::new(relations[attr.relation].alias.clone(), column.name.clone()))
        }
        Expr::Constant(value) => Expr::Constant(*value),
        Expr::Add(l, r) => {
            let (l, r) = pair(l, r, touched)?;
            Expr::Add(l, r)
        }
        Expr::Sub(l, r) => {
            let (l, r) = pair(l, r, touched)?;
            Expr::Sub(l, r)
        }
        Expr::Mul(l, r) => {
            let (l, r) = pair(l, r, touched)?;
            Expr::Mul(l, r)
        }
        Expr::Div(l, r) => {
            let (l, r) = pair(l, r, touched)?;
            Expr::Div(l, r)
        }
        Expr::And(l, r) => {
            let (l, r) = pair(l, r, touched)?;
            Expr::And(l, r)
        }
        Expr::Or(l, r) => {
            let (l, r) = pair(l, r, touched)?;
            Expr::Or(l, r)
        }
        Expr::Compare { op, left, right } => {
            let (left, right) = pair(left, right, touched)?;
            Expr::Compare {
                op: *op,
                left,
                right,
            }
        }
    })
}

/// Split `predicate` into selections, join edges, residual and constant atoms.
pub fn decompose(predicate: Option<&Expr>, relations: &[RelationInfo]) -> MinirelResult<Decomposition> {
    let mut result = Decomposition {
        selections: vec![Vec::new(); relations.len()],
        ..Default::default()
    };
    let Some(predicate) = predicate else {
        return Ok(result);
    };
    for atom in predicate.conjuncts() {
        let mut touched = BTreeSet::new();
        let qualified = qualify(atom, relations, &mut touched)?;
        let tables: Vec<usize> = touched.into_iter().collect();
        match tables.as_slice() {
            [] => result.constants.push(qualified),
            [only] => result.selections[*only].push(qualified),
            [a, b] => result.join_edges.entry((*a, *b)).or_default().push(qualified),
            _ => result.residual.push(qualified),
        }
    }
    Ok(result)
}

/// `column <op> constant`, with constant-on-the-left comparisons mirrored.
pub fn as_column_bound(expr: &Expr) -> Option<(&ColumnRef, CompareOp, i64)> {
    match expr {
        Expr::Compare { op, left, right } => match (left.as_ref(), right.as_ref()) {
            (Expr::Column(column), Expr::Constant(value)) => Some((column, *op, *value)),
            (Expr::Constant(value), Expr::Column(column)) => Some((column, op.flip(), *value)),
            _ => None,
        },
        _ => None,
    }
}

/// `column = column`.
pub fn as_column_equality(expr: &Expr) -> Option<(&ColumnRef, &ColumnRef)> {
    match expr {
        Expr::Compare {
            op: CompareOp::Eq,
            left,
            right,
        } => match (left.as_ref(), right.as_ref()) {
            (Expr::Column(l), Expr::Column(r)) => Some((l, r)),
            _ => None,
        },
        _ => None,
    }
}
