//! SQL 쿼리 옵티마이저 — 비용 기반 조인 순서 및 접근 경로 선택
//!
//! Works on the flattened form of a query: the FROM relations with their
//! statistics and the WHERE conjunction. The pipeline is
//!
//! 1. [`decompose`] the WHERE into selections, join edges and constants;
//! 2. feed equi-join edges and constant bounds into a [`UnionFind`];
//! 3. estimate every relation after its selections ([`selectivity`]);
//! 4. pick an access path per relation ([`access_path`]);
//! 5. search left-deep join orders ([`join_order`]).

pub mod access_path;
pub mod decompose;
pub mod join_order;
pub mod selectivity;
pub mod union_find;


use crate::error::MinirelResult;
use crate::sql::planner::Expr;
use crate::types::Header;
use std::path::PathBuf;
use tracing::{debug, info};

pub use access_path::{AccessChoice, AccessPath, choose_access_path};
pub use decompose::{Decomposition, as_column_bound, as_column_equality, decompose, resolve_attribute};
pub use join_order::{JoinPlan, best_left_deep};
pub use selectivity::{ColumnRange, Estimate};
pub use union_find::{Attribute, Bounds, UnionFind};

/// Statistics of a base relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationStats {
    pub rows: u64,
    pub pages: u64,
    /// Observed range per column; `None` when unknown.
    pub columns: Vec<Option<ColumnRange>>,
}

impl RelationStats {
    pub fn column(&self, index: usize) -> Option<ColumnRange> {
        self.columns.get(index).copied().flatten()
    }
}

/// An index available on a base relation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub column: String,
    pub clustered: bool,
    pub order: usize,
    pub path: PathBuf,
    pub leaf_count: u64,
}

/// One FROM-clause relation as the optimizer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationInfo {
    pub alias: String,
    pub table: String,
    pub path: PathBuf,
    /// Columns qualified by `alias`.
    pub header: Header,
    pub stats: RelationStats,
    pub indexes: Vec<IndexInfo>,
}

/// 최적화 결과 — 조인 순서, 접근 경로, 분해된 조건
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedQuery {
    pub decomposition: Decomposition,
    /// FROM positions, outermost first.
    pub join_order: Vec<usize>,
    /// Indexed by FROM position.
    pub access_paths: Vec<AccessPath>,
    /// Union-find groups with two or more attributes.
    pub equivalences: Vec<Vec<Attribute>>,
    pub estimated_cost: f64,
    pub estimated_rows: f64,
}

/// 쿼리 옵티마이저
#[derive(Debug, Clone)]
pub struct QueryOptimizer {
    use_indexes: bool,
}

impl QueryOptimizer {
    pub fn new() -> Self {
        Self { use_indexes: true }
    }

    /// Allow or forbid index access paths.
    pub fn with_indexes(mut self, use_indexes: bool) -> Self {
        self.use_indexes = use_indexes;
        self
    }

    /// Feed join equalities and constant bounds into a fresh union-find.
    pub fn build_constraints(
        relations: &[RelationInfo],
        decomposition: &Decomposition,
    ) -> MinirelResult<UnionFind> {
        let mut uf = UnionFind::new();
        for atoms in decomposition.join_edges.values() {
            for atom in atoms {
                if let Some((left, right)) = as_column_equality(atom) {
                    uf.union(
                        resolve_attribute(relations, left)?,
                        resolve_attribute(relations, right)?,
                    );
                }
            }
        }
        for atoms in &decomposition.selections {
            for atom in atoms {
                if let Some((column, op, value)) = as_column_bound(atom) {
                    uf.constrain(resolve_attribute(relations, column)?, op, value);
                }
            }
        }
        Ok(uf)
    }

    /// Choose a join order and access paths for `relations` under `predicate`.
    pub fn optimize(
        &self,
        relations: &[RelationInfo],
        predicate: Option<&Expr>,
    ) -> MinirelResult<OptimizedQuery> {
        let decomposition = decompose(predicate, relations)?;
        let mut uf = Self::build_constraints(relations, &decomposition)?;

        let mut estimates = Vec::with_capacity(relations.len());
        let mut access_paths = Vec::with_capacity(relations.len());
        for (position, relation) in relations.iter().enumerate() {
            let estimate = selectivity::selection_estimate(position, relation, &mut uf);
            let choice = choose_access_path(position, relation, &mut uf, self.use_indexes);
            debug!(
                alias = %relation.alias,
                rows = estimate.rows,
                access_cost = choice.cost,
                index = choice.path.is_index(),
                "relation estimate"
            );
            estimates.push(estimate);
            access_paths.push(choice.path);
        }

        let roots = uf.roots();
        let (join_order, estimated_cost, estimated_rows) = match best_left_deep(&estimates, &roots) {
            Some(plan) => (plan.order, plan.cost, plan.estimate.rows),
            None => (Vec::new(), 0.0, 0.0),
        };
        let equivalences = uf
            .groups()
            .into_iter()
            .filter(|group| group.len() > 1)
            .collect();
        info!(
            order = ?join_order
                .iter()
                .map(|&i| relations[i].alias.as_str())
                .collect::<Vec<_>>(),
            cost = estimated_cost,
            rows = estimated_rows,
            "optimizer chose join order"
        );
        Ok(OptimizedQuery {
            decomposition,
            join_order,
            access_paths,
            equivalences,
            estimated_cost,
            estimated_rows,
        })
    }
}

impl Default for QueryOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
