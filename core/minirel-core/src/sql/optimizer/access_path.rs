//! Access-path selection — full scan versus B+-Tree index scan.
//!
//! Costs are in page reads. A full scan reads every page. A clustered index
//! pays the three-level descent plus the qualifying fraction of the data
//! pages; an unclustered one pays the qualifying fraction of the leaves
//! plus one page per qualifying row.

use crate::index::KeyRange;
use crate::sql::optimizer::union_find::{Attribute, Bounds, UnionFind};
use crate::sql::optimizer::{IndexInfo, RelationInfo};
use crate::sql::optimizer::selectivity::reduction_factor;
use tracing::debug;

/// Pages read to reach the leaf level of an index.
pub const INDEX_DESCENT_COST: f64 = 3.0;

/// How a base relation is read.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessPath {
    Scan,
    Index {
        index: IndexInfo,
        /// Key column position in the relation header.
        column: usize,
        range: KeyRange,
    },
}

impl AccessPath {
    pub fn is_index(&self) -> bool {
        matches!(self, AccessPath::Index { .. })
    }
}

/// An access path with its estimated cost.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessChoice {
    pub path: AccessPath,
    pub cost: f64,
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Index key range implied by a group's bounds.
pub fn key_range(bounds: Bounds) -> KeyRange {
    KeyRange::new(bounds.lower.map(clamp_i32), bounds.upper.map(clamp_i32))
}

/// Estimated page reads for an index scan with reduction factor `r`.
pub fn index_cost(index: &IndexInfo, relation: &RelationInfo, r: f64) -> f64 {
    if index.clustered {
        INDEX_DESCENT_COST + relation.stats.pages as f64 * r
    } else {
        INDEX_DESCENT_COST + index.leaf_count as f64 * r + relation.stats.rows as f64 * r
    }
}

/// Cheapest way to read relation `position`; a full scan unless an index on
/// a bounded attribute is strictly cheaper.
pub fn choose_access_path(
    position: usize,
    relation: &RelationInfo,
    uf: &mut UnionFind,
    use_indexes: bool,
) -> AccessChoice {
    let mut best = AccessChoice {
        path: AccessPath::Scan,
        cost: relation.stats.pages as f64,
    };
    if !use_indexes {
        return best;
    }
    for index in &relation.indexes {
        let Some(column) = relation
            .header
            .find(Some(relation.alias.as_str()), &index.column)
        else {
            continue;
        };
        let bounds = uf.bounds(Attribute::new(position, column));
        if bounds.is_unbounded() {
            continue;
        }
        let r = relation
            .stats
            .column(column)
            .map_or(1.0, |range| reduction_factor(bounds, range));
        let cost = index_cost(index, relation, r);
        debug!(
            table = %relation.table,
            column = %index.column,
            clustered = index.clustered,
            reduction = r,
            cost,
            scan_cost = relation.stats.pages,
            "costed index"
        );
        if cost < best.cost {
            best = AccessChoice {
                path: AccessPath::Index {
                    index: index.clone(),
                    column,
                    range: key_range(bounds),
                },
                cost,
            };
        }
    }
    best
}
