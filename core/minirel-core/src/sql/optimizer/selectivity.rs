//! Cardinality estimation — V-values, reduction factors and join sizes.
//!
//! A relation's estimate is its row count after selections plus one
//! V-value (distinct-value count) per attribute. Joins use the containment
//! assumption: for every union-find group shared by both sides the product
//! is divided by the larger of the two V-values.

use crate::sql::optimizer::RelationInfo;
use crate::sql::optimizer::union_find::{Attribute, Bounds, UnionFind};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// Inclusive value range observed for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: i32,
    pub max: i32,
}

impl ColumnRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Number of integers in the range.
    pub fn width(&self) -> f64 {
        (self.max as f64 - self.min as f64 + 1.0).max(0.0)
    }
}

/// Estimated size and V-values of a (partial) plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Estimate {
    pub rows: f64,
    pub v_values: AHashMap<Attribute, f64>,
}

impl Estimate {
    pub fn v_value(&self, attr: Attribute) -> Option<f64> {
        self.v_values.get(&attr).copied()
    }
}

/// Distinct values of a base column: `min(max - min + 1, rows)`.
pub fn base_v_value(range: ColumnRange, rows: f64) -> f64 {
    range.width().min(rows)
}

/// Bounds intersected with the column's observed range, as `(lo, hi)`.
fn clamp_to_range(bounds: Bounds, range: ColumnRange) -> (f64, f64) {
    let lo = bounds
        .lower
        .map_or(range.min as f64, |l| (l as f64).max(range.min as f64));
    let hi = bounds
        .upper
        .map_or(range.max as f64, |u| (u as f64).min(range.max as f64));
    (lo, hi)
}

/// Fraction of a column's value range that survives `bounds`.
pub fn reduction_factor(bounds: Bounds, range: ColumnRange) -> f64 {
    let width = range.width();
    if bounds.is_unbounded() || width == 0.0 {
        return 1.0;
    }
    let (lo, hi) = clamp_to_range(bounds, range);
    ((hi - lo + 1.0).max(0.0) / width).clamp(0.0, 1.0)
}

/// V-value of a bounded column: `max(hi - lo + 1, 1)`, never above `previous`.
pub fn tightened_v_value(bounds: Bounds, range: ColumnRange, previous: f64) -> f64 {
    if bounds.is_unbounded() {
        return previous;
    }
    let (lo, hi) = clamp_to_range(bounds, range);
    (hi - lo + 1.0).max(1.0).min(previous)
}

/// Size and V-values of relation `index` after its selections.
pub fn selection_estimate(index: usize, relation: &RelationInfo, uf: &mut UnionFind) -> Estimate {
    let base_rows = relation.stats.rows as f64;
    let mut rows = base_rows;
    let mut v_values = AHashMap::new();
    for column in 0..relation.header.len() {
        let attr = Attribute::new(index, column);
        let v = match relation.stats.column(column) {
            Some(range) => {
                let bounds = uf.bounds(attr);
                rows *= reduction_factor(bounds, range);
                tightened_v_value(bounds, range, base_v_value(range, base_rows))
            }
            None => base_rows,
        };
        v_values.insert(attr, v);
    }
    for v in v_values.values_mut() {
        *v = v.min(rows).max(1.0);
    }
    Estimate { rows, v_values }
}

fn root_of(roots: &AHashMap<Attribute, Attribute>, attr: Attribute) -> Attribute {
    roots.get(&attr).copied().unwrap_or(attr)
}

/// Smallest V-value per union-find group on one side of a join.
fn group_minimums(
    estimate: &Estimate,
    roots: &AHashMap<Attribute, Attribute>,
) -> AHashMap<Attribute, f64> {
    let mut groups: AHashMap<Attribute, f64> = AHashMap::new();
    for (&attr, &v) in &estimate.v_values {
        let entry = groups.entry(root_of(roots, attr)).or_insert(v);
        *entry = entry.min(v);
    }
    groups
}

/// Estimate of `left ⋈ right`, given the group root of every attribute.
pub fn join_estimate(
    left: &Estimate,
    right: &Estimate,
    roots: &AHashMap<Attribute, Attribute>,
) -> Estimate {
    let left_groups = group_minimums(left, roots);
    let right_groups = group_minimums(right, roots);

    let mut denominator = 1.0_f64;
    let mut joined: AHashMap<Attribute, f64> = AHashMap::new();
    for (root, &vl) in &left_groups {
        if let Some(&vr) = right_groups.get(root) {
            denominator *= vl.max(vr).max(1.0);
            joined.insert(*root, vl.min(vr));
        }
    }
    let rows = left.rows * right.rows / denominator;

    let shared: AHashSet<Attribute> = joined.keys().copied().collect();
    let mut v_values = AHashMap::with_capacity(left.v_values.len() + right.v_values.len());
    for (&attr, &v) in left.v_values.iter().chain(right.v_values.iter()) {
        let root = root_of(roots, attr);
        let v = if shared.contains(&root) {
            joined[&root]
        } else {
            v
        };
        v_values.insert(attr, v.min(rows).max(1.0));
    }
    Estimate { rows, v_values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::optimizer::tests::relation_with_ranges;
    use crate::sql::planner::CompareOp;

    fn bounds(lower: Option<i64>, upper: Option<i64>) -> Bounds {
        Bounds { lower, upper }
    }

    #[test]
    fn test_base_v_value_capped_by_rows() {
        assert_eq!(base_v_value(ColumnRange::new(1, 100), 10.0), 10.0);
        assert_eq!(base_v_value(ColumnRange::new(1, 5), 10.0), 5.0);
    }

    #[test]
    fn test_reduction_factor() {
        let range = ColumnRange::new(1, 100);
        assert_eq!(reduction_factor(Bounds::default(), range), 1.0);
        assert_eq!(reduction_factor(bounds(Some(51), None), range), 0.5);
        assert_eq!(reduction_factor(bounds(Some(10), Some(10)), range), 0.01);
        // bounds outside the observed range select nothing
        assert_eq!(reduction_factor(bounds(Some(200), None), range), 0.0);
        // bounds wider than the range select everything
        assert_eq!(reduction_factor(bounds(Some(-50), Some(500)), range), 1.0);
    }

    #[test]
    fn test_tightened_v_value_never_grows() {
        let range = ColumnRange::new(1, 100);
        assert_eq!(tightened_v_value(bounds(Some(1), Some(20)), range, 50.0), 20.0);
        assert_eq!(tightened_v_value(bounds(Some(1), Some(80)), range, 50.0), 50.0);
        assert_eq!(tightened_v_value(bounds(Some(7), Some(7)), range, 50.0), 1.0);
        assert_eq!(tightened_v_value(bounds(Some(300), None), range, 50.0), 1.0);
    }

    #[test]
    fn test_selection_estimate() {
        let rel = relation_with_ranges("R", &[("A", 1, 100), ("B", 1, 10)], 1000);
        let mut uf = UnionFind::new();
        uf.constrain(Attribute::new(0, 0), CompareOp::LtEq, 50);
        let est = selection_estimate(0, &rel, &mut uf);
        assert_eq!(est.rows, 500.0);
        assert_eq!(est.v_value(Attribute::new(0, 0)), Some(50.0));
        assert_eq!(est.v_value(Attribute::new(0, 1)), Some(10.0));
    }

    #[test]
    fn test_equi_join_divides_by_larger_v_value() {
        let r = relation_with_ranges("R", &[("A", 1, 100)], 1000);
        let s = relation_with_ranges("S", &[("B", 1, 20)], 200);
        let mut uf = UnionFind::new();
        uf.union(Attribute::new(0, 0), Attribute::new(1, 0));
        let roots = uf.roots();
        let left = selection_estimate(0, &r, &mut uf);
        let right = selection_estimate(1, &s, &mut uf);
        let joined = join_estimate(&left, &right, &roots);
        assert_eq!(joined.rows, 1000.0 * 200.0 / 100.0);
        assert_eq!(joined.v_value(Attribute::new(0, 0)), Some(20.0));
        assert_eq!(joined.v_value(Attribute::new(1, 0)), Some(20.0));
    }

    #[test]
    fn test_cross_product_keeps_v_values() {
        let r = relation_with_ranges("R", &[("A", 1, 100)], 100);
        let s = relation_with_ranges("S", &[("B", 1, 5)], 5);
        let mut uf = UnionFind::new();
        let left = selection_estimate(0, &r, &mut uf);
        let right = selection_estimate(1, &s, &mut uf);
        let joined = join_estimate(&left, &right, &uf.roots());
        assert_eq!(joined.rows, 500.0);
        assert_eq!(joined.v_value(Attribute::new(0, 0)), Some(100.0));
        assert_eq!(joined.v_value(Attribute::new(1, 0)), Some(5.0));
    }
}
