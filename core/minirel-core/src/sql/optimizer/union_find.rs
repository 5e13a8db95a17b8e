//! Union-find over attributes with per-group value bounds.
//!
//! Equi-join predicates merge the groups of their two attributes; constant
//! comparisons tighten the `[lower, upper]` bound of the attribute's group.
//! Every member of a group observes the same bounds.

use crate::sql::planner::CompareOp;
use ahash::AHashMap;
use std::fmt;

/// A column of one FROM-clause relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Attribute {
    /// Position of the relation in the FROM clause.
    pub relation: usize,
    /// Column position within that relation's header.
    pub column: usize,
}

impl Attribute {
    pub fn new(relation: usize, column: usize) -> Self {
        Self { relation, column }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}.c{}", self.relation, self.column)
    }
}

/// Inclusive bounds; `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl Bounds {
    fn merge(self, other: Bounds) -> Bounds {
        Bounds {
            lower: max_opt(self.lower, other.lower),
            upper: min_opt(self.upper, other.upper),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

fn max_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn min_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// 속성 유니온-파인드 — 동치 그룹과 그룹별 [최소, 최대] 경계
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parent: AHashMap<Attribute, Attribute>,
    /// Bounds, keyed by group root.
    bounds: AHashMap<Attribute, Bounds>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of `attr`'s group; unseen attributes form singleton groups.
    pub fn find(&mut self, attr: Attribute) -> Attribute {
        let parent = *self.parent.entry(attr).or_insert(attr);
        if parent == attr {
            return attr;
        }
        let root = self.find(parent);
        self.parent.insert(attr, root);
        root
    }

    /// Merge the groups of `a` and `b`, intersecting their bounds.
    pub fn union(&mut self, a: Attribute, b: Attribute) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        // smaller attribute becomes the root so results are deterministic
        let (root, child) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        let merged = self.group_bounds(root).merge(self.group_bounds(child));
        self.parent.insert(child, root);
        self.bounds.remove(&child);
        self.bounds.insert(root, merged);
    }

    fn group_bounds(&self, root: Attribute) -> Bounds {
        self.bounds.get(&root).copied().unwrap_or_default()
    }

    pub fn same_group(&mut self, a: Attribute, b: Attribute) -> bool {
        self.find(a) == self.find(b)
    }

    pub fn bounds(&mut self, attr: Attribute) -> Bounds {
        let root = self.find(attr);
        self.group_bounds(root)
    }

    pub fn lower(&mut self, attr: Attribute) -> Option<i64> {
        self.bounds(attr).lower
    }

    pub fn upper(&mut self, attr: Attribute) -> Option<i64> {
        self.bounds(attr).upper
    }

    /// The single value the group is pinned to, if lower == upper.
    pub fn equals(&mut self, attr: Attribute) -> Option<i64> {
        match self.bounds(attr) {
            Bounds {
                lower: Some(lo),
                upper: Some(hi),
            } if lo == hi => Some(lo),
            _ => None,
        }
    }

    /// Raise the group's lower bound to at least `value`.
    pub fn set_lower(&mut self, attr: Attribute, value: i64) {
        let root = self.find(attr);
        let bounds = self.bounds.entry(root).or_default();
        bounds.lower = max_opt(bounds.lower, Some(value));
    }

    /// Lower the group's upper bound to at most `value`.
    pub fn set_upper(&mut self, attr: Attribute, value: i64) {
        let root = self.find(attr);
        let bounds = self.bounds.entry(root).or_default();
        bounds.upper = min_opt(bounds.upper, Some(value));
    }

    /// Apply `attr <op> value`. Strict comparisons shift by one since all
    /// values are integers; `<>` carries no bound.
    pub fn constrain(&mut self, attr: Attribute, op: CompareOp, value: i64) {
        match op {
            CompareOp::Eq => {
                self.set_lower(attr, value);
                self.set_upper(attr, value);
            }
            CompareOp::Lt => self.set_upper(attr, value.saturating_sub(1)),
            CompareOp::LtEq => self.set_upper(attr, value),
            CompareOp::Gt => self.set_lower(attr, value.saturating_add(1)),
            CompareOp::GtEq => self.set_lower(attr, value),
            CompareOp::NotEq => {}
        }
    }

    /// Root of every attribute seen so far.
    pub fn roots(&mut self) -> AHashMap<Attribute, Attribute> {
        let attrs: Vec<Attribute> = self.parent.keys().copied().collect();
        attrs.into_iter().map(|attr| (attr, self.find(attr))).collect()
    }

    /// Every attribute seen so far grouped by root, each group sorted.
    pub fn groups(&mut self) -> Vec<Vec<Attribute>> {
        let attrs: Vec<Attribute> = self.parent.keys().copied().collect();
        let mut by_root: AHashMap<Attribute, Vec<Attribute>> = AHashMap::new();
        for attr in attrs {
            let root = self.find(attr);
            by_root.entry(root).or_default().push(attr);
        }
        let mut groups: Vec<Vec<Attribute>> = by_root.into_values().collect();
        for group in &mut groups {
            group.sort();
        }
        groups.sort();
        groups
    }
}
