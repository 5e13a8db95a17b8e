//! Join ordering — exhaustive search over left-deep plans.
//!
//! A plan of one or two relations costs nothing; appending relation R to a
//! plan P costs `cost(P) + |P|`, the size of the intermediate result that
//! has to be produced. For the first pair the smaller relation is the outer.

use crate::sql::optimizer::selectivity::{Estimate, join_estimate};
use crate::sql::optimizer::union_find::Attribute;
use ahash::AHashMap;
use std::cmp::Ordering;

/// 좌측 깊이 조인 플랜 — 순서, 누적 비용, 결과 추정치
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    /// FROM positions, outermost first.
    pub order: Vec<usize>,
    pub cost: f64,
    pub estimate: Estimate,
}

impl JoinPlan {
    fn single(index: usize, estimate: Estimate) -> Self {
        Self {
            order: vec![index],
            cost: 0.0,
            estimate,
        }
    }

    /// A new plan with `index` appended; `self` is left untouched.
    fn extend(&self, index: usize, inner: &Estimate, roots: &AHashMap<Attribute, Attribute>) -> Self {
        let cost = if self.order.len() >= 2 {
            self.cost + self.estimate.rows
        } else {
            0.0
        };
        let mut order = self.order.clone();
        order.push(index);
        Self {
            order,
            cost,
            estimate: join_estimate(&self.estimate, inner, roots),
        }
    }
}

/// Smaller relation first; ties go to the lower FROM position.
fn outer_first(bases: &[Estimate], a: usize, b: usize) -> bool {
    match bases[a].rows.total_cmp(&bases[b].rows) {
        Ordering::Less => true,
        Ordering::Equal => a < b,
        Ordering::Greater => false,
    }
}

fn search(
    plan: JoinPlan,
    remaining: &[usize],
    bases: &[Estimate],
    roots: &AHashMap<Attribute, Attribute>,
    best: &mut Option<JoinPlan>,
) {
    if remaining.is_empty() {
        let better = best.as_ref().is_none_or(|b| plan.cost < b.cost);
        if better {
            *best = Some(plan);
        }
        return;
    }
    for (i, &next) in remaining.iter().enumerate() {
        if plan.order.len() == 1 && !outer_first(bases, plan.order[0], next) {
            continue;
        }
        let candidate = plan.extend(next, &bases[next], roots);
        if let Some(b) = best.as_ref() {
            // costs only grow, so a plan already worse cannot recover
            if candidate.cost >= b.cost {
                continue;
            }
        }
        let rest: Vec<usize> = remaining
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &r)| r)
            .collect();
        search(candidate, &rest, bases, roots, best);
    }
}

/// Cheapest left-deep order over `bases` (one estimate per FROM relation).
pub fn best_left_deep(
    bases: &[Estimate],
    roots: &AHashMap<Attribute, Attribute>,
) -> Option<JoinPlan> {
    let mut best = None;
    let all: Vec<usize> = (0..bases.len()).collect();
    for &first in &all {
        let rest: Vec<usize> = all.iter().copied().filter(|&r| r != first).collect();
        search(
            JoinPlan::single(first, bases[first].clone()),
            &rest,
            bases,
            roots,
            &mut best,
        );
    }
    best
}
