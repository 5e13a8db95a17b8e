//! Bound expressions and their evaluation.

use crate::error::{MinirelError, MinirelResult};
use crate::sql::planner::CompareOp;
use crate::types::Tuple;

/// 물리 표현식 — 컬럼이 튜플 위치로 바인딩된 표현식
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicalExpr {
    Column(usize),
    Constant(i64),
    Add(Box<PhysicalExpr>, Box<PhysicalExpr>),
    Sub(Box<PhysicalExpr>, Box<PhysicalExpr>),
    Mul(Box<PhysicalExpr>, Box<PhysicalExpr>),
    Div(Box<PhysicalExpr>, Box<PhysicalExpr>),
    And(Box<PhysicalExpr>, Box<PhysicalExpr>),
    Or(Box<PhysicalExpr>, Box<PhysicalExpr>),
    Compare {
        op: CompareOp,
        left: Box<PhysicalExpr>,
        right: Box<PhysicalExpr>,
    },
}

/// Evaluate an expression against one tuple. Booleans are 1 / 0.
///
/// Arithmetic is carried out in `i64` so sums of two `i32` columns cannot
/// overflow; `AND`/`OR` short-circuit.
pub fn evaluate_expr(expr: &PhysicalExpr, tuple: &Tuple) -> MinirelResult<i64> {
    Ok(match expr {
        PhysicalExpr::Column(index) => i64::from(tuple.get(*index)),
        PhysicalExpr::Constant(value) => *value,
        PhysicalExpr::Add(l, r) => {
            evaluate_expr(l, tuple)?.wrapping_add(evaluate_expr(r, tuple)?)
        }
        PhysicalExpr::Sub(l, r) => {
            evaluate_expr(l, tuple)?.wrapping_sub(evaluate_expr(r, tuple)?)
        }
        PhysicalExpr::Mul(l, r) => {
            evaluate_expr(l, tuple)?.wrapping_mul(evaluate_expr(r, tuple)?)
        }
        PhysicalExpr::Div(l, r) => {
            let divisor = evaluate_expr(r, tuple)?;
            if divisor == 0 {
                return Err(MinirelError::Evaluation(format!(
                    "division by zero evaluating {:?} on ({})",
                    expr, tuple
                )));
            }
            evaluate_expr(l, tuple)?.wrapping_div(divisor)
        }
        PhysicalExpr::And(l, r) => {
            i64::from(evaluate_expr(l, tuple)? != 0 && evaluate_expr(r, tuple)? != 0)
        }
        PhysicalExpr::Or(l, r) => {
            i64::from(evaluate_expr(l, tuple)? != 0 || evaluate_expr(r, tuple)? != 0)
        }
        PhysicalExpr::Compare { op, left, right } => {
            i64::from(op.test(evaluate_expr(left, tuple)?, evaluate_expr(right, tuple)?))
        }
    })
}

/// Evaluate a predicate; any non-zero value is true.
pub fn evaluate_predicate(expr: &PhysicalExpr, tuple: &Tuple) -> MinirelResult<bool> {
    Ok(evaluate_expr(expr, tuple)? != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(i: usize) -> Box<PhysicalExpr> {
        Box::new(PhysicalExpr::Column(i))
    }

    fn lit(v: i64) -> Box<PhysicalExpr> {
        Box::new(PhysicalExpr::Constant(v))
    }

    #[test]
    fn test_arithmetic() {
        let t = Tuple::new(vec![6, 3]);
        let expr = PhysicalExpr::Sub(
            Box::new(PhysicalExpr::Mul(col(0), col(1))),
            Box::new(PhysicalExpr::Div(col(0), col(1))),
        );
        assert_eq!(evaluate_expr(&expr, &t).unwrap(), 16);
    }

    #[test]
    fn test_no_i32_overflow() {
        let t = Tuple::new(vec![i32::MAX, i32::MAX]);
        let expr = PhysicalExpr::Add(col(0), col(1));
        assert_eq!(evaluate_expr(&expr, &t).unwrap(), 2 * i64::from(i32::MAX));
    }

    #[test]
    fn test_division_by_zero_is_error() {
        let t = Tuple::new(vec![1, 0]);
        let expr = PhysicalExpr::Div(col(0), col(1));
        assert!(matches!(
            evaluate_expr(&expr, &t),
            Err(MinirelError::Evaluation(_))
        ));
    }

    #[test]
    fn test_comparisons_and_logic() {
        let t = Tuple::new(vec![4, 100, 50]);
        let b_is_100 = PhysicalExpr::Compare {
            op: CompareOp::Eq,
            left: col(1),
            right: lit(100),
        };
        let c_gt_60 = PhysicalExpr::Compare {
            op: CompareOp::Gt,
            left: col(2),
            right: lit(60),
        };
        let and = PhysicalExpr::And(Box::new(b_is_100.clone()), Box::new(c_gt_60.clone()));
        let or = PhysicalExpr::Or(Box::new(b_is_100), Box::new(c_gt_60));
        assert!(!evaluate_predicate(&and, &t).unwrap());
        assert!(evaluate_predicate(&or, &t).unwrap());
    }

    #[test]
    fn test_and_short_circuits() {
        // right side would divide by zero
        let t = Tuple::new(vec![0]);
        let expr = PhysicalExpr::And(
            Box::new(PhysicalExpr::Compare {
                op: CompareOp::NotEq,
                left: col(0),
                right: lit(0),
            }),
            Box::new(PhysicalExpr::Div(lit(1), col(0))),
        );
        assert!(!evaluate_predicate(&expr, &t).unwrap());
    }
}
