//! SQL 플래너 타입 정의
//!
//! LogicalPlan and the expression tree shared by the optimizer and the
//! physical planner. Expressions are a closed enum evaluated by a single
//! recursive function once bound to a header (see `sql::executor::expr`).

use crate::error::MinirelResult;
use crate::sql::executor::expr::PhysicalExpr;
use crate::types::{ColumnRef, Header};
use std::fmt;

/// 논리 플랜 — 최적화 전 요청된 연산 트리
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    /// 테이블 스캔 (`alias` defaults to the table name)
    Scan { table: String, alias: String },
    /// WHERE 조건 필터
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },
    /// JOIN (inner only; `on` is folded into the WHERE conjunction)
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        on: Option<Expr>,
    },
    /// 컬럼 선택 (empty = all columns)
    Project {
        input: Box<LogicalPlan>,
        columns: Vec<ColumnRef>,
    },
    /// ORDER BY
    Sort {
        input: Box<LogicalPlan>,
        order_by: Vec<ColumnRef>,
    },
    /// SELECT DISTINCT
    Distinct { input: Box<LogicalPlan> },
}

impl LogicalPlan {
    pub fn scan(table: &str) -> Self {
        LogicalPlan::Scan {
            table: table.to_string(),
            alias: table.to_string(),
        }
    }

    pub fn scan_as(table: &str, alias: &str) -> Self {
        LogicalPlan::Scan {
            table: table.to_string(),
            alias: alias.to_string(),
        }
    }

    pub fn join(self, right: LogicalPlan, on: Option<Expr>) -> Self {
        LogicalPlan::Join {
            left: Box::new(self),
            right: Box::new(right),
            on,
        }
    }

    pub fn filter(self, predicate: Expr) -> Self {
        LogicalPlan::Filter {
            input: Box::new(self),
            predicate,
        }
    }

    pub fn project(self, columns: Vec<ColumnRef>) -> Self {
        LogicalPlan::Project {
            input: Box::new(self),
            columns,
        }
    }

    pub fn sort(self, order_by: Vec<ColumnRef>) -> Self {
        LogicalPlan::Sort {
            input: Box::new(self),
            order_by,
        }
    }

    pub fn distinct(self) -> Self {
        LogicalPlan::Distinct {
            input: Box::new(self),
        }
    }
}

/// 비교 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    /// Operator that gives the same result with the operands swapped.
    pub fn flip(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::NotEq => CompareOp::NotEq,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::LtEq => CompareOp::GtEq,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::GtEq => CompareOp::LtEq,
        }
    }

    pub fn test(self, left: i64, right: i64) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::NotEq => left != right,
            CompareOp::Lt => left < right,
            CompareOp::LtEq => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::GtEq => left >= right,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// 표현식 — 컬럼, 상수, 산술, 논리, 비교
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Column(ColumnRef),
    Constant(i64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn col(table: &str, name: &str) -> Self {
        Expr::Column(ColumnRef::new(table, name))
    }

    pub fn constant(value: i64) -> Self {
        Expr::Constant(value)
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::compare(CompareOp::Eq, left, right)
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    /// AND together a list of predicates; `None` for an empty list.
    pub fn conjunction(predicates: Vec<Expr>) -> Option<Expr> {
        predicates.into_iter().reduce(Expr::and)
    }

    /// Split top-level ANDs into their atoms.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Expr::And(left, right) => {
                left.collect_conjuncts(out);
                right.collect_conjuncts(out);
            }
            other => out.push(other),
        }
    }

    /// Every column reference in the expression, left to right.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Expr::Column(column) => out.push(column),
            Expr::Constant(_) => {}
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::And(l, r)
            | Expr::Or(l, r) => {
                l.collect_columns(out);
                r.collect_columns(out);
            }
            Expr::Compare { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
        }
    }

    /// Replace column references by positions in `header`.
    pub fn bind(&self, header: &Header) -> MinirelResult<PhysicalExpr> {
        let bin = |l: &Expr, r: &Expr| -> MinirelResult<(Box<PhysicalExpr>, Box<PhysicalExpr>)> {
            Ok((Box::new(l.bind(header)?), Box::new(r.bind(header)?)))
        };
        Ok(match self {
            Expr::Column(column) => PhysicalExpr::Column(header.resolve(column)?),
            Expr::Constant(value) => PhysicalExpr::Constant(*value),
            Expr::Add(l, r) => {
                let (l, r) = bin(l, r)?;
                PhysicalExpr::Add(l, r)
            }
            Expr::Sub(l, r) => {
                let (l, r) = bin(l, r)?;
                PhysicalExpr::Sub(l, r)
            }
            Expr::Mul(l, r) => {
                let (l, r) = bin(l, r)?;
                PhysicalExpr::Mul(l, r)
            }
            Expr::Div(l, r) => {
                let (l, r) = bin(l, r)?;
                PhysicalExpr::Div(l, r)
            }
            Expr::And(l, r) => {
                let (l, r) = bin(l, r)?;
                PhysicalExpr::And(l, r)
            }
            Expr::Or(l, r) => {
                let (l, r) = bin(l, r)?;
                PhysicalExpr::Or(l, r)
            }
            Expr::Compare { op, left, right } => {
                let (left, right) = bin(left, right)?;
                PhysicalExpr::Compare {
                    op: *op,
                    left,
                    right,
                }
            }
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(column) => write!(f, "{}", column),
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::Add(l, r) => write!(f, "({} + {})", l, r),
            Expr::Sub(l, r) => write!(f, "({} - {})", l, r),
            Expr::Mul(l, r) => write!(f, "({} * {})", l, r),
            Expr::Div(l, r) => write!(f, "({} / {})", l, r),
            Expr::And(l, r) => write!(f, "{} AND {}", l, r),
            Expr::Or(l, r) => write!(f, "({} OR {})", l, r),
            Expr::Compare { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
        }
    }
}
