//! SQL 논리 플래너 — sqlparser AST → LogicalPlan
//!
//! Accepts the subset of SELECT the engine executes: a column list or `*`,
//! a FROM list of tables (comma-separated or INNER/CROSS JOIN, optionally
//! aliased), an AND/OR/comparison/arithmetic WHERE over integer columns,
//! DISTINCT and ORDER BY columns. Anything else is `SqlNotSupported`.

use crate::error::{MinirelError, MinirelResult};
use crate::sql::planner::types::*;
use crate::types::ColumnRef;
use sqlparser::ast::{
    BinaryOperator as SqlBinaryOp, Distinct, Expr as SqlExpr, GroupByExpr, JoinConstraint,
    JoinOperator, Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
    UnaryOperator, Value,
};

fn not_supported(feature: impl Into<String>, hint: &str) -> MinirelError {
    MinirelError::SqlNotSupported {
        feature: feature.into(),
        hint: hint.to_string(),
    }
}

/// SQL comparison operator → CompareOp
pub fn convert_compare_op(op: &SqlBinaryOp) -> Option<CompareOp> {
    match op {
        SqlBinaryOp::Eq => Some(CompareOp::Eq),
        SqlBinaryOp::NotEq => Some(CompareOp::NotEq),
        SqlBinaryOp::Lt => Some(CompareOp::Lt),
        SqlBinaryOp::LtEq => Some(CompareOp::LtEq),
        SqlBinaryOp::Gt => Some(CompareOp::Gt),
        SqlBinaryOp::GtEq => Some(CompareOp::GtEq),
        _ => None,
    }
}

/// 논리 플랜 빌더 — AST → LogicalPlan 변환
#[derive(Debug, Default)]
pub struct LogicalPlanner;

impl LogicalPlanner {
    pub fn new() -> Self {
        Self
    }

    /// SQL Statement → LogicalPlan 변환
    pub fn plan(&self, statement: &Statement) -> MinirelResult<LogicalPlan> {
        match statement {
            Statement::Query(query) => self.plan_query(query),
            _ => Err(not_supported(
                format!("statement: {}", statement),
                "only SELECT queries are executed",
            )),
        }
    }

    /// Query → LogicalPlan 변환
    fn plan_query(&self, query: &Query) -> MinirelResult<LogicalPlan> {
        if query.limit.is_some() || query.offset.is_some() {
            return Err(not_supported("LIMIT/OFFSET", "drain fewer rows from the result instead"));
        }
        let mut plan = match query.body.as_ref() {
            SetExpr::Select(select) => self.plan_select(select)?,
            other => {
                return Err(not_supported(
                    format!("query body: {}", other),
                    "only a single SELECT block is supported",
                ));
            }
        };

        // ORDER BY lives on Query, not Select, in sqlparser 0.52
        if let Some(order_by) = &query.order_by {
            let mut columns = Vec::with_capacity(order_by.exprs.len());
            for item in &order_by.exprs {
                if item.asc == Some(false) {
                    return Err(not_supported("ORDER BY ... DESC", "results are sorted ascending"));
                }
                columns.push(self.plan_column(&item.expr)?);
            }
            if !columns.is_empty() {
                plan = plan.sort(columns);
            }
        }
        Ok(plan)
    }

    fn plan_select(&self, select: &Select) -> MinirelResult<LogicalPlan> {
        match &select.group_by {
            GroupByExpr::Expressions(exprs, _) if exprs.is_empty() => {}
            _ => return Err(not_supported("GROUP BY", "aggregation is not supported")),
        }
        if select.having.is_some() {
            return Err(not_supported("HAVING", "aggregation is not supported"));
        }

        // 1. FROM 절 → Scan / Join
        let mut plan = self.plan_from(&select.from)?;

        // 2. WHERE 절 → Filter
        if let Some(selection) = &select.selection {
            plan = plan.filter(self.plan_expr(selection)?);
        }

        // 3. SELECT 절 → Project
        let columns = self.plan_projection(&select.projection)?;
        plan = plan.project(columns);

        // 4. DISTINCT
        match &select.distinct {
            None => {}
            Some(Distinct::Distinct) => plan = plan.distinct(),
            Some(Distinct::On(_)) => {
                return Err(not_supported("DISTINCT ON", "use plain DISTINCT"));
            }
        }
        Ok(plan)
    }

    fn plan_table(&self, factor: &TableFactor) -> MinirelResult<LogicalPlan> {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let table = name.to_string();
                let alias = alias
                    .as_ref()
                    .map(|a| a.name.value.clone())
                    .unwrap_or_else(|| table.clone());
                Ok(LogicalPlan::scan_as(&table, &alias))
            }
            other => Err(not_supported(
                format!("table expression: {}", other),
                "use plain table names",
            )),
        }
    }

    fn plan_from(&self, from: &[TableWithJoins]) -> MinirelResult<LogicalPlan> {
        let mut plan: Option<LogicalPlan> = None;
        for table_with_joins in from {
            let mut item = self.plan_table(&table_with_joins.relation)?;
            for join in &table_with_joins.joins {
                let right = self.plan_table(&join.relation)?;
                let on = match &join.join_operator {
                    JoinOperator::Inner(JoinConstraint::On(expr)) => Some(self.plan_expr(expr)?),
                    JoinOperator::Inner(JoinConstraint::None) | JoinOperator::CrossJoin => None,
                    other => {
                        return Err(not_supported(
                            format!("join: {:?}", other),
                            "only INNER JOIN ... ON and CROSS JOIN are supported",
                        ));
                    }
                };
                item = item.join(right, on);
            }
            plan = Some(match plan {
                None => item,
                Some(left) => left.join(item, None),
            });
        }
        plan.ok_or_else(|| MinirelError::Schema("FROM clause is required".to_string()))
    }

    /// SELECT list → projected columns; empty for `*`.
    fn plan_projection(&self, items: &[SelectItem]) -> MinirelResult<Vec<ColumnRef>> {
        if let [SelectItem::Wildcard(_)] = items {
            return Ok(Vec::new());
        }
        items
            .iter()
            .map(|item| match item {
                SelectItem::UnnamedExpr(expr) => self.plan_column(expr),
                other => Err(not_supported(
                    format!("select item: {}", other),
                    "select plain columns or a single *",
                )),
            })
            .collect()
    }

    fn plan_column(&self, expr: &SqlExpr) -> MinirelResult<ColumnRef> {
        match self.plan_expr(expr)? {
            Expr::Column(column) => Ok(column),
            other => Err(not_supported(
                format!("expression {}", other),
                "only column references may appear here",
            )),
        }
    }

    fn plan_expr(&self, expr: &SqlExpr) -> MinirelResult<Expr> {
        match expr {
            SqlExpr::Identifier(ident) => Ok(Expr::Column(ColumnRef::unqualified(ident.value.clone()))),
            SqlExpr::CompoundIdentifier(idents) => match idents.as_slice() {
                [table, column] => Ok(Expr::Column(ColumnRef::new(
                    table.value.clone(),
                    column.value.clone(),
                ))),
                _ => Err(not_supported(
                    format!("identifier {}", expr),
                    "use table.column or column",
                )),
            },
            SqlExpr::Value(Value::Number(n, _)) => n
                .parse::<i64>()
                .map(Expr::Constant)
                .map_err(|_| MinirelError::SqlParse {
                    message: format!("invalid integer literal: {}", n),
                    sql: expr.to_string(),
                }),
            SqlExpr::Nested(inner) => self.plan_expr(inner),
            SqlExpr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => Ok(match self.plan_expr(inner)? {
                Expr::Constant(value) => Expr::Constant(-value),
                other => Expr::Sub(Box::new(Expr::Constant(0)), Box::new(other)),
            }),
            SqlExpr::UnaryOp {
                op: UnaryOperator::Plus,
                expr: inner,
            } => self.plan_expr(inner),
            SqlExpr::BinaryOp { left, op, right } => {
                let l = Box::new(self.plan_expr(left)?);
                let r = Box::new(self.plan_expr(right)?);
                if let Some(op) = convert_compare_op(op) {
                    return Ok(Expr::Compare {
                        op,
                        left: l,
                        right: r,
                    });
                }
                match op {
                    SqlBinaryOp::Plus => Ok(Expr::Add(l, r)),
                    SqlBinaryOp::Minus => Ok(Expr::Sub(l, r)),
                    SqlBinaryOp::Multiply => Ok(Expr::Mul(l, r)),
                    SqlBinaryOp::Divide => Ok(Expr::Div(l, r)),
                    SqlBinaryOp::And => Ok(Expr::And(l, r)),
                    SqlBinaryOp::Or => Ok(Expr::Or(l, r)),
                    other => Err(not_supported(
                        format!("operator {}", other),
                        "supported: + - * / AND OR = <> < <= > >=",
                    )),
                }
            }
            other => Err(not_supported(
                format!("expression {}", other),
                "only integer columns, literals and arithmetic are supported",
            )),
        }
    }
}
