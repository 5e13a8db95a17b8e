//! SQL interface — text in, pull-based result out

use crate::config::ExecConfig;
use crate::engine::Database;
use crate::error::MinirelResult;
use crate::sql::executor::{ExecContext, PhysicalOperator, collect_all, dump_binary, dump_text};
use crate::sql::planner::{LogicalPlan, LogicalPlanner, PhysicalPlanner};
use crate::storage::IoSnapshot;
use crate::types::{Header, Tuple};
use std::io::Write;
use std::path::Path;
use tracing::{debug, instrument};

/// 쿼리 결과 — 실행 중인 연산자 트리와 I/O 카운터
///
/// Tuples are produced on demand. Dropping the result closes the tree,
/// which deletes any sort runs still on disk.
pub struct QueryResult {
    root: Box<dyn PhysicalOperator>,
    ctx: ExecContext,
}

impl QueryResult {
    pub fn header(&self) -> &Header {
        self.root.header()
    }

    /// The root operator, for callers that pull tuples themselves.
    pub fn operator(&mut self) -> &mut dyn PhysicalOperator {
        self.root.as_mut()
    }

    pub fn next(&mut self) -> MinirelResult<Option<Tuple>> {
        self.root.next()
    }

    /// Replay the result from the start.
    pub fn reset(&mut self) -> MinirelResult<bool> {
        self.root.reset()
    }

    pub fn collect(&mut self) -> MinirelResult<Vec<Tuple>> {
        collect_all(self.root.as_mut())
    }

    pub fn dump_text<W: Write>(&mut self, out: &mut W) -> MinirelResult<u64> {
        dump_text(self.root.as_mut(), out)
    }

    pub fn dump_binary(&mut self, path: &Path) -> MinirelResult<u64> {
        dump_binary(self.root.as_mut(), path, self.ctx.stats())
    }

    /// Page and run counters accumulated so far.
    pub fn io(&self) -> IoSnapshot {
        self.ctx.io_snapshot()
    }

    pub fn close(&mut self) {
        self.root.close();
    }
}

impl Drop for QueryResult {
    fn drop(&mut self) {
        self.root.close();
    }
}

impl Database {
    /// SQL → LogicalPlan
    pub fn plan_sql(&self, sql: &str) -> MinirelResult<LogicalPlan> {
        let statement = self.parser.parse_one(sql)?;
        LogicalPlanner::new().plan(&statement)
    }

    /// Run `sql` with the database's default settings.
    pub fn query(&self, sql: &str) -> MinirelResult<QueryResult> {
        self.query_with(sql, self.config.clone())
    }

    /// Run `sql` with explicit settings.
    #[instrument(skip(self, config))]
    pub fn query_with(&self, sql: &str, config: ExecConfig) -> MinirelResult<QueryResult> {
        let plan = self.plan_sql(sql)?;
        debug!(?plan, "logical plan");
        self.execute_plan(&plan, config)
    }

    /// Build the operator tree for an already planned query.
    pub fn execute_plan(&self, plan: &LogicalPlan, config: ExecConfig) -> MinirelResult<QueryResult> {
        let ctx = ExecContext::new(config);
        let root = PhysicalPlanner::new(&self.catalog, &ctx).plan(plan)?;
        Ok(QueryResult { root, ctx })
    }

    /// Run `sql` to completion and return every tuple.
    pub fn collect(&self, sql: &str) -> MinirelResult<Vec<Tuple>> {
        self.query(sql)?.collect()
    }
}
