//! PhysicalPlanner 구현
//!
//! LogicalPlan → physical operator tree. The logical plan is read as one
//! SELECT block (FROM relations, WHERE/ON conjunction, projection, DISTINCT,
//! ORDER BY); the optimizer picks the join order and access paths and this
//! module instantiates:
//!
//! ```text
//! Sort? ─ Distinct? ─ Project ─ Project(FROM order) ─ Join ─ ... ─ Join
//!                                                       │          │
//!                                              Filter(σ) ─ Scan/IndexScan
//! ```

use crate::catalog::Catalog;
use crate::config::{JoinMethod, SortMethod};
use crate::error::{MinirelError, MinirelResult};
use crate::sql::executor::context::ExecContext;
use crate::sql::executor::evaluate_predicate;
use crate::sql::executor::operators::{
    BlockNestedLoopJoinOperator, DistinctOperator, ExternalSortOperator, FilterOperator,
    IndexScanOperator, IndexScanSpec, NestedLoopJoinOperator, PhysicalOperator,
    ProjectionOperator, SortKeys, SortMergeJoinOperator, SortOperator, SortedOperator,
    TableScanOperator, resolve_sort_keys,
};
use crate::sql::optimizer::{
    AccessPath, Attribute, OptimizedQuery, QueryOptimizer, RelationInfo, as_column_equality,
    resolve_attribute,
};
use crate::sql::planner::types::{Expr, LogicalPlan};
use crate::types::{ColumnRef, Header, Tuple};
use ahash::AHashSet;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Outer-block budget used when sort-merge falls back to BNLJ.
const FALLBACK_JOIN_PAGES: usize = 5;

/// A logical plan flattened to one SELECT block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBlock {
    /// (table, alias) in FROM order.
    pub relations: Vec<(String, String)>,
    /// WHERE and ON predicates.
    pub predicates: Vec<Expr>,
    /// Output columns; empty means every column.
    pub projection: Vec<ColumnRef>,
    pub distinct: bool,
    pub order_by: Vec<ColumnRef>,
}

impl QueryBlock {
    pub fn from_plan(plan: &LogicalPlan) -> MinirelResult<Self> {
        let mut block = QueryBlock::default();
        block.collect(plan)?;
        let mut aliases = BTreeSet::new();
        for (_, alias) in &block.relations {
            if !aliases.insert(alias.as_str()) {
                return Err(MinirelError::Schema(format!(
                    "alias '{}' appears more than once in FROM",
                    alias
                )));
            }
        }
        Ok(block)
    }

    fn collect(&mut self, plan: &LogicalPlan) -> MinirelResult<()> {
        match plan {
            LogicalPlan::Scan { table, alias } => {
                self.relations.push((table.clone(), alias.clone()));
            }
            LogicalPlan::Filter { input, predicate } => {
                self.collect(input)?;
                self.predicates.push(predicate.clone());
            }
            LogicalPlan::Join { left, right, on } => {
                self.collect(left)?;
                self.collect(right)?;
                if let Some(on) = on {
                    self.predicates.push(on.clone());
                }
            }
            LogicalPlan::Project { input, columns } => {
                self.collect(input)?;
                self.projection = columns.clone();
            }
            LogicalPlan::Sort { input, order_by } => {
                self.collect(input)?;
                self.order_by = order_by.clone();
            }
            LogicalPlan::Distinct { input } => {
                self.collect(input)?;
                self.distinct = true;
            }
        }
        Ok(())
    }

    pub fn predicate(&self) -> Option<Expr> {
        Expr::conjunction(self.predicates.clone())
    }
}

/// 물리 플랜 빌더 — LogicalPlan → 연산자 트리
pub struct PhysicalPlanner<'a> {
    catalog: &'a Catalog,
    ctx: &'a ExecContext,
}

impl<'a> PhysicalPlanner<'a> {
    pub fn new(catalog: &'a Catalog, ctx: &'a ExecContext) -> Self {
        Self { catalog, ctx }
    }

    /// Convert LogicalPlan → operator tree ready to be pulled.
    pub fn plan(&self, plan: &LogicalPlan) -> MinirelResult<Box<dyn PhysicalOperator>> {
        self.ctx.config().validate()?;
        let block = QueryBlock::from_plan(plan)?;
        let relations = block
            .relations
            .iter()
            .map(|(table, alias)| self.catalog.relation_info(table, alias))
            .collect::<MinirelResult<Vec<_>>>()?;
        let predicate = block.predicate();
        let optimized = QueryOptimizer::new()
            .with_indexes(self.ctx.config().use_indexes)
            .optimize(&relations, predicate.as_ref())?;
        self.realize(&block, &relations, &optimized)
    }

    /// Build the operator tree for an already optimized block.
    pub fn realize(
        &self,
        block: &QueryBlock,
        relations: &[RelationInfo],
        optimized: &OptimizedQuery,
    ) -> MinirelResult<Box<dyn PhysicalOperator>> {
        let mut root = self.plan_joins(relations, optimized)?;

        if !constants_hold(&optimized.decomposition.constants)? {
            debug!("constant predicate is false; result is empty");
            root = Box::new(FilterOperator::new(root, &Expr::constant(0))?);
        }

        root = restore_from_order(root, relations, &optimized.join_order);

        if !block.projection.is_empty() {
            root = Box::new(ProjectionOperator::new(root, &block.projection)?);
        }

        if block.distinct {
            // ORDER BY keys lead so the deduplicated stream is already in order
            let mut keys = resolve_sort_keys(root.header(), &block.order_by)?;
            for column in 0..root.header().len() {
                if !keys.contains(&column) {
                    keys.push(column);
                }
            }
            let sorted = self.sort(root, keys)?;
            root = Box::new(DistinctOperator::new(sorted));
        } else if !block.order_by.is_empty() {
            let keys = resolve_sort_keys(root.header(), &block.order_by)?;
            root = self.sort(root, keys)?;
        }
        info!(header = %root.header(), root = root.name(), "physical plan ready");
        Ok(root)
    }

    /// Access path plus local selections for relation `position`.
    fn plan_relation(
        &self,
        position: usize,
        relation: &RelationInfo,
        optimized: &OptimizedQuery,
    ) -> MinirelResult<Box<dyn PhysicalOperator>> {
        let mut op: Box<dyn PhysicalOperator> = match &optimized.access_paths[position] {
            AccessPath::Scan => Box::new(TableScanOperator::open(
                &relation.table,
                &relation.path,
                relation.header.clone(),
                self.ctx,
            )?),
            AccessPath::Index {
                index,
                column,
                range,
            } => Box::new(IndexScanOperator::open(
                &relation.table,
                &relation.path,
                relation.header.clone(),
                IndexScanSpec {
                    index_path: &index.path,
                    key_column: *column,
                    clustered: index.clustered,
                    range: *range,
                },
                self.ctx,
            )?),
        };
        if let Some(selection) = Expr::conjunction(optimized.decomposition.selections[position].clone()) {
            op = Box::new(FilterOperator::new(op, &selection)?);
        }
        Ok(op)
    }

    /// Left-deep join chain in the chosen order.
    fn plan_joins(
        &self,
        relations: &[RelationInfo],
        optimized: &OptimizedQuery,
    ) -> MinirelResult<Box<dyn PhysicalOperator>> {
        let Some((&first, rest)) = optimized.join_order.split_first() else {
            return Err(MinirelError::Schema("query has no relations".to_string()));
        };
        let mut root = self.plan_relation(first, &relations[first], optimized)?;
        let mut joined = vec![first];
        let mut residual: Vec<(BTreeSet<usize>, Expr)> = optimized
            .decomposition
            .residual
            .iter()
            .map(|atom| Ok((touched_relations(relations, atom)?, atom.clone())))
            .collect::<MinirelResult<_>>()?;

        for &next in rest {
            let right = self.plan_relation(next, &relations[next], optimized)?;
            let mut atoms = join_atoms(relations, optimized, &joined, next)?;
            joined.push(next);
            let available: BTreeSet<usize> = joined.iter().copied().collect();
            let (ready, pending): (Vec<_>, Vec<_>) = residual
                .into_iter()
                .partition(|(touched, _)| touched.is_subset(&available));
            atoms.extend(ready.into_iter().map(|(_, atom)| atom));
            residual = pending;
            root = self.join(root, right, atoms)?;
        }
        if let Some(rest) = Expr::conjunction(residual.into_iter().map(|(_, atom)| atom).collect()) {
            root = Box::new(FilterOperator::new(root, &rest)?);
        }
        Ok(root)
    }

    fn join(
        &self,
        left: Box<dyn PhysicalOperator>,
        right: Box<dyn PhysicalOperator>,
        atoms: Vec<Expr>,
    ) -> MinirelResult<Box<dyn PhysicalOperator>> {
        match self.ctx.config().join {
            JoinMethod::TupleNestedLoop => {
                let condition = Expr::conjunction(atoms);
                Ok(Box::new(NestedLoopJoinOperator::new(left, right, condition.as_ref())?))
            }
            JoinMethod::BlockNestedLoop { buffer_pages } => {
                let condition = Expr::conjunction(atoms);
                Ok(Box::new(BlockNestedLoopJoinOperator::new(
                    left,
                    right,
                    condition.as_ref(),
                    buffer_pages,
                )?))
            }
            JoinMethod::SortMerge => self.sort_merge_join(left, right, atoms),
        }
    }

    fn sort_merge_join(
        &self,
        left: Box<dyn PhysicalOperator>,
        right: Box<dyn PhysicalOperator>,
        atoms: Vec<Expr>,
    ) -> MinirelResult<Box<dyn PhysicalOperator>> {
        let mut left_keys = SortKeys::new();
        let mut right_keys = SortKeys::new();
        let mut residual = Vec::new();
        for atom in atoms {
            match equi_key(&atom, left.header(), right.header()) {
                Some((l, r)) => {
                    left_keys.push(l);
                    right_keys.push(r);
                }
                None => residual.push(atom),
            }
        }
        let residual = Expr::conjunction(residual);
        if left_keys.is_empty() {
            debug!("no equality key between join inputs; using block nested loop");
            return Ok(Box::new(BlockNestedLoopJoinOperator::new(
                left,
                right,
                residual.as_ref(),
                FALLBACK_JOIN_PAGES,
            )?));
        }
        let left_sorted = self.sort_seekable(left, left_keys.clone())?;
        let right_sorted = self.sort_seekable(right, right_keys.clone())?;
        Ok(Box::new(SortMergeJoinOperator::new(
            left_sorted,
            right_sorted,
            &left_keys,
            &right_keys,
            residual.as_ref(),
        )?))
    }

    fn build_sort(&self, input: Box<dyn PhysicalOperator>, keys: SortKeys) -> MinirelResult<BuiltSort> {
        Ok(match self.ctx.config().sort {
            SortMethod::InMemory => BuiltSort::InMemory(SortOperator::with_keys(input, keys)?),
            SortMethod::External { buffer_pages } => BuiltSort::External(
                ExternalSortOperator::with_keys(input, keys, buffer_pages, self.ctx)?,
            ),
        })
    }

    fn sort_seekable(
        &self,
        input: Box<dyn PhysicalOperator>,
        keys: SortKeys,
    ) -> MinirelResult<Box<dyn SortedOperator>> {
        Ok(match self.build_sort(input, keys)? {
            BuiltSort::InMemory(op) => Box::new(op),
            BuiltSort::External(op) => Box::new(op),
        })
    }

    fn sort(
        &self,
        input: Box<dyn PhysicalOperator>,
        keys: SortKeys,
    ) -> MinirelResult<Box<dyn PhysicalOperator>> {
        Ok(match self.build_sort(input, keys)? {
            BuiltSort::InMemory(op) => Box::new(op),
            BuiltSort::External(op) => Box::new(op),
        })
    }
}

/// Sort chosen by [`SortMethod`], boxed by the caller as whichever
/// operator trait it needs.
enum BuiltSort {
    InMemory(SortOperator),
    External(ExternalSortOperator),
}

/// Relations referenced by `atom`.
fn touched_relations(relations: &[RelationInfo], atom: &Expr) -> MinirelResult<BTreeSet<usize>> {
    atom.columns()
        .into_iter()
        .map(|column| Ok(resolve_attribute(relations, column)?.relation))
        .collect()
}

fn column_of(relations: &[RelationInfo], attr: Attribute) -> Expr {
    let relation = &relations[attr.relation];
    Expr::col(&relation.alias, relation.header.column(attr.column))
}

/// Predicates for joining `next` onto the relations in `joined`: every
/// direct edge, plus one equality per union-find group spanning both sides
/// that no direct edge already connects.
fn join_atoms(
    relations: &[RelationInfo],
    optimized: &OptimizedQuery,
    joined: &[usize],
    next: usize,
) -> MinirelResult<Vec<Expr>> {
    let mut atoms = Vec::new();
    for &j in joined {
        let key = if j < next { (j, next) } else { (next, j) };
        if let Some(edge) = optimized.decomposition.join_edges.get(&key) {
            atoms.extend(edge.iter().cloned());
        }
    }

    let mut connected: AHashSet<Attribute> = AHashSet::new();
    for atom in &atoms {
        if let Some((l, r)) = as_column_equality(atom) {
            connected.insert(resolve_attribute(relations, l)?);
            connected.insert(resolve_attribute(relations, r)?);
        }
    }
    for group in &optimized.equivalences {
        if group.iter().any(|a| connected.contains(a)) {
            continue;
        }
        let outer = group.iter().find(|a| joined.contains(&a.relation));
        let inner = group.iter().find(|a| a.relation == next);
        if let (Some(&outer), Some(&inner)) = (outer, inner) {
            atoms.push(Expr::eq(column_of(relations, outer), column_of(relations, inner)));
        }
    }
    Ok(atoms)
}

/// `left.col = right.col` (either orientation) as positions in each header.
fn equi_key(atom: &Expr, left: &Header, right: &Header) -> Option<(usize, usize)> {
    let (a, b) = as_column_equality(atom)?;
    let on_left = |c: &ColumnRef| left.find(c.table.as_deref(), &c.name);
    let on_right = |c: &ColumnRef| right.find(c.table.as_deref(), &c.name);
    match (on_left(a), on_right(b)) {
        (Some(l), Some(r)) => Some((l, r)),
        _ => match (on_left(b), on_right(a)) {
            (Some(l), Some(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// Evaluate column-free predicates once.
fn constants_hold(constants: &[Expr]) -> MinirelResult<bool> {
    let empty = Header::default();
    let tuple = Tuple::default();
    for atom in constants {
        if !evaluate_predicate(&atom.bind(&empty)?, &tuple)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Reorder the join output's columns back into FROM-clause order.
fn restore_from_order(
    root: Box<dyn PhysicalOperator>,
    relations: &[RelationInfo],
    join_order: &[usize],
) -> Box<dyn PhysicalOperator> {
    let mut offsets = vec![0; relations.len()];
    let mut offset = 0;
    for &position in join_order {
        offsets[position] = offset;
        offset += relations[position].header.len();
    }
    let indices: Vec<usize> = relations
        .iter()
        .enumerate()
        .flat_map(|(position, relation)| {
            let start = offsets[position];
            start..start + relation.header.len()
        })
        .collect();
    if indices.iter().enumerate().all(|(i, &j)| i == j) {
        return root;
    }
    Box::new(ProjectionOperator::from_indices(root, indices))
}
