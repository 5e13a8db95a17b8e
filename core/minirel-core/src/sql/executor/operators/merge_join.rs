//! Sort-Merge Join — equi-join over inputs sorted on their join keys
//!
//! Both children must be [`SortedOperator`]s whose ordering begins with the
//! join keys. Duplicate keys on the right are handled by remembering the
//! index of the first right tuple of the current matching run and rewinding
//! to it with `reset_to` each time the left side moves to its next tuple.

use crate::error::{MinirelError, MinirelResult};
use crate::sql::executor::expr::PhysicalExpr;
use crate::sql::executor::operators::nested_loop_join::{bind_join_condition, passes};
use crate::sql::executor::operators::{Lookahead, SortedOperator, TupleSource};
use crate::sql::planner::Expr;
use crate::types::{Header, Tuple};
use smallvec::SmallVec;
use std::cmp::Ordering;

type JoinKeys = SmallVec<[usize; 4]>;

/// 정렬 병합 조인 — 조인 키로 정렬된 두 입력을 병합
pub struct SortMergeJoin {
    left: Box<dyn SortedOperator>,
    right: Box<dyn SortedOperator>,
    left_keys: JoinKeys,
    right_keys: JoinKeys,
    header: Header,
    /// Residual condition checked on every key match.
    condition: Option<PhysicalExpr>,
    /// Index of the first right tuple matching the current left key.
    mark: Option<usize>,
}

pub type SortMergeJoinOperator = Lookahead<SortMergeJoin>;

fn check_ordering(side: &str, child: &dyn SortedOperator, keys: &[usize]) -> MinirelResult<()> {
    let ordering = child.ordering();
    if ordering.len() < keys.len() || ordering[..keys.len()] != *keys {
        return Err(MinirelError::Precondition(format!(
            "{} input of sort-merge join is ordered on {:?}, join keys are {:?}",
            side, ordering, keys
        )));
    }
    Ok(())
}

impl SortMergeJoinOperator {
    /// `left_keys[i]` is compared with `right_keys[i]`, positions relative
    /// to each child's own header. `residual` is evaluated on the joined
    /// tuple after the keys match.
    pub fn new(
        left: Box<dyn SortedOperator>,
        right: Box<dyn SortedOperator>,
        left_keys: &[usize],
        right_keys: &[usize],
        residual: Option<&Expr>,
    ) -> MinirelResult<Self> {
        if left_keys.is_empty() || left_keys.len() != right_keys.len() {
            return Err(MinirelError::Precondition(format!(
                "sort-merge join needs matching non-empty key lists, got {:?} and {:?}",
                left_keys, right_keys
            )));
        }
        check_ordering("left", left.as_ref(), left_keys)?;
        check_ordering("right", right.as_ref(), right_keys)?;

        let header = left.header().join(right.header());
        let condition = bind_join_condition(&header, residual)?;
        Ok(Lookahead::wrap(SortMergeJoin {
            left,
            right,
            left_keys: left_keys.iter().copied().collect(),
            right_keys: right_keys.iter().copied().collect(),
            header,
            condition,
            mark: None,
        }))
    }
}

impl SortMergeJoin {
    fn compare(&self, left: &Tuple, right: &Tuple) -> Ordering {
        for (&l, &r) in self.left_keys.iter().zip(self.right_keys.iter()) {
            match left.get(l).cmp(&right.get(r)) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Move to the next left tuple and replay the marked right run.
    fn advance_left_and_rewind(&mut self, mark: usize) -> MinirelResult<()> {
        self.left.next()?;
        if !self.right.reset_to(mark)? {
            return Err(MinirelError::NotRestartable(self.right.name().to_string()));
        }
        Ok(())
    }
}

impl TupleSource for SortMergeJoin {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        loop {
            let Some(left) = self.left.peek()?.cloned() else {
                return Ok(None);
            };
            let Some(right) = self.right.peek()?.cloned() else {
                match self.mark {
                    Some(mark) => {
                        self.advance_left_and_rewind(mark)?;
                        continue;
                    }
                    None => return Ok(None),
                }
            };

            match self.compare(&left, &right) {
                Ordering::Less => match self.mark {
                    Some(mark) => self.advance_left_and_rewind(mark)?,
                    None => {
                        self.left.next()?;
                    }
                },
                Ordering::Greater => {
                    // past the marked run for good
                    self.mark = None;
                    self.right.next()?;
                }
                Ordering::Equal => {
                    self.right.next()?;
                    if self.mark.is_none() {
                        self.mark = self.right.last_index();
                    }
                    let joined = left.join(&right);
                    if passes(&self.condition, &joined)? {
                        return Ok(Some(joined));
                    }
                }
            }
        }
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.mark = None;
        Ok(self.left.reset()? && self.right.reset()?)
    }

    fn release(&mut self) {
        self.mark = None;
        self.left.close();
        self.right.close();
    }

    fn name(&self) -> &'static str {
        "SortMergeJoin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::executor::collect_all;
    use crate::sql::executor::operators::{MemoryScanOperator, PhysicalOperator, SortOperator};
    use crate::types::ColumnRef;

    fn sorted(table: &str, rows: &[&[i32]]) -> Box<dyn SortedOperator> {
        let scan = MemoryScanOperator::from_rows(Header::for_table(table, &["K", "V"]), rows);
        Box::new(SortOperator::new(Box::new(scan), &[ColumnRef::new(table, "K")]).unwrap())
    }

    #[test]
    fn test_duplicate_keys_on_both_sides() {
        let left = sorted("L", &[&[1, 0], &[2, 1], &[2, 2], &[3, 3]]);
        let right = sorted("R", &[&[2, 10], &[2, 11], &[3, 12], &[4, 13]]);
        let mut join = SortMergeJoinOperator::new(left, right, &[0], &[0], None).unwrap();
        let out = collect_all(&mut join).unwrap();
        let pairs: Vec<(i32, i32)> = out.iter().map(|t| (t.get(1), t.get(3))).collect();
        assert_eq!(pairs, vec![(1, 10), (1, 11), (2, 10), (2, 11), (3, 12)]);
    }

    #[test]
    fn test_run_at_end_of_right_input() {
        let left = sorted("L", &[&[5, 0], &[5, 1], &[5, 2]]);
        let right = sorted("R", &[&[1, 0], &[5, 1], &[5, 2]]);
        let mut join = SortMergeJoinOperator::new(left, right, &[0], &[0], None).unwrap();
        assert_eq!(collect_all(&mut join).unwrap().len(), 6);
    }

    #[test]
    fn test_all_equal_keys_is_36_rows() {
        let rows: Vec<Vec<i32>> = (0..6).map(|i| vec![7, i]).collect();
        let refs: Vec<&[i32]> = rows.iter().map(|r| r.as_slice()).collect();
        let mut join =
            SortMergeJoinOperator::new(sorted("L", &refs), sorted("R", &refs), &[0], &[0], None).unwrap();
        assert_eq!(collect_all(&mut join).unwrap().len(), 36);
    }

    #[test]
    fn test_residual_condition() {
        let left = sorted("L", &[&[1, 0], &[1, 5]]);
        let right = sorted("R", &[&[1, 3], &[1, 9]]);
        let residual = Expr::compare(
            crate::sql::planner::CompareOp::Lt,
            Expr::col("L", "V"),
            Expr::col("R", "V"),
        );
        let mut join = SortMergeJoinOperator::new(left, right, &[0], &[0], Some(&residual)).unwrap();
        let out = collect_all(&mut join).unwrap();
        // (0,3) (0,9) (5,9)
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_unsorted_child_rejected() {
        let left = sorted("L", &[&[1, 0]]);
        let right = sorted("R", &[&[1, 0]]);
        assert!(matches!(
            SortMergeJoinOperator::new(left, right, &[1], &[0], None),
            Err(MinirelError::Precondition(_))
        ));
    }

    #[test]
    fn test_empty_key_list_rejected() {
        assert!(SortMergeJoinOperator::new(sorted("L", &[]), sorted("R", &[]), &[], &[], None).is_err());
    }

    #[test]
    fn test_reset_replays() {
        let left = sorted("L", &[&[2, 1], &[2, 2]]);
        let right = sorted("R", &[&[2, 10], &[2, 11]]);
        let mut join = SortMergeJoinOperator::new(left, right, &[0], &[0], None).unwrap();
        let first = collect_all(&mut join).unwrap();
        assert_eq!(first.len(), 4);
        assert!(join.reset().unwrap());
        assert_eq!(collect_all(&mut join).unwrap(), first);
        assert_eq!(join.header().len(), 4);
    }
}
