// 연산자 속성 테스트 — proptest
//
// Every join algorithm produces the same multiset; external sort agrees
// with the in-memory sort for any budget; reset replays; sort runs are
// cleaned up on close.

use minirel_core::config::ExecConfig;
use minirel_core::sql::executor::operators::{SortKeys, SortedOperator};
use minirel_core::sql::executor::{
    BlockNestedLoopJoinOperator, DistinctOperator, ExecContext, ExternalSortOperator,
    MemoryScanOperator, NestedLoopJoinOperator, PhysicalOperator, SortMergeJoinOperator,
    SortOperator, TableScanOperator, collect_all,
};
use minirel_core::sql::planner::Expr;
use minirel_core::storage::write_relation;
use minirel_core::{Header, Tuple};
use proptest::prelude::*;
use tempfile::tempdir;

// ─── Helpers ────────────────────────────────────────────

fn rows_strategy(width: usize, max_len: usize, key_domain: i32) -> impl Strategy<Value = Vec<Tuple>> {
    prop::collection::vec(prop::collection::vec(0..key_domain, width), 0..max_len)
        .prop_map(|rows| rows.into_iter().map(Tuple::new).collect())
}

fn scan(alias: &str, columns: &[&str], rows: Vec<Tuple>) -> Box<dyn PhysicalOperator> {
    Box::new(MemoryScanOperator::from_tuples(Header::for_table(alias, columns), rows))
}

fn keys(columns: &[usize]) -> SortKeys {
    columns.iter().copied().collect()
}

fn sorted(mut rows: Vec<Tuple>) -> Vec<Tuple> {
    rows.sort();
    rows
}

/// Nested-loop reference over plain vectors.
fn reference_join(left: &[Tuple], right: &[Tuple]) -> Vec<Tuple> {
    let mut out = Vec::new();
    for l in left {
        for r in right {
            if l.get(0) == r.get(0) {
                out.push(l.join(r));
            }
        }
    }
    sorted(out)
}

fn equi_condition() -> Expr {
    Expr::eq(Expr::col("L", "k"), Expr::col("R", "k"))
}

// ─── Joins ──────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_join_algorithms_agree(
        left in rows_strategy(2, 40, 6),
        right in rows_strategy(2, 40, 6),
        pages in 1usize..4,
    ) {
        let expected = reference_join(&left, &right);
        let cond = equi_condition();

        let mut tnlj = NestedLoopJoinOperator::new(
            scan("L", &["k", "a"], left.clone()),
            scan("R", &["k", "b"], right.clone()),
            Some(&cond),
        ).unwrap();
        prop_assert_eq!(sorted(collect_all(&mut tnlj).unwrap()), expected.clone());

        let mut bnlj = BlockNestedLoopJoinOperator::new(
            scan("L", &["k", "a"], left.clone()),
            scan("R", &["k", "b"], right.clone()),
            Some(&cond),
            pages,
        ).unwrap();
        prop_assert_eq!(sorted(collect_all(&mut bnlj).unwrap()), expected.clone());

        let l: Box<dyn SortedOperator> = Box::new(
            SortOperator::with_keys(scan("L", &["k", "a"], left), keys(&[0])).unwrap(),
        );
        let r: Box<dyn SortedOperator> = Box::new(
            SortOperator::with_keys(scan("R", &["k", "b"], right), keys(&[0])).unwrap(),
        );
        let mut smj = SortMergeJoinOperator::new(l, r, &[0], &[0], None).unwrap();
        let out = collect_all(&mut smj).unwrap();
        prop_assert!(out.windows(2).all(|w| w[0].get(0) <= w[1].get(0)));
        prop_assert_eq!(sorted(out), expected);
    }

    #[test]
    fn prop_join_reset_replays(
        left in rows_strategy(2, 20, 4),
        right in rows_strategy(2, 20, 4),
    ) {
        let cond = equi_condition();
        let mut bnlj = BlockNestedLoopJoinOperator::new(
            scan("L", &["k", "a"], left.clone()),
            scan("R", &["k", "b"], right.clone()),
            Some(&cond),
            1,
        ).unwrap();
        let first = collect_all(&mut bnlj).unwrap();
        prop_assert!(bnlj.reset().unwrap());
        prop_assert_eq!(collect_all(&mut bnlj).unwrap(), first);

        let l: Box<dyn SortedOperator> = Box::new(
            SortOperator::with_keys(scan("L", &["k", "a"], left), keys(&[0])).unwrap(),
        );
        let r: Box<dyn SortedOperator> = Box::new(
            SortOperator::with_keys(scan("R", &["k", "b"], right), keys(&[0])).unwrap(),
        );
        let mut smj = SortMergeJoinOperator::new(l, r, &[0], &[0], None).unwrap();
        let first = collect_all(&mut smj).unwrap();
        prop_assert!(smj.reset().unwrap());
        prop_assert_eq!(collect_all(&mut smj).unwrap(), first);
    }
}

#[test]
fn test_smj_duplicate_keys_on_both_sides() {
    // three 7s on the left, two on the right: six pairs for key 7
    let left = vec![
        Tuple::new(vec![7, 1]),
        Tuple::new(vec![7, 2]),
        Tuple::new(vec![7, 3]),
        Tuple::new(vec![9, 4]),
    ];
    let right = vec![
        Tuple::new(vec![7, 10]),
        Tuple::new(vec![7, 20]),
        Tuple::new(vec![8, 30]),
        Tuple::new(vec![9, 40]),
    ];
    let expected = reference_join(&left, &right);
    let l: Box<dyn SortedOperator> =
        Box::new(SortOperator::with_keys(scan("L", &["k", "a"], left), keys(&[0])).unwrap());
    let r: Box<dyn SortedOperator> =
        Box::new(SortOperator::with_keys(scan("R", &["k", "b"], right), keys(&[0])).unwrap());
    let mut smj = SortMergeJoinOperator::new(l, r, &[0], &[0], None).unwrap();
    let out = collect_all(&mut smj).unwrap();
    assert_eq!(out.len(), 7);
    assert_eq!(sorted(out), expected);
}

// ─── Sorting ────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_external_sort_matches_in_memory(
        rows in rows_strategy(2, 2500, 50),
        buffer_pages in 3usize..6,
    ) {
        let dir = tempdir().unwrap();
        let ctx = ExecContext::new(ExecConfig::default().with_temp_dir(dir.path()));

        let mut memory = SortOperator::with_keys(scan("T", &["a", "b"], rows.clone()), keys(&[0, 1])).unwrap();
        let expected = collect_all(&mut memory).unwrap();

        let mut external = ExternalSortOperator::with_keys(
            scan("T", &["a", "b"], rows),
            keys(&[0, 1]),
            buffer_pages,
            &ctx,
        ).unwrap();
        prop_assert_eq!(collect_all(&mut external).unwrap(), expected.clone());
        prop_assert!(external.reset().unwrap());
        prop_assert_eq!(collect_all(&mut external).unwrap(), expected);
        external.close();
        prop_assert_eq!(ctx.io_snapshot().live_runs(), 0);
    }

    #[test]
    fn prop_distinct_removes_exactly_duplicates(rows in rows_strategy(2, 200, 5)) {
        let sort = SortOperator::with_keys(scan("T", &["a", "b"], rows.clone()), keys(&[0, 1])).unwrap();
        let mut distinct = DistinctOperator::new(Box::new(sort));
        let out = collect_all(&mut distinct).unwrap();
        let mut expected = sorted(rows);
        expected.dedup();
        prop_assert_eq!(out, expected);
    }
}

#[test]
fn test_external_sort_of_page_file_cleans_up_runs() {
    let dir = tempdir().unwrap();
    let ctx = ExecContext::new(ExecConfig::default().with_temp_dir(dir.path()));
    let path = dir.path().join("T");
    // five pages of width 3 (340 tuples per page)
    let rows: Vec<Tuple> = (0..1700).map(|i| Tuple::new(vec![(i * 7919) % 1000, i, -i])).collect();
    write_relation(&path, 3, &rows, ctx.stats()).unwrap();

    let scan = TableScanOperator::open("T", &path, Header::for_table("T", &["a", "b", "c"]), &ctx).unwrap();
    let mut sort = ExternalSortOperator::with_keys(Box::new(scan), keys(&[0]), 3, &ctx).unwrap();
    let out = collect_all(&mut sort).unwrap();
    assert_eq!(out.len(), 1700);
    assert!(out.windows(2).all(|w| w[0].get(0) <= w[1].get(0)));
    assert!(ctx.io_snapshot().runs_created > 0);

    sort.close();
    assert_eq!(ctx.io_snapshot().live_runs(), 0);
}

#[test]
fn test_external_sort_rejects_small_budget() {
    let ctx = ExecContext::new(ExecConfig::default());
    assert!(ExternalSortOperator::with_keys(scan("T", &["a"], Vec::new()), keys(&[0]), 2, &ctx).is_err());
}
