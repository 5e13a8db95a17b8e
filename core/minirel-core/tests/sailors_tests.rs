// Sailors 종단 간 테스트 — SQL 텍스트부터 튜플까지
//
// Sailors(A, B, C), Reserves(G, H), Boats(D, E, F) written as page files,
// registered in a catalog and queried through `Database`.

use minirel_core::storage::{IoStats, write_relation};
use minirel_core::{Catalog, Database, ExecConfig, JoinMethod, MinirelError, SortMethod, Tuple};
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

// ─── Helpers ────────────────────────────────────────────

fn tuples(rows: &[&[i32]]) -> Vec<Tuple> {
    rows.iter().map(|r| Tuple::new(r.to_vec())).collect()
}

fn write(dir: &Path, name: &str, width: usize, rows: &[&[i32]]) {
    write_relation(&dir.join(name), width, &tuples(rows), Arc::new(IoStats::new())).unwrap();
}

fn sailors_db(config: ExecConfig) -> (TempDir, Database) {
    minirel_core::logging::init_test();
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "Sailors",
        3,
        &[
            &[1, 200, 50],
            &[2, 200, 200],
            &[3, 100, 105],
            &[4, 100, 50],
            &[5, 100, 500],
            &[6, 300, 400],
        ],
    );
    write(
        dir.path(),
        "Reserves",
        2,
        &[&[1, 101], &[1, 102], &[1, 103], &[2, 101], &[3, 102], &[4, 104]],
    );
    write(
        dir.path(),
        "Boats",
        3,
        &[
            &[101, 2, 3],
            &[102, 3, 4],
            &[104, 104, 2],
            &[103, 1, 1],
            &[107, 2, 8],
        ],
    );
    let mut catalog = Catalog::new(dir.path());
    catalog.add_table("Sailors", "Sailors", &["A", "B", "C"]);
    catalog.add_table("Reserves", "Reserves", &["G", "H"]);
    catalog.add_table("Boats", "Boats", &["D", "E", "F"]);
    let config = config.with_temp_dir(dir.path());
    let mut db = Database::with_catalog(catalog, config).unwrap();
    db.analyze().unwrap();
    (dir, db)
}

fn all_join_methods() -> Vec<JoinMethod> {
    vec![
        JoinMethod::TupleNestedLoop,
        JoinMethod::BlockNestedLoop { buffer_pages: 1 },
        JoinMethod::BlockNestedLoop { buffer_pages: 5 },
        JoinMethod::SortMerge,
    ]
}

fn sorted(mut rows: Vec<Tuple>) -> Vec<Tuple> {
    rows.sort();
    rows
}

// ─── Scenarios ──────────────────────────────────────────

#[test]
fn test_where_b_equals_100() {
    let (_dir, db) = sailors_db(ExecConfig::default());
    let rows = db.collect("SELECT * FROM Sailors WHERE Sailors.B = 100").unwrap();
    assert_eq!(
        rows,
        tuples(&[&[3, 100, 105], &[4, 100, 50], &[5, 100, 500]])
    );
}

#[test]
fn test_order_by_b_c() {
    for sort in [SortMethod::InMemory, SortMethod::External { buffer_pages: 3 }] {
        let (_dir, db) = sailors_db(ExecConfig::default().with_sort(sort));
        let rows = db.collect("SELECT * FROM Sailors ORDER BY Sailors.B, Sailors.C").unwrap();
        assert_eq!(rows[0], Tuple::new(vec![4, 100, 50]));
        assert_eq!(rows.len(), 6);
        assert!(rows.windows(2).all(|w| (w[0].get(1), w[0].get(2)) <= (w[1].get(1), w[1].get(2))));
    }
}

#[test]
fn test_cross_product_is_36_rows_for_every_join() {
    for join in all_join_methods() {
        let (_dir, db) = sailors_db(ExecConfig::default().with_join(join));
        let rows = db.collect("SELECT * FROM Sailors, Reserves").unwrap();
        assert_eq!(rows.len(), 36, "{:?}", join);
        assert!(rows.iter().all(|t| t.width() == 5));
    }
}

#[test]
fn test_three_way_join_same_multiset_for_every_join() {
    let sql = "SELECT * FROM Sailors, Reserves, Boats \
               WHERE Sailors.A = Reserves.G AND Reserves.H = Boats.D";
    let expected = tuples(&[
        &[1, 200, 50, 1, 101, 101, 2, 3],
        &[1, 200, 50, 1, 102, 102, 3, 4],
        &[1, 200, 50, 1, 103, 103, 1, 1],
        &[2, 200, 200, 2, 101, 101, 2, 3],
        &[3, 100, 105, 3, 102, 102, 3, 4],
        &[4, 100, 50, 4, 104, 104, 104, 2],
    ]);
    for join in all_join_methods() {
        let (_dir, db) = sailors_db(ExecConfig::default().with_join(join));
        assert_eq!(sorted(db.collect(sql).unwrap()), expected, "{:?}", join);
    }
}

#[test]
fn test_join_with_selection_and_projection() {
    let sql = "SELECT S.C, R.H FROM Sailors S, Reserves R \
               WHERE S.A = R.G AND S.B < 150 ORDER BY S.C";
    for join in all_join_methods() {
        let (_dir, db) = sailors_db(ExecConfig::default().with_join(join));
        assert_eq!(
            db.collect(sql).unwrap(),
            tuples(&[&[50, 104], &[105, 102]]),
            "{:?}",
            join
        );
    }
}

#[test]
fn test_transitive_equality_joins_non_adjacent_relations() {
    // Sailors and Boats share no direct edge; the shared union-find group
    // must still connect them whatever order the optimizer picks
    let sql = "SELECT * FROM Sailors, Reserves, Boats \
               WHERE Sailors.A = Reserves.G AND Reserves.G = Boats.E";
    for join in all_join_methods() {
        let (_dir, db) = sailors_db(ExecConfig::default().with_join(join));
        let rows = db.collect(sql).unwrap();
        assert!(rows.iter().all(|t| t.get(0) == t.get(3) && t.get(3) == t.get(6)));
        // A=1: 3 reservations × Boats with E=1 (one); A=2: 1 × two boats; A=3: 1 × one
        assert_eq!(rows.len(), 3 + 2 + 1, "{:?}", join);
    }
}

#[test]
fn test_distinct_with_order_by() {
    let (_dir, db) = sailors_db(ExecConfig::default());
    assert_eq!(
        db.collect("SELECT DISTINCT Sailors.B FROM Sailors ORDER BY Sailors.B").unwrap(),
        tuples(&[&[100], &[200], &[300]])
    );
    assert_eq!(
        db.collect("SELECT DISTINCT R.G FROM Reserves R").unwrap(),
        tuples(&[&[1], &[2], &[3], &[4]])
    );
}

#[test]
fn test_false_constant_and_empty_selection() {
    let (_dir, db) = sailors_db(ExecConfig::default());
    assert!(db.collect("SELECT * FROM Sailors WHERE 1 = 2").unwrap().is_empty());
    assert!(db.collect("SELECT * FROM Sailors WHERE Sailors.A > 1000").unwrap().is_empty());
    assert_eq!(db.collect("SELECT * FROM Sailors WHERE 1 < 2").unwrap().len(), 6);
}

#[test]
fn test_unknown_names_fail_at_plan_time() {
    let (_dir, db) = sailors_db(ExecConfig::default());
    assert!(db.query("SELECT * FROM Pirates").is_err());
    assert!(db.query("SELECT Sailors.Z FROM Sailors").is_err());
    assert!(db.query("SELECT * FROM Sailors WHERE Sailors.Q = 1").is_err());
}

#[test]
fn test_catalog_width_disagreeing_with_file_is_schema_error() {
    let (dir, db) = sailors_db(ExecConfig::default());
    write(dir.path(), "Narrow", 2, &[&[1, 1], &[2, 1]]);
    let mut catalog = db.catalog().clone();
    catalog.add_table("R", "Narrow", &["A", "B", "C"]);
    let db = Database::with_catalog(catalog, db.config().clone()).unwrap();
    assert!(matches!(
        db.query("SELECT * FROM R WHERE R.C = 1"),
        Err(MinirelError::Schema(_))
    ));
    assert!(matches!(
        db.query("SELECT * FROM Sailors, R WHERE Sailors.A = R.A"),
        Err(MinirelError::Schema(_))
    ));
}

#[test]
fn test_reset_replays_query() {
    let (_dir, db) = sailors_db(ExecConfig::default().with_join(JoinMethod::SortMerge));
    let mut result = db
        .query("SELECT * FROM Sailors, Reserves WHERE Sailors.A = Reserves.G")
        .unwrap();
    let first = result.collect().unwrap();
    assert_eq!(first.len(), 6);
    assert!(result.reset().unwrap());
    assert_eq!(result.collect().unwrap(), first);
}

#[test]
fn test_text_dump() {
    let (_dir, db) = sailors_db(ExecConfig::default());
    let mut out = Vec::new();
    let n = db
        .query("SELECT Sailors.A, Sailors.C FROM Sailors WHERE Sailors.B = 100")
        .unwrap()
        .dump_text(&mut out)
        .unwrap();
    assert_eq!(n, 3);
    assert_eq!(String::from_utf8(out).unwrap(), "3,105\n4,50\n5,500\n");
}

#[test]
fn test_binary_dump_scans_back() {
    let (dir, db) = sailors_db(ExecConfig::default());
    let out = dir.path().join("out");
    let n = db
        .query("SELECT * FROM Sailors WHERE Sailors.B = 200")
        .unwrap()
        .dump_binary(&out)
        .unwrap();
    assert_eq!(n, 2);

    let mut catalog = db.catalog().clone();
    catalog.add_table("Out", "out", &["A", "B", "C"]);
    let db = Database::with_catalog(catalog, db.config().clone()).unwrap();
    assert_eq!(
        db.collect("SELECT * FROM Out").unwrap(),
        tuples(&[&[1, 200, 50], &[2, 200, 200]])
    );
}
