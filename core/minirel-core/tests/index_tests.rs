// B+-Tree 인덱스 통합 테스트
//
// Bulk loading through `Database::build_indexes`, leaf fill, clustered
// rewrites, and index scans chosen by the optimizer.

use minirel_core::index::{BTreeIndex, Node};
use minirel_core::storage::{IoStats, read_relation, write_relation};
use minirel_core::{Catalog, Database, ExecConfig, Tuple};
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

// ─── Helpers ────────────────────────────────────────────

const ROWS: i32 = 3000;

/// Deterministic scatter: D is a permutation of 0..ROWS, E has 100
/// distinct values of 30 rows each, F is the row number.
fn boats_rows() -> Vec<Tuple> {
    (0..ROWS)
        .map(|i| Tuple::new(vec![(i * 7919) % ROWS, (i * 31) % 100, i]))
        .collect()
}

fn indexed_db(clustered_on: Option<&str>, order: usize) -> (TempDir, Database) {
    let dir = tempdir().unwrap();
    write_relation(&dir.path().join("Boats"), 3, &boats_rows(), Arc::new(IoStats::new())).unwrap();
    let mut catalog = Catalog::new(dir.path());
    catalog.add_table("Boats", "Boats", &["D", "E", "F"]);
    for column in ["D", "E"] {
        catalog
            .add_index("Boats", column, clustered_on == Some(column), order)
            .unwrap();
    }
    let config = ExecConfig::default().with_temp_dir(dir.path());
    let mut db = Database::with_catalog(catalog, config).unwrap();
    db.build_indexes().unwrap();
    db.analyze().unwrap();
    (dir, db)
}

fn leaves(path: &Path) -> Vec<Vec<i32>> {
    let mut index = BTreeIndex::open(path, Arc::new(IoStats::new())).unwrap();
    (1..=index.leaf_count())
        .map(|page| match index.read_node(page).unwrap() {
            Node::Leaf(entries) => entries.iter().map(|e| e.key).collect(),
            Node::Internal { .. } => panic!("page {} is not a leaf", page),
        })
        .collect()
}

fn sorted(mut rows: Vec<Tuple>) -> Vec<Tuple> {
    rows.sort();
    rows
}

fn index_path(db: &Database, column: &str) -> std::path::PathBuf {
    let meta = db.catalog().table("Boats").unwrap();
    let index = meta.indexes.iter().find(|i| i.column == column).unwrap();
    db.catalog().index_path("Boats", index).unwrap()
}

// ─── Bulk load ──────────────────────────────────────────

#[test]
fn test_build_records_leaf_counts() {
    let (_dir, db) = indexed_db(None, 8);
    let meta = db.catalog().table("Boats").unwrap();
    for index in &meta.indexes {
        let leaf_count = index.leaf_count.unwrap();
        assert!(leaf_count > 0);
        assert_eq!(leaves(&index_path(&db, &index.column)).len() as u64, leaf_count);
    }
}

#[test]
fn test_no_leaf_is_underfilled() {
    let order = 8;
    let (_dir, db) = indexed_db(None, order);
    // D is unique: 3000 keys over leaves of at most 2d entries. Each E
    // entry carries 30 rids, so 2d of them must still fit one page.
    let d_leaves = leaves(&index_path(&db, "D"));
    assert!(d_leaves.iter().all(|leaf| leaf.len() >= order && leaf.len() <= 2 * order));
    assert_eq!(d_leaves.iter().map(Vec::len).sum::<usize>(), ROWS as usize);

    // leaf keys ascend across the whole leaf level
    let keys: Vec<i32> = d_leaves.into_iter().flatten().collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));

    let e_leaves = leaves(&index_path(&db, "E"));
    assert_eq!(e_leaves.iter().map(Vec::len).sum::<usize>(), 100);
    assert!(e_leaves.iter().all(|leaf| leaf.len() >= order));
}

#[test]
fn test_clustered_index_rewrites_base_file() {
    let (dir, db) = indexed_db(Some("E"), 8);
    let rows = read_relation(&dir.path().join("Boats"), Arc::new(IoStats::new())).unwrap();
    assert_eq!(rows.len(), ROWS as usize);
    assert!(rows.windows(2).all(|w| w[0].get(1) <= w[1].get(1)));
    assert!(!dir.path().join("Boats.clustering").exists());

    // the unclustered D index was built after the rewrite and agrees with it
    let with_index = db.collect("SELECT * FROM Boats WHERE Boats.D >= 10 AND Boats.D < 20").unwrap();
    assert_eq!(with_index.len(), 10);
    assert!(with_index.iter().all(|t| (10..20).contains(&t.get(0))));
}

#[test]
fn test_second_clustered_index_rejected() {
    let dir = tempdir().unwrap();
    let mut catalog = Catalog::new(dir.path());
    catalog.add_table("Boats", "Boats", &["D", "E", "F"]);
    catalog.add_index("Boats", "D", true, 4).unwrap();
    assert!(catalog.add_index("Boats", "E", true, 4).is_err());
    assert!(catalog.add_index("Boats", "Z", false, 4).is_err());
    assert!(catalog.add_index("Boats", "E", false, 0).is_err());
}

// ─── Index scans ────────────────────────────────────────

#[test]
fn test_index_and_scan_agree_on_ranges() {
    for clustered in [None, Some("E")] {
        let (_dir, db) = indexed_db(clustered, 6);
        for sql in [
            "SELECT * FROM Boats WHERE Boats.E = 42",
            "SELECT * FROM Boats WHERE Boats.E > 97",
            "SELECT * FROM Boats WHERE Boats.D <= 5",
            "SELECT * FROM Boats WHERE Boats.D >= 100 AND Boats.D <= 110 AND Boats.E < 50",
            "SELECT * FROM Boats WHERE 1000 < Boats.D AND Boats.D < 1003",
            "SELECT * FROM Boats WHERE Boats.D > 5000",
        ] {
            let indexed = db.query_with(sql, db.config().clone().with_indexes(true)).unwrap().collect().unwrap();
            let scanned = db.query_with(sql, db.config().clone().with_indexes(false)).unwrap().collect().unwrap();
            assert_eq!(sorted(indexed), sorted(scanned), "{} ({:?})", sql, clustered);
        }
    }
}

#[test]
fn test_selective_index_reads_fewer_pages() {
    let (_dir, db) = indexed_db(Some("D"), 8);
    let sql = "SELECT * FROM Boats WHERE Boats.D >= 7 AND Boats.D <= 9";

    let mut indexed = db.query_with(sql, db.config().clone().with_indexes(true)).unwrap();
    assert_eq!(indexed.collect().unwrap().len(), 3);
    let indexed_reads = indexed.io().pages_read;

    let mut scanned = db.query_with(sql, db.config().clone().with_indexes(false)).unwrap();
    assert_eq!(scanned.collect().unwrap().len(), 3);
    // 3000 rows of width 3 span 9 pages
    assert!(scanned.io().pages_read >= 9);
    assert!(indexed_reads < scanned.io().pages_read);
}

#[test]
fn test_index_scan_reset_replays() {
    let (_dir, db) = indexed_db(None, 5);
    let mut result = db.query("SELECT Boats.F FROM Boats WHERE Boats.E = 7").unwrap();
    let first = result.collect().unwrap();
    assert_eq!(first.len(), 30);
    assert!(result.reset().unwrap());
    assert_eq!(result.collect().unwrap(), first);
}

#[test]
fn test_catalog_round_trip_keeps_indexes() {
    let (dir, db) = indexed_db(None, 5);
    let path = dir.path().join("catalog.json");
    db.save_catalog(&path).unwrap();
    let reopened = Database::open(&path).unwrap();
    let meta = reopened.catalog().table("Boats").unwrap();
    assert_eq!(meta.indexes.len(), 2);
    assert!(meta.indexes.iter().all(|i| i.leaf_count.is_some()));
    assert!(meta.stats.is_some());
    assert_eq!(
        reopened.collect("SELECT * FROM Boats WHERE Boats.D = 1234").unwrap().len(),
        1
    );
}

#[test]
fn test_duplicate_heavy_column_packs_leaves_by_bytes() {
    // 20 keys of 300 rows each: one entry fills most of a page, so leaves
    // hold a single entry whatever the order allows
    let dir = tempdir().unwrap();
    let rows: Vec<Tuple> = (0..6000).map(|i| Tuple::new(vec![i % 20, i])).collect();
    write_relation(&dir.path().join("Heavy"), 2, &rows, Arc::new(IoStats::new())).unwrap();
    for order in [1, 4] {
        let mut catalog = Catalog::new(dir.path());
        catalog.add_table("Heavy", "Heavy", &["K", "V"]);
        catalog.add_index("Heavy", "K", false, order).unwrap();
        let mut db = Database::with_catalog(catalog, ExecConfig::default().with_temp_dir(dir.path())).unwrap();
        db.build_indexes().unwrap();
        db.analyze().unwrap();

        let meta = db.catalog().table("Heavy").unwrap();
        assert_eq!(meta.indexes[0].leaf_count, Some(20), "order {}", order);

        let sql = "SELECT * FROM Heavy WHERE Heavy.K = 7";
        let indexed = db.query_with(sql, db.config().clone().with_indexes(true)).unwrap().collect().unwrap();
        assert_eq!(indexed.len(), 300);
        assert!(indexed.iter().all(|t| t.get(0) == 7 && t.get(1) % 20 == 7));
    }
}
