//! TableScan Operator — Sequential tuple emission from a base page file

use crate::error::MinirelResult;
use crate::sql::executor::context::ExecContext;
use crate::sql::executor::operators::{Lookahead, TupleSource};
use crate::storage::PageReader;
use crate::types::{Header, Tuple};
use std::path::{Path, PathBuf};

/// 테이블 스캔 연산자 — 페이지 파일의 튜플을 저장 순서대로 반환
pub struct TableScan {
    table: String,
    path: PathBuf,
    header: Header,
    reader: PageReader,
}

pub type TableScanOperator = Lookahead<TableScan>;

impl TableScanOperator {
    /// Open `path` for scanning. A missing file or one whose tuple width
    /// disagrees with `header` fails here, not mid-query.
    pub fn open(table: &str, path: &Path, header: Header, ctx: &ExecContext) -> MinirelResult<Self> {
        let mut reader = PageReader::open(path, ctx.stats())?;
        reader.expect_width(header.len())?;
        Ok(Lookahead::wrap(TableScan {
            table: table.to_string(),
            path: path.to_path_buf(),
            header,
            reader,
        }))
    }
}

impl TableScan {
    /// Get the table name this operator scans.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TupleSource for TableScan {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        self.reader.next_tuple()
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.reader.reset()?;
        Ok(true)
    }

    fn release(&mut self) {
        self.reader.close();
    }

    fn name(&self) -> &'static str {
        "TableScan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::executor::operators::PhysicalOperator;
    use crate::storage::write_relation;
    use tempfile::tempdir;

    #[test]
    fn test_scan_emits_storage_order_and_replays() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Sailors");
        let ctx = ExecContext::default();
        let rows = vec![
            Tuple::new(vec![1, 200, 50]),
            Tuple::new(vec![2, 200, 200]),
            Tuple::new(vec![3, 100, 105]),
        ];
        write_relation(&path, 3, &rows, ctx.stats()).unwrap();

        let header = Header::for_table("Sailors", &["A", "B", "C"]);
        let mut scan = TableScanOperator::open("Sailors", &path, header, &ctx).unwrap();
        let mut first = Vec::new();
        while let Some(t) = scan.next().unwrap() {
            first.push(t);
        }
        assert_eq!(first, rows);

        assert!(scan.reset().unwrap());
        let mut second = Vec::new();
        while let Some(t) = scan.next().unwrap() {
            second.push(t);
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_fails_at_open() {
        let dir = tempdir().unwrap();
        let header = Header::for_table("X", &["A"]);
        let result =
            TableScanOperator::open("X", &dir.path().join("X"), header, &ExecContext::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_width_mismatch_fails_at_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("R");
        let ctx = ExecContext::default();
        write_relation(&path, 2, &[Tuple::new(vec![1, 1]), Tuple::new(vec![2, 2])], ctx.stats()).unwrap();

        let header = Header::for_table("R", &["A", "B", "C"]);
        assert!(matches!(
            TableScanOperator::open("R", &path, header, &ctx),
            Err(crate::error::MinirelError::Schema(_))
        ));
        let header = Header::for_table("R", &["A", "B"]);
        assert!(TableScanOperator::open("R", &path, header, &ctx).is_ok());
    }

    #[test]
    fn test_close_ends_stream() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("T");
        let ctx = ExecContext::default();
        write_relation(&path, 1, &[Tuple::new(vec![1])], ctx.stats()).unwrap();
        let mut scan =
            TableScanOperator::open("T", &path, Header::for_table("T", &["A"]), &ctx).unwrap();
        scan.close();
        assert!(scan.next().unwrap().is_none());
    }
}
