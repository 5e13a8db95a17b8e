//! # minirel — physical query execution over paged integer relations
//!
//! minirel은 고정 폭 정수 튜플로 이루어진 페이지 파일 위에서 동작하는
//! 단일 노드 질의 실행 엔진입니다.
//!
//! ## 주요 특징
//!
//! - **Volcano 연산자**: `next` / `peek` / `reset` / `close` pull model
//! - **외부 정렬**: bounded-memory multi-pass merge sort
//! - **조인**: tuple nested loop, block nested loop, sort-merge
//! - **B+-Tree**: bulk load, clustered and unclustered range scans
//! - **비용 기반 옵티마이저**: union-find bounds, V-values, left-deep join order
//!
//! ## 빠른 시작
//!
//! ```rust
//! use minirel_core::{Catalog, Database, ExecConfig, JoinMethod};
//! use minirel_core::storage::{IoStats, write_relation};
//! use minirel_core::types::Tuple;
//! use std::sync::Arc;
//!
//! # fn main() -> minirel_core::MinirelResult<()> {
//! let dir = tempfile::tempdir()?;
//! let rows: Vec<Tuple> = (1..=6).map(|i| Tuple::new(vec![i, 100 * (i % 3)])).collect();
//! write_relation(&dir.path().join("T"), 2, &rows, Arc::new(IoStats::new()))?;
//!
//! let mut catalog = Catalog::new(dir.path());
//! catalog.add_table("T", "T", &["A", "B"]);
//! let config = ExecConfig::default()
//!     .with_join(JoinMethod::SortMerge)
//!     .with_temp_dir(dir.path());
//! let db = Database::with_catalog(catalog, config)?;
//!
//! let result = db.collect("SELECT A FROM T WHERE T.B = 100 ORDER BY A")?;
//! assert_eq!(result, vec![Tuple::new(vec![1]), Tuple::new(vec![4])]);
//! # Ok(())
//! # }
//! ```
//!
//! ## 실행 파이프라인
//!
//! ```text
//! SQL 문자열 → SqlParser → AST → LogicalPlanner → LogicalPlan
//!          → QueryOptimizer → PhysicalPlanner → operator tree → tuples
//! ```
//!
//! ## 모듈 구조
//!
//! - [`engine`] — 데이터베이스 파사드 ([`Database`])
//! - [`catalog`] — 테이블, 통계, 인덱스 정의 (JSON)
//! - [`sql`] — SQL 파서, 플래너, 최적화기, 실행기
//! - [`storage`] — 페이지 파일 포맷과 I/O 카운터
//! - [`index`] — 정적 B+-Tree

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod sql;
pub mod storage;
pub mod types;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::{ExecConfig, JoinMethod, SortMethod};
pub use engine::{Database, QueryResult};
pub use error::{MinirelError, MinirelResult};
pub use types::{ColumnRef, Header, Tuple};
