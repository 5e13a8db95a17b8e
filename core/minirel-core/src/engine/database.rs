//! Database struct definition — the core data structure

use crate::catalog::Catalog;
use crate::config::ExecConfig;
use crate::sql::parser::SqlParser;

/// minirel 데이터베이스 엔진
///
/// Owns the catalog and the default execution settings. Queries never
/// mutate the database; `analyze` and `build_indexes` update the catalog
/// in memory and `save_catalog` persists it.
///
/// # 예제
///
/// ```rust,no_run
/// use minirel_core::Database;
/// use std::path::Path;
///
/// # fn main() -> minirel_core::MinirelResult<()> {
/// let db = Database::open(Path::new("./data/catalog.json"))?;
/// for tuple in db.collect("SELECT * FROM Sailors WHERE Sailors.B = 100")? {
///     println!("{}", tuple);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Database {
    pub(crate) catalog: Catalog,
    pub(crate) config: ExecConfig,
    pub(crate) parser: SqlParser,
}

impl Database {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ExecConfig) {
        self.config = config;
    }
}
