//! Database Constructors — factory methods for creating Database instances

use crate::catalog::Catalog;
use crate::config::ExecConfig;
use crate::engine::Database;
use crate::error::MinirelResult;
use crate::sql::parser::SqlParser;
use std::path::Path;
use tracing::{info, instrument};

impl Database {
    /// Open the database described by a JSON catalog file. Relative table
    /// and index paths resolve against the catalog's directory.
    #[instrument]
    pub fn open(catalog_path: &Path) -> MinirelResult<Self> {
        let catalog = Catalog::load(catalog_path)?;
        info!(tables = catalog.table_names().count(), "database opened");
        Self::with_catalog(catalog, ExecConfig::default())
    }

    /// Wrap an in-memory catalog.
    pub fn with_catalog(catalog: Catalog, config: ExecConfig) -> MinirelResult<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            parser: SqlParser::new(),
        })
    }

    /// Write the catalog (including statistics and index leaf counts).
    #[instrument(skip(self))]
    pub fn save_catalog(&self, path: &Path) -> MinirelResult<()> {
        self.catalog.save(path)
    }
}
