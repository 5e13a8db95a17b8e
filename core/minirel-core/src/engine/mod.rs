//! Database Engine Module
//!
//! [`Database`] ties the catalog, the SQL front-end and the physical
//! planner together. Maintenance entry points (statistics, index builds)
//! live next to the query interface.

pub mod constructors;
pub mod database;
pub mod index;
pub mod sql_interface;
pub mod statistics;

pub use database::Database;
pub use sql_interface::QueryResult;
