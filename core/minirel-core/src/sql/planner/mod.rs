//! SQL 플래너 모듈
//!
//! LogicalPlan을 생성하고 물리 연산자 트리로 변환합니다.

pub mod logical;
pub mod physical;
pub mod types;

// Re-export main types
pub use logical::LogicalPlanner;
pub use physical::{PhysicalPlanner, QueryBlock};
pub use types::*;
