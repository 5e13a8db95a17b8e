//! 로깅 초기화
//!
//! Operators, the optimizer and the engine emit `tracing` events at all
//! times. A subscriber is only installed through this module, and only
//! when the `logging` feature is enabled; without it every function here
//! is a no-op apart from directive validation.
//!
//! Useful targets:
//!
//! - `minirel_core::sql::optimizer` — chosen join order and access paths (`info`)
//! - `minirel_core::sql::executor` — sort runs and merge passes (`debug`)
//! - `minirel_core::index` — bulk load summaries (`info`)

use crate::error::{MinirelError, MinirelResult};

const CRATE_TARGET: &str = "minirel_core";
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Filter directive enabling `level` for this crate only, e.g.
/// `minirel_core=debug`.
pub fn filter_directive(level: &str) -> MinirelResult<String> {
    let level = level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(MinirelError::InvalidConfig(format!(
            "unknown log level '{}', expected one of {}",
            level,
            LEVELS.join(", ")
        )));
    }
    Ok(format!("{}={}", CRATE_TARGET, level))
}

/// Install a subscriber honouring `RUST_LOG`, falling back to `info` for
/// this crate.
///
/// ```rust
/// minirel_core::logging::init();
/// ```
pub fn init() {
    // "info" is always a valid level
    let _ = init_with_level("info");
}

#[cfg(feature = "logging")]
pub fn init_with_level(level: &str) -> MinirelResult<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let directive = filter_directive(level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    // a second install (e.g. from another test) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();
    Ok(())
}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(level: &str) -> MinirelResult<()> {
    filter_directive(level).map(|_| ())
}

/// Debug-level output captured by the test harness.
#[cfg(feature = "logging")]
pub fn init_test() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(EnvFilter::new(format!("{}=debug", CRATE_TARGET)))
        .with_test_writer()
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}
