//! Kind-specific run steps.

pub(crate) mod discovery;
pub(crate) mod generation;
pub(crate) mod harvest;
pub(crate) mod scoring;

/// Widens a `u32` config value into a SQL `LIMIT`.
pub(crate) fn sql_limit(value: u32) -> i64 {
    i64::from(value)
}
