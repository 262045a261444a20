//! CLI command implementations.

pub mod clear;
pub mod delete;
pub mod get;
pub mod list;
pub mod pending;
pub mod put;
pub mod status;

use anyhow::Result;
use offsync_types::Record;

/// Print records as pretty JSON, one document.
pub fn print_records(records: &[Record]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}
