//! List cached records.

use anyhow::Result;

use super::print_records;
use crate::config::{params_from_conditions, Settings};

/// Run the list command.
pub async fn run(settings: &Settings, conditions: &[String]) -> Result<()> {
    let params = params_from_conditions(conditions)?;
    let layer = settings.open().await?;

    let records = layer.get_all(&params).await?;
    print_records(&records)
}
