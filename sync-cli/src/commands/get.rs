//! Show one record.

use anyhow::{Context, Result};

use crate::config::{record_key_from_args, Settings};

/// Run the get command.
pub async fn run(settings: &Settings, key: &[String]) -> Result<()> {
    let key = record_key_from_args(key).context("A key is required")?;
    let layer = settings.open().await?;

    match layer.get(&key).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => anyhow::bail!("No record under '{}'", key),
    }
    Ok(())
}
