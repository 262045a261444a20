//! Mark a record deleted.

use anyhow::{Context, Result};

use crate::config::{record_key_from_args, Settings};

/// Run the delete command.
pub async fn run(settings: &Settings, key: &[String]) -> Result<()> {
    let key = record_key_from_args(key).context("A key is required")?;
    let layer = settings.open().await?;

    if !layer.store().contains(&key).await? {
        anyhow::bail!("No record under '{}'", key);
    }
    layer.delete(&key).await?;
    println!("Marked '{}' deleted; it will be removed remotely on next sync", key);
    Ok(())
}
