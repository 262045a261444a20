//! Wipe the cache.

use anyhow::Result;

use crate::config::Settings;

/// Run the clear command.
pub async fn run(settings: &Settings) -> Result<()> {
    let layer = settings.open().await?;
    let pending = layer.dirty_keys().await?.len();

    let removed = layer.clear_local().await?;
    println!("Removed {} key(s) under '{}'", removed, settings.config.prefix);
    if pending > 0 {
        println!("Discarded {} unsynced change(s)", pending);
    }
    Ok(())
}
