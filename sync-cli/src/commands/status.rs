//! Show cache status.

use anyhow::Result;
use offsync_client::DeliveryPolicy;

use crate::config::Settings;

/// Run the status command.
pub async fn run(settings: &Settings) -> Result<()> {
    let layer = settings.open().await?;
    let index = layer.store().index().await?;
    let pending = layer.dirty_keys().await?;
    let config = &settings.config;

    println!("=== offsync status ===");
    println!();

    println!("Cache:");
    println!("  Path:    {}", settings.cache_path.display());
    println!("  Prefix:  {}", config.prefix);
    println!("  Records: {}", index.len());
    println!("  Pending: {}", pending.len());
    println!();

    println!("Configuration:");
    match &settings.config_path {
        Some(path) => println!("  File:        {}", path.display()),
        None => println!("  File:        (defaults)"),
    }
    match &config.primary_key {
        Some(pk) => println!("  Primary key: {}", pk),
        None => println!("  Primary key: NOT SET"),
    }
    println!("  Settle:      {} ms", config.sync_settle_delay_ms);
    println!("  Delivery:    {}", describe_delivery(&config.delivery));
    println!();

    println!("Connection:");
    println!("  Status: OFFLINE (local cache only)");

    Ok(())
}

fn describe_delivery(policy: &DeliveryPolicy) -> String {
    match policy {
        DeliveryPolicy::BestEffort => "best-effort".to_string(),
        DeliveryPolicy::Acknowledged { max_attempts } => {
            format!("acknowledged ({} attempts)", max_attempts)
        }
    }
}
