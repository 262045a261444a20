//! Show queued changes.

use anyhow::Result;
use offsync_core::{plan_replay, ReplayAction};
use offsync_types::RecordKey;

use crate::config::Settings;

/// Run the pending command.
pub async fn run(settings: &Settings) -> Result<()> {
    let layer = settings.open().await?;
    let tokens = layer.dirty_keys().await?;

    if tokens.is_empty() {
        println!("Nothing pending.");
        return Ok(());
    }

    println!("{} pending change(s):", tokens.len());
    for token in tokens {
        let Some(entry) = layer.store().entry(&token).await? else {
            continue;
        };
        let plan = settings
            .config
            .primary_key
            .as_ref()
            .and_then(|pk| plan_replay(&token, &entry, pk));
        println!("  {:<24} {}", token, describe(plan.as_ref()));
    }
    Ok(())
}

/// One-line description of a planned replay.
///
/// Keys are shown the way `get` and `delete` take them: compound parts
/// separated by spaces.
fn describe(plan: Option<&ReplayAction>) -> String {
    match plan {
        Some(ReplayAction::Create { .. }) => "create (server assigns key)".to_string(),
        Some(ReplayAction::Update { key, .. }) => format!("update {}", key_args(key)),
        Some(ReplayAction::Delete { key }) => format!("delete {}", key_args(key)),
        None => "unknown (no primary key configured)".to_string(),
    }
}

fn key_args(key: &RecordKey) -> String {
    key.parts().join(" ")
}
