//! Write a record to the cache.

use anyhow::{Context, Result};
use offsync_types::Record;
use serde_json::Value;

use crate::config::{record_key_from_args, Settings};

/// Run the put command.
///
/// The write is dirty: it will be replayed by the next reconciliation.
pub async fn run(settings: &Settings, key: &[String], json: &str) -> Result<()> {
    let record = parse_record(json)?;
    let key = record_key_from_args(key);
    let layer = settings.open().await?;

    let stored = layer
        .save(key.as_ref(), record)
        .await?
        .context("Local save returned no record")?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

/// Parse a JSON object from the command line.
pub fn parse_record(json: &str) -> Result<Record> {
    match serde_json::from_str::<Value>(json).context("Record is not valid JSON")? {
        Value::Object(record) => Ok(record),
        _ => anyhow::bail!("Record must be a JSON object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn only_objects_are_records() {
        assert!(parse_record(r#"{"a": 1}"#).is_ok());
        assert!(parse_record("[1, 2]").is_err());
        assert!(parse_record("{").is_err());
    }

    #[tokio::test]
    async fn put_then_pending() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path(), None, &["id".to_string()], None).unwrap();

        run(&settings, &[], r#"{"title": "draft"}"#).await.unwrap();
        run(&settings, &["42".to_string()], r#"{"id": "42"}"#)
            .await
            .unwrap();

        let layer = settings.open().await.unwrap();
        assert_eq!(layer.dirty_keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn put_without_key_needs_primary_key() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path(), None, &[], None).unwrap();

        assert!(run(&settings, &[], r#"{"title": "draft"}"#).await.is_err());
    }
}
