//! Configuration management for offsync.

use anyhow::{Context, Result};
use offsync_client::{NoRemote, SqliteMedium, SyncConfig, SyncLayer};
use offsync_types::{PrimaryKey, RecordKey};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Config file looked up in the data directory.
pub const CONFIG_FILE: &str = "offsync.toml";

/// Cache database in the data directory.
pub const CACHE_FILE: &str = "cache.db";

/// The layer every command runs against: local only, no remote.
pub type Layer = SyncLayer<NoRemote, SqliteMedium>;

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Sync layer configuration after command-line overrides.
    pub config: SyncConfig,
    /// Path of the cache database.
    pub cache_path: PathBuf,
    /// Config file that was loaded, if any.
    pub config_path: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from the data directory, an optional explicit
    /// config file and command-line overrides.
    pub fn load(
        data_dir: &Path,
        config_path: Option<&Path>,
        primary_key: &[String],
        prefix: Option<&str>,
    ) -> Result<Self> {
        let (mut config, loaded_from) = match config_path {
            Some(path) => (
                SyncConfig::from_file(path)
                    .with_context(|| format!("Invalid configuration file {}", path.display()))?,
                Some(path.to_path_buf()),
            ),
            None => {
                let default_path = data_dir.join(CONFIG_FILE);
                if default_path.exists() {
                    let config = SyncConfig::from_file(&default_path).with_context(|| {
                        format!("Invalid configuration file {}", default_path.display())
                    })?;
                    (config, Some(default_path))
                } else {
                    (SyncConfig::default(), None)
                }
            }
        };

        if let Some(pk) = primary_key_from_args(primary_key) {
            config.primary_key = Some(pk);
        }
        if let Some(prefix) = prefix {
            config.prefix = prefix.to_string();
        }
        config.validate().context("Invalid configuration")?;

        Ok(Self {
            config,
            cache_path: data_dir.join(CACHE_FILE),
            config_path: loaded_from,
        })
    }

    /// Open the cache and build a layer forced offline.
    pub async fn open(&self) -> Result<Layer> {
        let medium = SqliteMedium::open(&self.cache_path)
            .await
            .with_context(|| format!("Failed to open cache {}", self.cache_path.display()))?;
        let layer = SyncLayer::builder(NoRemote, medium)
            .config(self.config.clone())
            .filter(offsync_client::match_params)
            .build()
            .await
            .context("Failed to open sync layer")?;
        layer.set_connectivity_override(Some(false));
        Ok(layer)
    }
}

/// `--primary-key` values: one field, several for a compound key.
pub fn primary_key_from_args(fields: &[String]) -> Option<PrimaryKey> {
    match fields {
        [] => None,
        [field] => Some(PrimaryKey::field(field.as_str())),
        many => Some(PrimaryKey::compound(many.iter().cloned())),
    }
}

/// Key arguments: one value, several for a compound key.
pub fn record_key_from_args(parts: &[String]) -> Option<RecordKey> {
    match parts {
        [] => None,
        [single] => Some(RecordKey::single(single.as_str())),
        many => Some(RecordKey::compound(many.iter().cloned())),
    }
}

/// Parse `field=value` conditions into query params.
///
/// Values that parse as JSON keep their type (`n=1` matches the number 1);
/// anything else is a string.
pub fn params_from_conditions(conditions: &[String]) -> Result<Value> {
    let mut params = Map::new();
    for condition in conditions {
        let (field, raw) = condition
            .split_once('=')
            .with_context(|| format!("Expected FIELD=VALUE, got '{}'", condition))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        params.insert(field.to_string(), value);
    }
    Ok(Value::Object(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use offsync_client::DeliveryPolicy;
    use serde_json::json;
    use tempfile::tempdir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_config_file() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path(), None, &[], None).unwrap();

        assert_eq!(settings.config, SyncConfig::default());
        assert_eq!(settings.cache_path, dir.path().join(CACHE_FILE));
        assert!(settings.config_path.is_none());
    }

    #[test]
    fn data_dir_config_file_is_picked_up() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "primary_key = \"id\"\nprefix = \"app_\"\n\n[delivery]\nmode = \"acknowledged\"\n",
        )
        .unwrap();

        let settings = Settings::load(dir.path(), None, &[], None).unwrap();
        assert_eq!(settings.config.primary_key, Some(PrimaryKey::field("id")));
        assert_eq!(settings.config.prefix, "app_");
        assert_eq!(settings.config.delivery, DeliveryPolicy::acknowledged(3));
        assert!(settings.config_path.is_some());
    }

    #[test]
    fn arguments_override_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "primary_key = \"id\"\n").unwrap();

        let settings = Settings::load(
            dir.path(),
            None,
            &strings(&["org", "user"]),
            Some("other_"),
        )
        .unwrap();
        assert_eq!(
            settings.config.primary_key,
            Some(PrimaryKey::compound(["org", "user"]))
        );
        assert_eq!(settings.config.prefix, "other_");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let dir = tempdir().unwrap();
        assert!(Settings::load(dir.path(), None, &[], Some("")).is_err());
        let missing = dir.path().join("missing.toml");
        assert!(Settings::load(dir.path(), Some(missing.as_path()), &[], None).is_err());
    }

    #[test]
    fn key_arguments() {
        assert_eq!(record_key_from_args(&[]), None);
        assert_eq!(
            record_key_from_args(&strings(&["42"])),
            Some(RecordKey::single("42"))
        );
        assert_eq!(
            record_key_from_args(&strings(&["acme", "7"])),
            Some(RecordKey::compound(["acme", "7"]))
        );
    }

    #[test]
    fn conditions_become_params() {
        let params = params_from_conditions(&strings(&["n=1", "name=x", "flag=true"])).unwrap();
        assert_eq!(params, json!({"n": 1, "name": "x", "flag": true}));

        assert!(params_from_conditions(&strings(&["broken"])).is_err());
    }

    #[tokio::test]
    async fn open_builds_offline_layer() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path(), None, &strings(&["id"]), None).unwrap();

        let layer = settings.open().await.unwrap();
        assert!(!layer.is_online());
        assert!(settings.cache_path.exists());
    }
}
