use serde::{Deserialize, Serialize};

/// Configuration from `.prefmend/config.toml`. Every key has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Persisted user object, relative to the store directory.
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            state_file: default_state_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// How long each change notification stays visible.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            duration_ms: default_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_state_file() -> String {
    "user.json".to_string()
}

fn default_duration_ms() -> u64 {
    6000
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage.state_file, "user.json");
        assert_eq!(config.notify.duration_ms, 6000);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn partial_sections() {
        let config: StoreConfig = toml::from_str(
            r#"
[notify]
duration_ms = 1500

[storage]
"#,
        )
        .unwrap();
        assert_eq!(config.notify.duration_ms, 1500);
        assert_eq!(config.storage.state_file, "user.json");
    }
}
