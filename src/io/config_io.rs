use std::fs;
use std::path::Path;

use crate::io::store::StoreError;
use crate::model::config::StoreConfig;

pub const CONFIG_FILE: &str = "config.toml";

const CONFIG_TEMPLATE: &str = r##"# prefmend store configuration

[storage]
# Persisted user object, relative to this directory.
state_file = "user.json"

[notify]
# How long each change notification stays on screen.
duration_ms = 6000

[log]
# Log filter used when RUST_LOG is not set (error, warn, info, debug, trace).
level = "warn"
"##;

/// Read and parse `config.toml` from the store directory.
pub fn read_config(store_dir: &Path) -> Result<StoreConfig, StoreError> {
    let path = store_dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| StoreError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Write the commented default config into the store directory.
pub fn write_default_config(store_dir: &Path) -> Result<(), StoreError> {
    let path = store_dir.join(CONFIG_FILE);
    fs::write(&path, CONFIG_TEMPLATE).map_err(|e| StoreError::WriteError { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn template_parses_to_defaults() {
        let config: StoreConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        let defaults = StoreConfig::default();
        assert_eq!(config.storage.state_file, defaults.storage.state_file);
        assert_eq!(config.notify.duration_ms, defaults.notify.duration_ms);
        assert_eq!(config.log.level, defaults.log.level);
    }

    #[test]
    fn write_then_read() {
        let tmp = TempDir::new().unwrap();
        write_default_config(tmp.path()).unwrap();
        let config = read_config(tmp.path()).unwrap();
        assert_eq!(config.notify.duration_ms, 6000);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[notify\nduration_ms = ").unwrap();
        assert!(matches!(
            read_config(tmp.path()),
            Err(StoreError::ConfigParseError(_))
        ));
    }

    #[test]
    fn missing_config_is_a_read_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            read_config(tmp.path()),
            Err(StoreError::ReadError { .. })
        ));
    }
}
