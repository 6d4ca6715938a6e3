use patentdraft_core::config::{parse_config, Configuration};
use patentdraft_core::error::ConfigError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// `<config_dir>/patentdraft/config.json`, or `./config.json` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("patentdraft").join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Read a configuration file and merge it over the defaults, without validating.
pub fn read_config(path: &Path) -> Result<Configuration, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(ConfigError::Read(format!("{}: {e}", path.display()))),
    };

    parse_config(&text)
}

/// Read a configuration file, recovering every load error with the defaults.
fn read_or_default(path: &Path) -> Configuration {
    match read_config(path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{err}; using built-in defaults");
            Configuration::default()
        }
    }
}

/// Load the configuration for use.
///
/// A missing or unparsable file falls back to the defaults, but the result is
/// validated either way, so an absent credential surfaces here as
/// [`ConfigError::MissingCredential`].
pub fn load_config(path: &Path) -> Result<Configuration, ConfigError> {
    let config = read_or_default(path);
    config.validate()?;
    Ok(config)
}

/// Write the record as-is, creating parent directories when needed.
pub fn save_config(path: &Path, config: &Configuration) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| ConfigError::WriteFailed(format!("{}: {e}", parent.display())))?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ConfigError::WriteFailed(e.to_string()))?;

    fs::write(path, json + "\n")
        .map_err(|e| ConfigError::WriteFailed(format!("{}: {e}", path.display())))
}

/// Shared holder for the process configuration.
///
/// Readers get an `Arc` snapshot; a save swaps in a freshly loaded record, so
/// nobody ever sees a partially updated configuration and snapshots already
/// handed out keep their old values.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Arc<Configuration>>,
}

impl ConfigStore {
    /// Open the store, falling back to defaults when the file cannot be used.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = read_or_default(&path);

        Self {
            path,
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Open the store through [`load_config`], failing when the record is not usable.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load_config(&path)?;

        Ok(Self {
            path,
            current: RwLock::new(Arc::new(config)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Arc<Configuration> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Snapshot that has passed validation, ready to hand to a task.
    pub fn validated(&self) -> Result<Arc<Configuration>, ConfigError> {
        let config = self.snapshot();
        config.validate()?;
        Ok(config)
    }

    /// Persist `config`, then reload it from disk and replace the shared record.
    pub fn save(&self, config: &Configuration) -> Result<Arc<Configuration>, ConfigError> {
        save_config(&self.path, config)?;
        self.reload()
    }

    /// Re-read the file and replace the shared record with what it holds.
    pub fn reload(&self) -> Result<Arc<Configuration>, ConfigError> {
        let fresh = Arc::new(read_config(&self.path)?);

        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&fresh);
        log::info!("Configuration reloaded from {}", self.path.display());

        Ok(fresh)
    }
}
