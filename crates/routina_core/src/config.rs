//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve the data directory, backend kind and log level.
//! - Open the configured backend behind a trait object.
//!
//! # Invariants
//! - `data_dir` is always absolute.
//! - Unset variables fall back to defaults; malformed ones are errors.

use crate::backend::{CollectionBackend, DbSource, LocalBackend, SqliteBackend};
use crate::logging::{default_log_level, normalize_level};
use log::info;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "ROUTINA_DATA_DIR";
pub const BACKEND_ENV: &str = "ROUTINA_BACKEND";
pub const LOG_LEVEL_ENV: &str = "ROUTINA_LOG_LEVEL";

const APP_DIR_NAME: &str = "routina";
const SQLITE_FILE_NAME: &str = "routina.sqlite3";
const LOG_DIR_NAME: &str = "logs";

/// Persistence backend selected at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Single JSON blob on disk.
    #[default]
    Local,
    /// SQLite database file.
    Sqlite,
}

impl BackendKind {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!(
                "unsupported backend `{other}`; expected local|sqlite"
            )),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Sqlite => "sqlite",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    pub log_level: &'static str,
}

impl AppConfig {
    /// Reads `ROUTINA_DATA_DIR`, `ROUTINA_BACKEND` and `ROUTINA_LOG_LEVEL`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = match value(DATA_DIR_ENV) {
            Some(dir) => absolute_dir(DATA_DIR_ENV, dir.trim())?,
            None => default_data_dir(&lookup)?,
        };
        let backend = value(BACKEND_ENV)
            .map(|raw| BackendKind::parse(&raw))
            .transpose()?
            .unwrap_or_default();
        let log_level = value(LOG_LEVEL_ENV)
            .map(|raw| normalize_level(&raw))
            .transpose()?
            .unwrap_or_else(default_log_level);

        Ok(Self {
            data_dir,
            backend,
            log_level,
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(SQLITE_FILE_NAME)
    }
}

/// Opens the configured backend.
///
/// The SQLite backend connects lazily, so this never touches the database.
pub fn open_backend(config: &AppConfig) -> Box<dyn CollectionBackend> {
    info!(
        "event=backend_select module=config status=ok backend={} data_dir={}",
        config.backend,
        config.data_dir.display()
    );
    match config.backend {
        BackendKind::Local => Box::new(LocalBackend::in_dir(&config.data_dir)),
        BackendKind::Sqlite => Box::new(SqliteBackend::new(DbSource::File(config.sqlite_path()))),
    }
}

fn absolute_dir(key: &str, raw: &str) -> Result<PathBuf, String> {
    let path = Path::new(raw);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Err(format!("{key} must be an absolute path, got `{raw}`"))
    }
}

fn default_data_dir(lookup: &impl Fn(&str) -> Option<String>) -> Result<PathBuf, String> {
    if let Some(state_home) = lookup("XDG_STATE_HOME").filter(|dir| Path::new(dir).is_absolute()) {
        return Ok(PathBuf::from(state_home).join(APP_DIR_NAME));
    }
    if let Some(home) = lookup("HOME").filter(|dir| Path::new(dir).is_absolute()) {
        return Ok(PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(APP_DIR_NAME));
    }
    if let Some(app_data) = lookup("APPDATA").filter(|dir| Path::new(dir).is_absolute()) {
        return Ok(PathBuf::from(app_data).join(APP_DIR_NAME));
    }
    Err(format!(
        "cannot resolve a data directory; set {DATA_DIR_ENV}"
    ))
}
