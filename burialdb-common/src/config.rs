//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming the root folder
pub const ENV_ROOT_FOLDER: &str = "BURIALDB_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "burialdb.db";

/// Uploaded files live under this folder inside the root folder
pub const MEDIA_DIR: &str = "media";

/// Upload sub-folder for import source files
pub const IMPORT_UPLOAD_DIR: &str = "import";

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Optional settings read from `config.toml`
///
/// Every key is optional; a missing file is the same as an empty one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    pub page_size: Option<i64>,
    pub max_upload_bytes: Option<usize>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Page size for paginated listings (non-positive values fall back to the default)
    pub fn page_size(&self) -> i64 {
        self.page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
            .filter(|bytes| *bytes > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

/// Load the configuration file
///
/// An explicitly named file must exist and parse. Without one, the platform
/// config location is tried and a missing file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return TomlConfig::load(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => TomlConfig::load(&path),
        _ => Ok(TomlConfig::default()),
    }
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
        warn!("{} is set but empty, ignoring", env_var_name);
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Platform config file location
fn default_config_path() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/burialdb/config.toml first, then /etc/burialdb/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("burialdb").join("config.toml"));
        if let Some(path) = user_config {
            if path.exists() {
                return Some(path);
            }
        }
        Some(PathBuf::from("/etc/burialdb/config.toml"))
    } else {
        dirs::config_dir().map(|d| d.join("burialdb").join("config.toml"))
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("burialdb"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/burialdb"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("burialdb"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/burialdb"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("burialdb"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\burialdb"))
    } else {
        PathBuf::from("./burialdb_data")
    }
}

/// Layout of the resolved root folder
#[derive(Debug, Clone)]
pub struct RootFolder {
    path: PathBuf,
}

impl RootFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database_path(&self) -> PathBuf {
        self.path.join(DATABASE_FILE)
    }

    pub fn media_dir(&self) -> PathBuf {
        self.path.join(MEDIA_DIR)
    }

    /// Create the root folder and the upload folders if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.media_dir().join(IMPORT_UPLOAD_DIR))?;
        Ok(())
    }
}
