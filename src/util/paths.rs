//! On-disk layout of the data directory
//!
//! ```text
//! <data_dir>/            ~/.devtools-ext unless overridden with --data-dir
//!   config.toml
//!   devtools.db          tool state record
//!   logs/devtools-ext.log
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

const DATA_DIR_NAME: &str = ".devtools-ext";
const DATABASE_FILE: &str = "devtools.db";
const CONFIG_FILE: &str = "config.toml";
const LOGS_DIR: &str = "logs";
const LOG_FILE: &str = "devtools-ext.log";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Fix the data directory for the rest of the process.
///
/// Only the first call counts; later calls are logged and ignored so every
/// path handed out agrees with the first.
pub fn init_data_dir(custom_path: Option<PathBuf>) -> PathBuf {
    let requested = custom_path.unwrap_or_else(default_data_dir);
    let active = DATA_DIR.get_or_init(|| requested.clone());
    if *active != requested {
        tracing::debug!(
            requested = %requested.display(),
            active = %active.display(),
            "Data directory already initialized"
        );
    }
    active.clone()
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
}

/// The active data directory, or the default one before [`init_data_dir`]
pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// Create the data and log directories if they are missing
pub fn ensure_data_dirs() -> io::Result<()> {
    std::fs::create_dir_all(logs_dir())
}

pub fn database_path() -> PathBuf {
    data_dir().join(DATABASE_FILE)
}

pub fn logs_dir() -> PathBuf {
    data_dir().join(LOGS_DIR)
}

pub fn log_file_path() -> PathBuf {
    logs_dir().join(LOG_FILE)
}

pub fn config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}
