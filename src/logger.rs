use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::constants::MAX_LOG_BYTES;

pub const ENV_LOG_FILTER: &str = "ACCESS_HELP_LOG";
pub const ENV_LOG_VERBOSE: &str = "ACCESS_HELP_LOG_VERBOSE";
pub const ENV_LOG_FILE: &str = "ACCESS_HELP_LOG_FILE";
pub const ENV_LOG_DIR: &str = "ACCESS_HELP_LOG_DIR";

/// Where and how much to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `access_help=debug`
    pub filter: String,
    pub verbose: bool,
    /// Also append to a log file in `dir`
    pub file_enabled: bool,
    pub dir: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            verbose: false,
            file_enabled: false,
            dir: PathBuf::from("."),
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let verbose = lookup(ENV_LOG_VERBOSE).map(|v| v == "1").unwrap_or(false);
        let file_enabled = lookup(ENV_LOG_FILE).map(|v| v == "1").unwrap_or(false);

        Self {
            filter: lookup(ENV_LOG_FILTER)
                .filter(|f| !f.trim().is_empty())
                .unwrap_or(defaults.filter),
            verbose,
            file_enabled,
            dir: lookup(ENV_LOG_DIR).map(PathBuf::from).unwrap_or(defaults.dir),
        }
    }

    /// Log file path; debug and release builds write to different files
    pub fn log_path(&self) -> PathBuf {
        let filename = if cfg!(debug_assertions) {
            "access-help-dev.log"
        } else {
            "access-help.log"
        };
        self.dir.join(filename)
    }

    fn directive(&self) -> String {
        if self.verbose {
            "debug".to_string()
        } else {
            self.filter.clone()
        }
    }
}

fn rotate_if_needed(path: &Path) {
    if let Ok(meta) = fs::metadata(path) {
        if meta.len() > MAX_LOG_BYTES {
            let backup = path.with_extension("log.bak");
            let _ = fs::remove_file(&backup);
            let _ = fs::rename(path, &backup);
        }
    }
}

/// Install the global tracing subscriber.
///
/// Console output goes to stderr; the file layer is added when enabled and
/// the file can be opened. Returns false if a subscriber was already set.
pub fn init_logger(settings: &LogSettings) -> bool {
    let filter =
        EnvFilter::try_new(settings.directive()).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = if settings.file_enabled {
        let path = settings.log_path();
        let _ = fs::create_dir_all(&settings.dir);
        rotate_if_needed(&path);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
            .map(|file| {
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
            })
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .is_ok()
}
