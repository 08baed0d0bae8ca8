//! Storage location and runtime configuration.
//!
//! # Responsibility
//! - Resolve the storage root holding world files and managed images.
//! - Create storage directories without aborting the caller.
//!
//! # Invariants
//! - `root` is absolute; relative input is anchored at the working directory
//!   once, when the config is built.
//! - `images_dir` always lives under `root`.
//! - Directory creation failure is logged, never raised.

use crate::logging::log_text;
use log::{info, warn};
use std::path::PathBuf;

/// Overrides the storage root when set.
pub const DATA_DIR_ENV: &str = "WAYMARK_DATA_DIR";
/// Overrides the default log level when set.
pub const LOG_LEVEL_ENV: &str = "WAYMARK_LOG_LEVEL";

const APP_DIR_NAME: &str = "WaymarkApp";
const STORAGE_DIR_NAME: &str = "waymark_data";
const IMAGES_DIR_NAME: &str = "images";

/// Filesystem layout for world registries and image assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding one `<world>.json` file per world.
    pub root: PathBuf,
    /// Directory holding copied image assets.
    pub images_dir: PathBuf,
}

impl StorageConfig {
    /// Uses `root` with the standard `images` subdirectory.
    ///
    /// A relative `root` is resolved against the current working directory
    /// so stored image paths stay valid from any later directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = absolute_root(root.into());
        let images_dir = root.join(IMAGES_DIR_NAME);
        Self { root, images_dir }
    }

    /// Resolves the storage root for this user.
    ///
    /// Order: `WAYMARK_DATA_DIR`, then the platform data directory
    /// (`<data_dir>/WaymarkApp/waymark_data`), then `./waymark_data`.
    pub fn resolve() -> Self {
        if let Some(root) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
            return Self::new(root);
        }
        match dirs::data_dir() {
            Some(base) => Self::new(base.join(APP_DIR_NAME).join(STORAGE_DIR_NAME)),
            None => Self::new(PathBuf::from(STORAGE_DIR_NAME)),
        }
    }

    /// Creates `root` and `images_dir` if missing.
    ///
    /// Returns whether both directories exist afterwards. Failures are logged
    /// and later writes surface their own I/O errors.
    pub fn ensure_dirs(&self) -> bool {
        let mut ready = true;
        for dir in [self.root.as_path(), self.images_dir.as_path()] {
            if let Err(err) = std::fs::create_dir_all(dir) {
                warn!(
                    "event=storage_init module=config status=degraded dir={} error={}",
                    dir.display(),
                    err
                );
                ready = false;
            }
        }
        if ready {
            info!(
                "event=storage_init module=config status=ok root={}",
                self.root.display()
            );
        }
        ready
    }

    /// Path of the registry file backing `world`.
    pub fn world_path(&self, world: &str) -> PathBuf {
        self.root.join(format!("{world}.json"))
    }
}

fn absolute_root(root: PathBuf) -> PathBuf {
    if root.is_absolute() {
        return root;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(&root),
        Err(err) => {
            warn!(
                "event=storage_init module=config status=degraded root={} reason=relative error={}",
                log_text(&root.to_string_lossy()),
                err
            );
            root
        }
    }
}

/// Returns the log level to use when the caller does not pass one.
///
/// `WAYMARK_LOG_LEVEL` wins; otherwise `debug` builds log at `debug` and
/// release builds at `info`.
pub fn default_log_level() -> String {
    match std::env::var(LOG_LEVEL_ENV) {
        Ok(level) if !level.trim().is_empty() => level,
        _ if cfg!(debug_assertions) => "debug".to_string(),
        _ => "info".to_string(),
    }
}
