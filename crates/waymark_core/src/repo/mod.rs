//! File-backed persistence for worlds and image assets.
//!
//! # Responsibility
//! - Map worlds to `<root>/<name>.json` registry files.
//! - Copy user images into the managed images directory.
//! - Keep JSON wire details out of the service layer.
//!
//! # Invariants
//! - Registry loads never fail; corrupt files degrade to empty worlds.
//!   Destructive maintenance uses the strict load path instead.
//! - Registry saves replace the file via temp-write plus rename.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub mod image_store;
pub mod registry_file;
pub mod world_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage error for world files and image assets.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem operation failed on `path`.
    Io { path: PathBuf, source: io::Error },
    /// World could not be encoded as JSON.
    Serialize(serde_json::Error),
    /// Registry file exists but does not decode cleanly.
    Corrupt { path: PathBuf, reason: String },
    /// A world with the sanitized name already has a registry file.
    WorldExists(String),
    /// Sanitized name cannot be used as a file name.
    InvalidWorldName(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Serialize(err) => write!(f, "failed to encode world: {err}"),
            Self::Corrupt { path, reason } => {
                write!(f, "{} is damaged: {reason}", path.display())
            }
            Self::WorldExists(name) => write!(f, "world already exists: `{name}`"),
            Self::InvalidWorldName(name) => write!(f, "invalid world name: `{name}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::Corrupt { .. } | Self::WorldExists(_) | Self::InvalidWorldName(_) => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}
