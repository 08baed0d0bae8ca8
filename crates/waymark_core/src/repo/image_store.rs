//! Managed copies of user-supplied images.
//!
//! # Responsibility
//! - Copy screenshots into the images directory under generated names.
//! - Enumerate and remove managed files for maintenance sweeps.
//!
//! # Invariants
//! - Names follow `<prefix>_<YYYYMMDDHHMMSS>[_<n>].<ext>`.
//! - Only files matching that pattern count as managed; anything else a user
//!   drops into the directory is never listed or removed.
//! - `store` never overwrites an existing managed file.
//! - Source files are not validated beyond being readable.

use crate::repo::{StoreError, StoreResult};
use chrono::{DateTime, Local};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Prefix for images attached on create.
pub const CREATE_PREFIX: &str = "img";
/// Prefix for images swapped in on edit.
pub const EDIT_PREFIX: &str = "img_edit";

const DEFAULT_EXTENSION: &str = "png";
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

static MANAGED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^img(?:_edit)?_\d{14}(?:_\d+)?\.[A-Za-z0-9]+$").expect("valid image name regex")
});

/// Images directory owned by one storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies `source` into the images directory and returns the stored path.
    ///
    /// # Errors
    /// - `StoreError::Io` when the directory cannot be created, the target
    ///   cannot be reserved, or `source` cannot be read.
    pub fn store(&self, source: &Path, prefix: &str) -> StoreResult<PathBuf> {
        self.store_at(source, prefix, Local::now())
    }

    fn store_at(&self, source: &Path, prefix: &str, now: DateTime<Local>) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|err| StoreError::io(&self.dir, err))?;

        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let stem = format!("{prefix}_{}", now.format(STAMP_FORMAT));

        let target = self.reserve(&stem, &extension)?;
        if let Err(err) = fs::copy(source, &target) {
            let _ = fs::remove_file(&target);
            error!(
                "event=image_store module=repo status=error source={} error={}",
                source.display(),
                err
            );
            return Err(StoreError::io(source, err));
        }

        info!(
            "event=image_store module=repo status=ok file={}",
            target.display()
        );
        Ok(target)
    }

    /// Creates an empty placeholder under the first free name.
    fn reserve(&self, stem: &str, extension: &str) -> StoreResult<PathBuf> {
        let mut attempt = 0_u32;
        loop {
            let name = if attempt == 0 {
                format!("{stem}.{extension}")
            } else {
                format!("{stem}_{attempt}.{extension}")
            };
            let candidate = self.dir.join(name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(_) => return Ok(candidate),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(err) => return Err(StoreError::io(&candidate, err)),
            }
        }
    }

    /// Lists managed image files, sorted by path.
    ///
    /// Subdirectories and files not named by `store` are skipped. A missing
    /// directory yields an empty list.
    pub fn list(&self) -> StoreResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.dir, err)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&self.dir, err))?;
            let path = entry.path();
            if path.is_file() && is_managed_name(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Returns whether `path` points directly inside this images directory.
    ///
    /// Both sides are canonicalized when they exist, so `..` segments and
    /// symlinked roots compare equal to the plain spelling.
    pub fn owns(&self, path: &Path) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        if parent == self.dir {
            return true;
        }
        match (fs::canonicalize(parent), fs::canonicalize(&self.dir)) {
            (Ok(parent), Ok(dir)) => parent == dir,
            _ => false,
        }
    }

    /// Deletes one managed file. Missing files are ignored.
    pub fn remove(&self, path: &Path) -> StoreResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }
}

fn is_managed_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| MANAGED_NAME_RE.is_match(name))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{is_managed_name, ImageStore, CREATE_PREFIX, EDIT_PREFIX};
    use crate::repo::StoreError;
    use chrono::{Local, TimeZone};
    use std::path::Path;

    #[test]
    fn store_copies_bytes_under_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("shot.PNG");
        std::fs::write(&source, b"pixels").unwrap();
        let store = ImageStore::new(dir.path().join("images"));
        let now = Local.with_ymd_and_hms(2024, 3, 14, 9, 30, 5).unwrap();

        let stored = store.store_at(&source, CREATE_PREFIX, now).unwrap();

        assert_eq!(
            stored.file_name().unwrap().to_str().unwrap(),
            "img_20240314093005.png"
        );
        assert_eq!(std::fs::read(&stored).unwrap(), b"pixels");
        assert!(store.owns(&stored));
    }

    #[test]
    fn store_within_same_second_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first_source = dir.path().join("a.jpg");
        let second_source = dir.path().join("b.jpg");
        std::fs::write(&first_source, b"first").unwrap();
        std::fs::write(&second_source, b"second").unwrap();
        let store = ImageStore::new(dir.path().join("images"));
        let now = Local.with_ymd_and_hms(2024, 3, 14, 9, 30, 5).unwrap();

        let first = store.store_at(&first_source, EDIT_PREFIX, now).unwrap();
        let second = store.store_at(&second_source, EDIT_PREFIX, now).unwrap();

        assert_ne!(first, second);
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "img_edit_20240314093005_1.jpg"
        );
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn store_defaults_to_png_without_source_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clipboard");
        std::fs::write(&source, b"pixels").unwrap();
        let store = ImageStore::new(dir.path().join("images"));

        let stored = store.store(&source, CREATE_PREFIX).unwrap();
        assert_eq!(stored.extension().unwrap(), "png");
    }

    #[test]
    fn store_reports_missing_source_and_leaves_no_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"));

        let err = store
            .store(&dir.path().join("missing"), CREATE_PREFIX)
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn managed_names_cover_create_edit_and_collision_suffixes() {
        assert!(is_managed_name(Path::new("img_20240314093005.png")));
        assert!(is_managed_name(Path::new("img_edit_20240314093005_3.jpg")));
        assert!(!is_managed_name(Path::new("notes.txt")));
        assert!(!is_managed_name(Path::new("img_2024.png")));
    }

    #[test]
    fn list_skips_subdirectories_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"));
        std::fs::create_dir_all(store.dir().join("img_20240314093005.png")).unwrap();
        std::fs::write(store.dir().join("readme.txt"), b"keep me").unwrap();
        let managed = store.dir().join("img_20240314093006.png");
        std::fs::write(&managed, b"pixels").unwrap();

        assert_eq!(store.list().unwrap(), vec![managed]);
    }

    #[test]
    fn owns_compares_canonical_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"));
        std::fs::create_dir_all(store.dir()).unwrap();
        let detour = dir
            .path()
            .join("images")
            .join("..")
            .join("images")
            .join("img_20240314093005.png");

        assert!(store.owns(&detour));
        assert!(!store.owns(&dir.path().join("img_20240314093005.png")));
    }

    #[test]
    fn list_on_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }
}
