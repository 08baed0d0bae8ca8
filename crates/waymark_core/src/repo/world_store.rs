//! World enumeration, creation and deletion.
//!
//! # Responsibility
//! - Derive world names from registry files in the storage root.
//! - Sanitize user-entered world names into file-safe identifiers.
//!
//! # Invariants
//! - Listing always yields at least one world; an empty root gets the
//!   default world persisted immediately.
//! - Creating a world never clobbers an existing registry file.
//! - Every registry path handed out stays directly inside the storage root.
//! - Deleting a world leaves its images in place.

use crate::config::StorageConfig;
use crate::logging::log_text;
use crate::model::world::World;
use crate::repo::image_store::ImageStore;
use crate::repo::registry_file::RegistryFile;
use crate::repo::{StoreError, StoreResult};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};

/// World created for a fresh installation.
pub const DEFAULT_WORLD: &str = "My_First_World";

const REGISTRY_EXTENSION: &str = "json";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").expect("valid ws regex"));

/// Storage root with one registry file per world.
#[derive(Debug, Clone)]
pub struct WorldStore {
    config: StorageConfig,
}

impl WorldStore {
    /// Wraps a storage layout and makes sure its directories exist.
    ///
    /// Directory creation failure is tolerated; see `StorageConfig::ensure_dirs`.
    pub fn open(config: StorageConfig) -> Self {
        config.ensure_dirs();
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn images(&self) -> ImageStore {
        ImageStore::new(self.config.images_dir.clone())
    }

    /// Returns the registry file for `name` without touching disk.
    ///
    /// # Errors
    /// - `StoreError::InvalidWorldName` when `name` would leave the root.
    pub fn registry(&self, name: &str) -> StoreResult<RegistryFile> {
        if !is_file_safe(name) {
            warn!(
                "event=world_open module=repo status=rejected reason=unsafe_name world={}",
                log_text(name)
            );
            return Err(StoreError::InvalidWorldName(name.to_string()));
        }
        Ok(RegistryFile::new(name, self.config.world_path(name)))
    }

    /// Lists world names in lexicographic order.
    ///
    /// When no registry file exists, creates and persists `DEFAULT_WORLD`.
    pub fn list_worlds(&self) -> StoreResult<Vec<String>> {
        let mut names = self.scan_names()?;
        if names.is_empty() {
            info!(
                "event=world_list module=repo status=seeding world={}",
                DEFAULT_WORLD
            );
            self.registry(DEFAULT_WORLD)?
                .save(&World::empty(DEFAULT_WORLD))?;
            names.push(DEFAULT_WORLD.to_string());
        }
        Ok(names)
    }

    /// Returns whether a registry file for `name` exists inside the root.
    pub fn contains(&self, name: &str) -> bool {
        is_file_safe(name) && self.config.world_path(name).is_file()
    }

    /// Creates an empty world from user input.
    ///
    /// Returns `Ok(None)` when the sanitized name is empty, otherwise the
    /// sanitized name that was created.
    ///
    /// # Errors
    /// - `StoreError::InvalidWorldName` for names that would escape the root.
    /// - `StoreError::WorldExists` when the registry file already exists.
    pub fn create_world(&self, raw_name: &str) -> StoreResult<Option<String>> {
        let name = sanitize_world_name(raw_name);
        if name.is_empty() {
            return Ok(None);
        }
        if !is_file_safe(&name) {
            return Err(StoreError::InvalidWorldName(name));
        }

        let path = self.config.world_path(&name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                warn!(
                    "event=world_create module=repo status=rejected reason=exists world={}",
                    log_text(&name)
                );
                return Err(StoreError::WorldExists(name));
            }
            Err(err) => return Err(StoreError::io(&path, err)),
        };
        file.write_all(b"[]").map_err(|err| StoreError::io(&path, err))?;

        info!(
            "event=world_create module=repo status=ok world={}",
            log_text(&name)
        );
        Ok(Some(name))
    }

    /// Removes the registry file for `name`.
    ///
    /// Returns `Ok(false)` when no such file exists. Attached images stay on
    /// disk until a maintenance sweep.
    pub fn delete_world(&self, name: &str) -> StoreResult<bool> {
        if !is_file_safe(name) {
            return Ok(false);
        }
        let path = self.config.world_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(
                    "event=world_delete module=repo status=ok world={}",
                    log_text(name)
                );
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::io(&path, err)),
        }
    }

    fn scan_names(&self) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(&self.config.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.config.root, err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&self.config.root, err))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(REGISTRY_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) if is_file_safe(stem) => names.push(stem.to_string()),
                _ => {}
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Trims `raw` and replaces each whitespace character with `_`.
pub fn sanitize_world_name(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), "_").into_owned()
}

fn is_file_safe(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}
