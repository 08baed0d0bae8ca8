//! Waymark use-case service for the active world.
//!
//! # Responsibility
//! - Own the in-memory `World` for one session and persist every mutation.
//! - Attach image copies on create/edit through `ImageStore`.
//! - Provide ordered, case-insensitive description search.
//!
//! # Invariants
//! - New waymarks are prepended (most-recent-first).
//! - Blank descriptions never create a waymark.
//! - Edits and deletes of unknown IDs are no-ops and do not rewrite the file.
//! - A mutation whose save fails leaves the in-memory world unchanged.
//! - A world holds at most one seed.

use crate::logging::log_text;
use crate::model::waymark::{Waymark, WaymarkDraft, WaymarkId};
use crate::model::world::World;
use crate::repo::image_store::{ImageStore, CREATE_PREFIX, EDIT_PREFIX};
use crate::repo::registry_file::RegistryFile;
use crate::repo::world_store::WorldStore;
use crate::repo::{StoreError, StoreResult};
use chrono::Local;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const STAMP_FORMAT: &str = "%m/%d %H:%M";

pub type RecordResult<T> = Result<T, RecordServiceError>;

/// Errors surfaced by record mutations.
#[derive(Debug)]
pub enum RecordServiceError {
    /// Copying the attached image failed.
    Image(StoreError),
    /// Writing the registry file failed.
    Persist(StoreError),
}

impl Display for RecordServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(err) => write!(f, "failed to attach image: {err}"),
            Self::Persist(err) => write!(f, "failed to save world: {err}"),
        }
    }
}

impl Error for RecordServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Image(err) | Self::Persist(err) => Some(err),
        }
    }
}

/// Session over one world's waymarks.
pub struct RecordService {
    registry: RegistryFile,
    images: ImageStore,
    world: World,
}

impl RecordService {
    /// Loads `name` from `store` and starts a session over it.
    ///
    /// # Errors
    /// - `StoreError::InvalidWorldName` when `name` would leave the root.
    pub fn open(store: &WorldStore, name: &str) -> StoreResult<Self> {
        Ok(Self::new(store.registry(name)?, store.images()))
    }

    pub fn new(registry: RegistryFile, images: ImageStore) -> Self {
        let world = registry.load();
        Self {
            registry,
            images,
            world,
        }
    }

    pub fn world_name(&self) -> &str {
        self.registry.name()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Waymarks in collection order.
    pub fn waymarks(&self) -> &[Waymark] {
        &self.world.waymarks
    }

    pub fn get(&self, id: WaymarkId) -> Option<&Waymark> {
        self.world.get(id)
    }

    pub fn seed(&self) -> Option<&str> {
        self.world.seed.as_deref()
    }

    /// Discards in-memory state and re-reads the registry file.
    pub fn reload(&mut self) {
        self.world = self.registry.load();
    }

    /// Creates a waymark at the front of the collection.
    ///
    /// Returns `Ok(None)` without touching disk when the description is empty.
    /// When the save fails the collection is left as it was.
    pub fn create(
        &mut self,
        draft: WaymarkDraft,
        image: Option<&Path>,
    ) -> RecordResult<Option<Waymark>> {
        if !draft.has_description() {
            debug!(
                "event=waymark_create module=service status=rejected world={} reason=empty_description",
                self.log_world()
            );
            return Ok(None);
        }

        let stored_image = self.copy_image(image, CREATE_PREFIX)?;
        let waymark = Waymark::from_draft(draft, &timestamp(), stored_image.clone());
        self.world.prepend(waymark.clone());
        if let Err(err) = self.persist() {
            self.world.remove(waymark.id);
            self.discard_image(stored_image.as_deref());
            return Err(err);
        }

        info!(
            "event=waymark_create module=service status=ok world={} id={}",
            self.log_world(),
            waymark.id
        );
        Ok(Some(waymark))
    }

    /// Replaces the editable fields of waymark `id` and bumps `modified`.
    ///
    /// A replacement image is copied in; the previous file is left on disk.
    /// Returns `Ok(false)` when `id` is not in the collection.
    pub fn edit(
        &mut self,
        id: WaymarkId,
        draft: WaymarkDraft,
        image: Option<&Path>,
    ) -> RecordResult<bool> {
        if self.world.get(id).is_none() {
            debug!(
                "event=waymark_edit module=service status=noop world={} id={id}",
                self.log_world()
            );
            return Ok(false);
        }

        let stored_image = self.copy_image(image, EDIT_PREFIX)?;
        let stamp = timestamp();
        let previous = match self.world.get_mut(id) {
            Some(waymark) => {
                let previous = waymark.clone();
                waymark.apply(draft, &stamp, stored_image.clone());
                previous
            }
            None => return Ok(false),
        };
        if let Err(err) = self.persist() {
            if let Some(waymark) = self.world.get_mut(id) {
                *waymark = previous;
            }
            self.discard_image(stored_image.as_deref());
            return Err(err);
        }

        info!(
            "event=waymark_edit module=service status=ok world={} id={id}",
            self.log_world()
        );
        Ok(true)
    }

    /// Removes waymark `id`. Returns `Ok(false)` when it is not present.
    pub fn delete(&mut self, id: WaymarkId) -> RecordResult<bool> {
        let Some(index) = self.world.position(id) else {
            debug!(
                "event=waymark_delete module=service status=noop world={} id={id}",
                self.log_world()
            );
            return Ok(false);
        };
        let removed = self.world.waymarks.remove(index);
        if let Err(err) = self.persist() {
            self.world.waymarks.insert(index, removed);
            return Err(err);
        }

        info!(
            "event=waymark_delete module=service status=ok world={} id={id}",
            self.log_world()
        );
        Ok(true)
    }

    /// Records the world seed, replacing any previous value.
    pub fn set_seed(&mut self, seed: impl Into<String>) -> RecordResult<()> {
        let previous = self.world.seed.replace(seed.into());
        if let Err(err) = self.persist() {
            self.world.seed = previous;
            return Err(err);
        }

        info!(
            "event=seed_set module=service status=ok world={}",
            self.log_world()
        );
        Ok(())
    }

    /// Lazily yields waymarks whose description contains `term`,
    /// ignoring case, in collection order.
    pub fn search<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a Waymark> + 'a {
        let term = term.to_string();
        self.world
            .waymarks
            .iter()
            .filter(move |waymark| waymark.matches(&term))
    }

    fn copy_image(&self, source: Option<&Path>, prefix: &str) -> RecordResult<Option<PathBuf>> {
        source
            .map(|path| self.images.store(path, prefix))
            .transpose()
            .map_err(RecordServiceError::Image)
    }

    /// Drops an image copied for a mutation that did not persist.
    fn discard_image(&self, stored: Option<&Path>) {
        let Some(path) = stored else {
            return;
        };
        if let Err(err) = self.images.remove(path) {
            warn!(
                "event=image_discard module=service status=error world={} error={}",
                self.log_world(),
                err
            );
        }
    }

    fn persist(&self) -> RecordResult<()> {
        self.registry
            .save(&self.world)
            .map_err(RecordServiceError::Persist)
    }

    fn log_world(&self) -> String {
        log_text(self.world_name())
    }
}

fn timestamp() -> String {
    Local::now().format(STAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::timestamp;

    #[test]
    fn timestamp_uses_short_month_day_clock_format() {
        let stamp = timestamp();
        let bytes = stamp.as_bytes();
        assert_eq!(stamp.len(), 11, "unexpected stamp `{stamp}`");
        assert_eq!(bytes[2], b'/');
        assert_eq!(bytes[5], b' ');
        assert_eq!(bytes[8], b':');
    }
}
