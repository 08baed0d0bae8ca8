//! Storage maintenance: reclaiming images no waymark references.
//!
//! # Responsibility
//! - Mark every managed image referenced by any world.
//! - Sweep the images directory of files left unmarked.
//!
//! # Invariants
//! - Only managed files directly inside the images directory are removed.
//! - Existing registry files are only read, never rewritten.
//! - Nothing is removed unless every world decodes cleanly.
//! - A relative image reference keeps every managed file with its name.

use crate::repo::world_store::WorldStore;
use crate::repo::StoreResult;
use crate::logging::log_text;
use log::{error, info};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::PathBuf;

/// Outcome of one mark-and-sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Managed files still referenced by a waymark.
    pub kept: Vec<PathBuf>,
    /// Files deleted because nothing referenced them.
    pub removed: Vec<PathBuf>,
}

/// Deletes managed images that no waymark in any world references.
///
/// # Errors
/// - `StoreError::Corrupt` / `StoreError::Io` when any world cannot be read
///   in full; no file is removed in that case.
pub fn sweep_orphaned_images(store: &WorldStore) -> StoreResult<SweepReport> {
    let images = store.images();
    let mut referenced: HashSet<OsString> = HashSet::new();

    for name in store.list_worlds()? {
        let world = store.registry(&name)?.load_strict().map_err(|err| {
            error!(
                "event=image_sweep module=service status=aborted world={} error={}",
                log_text(&name),
                err
            );
            err
        })?;
        for waymark in &world.waymarks {
            let Some(path) = waymark.image.as_deref() else {
                continue;
            };
            if path.is_absolute() && !images.owns(path) {
                continue;
            }
            if let Some(file_name) = path.file_name() {
                referenced.insert(file_name.to_os_string());
            }
        }
    }

    let mut report = SweepReport::default();
    for path in images.list()? {
        let is_referenced = path
            .file_name()
            .map(|file_name| referenced.contains(file_name))
            .unwrap_or(false);
        if is_referenced {
            report.kept.push(path);
        } else {
            images.remove(&path)?;
            report.removed.push(path);
        }
    }

    info!(
        "event=image_sweep module=service status=ok kept={} removed={}",
        report.kept.len(),
        report.removed.len()
    );
    Ok(report)
}
