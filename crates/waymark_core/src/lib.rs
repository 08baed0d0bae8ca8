//! Core persistence and record management for Waymark.
//! This crate is the single source of truth for waymark and world invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transform;

pub use config::{default_log_level, StorageConfig};
pub use logging::{init_logging, logging_status, LoggingError};
pub use model::waymark::{Dimension, Waymark, WaymarkDraft, WaymarkId};
pub use model::world::World;
pub use repo::image_store::ImageStore;
pub use repo::registry_file::RegistryFile;
pub use repo::world_store::{sanitize_world_name, WorldStore, DEFAULT_WORLD};
pub use repo::{StoreError, StoreResult};
pub use service::maintenance_service::{sweep_orphaned_images, SweepReport};
pub use service::record_service::{RecordResult, RecordService, RecordServiceError};
pub use transform::{readout, CoordinateReadout, LinkedCoordinate};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
