//! Domain model for worlds and their waymarks.
//!
//! # Responsibility
//! - Define the typed records handled by storage and services.
//! - Keep wire-format concerns out of the domain shape.
//!
//! # Invariants
//! - Every waymark is identified by a stable `WaymarkId`.
//! - A world holds at most one seed.

pub mod waymark;
pub mod world;
