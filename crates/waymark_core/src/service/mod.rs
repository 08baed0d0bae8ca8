//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate registry, world and image storage into waymark use-cases.
//! - Keep CLI and other front ends decoupled from file layout.

pub mod maintenance_service;
pub mod record_service;
