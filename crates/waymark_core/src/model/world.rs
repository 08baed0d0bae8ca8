//! World aggregate: one named collection of waymarks plus an optional seed.
//!
//! # Invariants
//! - `waymarks` is ordered most-recent-first.
//! - The seed is a single optional slot, never a collection member.

use crate::model::waymark::{Waymark, WaymarkId};

/// In-memory content of one world registry file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct World {
    pub name: String,
    pub seed: Option<String>,
    pub waymarks: Vec<Waymark>,
}

impl World {
    /// Creates an empty world with no seed.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: None,
            waymarks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seed.is_none() && self.waymarks.is_empty()
    }

    pub fn get(&self, id: WaymarkId) -> Option<&Waymark> {
        self.waymarks.iter().find(|waymark| waymark.id == id)
    }

    pub fn get_mut(&mut self, id: WaymarkId) -> Option<&mut Waymark> {
        self.waymarks.iter_mut().find(|waymark| waymark.id == id)
    }

    /// Inserts at the front so the newest waymark comes first.
    pub fn prepend(&mut self, waymark: Waymark) {
        self.waymarks.insert(0, waymark);
    }

    /// Index of waymark `id` in collection order.
    pub fn position(&self, id: WaymarkId) -> Option<usize> {
        self.waymarks.iter().position(|waymark| waymark.id == id)
    }

    /// Removes a waymark by ID. Returns the removed record, if any.
    pub fn remove(&mut self, id: WaymarkId) -> Option<Waymark> {
        let index = self.position(id)?;
        Some(self.waymarks.remove(index))
    }
}
