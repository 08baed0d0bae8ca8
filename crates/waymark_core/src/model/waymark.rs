//! Waymark domain model.
//!
//! # Responsibility
//! - Define the point-of-interest record kept inside a world.
//! - Keep coordinate text exactly as entered; parsing happens on demand.
//!
//! # Invariants
//! - `id` is stable for the lifetime of a waymark and never reused.
//! - Waymarks created through `RecordService` always carry a description.
//! - `created` is set once; `modified` changes on every edit.

use std::path::PathBuf;
use uuid::Uuid;

/// Stable identifier for a waymark inside its world.
pub type WaymarkId = Uuid;

/// One of the two linked coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
}

impl Dimension {
    /// Returns the wire value stored in registry files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::Nether => "nether",
        }
    }

    /// Parses a wire value. Returns `None` for unknown text.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overworld" => Some(Self::Overworld),
            "nether" => Some(Self::Nether),
            _ => None,
        }
    }

    /// Returns the dimension on the other side of the portal link.
    pub fn linked(self) -> Self {
        match self {
            Self::Overworld => Self::Nether,
            Self::Nether => Self::Overworld,
        }
    }
}

/// Caller input for creating or editing a waymark.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaymarkDraft {
    pub description: String,
    pub x: String,
    pub y: String,
    pub z: String,
    pub dimension: Dimension,
}

impl WaymarkDraft {
    pub fn new(
        description: impl Into<String>,
        x: impl Into<String>,
        y: impl Into<String>,
        z: impl Into<String>,
        dimension: Dimension,
    ) -> Self {
        Self {
            description: description.into(),
            x: x.into(),
            y: y.into(),
            z: z.into(),
            dimension,
        }
    }

    /// Returns whether the draft can become a waymark.
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// Recorded point of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waymark {
    pub id: WaymarkId,
    pub description: String,
    /// Coordinate text as entered; see `transform::readout` for parsing.
    pub x: String,
    pub y: String,
    pub z: String,
    pub dimension: Dimension,
    /// Short local timestamp, `MM/DD HH:MM`.
    pub created: String,
    pub modified: String,
    /// Managed copy under the images directory.
    pub image: Option<PathBuf>,
}

impl Waymark {
    /// Builds a new waymark from a draft with a generated stable ID.
    ///
    /// Blank coordinate text is stored as `"0"`.
    pub fn from_draft(draft: WaymarkDraft, stamp: &str, image: Option<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: draft.description,
            x: or_zero(draft.x),
            y: or_zero(draft.y),
            z: or_zero(draft.z),
            dimension: draft.dimension,
            created: stamp.to_string(),
            modified: stamp.to_string(),
            image,
        }
    }

    /// Overwrites editable fields and bumps `modified`.
    ///
    /// `image` replaces the attachment only when `Some`.
    pub fn apply(&mut self, draft: WaymarkDraft, stamp: &str, image: Option<PathBuf>) {
        self.description = draft.description;
        self.x = draft.x;
        self.y = draft.y;
        self.z = draft.z;
        self.dimension = draft.dimension;
        self.modified = stamp.to_string();
        if image.is_some() {
            self.image = image;
        }
    }

    /// Case-insensitive substring match against the description.
    pub fn matches(&self, term: &str) -> bool {
        self.description
            .to_lowercase()
            .contains(term.to_lowercase().as_str())
    }
}

fn or_zero(value: String) -> String {
    if value.trim().is_empty() {
        "0".to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::{Dimension, Waymark, WaymarkDraft};
    use std::path::PathBuf;

    #[test]
    fn dimension_parse_is_case_insensitive() {
        assert_eq!(Dimension::parse(" Nether "), Some(Dimension::Nether));
        assert_eq!(Dimension::parse("OVERWORLD"), Some(Dimension::Overworld));
        assert_eq!(Dimension::parse("end"), None);
    }

    #[test]
    fn from_draft_fills_blank_coordinates_with_zero() {
        let draft = WaymarkDraft::new("Spawn", "", " ", "12", Dimension::Overworld);
        let waymark = Waymark::from_draft(draft, "01/02 03:04", None);

        assert_eq!(waymark.x, "0");
        assert_eq!(waymark.y, "0");
        assert_eq!(waymark.z, "12");
        assert_eq!(waymark.created, waymark.modified);
        assert!(!waymark.id.is_nil());
    }

    #[test]
    fn apply_keeps_image_when_no_replacement_given() {
        let draft = WaymarkDraft::new("Base", "1", "2", "3", Dimension::Overworld);
        let mut waymark =
            Waymark::from_draft(draft, "01/02 03:04", Some(PathBuf::from("/img/a.png")));
        let created = waymark.created.clone();

        let edit = WaymarkDraft::new("Base v2", "4", "5", "6", Dimension::Nether);
        waymark.apply(edit, "05/06 07:08", None);

        assert_eq!(waymark.description, "Base v2");
        assert_eq!(waymark.dimension, Dimension::Nether);
        assert_eq!(waymark.image, Some(PathBuf::from("/img/a.png")));
        assert_eq!(waymark.created, created);
        assert_eq!(waymark.modified, "05/06 07:08");
    }

    #[test]
    fn matches_ignores_case() {
        let draft = WaymarkDraft::new("Lava Pool", "0", "0", "0", Dimension::Nether);
        let waymark = Waymark::from_draft(draft, "01/01 00:00", None);
        assert!(waymark.matches("lava"));
        assert!(waymark.matches("POOL"));
        assert!(!waymark.matches("cave"));
    }
}
