//! Per-world JSON registry file.
//!
//! # Responsibility
//! - Decode `<root>/<world>.json` into a typed `World`.
//! - Encode a `World` back into the ordered JSON array format.
//!
//! # Invariants
//! - `load` never returns an error: missing, unreadable or malformed files
//!   yield an empty world and a logged `status=recovered` event.
//! - `load_strict` reports the same conditions as errors.
//! - Objects without an `id` get one derived from their position and
//!   content, so repeated loads of an unsaved file agree.
//! - Waymark objects keep their file order; the seed is written as a single
//!   `world_meta` object after all waymarks.
//! - `save` writes a sibling temp file and renames it over the target.
//!
//! # Wire format
//! ```text
//! [
//!     { "desc": "Spawn", "x": "100", "y": "64", "z": "-200",
//!       "dimension": "overworld", "created": "03/14 09:30",
//!       "modified": "03/14 09:30", "image": "", "id": "<uuid>" },
//!     { "type": "world_meta", "seed": "-4172144997902289642" }
//! ]
//! ```

use crate::model::waymark::{Dimension, Waymark};
use crate::logging::log_text;
use crate::model::world::World;
use crate::repo::{StoreError, StoreResult};
use log::{error, info, warn};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const TEMP_SUFFIX: &str = "tmp";

/// Namespace for IDs derived from waymark objects saved without one.
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_0c3a_52e4_4b8e_9a07_3c51_e2b4_7f19);

/// Backing file for one world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryFile {
    name: String,
    path: PathBuf,
}

impl RegistryFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the world, recovering to an empty one on any failure.
    pub fn load(&self) -> World {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(
                    "event=registry_load module=repo status=missing world={}",
                    log_text(&self.name)
                );
                return World::empty(self.name.as_str());
            }
            Err(err) => {
                error!(
                    "event=registry_load module=repo status=recovered world={} reason=unreadable error={}",
                    log_text(&self.name),
                    err
                );
                return World::empty(self.name.as_str());
            }
        };

        match decode_world(self.name.as_str(), raw.as_str()) {
            Ok(decoded) => {
                info!(
                    "event=registry_load module=repo status=ok world={} waymarks={} seed={} skipped={}",
                    log_text(&self.name),
                    decoded.world.waymarks.len(),
                    decoded.world.seed.is_some(),
                    decoded.skipped
                );
                decoded.world
            }
            Err(err) => {
                error!(
                    "event=registry_load module=repo status=recovered world={} reason=malformed error={}",
                    log_text(&self.name),
                    err
                );
                World::empty(self.name.as_str())
            }
        }
    }

    /// Reads the world without recovery.
    ///
    /// A missing file is an empty world. Unreadable files, malformed
    /// documents and documents with skipped items are errors.
    ///
    /// # Errors
    /// - `StoreError::Io` when the file exists but cannot be read.
    /// - `StoreError::Corrupt` when any part of the document fails to decode.
    pub fn load_strict(&self) -> StoreResult<World> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(World::empty(self.name.as_str()))
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let decoded =
            decode_world(self.name.as_str(), raw.as_str()).map_err(|err| StoreError::Corrupt {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;
        if decoded.skipped > 0 {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: format!("{} unreadable item(s)", decoded.skipped),
            });
        }
        Ok(decoded.world)
    }

    /// Replaces the backing file with the encoded world.
    pub fn save(&self, world: &World) -> StoreResult<()> {
        let bytes = encode_world(world)?;
        let temp_path = temp_path_for(&self.path);

        if let Err(err) = write_synced(&temp_path, &bytes) {
            let _ = fs::remove_file(&temp_path);
            error!(
                "event=registry_save module=repo status=error world={} stage=write error={}",
                log_text(&self.name),
                err
            );
            return Err(StoreError::io(&temp_path, err));
        }

        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            error!(
                "event=registry_save module=repo status=error world={} stage=rename error={}",
                log_text(&self.name),
                err
            );
            return Err(StoreError::io(&self.path, err));
        }

        info!(
            "event=registry_save module=repo status=ok world={} waymarks={}",
            log_text(&self.name),
            world.waymarks.len()
        );
        Ok(())
    }
}

/// Path used for the in-flight copy of `path` during `save`.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireItem {
    Meta(WireMeta),
    Waymark(WireWaymark),
}

#[derive(Debug, Serialize, Deserialize)]
enum MetaTag {
    #[serde(rename = "world_meta")]
    WorldMeta,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMeta {
    #[serde(rename = "type")]
    tag: MetaTag,
    #[serde(default)]
    seed: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireWaymark {
    desc: String,
    #[serde(default, deserialize_with = "coordinate_text")]
    x: String,
    #[serde(default, deserialize_with = "coordinate_text")]
    y: String,
    #[serde(default, deserialize_with = "coordinate_text")]
    z: String,
    #[serde(default = "default_dimension")]
    dimension: String,
    #[serde(default)]
    created: String,
    #[serde(default)]
    modified: String,
    #[serde(default)]
    image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
}

fn default_dimension() -> String {
    Dimension::Overworld.as_str().to_string()
}

/// Accepts coordinate text or a bare JSON number.
fn coordinate_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected coordinate text, got `{other}`"
        ))),
    }
}

struct Decoded {
    world: World,
    /// Array items that were neither a waymark nor world metadata.
    skipped: usize,
}

fn decode_world(name: &str, raw: &str) -> Result<Decoded, serde_json::Error> {
    let items: Vec<Value> = serde_json::from_str(raw)?;
    let mut world = World::empty(name);
    let mut skipped = 0;
    let world_label = log_text(name);

    for (index, item) in items.into_iter().enumerate() {
        let fingerprint = item.to_string();
        match serde_json::from_value::<WireItem>(item) {
            Ok(WireItem::Meta(meta)) => {
                if world.seed.is_some() {
                    warn!(
                        "event=registry_decode module=repo status=skipped world={world_label} index={index} reason=duplicate_meta"
                    );
                    continue;
                }
                world.seed = Some(meta.seed);
            }
            Ok(WireItem::Waymark(wire)) => {
                let fallback_id = legacy_id(index, &fingerprint);
                world
                    .waymarks
                    .push(waymark_from_wire(&world_label, wire, fallback_id));
            }
            Err(err) => {
                skipped += 1;
                warn!(
                    "event=registry_decode module=repo status=skipped world={world_label} index={index} error={err}"
                );
            }
        }
    }

    Ok(Decoded { world, skipped })
}

/// Derives the ID of a waymark object stored without one.
///
/// Same file content yields the same ID on every load, so IDs handed out
/// before the first save still resolve in later sessions.
fn legacy_id(index: usize, fingerprint: &str) -> Uuid {
    Uuid::new_v5(
        &LEGACY_ID_NAMESPACE,
        format!("{index}:{fingerprint}").as_bytes(),
    )
}

fn waymark_from_wire(world_label: &str, wire: WireWaymark, fallback_id: Uuid) -> Waymark {
    let dimension = Dimension::parse(&wire.dimension).unwrap_or_else(|| {
        warn!(
            "event=registry_decode module=repo status=defaulted world={world_label} field=dimension value={}",
            log_text(&wire.dimension)
        );
        Dimension::Overworld
    });

    Waymark {
        id: wire.id.filter(|id| !id.is_nil()).unwrap_or(fallback_id),
        description: wire.desc,
        x: wire.x,
        y: wire.y,
        z: wire.z,
        dimension,
        created: wire.created,
        modified: wire.modified,
        image: if wire.image.is_empty() {
            None
        } else {
            Some(PathBuf::from(wire.image))
        },
    }
}

fn waymark_to_wire(waymark: &Waymark) -> WireWaymark {
    WireWaymark {
        desc: waymark.description.clone(),
        x: waymark.x.clone(),
        y: waymark.y.clone(),
        z: waymark.z.clone(),
        dimension: waymark.dimension.as_str().to_string(),
        created: waymark.created.clone(),
        modified: waymark.modified.clone(),
        image: waymark
            .image
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default(),
        id: Some(waymark.id),
    }
}

fn encode_world(world: &World) -> Result<Vec<u8>, serde_json::Error> {
    let mut items: Vec<WireItem> = world
        .waymarks
        .iter()
        .map(|waymark| WireItem::Waymark(waymark_to_wire(waymark)))
        .collect();
    if let Some(seed) = &world.seed {
        items.push(WireItem::Meta(WireMeta {
            tag: MetaTag::WorldMeta,
            seed: seed.clone(),
        }));
    }

    let mut bytes = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    items.serialize(&mut serializer)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::{decode_world, encode_world, temp_path_for};
    use crate::model::waymark::Dimension;
    use std::path::{Path, PathBuf};

    #[test]
    fn decode_accepts_legacy_objects_without_ids() {
        let raw = r#"[
            {"desc": "Spawn", "x": "100", "y": "64", "z": "-200",
             "dimension": "overworld", "created": "01/02 03:04",
             "modified": "01/02 03:04", "image": ""},
            {"type": "world_meta", "seed": "12345"}
        ]"#;

        let world = decode_world("Base", raw).unwrap().world;
        assert_eq!(world.seed.as_deref(), Some("12345"));
        assert_eq!(world.waymarks.len(), 1);
        assert!(!world.waymarks[0].id.is_nil());
        assert_eq!(world.waymarks[0].image, None);
    }

    #[test]
    fn ids_for_legacy_objects_are_identical_across_loads() {
        let raw = r#"[
            {"desc": "Spawn", "x": "0", "y": "64", "z": "0"},
            {"desc": "Spawn", "x": "0", "y": "64", "z": "0"},
            {"desc": "Nil", "id": "00000000-0000-0000-0000-000000000000"}
        ]"#;

        let first = decode_world("Base", raw).unwrap().world;
        let second = decode_world("Base", raw).unwrap().world;
        let first_ids: Vec<_> = first.waymarks.iter().map(|w| w.id).collect();
        let second_ids: Vec<_> = second.waymarks.iter().map(|w| w.id).collect();

        assert_eq!(first_ids, second_ids);
        assert_ne!(first_ids[0], first_ids[1]);
        assert!(!first_ids[2].is_nil());
    }

    #[test]
    fn decode_keeps_first_meta_and_accepts_numeric_coordinates() {
        let raw = r#"[
            {"type": "world_meta", "seed": "first"},
            {"desc": "Farm", "x": 12, "y": 70.5, "z": -3, "dimension": "nether"},
            {"type": "world_meta", "seed": "second"}
        ]"#;

        let world = decode_world("Base", raw).unwrap().world;
        assert_eq!(world.seed.as_deref(), Some("first"));
        let farm = &world.waymarks[0];
        assert_eq!((farm.x.as_str(), farm.y.as_str(), farm.z.as_str()), ("12", "70.5", "-3"));
        assert_eq!(farm.dimension, Dimension::Nether);
    }

    #[test]
    fn decode_skips_unrecognized_items_and_defaults_unknown_dimension() {
        let raw = r#"[
            {"note": "not a waymark"},
            {"desc": "Portal", "x": "1", "y": "2", "z": "3", "dimension": "the_end"}
        ]"#;

        let decoded = decode_world("Base", raw).unwrap();
        assert_eq!(decoded.skipped, 1);
        assert_eq!(decoded.world.waymarks.len(), 1);
        assert_eq!(decoded.world.waymarks[0].dimension, Dimension::Overworld);
    }

    #[test]
    fn decode_rejects_non_array_documents() {
        assert!(decode_world("Base", r#"{"desc": "x"}"#).is_err());
        assert!(decode_world("Base", "not json").is_err());
    }

    #[test]
    fn encode_places_meta_after_waymarks_with_four_space_indent() {
        let raw = r#"[
            {"type": "world_meta", "seed": "42"},
            {"desc": "Spawn", "x": "0", "y": "64", "z": "0", "image": "/img/a.png"}
        ]"#;
        let world = decode_world("Base", raw).unwrap().world;

        let encoded = String::from_utf8(encode_world(&world).unwrap()).unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(values[0]["desc"], "Spawn");
        assert_eq!(values[0]["image"], "/img/a.png");
        assert_eq!(values[1]["type"], "world_meta");
        assert_eq!(values[1]["seed"], "42");
        assert!(encoded.contains("\n    {"));
    }

    #[test]
    fn temp_path_is_a_sibling_of_the_target() {
        let temp = temp_path_for(Path::new("/data/Base.json"));
        assert_eq!(temp, PathBuf::from("/data/Base.json.tmp"));
    }
}
