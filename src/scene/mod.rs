//! Scenes: rooms and the object models placed in them, per readiness tier.
//!
//! A scene may carry two independent room sets, one for the current release
//! ([`Tier::Ready`]) and one for the future release ([`Tier::Planned`]). They
//! are never merged.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, PhysicalAsset, RenameMap};
use crate::error::{DataQualityWarning, SceneError, WarningLog};
use crate::task::Task;

/// Readiness tier of a room configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Built from currently available assets.
    Ready,
    /// Built from the future inventory.
    Planned,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Ready => "ready",
            Tier::Planned => "planned",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `count` copies of an asset in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomObject {
    pub asset: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub room_type: String,
    pub tier: Tier,
    /// Sorted by asset name.
    pub objects: Vec<RoomObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    /// Sorted by (tier, name).
    pub rooms: Vec<Room>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rooms: Vec::new(),
        }
    }

    /// Rooms of one tier with the given room type.
    pub fn rooms_of_type<'a>(
        &'a self,
        room_type: &'a str,
        tier: Tier,
    ) -> impl Iterator<Item = &'a Room> {
        self.rooms
            .iter()
            .filter(move |r| r.tier == tier && r.room_type == room_type)
    }
}

/// Room type of a room name: the name without a trailing `_<digits>` suffix.
pub fn room_type_of(room_name: &str) -> &str {
    match room_name.rsplit_once('_') {
        Some((head, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            head
        }
        _ => room_name,
    }
}

/// One room-configuration export: scene → room → object → count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomConfigDocument {
    pub scenes: BTreeMap<String, BTreeMap<String, BTreeMap<String, u32>>>,
}

/// Materialize both tiers of room configuration.
///
/// Object names go through `renames`. Objects that the inventory does not
/// know are added to the catalog as neither ready nor planned. Zero counts
/// are warnings; a room appearing twice in one tier of a scene is fatal.
pub fn load_scenes(
    catalog: &mut Catalog,
    planned: &RoomConfigDocument,
    ready: &RoomConfigDocument,
    renames: &RenameMap,
    warnings: &mut WarningLog,
) -> Result<BTreeMap<String, Scene>, SceneError> {
    let mut scenes: BTreeMap<String, Scene> = BTreeMap::new();
    let mut seen: BTreeSet<(String, String, Tier)> = BTreeSet::new();

    for (document, tier) in [(planned, Tier::Planned), (ready, Tier::Ready)] {
        for (scene_name, rooms) in &document.scenes {
            let scene = scenes
                .entry(scene_name.clone())
                .or_insert_with(|| Scene::new(scene_name.clone()));
            for (room_name, objects) in rooms {
                let room_name = room_name.trim();
                if !seen.insert((scene_name.clone(), room_name.to_string(), tier)) {
                    return Err(SceneError::DuplicateRoom {
                        scene: scene_name.clone(),
                        room: room_name.to_string(),
                        tier: tier.as_str(),
                    });
                }

                let mut counts: BTreeMap<String, u32> = BTreeMap::new();
                for (original, &count) in objects {
                    let original = original.trim();
                    let asset = renames.resolve(original);
                    if count == 0 {
                        warnings.push(DataQualityWarning::ZeroCountRoomObject {
                            scene: scene_name.clone(),
                            room: room_name.to_string(),
                            asset: asset.to_string(),
                        });
                        continue;
                    }
                    if !catalog.contains_asset(asset) {
                        tracing::debug!(asset, scene = %scene_name, "room object missing from inventory");
                        catalog.insert_asset(PhysicalAsset::untracked(asset, original));
                    }
                    *counts.entry(asset.to_string()).or_default() += count;
                }

                scene.rooms.push(Room {
                    name: room_name.to_string(),
                    room_type: room_type_of(room_name).to_string(),
                    tier,
                    objects: counts
                        .into_iter()
                        .map(|(asset, count)| RoomObject { asset, count })
                        .collect(),
                });
            }
        }
    }

    for scene in scenes.values_mut() {
        scene
            .rooms
            .sort_by(|a, b| (a.tier, &a.name).cmp(&(b.tier, &b.name)));
    }
    tracing::info!(
        scenes = scenes.len(),
        rooms = seen.len(),
        "room configurations loaded"
    );
    Ok(scenes)
}

/// Warn about task and scene room types missing from `allowed`.
///
/// An empty allow-list disables the check. A room listed in both tiers is
/// reported once.
pub fn check_room_types<'a>(
    allowed: &BTreeSet<String>,
    tasks: impl IntoIterator<Item = &'a Task>,
    scenes: impl IntoIterator<Item = &'a Scene>,
    warnings: &mut WarningLog,
) -> usize {
    if allowed.is_empty() {
        return 0;
    }
    let before = warnings.len();
    for task in tasks {
        for requirement in &task.room_requirements {
            if !allowed.contains(&requirement.room_type) {
                warnings.push(DataQualityWarning::UnknownTaskRoomType {
                    task: task.name.clone(),
                    room_type: requirement.room_type.clone(),
                });
            }
        }
    }
    for scene in scenes {
        let mut reported: BTreeSet<&str> = BTreeSet::new();
        for room in &scene.rooms {
            if allowed.contains(&room.room_type) || !reported.insert(&room.name) {
                continue;
            }
            warnings.push(DataQualityWarning::UnknownSceneRoomType {
                scene: scene.name.clone(),
                room: room.name.clone(),
                room_type: room.room_type.clone(),
            });
        }
    }
    warnings.len() - before
}
