//! Scene reconciliation.
//!
//! The reconciler is the sole owner of the scene registry: the record of
//! every object currently placed in the backend. Each pass compares the
//! registry against the desired scene built from the latest snapshot and
//! issues the smallest set of backend calls that makes them agree:
//! - same key, same prefab and pose: nothing;
//! - same key, anything different: remove, then place;
//! - new key: place;
//! - vanished key: remove.
//!
//! All removals go out before any placement so two objects never occupy the
//! same spot mid-pass. Running a pass twice on the same snapshot issues no
//! calls the second time.

use std::collections::{BTreeMap, BTreeSet};

use rescue_shared::{
    codec::{DecodedLayout, DoorState, WallState},
    config::ReconcilePolicy,
    error::PlacementError,
    grid::{Cell, CellPair},
    layout::{LayoutPlanner, Placeable},
    resources::PrefabCatalog,
    scene::{Handle, Pose, PrefabKind, SceneBackend},
    snapshot::DecodedSnapshot,
};
use tracing::{debug, warn};

/// Identity of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneKey {
    Tile(Cell),
    Wall(CellPair),
    Door(CellPair),
    Fire(Cell),
    Smoke(Cell),
    Poi(Cell),
    Firefighter(i64),
}

/// What a key should look like after the pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Desired {
    pub prefab: PrefabKind,
    pub pose: Pose,
}

impl Desired {
    fn matches(&self, placed: &PlacedObject) -> bool {
        self.prefab == placed.prefab
            && self.pose.position.bits_eq(placed.pose.position)
            && self.pose.orientation == placed.pose.orientation
    }
}

/// A live object in the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedObject {
    pub prefab: PrefabKind,
    pub pose: Pose,
    pub handle: Handle,
}

/// Full desired scene for one snapshot.
#[derive(Debug, Clone, Default)]
pub struct DesiredScene {
    objects: BTreeMap<SceneKey, Desired>,
}

impl DesiredScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the desired scene: floor tiles, walls and doors from both grid
    /// maps, and all board elements. Broken walls and doors have no visual.
    pub fn from_snapshot(decoded: &DecodedSnapshot, planner: &LayoutPlanner) -> Self {
        let mut scene = Self::new();

        for cell in planner.tile_bounds().cells() {
            scene.insert(
                SceneKey::Tile(cell),
                planner.tile_prefab(cell),
                planner.tile_pose(cell),
            );
        }

        scene.add_layout(&decoded.layout, planner);

        for cell in &decoded.fire {
            scene.insert(SceneKey::Fire(*cell), PrefabKind::Fire, planner.token_pose(*cell));
        }
        for cell in &decoded.smoke {
            scene.insert(SceneKey::Smoke(*cell), PrefabKind::Smoke, planner.token_pose(*cell));
        }
        for (cell, revealed) in &decoded.pois {
            let prefab = if *revealed {
                PrefabKind::RevealedPoi
            } else {
                PrefabKind::Poi
            };
            scene.insert(SceneKey::Poi(*cell), prefab, planner.token_pose(*cell));
        }
        for (id, ff) in &decoded.firefighters {
            let prefab = if ff.carrying_victim {
                PrefabKind::FirefighterCarrying
            } else {
                PrefabKind::Firefighter
            };
            scene.insert(SceneKey::Firefighter(*id), prefab, planner.token_pose(ff.cell));
        }

        scene
    }

    fn add_layout(&mut self, layout: &DecodedLayout, planner: &LayoutPlanner) {
        for wall in layout.wall_segments() {
            let prefab = match wall.state {
                WallState::Intact => PrefabKind::Wall,
                WallState::Damaged => PrefabKind::DamagedWall,
                WallState::Broken => continue,
            };
            self.insert(
                SceneKey::Wall(wall.pair),
                prefab,
                planner.segment_pose(wall.pair, Placeable::Wall),
            );
        }
        for door in layout.door_segments() {
            let prefab = match door.state {
                DoorState::Closed => PrefabKind::Door,
                DoorState::Open => PrefabKind::OpenDoor,
                DoorState::Broken => continue,
            };
            self.insert(
                SceneKey::Door(door.pair),
                prefab,
                planner.segment_pose(door.pair, Placeable::Door),
            );
        }
    }

    pub fn insert(&mut self, key: SceneKey, prefab: PrefabKind, pose: Pose) {
        self.objects.insert(key, Desired { prefab, pose });
    }

    pub fn get(&self, key: &SceneKey) -> Option<&Desired> {
        self.objects.get(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SceneKey> {
        self.objects.keys()
    }
}

/// Objects currently placed, by key. Read-only outside the reconciler.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    objects: BTreeMap<SceneKey, PlacedObject>,
}

impl SceneRegistry {
    pub fn get(&self, key: &SceneKey) -> Option<&PlacedObject> {
        self.objects.get(key)
    }

    pub fn contains(&self, key: &SceneKey) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SceneKey> {
        self.objects.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SceneKey, &PlacedObject)> {
        self.objects.iter()
    }
}

/// Backend calls made by one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub created: usize,
    pub destroyed: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl ReconcileReport {
    /// True when the pass touched nothing in the backend.
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.destroyed == 0
    }
}

/// Owns the registry and applies desired scenes to a backend.
pub struct SceneReconciler {
    registry: SceneRegistry,
    catalog: PrefabCatalog,
    policy: ReconcilePolicy,
    /// Prefab kinds whose placement failure was already reported.
    reported: BTreeSet<PrefabKind>,
}

impl SceneReconciler {
    pub fn new(catalog: PrefabCatalog, policy: ReconcilePolicy) -> Self {
        Self {
            registry: SceneRegistry::default(),
            catalog,
            policy,
            reported: BTreeSet::new(),
        }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Brings the backend in line with `desired`. Runs to completion; a failed
    /// placement skips that object only.
    pub fn reconcile<B>(&mut self, desired: &DesiredScene, backend: &mut B) -> ReconcileReport
    where
        B: SceneBackend + ?Sized,
    {
        let mut report = ReconcileReport::default();

        let (destroys, creates): (Vec<SceneKey>, Vec<SceneKey>) = match self.policy {
            ReconcilePolicy::Rebuild => (
                self.registry.objects.keys().copied().collect(),
                desired.objects.keys().copied().collect(),
            ),
            ReconcilePolicy::Diff => {
                let mut destroys = Vec::new();
                for (key, placed) in &self.registry.objects {
                    match desired.objects.get(key) {
                        Some(want) if want.matches(placed) => report.unchanged += 1,
                        _ => destroys.push(*key),
                    }
                }
                let creates = desired
                    .objects
                    .iter()
                    .filter(|(key, want)| {
                        !self
                            .registry
                            .objects
                            .get(*key)
                            .is_some_and(|placed| want.matches(placed))
                    })
                    .map(|(key, _)| *key)
                    .collect();
                (destroys, creates)
            }
        };

        for key in destroys {
            if let Some(placed) = self.registry.objects.remove(&key) {
                backend.remove(placed.handle);
                report.destroyed += 1;
            }
        }

        for key in creates {
            let Some(want) = desired.objects.get(&key).copied() else {
                continue;
            };
            match self.place(want, backend) {
                Ok(handle) => {
                    self.registry.objects.insert(
                        key,
                        PlacedObject {
                            prefab: want.prefab,
                            pose: want.pose,
                            handle,
                        },
                    );
                    report.created += 1;
                }
                Err(err) => {
                    report.skipped += 1;
                    if self.reported.insert(err.prefab()) {
                        warn!(?key, error = %err, "Placement skipped");
                    } else {
                        debug!(?key, error = %err, "Placement skipped");
                    }
                }
            }
        }

        debug!(
            created = report.created,
            destroyed = report.destroyed,
            unchanged = report.unchanged,
            skipped = report.skipped,
            live = self.registry.len(),
            "Reconciled scene"
        );
        report
    }

    fn place<B>(
        &self,
        want: Desired,
        backend: &mut B,
    ) -> Result<Handle, PlacementError>
    where
        B: SceneBackend + ?Sized,
    {
        let asset = self.catalog.asset(want.prefab)?;
        backend.place(want.prefab, asset, want.pose)
    }

    /// Removes every placed object.
    pub fn clear<B>(&mut self, backend: &mut B) -> usize
    where
        B: SceneBackend + ?Sized,
    {
        let objects = std::mem::take(&mut self.registry.objects);
        for placed in objects.values() {
            backend.remove(placed.handle);
        }
        objects.len()
    }
}
