//! Scene abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! It defines the traits a scene graph and a counters display would satisfy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::PlacementError,
    math::{Quat, Vec3},
};

/// Visual asset families the reconciler can place.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PrefabKind {
    Wall,
    DamagedWall,
    Door,
    OpenDoor,
    Fire,
    Smoke,
    Poi,
    RevealedPoi,
    Firefighter,
    FirefighterCarrying,
    CenterTile,
    LeftBorderTile,
    RightBorderTile,
    EdgeTile,
}

impl PrefabKind {
    pub const ALL: [PrefabKind; 14] = [
        PrefabKind::Wall,
        PrefabKind::DamagedWall,
        PrefabKind::Door,
        PrefabKind::OpenDoor,
        PrefabKind::Fire,
        PrefabKind::Smoke,
        PrefabKind::Poi,
        PrefabKind::RevealedPoi,
        PrefabKind::Firefighter,
        PrefabKind::FirefighterCarrying,
        PrefabKind::CenterTile,
        PrefabKind::LeftBorderTile,
        PrefabKind::RightBorderTile,
        PrefabKind::EdgeTile,
    ];
}

/// World-space placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// Opaque handle to a placed visual, issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

/// A scene graph that can place and remove prefab instances.
pub trait SceneBackend {
    fn place(&mut self, prefab: PrefabKind, asset: &str, pose: Pose)
        -> Result<Handle, PlacementError>;
    fn remove(&mut self, handle: Handle);
}

/// A backend that places nothing; every placement succeeds.
#[derive(Default)]
pub struct NullBackend {
    next: u64,
}

impl SceneBackend for NullBackend {
    fn place(
        &mut self,
        _prefab: PrefabKind,
        _asset: &str,
        _pose: Pose,
    ) -> Result<Handle, PlacementError> {
        self.next += 1;
        Ok(Handle(self.next))
    }

    fn remove(&mut self, _handle: Handle) {}
}

/// One backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneOp {
    Place {
        handle: Handle,
        prefab: PrefabKind,
        pose: Pose,
    },
    Remove {
        handle: Handle,
    },
}

/// Backend that records every call and tracks live instances; used by
/// headless tests.
#[derive(Default)]
pub struct RecordingBackend {
    next: u64,
    pub ops: Vec<SceneOp>,
    pub live: BTreeMap<Handle, (PrefabKind, Pose)>,
    /// Prefabs this backend refuses to place.
    pub reject: Vec<PrefabKind>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the recorded call log, keeping live instances.
    pub fn take_ops(&mut self) -> Vec<SceneOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn live_count(&self, prefab: PrefabKind) -> usize {
        self.live.values().filter(|(p, _)| *p == prefab).count()
    }
}

impl SceneBackend for RecordingBackend {
    fn place(
        &mut self,
        prefab: PrefabKind,
        _asset: &str,
        pose: Pose,
    ) -> Result<Handle, PlacementError> {
        if self.reject.contains(&prefab) {
            return Err(PlacementError::Rejected {
                prefab,
                reason: "rejected by test backend".to_string(),
            });
        }
        self.next += 1;
        let handle = Handle(self.next);
        self.ops.push(SceneOp::Place {
            handle,
            prefab,
            pose,
        });
        self.live.insert(handle, (prefab, pose));
        Ok(handle)
    }

    fn remove(&mut self, handle: Handle) {
        self.ops.push(SceneOp::Remove { handle });
        self.live.remove(&handle);
    }
}

/// Headline counters shown next to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counters {
    pub damage_markers: u32,
    pub rescued_victims: u32,
    pub lost_victims: u32,
}

/// Receives counters after every reconciliation.
pub trait CounterDisplay {
    fn update(&mut self, counters: Counters);
}

/// Display that keeps the last counters it was given.
#[derive(Debug, Default)]
pub struct LastCounters {
    pub last: Option<Counters>,
    pub updates: usize,
}

impl CounterDisplay for LastCounters {
    fn update(&mut self, counters: Counters) {
        self.last = Some(counters);
        self.updates += 1;
    }
}
