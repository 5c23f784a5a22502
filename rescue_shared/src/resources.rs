//! Prefab catalog.
//!
//! Maps each [`PrefabKind`] to the asset name the scene backend instantiates.
//! A kind without an entry cannot be placed; that is a configuration error
//! reported by the reconciler.
//!
//! In config the catalog is a map of overrides on top of the defaults. An
//! empty asset name removes the kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{error::PlacementError, scene::PrefabKind};

/// Asset lookup by prefab kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<PrefabKind, String>",
    into = "BTreeMap<PrefabKind, String>"
)]
pub struct PrefabCatalog {
    assets: BTreeMap<PrefabKind, String>,
}

impl From<BTreeMap<PrefabKind, String>> for PrefabCatalog {
    fn from(overrides: BTreeMap<PrefabKind, String>) -> Self {
        let mut catalog = Self::default();
        for (kind, asset) in overrides {
            if asset.is_empty() {
                catalog.remove(kind);
            } else {
                catalog.insert(kind, asset);
            }
        }
        catalog
    }
}

impl From<PrefabCatalog> for BTreeMap<PrefabKind, String> {
    fn from(catalog: PrefabCatalog) -> Self {
        catalog.assets
    }
}

impl Default for PrefabCatalog {
    fn default() -> Self {
        let assets = PrefabKind::ALL
            .into_iter()
            .map(|kind| (kind, default_asset(kind).to_string()))
            .collect();
        Self { assets }
    }
}

fn default_asset(kind: PrefabKind) -> &'static str {
    match kind {
        PrefabKind::Wall => "prefabs/wall",
        PrefabKind::DamagedWall => "prefabs/wall_damaged",
        PrefabKind::Door => "prefabs/door",
        PrefabKind::OpenDoor => "prefabs/door_open",
        PrefabKind::Fire => "prefabs/fire",
        PrefabKind::Smoke => "prefabs/smoke",
        PrefabKind::Poi => "prefabs/poi",
        PrefabKind::RevealedPoi => "prefabs/poi_revealed",
        PrefabKind::Firefighter => "prefabs/firefighter",
        PrefabKind::FirefighterCarrying => "prefabs/firefighter_carrying",
        PrefabKind::CenterTile => "tiles/center",
        PrefabKind::LeftBorderTile => "tiles/border_left",
        PrefabKind::RightBorderTile => "tiles/border_right",
        PrefabKind::EdgeTile => "tiles/border_edge",
    }
}

impl PrefabCatalog {
    /// A catalog with no assets at all.
    pub fn empty() -> Self {
        Self {
            assets: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, kind: PrefabKind, asset: impl Into<String>) {
        self.assets.insert(kind, asset.into());
    }

    pub fn remove(&mut self, kind: PrefabKind) -> Option<String> {
        self.assets.remove(&kind)
    }

    pub fn asset(&self, kind: PrefabKind) -> Result<&str, PlacementError> {
        self.assets
            .get(&kind)
            .map(String::as_str)
            .ok_or(PlacementError::MissingPrefab(kind))
    }

    /// Kinds that have no asset configured.
    pub fn missing(&self) -> Vec<PrefabKind> {
        PrefabKind::ALL
            .into_iter()
            .filter(|k| !self.assets.contains_key(k))
            .collect()
    }
}
