//! Snapshot wire types and decoding.
//!
//! A snapshot is the full state document served by `GET /game_state`. Each
//! one fully replaces the previous; nothing is carried over between them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    codec::{apply_state_overlays, DecodeWarning, DecodedLayout, GridCodec, GridMap, SegmentStateInfo},
    error::DecodeError,
    grid::{Cell, GridBounds},
    scene::Counters,
};

/// Point of interest on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiInfo {
    pub position: [i32; 2],
    #[serde(default)]
    pub revealed: bool,
}

/// Firefighter token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirefighterInfo {
    pub id: i64,
    pub position: [i32; 2],
    #[serde(default)]
    pub carrying_victim: bool,
}

/// Server state document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(default)]
    pub step: u64,
    #[serde(default)]
    pub grid_structure: GridMap,
    #[serde(default)]
    pub out_of_bounds_grid_structure: GridMap,
    #[serde(default)]
    pub damage_markers: u32,
    #[serde(default)]
    pub rescued_victims: u32,
    #[serde(default)]
    pub lost_victims: u32,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub agent_count: u32,
    #[serde(default)]
    pub fire_locations: Vec<[i32; 2]>,
    #[serde(default)]
    pub smoke_locations: Vec<[i32; 2]>,
    #[serde(default)]
    pub poi_locations: Vec<PoiInfo>,
    #[serde(default)]
    pub firefighter_positions: Vec<FirefighterInfo>,
    /// Wall states reported next to the grid map.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub walls: Vec<SegmentStateInfo>,
    /// Door states reported next to the grid map.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doors: Vec<SegmentStateInfo>,
}

impl GameSnapshot {
    /// Parses a response body.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, DecodeError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::Empty);
        }
        Ok(serde_json::from_slice(body)?)
    }

    pub fn counters(&self) -> Counters {
        Counters {
            damage_markers: self.damage_markers,
            rescued_victims: self.rescued_victims,
            lost_victims: self.lost_victims,
        }
    }
}

/// Firefighter position after decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirefighterToken {
    pub cell: Cell,
    pub carrying_victim: bool,
}

/// A snapshot with its grid maps decoded and its element lists normalized.
#[derive(Debug, Clone, Default)]
pub struct DecodedSnapshot {
    pub step: u64,
    pub running: bool,
    pub agent_count: u32,
    pub counters: Counters,
    /// Walls and doors from both grid maps, with reported states applied.
    pub layout: DecodedLayout,
    pub fire: BTreeSet<Cell>,
    pub smoke: BTreeSet<Cell>,
    /// Cell -> revealed.
    pub pois: BTreeMap<Cell, bool>,
    pub firefighters: BTreeMap<i64, FirefighterToken>,
    pub warnings: Vec<DecodeWarning>,
}

/// Decodes a snapshot for an inner grid of `rows × cols` cells.
///
/// The out-of-bounds map is decoded with the same rule against the ring one
/// cell wider on every side and merged into one layout; a pair both maps
/// describe keeps the inner map's reading. Reported wall/door states then
/// apply to whichever map the pair came from. Duplicate element entries
/// collapse; for POIs and firefighters the last entry wins.
pub fn decode_snapshot(snapshot: &GameSnapshot, rows: i32, cols: i32) -> DecodedSnapshot {
    let inner_bounds = GridBounds::inner(rows, cols);
    let outer_bounds = GridBounds::outer(rows, cols);
    let inner = GridCodec::new(inner_bounds).decode(&snapshot.grid_structure);
    let outer = GridCodec::new(outer_bounds).decode(&snapshot.out_of_bounds_grid_structure);

    let mut warnings = inner.warnings;
    warnings.extend(outer.warnings);

    let mut layout = inner.layout;
    layout.merge_border(outer.layout, inner_bounds);
    apply_state_overlays(
        &mut layout,
        outer_bounds,
        &snapshot.walls,
        &snapshot.doors,
        &mut warnings,
    );

    DecodedSnapshot {
        step: snapshot.step,
        running: snapshot.running,
        agent_count: snapshot.agent_count,
        counters: snapshot.counters(),
        layout,
        fire: snapshot.fire_locations.iter().map(|p| Cell::from(*p)).collect(),
        smoke: snapshot.smoke_locations.iter().map(|p| Cell::from(*p)).collect(),
        pois: snapshot
            .poi_locations
            .iter()
            .map(|p| (Cell::from(p.position), p.revealed))
            .collect(),
        firefighters: snapshot
            .firefighter_positions
            .iter()
            .map(|f| {
                (
                    f.id,
                    FirefighterToken {
                        cell: Cell::from(f.position),
                        carrying_victim: f.carrying_victim,
                    },
                )
            })
            .collect(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DoorState, WallState};
    use crate::grid::CellPair;
    use serde_json::json;

    const SAMPLE: &str = r#"{
        "step": 3,
        "grid_structure": {
            "(1, 1)": [[[2, 1], 5], [[1, 2], 2]],
            "(1, 2)": [[[1, 1], 2], [[2, 2], 0], [[1, 3], 0]]
        },
        "out_of_bounds_grid_structure": {},
        "damage_markers": 4,
        "rescued_victims": 1,
        "lost_victims": 2,
        "running": true,
        "agent_count": 6,
        "fire_locations": [[3, 4], [3, 4], [2, 2]],
        "smoke_locations": [[5, 6]],
        "poi_locations": [{"position": [2, 4], "revealed": false}],
        "firefighter_positions": [
            {"id": 0, "position": [1, 1], "carrying_victim": false},
            {"id": 1, "position": [4, 4], "carrying_victim": true}
        ]
    }"#;

    #[test]
    fn parses_full_document() {
        let snap = GameSnapshot::from_json_slice(SAMPLE.as_bytes()).unwrap();
        assert_eq!(snap.step, 3);
        assert!(snap.running);
        assert_eq!(snap.agent_count, 6);
        assert_eq!(snap.grid_structure.len(), 2);
        assert_eq!(
            snap.counters(),
            Counters {
                damage_markers: 4,
                rescued_victims: 1,
                lost_victims: 2
            }
        );
        assert_eq!(snap.firefighter_positions[1].position, [4, 4]);
    }

    #[test]
    fn missing_fields_default() {
        let snap = GameSnapshot::from_json_slice(br#"{"running": false}"#).unwrap();
        assert!(snap.grid_structure.is_empty());
        assert!(snap.fire_locations.is_empty());
        assert_eq!(snap.step, 0);
    }

    #[test]
    fn empty_and_malformed_payloads_fail() {
        assert!(matches!(
            GameSnapshot::from_json_slice(b"  \n"),
            Err(DecodeError::Empty)
        ));
        assert!(matches!(
            GameSnapshot::from_json_slice(b"{\"step\": \"three\"}"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn decode_normalizes_elements_and_layout() {
        let snap = GameSnapshot::from_json_slice(SAMPLE.as_bytes()).unwrap();
        let decoded = decode_snapshot(&snap, 6, 8);

        assert_eq!(decoded.fire.len(), 2);
        assert!(decoded.fire.contains(&Cell::new(3, 4)));
        assert_eq!(decoded.pois.get(&Cell::new(2, 4)), Some(&false));
        assert!(decoded.firefighters[&1].carrying_victim);

        let wall = CellPair::new(Cell::new(1, 1), Cell::new(2, 1)).unwrap();
        let door = CellPair::new(Cell::new(1, 1), Cell::new(1, 2)).unwrap();
        assert_eq!(decoded.layout.walls.get(&wall), Some(&WallState::Intact));
        assert_eq!(decoded.layout.doors.get(&door), Some(&DoorState::Closed));
        assert_eq!(decoded.layout.walls.len() + decoded.layout.doors.len(), 2);
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn reported_states_override_grid() {
        let mut snap = GameSnapshot::from_json_slice(SAMPLE.as_bytes()).unwrap();
        snap.walls
            .push(SegmentStateInfo::new(Cell::new(1, 1), Cell::new(2, 1), "damaged"));
        let decoded = decode_snapshot(&snap, 6, 8);
        let wall = CellPair::new(Cell::new(1, 1), Cell::new(2, 1)).unwrap();
        assert_eq!(decoded.layout.walls.get(&wall), Some(&WallState::Damaged));
    }

    #[test]
    fn pair_in_both_maps_decodes_once() {
        let mut snap = GameSnapshot::from_json_slice(SAMPLE.as_bytes()).unwrap();
        snap.out_of_bounds_grid_structure.insert(
            "(1, 1)".into(),
            vec![
                json!([[0, 1], 5]),
                json!([[1, 0], 0]),
                json!([[2, 1], 5]),
                json!([[1, 2], 5]),
            ],
        );
        let decoded = decode_snapshot(&snap, 6, 8);

        let shared = CellPair::new(Cell::new(1, 1), Cell::new(2, 1)).unwrap();
        let border = CellPair::new(Cell::new(0, 1), Cell::new(1, 1)).unwrap();
        assert_eq!(decoded.layout.walls.len(), 2);
        assert!(decoded.layout.walls.contains_key(&shared));
        assert!(decoded.layout.walls.contains_key(&border));
        // The border map's wall on (1,1)-(1,2) does not displace the inner door.
        assert_eq!(decoded.layout.doors.len(), 1);
    }

    #[test]
    fn reported_states_reach_perimeter_walls() {
        let mut snap = GameSnapshot::from_json_slice(SAMPLE.as_bytes()).unwrap();
        snap.out_of_bounds_grid_structure
            .insert("(0, 6)".into(), vec![json!([[0, 5], 0]), json!([[1, 6], 5]), json!([[0, 7], 0])]);
        let perimeter = CellPair::new(Cell::new(0, 6), Cell::new(1, 6)).unwrap();

        snap.walls
            .push(SegmentStateInfo::new(Cell::new(1, 6), Cell::new(0, 6), "damaged"));
        let decoded = decode_snapshot(&snap, 6, 8);
        assert_eq!(decoded.layout.walls.get(&perimeter), Some(&WallState::Damaged));
        assert_eq!(decoded.layout.walls.len(), 2);

        snap.walls[0].state = "broken".into();
        snap.walls
            .push(SegmentStateInfo::new(Cell::new(0, 6), Cell::new(-1, 6), "damaged"));
        let decoded = decode_snapshot(&snap, 6, 8);
        assert_eq!(decoded.layout.walls.get(&perimeter), Some(&WallState::Broken));
        assert!(matches!(
            decoded.warnings.as_slice(),
            [DecodeWarning::BadOverlay(_)]
        ));
    }
}
