//! Built-in demo session.
//!
//! A small house on the default 6×8 board: perimeter walls with four
//! entrances, two interior walls with a door each, a fire that spreads for a
//! few steps and three firefighters that walk in, reveal a point of interest
//! and carry a victim out.

use rescue_shared::{
    codec::{encode_grid, DecodedLayout, DoorState, SegmentStateInfo, WallState},
    grid::{Cell, CellPair, Direction, GridBounds},
    snapshot::{FirefighterInfo, GameSnapshot, PoiInfo},
};

/// Ring cells next to the perimeter that get a door instead of a wall.
const ENTRANCES: [([i32; 2], [i32; 2]); 4] = [
    ([1, 6], [0, 6]),
    ([3, 1], [3, 0]),
    ([4, 8], [4, 9]),
    ([6, 3], [7, 3]),
];

struct Frame {
    fire: &'static [[i32; 2]],
    smoke: &'static [[i32; 2]],
    firefighters: [([i32; 2], bool); 3],
    poi_revealed: bool,
    damaged_wall: bool,
    door_open: bool,
    damage_markers: u32,
    rescued_victims: u32,
}

const FRAMES: [Frame; 6] = [
    Frame {
        fire: &[[2, 2], [5, 6]],
        smoke: &[[2, 3]],
        firefighters: [([0, 6], false), ([3, 0], false), ([7, 3], false)],
        poi_revealed: false,
        damaged_wall: false,
        door_open: false,
        damage_markers: 0,
        rescued_victims: 0,
    },
    Frame {
        fire: &[[2, 2], [2, 3], [5, 6]],
        smoke: &[[3, 3], [5, 7]],
        firefighters: [([1, 6], false), ([3, 1], false), ([6, 3], false)],
        poi_revealed: false,
        damaged_wall: false,
        door_open: false,
        damage_markers: 1,
        rescued_victims: 0,
    },
    Frame {
        fire: &[[2, 2], [2, 3], [5, 6], [5, 7]],
        smoke: &[[3, 3], [4, 6]],
        firefighters: [([2, 6], false), ([3, 2], false), ([5, 3], false)],
        poi_revealed: true,
        damaged_wall: true,
        door_open: false,
        damage_markers: 2,
        rescued_victims: 0,
    },
    Frame {
        fire: &[[2, 3], [5, 6], [5, 7]],
        smoke: &[[4, 6]],
        firefighters: [([2, 5], false), ([2, 2], false), ([5, 4], false)],
        poi_revealed: true,
        damaged_wall: true,
        door_open: true,
        damage_markers: 2,
        rescued_victims: 0,
    },
    Frame {
        fire: &[[5, 7]],
        smoke: &[],
        firefighters: [([2, 4], true), ([2, 3], false), ([5, 6], false)],
        poi_revealed: true,
        damaged_wall: true,
        door_open: true,
        damage_markers: 3,
        rescued_victims: 0,
    },
    Frame {
        fire: &[],
        smoke: &[],
        firefighters: [([1, 6], false), ([2, 3], false), ([5, 7], false)],
        poi_revealed: true,
        damaged_wall: true,
        door_open: true,
        damage_markers: 3,
        rescued_victims: 1,
    },
];

fn pair(a: [i32; 2], b: [i32; 2]) -> Option<CellPair> {
    CellPair::new(a.into(), b.into())
}

/// Interior walls: a vertical run between columns 3 and 4 over rows 1..=3 and
/// a horizontal run between rows 3 and 4 over columns 5..=8, one door each.
fn interior(inner: GridBounds) -> DecodedLayout {
    let mut layout = DecodedLayout::default();
    for row in 1..=3 {
        if let Some(p) = pair([row, 3], [row, 4]) {
            layout.walls.insert(p, WallState::Intact);
        }
    }
    for col in 5..=8 {
        if let Some(p) = pair([3, col], [4, col]) {
            layout.walls.insert(p, WallState::Intact);
        }
    }
    for (a, b) in [([2, 3], [2, 4]), ([3, 6], [4, 6])] {
        if let Some(p) = pair(a, b) {
            layout.walls.remove(&p);
            layout.doors.insert(p, DoorState::Closed);
        }
    }
    layout
        .walls
        .retain(|p, _| inner.contains(p.a()) && inner.contains(p.b()));
    layout
        .doors
        .retain(|p, _| inner.contains(p.a()) && inner.contains(p.b()));
    layout
}

/// Walls between the building and its border ring, with doors at the
/// entrances.
fn perimeter(inner: GridBounds) -> DecodedLayout {
    let mut layout = DecodedLayout::default();
    for cell in inner.cells() {
        for dir in Direction::CANONICAL {
            let outside = cell.step(dir);
            if inner.contains(outside) {
                continue;
            }
            if let Some(p) = CellPair::new(cell, outside) {
                layout.walls.insert(p, WallState::Intact);
            }
        }
    }
    for (a, b) in ENTRANCES {
        if let Some(p) = pair(a, b) {
            if layout.walls.remove(&p).is_some() {
                layout.doors.insert(p, DoorState::Open);
            }
        }
    }
    layout
}

/// The demo session for a `rows × cols` board. The last snapshot reports the
/// simulation as finished.
pub fn demo_script(rows: i32, cols: i32) -> Vec<GameSnapshot> {
    let inner = GridBounds::inner(rows, cols);
    let outer = GridBounds::outer(rows, cols);
    let grid_structure = encode_grid(inner, &interior(inner));
    let out_of_bounds_grid_structure = encode_grid(outer, &perimeter(inner));

    let on_board = |cells: &[[i32; 2]]| -> Vec<[i32; 2]> {
        cells
            .iter()
            .copied()
            .filter(|p| inner.contains(Cell::from(*p)))
            .collect()
    };

    FRAMES
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let mut walls = Vec::new();
            if frame.damaged_wall && inner.contains(Cell::new(1, 4)) {
                walls.push(SegmentStateInfo::new(Cell::new(1, 3), Cell::new(1, 4), "damaged"));
            }
            let mut doors = Vec::new();
            if frame.door_open && inner.contains(Cell::new(4, 6)) {
                doors.push(SegmentStateInfo::new(Cell::new(3, 6), Cell::new(4, 6), "open"));
            }

            GameSnapshot {
                step: i as u64,
                grid_structure: grid_structure.clone(),
                out_of_bounds_grid_structure: out_of_bounds_grid_structure.clone(),
                damage_markers: frame.damage_markers,
                rescued_victims: frame.rescued_victims,
                lost_victims: 0,
                running: i + 1 < FRAMES.len(),
                agent_count: frame.firefighters.len() as u32,
                fire_locations: on_board(frame.fire),
                smoke_locations: on_board(frame.smoke),
                poi_locations: on_board(&[[2, 4]])
                    .into_iter()
                    .filter(|_| frame.rescued_victims == 0)
                    .map(|position| PoiInfo {
                        position,
                        revealed: frame.poi_revealed,
                    })
                    .collect(),
                firefighter_positions: frame
                    .firefighters
                    .iter()
                    .enumerate()
                    .filter(|(_, (pos, _))| outer.contains(Cell::from(*pos)))
                    .map(|(id, (position, carrying_victim))| FirefighterInfo {
                        id: id as i64,
                        position: *position,
                        carrying_victim: *carrying_victim,
                    })
                    .collect(),
                walls,
                doors,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescue_shared::snapshot::decode_snapshot;

    #[test]
    fn demo_decodes_cleanly() {
        let script = demo_script(6, 8);
        assert_eq!(script.len(), FRAMES.len());
        for snap in &script {
            let decoded = decode_snapshot(snap, 6, 8);
            assert!(decoded.warnings.is_empty(), "{:?}", decoded.warnings);
        }
    }

    #[test]
    fn demo_layout_round_trips_through_the_wire_map() {
        let decoded = decode_snapshot(&demo_script(6, 8)[0], 6, 8);
        let inner = GridBounds::inner(6, 8);
        let mut expected = interior(inner);
        expected.merge_border(perimeter(inner), inner);
        assert_eq!(decoded.layout, expected);
        // 2 * (6 + 8) perimeter edges, four of them doors, plus the interior.
        assert_eq!(decoded.layout.walls.len(), 24 + 5);
        assert_eq!(decoded.layout.doors.len(), 4 + 2);
    }

    #[test]
    fn only_the_last_frame_is_finished() {
        let script = demo_script(6, 8);
        let (last, rest) = script.split_last().unwrap();
        assert!(!last.running);
        assert!(rest.iter().all(|s| s.running));
    }

    #[test]
    fn overlays_change_segment_state() {
        let decoded = decode_snapshot(&demo_script(6, 8)[3], 6, 8);
        let wall = pair([1, 3], [1, 4]).unwrap();
        let door = pair([3, 6], [4, 6]).unwrap();
        assert_eq!(decoded.layout.walls.get(&wall), Some(&WallState::Damaged));
        assert_eq!(decoded.layout.doors.get(&door), Some(&DoorState::Open));
    }
}
