//! Grid connection codec.
//!
//! The server describes walls and doors per cell: each cell key maps to a list
//! of `[neighbor, code]` records, one per neighbor, in the fixed order
//! `Up, Left, Down, Right`. Records carry no direction tag; a record's
//! direction is its position among the directions that stay on the grid.
//! Boundary cells omit the off-grid directions, so a corner has two records,
//! an edge cell three and an interior cell four.
//!
//! Every adjacency shows up twice, once from each side. Decoding folds both
//! claims into a single segment per unordered cell pair:
//! - `Open` never overrides anything;
//! - a `Wall` or `Door` claim beats `Open`;
//! - two different non-`Open` claims keep the first one in scan order and
//!   record a [`DecodeWarning::SegmentInconsistency`].
//!
//! Nothing in here fails hard. Malformed input is skipped and reported as a
//! warning so a partial layout can still be drawn.

use std::collections::{btree_map::Entry, BTreeMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::grid::{Cell, CellPair, ConnectionType, Direction, GridBounds};

/// Wire shape of a grid map: `"(row, col)" -> [[[nr, nc], code], ...]`.
pub type GridMap = BTreeMap<String, Vec<Value>>;

/// Wall condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WallState {
    #[default]
    Intact,
    Damaged,
    Broken,
}

impl WallState {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intact" => Some(WallState::Intact),
            "damaged" => Some(WallState::Damaged),
            "broken" => Some(WallState::Broken),
            _ => None,
        }
    }
}

/// Door condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    #[default]
    Closed,
    Open,
    Broken,
}

impl DoorState {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" => Some(DoorState::Closed),
            "open" => Some(DoorState::Open),
            "broken" => Some(DoorState::Broken),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WallSegment {
    pub pair: CellPair,
    pub state: WallState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoorSegment {
    pub pair: CellPair,
    pub state: DoorState,
}

/// One directed fact read from a cell's record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub direction: Direction,
    pub neighbor: Cell,
    pub kind: ConnectionType,
}

/// Non-fatal problems found while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    BadCellKey(String),
    CellOutOfBounds(Cell),
    MalformedRecord {
        cell: Cell,
        index: usize,
    },
    UnexpectedRecordCount {
        cell: Cell,
        expected: usize,
        found: usize,
    },
    NeighborMismatch {
        cell: Cell,
        direction: Direction,
        claimed: Cell,
    },
    SegmentInconsistency {
        pair: CellPair,
        kept: ConnectionType,
        rejected: ConnectionType,
    },
    BadOverlay(String),
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::BadCellKey(key) => write!(f, "unparseable cell key {key:?}"),
            DecodeWarning::CellOutOfBounds(cell) => write!(f, "cell {cell} is outside the grid"),
            DecodeWarning::MalformedRecord { cell, index } => {
                write!(f, "record {index} of cell {cell} is not a [neighbor, code] pair")
            }
            DecodeWarning::UnexpectedRecordCount {
                cell,
                expected,
                found,
            } => write!(f, "cell {cell} has {found} records, expected {expected}"),
            DecodeWarning::NeighborMismatch {
                cell,
                direction,
                claimed,
            } => write!(
                f,
                "cell {cell} record for {direction:?} names neighbor {claimed}"
            ),
            DecodeWarning::SegmentInconsistency {
                pair,
                kept,
                rejected,
            } => write!(
                f,
                "segment {pair} claimed as {kept:?} and {rejected:?}; keeping {kept:?}"
            ),
            DecodeWarning::BadOverlay(reason) => write!(f, "bad segment state entry: {reason}"),
        }
    }
}

/// Normalized walls and doors, at most one per cell pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedLayout {
    pub walls: BTreeMap<CellPair, WallState>,
    pub doors: BTreeMap<CellPair, DoorState>,
}

impl DecodedLayout {
    pub fn wall_segments(&self) -> impl Iterator<Item = WallSegment> + '_ {
        self.walls
            .iter()
            .map(|(pair, state)| WallSegment { pair: *pair, state: *state })
    }

    pub fn door_segments(&self) -> impl Iterator<Item = DoorSegment> + '_ {
        self.doors
            .iter()
            .map(|(pair, state)| DoorSegment { pair: *pair, state: *state })
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty() && self.doors.is_empty()
    }

    /// Connection type recorded for a pair, `Open` when nothing is there.
    pub fn connection(&self, pair: &CellPair) -> ConnectionType {
        if self.walls.contains_key(pair) {
            ConnectionType::Wall
        } else if self.doors.contains_key(pair) {
            ConnectionType::Door
        } else {
            ConnectionType::Open
        }
    }

    /// Adds the segments of the out-of-bounds map.
    ///
    /// Pairs with both cells inside `inner` belong to the inner map and are
    /// dropped here, so every pair is placed at most once.
    pub fn merge_border(&mut self, border: DecodedLayout, inner: GridBounds) {
        let owned_by_border =
            |pair: &CellPair| !(inner.contains(pair.a()) && inner.contains(pair.b()));
        for (pair, state) in border.walls.into_iter().filter(|(p, _)| owned_by_border(p)) {
            if !self.doors.contains_key(&pair) {
                self.walls.entry(pair).or_insert(state);
            }
        }
        for (pair, state) in border.doors.into_iter().filter(|(p, _)| owned_by_border(p)) {
            if !self.walls.contains_key(&pair) {
                self.doors.entry(pair).or_insert(state);
            }
        }
    }
}

/// Result of decoding one grid map.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    pub layout: DecodedLayout,
    pub warnings: Vec<DecodeWarning>,
}

/// Decoder for one grid map against fixed bounds.
#[derive(Debug, Clone, Copy)]
pub struct GridCodec {
    bounds: GridBounds,
}

impl GridCodec {
    pub fn new(bounds: GridBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Reads one cell's records into directed connections.
    ///
    /// Open connections are returned too; callers decide what to keep.
    pub fn decode_cell(
        &self,
        cell: Cell,
        records: &[Value],
        warnings: &mut Vec<DecodeWarning>,
    ) -> Vec<Connection> {
        let directions = self.bounds.available_directions(cell);
        if records.len() != directions.len() {
            push_warning(
                warnings,
                DecodeWarning::UnexpectedRecordCount {
                    cell,
                    expected: directions.len(),
                    found: records.len(),
                },
            );
        }

        let mut out = Vec::with_capacity(directions.len());
        for (index, (record, direction)) in records.iter().zip(directions).enumerate() {
            let Some([position, code]) = record.as_array().map(Vec::as_slice).and_then(as_pair)
            else {
                push_warning(warnings, DecodeWarning::MalformedRecord { cell, index });
                continue;
            };

            let neighbor = cell.step(direction);
            if let Some(claimed) = parse_position(position) {
                if claimed != neighbor {
                    push_warning(
                        warnings,
                        DecodeWarning::NeighborMismatch {
                            cell,
                            direction,
                            claimed,
                        },
                    );
                }
            }

            out.push(Connection {
                direction,
                neighbor,
                kind: ConnectionType::from_json(code),
            });
        }
        out
    }

    /// Decodes a whole grid map into a deduplicated layout.
    pub fn decode(&self, map: &GridMap) -> Decoded {
        let mut warnings = Vec::new();

        let mut cells: Vec<(Cell, &Vec<Value>)> = Vec::with_capacity(map.len());
        for (key, records) in map {
            match Cell::parse_key(key) {
                Some(cell) if self.bounds.contains(cell) => cells.push((cell, records)),
                Some(cell) => push_warning(&mut warnings, DecodeWarning::CellOutOfBounds(cell)),
                None => push_warning(&mut warnings, DecodeWarning::BadCellKey(key.clone())),
            }
        }
        // Scan order is row-major over parsed cells, not the string order of
        // the keys ("(1, 10)" sorts before "(1, 2)").
        cells.sort_by_key(|(cell, _)| *cell);

        let mut claims: BTreeMap<CellPair, ConnectionType> = BTreeMap::new();
        for (cell, records) in cells {
            for conn in self.decode_cell(cell, records, &mut warnings) {
                if conn.kind == ConnectionType::Open {
                    continue;
                }
                let Some(pair) = CellPair::new(cell, conn.neighbor) else {
                    continue;
                };
                match claims.entry(pair) {
                    Entry::Vacant(e) => {
                        e.insert(conn.kind);
                    }
                    Entry::Occupied(e) if *e.get() == conn.kind => {}
                    Entry::Occupied(e) => push_warning(
                        &mut warnings,
                        DecodeWarning::SegmentInconsistency {
                            pair,
                            kept: *e.get(),
                            rejected: conn.kind,
                        },
                    ),
                }
            }
        }

        let mut layout = DecodedLayout::default();
        for (pair, kind) in claims {
            match kind {
                ConnectionType::Wall => {
                    layout.walls.insert(pair, WallState::Intact);
                }
                ConnectionType::Door => {
                    layout.doors.insert(pair, DoorState::Closed);
                }
                ConnectionType::Open => {}
            }
        }

        Decoded { layout, warnings }
    }
}

/// Per-segment state reported next to the grid map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentStateInfo {
    pub cells: [[i32; 2]; 2],
    pub state: String,
}

impl SegmentStateInfo {
    pub fn new(a: Cell, b: Cell, state: &str) -> Self {
        Self {
            cells: [[a.row, a.col], [b.row, b.col]],
            state: state.to_string(),
        }
    }

    /// The pair, if both cells are neighbors inside `bounds`.
    fn pair_within(&self, bounds: GridBounds) -> Option<CellPair> {
        CellPair::new(self.cells[0].into(), self.cells[1].into())
            .filter(|pair| bounds.contains(pair.a()) && bounds.contains(pair.b()))
    }
}

/// Applies reported wall/door states on top of a decoded layout.
///
/// `bounds` is the outermost ring the layout covers; entries naming a cell
/// outside it are rejected. A state entry for a pair the grid maps did not
/// claim inserts the segment; the reported state is authoritative.
pub fn apply_state_overlays(
    layout: &mut DecodedLayout,
    bounds: GridBounds,
    walls: &[SegmentStateInfo],
    doors: &[SegmentStateInfo],
    warnings: &mut Vec<DecodeWarning>,
) {
    for info in walls {
        match (info.pair_within(bounds), WallState::parse(&info.state)) {
            (Some(pair), Some(state)) => {
                layout.doors.remove(&pair);
                layout.walls.insert(pair, state);
            }
            _ => push_warning(warnings, DecodeWarning::BadOverlay(format!("wall {info:?}"))),
        }
    }
    for info in doors {
        match (info.pair_within(bounds), DoorState::parse(&info.state)) {
            (Some(pair), Some(state)) => {
                layout.walls.remove(&pair);
                layout.doors.insert(pair, state);
            }
            _ => push_warning(warnings, DecodeWarning::BadOverlay(format!("door {info:?}"))),
        }
    }
}

/// Produces the wire grid map for a layout: every cell in `bounds`, with one
/// record per on-grid direction in canonical order.
pub fn encode_grid(bounds: GridBounds, layout: &DecodedLayout) -> GridMap {
    let mut map = GridMap::new();
    for cell in bounds.cells() {
        let records = bounds
            .available_directions(cell)
            .into_iter()
            .map(|dir| {
                let neighbor = cell.step(dir);
                let code = CellPair::new(cell, neighbor)
                    .map(|pair| layout.connection(&pair).code())
                    .unwrap_or(ConnectionType::OPEN_CODE);
                json!([[neighbor.row, neighbor.col], code])
            })
            .collect();
        map.insert(cell.to_key(), records);
    }
    map
}

fn as_pair(items: &[Value]) -> Option<&[Value; 2]> {
    items.try_into().ok()
}

fn parse_position(value: &Value) -> Option<Cell> {
    let items = value.as_array()?;
    if items.len() != 2 {
        return None;
    }
    let row = i32::try_from(items[0].as_i64()?).ok()?;
    let col = i32::try_from(items[1].as_i64()?).ok()?;
    Some(Cell::new(row, col))
}

fn push_warning(warnings: &mut Vec<DecodeWarning>, warning: DecodeWarning) {
    warn!(%warning, "grid decode");
    warnings.push(warning);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inner() -> GridCodec {
        GridCodec::new(GridBounds::inner(6, 8))
    }

    fn rec(n: (i32, i32), code: i64) -> Value {
        json!([[n.0, n.1], code])
    }

    fn pair(a: (i32, i32), b: (i32, i32)) -> CellPair {
        CellPair::new(Cell::new(a.0, a.1), Cell::new(b.0, b.1)).unwrap()
    }

    #[test]
    fn interior_cell_maps_four_records_in_canonical_order() {
        let cell = Cell::new(3, 4);
        let records = vec![rec((2, 4), 5), rec((3, 3), 0), rec((4, 4), 2), rec((3, 5), 0)];
        let mut warnings = Vec::new();
        let conns = inner().decode_cell(cell, &records, &mut warnings);

        assert!(warnings.is_empty());
        let dirs: Vec<_> = conns.iter().map(|c| c.direction).collect();
        assert_eq!(dirs, Direction::CANONICAL.to_vec());
        assert_eq!(conns[0].kind, ConnectionType::Wall);
        assert_eq!(conns[0].neighbor, Cell::new(2, 4));
        assert_eq!(conns[2].kind, ConnectionType::Door);
        assert_eq!(conns[2].neighbor, Cell::new(4, 4));
    }

    #[test]
    fn corner_cell_wall_then_door() {
        // (1,1) on a 6x8 grid keeps only Down and Right.
        let records = vec![json!([null, 5]), json!([null, 2])];
        let mut warnings = Vec::new();
        let conns = inner().decode_cell(Cell::new(1, 1), &records, &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(conns.len(), 2);
        assert_eq!(conns[0].direction, Direction::Down);
        assert_eq!(conns[0].neighbor, Cell::new(2, 1));
        assert_eq!(conns[0].kind, ConnectionType::Wall);
        assert_eq!(conns[1].direction, Direction::Right);
        assert_eq!(conns[1].neighbor, Cell::new(1, 2));
        assert_eq!(conns[1].kind, ConnectionType::Door);
    }

    #[test]
    fn edge_cells_keep_three_directions() {
        let codec = inner();
        let three = vec![json!([null, 0]); 3];
        let cases = [
            (Cell::new(1, 4), [Direction::Left, Direction::Down, Direction::Right]),
            (Cell::new(6, 4), [Direction::Up, Direction::Left, Direction::Right]),
            (Cell::new(3, 1), [Direction::Up, Direction::Down, Direction::Right]),
            (Cell::new(3, 8), [Direction::Up, Direction::Left, Direction::Down]),
        ];
        for (cell, expected) in cases {
            let mut warnings = Vec::new();
            let dirs: Vec<_> = codec
                .decode_cell(cell, &three, &mut warnings)
                .into_iter()
                .map(|c| c.direction)
                .collect();
            assert_eq!(dirs, expected.to_vec(), "cell {cell}");
            assert!(warnings.is_empty());
        }
    }

    #[test]
    fn both_sides_agreeing_yield_one_segment() {
        let mut map = GridMap::new();
        map.insert("(3, 4)".into(), vec![rec((2, 4), 0), rec((3, 3), 0), rec((4, 4), 0), rec((3, 5), 5)]);
        map.insert("(3, 5)".into(), vec![rec((2, 5), 0), rec((3, 4), 5), rec((4, 5), 0), rec((3, 6), 0)]);

        let decoded = inner().decode(&map);
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.layout.walls.len(), 1);
        assert_eq!(
            decoded.layout.walls.get(&pair((3, 4), (3, 5))),
            Some(&WallState::Intact)
        );
        assert!(decoded.layout.doors.is_empty());
    }

    #[test]
    fn one_sided_claim_beats_open() {
        let mut map = GridMap::new();
        map.insert("(2, 2)".into(), vec![rec((1, 2), 0), rec((2, 1), 0), rec((3, 2), 2), rec((2, 3), 0)]);
        map.insert("(3, 2)".into(), vec![rec((2, 2), 0), rec((3, 1), 0), rec((4, 2), 0), rec((3, 3), 0)]);

        let decoded = inner().decode(&map);
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.layout.doors.len(), 1);
        assert!(decoded.layout.doors.contains_key(&pair((2, 2), (3, 2))));
    }

    #[test]
    fn conflicting_claims_keep_first_in_scan_order() {
        let codec = GridCodec::new(GridBounds::inner(6, 12));
        let mut map = GridMap::new();
        // As strings "(1, 10)" sorts before "(1, 9)"; scan order is by cell.
        map.insert("(1, 10)".into(), vec![rec((1, 9), 2), rec((2, 10), 0), rec((1, 11), 0)]);
        map.insert("(1, 9)".into(), vec![rec((1, 8), 0), rec((2, 9), 0), rec((1, 10), 5)]);

        let decoded = codec.decode(&map);
        let p = pair((1, 9), (1, 10));
        assert_eq!(decoded.layout.walls.get(&p), Some(&WallState::Intact));
        assert!(!decoded.layout.doors.contains_key(&p));
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::SegmentInconsistency {
                pair: p,
                kept: ConnectionType::Wall,
                rejected: ConnectionType::Door,
            }]
        );
    }

    #[test]
    fn malformed_records_are_skipped() {
        let cell = Cell::new(3, 4);
        let records = vec![json!([[2, 4]]), json!("junk"), rec((4, 4), 5), json!([[3, 5], 5, 1])];
        let mut warnings = Vec::new();
        let conns = inner().decode_cell(cell, &records, &mut warnings);

        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].direction, Direction::Down);
        assert_eq!(warnings.len(), 3);
        assert!(warnings
            .iter()
            .all(|w| matches!(w, DecodeWarning::MalformedRecord { .. })));
    }

    #[test]
    fn unparseable_code_is_open() {
        let records = vec![json!([[2, 1], "wall"]), json!([[1, 2], null])];
        let mut warnings = Vec::new();
        let conns = inner().decode_cell(Cell::new(1, 1), &records, &mut warnings);
        assert!(conns.iter().all(|c| c.kind == ConnectionType::Open));
    }

    #[test]
    fn extra_records_are_dropped_with_warning() {
        let records = vec![rec((0, 1), 5), rec((1, 0), 5), rec((2, 1), 5), rec((1, 2), 5)];
        let mut warnings = Vec::new();
        let conns = inner().decode_cell(Cell::new(1, 1), &records, &mut warnings);
        assert_eq!(conns.len(), 2);
        assert!(matches!(
            warnings[0],
            DecodeWarning::UnexpectedRecordCount { expected: 2, found: 4, .. }
        ));
    }

    #[test]
    fn bad_keys_and_out_of_bounds_cells_are_reported() {
        let mut map = GridMap::new();
        map.insert("nonsense".into(), vec![]);
        map.insert("(9, 9)".into(), vec![]);
        let decoded = inner().decode(&map);
        assert!(decoded.layout.is_empty());
        assert!(decoded.warnings.contains(&DecodeWarning::BadCellKey("nonsense".into())));
        assert!(decoded
            .warnings
            .contains(&DecodeWarning::CellOutOfBounds(Cell::new(9, 9))));
    }

    #[test]
    fn outer_bounds_decode_border_ring() {
        let codec = GridCodec::new(GridBounds::outer(6, 8));
        let mut map = GridMap::new();
        // (0, 0) is the outer corner: Down and Right only.
        map.insert("(0, 0)".into(), vec![rec((1, 0), 0), rec((0, 1), 2)]);
        let decoded = codec.decode(&map);
        assert!(decoded.warnings.is_empty());
        assert!(decoded.layout.doors.contains_key(&pair((0, 0), (0, 1))));
    }

    #[test]
    fn encoder_output_decodes_to_same_layout() {
        let bounds = GridBounds::inner(6, 8);
        let mut layout = DecodedLayout::default();
        layout.walls.insert(pair((3, 3), (3, 4)), WallState::Intact);
        layout.walls.insert(pair((4, 5), (5, 5)), WallState::Intact);
        layout.doors.insert(pair((1, 2), (1, 3)), DoorState::Closed);

        let map = encode_grid(bounds, &layout);
        assert_eq!(map.len(), 48);
        assert_eq!(map["(1, 1)"].len(), 2);
        assert_eq!(map["(1, 4)"].len(), 3);
        assert_eq!(map["(3, 4)"].len(), 4);

        let decoded = GridCodec::new(bounds).decode(&map);
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.layout, layout);
    }

    #[test]
    fn overlays_set_state_and_insert_missing_segments() {
        let mut layout = DecodedLayout::default();
        layout.walls.insert(pair((3, 3), (3, 4)), WallState::Intact);
        let mut warnings = Vec::new();

        apply_state_overlays(
            &mut layout,
            GridBounds::outer(6, 8),
            &[
                SegmentStateInfo::new(Cell::new(3, 4), Cell::new(3, 3), "damaged"),
                SegmentStateInfo::new(Cell::new(5, 5), Cell::new(5, 6), "broken"),
            ],
            &[
                SegmentStateInfo::new(Cell::new(1, 2), Cell::new(1, 3), "open"),
                SegmentStateInfo::new(Cell::new(1, 1), Cell::new(3, 3), "open"),
                SegmentStateInfo::new(Cell::new(2, 2), Cell::new(2, 3), "ajar"),
            ],
            &mut warnings,
        );

        assert_eq!(layout.walls[&pair((3, 3), (3, 4))], WallState::Damaged);
        assert_eq!(layout.walls[&pair((5, 5), (5, 6))], WallState::Broken);
        assert_eq!(layout.doors[&pair((1, 2), (1, 3))], DoorState::Open);
        assert_eq!(warnings.len(), 2);
    }
    #[test]
    fn missing_records_fill_the_first_directions() {
        let cell = Cell::new(3, 4);
        let records = vec![rec((2, 4), 5), rec((3, 3), 2)];
        let mut warnings = Vec::new();
        let conns = inner().decode_cell(cell, &records, &mut warnings);

        let dirs: Vec<_> = conns.iter().map(|c| c.direction).collect();
        assert_eq!(dirs, vec![Direction::Up, Direction::Left]);
        assert_eq!(conns[0].kind, ConnectionType::Wall);
        assert_eq!(conns[1].kind, ConnectionType::Door);
        assert_eq!(
            warnings,
            vec![DecodeWarning::UnexpectedRecordCount {
                cell,
                expected: 4,
                found: 2,
            }]
        );
    }

    #[test]
    fn mismatched_neighbor_is_reported_and_position_wins() {
        let cell = Cell::new(3, 4);
        let records = vec![rec((9, 9), 5), rec((3, 3), 0), rec((4, 4), 0), rec((3, 5), 0)];
        let mut warnings = Vec::new();
        let conns = inner().decode_cell(cell, &records, &mut warnings);

        assert_eq!(conns.len(), 4);
        assert_eq!(conns[0].direction, Direction::Up);
        assert_eq!(conns[0].neighbor, Cell::new(2, 4));
        assert_eq!(conns[0].kind, ConnectionType::Wall);
        assert_eq!(
            warnings,
            vec![DecodeWarning::NeighborMismatch {
                cell,
                direction: Direction::Up,
                claimed: Cell::new(9, 9),
            }]
        );
    }

    #[test]
    fn border_merge_keeps_each_pair_once() {
        let mut map = GridMap::new();
        map.insert("(1, 1)".into(), vec![rec((2, 1), 5), rec((1, 2), 0)]);
        let mut layout = inner().decode(&map).layout;

        let mut border_map = GridMap::new();
        border_map.insert(
            "(1, 1)".into(),
            vec![rec((0, 1), 5), rec((1, 0), 2), rec((2, 1), 5), rec((1, 2), 5)],
        );
        let border = GridCodec::new(GridBounds::outer(6, 8)).decode(&border_map).layout;
        layout.merge_border(border, GridBounds::inner(6, 8));

        // (1,1)-(2,1) comes from the inner map only; (1,1)-(1,2) stays open.
        assert_eq!(layout.walls.len(), 2);
        assert!(layout.walls.contains_key(&pair((1, 1), (2, 1))));
        assert!(layout.walls.contains_key(&pair((0, 1), (1, 1))));
        assert!(!layout.walls.contains_key(&pair((1, 1), (1, 2))));
        assert_eq!(layout.doors.len(), 1);
        assert!(layout.doors.contains_key(&pair((1, 0), (1, 1))));
    }

    #[test]
    fn overlays_reach_the_border_and_reject_cells_beyond_it() {
        let mut layout = DecodedLayout::default();
        layout.walls.insert(pair((0, 6), (1, 6)), WallState::Intact);
        layout.walls.insert(pair((6, 8), (6, 9)), WallState::Intact);
        let mut warnings = Vec::new();

        apply_state_overlays(
            &mut layout,
            GridBounds::outer(6, 8),
            &[
                SegmentStateInfo::new(Cell::new(1, 6), Cell::new(0, 6), "damaged"),
                SegmentStateInfo::new(Cell::new(6, 9), Cell::new(6, 8), "broken"),
                SegmentStateInfo::new(Cell::new(0, 6), Cell::new(-1, 6), "damaged"),
            ],
            &[SegmentStateInfo::new(Cell::new(7, 3), Cell::new(8, 3), "open")],
            &mut warnings,
        );

        assert_eq!(layout.walls.len(), 2);
        assert_eq!(layout.walls[&pair((0, 6), (1, 6))], WallState::Damaged);
        assert_eq!(layout.walls[&pair((6, 8), (6, 9))], WallState::Broken);
        assert!(layout.doors.is_empty());
        assert_eq!(warnings.len(), 2);
        assert!(warnings
            .iter()
            .all(|w| matches!(w, DecodeWarning::BadOverlay(_))));
    }
}
