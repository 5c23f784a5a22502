//! Grid primitives: cells, directions, bounds, and cell pairs.
//!
//! Rows grow downward and columns grow rightward. The inner building grid is
//! 1-indexed; the out-of-bounds ring adds row/column 0 and `rows + 1` /
//! `cols + 1` around it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single grid square, addressed as `(row, col)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The neighboring cell one step toward `dir`. No bounds check.
    pub fn step(self, dir: Direction) -> Self {
        let (dr, dc) = dir.delta();
        Self::new(self.row + dr, self.col + dc)
    }

    /// Direction from `self` to an orthogonally adjacent `other`.
    pub fn direction_to(self, other: Cell) -> Option<Direction> {
        Direction::CANONICAL
            .into_iter()
            .find(|d| self.step(*d) == other)
    }

    /// Parses the server's string key form, `"(row, col)"`.
    pub fn parse_key(key: &str) -> Option<Self> {
        let inner = key.trim().strip_prefix('(')?.strip_suffix(')')?;
        let mut parts = inner.split(',');
        let row = parts.next()?.trim().parse().ok()?;
        let col = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(row, col))
    }

    /// Formats the cell the way the server keys its grid maps.
    pub fn to_key(self) -> String {
        format!("({}, {})", self.row, self.col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<[i32; 2]> for Cell {
    fn from(v: [i32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

/// Cardinal direction on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Record order used by the server's connection lists.
    pub const CANONICAL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    /// `(row delta, col delta)`.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Left => (0, -1),
            Direction::Down => (1, 0),
            Direction::Right => (0, 1),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
        }
    }

    /// True for directions that move between rows.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// Inclusive row/column ranges a grid map is decoded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_row: i32,
    pub max_row: i32,
    pub min_col: i32,
    pub max_col: i32,
}

impl GridBounds {
    /// The building itself: `1..=rows × 1..=cols`.
    pub const fn inner(rows: i32, cols: i32) -> Self {
        Self {
            min_row: 1,
            max_row: rows,
            min_col: 1,
            max_col: cols,
        }
    }

    /// The building plus its surrounding ring: `0..=rows+1 × 0..=cols+1`.
    pub const fn outer(rows: i32, cols: i32) -> Self {
        Self {
            min_row: 0,
            max_row: rows + 1,
            min_col: 0,
            max_col: cols + 1,
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (self.min_row..=self.max_row).contains(&cell.row)
            && (self.min_col..=self.max_col).contains(&cell.col)
    }

    /// Directions from `cell` that stay inside the bounds, in canonical order.
    ///
    /// This is the positional contract of the connection encoding: a cell on
    /// a boundary simply omits the records pointing off-grid.
    pub fn available_directions(&self, cell: Cell) -> Vec<Direction> {
        Direction::CANONICAL
            .into_iter()
            .filter(|d| self.contains(cell.step(*d)))
            .collect()
    }

    /// Cells in scan order (row-major).
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (self.min_row..=self.max_row)
            .flat_map(move |row| (self.min_col..=self.max_col).map(move |col| Cell::new(row, col)))
    }
}

/// Unordered pair of adjacent cells, stored with `a < b`.
///
/// Because cells order row-major, `b` is always `Down` or `Right` of `a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPair {
    a: Cell,
    b: Cell,
}

impl CellPair {
    /// Builds the canonical pair, or `None` if the cells are not orthogonal
    /// neighbors.
    pub fn new(x: Cell, y: Cell) -> Option<Self> {
        x.direction_to(y)?;
        Some(if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } })
    }

    pub fn a(&self) -> Cell {
        self.a
    }

    pub fn b(&self) -> Cell {
        self.b
    }

    /// Direction from `a` to `b`; always `Down` or `Right`.
    pub fn direction(&self) -> Direction {
        if self.a.row == self.b.row {
            Direction::Right
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for CellPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// What sits between two adjacent cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    Open,
    Door,
    Wall,
}

impl ConnectionType {
    pub const WALL_CODE: i64 = 5;
    pub const DOOR_CODE: i64 = 2;
    pub const OPEN_CODE: i64 = 0;

    pub fn from_code(code: i64) -> Self {
        match code {
            Self::WALL_CODE => ConnectionType::Wall,
            Self::DOOR_CODE => ConnectionType::Door,
            _ => ConnectionType::Open,
        }
    }

    /// Reads a wire value. Anything that is not an integer is `Open`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        value.as_i64().map(Self::from_code).unwrap_or(ConnectionType::Open)
    }

    pub fn code(self) -> i64 {
        match self {
            ConnectionType::Open => Self::OPEN_CODE,
            ConnectionType::Door => Self::DOOR_CODE,
            ConnectionType::Wall => Self::WALL_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_accepts_server_format() {
        assert_eq!(Cell::parse_key("(3, 4)"), Some(Cell::new(3, 4)));
        assert_eq!(Cell::parse_key(" (10,2) "), Some(Cell::new(10, 2)));
        assert_eq!(Cell::parse_key("(0, -1)"), Some(Cell::new(0, -1)));
    }

    #[test]
    fn parse_key_rejects_garbage() {
        assert_eq!(Cell::parse_key("3, 4"), None);
        assert_eq!(Cell::parse_key("(3)"), None);
        assert_eq!(Cell::parse_key("(3, 4, 5)"), None);
        assert_eq!(Cell::parse_key("(a, 4)"), None);
    }

    #[test]
    fn key_format_matches_parse() {
        let c = Cell::new(6, 8);
        assert_eq!(c.to_key(), "(6, 8)");
        assert_eq!(Cell::parse_key(&c.to_key()), Some(c));
    }

    #[test]
    fn available_directions_by_position() {
        let b = GridBounds::inner(6, 8);
        assert_eq!(b.available_directions(Cell::new(3, 4)), Direction::CANONICAL.to_vec());
        assert_eq!(
            b.available_directions(Cell::new(1, 1)),
            vec![Direction::Down, Direction::Right]
        );
        assert_eq!(
            b.available_directions(Cell::new(6, 8)),
            vec![Direction::Up, Direction::Left]
        );
        assert_eq!(
            b.available_directions(Cell::new(1, 4)),
            vec![Direction::Left, Direction::Down, Direction::Right]
        );
        assert_eq!(
            b.available_directions(Cell::new(3, 8)),
            vec![Direction::Up, Direction::Left, Direction::Down]
        );
    }

    #[test]
    fn cell_pair_is_unordered() {
        let p = CellPair::new(Cell::new(2, 3), Cell::new(1, 3)).unwrap();
        let q = CellPair::new(Cell::new(1, 3), Cell::new(2, 3)).unwrap();
        assert_eq!(p, q);
        assert_eq!(p.a(), Cell::new(1, 3));
        assert_eq!(p.direction(), Direction::Down);
        assert!(CellPair::new(Cell::new(1, 1), Cell::new(2, 2)).is_none());
        assert!(CellPair::new(Cell::new(1, 1), Cell::new(1, 1)).is_none());
    }

    #[test]
    fn connection_codes() {
        assert_eq!(ConnectionType::from_code(5), ConnectionType::Wall);
        assert_eq!(ConnectionType::from_code(2), ConnectionType::Door);
        assert_eq!(ConnectionType::from_code(0), ConnectionType::Open);
        assert_eq!(ConnectionType::from_code(7), ConnectionType::Open);
        assert_eq!(
            ConnectionType::from_json(&serde_json::json!("5")),
            ConnectionType::Open
        );
    }
}
