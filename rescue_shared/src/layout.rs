//! Layout planning: grid cells to world-space poses.
//!
//! Pure arithmetic over the configured spacing and origin. Every function here
//! is total and deterministic; reconciliation compares the poses it produces
//! to decide whether an object moved.

use serde::{Deserialize, Serialize};

use crate::{
    grid::{Cell, CellPair, Direction, GridBounds},
    math::{Quat, Vec3},
    scene::{Pose, PrefabKind},
};

/// Horizontal world axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    fn other(self) -> Self {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::new(1.0, 0.0, 0.0),
            Axis::Z => Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// What is being placed; decides height and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeable {
    Wall,
    Door,
    Tile,
    Token,
}

/// Grid geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Distance between neighboring cell centers.
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    /// World position of cell `(1, 1)`.
    #[serde(default)]
    pub origin: Vec3,
    /// World axis that column indices advance along; rows use the other one.
    #[serde(default = "default_columns_along")]
    pub columns_along: Axis,
    #[serde(default = "default_wall_height")]
    pub wall_height: f32,
    #[serde(default)]
    pub door_height: f32,
    #[serde(default)]
    pub token_height: f32,
}

fn default_spacing() -> f32 {
    1.0
}

fn default_columns_along() -> Axis {
    Axis::X
}

fn default_wall_height() -> f32 {
    0.5
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
            origin: Vec3::ZERO,
            columns_along: default_columns_along(),
            wall_height: default_wall_height(),
            door_height: 0.0,
            token_height: 0.0,
        }
    }
}

/// Maps cells and directions to poses for a grid of `rows × cols` inner cells.
#[derive(Debug, Clone, Copy)]
pub struct LayoutPlanner {
    cfg: LayoutConfig,
    rows: i32,
    cols: i32,
}

impl LayoutPlanner {
    pub fn new(cfg: LayoutConfig, rows: i32, cols: i32) -> Self {
        Self { cfg, rows, cols }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// The floor: building plus its border ring.
    pub fn tile_bounds(&self) -> GridBounds {
        GridBounds::outer(self.rows, self.cols)
    }

    fn col_axis(&self) -> Axis {
        self.cfg.columns_along
    }

    fn row_axis(&self) -> Axis {
        self.cfg.columns_along.other()
    }

    /// Floor-level center of a cell.
    pub fn cell_center(&self, cell: Cell) -> Vec3 {
        let s = self.cfg.spacing;
        self.col_axis()
            .unit()
            .scale((cell.col - 1) as f32 * s)
            .add(self.row_axis().unit().scale((cell.row - 1) as f32 * s))
            .add(self.cfg.origin)
    }

    /// Half a cell toward `dir`.
    fn edge_offset(&self, dir: Direction) -> Vec3 {
        let half = self.cfg.spacing / 2.0;
        match dir {
            Direction::Up => self.row_axis().unit().scale(-half),
            Direction::Down => self.row_axis().unit().scale(half),
            Direction::Left => self.col_axis().unit().scale(-half),
            Direction::Right => self.col_axis().unit().scale(half),
        }
    }

    /// Rotation for a segment on the `dir` edge of a cell. Assets are modeled
    /// running along X.
    fn segment_orientation(&self, dir: Direction) -> Quat {
        let runs_along = if dir.is_vertical() {
            self.col_axis()
        } else {
            self.row_axis()
        };
        match runs_along {
            Axis::X => Quat::IDENTITY,
            Axis::Z => Quat::QUARTER_TURN_Y,
        }
    }

    /// Pose for `kind` at `cell`, shifted toward `dir` when given.
    pub fn plan(&self, cell: Cell, dir: Option<Direction>, kind: Placeable) -> Pose {
        let height = match kind {
            Placeable::Wall => self.cfg.wall_height,
            Placeable::Door => self.cfg.door_height,
            Placeable::Token => self.cfg.token_height,
            Placeable::Tile => 0.0,
        };
        let mut position = self.cell_center(cell);
        position.y += height;

        let orientation = match (kind, dir) {
            (Placeable::Tile, _) => Quat::QUARTER_TURN_X,
            (_, Some(d)) => {
                position = position.add(self.edge_offset(d));
                self.segment_orientation(d)
            }
            (_, None) => Quat::IDENTITY,
        };

        Pose {
            position,
            orientation,
        }
    }

    /// Pose for a wall or door between the two cells of `pair`.
    pub fn segment_pose(&self, pair: CellPair, kind: Placeable) -> Pose {
        self.plan(pair.a(), Some(pair.direction()), kind)
    }

    pub fn token_pose(&self, cell: Cell) -> Pose {
        self.plan(cell, None, Placeable::Token)
    }

    pub fn tile_pose(&self, cell: Cell) -> Pose {
        self.plan(cell, None, Placeable::Tile)
    }

    /// Floor tile for a cell of the outer grid (`0..=rows+1 × 0..=cols+1`).
    pub fn tile_prefab(&self, cell: Cell) -> PrefabKind {
        if cell.col == 0 {
            PrefabKind::LeftBorderTile
        } else if cell.col == self.cols + 1 {
            PrefabKind::RightBorderTile
        } else if cell.row == 0 || cell.row == self.rows + 1 {
            PrefabKind::EdgeTile
        } else {
            PrefabKind::CenterTile
        }
    }
}
