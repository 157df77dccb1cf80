//! Static terrain grid and the spatial bucketing of dynamic entities.
//!
//! The world is divided into a row-major array of cells, each covering a
//! fixed square of [`TILES_PER_CELL`]² tiles. Cells double as the collision
//! broad-phase buckets: every entity with a position registers a spatial
//! ref in exactly one cell, and collision queries only visit the cells
//! overlapping an entity's bounding square.

use gridfire_core::CellIndex;
use gridfire_core::EntityId;

/// Number of tiles along each edge of a cell.
pub const TILES_PER_CELL: u32 = 8;

/// Construction parameters for the world grid.
#[derive(Clone, Copy, Debug)]
pub struct GridConfig {
    /// Number of cell columns.
    pub cells_x: u32,
    /// Number of cell rows.
    pub cells_y: u32,
    /// Side length of a square tile in world units.
    pub tile_length: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cells_x: 4,
            cells_y: 3,
            tile_length: 20,
        }
    }
}

/// Smallest static terrain unit inside a cell.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Tile {
    passable: bool,
}

impl Tile {
    pub(crate) const fn is_passable(&self) -> bool {
        self.passable
    }
}

/// Fixed square of tiles plus the spatial refs of entities inside it.
#[derive(Debug)]
pub(crate) struct Cell {
    tiles: Vec<Tile>,
    refs: Vec<EntityId>,
}

impl Cell {
    fn new() -> Self {
        Self {
            tiles: vec![
                Tile { passable: true };
                (TILES_PER_CELL * TILES_PER_CELL) as usize
            ],
            refs: Vec::new(),
        }
    }

    pub(crate) fn tile(&self, tile_x: u32, tile_y: u32) -> &Tile {
        &self.tiles[(tile_y * TILES_PER_CELL + tile_x) as usize]
    }

    fn tile_mut(&mut self, tile_x: u32, tile_y: u32) -> &mut Tile {
        &mut self.tiles[(tile_y * TILES_PER_CELL + tile_x) as usize]
    }

    /// Spatial refs of entities whose position lies in this cell.
    pub(crate) fn refs(&self) -> &[EntityId] {
        &self.refs
    }
}

/// Row-major grid of cells covering the whole world.
#[derive(Debug)]
pub(crate) struct Grid {
    cells_x: u32,
    cells_y: u32,
    tile_length: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds the grid and marks the outermost ring of tiles impassable.
    ///
    /// The border ring is the world boundary and the only terrain
    /// generation rule applied here.
    pub(crate) fn new(config: GridConfig) -> Self {
        let cells_x = config.cells_x.max(1);
        let cells_y = config.cells_y.max(1);
        let tile_length = config.tile_length.max(1);
        let mut cells = Vec::with_capacity((cells_x * cells_y) as usize);
        for _ in 0..cells_x * cells_y {
            cells.push(Cell::new());
        }

        let mut grid = Self {
            cells_x,
            cells_y,
            tile_length,
            cells,
        };

        let last = TILES_PER_CELL - 1;
        for column in 0..cells_x {
            for edge in 0..TILES_PER_CELL {
                grid.cell_entry_mut(CellIndex::new(column, 0))
                    .tile_mut(edge, 0)
                    .passable = false;
                grid.cell_entry_mut(CellIndex::new(column, cells_y - 1))
                    .tile_mut(edge, last)
                    .passable = false;
            }
        }
        for row in 0..cells_y {
            for edge in 0..TILES_PER_CELL {
                grid.cell_entry_mut(CellIndex::new(0, row))
                    .tile_mut(0, edge)
                    .passable = false;
                grid.cell_entry_mut(CellIndex::new(cells_x - 1, row))
                    .tile_mut(last, edge)
                    .passable = false;
            }
        }

        grid
    }

    pub(crate) const fn cells_x(&self) -> u32 {
        self.cells_x
    }

    pub(crate) const fn cells_y(&self) -> u32 {
        self.cells_y
    }

    pub(crate) const fn tile_length(&self) -> i32 {
        self.tile_length
    }

    /// Side length of one cell in world units.
    pub(crate) const fn cell_length(&self) -> i32 {
        self.tile_length * TILES_PER_CELL as i32
    }

    /// Maps a world point to the cell under it, clamped to grid bounds.
    ///
    /// Never fails: points outside the grid resolve to the nearest edge
    /// cell.
    pub(crate) fn cell_at(&self, x: i32, y: i32) -> CellIndex {
        let length = self.cell_length();
        let column = (x / length).clamp(0, self.cells_x as i32 - 1) as u32;
        let row = (y / length).clamp(0, self.cells_y as i32 - 1) as u32;
        CellIndex::new(column, row)
    }

    /// Inclusive clamped cell range covering an axis-aligned bounding box.
    pub(crate) fn cell_span(
        &self,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    ) -> (CellIndex, CellIndex) {
        (self.cell_at(left, top), self.cell_at(right, bottom))
    }

    /// World coordinates of a cell's upper-left corner.
    pub(crate) fn cell_origin(&self, index: CellIndex) -> (i32, i32) {
        let length = self.cell_length();
        (index.column() as i32 * length, index.row() as i32 * length)
    }

    /// Reports whether a world point lies within a cell's bounds.
    ///
    /// Edges are inclusive on both sides; a point exactly on a shared
    /// boundary is considered inside either neighbor, so a ref only moves
    /// once the point is strictly past its current cell.
    pub(crate) fn cell_contains(&self, index: CellIndex, x: i32, y: i32) -> bool {
        let (left, top) = self.cell_origin(index);
        let length = self.cell_length();
        left <= x && x <= left + length && top <= y && y <= top + length
    }

    pub(crate) fn cell_entry(&self, index: CellIndex) -> &Cell {
        &self.cells[(index.row() * self.cells_x + index.column()) as usize]
    }

    fn cell_entry_mut(&mut self, index: CellIndex) -> &mut Cell {
        &mut self.cells[(index.row() * self.cells_x + index.column()) as usize]
    }

    /// Registers an entity's spatial ref in a cell.
    pub(crate) fn insert_ref(&mut self, index: CellIndex, id: EntityId) {
        let cell = self.cell_entry_mut(index);
        debug_assert!(
            !cell.refs.contains(&id),
            "spatial ref registered twice in one cell"
        );
        cell.refs.push(id);
    }

    /// Removes an entity's spatial ref from a cell.
    pub(crate) fn remove_ref(&mut self, index: CellIndex, id: EntityId) {
        let cell = self.cell_entry_mut(index);
        let position = cell.refs.iter().position(|entry| *entry == id);
        debug_assert!(
            position.is_some(),
            "spatial ref missing from its registered cell"
        );
        if let Some(found) = position {
            let _ = cell.refs.remove(found);
        }
    }

    pub(crate) fn set_tile_passable(
        &mut self,
        index: CellIndex,
        tile_x: u32,
        tile_y: u32,
        passable: bool,
    ) {
        self.cell_entry_mut(index).tile_mut(tile_x, tile_y).passable = passable;
    }
}
