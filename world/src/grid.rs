//! Dense per-floor grid: tiles, organism occupancy, and item stacks.

use deepdelve_core::{ActorId, GridError, ItemId, Point, Rect, Tile};

/// Rectangular floor storage shared by generation and simulation.
///
/// Three parallel stores cover every cell: the terrain tile, at most one
/// organism handle, and an ordered stack of item handles (last pushed on
/// top). Dimensions are fixed at construction and every mutating operation
/// validates its coordinates first.
#[derive(Clone, Debug)]
pub struct Grid {
    cols: i32,
    rows: i32,
    tiles: Vec<Tile>,
    occupancy: Vec<Option<ActorId>>,
    item_stacks: Vec<Vec<ItemId>>,
}

impl Grid {
    /// Creates a grid of the provided dimensions filled with ground tiles.
    /// Non-positive dimensions produce an empty grid.
    #[must_use]
    pub fn new(cols: i32, rows: i32) -> Self {
        let cols = cols.max(0);
        let rows = rows.max(0);
        let capacity = (cols as usize) * (rows as usize);
        Self {
            cols,
            rows,
            tiles: vec![Tile::Ground; capacity],
            occupancy: vec![None; capacity],
            item_stacks: vec![Vec::new(); capacity],
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn cols(&self) -> i32 {
        self.cols
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.rows
    }

    /// Grid dimensions expressed as a point.
    #[must_use]
    pub const fn size(&self) -> Point {
        Point::new(self.cols, self.rows)
    }

    /// Reports whether the coordinate lies within the grid extents.
    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.cols && y >= 0 && y < self.rows
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.cols as usize + x as usize)
        } else {
            None
        }
    }

    /// Tile stored at the coordinate, or [`Tile::None`] when out of bounds.
    /// Total function; never fails.
    #[must_use]
    pub fn tile(&self, x: i32, y: i32) -> Tile {
        self.index(x, y)
            .map_or(Tile::None, |index| self.tiles[index])
    }

    /// Stores a tile at the coordinate. Out-of-bounds writes are ignored;
    /// generation carves strictly inside the grid.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        if let Some(index) = self.index(x, y) {
            self.tiles[index] = tile;
        }
    }

    /// Fills every cell with the provided tile.
    pub fn fill(&mut self, tile: Tile) {
        self.tiles.fill(tile);
    }

    /// Writes the provided tile along the inclusive border of the region.
    pub fn outline(&mut self, region: Rect, tile: Tile) {
        let (tl, br) = (region.top_left(), region.bottom_right());
        for x in tl.x()..=br.x() {
            self.set_tile(x, tl.y(), tile);
            self.set_tile(x, br.y(), tile);
        }
        for y in tl.y()..=br.y() {
            self.set_tile(tl.x(), y, tile);
            self.set_tile(br.x(), y, tile);
        }
    }

    /// Reports whether the cell is walkable terrain with no organism on it.
    #[must_use]
    pub fn is_open(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).walkable() && self.organism_at(x, y).is_none()
    }

    /// Organism occupying the cell, if any. Out-of-bounds queries return
    /// `None`.
    #[must_use]
    pub fn organism_at(&self, x: i32, y: i32) -> Option<ActorId> {
        self.index(x, y).and_then(|index| self.occupancy[index])
    }

    /// Records the organism at the cell.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` when the coordinate is invalid; `CellOccupied` when an
    /// organism already holds the cell.
    pub fn place_organism(&mut self, id: ActorId, x: i32, y: i32) -> Result<(), GridError> {
        let index = self.index(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        if self.occupancy[index].is_some() {
            return Err(GridError::CellOccupied { x, y });
        }
        self.occupancy[index] = Some(id);
        Ok(())
    }

    /// Clears the cell and returns the organism that occupied it.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` when the coordinate is invalid; `EmptyCell` when no
    /// organism is present.
    pub fn remove_organism(&mut self, x: i32, y: i32) -> Result<ActorId, GridError> {
        let index = self.index(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        self.occupancy[index]
            .take()
            .ok_or(GridError::EmptyCell { x, y })
    }

    /// Pushes an item onto the cell's stack; it becomes the visible top.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` when the coordinate is invalid.
    pub fn push_item(&mut self, id: ItemId, x: i32, y: i32) -> Result<(), GridError> {
        let index = self.index(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        self.item_stacks[index].push(id);
        Ok(())
    }

    /// Pops the top item from the cell's stack.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` when the coordinate is invalid; `EmptyCell` when the
    /// stack holds nothing.
    pub fn pop_item(&mut self, x: i32, y: i32) -> Result<ItemId, GridError> {
        let index = self.index(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        self.item_stacks[index]
            .pop()
            .ok_or(GridError::EmptyCell { x, y })
    }

    /// Top item of the cell's stack, if any. Items below the top are not
    /// visible or interactable.
    #[must_use]
    pub fn item_at(&self, x: i32, y: i32) -> Option<ItemId> {
        self.index(x, y)
            .and_then(|index| self.item_stacks[index].last().copied())
    }

    /// Textual dump of the terrain, one glyph per tile, row by row. This is
    /// the diagnostic serialization used by golden-file tests.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.cols as usize + 1) * self.rows as usize);
        for y in 0..self.rows {
            for x in 0..self.cols {
                out.push(self.tile(x, y).glyph());
            }
            out.push('\n');
        }
        out
    }
}
