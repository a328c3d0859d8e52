#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Connectivity repair: guarantees every walkable tile on a floor is
//! reachable from the entry cell.
//!
//! The pass works after arbitrary tile mutation (maze carving, room
//! placement, or any future generator): it floods from the entry, then
//! repeatedly picks an unreached walkable cell, spiral-searches outward for
//! the nearest connected cell, carves an L-shaped corridor between the two,
//! and floods again. Every iteration connects at least one previously
//! unreachable cell, so the loop terminates once the finite walkable set is
//! exhausted.

use deepdelve_core::{GenerationError, Point, Rect, Tile};
use deepdelve_world::Grid;
use rand::Rng;
use tracing::debug;

/// Reachability state tracked per cell during the repair pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellStatus {
    /// Non-walkable terrain; the flood never enters.
    Blocked,
    /// Walkable terrain not yet reached from the entry.
    Unvisited,
    /// Walkable terrain reachable from the entry.
    Connected,
}

/// Dense per-cell status mirror of the grid being repaired.
struct StatusGrid {
    cols: i32,
    rows: i32,
    cells: Vec<CellStatus>,
}

impl StatusGrid {
    fn mirroring(grid: &Grid) -> Self {
        let cols = grid.cols();
        let rows = grid.rows();
        let mut cells = Vec::with_capacity((cols as usize) * (rows as usize));
        for y in 0..rows {
            for x in 0..cols {
                cells.push(if grid.tile(x, y).walkable() {
                    CellStatus::Unvisited
                } else {
                    CellStatus::Blocked
                });
            }
        }
        Self { cols, rows, cells }
    }

    fn index(&self, point: Point) -> Option<usize> {
        if point.x() >= 0 && point.x() < self.cols && point.y() >= 0 && point.y() < self.rows {
            Some(point.y() as usize * self.cols as usize + point.x() as usize)
        } else {
            None
        }
    }

    fn get(&self, point: Point) -> Option<CellStatus> {
        self.index(point).map(|index| self.cells[index])
    }

    fn set(&mut self, point: Point, status: CellStatus) {
        if let Some(index) = self.index(point) {
            self.cells[index] = status;
        }
    }
}

/// Summary of one repair pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepairReport {
    /// Number of reconnection corridors the pass carved.
    pub corridors_carved: usize,
    /// Number of walkable cells reachable from the entry once the pass
    /// finished.
    pub connected_cells: usize,
}

/// Repairs connectivity inside the region so that every walkable cell can be
/// reached from the entry cell. Corridors are carved through walls where
/// needed; already-walkable tiles along a corridor are left untouched.
///
/// # Errors
///
/// [`GenerationError::SpiralExhausted`] when the outward search fails to
/// find a connected cell inside the region, which is impossible unless the
/// generator corrupted its own invariants.
pub fn repair<R: Rng>(
    grid: &mut Grid,
    region: Rect,
    entry: Point,
    rng: &mut R,
) -> Result<RepairReport, GenerationError> {
    let mut status = StatusGrid::mirroring(grid);
    let mut connected = flood_fill(&mut status, entry);
    let mut corridors = 0;

    loop {
        let unconnected = unconnected_cells(&status, region);
        if unconnected.is_empty() {
            break;
        }
        let origin = unconnected[rng.gen_range(0..unconnected.len())];

        let anchor = spiral_search(&status, region, origin)?;
        carve_corridor(grid, &mut status, origin, anchor);
        corridors += 1;
        connected += flood_fill(&mut status, anchor);

        debug!(corridor = corridors, from = %origin, to = %anchor, "carved reconnection corridor");
    }

    Ok(RepairReport {
        corridors_carved: corridors,
        connected_cells: connected,
    })
}

/// Counts the walkable cells inside the region that a flood fill from the
/// entry cannot reach. Zero means the region is fully connected.
#[must_use]
pub fn unreachable_count(grid: &Grid, region: Rect, entry: Point) -> usize {
    let mut status = StatusGrid::mirroring(grid);
    let _ = flood_fill(&mut status, entry);
    unconnected_cells(&status, region).len()
}

/// Marks every walkable cell reachable from the seed as connected, using an
/// explicit work list so large floors cannot overflow the call stack.
/// Returns the number of newly connected cells.
fn flood_fill(status: &mut StatusGrid, seed: Point) -> usize {
    let mut newly_connected = 0;
    match status.get(seed) {
        Some(CellStatus::Unvisited) => {
            status.set(seed, CellStatus::Connected);
            newly_connected += 1;
        }
        Some(CellStatus::Connected) => {}
        _ => return 0,
    }

    let mut stack = vec![seed];
    while let Some(cell) = stack.pop() {
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let neighbor = cell.translate(dx, dy);
            if status.get(neighbor) == Some(CellStatus::Unvisited) {
                status.set(neighbor, CellStatus::Connected);
                newly_connected += 1;
                stack.push(neighbor);
            }
        }
    }

    newly_connected
}

/// Walkable cells inside the region the flood has not reached. Region
/// traversal is half-open, matching how the region was carved.
fn unconnected_cells(status: &StatusGrid, region: Rect) -> Vec<Point> {
    let tl = region.top_left();
    let br = region.bottom_right();
    let mut cells = Vec::new();
    for x in tl.x()..br.x() {
        for y in tl.y()..br.y() {
            let point = Point::new(x, y);
            if status.get(point) == Some(CellStatus::Unvisited) {
                cells.push(point);
            }
        }
    }
    cells
}

/// Searches outward from the origin in an expanding square spiral (up,
/// right, down, left with step lengths 1, 1, 2, 2, 3, 3, ...) until an
/// in-region connected cell is found.
///
/// The spiral carries a defensive radius bound; exhausting it means the
/// status grid lost its connected component, which a correct generator can
/// never produce.
fn spiral_search(
    status: &StatusGrid,
    region: Rect,
    origin: Point,
) -> Result<Point, GenerationError> {
    let max_ring = status.cols + status.rows;
    let mut probe = origin;
    let mut direction = 0;
    let mut step = 1;
    let mut ring = 1;

    while ring <= max_ring {
        probe = match direction {
            0 => probe.translate(0, -1),
            1 => probe.translate(1, 0),
            2 => probe.translate(0, 1),
            _ => probe.translate(-1, 0),
        };
        step -= 1;

        if step == 0 {
            if direction == 1 || direction == 3 {
                ring += 1;
            }
            step = ring;
            direction = (direction + 1) % 4;
        }

        if region.contains(probe) && status.get(probe) == Some(CellStatus::Connected) {
            return Ok(probe);
        }
    }

    Err(GenerationError::SpiralExhausted { origin })
}

/// Carves an L-shaped corridor from the origin to the anchor: along the
/// origin's row to the anchor's column, then along that column to the
/// anchor. Only non-walkable tiles are converted; their status resets to
/// unvisited so the next flood fill claims them.
fn carve_corridor(grid: &mut Grid, status: &mut StatusGrid, origin: Point, anchor: Point) {
    let step_x = (anchor.x() - origin.x()).signum();
    let mut x = origin.x();
    while x != anchor.x() {
        x += step_x;
        convert(grid, status, Point::new(x, origin.y()));
    }

    let step_y = (anchor.y() - origin.y()).signum();
    let mut y = origin.y();
    while y != anchor.y() {
        y += step_y;
        convert(grid, status, Point::new(anchor.x(), y));
    }
}

fn convert(grid: &mut Grid, status: &mut StatusGrid, point: Point) {
    if !grid.tile(point.x(), point.y()).walkable() {
        grid.set_tile(point.x(), point.y(), Tile::Ground);
        status.set(point, CellStatus::Unvisited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn walled_ground(cols: i32, rows: i32) -> (Grid, Rect) {
        let mut grid = Grid::new(cols, rows);
        grid.fill(Tile::Ground);
        let region = Rect::new(Point::new(0, 0), Point::new(cols - 1, rows - 1));
        grid.outline(region, Tile::Wall);
        (grid, region)
    }

    #[test]
    fn fully_open_floor_needs_no_corridors() {
        let (mut grid, region) = walled_ground(8, 8);
        let mut rng = ChaCha8Rng::seed_from_u64(21);

        let report = repair(&mut grid, region, Point::new(1, 1), &mut rng).expect("repair");

        assert_eq!(report.corridors_carved, 0);
        assert_eq!(report.connected_cells, 36, "6x6 open interior");
        assert_eq!(unreachable_count(&grid, region, Point::new(1, 1)), 0);
    }

    #[test]
    fn sealed_room_gets_reconnected() {
        let (mut grid, region) = walled_ground(9, 7);
        // Wall off the right third completely.
        for y in 0..7 {
            grid.set_tile(5, y, Tile::Wall);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(22);

        let report = repair(&mut grid, region, Point::new(1, 1), &mut rng).expect("repair");

        assert!(report.corridors_carved >= 1);
        assert_eq!(unreachable_count(&grid, region, Point::new(1, 1)), 0);
    }

    #[test]
    fn corridors_only_convert_blocked_tiles() {
        let (mut grid, region) = walled_ground(9, 7);
        for y in 0..7 {
            grid.set_tile(5, y, Tile::Wall);
        }
        grid.set_tile(2, 2, Tile::Upstairs);
        let mut rng = ChaCha8Rng::seed_from_u64(23);

        let _ = repair(&mut grid, region, Point::new(1, 1), &mut rng).expect("repair");

        assert_eq!(
            grid.tile(2, 2),
            Tile::Upstairs,
            "existing walkable tiles along corridors stay untouched"
        );
    }

    #[test]
    fn repair_leaves_multiple_islands_connected() {
        let (mut grid, region) = walled_ground(13, 11);
        // Carve the interior into four sealed quadrants.
        for y in 0..11 {
            grid.set_tile(6, y, Tile::Wall);
        }
        for x in 0..13 {
            grid.set_tile(x, 5, Tile::Wall);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(24);

        let report = repair(&mut grid, region, Point::new(1, 1), &mut rng).expect("repair");

        // One corridor can sweep up two islands when its elbow crosses a
        // second sealed region, but the quadrant opposite the entry always
        // needs its own.
        assert!(report.corridors_carved >= 2);
        assert_eq!(unreachable_count(&grid, region, Point::new(1, 1)), 0);
    }

    #[test]
    fn spiral_finds_the_adjacent_connected_cell() {
        let (grid, region) = walled_ground(8, 8);
        let mut status = StatusGrid::mirroring(&grid);
        status.set(Point::new(3, 2), CellStatus::Connected);

        let found = spiral_search(&status, region, Point::new(3, 3)).expect("search");
        assert_eq!(found, Point::new(3, 2), "first spiral step goes up");
    }

    #[test]
    fn spiral_exhaustion_is_a_fatal_error() {
        let (grid, region) = walled_ground(6, 6);
        // No cell is ever connected, so the search must give up instead of
        // spinning forever.
        let status = StatusGrid::mirroring(&grid);

        let result = spiral_search(&status, region, Point::new(2, 2));
        assert_eq!(
            result,
            Err(GenerationError::SpiralExhausted {
                origin: Point::new(2, 2)
            })
        );
    }

    #[test]
    fn flood_fill_ignores_a_blocked_seed() {
        let (grid, _region) = walled_ground(6, 6);
        let mut status = StatusGrid::mirroring(&grid);

        assert_eq!(flood_fill(&mut status, Point::new(0, 0)), 0);
        assert_eq!(status.get(Point::new(0, 0)), Some(CellStatus::Blocked));
    }
}
