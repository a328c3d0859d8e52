#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Recursive-division maze carving.
//!
//! Given a region already filled with ground behind a solid wall border, the
//! generator divides it with one vertical and one horizontal wall line
//! crossing at a random interior intersection, cuts one doorway into each of
//! the four wall segments, and recurses into the quadrants. Carving alone
//! does not guarantee the floor stays connected once stairs placement and
//! later passes mutate tiles; the connectivity repair pass is mandatory
//! afterward.

use deepdelve_core::{Point, Rect, Tile};
use deepdelve_world::Grid;
use rand::Rng;

/// Interior area at or below which a region is left as an open room rather
/// than divided further.
const OPEN_ROOM_AREA: i32 = 9;

/// Carves a maze into the region, walls included at the region's inclusive
/// corners. The RNG is threaded explicitly so a fixed seed reproduces the
/// same geometry.
pub fn carve<R: Rng>(grid: &mut Grid, region: Rect, rng: &mut R) {
    let tl = region.top_left();
    let br = region.bottom_right();

    let interior = (br.x() - tl.x() - 1) * (br.y() - tl.y() - 1);
    if interior <= OPEN_ROOM_AREA {
        return;
    }

    // Pick the intersection at least one cell away from every region edge.
    let ix = rng.gen_range((tl.x() + 2).min(br.x() - 1)..br.x());
    let iy = rng.gen_range((tl.y() + 2).min(br.y() - 1)..br.y());

    // One doorway per wall segment: above/below and left/right of the
    // intersection. A degenerate empty segment samples its doorway at the
    // segment floor, which lies outside the carved line and is harmless.
    let above = sample_or_floor(rng, tl.y() + 1, iy);
    let below = sample_or_floor(rng, iy + 1, br.y());
    let left = sample_or_floor(rng, tl.x() + 1, ix);
    let right = sample_or_floor(rng, ix + 1, br.x());

    for y in tl.y()..br.y() {
        if y != above && y != below {
            grid.set_tile(ix, y, Tile::Wall);
        }
    }
    for x in tl.x()..br.x() {
        if x != left && x != right {
            grid.set_tile(x, iy, Tile::Wall);
        }
    }

    // Recurse into the four quadrants, each inset one cell from both
    // division lines. Degenerate quadrants fall out at the base case.
    carve(
        grid,
        Rect::new(
            Point::new(tl.x() + 1, tl.y() + 1),
            Point::new(ix - 1, iy - 1),
        ),
        rng,
    );
    carve(
        grid,
        Rect::new(
            Point::new(tl.x() + 1, iy + 1),
            Point::new(ix - 1, br.y() - 1),
        ),
        rng,
    );
    carve(
        grid,
        Rect::new(
            Point::new(ix + 1, tl.y() + 1),
            Point::new(br.x() - 1, iy - 1),
        ),
        rng,
    );
    carve(
        grid,
        Rect::new(
            Point::new(ix + 1, iy + 1),
            Point::new(br.x() - 1, br.y() - 1),
        ),
        rng,
    );
}

/// Samples from `lo..hi`, returning `lo` when the range is empty.
fn sample_or_floor<R: Rng>(rng: &mut R, lo: i32, hi: i32) -> i32 {
    if lo >= hi {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn walled_ground(cols: i32, rows: i32) -> Grid {
        let mut grid = Grid::new(cols, rows);
        grid.fill(Tile::Ground);
        grid.outline(
            Rect::new(Point::new(0, 0), Point::new(cols - 1, rows - 1)),
            Tile::Wall,
        );
        grid
    }

    #[test]
    fn small_regions_stay_open_rooms() {
        let mut grid = walled_ground(6, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        // The region's interior measure is 3 x 2 = 6, at or below the
        // open-room bound, so no wall lines may be carved.
        carve(
            &mut grid,
            Rect::new(Point::new(0, 0), Point::new(4, 3)),
            &mut rng,
        );

        for x in 1..4 {
            for y in 1..3 {
                assert_eq!(grid.tile(x, y), Tile::Ground, "room carved at ({x}, {y})");
            }
        }
    }

    #[test]
    fn carving_is_deterministic_for_a_fixed_seed() {
        let mut first = walled_ground(20, 16);
        let mut second = walled_ground(20, 16);
        let region = Rect::new(Point::new(0, 0), Point::new(19, 15));

        let mut rng = ChaCha8Rng::seed_from_u64(12);
        carve(&mut first, region, &mut rng);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        carve(&mut second, region, &mut rng);

        assert_eq!(first.render(), second.render());
    }

    #[test]
    fn division_adds_interior_walls() {
        let mut grid = walled_ground(20, 16);
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        carve(
            &mut grid,
            Rect::new(Point::new(0, 0), Point::new(19, 15)),
            &mut rng,
        );

        let interior_walls = (1..19)
            .flat_map(|x| (1..15).map(move |y| (x, y)))
            .filter(|&(x, y)| grid.tile(x, y) == Tile::Wall)
            .count();
        assert!(interior_walls > 0, "division must carve interior walls");
    }

    #[test]
    fn border_survives_carving() {
        let mut grid = walled_ground(20, 16);
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        carve(
            &mut grid,
            Rect::new(Point::new(0, 0), Point::new(19, 15)),
            &mut rng,
        );

        for x in 0..20 {
            assert_eq!(grid.tile(x, 0), Tile::Wall);
            assert_eq!(grid.tile(x, 15), Tile::Wall);
        }
        for y in 0..16 {
            assert_eq!(grid.tile(0, y), Tile::Wall);
            assert_eq!(grid.tile(19, y), Tile::Wall);
        }
    }

    #[test]
    fn every_wall_line_keeps_its_doorways() {
        // With a seeded carve, walls must never form a fully-closed cross:
        // each division line keeps one opening per segment, so every row and
        // column of the interior retains at least one walkable tile.
        let mut grid = walled_ground(24, 20);
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        carve(
            &mut grid,
            Rect::new(Point::new(0, 0), Point::new(23, 19)),
            &mut rng,
        );

        for y in 1..19 {
            let walkable = (1..23).any(|x| grid.tile(x, y).walkable());
            assert!(walkable, "row {y} is fully sealed");
        }
        for x in 1..23 {
            let walkable = (1..19).any(|y| grid.tile(x, y).walkable());
            assert!(walkable, "column {x} is fully sealed");
        }
    }
}
