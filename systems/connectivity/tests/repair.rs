use deepdelve_core::{Point, Rect, Tile};
use deepdelve_system_connectivity::{repair, unreachable_count};
use deepdelve_system_mazegen as mazegen;
use deepdelve_world::Grid;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bounded_region(cols: i32, rows: i32) -> (Grid, Rect) {
    let mut grid = Grid::new(cols, rows);
    grid.fill(Tile::Ground);
    let region = Rect::new(Point::new(0, 0), Point::new(cols - 1, rows - 1));
    grid.outline(region, Tile::Wall);
    (grid, region)
}

/// Flood from the entry over the rendered dump and verify no `.` stays
/// enclosed by `#`.
fn assert_no_sealed_pockets(dump: &str, entry: (usize, usize)) {
    let rows: Vec<&str> = dump.lines().collect();
    let height = rows.len();
    let width = rows[0].len();
    let walkable = |x: usize, y: usize| rows[y].as_bytes()[x] != b'#';

    let mut reached = vec![vec![false; width]; height];
    let mut stack = vec![entry];
    reached[entry.1][entry.0] = true;
    while let Some((x, y)) = stack.pop() {
        let mut visit = |nx: usize, ny: usize| {
            if nx < width && ny < height && walkable(nx, ny) && !reached[ny][nx] {
                reached[ny][nx] = true;
                stack.push((nx, ny));
            }
        };
        visit(x + 1, y);
        visit(x.wrapping_sub(1), y);
        visit(x, y + 1);
        visit(x, y.wrapping_sub(1));
    }

    for (y, row) in rows.iter().enumerate() {
        for (x, glyph) in row.bytes().enumerate() {
            if glyph != b'#' {
                assert!(
                    reached[y][x],
                    "walkable cell ({x}, {y}) is sealed off:\n{dump}"
                );
            }
        }
    }
}

#[test]
fn ten_by_ten_maze_has_no_sealed_pockets() {
    let (mut grid, region) = bounded_region(10, 10);
    let entry = Point::new(1, 1);

    let mut rng = ChaCha8Rng::seed_from_u64(0xDE1CE);
    mazegen::carve(&mut grid, region, &mut rng);
    // The division lines may wall over the entry; the builder stamps the
    // entry tile walkable before repairing, and so does this scenario.
    grid.set_tile(entry.x(), entry.y(), Tile::Ground);
    let report = repair(&mut grid, region, entry, &mut rng).expect("repair");

    assert!(report.connected_cells > 0);
    assert_eq!(unreachable_count(&grid, region, entry), 0);
    assert_no_sealed_pockets(&grid.render(), (1, 1));
}

#[test]
fn repair_holds_across_many_seeds() {
    for seed in 0..32 {
        let (mut grid, region) = bounded_region(10, 10);
        let entry = Point::new(1, 1);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        mazegen::carve(&mut grid, region, &mut rng);
        grid.set_tile(entry.x(), entry.y(), Tile::Ground);
        let _ = repair(&mut grid, region, entry, &mut rng).expect("repair");

        assert_eq!(
            unreachable_count(&grid, region, entry),
            0,
            "seed {seed} left unreachable tiles:\n{}",
            grid.render()
        );
    }
}

#[test]
fn larger_floors_repair_too() {
    let (mut grid, region) = bounded_region(40, 30);
    let entry = Point::new(1, 1);

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    mazegen::carve(&mut grid, region, &mut rng);
    grid.set_tile(entry.x(), entry.y(), Tile::Ground);
    let _ = repair(&mut grid, region, entry, &mut rng).expect("repair");

    assert_eq!(unreachable_count(&grid, region, entry), 0);
    assert_no_sealed_pockets(&grid.render(), (1, 1));
}
