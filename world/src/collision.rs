//! AABB-versus-grid collision with axis-separated motion.

use tile_arena_core::{Aabb, TileCoord, Vec2};

use crate::grid::Grid;

/// Tolerance keeping a box that touches a tile edge out of the next tile.
pub const EDGE_EPSILON: f32 = 0.01;

/// Reports whether `body` is blocked.
///
/// The `bounds` rectangle acts as a hard wall. Inside it, every tile
/// overlapped by the box must be walkable.
#[must_use]
pub fn check_collision(body: Aabb, bounds: Aabb, grid: &Grid) -> bool {
    let min = body.min();
    let max = body.max();
    if !min.is_finite() || !max.is_finite() {
        return true;
    }
    let limit = bounds.max();
    if min.x < bounds.min().x || min.y < bounds.min().y || max.x > limit.x || max.y > limit.y {
        return true;
    }

    let tile_length = grid.tile_length();
    let first_column = (min.x / tile_length).floor() as i32;
    let first_row = (min.y / tile_length).floor() as i32;
    let last_column = (((max.x - EDGE_EPSILON) / tile_length).floor() as i32).max(first_column);
    let last_row = (((max.y - EDGE_EPSILON) / tile_length).floor() as i32).max(first_row);

    (first_row..=last_row).any(|row| {
        (first_column..=last_column).any(|column| !grid.is_walkable(TileCoord::new(column, row)))
    })
}

/// Moves `body` by `delta`, testing the X and Y displacements independently.
///
/// Returns the resolved upper-left corner. A blocked axis keeps its
/// coordinate, so a box pushed diagonally into a wall slides along it.
#[must_use]
pub fn resolve_motion(body: Aabb, delta: Vec2, bounds: Aabb, grid: &Grid) -> Vec2 {
    let mut resolved = body;
    if delta.x != 0.0 {
        let candidate = resolved.translated(Vec2::new(delta.x, 0.0));
        if !check_collision(candidate, bounds, grid) {
            resolved = candidate;
        }
    }
    if delta.y != 0.0 {
        let candidate = resolved.translated(Vec2::new(0.0, delta.y));
        if !check_collision(candidate, bounds, grid) {
            resolved = candidate;
        }
    }
    resolved.min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellPalette;
    use tile_arena_core::config::default_cells;

    fn walled_grid() -> Grid {
        let mut grid =
            Grid::new(5, 5, 32.0, CellPalette::new(default_cells())).expect("valid grid");
        assert_eq!(grid.set(TileCoord::new(2, 1), "wall"), Ok(()));
        grid
    }

    #[test]
    fn tile_aligned_box_does_not_claim_the_adjacent_tile() {
        let grid = walled_grid();
        let body = Aabb::new(Vec2::new(32.0, 32.0), Vec2::splat(32.0));
        assert!(!check_collision(body, grid.bounds(), &grid));

        let nudged = body.translated(Vec2::new(0.02, 0.0));
        assert!(check_collision(nudged, grid.bounds(), &grid));
    }

    #[test]
    fn bounds_act_as_a_hard_wall() {
        let grid = walled_grid();
        let body = Aabb::new(Vec2::new(-1.0, 0.0), Vec2::splat(16.0));
        assert!(check_collision(body, grid.bounds(), &grid));

        let inner = Aabb::new(Vec2::ZERO, Vec2::splat(96.0));
        let escaping = Aabb::new(Vec2::new(90.0, 0.0), Vec2::splat(16.0));
        assert!(check_collision(escaping, inner, &grid));
    }

    #[test]
    fn diagonal_motion_slides_along_walls() {
        let grid = walled_grid();
        let body = Aabb::new(Vec2::new(32.0, 32.0), Vec2::splat(30.0));

        let resolved = resolve_motion(body, Vec2::new(10.0, 10.0), grid.bounds(), &grid);
        assert_eq!(resolved, Vec2::new(32.0, 42.0));
    }

    #[test]
    fn non_finite_boxes_are_blocked() {
        let grid = walled_grid();
        let body = Aabb::new(Vec2::new(f32::NAN, 0.0), Vec2::splat(8.0));
        assert!(check_collision(body, grid.bounds(), &grid));
    }
}
