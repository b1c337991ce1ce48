//! Tile line of sight and sensing rays.

use tile_arena_core::{Aabb, TileCoord, Vec2};

use crate::grid::Grid;

/// Fraction of a tile advanced by each ray step.
const RAY_STEP_FRACTION: f32 = 0.25;

/// Reports whether every tile on the Bresenham line between the two tiles is walkable.
///
/// Both endpoints are included. The line is always traced from the smaller
/// endpoint so swapping them yields the same answer.
#[must_use]
pub fn has_line_of_sight(start: TileCoord, end: TileCoord, grid: &Grid) -> bool {
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    let (mut column, mut row) = (from.column(), from.row());
    let delta_column = (to.column() - column).abs();
    let delta_row = -(to.row() - row).abs();
    let step_column = if column < to.column() { 1 } else { -1 };
    let step_row = if row < to.row() { 1 } else { -1 };
    let mut error = delta_column + delta_row;

    loop {
        if !grid.is_walkable(TileCoord::new(column, row)) {
            return false;
        }
        if column == to.column() && row == to.row() {
            return true;
        }
        let doubled = 2 * error;
        if doubled >= delta_row {
            error += delta_row;
            column += step_column;
        }
        if doubled <= delta_column {
            error += delta_column;
            row += step_row;
        }
    }
}

/// Proximity of the first blocking tile along the ray.
///
/// Returns `1 - distance / max_distance` at the first non-walkable tile or
/// grid edge, and `0.0` when nothing is hit or the ray is degenerate.
#[must_use]
pub fn cast_wall_ray(origin: Vec2, direction: Vec2, max_distance: f32, grid: &Grid) -> f32 {
    march(origin, direction, max_distance, grid, |point| {
        (!walkable_at(point, grid)).then_some(true)
    })
}

/// Proximity of `target` along the ray, or `0.0` when a wall occludes it first.
#[must_use]
pub fn cast_entity_ray(
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    target: &Aabb,
    grid: &Grid,
) -> f32 {
    march(origin, direction, max_distance, grid, |point| {
        if !walkable_at(point, grid) {
            Some(false)
        } else if target.contains(point) {
            Some(true)
        } else {
            None
        }
    })
}

fn walkable_at(point: Vec2, grid: &Grid) -> bool {
    grid.is_walkable(TileCoord::containing(point, grid.tile_length()))
}

/// Steps along the ray until `probe` decides, returning the proximity of a
/// hit or zero for a miss.
fn march<F>(origin: Vec2, direction: Vec2, max_distance: f32, grid: &Grid, mut probe: F) -> f32
where
    F: FnMut(Vec2) -> Option<bool>,
{
    let Some(direction) = direction.try_normalize() else {
        return 0.0;
    };
    if !origin.is_finite() || !(max_distance.is_finite() && max_distance > 0.0) {
        return 0.0;
    }
    let step = grid.tile_length() * RAY_STEP_FRACTION;
    let mut distance = step;
    while distance <= max_distance {
        match probe(origin + direction * distance) {
            Some(true) => return 1.0 - distance / max_distance,
            Some(false) => return 0.0,
            None => distance += step,
        }
    }
    0.0
}
