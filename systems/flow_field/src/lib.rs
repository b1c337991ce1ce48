#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dijkstra flow field that steers walkers toward a single target tile.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BinaryHeap},
};

use tile_arena_core::{TileCoord, Vec2};

const CARDINAL_COST: f32 = 1.0;
const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

/// Neighbour offsets in the order ties are resolved.
const NEIGHBOURS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Sparse distance and steering fields rooted at a target tile.
///
/// Entries exist only for tiles reached by the search. Distances use unit
/// cost for cardinal steps and `√2` for diagonal steps; a diagonal step is
/// only taken when both cardinal tiles it cuts past are walkable.
#[derive(Clone, Debug, Default)]
pub struct FlowField {
    target: Option<TileCoord>,
    distances: BTreeMap<TileCoord, f32>,
    vectors: BTreeMap<TileCoord, Vec2>,
}

impl FlowField {
    /// Rebuilds both fields from scratch for the provided target.
    ///
    /// `max_distance` bounds the search cost when present. An unwalkable
    /// target yields an empty field.
    pub fn rebuild_with<F>(&mut self, target: TileCoord, max_distance: Option<f32>, mut is_walkable: F)
    where
        F: FnMut(TileCoord) -> bool,
    {
        self.target = Some(target);
        self.distances.clear();
        self.vectors.clear();
        if !is_walkable(target) {
            return;
        }

        let _ = self.distances.insert(target, 0.0);
        let mut frontier = BinaryHeap::new();
        let mut sequence = 0_u64;
        frontier.push(Frontier {
            cost: 0.0,
            sequence,
            tile: target,
        });

        while let Some(Frontier { cost, tile, .. }) = frontier.pop() {
            if self.distances.get(&tile).map_or(true, |best| cost > *best) {
                continue;
            }
            for (column, row) in NEIGHBOURS {
                if !can_step(tile, column, row, &mut is_walkable) {
                    continue;
                }
                let neighbour = tile.offset(column, row);
                let next = cost + step_cost(column, row);
                if max_distance.map_or(false, |limit| next > limit) {
                    continue;
                }
                if self.distances.get(&neighbour).map_or(false, |known| *known <= next) {
                    continue;
                }
                let _ = self.distances.insert(neighbour, next);
                sequence += 1;
                frontier.push(Frontier {
                    cost: next,
                    sequence,
                    tile: neighbour,
                });
            }
        }

        for (&tile, &distance) in &self.distances {
            let mut best: Option<(f32, i32, i32)> = None;
            for (column, row) in NEIGHBOURS {
                if !can_step(tile, column, row, &mut is_walkable) {
                    continue;
                }
                let Some(&candidate) = self.distances.get(&tile.offset(column, row)) else {
                    continue;
                };
                if candidate >= distance {
                    continue;
                }
                if best.map_or(true, |(smallest, _, _)| candidate < smallest) {
                    best = Some((candidate, column, row));
                }
            }
            let vector = best.map_or(Vec2::ZERO, |(_, column, row)| {
                Vec2::new(column as f32, row as f32).normalize()
            });
            let _ = self.vectors.insert(tile, vector);
        }
    }

    /// Target the field was last rebuilt for.
    #[must_use]
    pub fn target(&self) -> Option<TileCoord> {
        self.target
    }

    /// Path cost from the tile to the target, or `None` when unreached.
    #[must_use]
    pub fn distance(&self, tile: TileCoord) -> Option<f32> {
        self.distances.get(&tile).copied()
    }

    /// Unit steering vector at the tile; zero when unreached, at the target, or at a local minimum.
    #[must_use]
    pub fn vector(&self, tile: TileCoord) -> Vec2 {
        self.vectors.get(&tile).copied().unwrap_or(Vec2::ZERO)
    }

    /// Reached tiles in ascending order.
    pub fn reached_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.distances.keys().copied()
    }

    /// Number of reached tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Reports whether no tile was reached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

fn step_cost(column: i32, row: i32) -> f32 {
    if column != 0 && row != 0 {
        DIAGONAL_COST
    } else {
        CARDINAL_COST
    }
}

fn can_step<F>(tile: TileCoord, column: i32, row: i32, is_walkable: &mut F) -> bool
where
    F: FnMut(TileCoord) -> bool,
{
    if !is_walkable(tile.offset(column, row)) {
        return false;
    }
    if column != 0 && row != 0 {
        return is_walkable(tile.offset(column, 0)) && is_walkable(tile.offset(0, row));
    }
    true
}

/// Priority-queue entry ordered by cost, then by insertion order.
#[derive(Clone, Copy, Debug)]
struct Frontier {
    cost: f32,
    sequence: u64,
    tile: TileCoord,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(columns: i32, rows: i32) -> impl FnMut(TileCoord) -> bool {
        move |tile| {
            (0..columns).contains(&tile.column()) && (0..rows).contains(&tile.row())
        }
    }

    #[test]
    fn target_has_zero_distance_and_vector() {
        let mut field = FlowField::default();
        field.rebuild_with(TileCoord::new(2, 2), None, open(5, 5));

        assert_eq!(field.target(), Some(TileCoord::new(2, 2)));
        assert_eq!(field.distance(TileCoord::new(2, 2)), Some(0.0));
        assert_eq!(field.vector(TileCoord::new(2, 2)), Vec2::ZERO);
        assert_eq!(field.distance(TileCoord::new(2, 0)), Some(2.0));
        assert_eq!(field.vector(TileCoord::new(2, 0)), Vec2::new(0.0, 1.0));
        assert_eq!(field.len(), 25);
    }

    #[test]
    fn diagonal_steps_do_not_cut_corners() {
        let wall = TileCoord::new(1, 0);
        let mut walkable = open(3, 3);
        let mut field = FlowField::default();
        field.rebuild_with(TileCoord::new(0, 0), None, |tile| tile != wall && walkable(tile));

        assert_eq!(field.distance(TileCoord::new(1, 1)), Some(2.0));
        assert_eq!(field.vector(TileCoord::new(1, 1)), Vec2::new(-1.0, 0.0));
        assert_eq!(field.distance(TileCoord::new(2, 0)), Some(4.0));
        assert_eq!(field.vector(TileCoord::new(2, 0)), Vec2::new(0.0, 1.0));
        assert_eq!(field.distance(wall), None);
    }

    #[test]
    fn maximum_distance_bounds_the_search() {
        let mut field = FlowField::default();
        field.rebuild_with(TileCoord::new(0, 0), Some(2.0), open(10, 1));

        assert_eq!(field.len(), 3);
        assert_eq!(field.distance(TileCoord::new(3, 0)), None);
        assert_eq!(field.vector(TileCoord::new(3, 0)), Vec2::ZERO);
    }

    #[test]
    fn unwalkable_target_yields_an_empty_field() {
        let mut field = FlowField::default();
        field.rebuild_with(TileCoord::new(-1, 0), None, open(4, 4));
        assert!(field.is_empty());
        assert_eq!(field.reached_tiles().count(), 0);
    }

    #[test]
    fn frontier_prefers_lower_cost_then_earlier_insertion() {
        let mut heap = BinaryHeap::new();
        let tile = TileCoord::new(0, 0);
        heap.push(Frontier { cost: 2.0, sequence: 0, tile });
        heap.push(Frontier { cost: 1.0, sequence: 2, tile });
        heap.push(Frontier { cost: 1.0, sequence: 1, tile });

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|entry| entry.sequence)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
