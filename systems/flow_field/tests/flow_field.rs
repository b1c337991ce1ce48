use std::collections::BTreeSet;

use proptest::prelude::*;
use tile_arena_core::{TileCoord, Vec2};
use tile_arena_system_flow_field::FlowField;

fn step_of(vector: Vec2) -> (i32, i32) {
    (vector.x.round() as i32, vector.y.round() as i32)
}

#[test]
fn open_grid_paths_are_chebyshev_optimal() {
    let target = TileCoord::new(9, 9);
    let mut field = FlowField::default();
    field.rebuild_with(target, None, |tile| {
        (0..10).contains(&tile.column()) && (0..10).contains(&tile.row())
    });
    assert_eq!(field.len(), 100);

    for start in field.reached_tiles().collect::<Vec<_>>() {
        let mut tile = start;
        let mut steps = 0;
        while tile != target {
            let (column, row) = step_of(field.vector(tile));
            assert_ne!((column, row), (0, 0), "stalled at {tile:?}");
            tile = tile.offset(column, row);
            steps += 1;
            assert!(steps <= 100, "path from {start:?} does not terminate");
        }
        assert_eq!(steps, start.chebyshev_distance(target), "from {start:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]
    #[test]
    fn vectors_point_at_strictly_closer_neighbours(
        walls in prop::collection::btree_set((0..10_i32, 0..10_i32), 0..35),
        target in (0..10_i32, 0..10_i32),
        limit in prop::option::of(1.0_f32..12.0),
    ) {
        let walls: BTreeSet<TileCoord> = walls
            .into_iter()
            .map(|(column, row)| TileCoord::new(column, row))
            .collect();
        let target = TileCoord::new(target.0, target.1);
        let walkable = |tile: TileCoord| {
            (0..10).contains(&tile.column())
                && (0..10).contains(&tile.row())
                && !walls.contains(&tile)
        };

        let mut field = FlowField::default();
        field.rebuild_with(target, limit, walkable);

        if !walkable(target) {
            prop_assert!(field.is_empty());
            return Ok(());
        }
        prop_assert_eq!(field.distance(target), Some(0.0));
        prop_assert_eq!(field.vector(target), Vec2::ZERO);

        for tile in field.reached_tiles() {
            let distance = field.distance(tile).unwrap_or(f32::NAN);
            prop_assert!(distance >= 0.0);
            prop_assert!(walkable(tile));
            if let Some(limit) = limit {
                prop_assert!(distance <= limit);
            }

            let vector = field.vector(tile);
            if tile == target {
                continue;
            }
            prop_assert_ne!(vector, Vec2::ZERO);
            let (column, row) = step_of(vector);
            let next = tile.offset(column, row);
            let next_distance = field.distance(next);
            prop_assert!(next_distance.map_or(false, |next| next < distance));
        }
    }
}
