use proptest::prelude::*;
use tile_arena_core::{config::default_cells, Command, TileCoord};
use tile_arena_world::{apply, query, visibility, World};

const SIDE: i32 = 12;

fn world_with_walls(walls: &[(i32, i32)]) -> World {
    let mut world = World::new(default_cells());
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureGrid {
            columns: SIDE as u32,
            rows: SIDE as u32,
            tile_length: 32.0,
        },
        &mut events,
    )
    .expect("valid grid");
    for &(column, row) in walls {
        apply(
            &mut world,
            Command::PlaceCell {
                origin: TileCoord::new(column, row),
                cell: "wall".to_owned(),
            },
            &mut events,
        )
        .expect("placement never fails fatally");
    }
    world
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]
    #[test]
    fn line_of_sight_is_symmetric(
        walls in prop::collection::vec((0..SIDE, 0..SIDE), 0..40),
        start in (-1..=SIDE, -1..=SIDE),
        end in (-1..=SIDE, -1..=SIDE),
    ) {
        let world = world_with_walls(&walls);
        let grid = query::grid(&world);
        let start = TileCoord::new(start.0, start.1);
        let end = TileCoord::new(end.0, end.1);

        prop_assert_eq!(
            visibility::has_line_of_sight(start, end, grid),
            visibility::has_line_of_sight(end, start, grid)
        );
    }

    #[test]
    fn blocked_endpoints_never_see_anything(
        walls in prop::collection::vec((0..SIDE, 0..SIDE), 1..20),
        other in (0..SIDE, 0..SIDE),
    ) {
        let world = world_with_walls(&walls);
        let grid = query::grid(&world);
        let wall = TileCoord::new(walls[0].0, walls[0].1);
        let other = TileCoord::new(other.0, other.1);

        prop_assert!(!visibility::has_line_of_sight(wall, other, grid));
    }
}

#[test]
fn pixel_line_of_sight_uses_containing_tiles() {
    let world = world_with_walls(&[(5, 5)]);
    assert!(query::has_line_of_sight(
        &world,
        tile_arena_core::Vec2::new(16.0, 16.0),
        tile_arena_core::Vec2::new(16.0 + 32.0 * 11.0, 16.0),
    ));
    assert!(!query::has_line_of_sight(
        &world,
        tile_arena_core::Vec2::new(16.0, 16.0),
        tile_arena_core::Vec2::new(16.0 + 32.0 * 10.0, 16.0 + 32.0 * 10.0),
    ));
}
