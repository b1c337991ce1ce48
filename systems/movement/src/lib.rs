#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Chase steering for regular enemies driven by a cached flow field.

use std::time::Duration;

use tile_arena_core::{
    config::ChaseTuning, Command, Control, EntityKind, EntitySnapshot, EntityView, Event,
    TileCoord, Vec2,
};
use tile_arena_system_flow_field::FlowField;

/// Pure system that steers AI enemies toward the player.
///
/// Enemies with line of sight walk straight at the player and stop once the
/// player is within the configured fraction of their weapon range. Enemies
/// without sight follow the flow field, which is rebuilt only when the
/// player's tile or the grid revision changes.
#[derive(Debug)]
pub struct Movement {
    tuning: ChaseTuning,
    field: FlowField,
    field_key: Option<(TileCoord, u64)>,
}

impl Movement {
    /// Creates a movement system with the provided chase tuning.
    #[must_use]
    pub fn new(tuning: ChaseTuning) -> Self {
        Self {
            tuning,
            field: FlowField::default(),
            field_key: None,
        }
    }

    /// Flow field rooted at the player's tile during the last update.
    #[must_use]
    pub fn field(&self) -> &FlowField {
        &self.field
    }

    /// Consumes world events and entity snapshots to emit movement commands.
    #[allow(clippy::too_many_arguments)]
    pub fn handle<F, L>(
        &mut self,
        events: &[Event],
        entities: &EntityView,
        tile_length: f32,
        grid_revision: u64,
        is_walkable: F,
        has_line_of_sight: L,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(TileCoord) -> bool,
        L: Fn(TileCoord, TileCoord) -> bool,
    {
        let elapsed: Duration = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt, .. } => Some(*dt),
                _ => None,
            })
            .sum();
        let Some(player) = entities.player() else {
            return;
        };
        let player_center = player.center();
        let player_tile = TileCoord::containing(player_center, tile_length);
        self.refresh_field(player_tile, grid_revision, is_walkable);
        if elapsed.is_zero() {
            return;
        }

        for enemy in entities.iter().filter(|snapshot| is_chaser(snapshot)) {
            let center = enemy.center();
            let tile = TileCoord::containing(center, tile_length);
            let offset = player_center - center;
            let distance = offset.length();
            let sees_player = has_line_of_sight(tile, player_tile);

            let reach = enemy.weapon.as_ref().map_or(0.0, |weapon| weapon.range());
            let stop_distance = reach * self.tuning.stop_range_ratio;
            if sees_player && distance <= stop_distance {
                continue;
            }

            let direct = offset.normalize_or_zero();
            let direction = if sees_player {
                direct
            } else {
                let steering = self.field.vector(tile);
                if steering == Vec2::ZERO {
                    direct
                } else {
                    steering
                }
            };
            if direction == Vec2::ZERO {
                continue;
            }

            let mut step = enemy.speed * elapsed.as_secs_f32();
            if sees_player {
                step = step.min(distance - stop_distance);
            }
            if step <= 0.0 {
                continue;
            }
            out.push(Command::MoveEntity {
                entity: enemy.id,
                delta: direction * step,
            });
        }
    }

    fn refresh_field<F>(&mut self, player_tile: TileCoord, grid_revision: u64, is_walkable: F)
    where
        F: FnMut(TileCoord) -> bool,
    {
        let key = (player_tile, grid_revision);
        if self.field_key == Some(key) {
            return;
        }
        self.field
            .rebuild_with(player_tile, self.tuning.max_field_distance, is_walkable);
        self.field_key = Some(key);
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(ChaseTuning::default())
    }
}

fn is_chaser(snapshot: &EntitySnapshot) -> bool {
    snapshot.kind == EntityKind::Enemy
        && snapshot.control == Control::Ai
        && snapshot.is_alive()
        && snapshot.override_state.is_none()
        && snapshot.speed > 0.0
}
