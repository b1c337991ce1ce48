#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tile Arena.

use std::time::Duration;

use tile_arena_core::{
    config::CellDef, AttackContext, Command, CommandRejection, EntityId, EntityKind,
    EntityRecord, EntitySpawn, Event, OverrideState, RemovalCause, Vec2, WeaponStep,
};

pub mod collision;
mod entities;
pub mod grid;
pub mod snapshot;
pub mod visibility;

use entities::{EntityState, EntityStore};
use grid::{CellPalette, Grid, GridError};
use snapshot::{PlacedCell, WorldSnapshot};

/// Represents the authoritative Tile Arena world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    clock: Duration,
    entities: EntityStore,
}

impl World {
    /// Creates a world whose cells come from the provided palette.
    ///
    /// The grid holds no tiles until a [`Command::ConfigureGrid`] is applied.
    #[must_use]
    pub fn new(cells: Vec<CellDef>) -> Self {
        Self {
            grid: Grid::unconfigured(CellPalette::new(cells)),
            clock: Duration::ZERO,
            entities: EntityStore::default(),
        }
    }

    fn reject(reason: CommandRejection, out_events: &mut Vec<Event>) {
        tracing::debug!(reason = %reason, "command_rejected");
        out_events.push(Event::CommandRejected { reason });
    }

    fn spawn(&mut self, spawn: EntitySpawn, out_events: &mut Vec<Event>) -> Option<EntityId> {
        if !spawn.is_well_formed() {
            tracing::warn!(type_key = %spawn.type_key, "malformed_spawn_rejected");
            Self::reject(CommandRejection::MalformedSpawn(spawn.type_key), out_events);
            return None;
        }
        let kind = spawn.kind;
        let position = spawn.position;
        let id = self.entities.spawn(spawn);
        let tile_length = self.grid.tile_length();
        if let Some(state) = self.entities.get_mut(id) {
            state.last_tile = Some(state.center_tile(tile_length));
        }
        out_events.push(Event::EntitySpawned {
            entity: id,
            kind,
            position,
        });
        Some(id)
    }

    fn remove(&mut self, entity: EntityId, cause: RemovalCause, out_events: &mut Vec<Event>) {
        if let Some(state) = self.entities.remove(entity) {
            out_events.push(Event::EntityRemoved {
                entity,
                kind: state.kind,
                cause,
            });
        }
    }

    fn move_entity(&mut self, entity: EntityId, delta: Vec2, out_events: &mut Vec<Event>) {
        if !delta.is_finite() {
            Self::reject(CommandRejection::NonFiniteMotion(entity), out_events);
            return;
        }
        let tile_length = self.grid.tile_length();
        let bounds = self.grid.bounds();
        let Some(state) = self.entities.get_mut(entity) else {
            Self::reject(CommandRejection::UnknownEntity(entity), out_events);
            return;
        };
        if state.override_state == Some(OverrideState::Shielded) {
            return;
        }

        let from = state.position;
        let to = collision::resolve_motion(state.bounds(tile_length), delta, bounds, &self.grid);
        if to == from {
            return;
        }
        state.position = to;
        out_events.push(Event::EntityMoved { entity, from, to });

        let tile = state.center_tile(tile_length);
        if state.last_tile == Some(tile) {
            return;
        }
        state.last_tile = Some(tile);
        if let Some(trigger) = self.grid.trigger(tile) {
            out_events.push(Event::TriggerEntered {
                entity,
                trigger: trigger.to_owned(),
                tile,
            });
        }
    }

    fn damage(
        &mut self,
        entity: EntityId,
        amount: f32,
        source: Option<EntityId>,
        out_events: &mut Vec<Event>,
    ) {
        if !(amount.is_finite() && amount >= 0.0) {
            Self::reject(CommandRejection::InvalidDamage(entity), out_events);
            return;
        }
        let Some(state) = self.entities.get_mut(entity) else {
            Self::reject(CommandRejection::UnknownEntity(entity), out_events);
            return;
        };
        if !state.kind.is_combatant() {
            return;
        }

        let applied = if state.override_state == Some(OverrideState::Shielded) {
            0.0
        } else {
            amount * state.damage_scale
        };
        state.health = (state.health - applied).max(0.0);
        let remaining = state.health;
        out_events.push(Event::DamageApplied {
            entity,
            source,
            raw: amount,
            applied,
            remaining,
        });

        if remaining <= 0.0 {
            self.kill(entity, out_events);
        }
    }

    fn kill(&mut self, entity: EntityId, out_events: &mut Vec<Event>) {
        let tile_length = self.grid.tile_length();
        let Some(state) = self.entities.remove(entity) else {
            return;
        };
        tracing::debug!(entity = entity.get(), type_key = %state.type_key, "entity_died");
        out_events.push(Event::EntityRemoved {
            entity,
            kind: state.kind,
            cause: RemovalCause::Died,
        });

        if let Some(upgrade) = state.drop.clone() {
            let center = state.bounds(tile_length).center();
            let mut pickup = EntitySpawn::pickup(center, upgrade);
            pickup.position = center - pickup.size * tile_length * 0.5;
            let _ = self.spawn(pickup, out_events);
        }
    }

    fn attack(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        hits: Vec<EntityId>,
        out_events: &mut Vec<Event>,
    ) {
        let tile_length = self.grid.tile_length();
        let Some(target_center) = self
            .entities
            .get(target)
            .map(|state| state.bounds(tile_length).center())
        else {
            Self::reject(CommandRejection::UnknownEntity(target), out_events);
            return;
        };
        let now = self.clock;
        let Some(state) = self.entities.get_mut(attacker) else {
            Self::reject(CommandRejection::UnknownEntity(attacker), out_events);
            return;
        };
        let context = AttackContext {
            attacker,
            faction: state.faction,
            origin: state.bounds(tile_length).center(),
            target: target_center,
        };
        let Some(weapon) = state.loadout.current_mut() else {
            Self::reject(CommandRejection::NoWeapon(attacker), out_events);
            return;
        };
        if !weapon.try_fire(now) {
            let weapon = weapon.id().clone();
            Self::reject(
                CommandRejection::WeaponCoolingDown {
                    entity: attacker,
                    weapon,
                },
                out_events,
            );
            return;
        }
        let weapon_id = weapon.id().clone();
        let damage = weapon.damage();
        let outcome = weapon.behavior().execute(&context);
        if !outcome.succeeded {
            tracing::debug!(entity = attacker.get(), weapon = %weapon_id, "weapon_behavior_failed");
        }

        for (effect, position) in outcome.effects {
            out_events.push(Event::EffectSpawned { effect, position });
        }
        for projectile in outcome.projectiles {
            let _ = self.spawn(projectile, out_events);
        }
        for hit in &hits {
            if self.entities.get(*hit).is_some() {
                self.damage(*hit, damage, Some(attacker), out_events);
            }
        }
        out_events.push(Event::AttackResolved {
            attacker,
            target,
            weapon: weapon_id,
            hits,
            behavior_succeeded: outcome.succeeded,
        });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt, now: self.clock });

        for entity in self.entities.ids() {
            let faulty = self
                .entities
                .get(entity)
                .map_or(false, |state| !state.is_well_formed());
            if faulty {
                tracing::warn!(entity = entity.get(), "entity_state_not_finite_dropped");
                self.remove(entity, RemovalCause::Despawned, out_events);
            }
        }

        for projectile in self.entities.ids_of(EntityKind::Projectile) {
            self.advance_projectile(projectile, dt, out_events);
        }
        for pickup in self.entities.ids_of(EntityKind::Pickup) {
            self.try_collect(pickup, out_events);
        }
    }

    fn advance_projectile(&mut self, entity: EntityId, dt: Duration, out_events: &mut Vec<Event>) {
        let tile_length = self.grid.tile_length();
        let bounds = self.grid.bounds();
        let Some(state) = self.entities.get_mut(entity) else {
            return;
        };
        let Some(motion) = state.projectile.as_mut() else {
            return;
        };
        motion.remaining = motion.remaining.saturating_sub(dt);
        let expired = motion.remaining.is_zero();
        let (owner, contact_damage) = (motion.owner, motion.contact_damage);
        let next = state.position + motion.velocity * dt.as_secs_f32();
        let body = tile_arena_core::Aabb::new(next, state.size * tile_length);
        if collision::check_collision(body, bounds, &self.grid) {
            self.remove(entity, RemovalCause::Impact, out_events);
            return;
        }
        state.position = next;
        let faction = state.faction;

        if contact_damage > 0.0 {
            let struck = self
                .entities
                .iter()
                .filter(|other| other.kind.is_combatant() && other.faction.opposes(faction))
                .find(|other| other.bounds(tile_length).overlaps(&body))
                .map(|other| other.id);
            if let Some(struck) = struck {
                self.damage(struck, contact_damage, Some(owner), out_events);
                self.remove(entity, RemovalCause::Impact, out_events);
                return;
            }
        }
        if expired {
            self.remove(entity, RemovalCause::Expired, out_events);
        }
    }

    fn try_collect(&mut self, pickup: EntityId, out_events: &mut Vec<Event>) {
        let tile_length = self.grid.tile_length();
        let Some(state) = self.entities.get(pickup) else {
            return;
        };
        let Some(upgrade) = state.pickup.clone() else {
            return;
        };
        let area = state.bounds(tile_length);
        let collector = self
            .entities
            .iter()
            .filter(|other| other.kind.is_combatant() && !other.faction.opposes(state.faction))
            .find(|other| other.bounds(tile_length).overlaps(&area))
            .map(|other| other.id);
        let Some(collector) = collector else {
            return;
        };

        if let Some(holder) = self.entities.get_mut(collector) {
            let weapons = holder.loadout.apply_upgrade(&upgrade);
            out_events.push(Event::UpgradeApplied {
                entity: collector,
                weapons,
            });
        }
        self.remove(pickup, RemovalCause::Collected, out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Recoverable failures are reported through `out_events`; only invalid grid
/// configuration is returned as an error, leaving the world unchanged.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), GridError> {
    match command {
        Command::ConfigureGrid {
            columns,
            rows,
            tile_length,
        } => {
            world.grid = Grid::new(columns, rows, tile_length, world.grid.palette().clone())?;
            out_events.push(Event::GridConfigured {
                columns,
                rows,
                tile_length,
            });
        }
        Command::ScaleGrid { factor } => {
            world.grid = world.grid.scale_by(factor)?;
            out_events.push(Event::GridScaled {
                factor,
                columns: world.grid.columns(),
                rows: world.grid.rows(),
            });
        }
        Command::PlaceCell { origin, cell } => match world.grid.set(origin, &cell) {
            Ok(()) => out_events.push(Event::CellPlaced { origin, cell }),
            Err(reason) => out_events.push(Event::CellPlacementRejected {
                origin,
                cell,
                reason,
            }),
        },
        Command::ClearCell { tile } => {
            if let Some((origin, cell)) = world.grid.clear(tile) {
                out_events.push(Event::CellCleared { origin, cell });
            }
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnEntity { spawn } => {
            let _ = world.spawn(spawn, out_events);
        }
        Command::RestoreEntity { record } => restore_entity(world, record, out_events),
        Command::RemoveEntity { entity } => {
            if world.entities.get(entity).is_some() {
                world.remove(entity, RemovalCause::Despawned, out_events);
            } else {
                World::reject(CommandRejection::UnknownEntity(entity), out_events);
            }
        }
        Command::MoveEntity { entity, delta } => world.move_entity(entity, delta, out_events),
        Command::ApplyDamage {
            entity,
            amount,
            source,
        } => world.damage(entity, amount, source, out_events),
        Command::Attack {
            attacker,
            target,
            hits,
        } => world.attack(attacker, target, hits, out_events),
        Command::SwitchWeapon { entity, step } => switch_weapon(world, entity, step, out_events),
        Command::EquipWeapon { entity, weapon } => {
            let Some(state) = world.entities.get_mut(entity) else {
                World::reject(CommandRejection::UnknownEntity(entity), out_events);
                return Ok(());
            };
            let weapon_id = weapon.id().clone();
            let slot = state.loadout.equip(weapon);
            out_events.push(Event::WeaponSwitched {
                entity,
                slot,
                weapon: weapon_id,
            });
        }
        Command::ApplyUpgrade { entity, upgrade } => {
            let Some(state) = world.entities.get_mut(entity) else {
                World::reject(CommandRejection::UnknownEntity(entity), out_events);
                return Ok(());
            };
            let weapons = state.loadout.apply_upgrade(&upgrade);
            out_events.push(Event::UpgradeApplied { entity, weapons });
        }
        Command::SetDamageScale { entity, scale } => {
            if !(scale.is_finite() && scale >= 0.0) {
                World::reject(CommandRejection::InvalidDamage(entity), out_events);
                return Ok(());
            }
            let Some(state) = world.entities.get_mut(entity) else {
                World::reject(CommandRejection::UnknownEntity(entity), out_events);
                return Ok(());
            };
            state.damage_scale = scale;
            out_events.push(Event::DamageScaleChanged { entity, scale });
        }
        Command::SetOverride { entity, state } => {
            let Some(entry) = world.entities.get_mut(entity) else {
                World::reject(CommandRejection::UnknownEntity(entity), out_events);
                return Ok(());
            };
            if entry.override_state != state {
                entry.override_state = state;
                out_events.push(Event::OverrideChanged { entity, state });
            }
        }
        Command::SetPhase { entity, phase } => {
            let Some(state) = world.entities.get_mut(entity) else {
                World::reject(CommandRejection::UnknownEntity(entity), out_events);
                return Ok(());
            };
            if phase > state.phase {
                state.phase = phase;
                out_events.push(Event::PhaseChanged { entity, phase });
            }
        }
        Command::SetAppearance { entity, variant } => {
            let Some(state) = world.entities.get_mut(entity) else {
                World::reject(CommandRejection::UnknownEntity(entity), out_events);
                return Ok(());
            };
            state.appearance = variant;
            out_events.push(Event::AppearanceChanged { entity, variant });
        }
        Command::SpawnEffect { effect, position } => {
            out_events.push(Event::EffectSpawned { effect, position });
        }
        Command::RequestAttack { .. } | Command::RequestAbility { .. } => {}
    }
    Ok(())
}

fn restore_entity(world: &mut World, record: EntityRecord, out_events: &mut Vec<Event>) {
    let tile_length = world.grid.tile_length();
    let mut state = EntityState::from_record(record);
    if !state.is_well_formed() {
        World::reject(CommandRejection::MalformedSpawn(state.type_key), out_events);
        return;
    }
    state.last_tile = Some(state.center_tile(tile_length));
    let (kind, position) = (state.kind, state.position);
    match world.entities.restore(state) {
        Ok(entity) => out_events.push(Event::EntitySpawned {
            entity,
            kind,
            position,
        }),
        Err(reason) => World::reject(reason, out_events),
    }
}

fn switch_weapon(world: &mut World, entity: EntityId, step: WeaponStep, out_events: &mut Vec<Event>) {
    let Some(state) = world.entities.get_mut(entity) else {
        World::reject(CommandRejection::UnknownEntity(entity), out_events);
        return;
    };
    let Some(weapon) = state.loadout.switch(step) else {
        World::reject(CommandRejection::NoWeapon(entity), out_events);
        return;
    };
    let weapon = weapon.id().clone();
    out_events.push(Event::WeaponSwitched {
        entity,
        slot: state.loadout.current_index(),
        weapon,
    });
}

/// Replaces the world's grid and entities with the snapshot's contents.
///
/// The simulation clock is preserved. Cell anchors are replayed through the
/// regular placement path, so unknown cells are rejected and logged.
pub fn restore(
    world: &mut World,
    snapshot: &WorldSnapshot,
    out_events: &mut Vec<Event>,
) -> Result<(), GridError> {
    world.grid = Grid::with_scale(
        snapshot.columns,
        snapshot.rows,
        snapshot.tile_length,
        snapshot.scale,
        world.grid.palette().clone(),
    )?;
    out_events.push(Event::GridConfigured {
        columns: snapshot.columns,
        rows: snapshot.rows,
        tile_length: snapshot.tile_length,
    });
    world.entities.clear();

    for placed in &snapshot.cells {
        apply(
            world,
            Command::PlaceCell {
                origin: placed.origin,
                cell: placed.cell.clone(),
            },
            out_events,
        )?;
    }
    for record in &snapshot.entities {
        restore_entity(world, record.clone(), out_events);
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use tile_arena_core::{config::CellDef, EntityId, EntitySnapshot, EntityView, TileCoord, Vec2};

    use super::{grid::Grid, visibility, EntityKind, PlacedCell, World, WorldSnapshot};

    /// Provides read-only access to the cell grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Current simulation clock.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Side length of a tile in pixels.
    #[must_use]
    pub fn tile_length(world: &World) -> f32 {
        world.grid.tile_length()
    }

    /// Revision counter of the grid, bumped by every successful mutation.
    #[must_use]
    pub fn grid_revision(world: &World) -> u64 {
        world.grid.revision()
    }

    /// Cell occupying the tile, or `None` outside the grid.
    #[must_use]
    pub fn get_cell(world: &World, tile: TileCoord) -> Option<&CellDef> {
        world.grid.get(tile)
    }

    /// Reports whether entities may stand on the tile.
    #[must_use]
    pub fn is_walkable(world: &World, tile: TileCoord) -> bool {
        world.grid.is_walkable(tile)
    }

    /// Tile containing the pixel position.
    #[must_use]
    pub fn tile_at(world: &World, point: Vec2) -> TileCoord {
        TileCoord::containing(point, world.grid.tile_length())
    }

    /// Reports whether the tiles containing the two pixel positions see each other.
    #[must_use]
    pub fn has_line_of_sight(world: &World, from: Vec2, to: Vec2) -> bool {
        visibility::has_line_of_sight(tile_at(world, from), tile_at(world, to), &world.grid)
    }

    /// Captures a read-only view of every entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        let tile_length = world.grid.tile_length();
        EntityView::from_snapshots(
            world
                .entities
                .iter()
                .map(|state| state.snapshot(tile_length))
                .collect(),
        )
    }

    /// Captures a single entity.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<EntitySnapshot> {
        world
            .entities
            .get(id)
            .map(|state| state.snapshot(world.grid.tile_length()))
    }

    /// Captures the world as pure data.
    ///
    /// Projectiles are transient and never persisted.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        WorldSnapshot {
            columns: world.grid.columns(),
            rows: world.grid.rows(),
            tile_length: world.grid.tile_length(),
            scale: world.grid.scale(),
            cells: world
                .grid
                .anchors()
                .into_iter()
                .map(|(origin, cell)| PlacedCell {
                    origin,
                    cell: cell.to_owned(),
                })
                .collect(),
            entities: world
                .entities
                .iter()
                .filter(|state| state.kind != EntityKind::Projectile)
                .map(|state| state.to_record())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_arena_core::{
        config::default_cells, Control, EntityKind, Faction, Phase, TileCoord, Upgrade,
        UpgradeTarget, Weapon, WeaponBehavior, WeaponId,
    };

    fn configured_world() -> (World, Vec<Event>) {
        let mut world = World::new(default_cells());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 8,
                rows: 8,
                tile_length: 32.0,
            },
            &mut events,
        )
        .expect("valid grid");
        (world, events)
    }

    fn spawn(world: &mut World, spawn: EntitySpawn) -> EntityId {
        let mut events = Vec::new();
        apply(world, Command::SpawnEntity { spawn }, &mut events).expect("spawn");
        match events.as_slice() {
            [Event::EntitySpawned { entity, .. }] => *entity,
            other => panic!("unexpected events {other:?}"),
        }
    }

    fn boss(health: f32, scale: f32) -> EntitySpawn {
        EntitySpawn::new(EntityKind::Boss, Faction::Hostiles, "boss", Vec2::new(64.0, 64.0))
            .with_health(health)
            .with_damage_scale(scale)
    }

    #[test]
    fn configure_rejects_invalid_dimensions_without_mutation() {
        let (mut world, _) = configured_world();
        let mut events = Vec::new();
        let result = apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 0,
                rows: 4,
                tile_length: 32.0,
            },
            &mut events,
        );
        assert_eq!(result, Err(GridError::InvalidDimensions { columns: 0, rows: 4 }));
        assert!(events.is_empty());
        assert_eq!(query::grid(&world).columns(), 8);
    }

    #[test]
    fn damage_is_scaled_before_health_is_reduced() {
        let (mut world, _) = configured_world();
        let boss = spawn(&mut world, boss(4000.0, 0.65));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyDamage {
                entity: boss,
                amount: 2093.0,
                source: None,
            },
            &mut events,
        )
        .expect("damage");

        let snapshot = query::entity(&world, boss).expect("boss alive");
        assert!((snapshot.health - (4000.0 - 2093.0 * 0.65)).abs() < 1e-3);
        assert!(snapshot.health_fraction() < 0.66);
    }

    #[test]
    fn shielded_entities_take_no_damage_and_do_not_move() {
        let (mut world, _) = configured_world();
        let boss = spawn(&mut world, boss(100.0, 1.0));
        let mut events = Vec::new();
        for command in [
            Command::SetOverride {
                entity: boss,
                state: Some(OverrideState::Shielded),
            },
            Command::ApplyDamage {
                entity: boss,
                amount: 50.0,
                source: None,
            },
            Command::MoveEntity {
                entity: boss,
                delta: Vec2::new(16.0, 0.0),
            },
        ] {
            apply(&mut world, command, &mut events).expect("apply");
        }

        let snapshot = query::entity(&world, boss).expect("boss alive");
        assert_eq!(snapshot.health, 100.0);
        assert_eq!(snapshot.bounds.min(), Vec2::new(64.0, 64.0));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::DamageApplied { applied, .. } if *applied == 0.0
        )));
    }

    #[test]
    fn lethal_damage_removes_the_entity_and_drops_its_upgrade() {
        let (mut world, _) = configured_world();
        let grunt = spawn(
            &mut world,
            EntitySpawn::new(EntityKind::Enemy, Faction::Hostiles, "grunt", Vec2::ZERO)
                .with_health(10.0)
                .with_drop(Some(Upgrade::single(UpgradeTarget::All, "damage", 2.0))),
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyDamage {
                entity: grunt,
                amount: 25.0,
                source: None,
            },
            &mut events,
        )
        .expect("damage");

        assert!(query::entity(&world, grunt).is_none());
        assert!(events.contains(&Event::EntityRemoved {
            entity: grunt,
            kind: EntityKind::Enemy,
            cause: RemovalCause::Died,
        }));
        let pickups: Vec<_> = query::entity_view(&world)
            .iter()
            .filter(|snapshot| snapshot.kind == EntityKind::Pickup)
            .map(|snapshot| snapshot.center())
            .collect();
        assert_eq!(pickups, vec![Vec2::new(16.0, 16.0)]);
    }

    #[test]
    fn allies_collect_pickups_on_contact() {
        let (mut world, _) = configured_world();
        let sword = Weapon::new(
            WeaponId::new("sword"),
            WeaponBehavior::Melee,
            10.0,
            48.0,
            Duration::from_millis(500),
        );
        let player = spawn(
            &mut world,
            EntitySpawn::new(EntityKind::Player, Faction::Allies, "player", Vec2::ZERO)
                .with_health(100.0)
                .with_weapon(sword),
        );
        let _pickup = spawn(
            &mut world,
            EntitySpawn::pickup(
                Vec2::new(8.0, 8.0),
                Upgrade::single(UpgradeTarget::Weapon("sword".to_owned()), "damage", 5.0),
            ),
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        )
        .expect("tick");

        let weapon = query::entity(&world, player)
            .and_then(|snapshot| snapshot.weapon)
            .expect("weapon");
        assert_eq!(weapon.damage(), 15.0);
        assert_eq!(
            query::entity_view(&world)
                .iter()
                .filter(|snapshot| snapshot.kind == EntityKind::Pickup)
                .count(),
            0
        );
    }

    #[test]
    fn attacks_respect_weapon_cooldown() {
        let (mut world, _) = configured_world();
        let sword = Weapon::new(
            WeaponId::new("sword"),
            WeaponBehavior::Melee,
            10.0,
            48.0,
            Duration::from_millis(1000),
        );
        let player = spawn(
            &mut world,
            EntitySpawn::new(EntityKind::Player, Faction::Allies, "player", Vec2::ZERO)
                .with_health(100.0)
                .with_weapon(sword),
        );
        let grunt = spawn(
            &mut world,
            EntitySpawn::new(EntityKind::Enemy, Faction::Hostiles, "grunt", Vec2::new(32.0, 0.0))
                .with_health(100.0),
        );

        let attack = || Command::Attack {
            attacker: player,
            target: grunt,
            hits: vec![grunt],
        };
        let tick = |millis| Command::Tick {
            dt: Duration::from_millis(millis),
        };

        let mut events = Vec::new();
        for command in [attack(), tick(500), attack(), tick(500), attack()] {
            apply(&mut world, command, &mut events).expect("apply");
        }

        let resolved = events
            .iter()
            .filter(|event| matches!(event, Event::AttackResolved { .. }))
            .count();
        let cooling = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::CommandRejected {
                        reason: CommandRejection::WeaponCoolingDown { .. }
                    }
                )
            })
            .count();
        assert_eq!((resolved, cooling), (2, 1));
        assert_eq!(query::entity(&world, grunt).map(|g| g.health), Some(80.0));
        let last = query::entity(&world, player)
            .and_then(|snapshot| snapshot.weapon)
            .and_then(|weapon| weapon.last_attack());
        assert_eq!(last, Some(Duration::from_millis(1000)));
    }

    #[test]
    fn moving_onto_a_trigger_reports_it_once() {
        let (mut world, _) = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceCell {
                origin: TileCoord::new(1, 0),
                cell: "exit".to_owned(),
            },
            &mut events,
        )
        .expect("place");
        let player = spawn(
            &mut world,
            EntitySpawn::new(EntityKind::Player, Faction::Allies, "player", Vec2::ZERO)
                .with_health(10.0)
                .with_control(Control::External),
        );

        events.clear();
        for _ in 0..2 {
            apply(
                &mut world,
                Command::MoveEntity {
                    entity: player,
                    delta: Vec2::new(12.0, 0.0),
                },
                &mut events,
            )
            .expect("move");
        }
        let triggers: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, Event::TriggerEntered { .. }))
            .collect();
        assert_eq!(triggers.len(), 1);
    }

    #[test]
    fn boss_phase_only_moves_forward_and_is_recorded() {
        let (mut world, _) = configured_world();
        let boss = spawn(&mut world, boss(500.0, 0.65));
        let mut events = Vec::new();
        for phase in [Phase::Three, Phase::Two] {
            apply(&mut world, Command::SetPhase { entity: boss, phase }, &mut events)
                .expect("phase");
        }

        assert_eq!(
            events,
            vec![Event::PhaseChanged {
                entity: boss,
                phase: Phase::Three,
            }]
        );
        let record = query::snapshot(&world)
            .entities
            .into_iter()
            .find(|record| record.id == boss)
            .expect("boss recorded");
        assert_eq!(record.phase, Phase::Three);
    }

    #[test]
    fn snapshot_restores_grid_and_entities() {
        let (mut world, _) = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceCell {
                origin: TileCoord::new(2, 2),
                cell: "pillar".to_owned(),
            },
            &mut events,
        )
        .expect("place");
        let boss = spawn(&mut world, boss(500.0, 0.65));
        let _arrow = spawn(
            &mut world,
            EntitySpawn::projectile(
                "arrow",
                Faction::Allies,
                Vec2::new(200.0, 200.0),
                Vec2::splat(0.25),
                tile_arena_core::ProjectileSpawn {
                    owner: boss,
                    velocity: Vec2::X,
                    lifetime: Duration::from_secs(1),
                    contact_damage: 0.0,
                },
            ),
        );

        let snapshot = query::snapshot(&world);
        assert_eq!(snapshot.entities.len(), 1);
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let decoded: WorldSnapshot = serde_json::from_str(&json).expect("deserialize");

        let mut restored = World::new(default_cells());
        let mut restore_events = Vec::new();
        restore(&mut restored, &decoded, &mut restore_events).expect("restore");

        assert!(!query::is_walkable(&restored, TileCoord::new(3, 3)));
        let entity = query::entity(&restored, boss).expect("boss restored");
        assert_eq!(entity.damage_scale, 0.65);
        assert_eq!(query::snapshot(&restored), snapshot);
    }
}
