#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Owns the world and every system, ticking them in a fixed order.

mod services;

use std::{f32::consts::TAU, time::Duration};

use tile_arena_core::{
    config::{ArenaConfig, CellDef},
    Command, EntityId, EntityKind, EntitySnapshot, EntitySpawn, EntityView, Event, Phase,
    RemovalCause, TileCoord, Vec2,
};
use tile_arena_system_boss::{AbilityRequest, BossDirector};
use tile_arena_system_combat::Combat;
use tile_arena_system_control::Controller;
use tile_arena_system_movement::Movement;
use tile_arena_world::{
    self as world, grid::GridError, query, snapshot::WorldSnapshot, visibility, World,
};

pub use services::{NullServices, RecordingServices, Services};

/// Fatal failures that abort a simulation step.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The grid configuration was rejected.
    #[error("grid configuration rejected: {0}")]
    Grid(#[from] GridError),
}

/// Events produced while stepping the simulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Every event in the order it was emitted.
    pub events: Vec<Event>,
}

impl StepReport {
    /// Total damage applied across all entities after scaling.
    #[must_use]
    pub fn damage_exchanged(&self) -> f32 {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::DamageApplied { applied, .. } => Some(*applied),
                _ => None,
            })
            .sum()
    }

    /// Identifiers of entities of `kind` that died during the step.
    #[must_use]
    pub fn deaths(&self, kind: EntityKind) -> Vec<EntityId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::EntityRemoved {
                    entity,
                    kind: removed,
                    cause: RemovalCause::Died,
                } if *removed == kind => Some(*entity),
                _ => None,
            })
            .collect()
    }
}

/// Ray observations around an entity, expressed as proximities in `[0, 1]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vision {
    /// Proximity of the first wall along each ray.
    pub walls: Vec<f32>,
    /// Proximity of the nearest opposing combatant along each ray.
    pub entities: Vec<f32>,
}

/// Tile arena simulation: the world plus its systems.
#[derive(Debug)]
pub struct Simulation {
    config: ArenaConfig,
    world: World,
    controller: Controller,
    boss: BossDirector,
    movement: Movement,
    combat: Combat,
}

impl Simulation {
    /// Creates a simulation with the configured palette and grid.
    pub fn new(config: ArenaConfig) -> Result<Self, SimulationError> {
        let mut world = World::new(config.palette());
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureGrid {
                columns: config.grid.columns,
                rows: config.grid.rows,
                tile_length: config.grid.tile_length,
            },
            &mut events,
        )?;
        tracing::info!(
            columns = config.grid.columns,
            rows = config.grid.rows,
            "simulation_created"
        );
        Ok(Self {
            controller: Controller::new(),
            boss: BossDirector::new(config.clone()),
            movement: Movement::new(config.chase),
            combat: Combat::new(config.combat),
            world,
            config,
        })
    }

    /// Configuration the simulation was created with.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Read-only access to the world for fine-grained queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Advances the simulation by `dt`.
    ///
    /// Order: world clock and lifetimes, control, boss, movement, combat.
    /// Spawned effects are forwarded to `services`.
    pub fn step(
        &mut self,
        dt: Duration,
        services: &mut dyn Services,
    ) -> Result<StepReport, SimulationError> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events)?;

        let mut commands = Vec::new();
        self.controller
            .handle(&events, &query::entity_view(&self.world), &mut commands);
        let mut attack_requests = Vec::new();
        let mut ability_requests = Vec::new();
        commands.retain(|command| match command {
            Command::RequestAttack { attacker } => {
                attack_requests.push(*attacker);
                false
            }
            Command::RequestAbility {
                entity,
                ability,
                variant,
            } => {
                ability_requests.push(AbilityRequest {
                    entity: *entity,
                    ability: *ability,
                    variant: *variant,
                });
                false
            }
            _ => true,
        });
        self.apply_all(&mut commands, &mut events)?;

        self.boss.handle(
            &events,
            query::clock(&self.world),
            &query::entity_view(&self.world),
            query::tile_length(&self.world),
            &ability_requests,
            &mut commands,
        );
        self.apply_all(&mut commands, &mut events)?;

        let grid = query::grid(&self.world);
        self.movement.handle(
            &events,
            &query::entity_view(&self.world),
            grid.tile_length(),
            grid.revision(),
            |tile| grid.is_walkable(tile),
            |from, to| visibility::has_line_of_sight(from, to, grid),
            &mut commands,
        );
        self.apply_all(&mut commands, &mut events)?;

        let grid = query::grid(&self.world);
        self.combat.handle(
            &events,
            query::clock(&self.world),
            &query::entity_view(&self.world),
            grid.tile_length(),
            &attack_requests,
            |from, to| visibility::has_line_of_sight(from, to, grid),
            &mut commands,
        );
        self.apply_all(&mut commands, &mut events)?;

        for event in &events {
            if let Event::EffectSpawned { effect, position } = event {
                services.effect(*effect, *position);
            }
        }
        Ok(StepReport { events })
    }

    /// Runs `frames` steps of `dt` back to back, concatenating their reports.
    pub fn step_frames(
        &mut self,
        frames: u32,
        dt: Duration,
        services: &mut dyn Services,
    ) -> Result<StepReport, SimulationError> {
        let mut report = StepReport::default();
        for _ in 0..frames {
            report.events.extend(self.step(dt, services)?.events);
        }
        Ok(report)
    }

    /// Applies an arbitrary world command outside the tick order.
    pub fn apply(&mut self, command: Command) -> Result<Vec<Event>, SimulationError> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events)?;
        Ok(events)
    }

    fn apply_all(
        &mut self,
        commands: &mut Vec<Command>,
        events: &mut Vec<Event>,
    ) -> Result<(), SimulationError> {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, events)?;
        }
        Ok(())
    }

    /// Cell occupying `tile`, or `None` outside the grid.
    #[must_use]
    pub fn get_cell(&self, tile: TileCoord) -> Option<&CellDef> {
        query::get_cell(&self.world, tile)
    }

    /// Reports whether `tile` is inside the grid and walkable.
    #[must_use]
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        query::is_walkable(&self.world, tile)
    }

    /// Flow-field direction at `tile` toward the player, or zero.
    #[must_use]
    pub fn flow_vector(&self, tile: TileCoord) -> Vec2 {
        self.movement.field().vector(tile)
    }

    /// Flow-field distance from `tile` to the player's tile.
    #[must_use]
    pub fn flow_distance(&self, tile: TileCoord) -> Option<f32> {
        self.movement.field().distance(tile)
    }

    /// Tile-level line of sight between two pixel positions.
    #[must_use]
    pub fn has_line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        query::has_line_of_sight(&self.world, from, to)
    }

    /// Snapshots of every entity, ordered by identifier.
    #[must_use]
    pub fn entities(&self) -> EntityView {
        query::entity_view(&self.world)
    }

    /// Snapshot of a single entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        query::entity(&self.world, id)
    }

    /// Current simulation time.
    #[must_use]
    pub fn clock(&self) -> Duration {
        query::clock(&self.world)
    }

    /// Phase of `boss`, once the director has observed it.
    #[must_use]
    pub fn boss_phase(&self, boss: EntityId) -> Option<Phase> {
        self.boss.brain(boss).map(|brain| brain.phase())
    }

    /// Spawns an entity, returning its identifier when accepted.
    pub fn spawn_entity(
        &mut self,
        spawn: EntitySpawn,
    ) -> Result<Option<EntityId>, SimulationError> {
        let events = self.apply(Command::SpawnEntity { spawn })?;
        Ok(events.iter().find_map(|event| match event {
            Event::EntitySpawned { entity, .. } => Some(*entity),
            _ => None,
        }))
    }

    /// Spawns the configured player at `position`.
    pub fn spawn_player(&mut self, position: Vec2) -> Result<Option<EntityId>, SimulationError> {
        let spawn = self.config.player_spawn(position);
        self.spawn_entity(spawn)
    }

    /// Spawns a configured enemy of `type_key` at `position`.
    pub fn spawn_enemy(
        &mut self,
        type_key: &str,
        position: Vec2,
    ) -> Result<Option<EntityId>, SimulationError> {
        let spawn = self.config.enemy_spawn(type_key, position);
        self.spawn_entity(spawn)
    }

    /// Spawns the configured boss at `position`.
    pub fn spawn_boss(&mut self, position: Vec2) -> Result<Option<EntityId>, SimulationError> {
        let spawn = self.config.boss_spawn(position);
        self.spawn_entity(spawn)
    }

    /// Places the named cell with its anchor at `origin`.
    pub fn place_cell(&mut self, origin: TileCoord, cell: &str) -> Result<bool, SimulationError> {
        let events = self.apply(Command::PlaceCell {
            origin,
            cell: cell.to_owned(),
        })?;
        Ok(events
            .iter()
            .any(|event| matches!(event, Event::CellPlaced { .. })))
    }

    /// Removes an entity, reporting whether it existed.
    pub fn remove_entity(&mut self, entity: EntityId) -> Result<bool, SimulationError> {
        let events = self.apply(Command::RemoveEntity { entity })?;
        Ok(events
            .iter()
            .any(|event| matches!(event, Event::EntityRemoved { .. })))
    }

    /// Applies raw damage to an entity through its damage scale.
    pub fn apply_damage(
        &mut self,
        entity: EntityId,
        amount: f32,
    ) -> Result<Vec<Event>, SimulationError> {
        self.apply(Command::ApplyDamage {
            entity,
            amount,
            source: None,
        })
    }

    /// Holds the action `code` for an externally controlled entity.
    ///
    /// Returns `false` for unrecognised codes and for entities that do not
    /// exist; the latter hold nothing.
    pub fn set_action(&mut self, entity: EntityId, code: u8) -> bool {
        if query::entity(&self.world, entity).is_none() {
            tracing::warn!(entity = entity.get(), code, "action_for_unknown_entity");
            return false;
        }
        self.controller.set_action(entity, code)
    }

    /// Casts `rays` evenly spaced rays from the centre of `entity`.
    ///
    /// The first ray points east and the rest follow clockwise in screen
    /// space. Returns `None` for unknown entities or zero rays.
    #[must_use]
    pub fn vision(&self, entity: EntityId, rays: usize, max_distance: f32) -> Option<Vision> {
        if rays == 0 {
            return None;
        }
        let observer = query::entity(&self.world, entity)?;
        let origin = observer.center();
        let grid = query::grid(&self.world);
        let view = query::entity_view(&self.world);
        let opponents: Vec<&EntitySnapshot> = view
            .iter()
            .filter(|other| {
                other.kind.is_combatant()
                    && other.is_alive()
                    && other.faction.opposes(observer.faction)
            })
            .collect();

        let mut vision = Vision::default();
        for index in 0..rays {
            let angle = TAU * index as f32 / rays as f32;
            let direction = Vec2::new(angle.cos(), angle.sin());
            vision
                .walls
                .push(visibility::cast_wall_ray(origin, direction, max_distance, grid));
            let nearest = opponents
                .iter()
                .map(|other| {
                    visibility::cast_entity_ray(
                        origin,
                        direction,
                        max_distance,
                        &other.bounds,
                        grid,
                    )
                })
                .fold(0.0_f32, f32::max);
            vision.entities.push(nearest);
        }
        Some(vision)
    }

    /// Pure-data snapshot of the grid and entities.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        query::snapshot(&self.world)
    }

    /// Replaces the world contents with `snapshot`, resetting system state.
    pub fn restore(&mut self, snapshot: &WorldSnapshot) -> Result<Vec<Event>, SimulationError> {
        let mut events = Vec::new();
        world::restore(&mut self.world, snapshot, &mut events)?;
        self.controller = Controller::new();
        self.boss = BossDirector::new(self.config.clone());
        self.movement = Movement::new(self.config.chase);
        self.combat = Combat::new(self.config.combat);
        tracing::info!(entities = snapshot.entities.len(), "simulation_restored");
        Ok(events)
    }
}
