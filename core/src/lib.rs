#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tile Arena simulation.
//!
//! This crate defines the message surface that connects front-ends, the
//! authoritative world, and pure systems. Front-ends and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable [`EntityView`] snapshots, and respond exclusively with new
//! command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod action;
mod boss;
pub mod config;
mod duration_ms;
mod geometry;
mod weapon;

pub use action::{Action, ACTION_COUNT};
pub use boss::{BossAbility, OverrideState, Phase};
pub use geometry::Aabb;
pub use glam::Vec2;
pub use weapon::{
    AttackContext, BehaviorOutcome, Loadout, Upgrade, UpgradeTarget, Weapon, WeaponBehavior,
    WeaponId, WeaponRecord, WeaponStep, MAX_WEAPONS,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the world's cell grid using the provided dimensions.
    ConfigureGrid {
        /// Number of tile columns laid out in the grid.
        columns: u32,
        /// Number of tile rows laid out in the grid.
        rows: u32,
        /// Length of each square tile measured in pixels.
        tile_length: f32,
    },
    /// Rebuilds the grid at an integer multiple of its current resolution.
    ScaleGrid {
        /// Number of destination tiles per source tile along each axis.
        factor: u32,
    },
    /// Places the named cell with its footprint anchored at `origin`.
    PlaceCell {
        /// Upper-left tile of the cell's footprint.
        origin: TileCoord,
        /// Stable name of the cell in the palette.
        cell: String,
    },
    /// Resets the whole footprint of the cell covering `tile` to the empty cell.
    ClearCell {
        /// Any tile covered by the cell to remove.
        tile: TileCoord,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Creates a new entity from the provided description.
    SpawnEntity {
        /// Full description of the entity to create.
        spawn: EntitySpawn,
    },
    /// Recreates an entity from persisted pure data, rebinding derived handles.
    RestoreEntity {
        /// Persisted entity state.
        record: EntityRecord,
    },
    /// Removes an entity without applying death side effects.
    RemoveEntity {
        /// Identifier of the entity to remove.
        entity: EntityId,
    },
    /// Displaces an entity, resolving collisions one axis at a time.
    MoveEntity {
        /// Identifier of the entity to move.
        entity: EntityId,
        /// Requested displacement in pixels.
        delta: Vec2,
    },
    /// Routes raw damage through the entity's damage pipeline.
    ApplyDamage {
        /// Entity receiving the damage.
        entity: EntityId,
        /// Raw damage before per-entity scaling.
        amount: f32,
        /// Entity responsible for the damage, if any.
        source: Option<EntityId>,
    },
    /// Fires the attacker's current weapon at the target, damaging every listed hit.
    Attack {
        /// Entity wielding the weapon.
        attacker: EntityId,
        /// Entity the attacker is locked onto.
        target: EntityId,
        /// Entities resolved as hit by the attack.
        hits: Vec<EntityId>,
    },
    /// Cycles the entity's current weapon.
    SwitchWeapon {
        /// Entity whose loadout should change.
        entity: EntityId,
        /// Direction of the cycle.
        step: WeaponStep,
    },
    /// Adds a weapon to the entity's loadout.
    EquipWeapon {
        /// Entity receiving the weapon.
        entity: EntityId,
        /// Weapon to equip.
        weapon: Weapon,
    },
    /// Applies an additive stat upgrade to matching weapons.
    ApplyUpgrade {
        /// Entity whose weapons receive the upgrade.
        entity: EntityId,
        /// Upgrade to apply.
        upgrade: Upgrade,
    },
    /// Sets the multiplier applied to incoming damage.
    SetDamageScale {
        /// Entity whose multiplier changes.
        entity: EntityId,
        /// Multiplier applied before health is reduced.
        scale: f32,
    },
    /// Enters or leaves a transient movement override.
    SetOverride {
        /// Entity whose override changes.
        entity: EntityId,
        /// Override to activate, or `None` to clear.
        state: Option<OverrideState>,
    },
    /// Advances a boss to a later encounter phase.
    SetPhase {
        /// Boss whose phase advances.
        entity: EntityId,
        /// Phase entered; phases never move backwards.
        phase: Phase,
    },
    /// Swaps the appearance variant presented by renderers.
    SetAppearance {
        /// Entity whose appearance changes.
        entity: EntityId,
        /// Renderer-defined appearance variant.
        variant: u8,
    },
    /// Spawns a transient visual effect.
    SpawnEffect {
        /// Kind of effect to present.
        effect: EffectKind,
        /// Pixel position of the effect.
        position: Vec2,
    },
    /// Requests that an externally controlled entity attack during this tick.
    RequestAttack {
        /// Entity requesting the attack.
        attacker: EntityId,
    },
    /// Requests that an externally controlled boss use an ability.
    RequestAbility {
        /// Boss requesting the ability.
        entity: EntityId,
        /// Ability to attempt.
        ability: BossAbility,
        /// Summon pool variant used when the ability summons.
        variant: u8,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the grid was rebuilt.
    GridConfigured {
        /// Number of tile columns in the new grid.
        columns: u32,
        /// Number of tile rows in the new grid.
        rows: u32,
        /// Length of each tile in pixels.
        tile_length: f32,
    },
    /// Confirms that the grid was rescaled.
    GridScaled {
        /// Scale factor that was applied.
        factor: u32,
        /// Number of tile columns after scaling.
        columns: u32,
        /// Number of tile rows after scaling.
        rows: u32,
    },
    /// Confirms that a cell was placed.
    CellPlaced {
        /// Upper-left tile of the placed footprint.
        origin: TileCoord,
        /// Stable name of the placed cell.
        cell: String,
    },
    /// Confirms that a cell footprint was reset to the empty cell.
    CellCleared {
        /// Anchor tile of the removed footprint.
        origin: TileCoord,
        /// Stable name of the removed cell.
        cell: String,
    },
    /// Reports that a cell placement request was rejected.
    CellPlacementRejected {
        /// Origin provided in the placement request.
        origin: TileCoord,
        /// Cell name provided in the placement request.
        cell: String,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Simulation clock after the tick.
        now: Duration,
    },
    /// Confirms that an entity was created.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Kind of entity that was created.
        kind: EntityKind,
        /// Pixel position of the entity's upper-left corner.
        position: Vec2,
    },
    /// Confirms that an entity changed position.
    EntityMoved {
        /// Identifier of the entity that moved.
        entity: EntityId,
        /// Position before the move.
        from: Vec2,
        /// Position after collision resolution.
        to: Vec2,
    },
    /// Reports that an entity's centre entered a tile carrying a trigger tag.
    TriggerEntered {
        /// Entity that entered the trigger.
        entity: EntityId,
        /// Trigger tag carried by the cell.
        trigger: String,
        /// Tile that carries the trigger.
        tile: TileCoord,
    },
    /// Confirms that an entity left the world.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
        /// Kind of the removed entity.
        kind: EntityKind,
        /// Reason the entity was removed.
        cause: RemovalCause,
    },
    /// Reports damage routed through an entity's damage pipeline.
    DamageApplied {
        /// Entity that received the damage.
        entity: EntityId,
        /// Entity responsible for the damage, if any.
        source: Option<EntityId>,
        /// Damage before scaling.
        raw: f32,
        /// Damage subtracted from health after scaling.
        applied: f32,
        /// Health remaining after the damage.
        remaining: f32,
    },
    /// Confirms that an attack was executed.
    AttackResolved {
        /// Entity that attacked.
        attacker: EntityId,
        /// Entity the attack was aimed at.
        target: EntityId,
        /// Weapon used for the attack.
        weapon: WeaponId,
        /// Entities damaged by the attack.
        hits: Vec<EntityId>,
        /// Whether the weapon behavior produced its presentation.
        behavior_succeeded: bool,
    },
    /// Confirms that an entity's current weapon changed.
    WeaponSwitched {
        /// Entity whose loadout changed.
        entity: EntityId,
        /// Index of the new current weapon.
        slot: usize,
        /// Identifier of the new current weapon.
        weapon: WeaponId,
    },
    /// Confirms that an upgrade modified weapons.
    UpgradeApplied {
        /// Entity that received the upgrade.
        entity: EntityId,
        /// Weapons matched by the upgrade.
        weapons: Vec<WeaponId>,
    },
    /// Confirms that an entity's incoming damage multiplier changed.
    DamageScaleChanged {
        /// Entity whose multiplier changed.
        entity: EntityId,
        /// New multiplier.
        scale: f32,
    },
    /// Confirms that an entity entered or left a movement override.
    OverrideChanged {
        /// Entity whose override changed.
        entity: EntityId,
        /// Active override, if any.
        state: Option<OverrideState>,
    },
    /// Confirms that a boss entered a later encounter phase.
    PhaseChanged {
        /// Boss whose phase changed.
        entity: EntityId,
        /// Phase entered.
        phase: Phase,
    },
    /// Confirms that an entity's appearance variant changed.
    AppearanceChanged {
        /// Entity whose appearance changed.
        entity: EntityId,
        /// New appearance variant.
        variant: u8,
    },
    /// Announces a transient visual effect.
    EffectSpawned {
        /// Kind of effect.
        effect: EffectKind,
        /// Pixel position of the effect.
        position: Vec2,
    },
    /// Reports that a command could not be applied.
    CommandRejected {
        /// Specific reason the command failed.
        reason: CommandRejection,
    },
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
///
/// Coordinates are signed so that queries outside the grid can be expressed
/// and answered with sentinel values instead of failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the tile displaced by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(
            self.column.saturating_add(columns),
            self.row.saturating_add(rows),
        )
    }

    /// Computes the Chebyshev distance between two tiles.
    #[must_use]
    pub fn chebyshev_distance(self, other: TileCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Resolves the tile containing the provided pixel position.
    #[must_use]
    pub fn containing(point: Vec2, tile_length: f32) -> Self {
        if !(tile_length > 0.0) {
            return Self::new(0, 0);
        }
        Self::new(
            (point.x / tile_length).floor() as i32,
            (point.y / tile_length).floor() as i32,
        )
    }

    /// Pixel position of the tile's centre.
    #[must_use]
    pub fn center(self, tile_length: f32) -> Vec2 {
        Vec2::new(
            (self.column as f32 + 0.5) * tile_length,
            (self.row as f32 + 0.5) * tile_length,
        )
    }
}

/// Cardinal movement directions available to controlled entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Unit vector in pixel space pointing along the direction.
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Self::North => Vec2::new(0.0, -1.0),
            Self::East => Vec2::new(1.0, 0.0),
            Self::South => Vec2::new(0.0, 1.0),
            Self::West => Vec2::new(-1.0, 0.0),
        }
    }
}

/// Broad category of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The controllable hero.
    Player,
    /// Regular hostile creature driven by flow-field pathing.
    Enemy,
    /// Multi-phase encounter boss.
    Boss,
    /// Short-lived moving entity spawned by weapons and abilities.
    Projectile,
    /// Collectible carrying an upgrade.
    Pickup,
}

impl EntityKind {
    /// Reports whether entities of this kind take part in combat resolution.
    #[must_use]
    pub const fn is_combatant(self) -> bool {
        matches!(self, Self::Player | Self::Enemy | Self::Boss)
    }
}

/// Side an entity fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// The player and anything fighting on its behalf.
    Allies,
    /// Enemies and the boss.
    Hostiles,
}

impl Faction {
    /// Reports whether entities of the two factions may damage each other.
    #[must_use]
    pub fn opposes(self, other: Faction) -> bool {
        self != other
    }
}

/// Source of decisions for an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Rule-based systems decide movement, attacks, and abilities.
    Ai,
    /// Discrete action codes supplied from outside drive the entity.
    External,
}

/// Kinds of transient visual effects announced to presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Melee swing.
    Slash,
    /// Fireball impact.
    Explosion,
    /// Ranged weapon impact.
    ArrowHit,
    /// Ground-smash shockwave.
    Shockwave,
    /// Boss phase transition burst.
    PhaseBurst,
    /// Boss summoning circle.
    SummonPortal,
    /// Boss shield activation.
    ShieldFlash,
    /// Boss gravity pull.
    GravityWell,
}

/// Reasons an entity leaves the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Health reached zero.
    Died,
    /// Lifetime ran out.
    Expired,
    /// Projectile struck a wall or an opposing entity.
    Impact,
    /// Pickup was collected.
    Collected,
    /// Removed on request.
    Despawned,
}

/// Reasons a cell placement request may be rejected by the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The footprint would extend beyond the grid bounds.
    #[error("cell footprint exceeds the grid bounds")]
    OutOfBounds,
    /// The palette contains no cell with the requested name.
    #[error("cell is not present in the palette")]
    UnknownCell,
}

/// Reasons a world command may be rejected without mutating state.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CommandRejection {
    /// No live entity carries the identifier.
    #[error("entity {} does not exist", .0.get())]
    UnknownEntity(EntityId),
    /// A displacement contained NaN or infinite components.
    #[error("entity {} received a non-finite displacement", .0.get())]
    NonFiniteMotion(EntityId),
    /// Damage amounts must be finite and non-negative.
    #[error("entity {} received an invalid damage amount", .0.get())]
    InvalidDamage(EntityId),
    /// The entity holds no weapon.
    #[error("entity {} holds no weapon", .0.get())]
    NoWeapon(EntityId),
    /// The current weapon has not finished cooling down.
    #[error("weapon {weapon} of entity {} is cooling down", entity.get())]
    WeaponCoolingDown {
        /// Entity attempting the attack.
        entity: EntityId,
        /// Weapon that is not ready.
        weapon: WeaponId,
    },
    /// The spawn description contained invalid numbers.
    #[error("spawn description for '{0}' is malformed")]
    MalformedSpawn(String),
    /// Restoring an entity would reuse a live identifier.
    #[error("entity {} already exists", .0.get())]
    DuplicateEntity(EntityId),
}

/// Motion state for projectile entities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpawn {
    /// Entity that fired the projectile.
    pub owner: EntityId,
    /// Displacement per second in pixels.
    pub velocity: Vec2,
    /// Time before the projectile expires.
    pub lifetime: Duration,
    /// Damage dealt to the first opposing entity touched; zero for visual-only projectiles.
    pub contact_damage: f32,
}

/// Full description of an entity to create.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySpawn {
    /// Broad category of the entity.
    pub kind: EntityKind,
    /// Side the entity fights for.
    pub faction: Faction,
    /// Stable configuration key the entity was created from.
    pub type_key: String,
    /// Pixel position of the upper-left corner.
    pub position: Vec2,
    /// Footprint measured in tiles.
    pub size: Vec2,
    /// Starting and maximum health.
    pub health: f32,
    /// Movement speed in pixels per second.
    pub speed: f32,
    /// Decision source.
    pub control: Control,
    /// Weapons carried, first one current.
    pub weapons: Vec<Weapon>,
    /// Multiplier applied to incoming damage.
    pub damage_scale: f32,
    /// Projectile motion, for projectile entities.
    pub projectile: Option<ProjectileSpawn>,
    /// Upgrade granted on collection, for pickup entities.
    pub pickup: Option<Upgrade>,
    /// Upgrade dropped as a pickup when the entity dies.
    pub drop: Option<Upgrade>,
}

impl EntitySpawn {
    /// Creates a one-tile, one-health, stationary description.
    #[must_use]
    pub fn new(kind: EntityKind, faction: Faction, type_key: &str, position: Vec2) -> Self {
        Self {
            kind,
            faction,
            type_key: type_key.to_owned(),
            position,
            size: Vec2::ONE,
            health: 1.0,
            speed: 0.0,
            control: Control::Ai,
            weapons: Vec::new(),
            damage_scale: 1.0,
            projectile: None,
            pickup: None,
            drop: None,
        }
    }

    /// Describes a projectile fired by `owner`.
    #[must_use]
    pub fn projectile(
        type_key: &str,
        faction: Faction,
        position: Vec2,
        size: Vec2,
        motion: ProjectileSpawn,
    ) -> Self {
        Self {
            size,
            projectile: Some(motion),
            ..Self::new(EntityKind::Projectile, faction, type_key, position)
        }
    }

    /// Describes a pickup granting `upgrade` to the allied entity that touches it.
    #[must_use]
    pub fn pickup(position: Vec2, upgrade: Upgrade) -> Self {
        Self {
            size: Vec2::splat(0.5),
            pickup: Some(upgrade),
            ..Self::new(EntityKind::Pickup, Faction::Allies, "pickup", position)
        }
    }

    /// Replaces the footprint measured in tiles.
    #[must_use]
    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    /// Replaces the starting health.
    #[must_use]
    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }

    /// Replaces the movement speed.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Replaces the decision source.
    #[must_use]
    pub fn with_control(mut self, control: Control) -> Self {
        self.control = control;
        self
    }

    /// Appends a weapon to the loadout.
    #[must_use]
    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapons.push(weapon);
        self
    }

    /// Replaces the incoming damage multiplier.
    #[must_use]
    pub fn with_damage_scale(mut self, scale: f32) -> Self {
        self.damage_scale = scale;
        self
    }

    /// Replaces the upgrade dropped on death.
    #[must_use]
    pub fn with_drop(mut self, drop: Option<Upgrade>) -> Self {
        self.drop = drop;
        self
    }

    /// Reports whether every numeric field is usable by the world.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let numbers_finite = self.position.is_finite()
            && self.size.is_finite()
            && self.health.is_finite()
            && self.speed.is_finite()
            && self.damage_scale.is_finite();
        let projectile_finite = self
            .projectile
            .map_or(true, |motion| motion.velocity.is_finite() && motion.contact_damage.is_finite());
        numbers_finite
            && projectile_finite
            && self.size.x > 0.0
            && self.size.y > 0.0
            && self.health > 0.0
            && self.damage_scale >= 0.0
    }
}

/// Persisted state of an entity.
///
/// Records hold pure data only: weapon behaviors are stored by their stable
/// key and rebound on restore, cooldown timestamps and transient overrides are
/// dropped, and projectiles are never recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Identifier assigned when the entity was created.
    pub id: EntityId,
    /// Broad category of the entity.
    pub kind: EntityKind,
    /// Side the entity fights for.
    pub faction: Faction,
    /// Stable configuration key the entity was created from.
    pub type_key: String,
    /// Pixel position of the upper-left corner.
    pub position: Vec2,
    /// Footprint measured in tiles.
    pub size: Vec2,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Movement speed in pixels per second.
    pub speed: f32,
    /// Decision source.
    pub control: Control,
    /// Multiplier applied to incoming damage.
    pub damage_scale: f32,
    /// Renderer-defined appearance variant.
    pub appearance: u8,
    /// Encounter phase reached, meaningful for bosses.
    #[serde(default)]
    pub phase: Phase,
    /// Weapons carried.
    pub weapons: Vec<WeaponRecord>,
    /// Index of the current weapon.
    pub current_weapon: usize,
    /// Upgrade granted on collection, for pickup entities.
    pub pickup: Option<Upgrade>,
    /// Upgrade dropped as a pickup when the entity dies.
    pub drop: Option<Upgrade>,
}

/// Immutable representation of a single entity's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Broad category of the entity.
    pub kind: EntityKind,
    /// Side the entity fights for.
    pub faction: Faction,
    /// Stable configuration key the entity was created from.
    pub type_key: String,
    /// Pixel-space bounding box.
    pub bounds: Aabb,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Movement speed in pixels per second.
    pub speed: f32,
    /// Decision source.
    pub control: Control,
    /// Active movement override, if any.
    pub override_state: Option<OverrideState>,
    /// Current weapon, if any.
    pub weapon: Option<Weapon>,
    /// Multiplier applied to incoming damage.
    pub damage_scale: f32,
    /// Renderer-defined appearance variant.
    pub appearance: u8,
    /// Encounter phase reached, meaningful for bosses.
    pub phase: Phase,
}

impl EntitySnapshot {
    /// Pixel position of the bounding box centre.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    /// Health expressed as a fraction of maximum health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Reports whether the entity still has health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Reports whether the entity is currently dashing.
    #[must_use]
    pub fn is_dashing(&self) -> bool {
        self.override_state == Some(OverrideState::Dashing)
    }
}

/// Read-only snapshot describing all entities within the world.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot carrying the provided identifier.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// First live player entity, if any.
    #[must_use]
    pub fn player(&self) -> Option<&EntitySnapshot> {
        self.iter()
            .find(|snapshot| snapshot.kind == EntityKind::Player && snapshot.is_alive())
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}
