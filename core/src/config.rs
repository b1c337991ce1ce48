//! Configuration tables keyed by stable string identifiers.
//!
//! Every table deserializes with defaults for missing fields so partial
//! configuration files remain valid. Durations are expressed in milliseconds.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    BossAbility, Control, EntityKind, EntitySpawn, Faction, Phase, Upgrade, UpgradeTarget,
    Weapon, WeaponBehavior, WeaponId,
};

/// Name of the cell stored at palette index zero.
pub const EMPTY_CELL: &str = "Empty";

/// Complete tuning of an arena session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Grid dimensions.
    pub grid: GridConfig,
    /// Cell palette.
    pub cells: Vec<CellDef>,
    /// Player stats.
    pub player: CombatantStats,
    /// Weapon table keyed by weapon id.
    pub weapons: WeaponTable,
    /// Enemy table keyed by enemy type.
    pub enemies: CombatantTable,
    /// Boss encounter tuning.
    pub boss: BossTuning,
    /// Combat resolution tuning.
    pub combat: CombatTuning,
    /// Enemy chase tuning.
    pub chase: ChaseTuning,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            cells: default_cells(),
            player: CombatantStats::player(),
            weapons: WeaponTable::default(),
            enemies: CombatantTable::default(),
            boss: BossTuning::default(),
            combat: CombatTuning::default(),
            chase: ChaseTuning::default(),
        }
    }
}

/// Grid dimensions measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Side length of a tile in pixels.
    pub tile_length: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 24,
            rows: 18,
            tile_length: 32.0,
        }
    }
}

/// Extent of a cell measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    /// Columns covered.
    pub width: u32,
    /// Rows covered.
    pub height: u32,
}

impl Default for Footprint {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

/// Immutable definition of a placeable cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellDef {
    /// Stable name of the cell.
    pub name: String,
    /// Whether entities may stand on the cell.
    #[serde(default = "walkable_by_default")]
    pub walkable: bool,
    /// Extent of the cell at scale one.
    #[serde(default)]
    pub footprint: Footprint,
    /// Tag reported when an entity's centre enters the cell.
    #[serde(default)]
    pub trigger: Option<String>,
}

fn walkable_by_default() -> bool {
    true
}

impl CellDef {
    /// Creates a one-tile cell without a trigger.
    #[must_use]
    pub fn new(name: &str, walkable: bool) -> Self {
        Self {
            name: name.to_owned(),
            walkable,
            footprint: Footprint::default(),
            trigger: None,
        }
    }

    /// The walkable cell occupying every unset slot.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(EMPTY_CELL, true)
    }

    /// Replaces the footprint.
    #[must_use]
    pub fn with_footprint(mut self, width: u32, height: u32) -> Self {
        self.footprint = Footprint { width, height };
        self
    }

    /// Attaches a trigger tag.
    #[must_use]
    pub fn with_trigger(mut self, trigger: &str) -> Self {
        self.trigger = Some(trigger.to_owned());
        self
    }
}

/// Default cell palette used when no cells are configured.
#[must_use]
pub fn default_cells() -> Vec<CellDef> {
    vec![
        CellDef::empty(),
        CellDef::new("wall", false),
        CellDef::new("pillar", false).with_footprint(2, 2),
        CellDef::new("exit", true).with_trigger("exit"),
    ]
}

/// Tunable numbers of a weapon type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    /// Damage dealt to every entity hit.
    pub damage: f32,
    /// Maximum attack distance in pixels.
    pub range: f32,
    /// Minimum time between attacks.
    #[serde(rename = "cooldown_ms", with = "crate::duration_ms")]
    pub cooldown: Duration,
    /// Whether the weapon damages every candidate around the target.
    pub is_aoe: bool,
    /// Radius around the target damaged by area weapons.
    pub aoe_radius: f32,
    /// Behavior key.
    pub behavior: String,
    /// Tags used to match upgrades.
    pub tags: Vec<String>,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            damage: 5.0,
            range: 40.0,
            cooldown: Duration::from_millis(800),
            is_aoe: false,
            aoe_radius: 0.0,
            behavior: WeaponBehavior::Melee.key().to_owned(),
            tags: Vec::new(),
        }
    }
}

impl WeaponStats {
    fn with(behavior: WeaponBehavior, damage: f32, range: f32, cooldown_ms: u64) -> Self {
        Self {
            damage,
            range,
            cooldown: Duration::from_millis(cooldown_ms),
            behavior: behavior.key().to_owned(),
            ..Self::default()
        }
    }

    fn area(mut self, radius: f32) -> Self {
        self.is_aoe = true;
        self.aoe_radius = radius;
        self
    }

    fn tagged(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_owned());
        self
    }

    /// Builds a fresh weapon carrying these stats.
    #[must_use]
    pub fn to_weapon(&self, id: &str) -> Weapon {
        let weapon = Weapon::new(
            WeaponId::new(id),
            WeaponBehavior::from_key(&self.behavior),
            self.damage,
            self.range,
            self.cooldown,
        )
        .with_tags(self.tags.clone());
        if self.is_aoe {
            weapon.with_aoe(self.aoe_radius)
        } else {
            weapon
        }
    }
}

/// Weapon table keyed by weapon id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponTable(BTreeMap<String, WeaponStats>);

impl Default for WeaponTable {
    fn default() -> Self {
        let entries = [
            ("sword", WeaponStats::with(WeaponBehavior::Melee, 12.0, 48.0, 600).tagged("blade")),
            (
                "fireball",
                WeaponStats::with(WeaponBehavior::Fireball, 20.0, 200.0, 1200)
                    .area(48.0)
                    .tagged("magic"),
            ),
            ("bow", WeaponStats::with(WeaponBehavior::Ranged, 8.0, 256.0, 800).tagged("ranged")),
            ("claw", WeaponStats::with(WeaponBehavior::Melee, 5.0, 40.0, 800)),
            ("spit", WeaponStats::with(WeaponBehavior::Ranged, 4.0, 192.0, 1400)),
            (
                "boss_slam",
                WeaponStats::with(WeaponBehavior::GroundSmash, 25.0, 72.0, 1500).area(64.0),
            ),
        ];
        Self(
            entries
                .into_iter()
                .map(|(key, stats)| (key.to_owned(), stats))
                .collect(),
        )
    }
}

impl WeaponTable {
    /// Creates a table from explicit entries.
    #[must_use]
    pub fn from_entries(entries: BTreeMap<String, WeaponStats>) -> Self {
        Self(entries)
    }

    /// Stats registered under `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&WeaponStats> {
        self.0.get(id)
    }

    /// Builds the weapon registered under `id`.
    ///
    /// Unknown ids are logged and fall back to a default melee weapon
    /// carrying the requested id.
    #[must_use]
    pub fn weapon(&self, id: &str) -> Weapon {
        match self.0.get(id) {
            Some(stats) => stats.to_weapon(id),
            None => {
                tracing::warn!(weapon = id, "unknown_weapon_using_default_melee");
                WeaponStats::default().to_weapon(id)
            }
        }
    }
}

/// Stats shared by the player, enemy types, and the boss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatantStats {
    /// Footprint in tiles.
    pub size: Vec2,
    /// Starting and maximum health.
    pub health: f32,
    /// Movement speed in pixels per second.
    pub speed: f32,
    /// Weapon ids carried, the first one current.
    pub weapons: Vec<String>,
    /// Upgrade dropped as a pickup on death.
    pub drop: Option<Upgrade>,
}

impl Default for CombatantStats {
    fn default() -> Self {
        Self {
            size: Vec2::ONE,
            health: 40.0,
            speed: 70.0,
            weapons: vec!["claw".to_owned()],
            drop: None,
        }
    }
}

impl CombatantStats {
    fn player() -> Self {
        Self {
            size: Vec2::splat(0.8),
            health: 100.0,
            speed: 120.0,
            weapons: vec!["sword".to_owned(), "fireball".to_owned(), "bow".to_owned()],
            drop: None,
        }
    }

    /// Describes an entity carrying these stats.
    #[must_use]
    pub fn describe(
        &self,
        kind: EntityKind,
        faction: Faction,
        type_key: &str,
        position: Vec2,
        weapons: &WeaponTable,
    ) -> EntitySpawn {
        let mut spawn = EntitySpawn::new(kind, faction, type_key, position)
            .with_size(self.size)
            .with_health(self.health)
            .with_speed(self.speed)
            .with_control(Control::Ai)
            .with_drop(self.drop.clone());
        spawn.weapons = self.weapons.iter().map(|id| weapons.weapon(id)).collect();
        spawn
    }
}

/// Enemy table keyed by enemy type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantTable(BTreeMap<String, CombatantStats>);

impl Default for CombatantTable {
    fn default() -> Self {
        let grunt = CombatantStats {
            drop: Some(Upgrade::single(UpgradeTarget::All, "damage", 2.0)),
            ..CombatantStats::default()
        };
        let archer = CombatantStats {
            health: 25.0,
            speed: 60.0,
            weapons: vec!["spit".to_owned()],
            ..CombatantStats::default()
        };
        let minion = CombatantStats {
            size: Vec2::splat(0.6),
            health: 15.0,
            speed: 90.0,
            ..CombatantStats::default()
        };
        Self(
            [("grunt", grunt), ("archer", archer), ("minion", minion)]
                .into_iter()
                .map(|(key, stats)| (key.to_owned(), stats))
                .collect(),
        )
    }
}

impl CombatantTable {
    /// Creates a table from explicit entries.
    #[must_use]
    pub fn from_entries(entries: BTreeMap<String, CombatantStats>) -> Self {
        Self(entries)
    }

    /// Stats registered under `key`, falling back to defaults with a warning.
    #[must_use]
    pub fn resolve(&self, key: &str) -> CombatantStats {
        self.0.get(key).cloned().unwrap_or_else(|| {
            tracing::warn!(enemy = key, "unknown_enemy_type_using_default_stats");
            CombatantStats::default()
        })
    }

    /// Registered enemy types in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Per-ability interval between uses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityIntervals {
    /// Interval of the summon ability.
    #[serde(rename = "summon_ms", with = "crate::duration_ms")]
    pub summon: Duration,
    /// Interval of the dash ability.
    #[serde(rename = "dash_ms", with = "crate::duration_ms")]
    pub dash: Duration,
    /// Interval of the shield ability.
    #[serde(rename = "shield_ms", with = "crate::duration_ms")]
    pub shield: Duration,
    /// Interval of the gravity-pull ability.
    #[serde(rename = "gravity_pull_ms", with = "crate::duration_ms")]
    pub gravity_pull: Duration,
    /// Interval of the bullet-hell ability.
    #[serde(rename = "bullet_hell_ms", with = "crate::duration_ms")]
    pub bullet_hell: Duration,
}

impl Default for AbilityIntervals {
    fn default() -> Self {
        Self {
            summon: Duration::from_secs(8),
            dash: Duration::from_secs(4),
            shield: Duration::from_secs(12),
            gravity_pull: Duration::from_secs(6),
            bullet_hell: Duration::from_secs(5),
        }
    }
}

impl AbilityIntervals {
    /// Interval between two uses of `ability`.
    #[must_use]
    pub fn interval(&self, ability: BossAbility) -> Duration {
        match ability {
            BossAbility::Summon => self.summon,
            BossAbility::Dash => self.dash,
            BossAbility::Shield => self.shield,
            BossAbility::GravityPull => self.gravity_pull,
            BossAbility::BulletHell => self.bullet_hell,
        }
    }
}

/// Ordered ability preferences for each phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasePreferences {
    /// Preferences while in phase one.
    pub one: Vec<BossAbility>,
    /// Preferences while in phase two.
    pub two: Vec<BossAbility>,
    /// Preferences while in phase three.
    pub three: Vec<BossAbility>,
}

impl Default for PhasePreferences {
    fn default() -> Self {
        use BossAbility::{BulletHell, Dash, GravityPull, Shield, Summon};
        Self {
            one: vec![Summon, Dash],
            two: vec![Shield, GravityPull, Dash, Summon],
            three: vec![BulletHell, GravityPull, Dash, Shield, Summon],
        }
    }
}

impl PhasePreferences {
    /// Preference list of `phase`, most preferred first.
    #[must_use]
    pub fn for_phase(&self, phase: Phase) -> &[BossAbility] {
        match phase {
            Phase::One => &self.one,
            Phase::Two => &self.two,
            Phase::Three => &self.three,
        }
    }
}

/// Dash tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashTuning {
    /// Multiplier applied to the boss speed while dashing.
    pub speed_multiplier: f32,
    /// Maximum dash duration.
    #[serde(rename = "duration_ms", with = "crate::duration_ms")]
    pub duration: Duration,
    /// Damage dealt once per dash on contact with the player.
    pub contact_damage: f32,
}

impl Default for DashTuning {
    fn default() -> Self {
        Self {
            speed_multiplier: 3.0,
            duration: Duration::from_millis(800),
            contact_damage: 25.0,
        }
    }
}

/// Shield tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldTuning {
    /// Time the shield stays up.
    #[serde(rename = "duration_ms", with = "crate::duration_ms")]
    pub duration: Duration,
}

impl Default for ShieldTuning {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(3),
        }
    }
}

/// Summon tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonTuning {
    /// Minions spawned per summon.
    pub count: u32,
    /// Radius of the spawn ring around the boss centre, in pixels.
    pub ring_radius: f32,
    /// Enemy types indexed by summon variant.
    pub pools: Vec<String>,
}

impl Default for SummonTuning {
    fn default() -> Self {
        Self {
            count: 3,
            ring_radius: 80.0,
            pools: vec!["minion".to_owned(), "archer".to_owned()],
        }
    }
}

impl SummonTuning {
    /// Enemy type of the summon variant, wrapping around the pool list.
    #[must_use]
    pub fn pool(&self, variant: u8) -> Option<&str> {
        if self.pools.is_empty() {
            return None;
        }
        self.pools
            .get(usize::from(variant) % self.pools.len())
            .map(String::as_str)
    }
}

/// Gravity-pull tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityTuning {
    /// Maximum distance between centres at which the pull applies.
    pub radius: f32,
    /// Pixels the player is displaced toward the boss.
    pub strength: f32,
}

impl Default for GravityTuning {
    fn default() -> Self {
        Self {
            radius: 240.0,
            strength: 48.0,
        }
    }
}

/// Bullet-hell tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletHellTuning {
    /// Projectiles per volley, evenly spaced around the boss.
    pub bullets: u32,
    /// Projectile speed in pixels per second.
    pub speed: f32,
    /// Contact damage of each projectile.
    pub damage: f32,
    /// Projectile lifetime.
    #[serde(rename = "lifetime_ms", with = "crate::duration_ms")]
    pub lifetime: Duration,
}

impl Default for BulletHellTuning {
    fn default() -> Self {
        Self {
            bullets: 16,
            speed: 160.0,
            damage: 10.0,
            lifetime: Duration::from_secs(3),
        }
    }
}

/// Boss encounter tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Boss stats.
    pub stats: CombatantStats,
    /// Health fraction below which phase two starts.
    pub phase_two_threshold: f32,
    /// Health fraction below which phase three starts.
    pub phase_three_threshold: f32,
    /// Incoming damage multiplier per phase.
    pub damage_scales: [f32; 3],
    /// Appearance variant per phase.
    pub appearances: [u8; 3],
    /// Distance between centres at which normal approach stops.
    pub engage_distance: f32,
    /// Interval between uses of each ability.
    pub intervals: AbilityIntervals,
    /// Ordered ability preferences per phase.
    pub preferences: PhasePreferences,
    /// Dash tuning.
    pub dash: DashTuning,
    /// Shield tuning.
    pub shield: ShieldTuning,
    /// Summon tuning.
    pub summon: SummonTuning,
    /// Gravity-pull tuning.
    pub gravity: GravityTuning,
    /// Bullet-hell tuning.
    pub bullet_hell: BulletHellTuning,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            stats: CombatantStats {
                size: Vec2::splat(2.0),
                health: 4000.0,
                speed: 80.0,
                weapons: vec!["boss_slam".to_owned()],
                drop: None,
            },
            phase_two_threshold: 0.66,
            phase_three_threshold: 0.33,
            damage_scales: [0.65, 1.0, 1.20],
            appearances: [0, 1, 2],
            engage_distance: 56.0,
            intervals: AbilityIntervals::default(),
            preferences: PhasePreferences::default(),
            dash: DashTuning::default(),
            shield: ShieldTuning::default(),
            summon: SummonTuning::default(),
            gravity: GravityTuning::default(),
            bullet_hell: BulletHellTuning::default(),
        }
    }
}

impl BossTuning {
    /// Incoming damage multiplier of `phase`.
    #[must_use]
    pub fn damage_scale(&self, phase: Phase) -> f32 {
        self.damage_scales[usize::from(phase.number() - 1)]
    }

    /// Appearance variant of `phase`.
    #[must_use]
    pub fn appearance(&self, phase: Phase) -> u8 {
        self.appearances[usize::from(phase.number() - 1)]
    }

    /// Health fraction below which `phase` starts; phase one has none.
    #[must_use]
    pub fn threshold(&self, phase: Phase) -> Option<f32> {
        match phase {
            Phase::One => None,
            Phase::Two => Some(self.phase_two_threshold),
            Phase::Three => Some(self.phase_three_threshold),
        }
    }
}

/// Combat resolution tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Interval between target rescans of a locked entity.
    #[serde(rename = "rescan_interval_ms", with = "crate::duration_ms")]
    pub rescan_interval: Duration,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            rescan_interval: Duration::from_millis(500),
        }
    }
}

/// Enemy chase tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseTuning {
    /// Optional cap on the flow-field search cost.
    pub max_field_distance: Option<f32>,
    /// Fraction of weapon range at which an enemy with line of sight stops.
    pub stop_range_ratio: f32,
}

impl Default for ChaseTuning {
    fn default() -> Self {
        Self {
            max_field_distance: None,
            stop_range_ratio: 0.9,
        }
    }
}

impl ArenaConfig {
    /// Cell palette, substituting the default palette when none is configured.
    #[must_use]
    pub fn palette(&self) -> Vec<CellDef> {
        if self.cells.is_empty() {
            default_cells()
        } else {
            self.cells.clone()
        }
    }

    /// Describes the player at `position`.
    #[must_use]
    pub fn player_spawn(&self, position: Vec2) -> EntitySpawn {
        self.player
            .describe(EntityKind::Player, Faction::Allies, "player", position, &self.weapons)
    }

    /// Describes an enemy of `type_key` at `position`.
    #[must_use]
    pub fn enemy_spawn(&self, type_key: &str, position: Vec2) -> EntitySpawn {
        self.enemies.resolve(type_key).describe(
            EntityKind::Enemy,
            Faction::Hostiles,
            type_key,
            position,
            &self.weapons,
        )
    }

    /// Describes the boss at `position`, entering phase one's damage scale.
    #[must_use]
    pub fn boss_spawn(&self, position: Vec2) -> EntitySpawn {
        self.boss
            .stats
            .describe(EntityKind::Boss, Faction::Hostiles, "boss", position, &self.weapons)
            .with_damage_scale(self.boss.damage_scale(Phase::One))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_weapon_falls_back_to_melee_with_requested_id() {
        let table = WeaponTable::default();
        let weapon = table.weapon("trident");
        assert_eq!(weapon.id().as_str(), "trident");
        assert_eq!(weapon.behavior(), WeaponBehavior::Melee);
        assert_eq!(weapon.damage(), WeaponStats::default().damage);
    }

    #[test]
    fn configured_weapons_keep_area_and_tags() {
        let weapon = WeaponTable::default().weapon("fireball");
        assert!(weapon.is_aoe());
        assert_eq!(weapon.aoe_radius(), 48.0);
        assert_eq!(weapon.tags(), ["magic".to_owned()]);
    }

    #[test]
    fn unknown_enemy_uses_default_stats() {
        let table = CombatantTable::default();
        assert_eq!(table.resolve("dragon"), CombatantStats::default());
        assert_eq!(table.resolve("minion").health, 15.0);
    }

    #[test]
    fn boss_spawn_starts_in_phase_one_scale() {
        let config = ArenaConfig::default();
        let spawn = config.boss_spawn(Vec2::new(320.0, 96.0));
        assert_eq!(spawn.kind, EntityKind::Boss);
        assert_eq!(spawn.damage_scale, 0.65);
        assert_eq!(spawn.health, 4000.0);
        assert_eq!(spawn.weapons.len(), 1);
    }

    #[test]
    fn phase_tables_follow_phase_order() {
        let tuning = BossTuning::default();
        assert_eq!(tuning.damage_scale(Phase::Three), 1.20);
        assert_eq!(tuning.threshold(Phase::One), None);
        assert_eq!(
            tuning.preferences.for_phase(Phase::One),
            [BossAbility::Summon, BossAbility::Dash]
        );
        assert_eq!(tuning.intervals.interval(BossAbility::Dash), Duration::from_secs(4));
    }

    #[test]
    fn summon_variants_wrap_around_pools() {
        let summon = SummonTuning::default();
        assert_eq!(summon.pool(0), Some("minion"));
        assert_eq!(summon.pool(3), Some("archer"));
        let empty = SummonTuning {
            pools: Vec::new(),
            ..SummonTuning::default()
        };
        assert_eq!(empty.pool(0), None);
    }

    #[test]
    fn empty_cell_list_yields_default_palette() {
        let config = ArenaConfig::default();
        let palette = config.palette();
        assert_eq!(palette[0].name, EMPTY_CELL);
        assert!(palette.iter().any(|cell| cell.trigger.as_deref() == Some("exit")));
    }
}
