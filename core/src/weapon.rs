//! Weapon data model, behavior dispatch, loadouts, and upgrades.

use std::{collections::BTreeMap, fmt, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{EffectKind, EntityId, EntitySpawn, Faction, ProjectileSpawn};

/// Maximum number of weapons a single entity may carry.
pub const MAX_WEAPONS: usize = 3;

const FIREBALL_SPEED: f32 = 240.0;
const ARROW_SPEED: f32 = 320.0;
const PROJECTILE_SIZE: f32 = 0.25;

/// Stable key identifying a weapon type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponId(String);

impl WeaponId {
    /// Creates a weapon identifier from its key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrowed key of the weapon.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation side effect executed when a weapon fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeaponBehavior {
    /// Close-range swing presented as a slash.
    Melee,
    /// Visual fireball travelling to the target, bursting on arrival.
    Fireball,
    /// Visual arrow travelling to the target.
    Ranged,
    /// Shockwave radiating from the target.
    GroundSmash,
}

impl WeaponBehavior {
    /// Stable key used in configuration tables and persisted records.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Fireball => "fireball",
            Self::Ranged => "ranged",
            Self::GroundSmash => "ground_smash",
        }
    }

    /// Resolves a behavior from its key, falling back to melee for unknown keys.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key {
            "melee" => Self::Melee,
            "fireball" => Self::Fireball,
            "ranged" => Self::Ranged,
            "ground_smash" => Self::GroundSmash,
            unknown => {
                tracing::warn!(behavior = unknown, "unknown_weapon_behavior_falling_back_to_melee");
                Self::Melee
            }
        }
    }

    /// Executes the behavior's presentation for a single attack.
    ///
    /// Never panics; a degenerate geometry (non-finite positions, or a
    /// projectile aimed at its own origin) reports failure instead.
    #[must_use]
    pub fn execute(self, context: &AttackContext) -> BehaviorOutcome {
        if !context.origin.is_finite() || !context.target.is_finite() {
            return BehaviorOutcome::failed();
        }

        match self {
            Self::Melee => BehaviorOutcome::effect(EffectKind::Slash, context.target),
            Self::GroundSmash => BehaviorOutcome::effect(EffectKind::Shockwave, context.target),
            Self::Fireball => context
                .projectile("fireball", FIREBALL_SPEED)
                .map_or_else(BehaviorOutcome::failed, |spawn| BehaviorOutcome {
                    succeeded: true,
                    effects: vec![(EffectKind::Explosion, context.target)],
                    projectiles: vec![spawn],
                }),
            Self::Ranged => context
                .projectile("arrow", ARROW_SPEED)
                .map_or_else(BehaviorOutcome::failed, |spawn| BehaviorOutcome {
                    succeeded: true,
                    effects: vec![(EffectKind::ArrowHit, context.target)],
                    projectiles: vec![spawn],
                }),
        }
    }
}

/// Geometry describing a single attack, handed to weapon behaviors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackContext {
    /// Entity firing the weapon.
    pub attacker: EntityId,
    /// Faction of the attacker.
    pub faction: Faction,
    /// Pixel centre of the attacker.
    pub origin: Vec2,
    /// Pixel centre of the target.
    pub target: Vec2,
}

impl AttackContext {
    fn projectile(&self, type_key: &str, speed: f32) -> Option<EntitySpawn> {
        let offset = self.target - self.origin;
        let distance = offset.length();
        let direction = offset.try_normalize()?;
        let lifetime = Duration::from_secs_f32(distance / speed);
        let motion = ProjectileSpawn {
            owner: self.attacker,
            velocity: direction * speed,
            lifetime,
            contact_damage: 0.0,
        };
        Some(EntitySpawn::projectile(
            type_key,
            self.faction,
            self.origin,
            Vec2::splat(PROJECTILE_SIZE),
            motion,
        ))
    }
}

/// Result of executing a weapon behavior.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BehaviorOutcome {
    /// Whether the presentation could be produced.
    pub succeeded: bool,
    /// Visual effects to announce.
    pub effects: Vec<(EffectKind, Vec2)>,
    /// Projectiles to spawn.
    pub projectiles: Vec<EntitySpawn>,
}

impl BehaviorOutcome {
    fn failed() -> Self {
        Self::default()
    }

    fn effect(kind: EffectKind, position: Vec2) -> Self {
        Self {
            succeeded: true,
            effects: vec![(kind, position)],
            projectiles: Vec::new(),
        }
    }
}

/// Weapon held by a combat-capable entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Weapon {
    id: WeaponId,
    tags: Vec<String>,
    damage: f32,
    range: f32,
    cooldown: Duration,
    is_aoe: bool,
    aoe_radius: f32,
    behavior: WeaponBehavior,
    last_attack: Option<Duration>,
}

impl Weapon {
    /// Creates a single-target weapon that has never fired.
    #[must_use]
    pub fn new(
        id: WeaponId,
        behavior: WeaponBehavior,
        damage: f32,
        range: f32,
        cooldown: Duration,
    ) -> Self {
        Self {
            id,
            tags: Vec::new(),
            damage,
            range,
            cooldown,
            is_aoe: false,
            aoe_radius: 0.0,
            behavior,
            last_attack: None,
        }
    }

    /// Turns the weapon into an area weapon with the provided radius.
    #[must_use]
    pub fn with_aoe(mut self, radius: f32) -> Self {
        self.is_aoe = true;
        self.aoe_radius = radius;
        self
    }

    /// Replaces the tags used to match upgrades.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Stable key of the weapon.
    #[must_use]
    pub fn id(&self) -> &WeaponId {
        &self.id
    }

    /// Tags used to match upgrades.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Damage dealt to every entity hit.
    #[must_use]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Maximum attack distance in pixels.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Minimum time between attacks.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Whether the weapon damages every candidate around the target.
    #[must_use]
    pub fn is_aoe(&self) -> bool {
        self.is_aoe
    }

    /// Radius around the target's centre damaged by area weapons.
    #[must_use]
    pub fn aoe_radius(&self) -> f32 {
        self.aoe_radius
    }

    /// Presentation executed when the weapon fires.
    #[must_use]
    pub fn behavior(&self) -> WeaponBehavior {
        self.behavior
    }

    /// Simulation time of the most recent attack, absent until the first one.
    #[must_use]
    pub fn last_attack(&self) -> Option<Duration> {
        self.last_attack
    }

    /// Reports whether the cooldown has elapsed at `now`.
    #[must_use]
    pub fn is_ready(&self, now: Duration) -> bool {
        match self.last_attack {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.cooldown,
        }
    }

    /// Records an attack at `now` when the cooldown allows it.
    ///
    /// Returns `false` and leaves the timestamp untouched otherwise.
    pub fn try_fire(&mut self, now: Duration) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.last_attack = Some(now);
        true
    }

    /// Adds `delta` to the named stat, returning whether the key was recognised.
    pub fn apply_stat(&mut self, key: &str, delta: f32) -> bool {
        if !delta.is_finite() {
            return false;
        }
        match key {
            "damage" => self.damage = (self.damage + delta).max(0.0),
            "range" => self.range = (self.range + delta).max(0.0),
            "aoe_radius" => self.aoe_radius = (self.aoe_radius + delta).max(0.0),
            "cooldown_ms" => {
                let millis = (self.cooldown.as_millis() as f32 + delta).max(0.0).round();
                self.cooldown = Duration::from_millis(millis as u64);
            }
            _ => return false,
        }
        true
    }

    /// Captures the weapon as pure data, dropping its cooldown timestamp.
    #[must_use]
    pub fn to_record(&self) -> WeaponRecord {
        WeaponRecord {
            id: self.id.clone(),
            tags: self.tags.clone(),
            damage: self.damage,
            range: self.range,
            cooldown: self.cooldown,
            is_aoe: self.is_aoe,
            aoe_radius: self.aoe_radius,
            behavior: self.behavior.key().to_owned(),
        }
    }

    /// Rebuilds a weapon from pure data, rebinding its behavior by key.
    #[must_use]
    pub fn from_record(record: &WeaponRecord) -> Self {
        Self {
            id: record.id.clone(),
            tags: record.tags.clone(),
            damage: record.damage,
            range: record.range,
            cooldown: record.cooldown,
            is_aoe: record.is_aoe,
            aoe_radius: record.aoe_radius,
            behavior: WeaponBehavior::from_key(&record.behavior),
            last_attack: None,
        }
    }
}

/// Persisted weapon state with its behavior stored as a stable key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponRecord {
    /// Stable key of the weapon.
    pub id: WeaponId,
    /// Tags used to match upgrades.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Damage dealt to every entity hit.
    pub damage: f32,
    /// Maximum attack distance in pixels.
    pub range: f32,
    /// Minimum time between attacks.
    #[serde(rename = "cooldown_ms", with = "crate::duration_ms")]
    pub cooldown: Duration,
    /// Whether the weapon damages every candidate around the target.
    #[serde(default)]
    pub is_aoe: bool,
    /// Radius around the target's centre damaged by area weapons.
    #[serde(default)]
    pub aoe_radius: f32,
    /// Behavior key.
    pub behavior: String,
}

/// Direction in which a loadout cycles its current weapon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeaponStep {
    /// Advance to the following slot, wrapping around.
    Next,
    /// Return to the preceding slot, wrapping around.
    Previous,
}

/// Ordered weapons carried by an entity with one current slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Loadout {
    weapons: Vec<Weapon>,
    current: usize,
}

impl Loadout {
    /// Builds a loadout from the provided weapons, keeping at most [`MAX_WEAPONS`].
    #[must_use]
    pub fn new(mut weapons: Vec<Weapon>) -> Self {
        if weapons.len() > MAX_WEAPONS {
            tracing::warn!(
                carried = weapons.len(),
                limit = MAX_WEAPONS,
                "loadout_truncated"
            );
            weapons.truncate(MAX_WEAPONS);
        }
        Self {
            weapons,
            current: 0,
        }
    }

    /// Builds a loadout from persisted records, clamping the current slot.
    #[must_use]
    pub fn from_records(records: &[WeaponRecord], current: usize) -> Self {
        let mut loadout = Self::new(records.iter().map(Weapon::from_record).collect());
        loadout.current = current.min(loadout.weapons.len().saturating_sub(1));
        loadout
    }

    /// Captures every weapon as pure data.
    #[must_use]
    pub fn to_records(&self) -> Vec<WeaponRecord> {
        self.weapons.iter().map(Weapon::to_record).collect()
    }

    /// Index of the current weapon.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Current weapon, if the loadout is not empty.
    #[must_use]
    pub fn current(&self) -> Option<&Weapon> {
        self.weapons.get(self.current)
    }

    /// Mutable access to the current weapon.
    pub fn current_mut(&mut self) -> Option<&mut Weapon> {
        self.weapons.get_mut(self.current)
    }

    /// Iterator over the carried weapons in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.iter()
    }

    /// Number of carried weapons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    /// Reports whether no weapon is carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Adds a weapon and makes it current.
    ///
    /// A full loadout replaces its current weapon instead of growing.
    pub fn equip(&mut self, weapon: Weapon) -> usize {
        if self.weapons.len() < MAX_WEAPONS {
            self.weapons.push(weapon);
            self.current = self.weapons.len() - 1;
        } else {
            self.weapons[self.current] = weapon;
        }
        self.current
    }

    /// Cycles the current weapon, returning it when the loadout is not empty.
    pub fn switch(&mut self, step: WeaponStep) -> Option<&Weapon> {
        let count = self.weapons.len();
        if count == 0 {
            return None;
        }
        self.current = match step {
            WeaponStep::Next => (self.current + 1) % count,
            WeaponStep::Previous => (self.current + count - 1) % count,
        };
        self.weapons.get(self.current)
    }

    /// Applies the upgrade to every matching weapon and returns their ids.
    pub fn apply_upgrade(&mut self, upgrade: &Upgrade) -> Vec<WeaponId> {
        let mut upgraded = Vec::new();
        for weapon in self.weapons.iter_mut().filter(|weapon| upgrade.matches(weapon)) {
            for (stat, delta) in &upgrade.stats {
                if !weapon.apply_stat(stat, *delta) {
                    tracing::debug!(stat = %stat, weapon = %weapon.id, "upgrade_stat_ignored");
                }
            }
            upgraded.push(weapon.id.clone());
        }
        upgraded
    }
}

/// Weapons affected by an upgrade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTarget {
    /// Every carried weapon.
    All,
    /// Weapons with the named id.
    Weapon(String),
    /// Weapons carrying the named tag.
    Tag(String),
}

/// Additive modification of numeric weapon stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    /// Weapons affected by the upgrade.
    pub target: UpgradeTarget,
    /// Stat keys mapped to the delta added to them.
    pub stats: BTreeMap<String, f32>,
}

impl Upgrade {
    /// Creates an upgrade adding a single stat delta.
    #[must_use]
    pub fn single(target: UpgradeTarget, stat: &str, delta: f32) -> Self {
        let mut stats = BTreeMap::new();
        let _ = stats.insert(stat.to_owned(), delta);
        Self { target, stats }
    }

    /// Reports whether the upgrade applies to the weapon.
    #[must_use]
    pub fn matches(&self, weapon: &Weapon) -> bool {
        match &self.target {
            UpgradeTarget::All => true,
            UpgradeTarget::Weapon(id) => weapon.id.as_str() == id,
            UpgradeTarget::Tag(tag) => weapon.tags.iter().any(|candidate| candidate == tag),
        }
    }
}
