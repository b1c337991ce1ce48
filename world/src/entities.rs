use std::{collections::BTreeMap, time::Duration};

use tile_arena_core::{
    Aabb, CommandRejection, Control, EntityId, EntityKind, EntityRecord, EntitySnapshot,
    EntitySpawn, Faction, Loadout, OverrideState, Phase, TileCoord, Upgrade, Vec2,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ProjectileState {
    pub(crate) owner: EntityId,
    pub(crate) velocity: Vec2,
    pub(crate) remaining: Duration,
    pub(crate) contact_damage: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct EntityState {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) faction: Faction,
    pub(crate) type_key: String,
    pub(crate) position: Vec2,
    pub(crate) size: Vec2,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) speed: f32,
    pub(crate) control: Control,
    pub(crate) loadout: Loadout,
    pub(crate) damage_scale: f32,
    pub(crate) override_state: Option<OverrideState>,
    pub(crate) appearance: u8,
    pub(crate) phase: Phase,
    pub(crate) projectile: Option<ProjectileState>,
    pub(crate) pickup: Option<Upgrade>,
    pub(crate) drop: Option<Upgrade>,
    pub(crate) last_tile: Option<TileCoord>,
}

impl EntityState {
    fn from_spawn(id: EntityId, spawn: EntitySpawn) -> Self {
        Self {
            id,
            kind: spawn.kind,
            faction: spawn.faction,
            type_key: spawn.type_key,
            position: spawn.position,
            size: spawn.size,
            health: spawn.health,
            max_health: spawn.health,
            speed: spawn.speed,
            control: spawn.control,
            loadout: Loadout::new(spawn.weapons),
            damage_scale: spawn.damage_scale,
            override_state: None,
            appearance: 0,
            phase: Phase::One,
            projectile: spawn.projectile.map(|motion| ProjectileState {
                owner: motion.owner,
                velocity: motion.velocity,
                remaining: motion.lifetime,
                contact_damage: motion.contact_damage,
            }),
            pickup: spawn.pickup,
            drop: spawn.drop,
            last_tile: None,
        }
    }

    pub(crate) fn from_record(record: EntityRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            faction: record.faction,
            loadout: Loadout::from_records(&record.weapons, record.current_weapon),
            type_key: record.type_key,
            position: record.position,
            size: record.size,
            health: record.health,
            max_health: record.max_health,
            speed: record.speed,
            control: record.control,
            damage_scale: record.damage_scale,
            override_state: None,
            appearance: record.appearance,
            phase: record.phase,
            projectile: None,
            pickup: record.pickup,
            drop: record.drop,
            last_tile: None,
        }
    }

    pub(crate) fn to_record(&self) -> EntityRecord {
        EntityRecord {
            id: self.id,
            kind: self.kind,
            faction: self.faction,
            type_key: self.type_key.clone(),
            position: self.position,
            size: self.size,
            health: self.health,
            max_health: self.max_health,
            speed: self.speed,
            control: self.control,
            damage_scale: self.damage_scale,
            appearance: self.appearance,
            phase: self.phase,
            weapons: self.loadout.to_records(),
            current_weapon: self.loadout.current_index(),
            pickup: self.pickup.clone(),
            drop: self.drop.clone(),
        }
    }

    pub(crate) fn bounds(&self, tile_length: f32) -> Aabb {
        Aabb::new(self.position, self.size * tile_length)
    }

    pub(crate) fn center_tile(&self, tile_length: f32) -> TileCoord {
        TileCoord::containing(self.bounds(tile_length).center(), tile_length)
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        let motion_finite = self.projectile.map_or(true, |motion| {
            motion.velocity.is_finite() && motion.contact_damage.is_finite()
        });
        self.position.is_finite() && self.health.is_finite() && motion_finite
    }

    pub(crate) fn snapshot(&self, tile_length: f32) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            kind: self.kind,
            faction: self.faction,
            type_key: self.type_key.clone(),
            bounds: self.bounds(tile_length),
            health: self.health,
            max_health: self.max_health,
            speed: self.speed,
            control: self.control,
            override_state: self.override_state,
            weapon: self.loadout.current().cloned(),
            damage_scale: self.damage_scale,
            appearance: self.appearance,
            phase: self.phase,
        }
    }
}

/// Entities keyed by identifier, iterated in identifier order.
#[derive(Debug, Default)]
pub(crate) struct EntityStore {
    entities: BTreeMap<EntityId, EntityState>,
    next_id: u32,
}

impl EntityStore {
    pub(crate) fn spawn(&mut self, spawn: EntitySpawn) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let _ = self.entities.insert(id, EntityState::from_spawn(id, spawn));
        id
    }

    pub(crate) fn restore(&mut self, state: EntityState) -> Result<EntityId, CommandRejection> {
        let id = state.id;
        if self.entities.contains_key(&id) {
            return Err(CommandRejection::DuplicateEntity(id));
        }
        self.next_id = self.next_id.max(id.get().saturating_add(1));
        let _ = self.entities.insert(id, state);
        Ok(id)
    }

    pub(crate) fn clear(&mut self) {
        self.entities.clear();
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&EntityState> {
        self.entities.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityState> {
        self.entities.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<EntityState> {
        self.entities.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &EntityState> {
        self.entities.values()
    }

    pub(crate) fn ids_of(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| entity.kind == kind)
            .map(|entity| entity.id)
            .collect()
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }
}
