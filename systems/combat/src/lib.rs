#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that locks targets and proposes cooldown-gated attacks.

use std::{collections::BTreeMap, time::Duration};

use tile_arena_core::{
    config::CombatTuning, Command, Control, EntityId, EntitySnapshot, EntityView, Event,
    TileCoord, Weapon,
};

/// Combat resolution system that keeps a throttled target lock per attacker.
#[derive(Debug)]
pub struct Combat {
    rescan_interval: Duration,
    locks: BTreeMap<EntityId, TargetLock>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TargetLock {
    target: EntityId,
    scanned_at: Duration,
}

impl Combat {
    /// Creates a combat system with the provided tuning.
    #[must_use]
    pub fn new(tuning: CombatTuning) -> Self {
        Self {
            rescan_interval: tuning.rescan_interval,
            locks: BTreeMap::new(),
        }
    }

    /// Target currently locked by the attacker, if any.
    #[must_use]
    pub fn lock(&self, attacker: EntityId) -> Option<EntityId> {
        self.locks.get(&attacker).map(|lock| lock.target)
    }

    /// Consumes world events and entity snapshots to emit attack commands.
    ///
    /// Externally controlled attackers only attack when listed in
    /// `attack_requests`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle<L>(
        &mut self,
        events: &[Event],
        now: Duration,
        entities: &EntityView,
        tile_length: f32,
        attack_requests: &[EntityId],
        has_line_of_sight: L,
        out: &mut Vec<Command>,
    ) where
        L: Fn(TileCoord, TileCoord) -> bool,
    {
        for event in events {
            if let Event::EntityRemoved { entity, .. } = event {
                let _ = self.locks.remove(entity);
            }
        }

        for attacker in entities.iter() {
            if !attacker.kind.is_combatant() || !attacker.is_alive() || attacker.is_dashing() {
                continue;
            }
            if attacker.control == Control::External && !attack_requests.contains(&attacker.id) {
                continue;
            }
            let Some(weapon) = attacker.weapon.as_ref() else {
                continue;
            };

            let Some(target) = self.acquire(attacker, now, entities) else {
                continue;
            };
            if attacker.center().distance(target.center()) > weapon.range() {
                continue;
            }
            let from = TileCoord::containing(attacker.center(), tile_length);
            let to = TileCoord::containing(target.center(), tile_length);
            if !has_line_of_sight(from, to) {
                continue;
            }
            if !weapon.is_ready(now) {
                continue;
            }

            out.push(Command::Attack {
                attacker: attacker.id,
                target: target.id,
                hits: resolve_hits(weapon, attacker, target, entities),
            });
        }
    }

    fn acquire<'a>(
        &mut self,
        attacker: &EntitySnapshot,
        now: Duration,
        entities: &'a EntityView,
    ) -> Option<&'a EntitySnapshot> {
        if let Some(lock) = self.locks.get(&attacker.id) {
            let fresh = now.saturating_sub(lock.scanned_at) < self.rescan_interval;
            let live = entities
                .get(lock.target)
                .filter(|target| is_candidate(attacker, target));
            if let (true, Some(target)) = (fresh, live) {
                return Some(target);
            }
        }

        let nearest = nearest_candidate(attacker, entities);
        match nearest {
            Some(target) => {
                let _ = self.locks.insert(
                    attacker.id,
                    TargetLock {
                        target: target.id,
                        scanned_at: now,
                    },
                );
            }
            None => {
                let _ = self.locks.remove(&attacker.id);
            }
        }
        nearest
    }
}

impl Default for Combat {
    fn default() -> Self {
        Self::new(CombatTuning::default())
    }
}

/// Entities damaged when `weapon` fires at `target`.
///
/// Single-target weapons hit exactly the target. Area weapons hit every live
/// opposing combatant whose centre lies within the weapon's radius of the
/// target's centre.
#[must_use]
pub fn resolve_hits(
    weapon: &Weapon,
    attacker: &EntitySnapshot,
    target: &EntitySnapshot,
    entities: &EntityView,
) -> Vec<EntityId> {
    if !weapon.is_aoe() {
        return vec![target.id];
    }
    let center = target.center();
    entities
        .iter()
        .filter(|candidate| is_candidate(attacker, candidate))
        .filter(|candidate| candidate.center().distance(center) <= weapon.aoe_radius())
        .map(|candidate| candidate.id)
        .collect()
}

fn is_candidate(attacker: &EntitySnapshot, candidate: &EntitySnapshot) -> bool {
    candidate.kind.is_combatant()
        && candidate.is_alive()
        && candidate.faction.opposes(attacker.faction)
}

fn nearest_candidate<'a>(
    attacker: &EntitySnapshot,
    entities: &'a EntityView,
) -> Option<&'a EntitySnapshot> {
    let origin = attacker.center();
    let mut best: Option<(f32, &EntitySnapshot)> = None;
    for candidate in entities.iter().filter(|candidate| is_candidate(attacker, candidate)) {
        let distance = origin.distance_squared(candidate.center());
        let precedes = match best {
            None => true,
            Some((closest, current)) => {
                distance < closest || (distance == closest && candidate.id < current.id)
            }
        };
        if precedes {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_arena_core::{Aabb, EntityKind, Faction, Phase, Vec2, WeaponBehavior, WeaponId};

    fn snapshot(id: u32, faction: Faction, min: Vec2) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(id),
            kind: if faction == Faction::Allies {
                EntityKind::Player
            } else {
                EntityKind::Enemy
            },
            faction,
            type_key: "test".to_owned(),
            bounds: Aabb::new(min, Vec2::splat(32.0)),
            health: 10.0,
            max_health: 10.0,
            speed: 0.0,
            control: Control::Ai,
            override_state: None,
            weapon: None,
            damage_scale: 1.0,
            appearance: 0,
            phase: Phase::One,
        }
    }

    fn hammer(radius: f32) -> Weapon {
        Weapon::new(
            WeaponId::new("hammer"),
            WeaponBehavior::GroundSmash,
            10.0,
            64.0,
            Duration::from_millis(1000),
        )
        .with_aoe(radius)
    }

    #[test]
    fn area_hits_include_exactly_the_candidates_within_radius() {
        let attacker = snapshot(0, Faction::Allies, Vec2::ZERO);
        let target = snapshot(1, Faction::Hostiles, Vec2::new(64.0, 0.0));
        let view = EntityView::from_snapshots(vec![
            attacker.clone(),
            target.clone(),
            snapshot(2, Faction::Hostiles, Vec2::new(64.0, 40.0)),
            snapshot(3, Faction::Hostiles, Vec2::new(64.0, 40.5)),
            snapshot(4, Faction::Allies, Vec2::new(70.0, 0.0)),
        ]);

        let hits = resolve_hits(&hammer(40.0), &attacker, &target, &view);
        assert_eq!(hits, vec![EntityId::new(1), EntityId::new(2)]);

        let single = Weapon::new(
            WeaponId::new("sword"),
            WeaponBehavior::Melee,
            10.0,
            64.0,
            Duration::from_millis(1000),
        );
        assert_eq!(
            resolve_hits(&single, &attacker, &target, &view),
            vec![EntityId::new(1)]
        );
    }

    #[test]
    fn nearest_candidate_breaks_ties_by_identifier() {
        let attacker = snapshot(0, Faction::Allies, Vec2::new(64.0, 64.0));
        let view = EntityView::from_snapshots(vec![
            attacker.clone(),
            snapshot(7, Faction::Hostiles, Vec2::new(0.0, 64.0)),
            snapshot(5, Faction::Hostiles, Vec2::new(128.0, 64.0)),
            snapshot(9, Faction::Hostiles, Vec2::new(64.0, 256.0)),
        ]);

        let nearest = nearest_candidate(&attacker, &view).map(|target| target.id);
        assert_eq!(nearest, Some(EntityId::new(5)));
    }

    #[test]
    fn locks_are_kept_until_the_rescan_interval_elapses() {
        let mut attacker = snapshot(0, Faction::Allies, Vec2::ZERO);
        attacker.weapon = Some(hammer(0.0));
        let far = snapshot(1, Faction::Hostiles, Vec2::new(96.0, 0.0));
        let near = snapshot(2, Faction::Hostiles, Vec2::new(40.0, 0.0));

        let mut combat = Combat::default();
        let mut out = Vec::new();
        let first = EntityView::from_snapshots(vec![attacker.clone(), far.clone()]);
        combat.handle(&[], Duration::ZERO, &first, 32.0, &[], |_, _| true, &mut out);
        assert_eq!(combat.lock(attacker.id), Some(far.id));

        let crowded = EntityView::from_snapshots(vec![attacker.clone(), far, near.clone()]);
        combat.handle(
            &[],
            Duration::from_millis(499),
            &crowded,
            32.0,
            &[],
            |_, _| true,
            &mut out,
        );
        assert_eq!(combat.lock(attacker.id), Some(EntityId::new(1)));

        combat.handle(
            &[],
            Duration::from_millis(500),
            &crowded,
            32.0,
            &[],
            |_, _| true,
            &mut out,
        );
        assert_eq!(combat.lock(attacker.id), Some(near.id));
    }

    #[test]
    fn external_attackers_wait_for_requests() {
        let mut attacker = snapshot(0, Faction::Allies, Vec2::ZERO);
        attacker.control = Control::External;
        attacker.weapon = Some(hammer(0.0));
        let target = snapshot(1, Faction::Hostiles, Vec2::new(32.0, 0.0));
        let view = EntityView::from_snapshots(vec![attacker.clone(), target]);

        let mut combat = Combat::default();
        let mut out = Vec::new();
        combat.handle(&[], Duration::ZERO, &view, 32.0, &[], |_, _| true, &mut out);
        assert!(out.is_empty());

        combat.handle(
            &[],
            Duration::ZERO,
            &view,
            32.0,
            &[attacker.id],
            |_, _| true,
            &mut out,
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn blocked_sight_prevents_attacks() {
        let mut attacker = snapshot(0, Faction::Allies, Vec2::ZERO);
        attacker.weapon = Some(hammer(0.0));
        let view = EntityView::from_snapshots(vec![
            attacker,
            snapshot(1, Faction::Hostiles, Vec2::new(32.0, 0.0)),
        ]);

        let mut combat = Combat::default();
        let mut out = Vec::new();
        combat.handle(&[], Duration::ZERO, &view, 32.0, &[], |_, _| false, &mut out);
        assert!(out.is_empty());
        assert_eq!(combat.lock(EntityId::new(0)), Some(EntityId::new(1)));
    }
}
