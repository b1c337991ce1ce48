#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Translates held discrete actions into commands for externally controlled entities.

use std::{collections::BTreeMap, time::Duration};

use tile_arena_core::{
    Action, BossAbility, Command, Control, EntityId, EntityKind, EntitySnapshot, EntityView,
    Event, Vec2, WeaponStep,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Held {
    action: Action,
    fresh: bool,
}

/// Holds the latest action of each externally controlled entity.
///
/// Movement, attacks, and boss abilities repeat every tick until the action is
/// replaced. Weapon switches fire once per [`Controller::set_action`].
#[derive(Debug, Default)]
pub struct Controller {
    held: BTreeMap<EntityId, Held>,
}

impl Controller {
    /// Creates a controller with no held actions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the action held by `entity`.
    ///
    /// Unknown codes are logged and held as [`Action::Idle`]; the return value
    /// reports whether the code was recognised.
    pub fn set_action(&mut self, entity: EntityId, code: u8) -> bool {
        let decoded = Action::from_code(code);
        if decoded.is_none() {
            tracing::warn!(entity = entity.get(), code, "unknown_action_code");
        }
        let _ = self.held.insert(
            entity,
            Held {
                action: decoded.unwrap_or_default(),
                fresh: true,
            },
        );
        decoded.is_some()
    }

    /// Action currently held by `entity`.
    ///
    /// Entities missing from the view passed to [`Controller::handle`] lose
    /// their held action.
    #[must_use]
    pub fn action(&self, entity: EntityId) -> Action {
        self.held
            .get(&entity)
            .map_or(Action::Idle, |held| held.action)
    }

    /// Emits the commands implied by every held action.
    pub fn handle(&mut self, events: &[Event], entities: &EntityView, out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt, .. } => elapsed = elapsed.saturating_add(*dt),
                Event::EntityRemoved { entity, .. } => {
                    let _ = self.held.remove(entity);
                }
                _ => {}
            }
        }

        self.held.retain(|entity, _| entities.get(*entity).is_some());
        for (entity, held) in &mut self.held {
            let fresh = std::mem::replace(&mut held.fresh, false);
            let Some(snapshot) = entities.get(*entity) else {
                continue;
            };
            if snapshot.control != Control::External || !snapshot.is_alive() {
                continue;
            }
            translate(snapshot, held.action, fresh, elapsed, out);
        }
    }
}

fn translate(
    snapshot: &EntitySnapshot,
    action: Action,
    fresh: bool,
    elapsed: Duration,
    out: &mut Vec<Command>,
) {
    let entity = snapshot.id;
    match (snapshot.kind, action) {
        (_, Action::Idle) => {}
        (EntityKind::Player | EntityKind::Enemy | EntityKind::Boss, Action::Move(direction)) => {
            if snapshot.override_state.is_some() {
                return;
            }
            let delta = direction.unit() * snapshot.speed * elapsed.as_secs_f32();
            if delta != Vec2::ZERO {
                out.push(Command::MoveEntity { entity, delta });
            }
        }
        (EntityKind::Player | EntityKind::Enemy | EntityKind::Boss, Action::Attack) => {
            out.push(Command::RequestAttack { attacker: entity });
        }
        (EntityKind::Player, Action::AbilityOne) if fresh => {
            out.push(Command::SwitchWeapon {
                entity,
                step: WeaponStep::Next,
            });
        }
        (EntityKind::Player, Action::AbilityTwo) if fresh => {
            out.push(Command::SwitchWeapon {
                entity,
                step: WeaponStep::Previous,
            });
        }
        (EntityKind::Boss, Action::AbilityOne) => out.push(Command::RequestAbility {
            entity,
            ability: BossAbility::Dash,
            variant: 0,
        }),
        (EntityKind::Boss, Action::AbilityTwo) => out.push(Command::RequestAbility {
            entity,
            ability: BossAbility::Shield,
            variant: 0,
        }),
        (EntityKind::Boss, Action::Summon(variant)) => out.push(Command::RequestAbility {
            entity,
            ability: BossAbility::Summon,
            variant,
        }),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_arena_core::{Aabb, Direction, Faction, OverrideState, Phase};

    fn snapshot(id: u32, kind: EntityKind, control: Control) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(id),
            kind,
            faction: Faction::Allies,
            type_key: "test".to_owned(),
            bounds: Aabb::new(Vec2::ZERO, Vec2::splat(32.0)),
            health: 10.0,
            max_health: 10.0,
            speed: 120.0,
            control,
            override_state: None,
            weapon: None,
            damage_scale: 1.0,
            appearance: 0,
            phase: Phase::One,
        }
    }

    fn tick(millis: u64) -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
            now: Duration::from_millis(millis),
        }]
    }

    #[test]
    fn held_movement_repeats_every_tick() {
        let view =
            EntityView::from_snapshots(vec![snapshot(0, EntityKind::Player, Control::External)]);
        let mut controller = Controller::new();
        assert!(controller.set_action(EntityId::new(0), 1));

        let mut out = Vec::new();
        controller.handle(&tick(500), &view, &mut out);
        controller.handle(&tick(500), &view, &mut out);
        let expected = Command::MoveEntity {
            entity: EntityId::new(0),
            delta: Vec2::new(0.0, -60.0),
        };
        assert_eq!(out, vec![expected.clone(), expected]);
    }

    #[test]
    fn unknown_codes_are_held_as_idle() {
        let mut controller = Controller::new();
        assert!(controller.set_action(EntityId::new(0), 4));
        assert!(!controller.set_action(EntityId::new(0), 42));
        assert_eq!(controller.action(EntityId::new(0)), Action::Idle);
    }

    #[test]
    fn actions_for_missing_entities_are_dropped() {
        let view =
            EntityView::from_snapshots(vec![snapshot(0, EntityKind::Player, Control::External)]);
        let mut controller = Controller::new();
        assert!(controller.set_action(EntityId::new(0), 2));
        assert!(controller.set_action(EntityId::new(7), 2));

        let mut out = Vec::new();
        controller.handle(&tick(100), &view, &mut out);
        assert_eq!(controller.action(EntityId::new(0)), Action::Move(Direction::South));
        assert_eq!(controller.action(EntityId::new(7)), Action::Idle);
        assert_eq!(controller.held.len(), 1);
    }

    #[test]
    fn weapon_switches_fire_once_per_request() {
        let view =
            EntityView::from_snapshots(vec![snapshot(0, EntityKind::Player, Control::External)]);
        let mut controller = Controller::new();
        let _ = controller.set_action(EntityId::new(0), 7);

        let mut out = Vec::new();
        controller.handle(&tick(16), &view, &mut out);
        controller.handle(&tick(16), &view, &mut out);
        assert_eq!(
            out,
            vec![Command::SwitchWeapon {
                entity: EntityId::new(0),
                step: WeaponStep::Previous,
            }]
        );
    }

    #[test]
    fn boss_codes_map_to_ability_requests() {
        let view =
            EntityView::from_snapshots(vec![snapshot(2, EntityKind::Boss, Control::External)]);
        let mut controller = Controller::new();
        let mut out = Vec::new();
        for code in [6, 7, 9] {
            let _ = controller.set_action(EntityId::new(2), code);
            controller.handle(&tick(16), &view, &mut out);
        }
        let abilities: Vec<(BossAbility, u8)> = out
            .iter()
            .filter_map(|command| match command {
                Command::RequestAbility {
                    ability, variant, ..
                } => Some((*ability, *variant)),
                _ => None,
            })
            .collect();
        assert_eq!(
            abilities,
            vec![
                (BossAbility::Dash, 0),
                (BossAbility::Shield, 0),
                (BossAbility::Summon, 1),
            ]
        );
    }

    #[test]
    fn enemies_ignore_abilities_and_ai_entities_ignore_actions() {
        let view = EntityView::from_snapshots(vec![
            snapshot(0, EntityKind::Enemy, Control::External),
            snapshot(1, EntityKind::Player, Control::Ai),
        ]);
        let mut controller = Controller::new();
        let _ = controller.set_action(EntityId::new(0), 6);
        let _ = controller.set_action(EntityId::new(1), 5);

        let mut out = Vec::new();
        controller.handle(&tick(16), &view, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn overrides_suppress_held_movement() {
        let mut boss = snapshot(2, EntityKind::Boss, Control::External);
        boss.override_state = Some(OverrideState::Dashing);
        let view = EntityView::from_snapshots(vec![boss]);
        let mut controller = Controller::new();
        let _ = controller.set_action(EntityId::new(2), 4);

        let mut out = Vec::new();
        controller.handle(&tick(100), &view, &mut out);
        assert!(out.is_empty());
    }
}
