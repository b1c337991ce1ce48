#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boss encounter director: phases, overrides, and ability selection.

use std::{collections::BTreeMap, f32::consts::TAU, time::Duration};

use tile_arena_core::{
    config::ArenaConfig, BossAbility, Command, Control, EffectKind, EntityId, EntityKind,
    EntitySnapshot, EntitySpawn, EntityView, Event, Faction, OverrideState, Phase,
    ProjectileSpawn, Vec2,
};

const BULLET_SIZE: f32 = 0.25;

/// Ability explicitly requested for an externally controlled boss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbilityRequest {
    /// Boss that should use the ability.
    pub entity: EntityId,
    /// Requested ability.
    pub ability: BossAbility,
    /// Variant selector, used by summons to choose a pool.
    pub variant: u8,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Dash {
    target: Vec2,
    started: Duration,
    contacted: bool,
}

/// Encounter state tracked for a single boss.
#[derive(Clone, Debug, PartialEq)]
pub struct BossBrain {
    phase: Phase,
    last_used: BTreeMap<BossAbility, Duration>,
    dash: Option<Dash>,
    shield_until: Option<Duration>,
}

impl BossBrain {
    /// Fresh brain starting in the phase the boss already reached.
    fn new(now: Duration, phase: Phase) -> Self {
        let last_used = [
            BossAbility::Summon,
            BossAbility::Dash,
            BossAbility::Shield,
            BossAbility::GravityPull,
            BossAbility::BulletHell,
        ]
        .into_iter()
        .map(|ability| (ability, now))
        .collect();
        Self {
            phase,
            last_used,
            dash: None,
            shield_until: None,
        }
    }

    /// Current encounter phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reports whether a dash or shield is in progress.
    #[must_use]
    pub fn has_override(&self) -> bool {
        self.dash.is_some() || self.shield_until.is_some()
    }

    fn is_ready(&self, ability: BossAbility, now: Duration, interval: Duration) -> bool {
        self.last_used
            .get(&ability)
            .map_or(true, |last| now.saturating_sub(*last) >= interval)
    }
}

#[derive(Clone, Copy)]
struct Frame<'a> {
    now: Duration,
    elapsed: Duration,
    tile_length: f32,
    player: Option<&'a EntitySnapshot>,
}

/// Drives every boss present in the world.
#[derive(Debug)]
pub struct BossDirector {
    config: ArenaConfig,
    brains: BTreeMap<EntityId, BossBrain>,
}

impl BossDirector {
    /// Creates a director using the boss tuning and rosters of `config`.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            config,
            brains: BTreeMap::new(),
        }
    }

    /// Encounter state of `boss`, if it has been observed.
    #[must_use]
    pub fn brain(&self, boss: EntityId) -> Option<&BossBrain> {
        self.brains.get(&boss)
    }

    /// Consumes world events and snapshots to emit boss commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        now: Duration,
        entities: &EntityView,
        tile_length: f32,
        requests: &[AbilityRequest],
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt, .. } => elapsed = elapsed.saturating_add(*dt),
                Event::EntityRemoved { entity, .. } => {
                    let _ = self.brains.remove(entity);
                }
                _ => {}
            }
        }

        let frame = Frame {
            now,
            elapsed,
            tile_length,
            player: entities.player(),
        };
        for boss in entities
            .iter()
            .filter(|snapshot| snapshot.kind == EntityKind::Boss && snapshot.is_alive())
        {
            let mut brain = self
                .brains
                .remove(&boss.id)
                .unwrap_or_else(|| BossBrain::new(now, boss.phase));
            self.advance_phase(&mut brain, boss, frame, out);

            if brain.has_override() {
                self.run_override(&mut brain, boss, frame, out);
            } else {
                for request in requests.iter().filter(|request| request.entity == boss.id) {
                    let _ = self.try_fire(
                        &mut brain,
                        boss,
                        request.ability,
                        request.variant,
                        frame,
                        out,
                    );
                }
                if boss.control == Control::Ai {
                    for &ability in self.config.boss.preferences.for_phase(brain.phase) {
                        if self.try_fire(&mut brain, boss, ability, 0, frame, out) {
                            break;
                        }
                    }
                    if !brain.has_override() {
                        self.approach(boss, frame, out);
                    }
                }
            }
            let _ = self.brains.insert(boss.id, brain);
        }
    }

    fn advance_phase(
        &self,
        brain: &mut BossBrain,
        boss: &EntitySnapshot,
        frame: Frame<'_>,
        out: &mut Vec<Command>,
    ) {
        let fraction = boss.health_fraction();
        while let Some(next) = brain.phase.next() {
            let Some(threshold) = self.config.boss.threshold(next) else {
                break;
            };
            if !(brain.phase < next && fraction < threshold) {
                break;
            }
            brain.phase = next;
            tracing::info!(boss = boss.id.get(), phase = next.number(), "boss_phase_entered");
            out.push(Command::SetPhase {
                entity: boss.id,
                phase: next,
            });
            out.push(Command::SpawnEffect {
                effect: EffectKind::PhaseBurst,
                position: boss.center(),
            });
            out.push(Command::SetAppearance {
                entity: boss.id,
                variant: self.config.boss.appearance(next),
            });
            out.push(Command::SetDamageScale {
                entity: boss.id,
                scale: self.config.boss.damage_scale(next),
            });
            let scripted = match next {
                Phase::One => None,
                Phase::Two => Some(BossAbility::Summon),
                Phase::Three => Some(BossAbility::BulletHell),
            };
            if let Some(ability) = scripted {
                let _ = self.execute(brain, boss, ability, 0, frame, out);
                let _ = brain.last_used.insert(ability, frame.now);
            }
        }
    }

    fn run_override(
        &self,
        brain: &mut BossBrain,
        boss: &EntitySnapshot,
        frame: Frame<'_>,
        out: &mut Vec<Command>,
    ) {
        if let Some(until) = brain.shield_until {
            if frame.now >= until {
                brain.shield_until = None;
                out.push(Command::SetOverride {
                    entity: boss.id,
                    state: None,
                });
            }
            return;
        }

        let Some(dash) = brain.dash.as_mut() else {
            return;
        };
        let tuning = self.config.boss.dash;
        if frame.now.saturating_sub(dash.started) >= tuning.duration {
            brain.dash = None;
            out.push(Command::SetOverride {
                entity: boss.id,
                state: None,
            });
            return;
        }

        let offset = dash.target - boss.center();
        let step = boss.speed * tuning.speed_multiplier * frame.elapsed.as_secs_f32();
        let arrived = offset.length() <= step;
        let delta = if arrived {
            offset
        } else {
            offset.normalize_or_zero() * step
        };

        if let Some(player) = frame.player {
            if !dash.contacted && boss.bounds.translated(delta).overlaps(&player.bounds) {
                dash.contacted = true;
                out.push(Command::ApplyDamage {
                    entity: player.id,
                    amount: tuning.contact_damage,
                    source: Some(boss.id),
                });
            }
        }
        if delta != Vec2::ZERO {
            out.push(Command::MoveEntity {
                entity: boss.id,
                delta,
            });
        }
        if arrived {
            brain.dash = None;
            out.push(Command::SetOverride {
                entity: boss.id,
                state: None,
            });
        }
    }

    fn try_fire(
        &self,
        brain: &mut BossBrain,
        boss: &EntitySnapshot,
        ability: BossAbility,
        variant: u8,
        frame: Frame<'_>,
        out: &mut Vec<Command>,
    ) -> bool {
        if brain.has_override() {
            return false;
        }
        let interval = self.config.boss.intervals.interval(ability);
        if !brain.is_ready(ability, frame.now, interval) {
            return false;
        }
        if !self.execute(brain, boss, ability, variant, frame, out) {
            return false;
        }
        let _ = brain.last_used.insert(ability, frame.now);
        tracing::debug!(boss = boss.id.get(), ability = ability.key(), "boss_ability_fired");
        true
    }

    fn execute(
        &self,
        brain: &mut BossBrain,
        boss: &EntitySnapshot,
        ability: BossAbility,
        variant: u8,
        frame: Frame<'_>,
        out: &mut Vec<Command>,
    ) -> bool {
        let tuning = &self.config.boss;
        let center = boss.center();
        match ability {
            BossAbility::Summon => {
                let Some(pool) = tuning.summon.pool(variant) else {
                    tracing::warn!(boss = boss.id.get(), variant, "summon_pool_missing");
                    return false;
                };
                out.push(Command::SpawnEffect {
                    effect: EffectKind::SummonPortal,
                    position: center,
                });
                let count = tuning.summon.count.max(1);
                for index in 0..tuning.summon.count {
                    let angle = TAU * index as f32 / count as f32;
                    let spot =
                        center + Vec2::new(angle.cos(), angle.sin()) * tuning.summon.ring_radius;
                    let mut spawn = self.config.enemy_spawn(pool, spot);
                    spawn.position = spot - spawn.size * frame.tile_length * 0.5;
                    out.push(Command::SpawnEntity { spawn });
                }
                true
            }
            BossAbility::Dash => {
                let Some(player) = frame.player else {
                    return false;
                };
                brain.dash = Some(Dash {
                    target: player.center(),
                    started: frame.now,
                    contacted: false,
                });
                out.push(Command::SetOverride {
                    entity: boss.id,
                    state: Some(OverrideState::Dashing),
                });
                true
            }
            BossAbility::Shield => {
                brain.shield_until = Some(frame.now.saturating_add(tuning.shield.duration));
                out.push(Command::SetOverride {
                    entity: boss.id,
                    state: Some(OverrideState::Shielded),
                });
                out.push(Command::SpawnEffect {
                    effect: EffectKind::ShieldFlash,
                    position: center,
                });
                true
            }
            BossAbility::GravityPull => {
                let Some(player) = frame.player else {
                    return false;
                };
                let offset = center - player.center();
                let distance = offset.length();
                if distance > tuning.gravity.radius {
                    return false;
                }
                out.push(Command::SpawnEffect {
                    effect: EffectKind::GravityWell,
                    position: center,
                });
                let pull = tuning.gravity.strength.min(distance);
                if pull > 0.0 {
                    out.push(Command::MoveEntity {
                        entity: player.id,
                        delta: offset.normalize_or_zero() * pull,
                    });
                }
                true
            }
            BossAbility::BulletHell => {
                let volley = &tuning.bullet_hell;
                let count = volley.bullets.max(1);
                let size = Vec2::splat(BULLET_SIZE);
                for index in 0..volley.bullets {
                    let angle = TAU * index as f32 / count as f32;
                    let heading = Vec2::new(angle.cos(), angle.sin());
                    out.push(Command::SpawnEntity {
                        spawn: EntitySpawn::projectile(
                            "boss_bullet",
                            Faction::Hostiles,
                            center - size * frame.tile_length * 0.5,
                            size,
                            ProjectileSpawn {
                                owner: boss.id,
                                velocity: heading * volley.speed,
                                lifetime: volley.lifetime,
                                contact_damage: volley.damage,
                            },
                        ),
                    });
                }
                true
            }
        }
    }

    fn approach(&self, boss: &EntitySnapshot, frame: Frame<'_>, out: &mut Vec<Command>) {
        let Some(player) = frame.player else {
            return;
        };
        let offset = player.center() - boss.center();
        let gap = offset.length() - self.config.boss.engage_distance;
        if gap <= 0.0 {
            return;
        }
        let step = (boss.speed * frame.elapsed.as_secs_f32()).min(gap);
        if step > 0.0 {
            out.push(Command::MoveEntity {
                entity: boss.id,
                delta: offset.normalize_or_zero() * step,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_arena_core::Aabb;

    fn boss(control: Control) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(3),
            kind: EntityKind::Boss,
            faction: Faction::Hostiles,
            type_key: "boss".to_owned(),
            bounds: Aabb::new(Vec2::new(256.0, 256.0), Vec2::splat(64.0)),
            health: 4000.0,
            max_health: 4000.0,
            speed: 80.0,
            control,
            override_state: None,
            weapon: None,
            damage_scale: 0.65,
            appearance: 0,
            phase: Phase::One,
        }
    }

    fn spawned_keys(commands: &[Command]) -> Vec<String> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEntity { spawn } => Some(spawn.type_key.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn requested_summons_use_the_variant_pool_once_ready() {
        let mut director = BossDirector::new(ArenaConfig::default());
        let view = EntityView::from_snapshots(vec![boss(Control::External)]);
        let request = AbilityRequest {
            entity: EntityId::new(3),
            ability: BossAbility::Summon,
            variant: 1,
        };

        let mut out = Vec::new();
        director.handle(&[], Duration::ZERO, &view, 32.0, &[request], &mut out);
        assert!(out.is_empty());

        director.handle(&[], Duration::from_secs(8), &view, 32.0, &[request], &mut out);
        assert_eq!(spawned_keys(&out), vec!["archer"; 3]);
        assert!(out.iter().any(|command| matches!(
            command,
            Command::SpawnEffect {
                effect: EffectKind::SummonPortal,
                ..
            }
        )));
    }

    #[test]
    fn external_bosses_ignore_preferences() {
        let mut config = ArenaConfig::default();
        config.boss.preferences.one = vec![BossAbility::Shield];
        config.boss.intervals.shield = Duration::ZERO;
        let mut director = BossDirector::new(config);
        let view = EntityView::from_snapshots(vec![boss(Control::External)]);

        let mut out = Vec::new();
        director.handle(&[], Duration::from_secs(1), &view, 32.0, &[], &mut out);
        assert!(out.is_empty());

        let ai_view = EntityView::from_snapshots(vec![boss(Control::Ai)]);
        let mut director = BossDirector::new(director.config.clone());
        director.handle(&[], Duration::from_secs(1), &ai_view, 32.0, &[], &mut out);
        assert!(out.contains(&Command::SetOverride {
            entity: EntityId::new(3),
            state: Some(OverrideState::Shielded),
        }));
        assert!(director
            .brain(EntityId::new(3))
            .map_or(false, BossBrain::has_override));
    }

    #[test]
    fn bullet_hell_spreads_projectiles_evenly() {
        let mut config = ArenaConfig::default();
        config.boss.preferences.one = vec![BossAbility::BulletHell];
        config.boss.intervals.bullet_hell = Duration::ZERO;
        let bullets = config.boss.bullet_hell.bullets as usize;
        let mut director = BossDirector::new(config);
        let view = EntityView::from_snapshots(vec![boss(Control::Ai)]);

        let mut out = Vec::new();
        director.handle(&[], Duration::ZERO, &view, 32.0, &[], &mut out);
        let velocities: Vec<Vec2> = out
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEntity { spawn } => spawn.projectile.map(|motion| motion.velocity),
                _ => None,
            })
            .collect();
        assert_eq!(velocities.len(), bullets);
        let sum: Vec2 = velocities.iter().copied().sum();
        assert!(sum.length() < 1e-2);
    }
}
