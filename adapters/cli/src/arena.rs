//! Default arena layout and the headless episode loop.

use std::{collections::BTreeMap, time::Duration};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tile_arena_core::{
    config::ArenaConfig, Control, EffectKind, EntityId, EntityKind, Phase, TileCoord, Vec2,
};
use tile_arena_simulation::{Services, Simulation, StepReport};
use tile_arena_world::snapshot::WorldSnapshot;

use crate::policy::Policy;

/// Rays cast around the controlled entity every decision.
const VISION_RAYS: usize = 8;
/// Reach of each vision ray in pixels.
const VISION_RANGE: f32 = 256.0;

/// Entity handed to the external policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Side {
    /// The player is externally controlled; the boss runs its own AI.
    Player,
    /// The boss is externally controlled; the player runs its own AI.
    Boss,
}

/// Simulation plus the handles of its protagonists.
#[derive(Debug)]
pub(crate) struct Arena {
    pub(crate) simulation: Simulation,
    pub(crate) player: EntityId,
    pub(crate) boss: Option<EntityId>,
}

impl Arena {
    /// Builds the default layout: pillars, a few enemies, the player and the boss.
    pub(crate) fn build(config: ArenaConfig, side: Side) -> Result<Self> {
        let mut simulation = Simulation::new(config).context("failed to create simulation")?;
        let columns = i32::try_from(simulation.config().grid.columns).unwrap_or(i32::MAX);
        let rows = i32::try_from(simulation.config().grid.rows).unwrap_or(i32::MAX);
        let tile = simulation.config().grid.tile_length;

        for origin in [
            TileCoord::new(columns / 3, rows / 4),
            TileCoord::new(columns / 3, rows * 3 / 4 - 1),
            TileCoord::new(columns * 2 / 3 - 1, rows / 4),
            TileCoord::new(columns * 2 / 3 - 1, rows * 3 / 4 - 1),
        ] {
            let _ = simulation.place_cell(origin, "pillar")?;
        }
        let _ = simulation.place_cell(TileCoord::new(columns / 2, 0), "exit")?;

        let at = |column: i32, row: i32| Vec2::new(column as f32 * tile, row as f32 * tile);
        let mut player_spawn = simulation.config().player_spawn(at(2, rows / 2));
        let mut boss_spawn = simulation.config().boss_spawn(at(columns - 4, rows / 2 - 1));
        match side {
            Side::Player => player_spawn = player_spawn.with_control(Control::External),
            Side::Boss => boss_spawn = boss_spawn.with_control(Control::External),
        }
        let player = simulation
            .spawn_entity(player_spawn)?
            .context("player spawn was rejected")?;
        let boss = simulation.spawn_entity(boss_spawn)?;
        for (key, column, row) in [
            ("grunt", columns / 2, rows / 3),
            ("grunt", columns / 2, rows * 2 / 3),
            ("archer", columns - 3, 2),
        ] {
            let _ = simulation.spawn_enemy(key, at(column, row))?;
        }
        tracing::info!(player = player.get(), side = ?side, "arena_built");

        Ok(Self {
            simulation,
            player,
            boss,
        })
    }

    /// Restores an arena from a transferred world snapshot.
    pub(crate) fn restore(config: ArenaConfig, snapshot: &WorldSnapshot) -> Result<Self> {
        let mut simulation = Simulation::new(config).context("failed to create simulation")?;
        let _ = simulation
            .restore(snapshot)
            .context("failed to restore transferred state")?;
        let view = simulation.entities();
        let player = view
            .player()
            .map(|player| player.id)
            .context("transferred state holds no player")?;
        let boss = view
            .iter()
            .find(|entity| entity.kind == EntityKind::Boss)
            .map(|boss| boss.id);
        Ok(Self {
            simulation,
            player,
            boss,
        })
    }

    /// Entity driven by the policy for `side`.
    pub(crate) fn controlled(&self, side: Side) -> Option<EntityId> {
        match side {
            Side::Player => Some(self.player),
            Side::Boss => self.boss,
        }
    }
}

/// Ends an episode once no damage has been exchanged for a window of frames.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StalemateGuard {
    window: u32,
    quiet: u32,
}

impl StalemateGuard {
    pub(crate) fn new(window: u32) -> Self {
        Self { window, quiet: 0 }
    }

    /// Records one frame, returning `true` once the quiet window is exhausted.
    pub(crate) fn observe(&mut self, report: &StepReport) -> bool {
        if report.damage_exchanged() > 0.0 {
            self.quiet = 0;
        } else {
            self.quiet = self.quiet.saturating_add(1);
        }
        self.window > 0 && self.quiet >= self.window
    }
}

/// How an episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    PlayerDied,
    BossDefeated,
    Stalemate,
    FrameLimit,
}

/// Frame pacing of an episode.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EpisodeSettings {
    pub(crate) frames: u32,
    pub(crate) frame_skip: u32,
    pub(crate) dt: Duration,
    pub(crate) stalemate_frames: u32,
}

/// Summary printed at the end of an episode.
#[derive(Clone, Debug)]
pub(crate) struct EpisodeSummary {
    pub(crate) outcome: Outcome,
    pub(crate) frames: u32,
    pub(crate) clock: Duration,
    pub(crate) player_health: Option<f32>,
    pub(crate) boss_health: Option<f32>,
    pub(crate) boss_phase: Option<Phase>,
}

/// Counts the effects presented during an episode.
#[derive(Clone, Debug, Default)]
pub(crate) struct EffectTally {
    pub(crate) counts: BTreeMap<String, u32>,
}

impl Services for EffectTally {
    fn effect(&mut self, effect: EffectKind, _position: Vec2) {
        let entry = self.counts.entry(format!("{effect:?}")).or_default();
        *entry = entry.saturating_add(1);
    }
}

/// Runs decisions until the player or boss dies, a stalemate, or the frame limit.
pub(crate) fn run_episode(
    arena: &mut Arena,
    side: Side,
    policy: &mut dyn Policy,
    settings: EpisodeSettings,
    services: &mut dyn Services,
) -> Result<EpisodeSummary> {
    let mut guard = StalemateGuard::new(settings.stalemate_frames);
    let controlled = arena.controlled(side);
    let mut frames = 0;
    let outcome = loop {
        if frames >= settings.frames {
            break Outcome::FrameLimit;
        }
        if let Some(entity) = controlled {
            if let Some(vision) = arena.simulation.vision(entity, VISION_RAYS, VISION_RANGE) {
                let _ = arena.simulation.set_action(entity, policy.choose(&vision));
            }
        }
        let report = arena
            .simulation
            .step_frames(settings.frame_skip.max(1), settings.dt, services)
            .context("simulation step failed")?;
        frames = frames.saturating_add(settings.frame_skip.max(1));

        if report.deaths(EntityKind::Player).contains(&arena.player) {
            break Outcome::PlayerDied;
        }
        if let Some(boss) = arena.boss {
            if report.deaths(EntityKind::Boss).contains(&boss) {
                break Outcome::BossDefeated;
            }
        }
        if guard.observe(&report) {
            tracing::info!(frames, "stalemate_detected");
            break Outcome::Stalemate;
        }
    };

    let simulation = &arena.simulation;
    Ok(EpisodeSummary {
        outcome,
        frames,
        clock: simulation.clock(),
        player_health: simulation.entity(arena.player).map(|player| player.health),
        boss_health: arena
            .boss
            .and_then(|boss| simulation.entity(boss))
            .map(|boss| boss.health),
        boss_phase: arena.boss.and_then(|boss| simulation.boss_phase(boss)),
    })
}
