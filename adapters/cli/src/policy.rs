//! Action policies that drive the controlled entity in headless episodes.

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_arena_core::ACTION_COUNT;
use tile_arena_simulation::Vision;

const ATTACK: u8 = 5;
/// Move codes for east, south, west and north, matching ray quadrants.
const QUADRANT_MOVES: [u8; 4] = [4, 2, 3, 1];
/// Entity proximity above which the heuristic attacks instead of closing in.
const ENGAGE_PROXIMITY: f32 = 0.6;

/// Chooses an action code from the controlled entity's vision.
pub(crate) trait Policy {
    /// Action code to hold for the next frames.
    fn choose(&mut self, vision: &Vision) -> u8;
}

/// Policies selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum PolicyKind {
    /// Uniformly random action codes.
    Random,
    /// Never acts.
    Idle,
    /// Cycles through a fixed list of codes.
    Scripted,
    /// Closes in on the nearest sensed opponent and attacks.
    Heuristic,
}

/// Builds the policy named by `kind`.
pub(crate) fn build(kind: PolicyKind, seed: u64, script: &[u8]) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
        PolicyKind::Idle => Box::new(IdlePolicy),
        PolicyKind::Scripted => Box::new(ScriptedPolicy::new(script.to_vec())),
        PolicyKind::Heuristic => Box::new(HeuristicPolicy::new(seed)),
    }
}

#[derive(Debug)]
pub(crate) struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn choose(&mut self, _vision: &Vision) -> u8 {
        self.rng.gen_range(0..ACTION_COUNT)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct IdlePolicy;

impl Policy for IdlePolicy {
    fn choose(&mut self, _vision: &Vision) -> u8 {
        0
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ScriptedPolicy {
    codes: Vec<u8>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub(crate) fn new(codes: Vec<u8>) -> Self {
        Self { codes, cursor: 0 }
    }
}

impl Policy for ScriptedPolicy {
    fn choose(&mut self, _vision: &Vision) -> u8 {
        let Some(code) = self.codes.get(self.cursor % self.codes.len().max(1)) else {
            return 0;
        };
        self.cursor = self.cursor.wrapping_add(1);
        *code
    }
}

/// Moves along the ray that senses the closest opponent and attacks once
/// close; wanders randomly when nothing is in sight.
#[derive(Debug)]
pub(crate) struct HeuristicPolicy {
    wander: RandomPolicy,
}

impl HeuristicPolicy {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            wander: RandomPolicy::new(seed),
        }
    }
}

impl Policy for HeuristicPolicy {
    fn choose(&mut self, vision: &Vision) -> u8 {
        let closest = vision
            .entities
            .iter()
            .enumerate()
            .filter(|(_, proximity)| **proximity > 0.0)
            .max_by(|(_, a), (_, b)| a.total_cmp(b));
        match closest {
            Some((_, proximity)) if *proximity >= ENGAGE_PROXIMITY => ATTACK,
            Some((ray, _)) => QUADRANT_MOVES[quadrant(ray, vision.entities.len())],
            None => {
                let index = self.wander.rng.gen_range(0..QUADRANT_MOVES.len());
                QUADRANT_MOVES[index]
            }
        }
    }
}

/// Nearest cardinal quadrant of ray `ray` out of `rays` evenly spaced rays.
fn quadrant(ray: usize, rays: usize) -> usize {
    if rays == 0 {
        return 0;
    }
    ((ray * 4 + rays / 2) / rays) % 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vision(entities: Vec<f32>) -> Vision {
        Vision {
            walls: vec![0.0; entities.len()],
            entities,
        }
    }

    #[test]
    fn random_policy_is_reproducible_per_seed() {
        let mut first = RandomPolicy::new(7);
        let mut second = RandomPolicy::new(7);
        let empty = Vision::default();
        let a: Vec<u8> = (0..32).map(|_| first.choose(&empty)).collect();
        let b: Vec<u8> = (0..32).map(|_| second.choose(&empty)).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|code| *code < ACTION_COUNT));
    }

    #[test]
    fn scripted_policy_cycles() {
        let mut policy = ScriptedPolicy::new(vec![4, 5]);
        let empty = Vision::default();
        let codes: Vec<u8> = (0..5).map(|_| policy.choose(&empty)).collect();
        assert_eq!(codes, vec![4, 5, 4, 5, 4]);
        assert_eq!(ScriptedPolicy::new(Vec::new()).choose(&empty), 0);
    }

    #[test]
    fn heuristic_closes_in_then_attacks() {
        let mut policy = HeuristicPolicy::new(0);
        let far_south = vision(vec![0.0, 0.0, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(policy.choose(&far_south), 2);
        let far_west = vision(vec![0.0, 0.0, 0.0, 0.0, 0.3, 0.0, 0.0, 0.0]);
        assert_eq!(policy.choose(&far_west), 3);
        let close = vision(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.0]);
        assert_eq!(policy.choose(&close), ATTACK);
    }

    #[test]
    fn quadrants_follow_screen_angles() {
        assert_eq!(quadrant(0, 8), 0);
        assert_eq!(quadrant(2, 8), 1);
        assert_eq!(quadrant(4, 8), 2);
        assert_eq!(quadrant(6, 8), 3);
        assert_eq!(quadrant(7, 8), 0);
    }
}
