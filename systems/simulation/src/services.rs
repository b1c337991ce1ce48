//! Side channels a host provides to the simulation.

use tile_arena_core::{EffectKind, Vec2};

/// Host services invoked while stepping.
pub trait Services {
    /// Presents a visual effect at `position`.
    fn effect(&mut self, effect: EffectKind, position: Vec2);
}

/// Services that discard everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullServices;

impl Services for NullServices {
    fn effect(&mut self, _effect: EffectKind, _position: Vec2) {}
}

/// Services that remember every effect, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingServices {
    effects: Vec<(EffectKind, Vec2)>,
}

impl RecordingServices {
    /// Effects presented so far.
    #[must_use]
    pub fn effects(&self) -> &[(EffectKind, Vec2)] {
        &self.effects
    }
}

impl Services for RecordingServices {
    fn effect(&mut self, effect: EffectKind, position: Vec2) {
        self.effects.push((effect, position));
    }
}
