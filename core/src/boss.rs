//! Vocabulary of the boss encounter.

use serde::{Deserialize, Serialize};

/// Encounter phase of a boss, entered in strictly increasing order.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Phase {
    /// Opening phase at full health.
    #[default]
    One,
    /// Entered once health drops below the first threshold.
    Two,
    /// Final phase entered below the second threshold.
    Three,
}

impl Phase {
    /// One-based phase number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Phase that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Phase> {
        match self {
            Self::One => Some(Self::Two),
            Self::Two => Some(Self::Three),
            Self::Three => None,
        }
    }
}

/// Special abilities available to a boss, each cooled independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossAbility {
    /// Spawns a ring of minions drawn from the summon pool.
    Summon,
    /// Charges toward the player's position at dash start.
    Dash,
    /// Blocks movement and incoming damage for a while.
    Shield,
    /// Drags a nearby player toward the boss.
    GravityPull,
    /// Fires a radial volley of damaging projectiles.
    BulletHell,
}

impl BossAbility {
    /// Stable key used in logs and configuration.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Summon => "summon",
            Self::Dash => "dash",
            Self::Shield => "shield",
            Self::GravityPull => "gravity_pull",
            Self::BulletHell => "bullet_hell",
        }
    }
}

/// Transient state that replaces an entity's normal movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideState {
    /// Charging toward a fixed point at boosted speed.
    Dashing,
    /// Stationary and immune to damage.
    Shielded,
}
