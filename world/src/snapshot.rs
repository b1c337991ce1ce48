//! Pure-data persistence of the world.

use serde::{Deserialize, Serialize};
use tile_arena_core::{EntityRecord, TileCoord};

/// Anchor of a placed cell, stored by cell name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedCell {
    /// Anchor tile of the footprint.
    pub origin: TileCoord,
    /// Stable name of the cell.
    pub cell: String,
}

/// Persisted world state.
///
/// Holds no derived data: flow fields, cooldown timestamps, transient
/// overrides, and in-flight projectiles are not captured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Number of tile columns at the captured scale.
    pub columns: u32,
    /// Number of tile rows at the captured scale.
    pub rows: u32,
    /// Side length of a tile in pixels.
    pub tile_length: f32,
    /// Accumulated grid scale.
    pub scale: u32,
    /// Anchors of every non-empty cell.
    pub cells: Vec<PlacedCell>,
    /// Every persisted entity.
    pub entities: Vec<EntityRecord>,
}
