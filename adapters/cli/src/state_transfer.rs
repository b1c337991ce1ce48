#![allow(clippy::missing_errors_doc)]

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tile_arena_core::EntityRecord;
use tile_arena_world::snapshot::{PlacedCell, WorldSnapshot};

const STATE_DOMAIN: &str = "arena";
const STATE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded state payload.
pub(crate) const STATE_HEADER: &str = "arena:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Everything in a world snapshot except the dimensions carried by the header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableState {
    tile_length: f32,
    scale: u32,
    cells: Vec<PlacedCell>,
    entities: Vec<EntityRecord>,
}

/// Encodes `snapshot` into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(snapshot: &WorldSnapshot) -> Result<String, StateTransferError> {
    let payload = SerializableState {
        tile_length: snapshot.tile_length,
        scale: snapshot.scale,
        cells: snapshot.cells.clone(),
        entities: snapshot.entities.clone(),
    };
    let json = serde_json::to_vec(&payload).map_err(StateTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{STATE_HEADER}:{}x{}:{encoded}",
        snapshot.columns, snapshot.rows
    ))
}

/// Decodes a world snapshot from its string representation.
pub(crate) fn decode(value: &str) -> Result<WorldSnapshot, StateTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StateTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(StateTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(StateTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(StateTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(StateTransferError::MissingPayload)?;

    if domain != STATE_DOMAIN {
        return Err(StateTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != STATE_VERSION {
        return Err(StateTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (columns, rows) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(StateTransferError::InvalidEncoding)?;
    let decoded: SerializableState =
        serde_json::from_slice(&bytes).map_err(StateTransferError::InvalidPayload)?;

    Ok(WorldSnapshot {
        columns,
        rows,
        tile_length: decoded.tile_length,
        scale: decoded.scale,
        cells: decoded.cells,
        entities: decoded.entities,
    })
}

/// Errors that can occur while decoding state transfer strings.
#[derive(Debug, thiserror::Error)]
pub(crate) enum StateTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("state payload was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("state string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("state string is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("state string is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("state string is missing the payload")]
    MissingPayload,
    /// The prefix segment named another domain.
    #[error("state prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version segment is not understood.
    #[error("state version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode state payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse state payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), StateTransferError> {
    let invalid = || StateTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;
    if columns == 0 || rows == 0 {
        return Err(invalid());
    }
    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_arena_core::{config::ArenaConfig, TileCoord, Vec2};

    fn populated() -> WorldSnapshot {
        let config = ArenaConfig::default();
        let mut record_source = tile_arena_world::World::new(config.palette());
        let mut events = Vec::new();
        tile_arena_world::apply(
            &mut record_source,
            tile_arena_core::Command::ConfigureGrid {
                columns: 20,
                rows: 15,
                tile_length: 32.0,
            },
            &mut events,
        )
        .expect("valid grid");
        for command in [
            tile_arena_core::Command::PlaceCell {
                origin: TileCoord::new(4, 7),
                cell: "pillar".to_owned(),
            },
            tile_arena_core::Command::SpawnEntity {
                spawn: config.player_spawn(Vec2::new(64.0, 64.0)),
            },
            tile_arena_core::Command::SpawnEntity {
                spawn: config.enemy_spawn("grunt", Vec2::new(320.0, 64.0)),
            },
        ] {
            tile_arena_world::apply(&mut record_source, command, &mut events)
                .expect("command applies");
        }
        tile_arena_world::query::snapshot(&record_source)
    }

    #[test]
    fn populated_state_survives_transfer() {
        let snapshot = populated();
        let encoded = encode(&snapshot).expect("state encodes");
        assert!(encoded.starts_with(&format!("{STATE_HEADER}:20x15:")));

        let decoded = decode(&encoded).expect("state decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(matches!(decode("   "), Err(StateTransferError::EmptyPayload)));
        assert!(matches!(
            decode("vault:v1:4x4:e30"),
            Err(StateTransferError::InvalidPrefix(prefix)) if prefix == "vault"
        ));
        assert!(matches!(
            decode("arena:v2:4x4:e30"),
            Err(StateTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            decode("arena:v1:0x4:e30"),
            Err(StateTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            decode("arena:v1:4x4"),
            Err(StateTransferError::MissingPayload)
        ));
        assert!(matches!(
            decode("arena:v1:4x4:!!"),
            Err(StateTransferError::InvalidEncoding(_))
        ));
    }
}
