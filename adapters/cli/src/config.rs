//! Loading arena configuration from TOML files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use tile_arena_core::config::ArenaConfig;

/// Loads the configuration at `path`, or the defaults when no path is given.
///
/// Missing sections and fields fall back to their defaults.
pub(crate) fn load(path: Option<&Path>) -> Result<ArenaConfig> {
    let Some(path) = path else {
        return Ok(ArenaConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read arena config at {}", path.display()))?;
    let config = parse(&contents)
        .with_context(|| format!("failed to parse arena config at {}", path.display()))?;
    tracing::info!(path = %path.display(), "arena_config_loaded");
    Ok(config)
}

fn parse(contents: &str) -> Result<ArenaConfig> {
    toml::from_str(contents).context("invalid arena config toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tile_arena_core::BossAbility;

    #[test]
    fn partial_files_keep_defaults() {
        let config = parse(
            r#"
            [grid]
            columns = 32

            [boss]
            phase_two_threshold = 0.5
            damage_scales = [0.5, 1.0, 1.5]

            [boss.intervals]
            dash_ms = 2500

            [boss.preferences]
            one = ["dash", "summon"]

            [combat]
            rescan_interval_ms = 250
            "#,
        )
        .expect("config parses");

        assert_eq!(config.grid.columns, 32);
        assert_eq!(config.grid.rows, 18);
        assert_eq!(config.boss.phase_two_threshold, 0.5);
        assert_eq!(config.boss.damage_scales, [0.5, 1.0, 1.5]);
        assert_eq!(config.boss.intervals.dash, Duration::from_millis(2500));
        assert_eq!(
            config.boss.preferences.one,
            vec![BossAbility::Dash, BossAbility::Summon]
        );
        assert_eq!(config.combat.rescan_interval, Duration::from_millis(250));
        assert_eq!(config.weapons, ArenaConfig::default().weapons);
    }

    #[test]
    fn malformed_files_are_reported() {
        assert!(parse("[grid]\ncolumns = \"many\"").is_err());
    }

    #[test]
    fn missing_path_yields_defaults() {
        assert_eq!(load(None).expect("defaults"), ArenaConfig::default());
    }
}
