use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use torque_engine::{ConfigValueError, InteractionConfig, TighteningConfig, UnitId};
use tracing::{info, warn};

pub(crate) const PUZZLE_CONFIG_FILE: &str = "puzzle.json";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("read puzzle config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse puzzle config '{path}' at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid puzzle config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Value(#[from] ConfigValueError),
}

/// Placement of the bolts in the side view, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LayoutConfig {
    pub(crate) bolt_spacing: f32,
    /// Untightened shaft height relative to its bolt root.
    pub(crate) shaft_height: f32,
    /// Untightened cap height relative to its bolt root.
    pub(crate) cap_height: f32,
    pub(crate) plate_bottom: f32,
    pub(crate) plate_top: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bolt_spacing: 1.6,
            shaft_height: 2.4,
            cap_height: 3.4,
            plate_bottom: 0.8,
            plate_top: 1.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PuzzleConfig {
    pub(crate) canonical_order: Vec<u32>,
    pub(crate) tutorial_unit_count: usize,
    /// Zero disables the clock.
    pub(crate) time_limit_seconds: f32,
    /// Zero means unlimited.
    pub(crate) guided_max_attempts: u32,
    pub(crate) unaided_max_attempts: u32,
    pub(crate) highlight_seconds: f32,
    pub(crate) highlight_interval_seconds: f32,
    pub(crate) tutorial_seed: Option<u64>,
    pub(crate) layout: LayoutConfig,
    pub(crate) interaction: InteractionConfig,
    pub(crate) tightening: TighteningConfig,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            canonical_order: vec![2, 5, 3, 6, 4, 7, 8, 1],
            tutorial_unit_count: 3,
            time_limit_seconds: 120.0,
            guided_max_attempts: 3,
            unaided_max_attempts: 6,
            highlight_seconds: 2.0,
            highlight_interval_seconds: 0.5,
            tutorial_seed: None,
            layout: LayoutConfig::default(),
            interaction: InteractionConfig::default(),
            tightening: TighteningConfig::default(),
        }
    }
}

impl PuzzleConfig {
    pub(crate) fn canonical_units(&self) -> Vec<UnitId> {
        self.canonical_order.iter().copied().map(UnitId).collect()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.canonical_order.is_empty() {
            return Err(invalid("canonical_order", "must list at least one unit"));
        }
        if self.tutorial_unit_count == 0 || self.tutorial_unit_count > self.canonical_order.len()
        {
            return Err(invalid(
                "tutorial_unit_count",
                format!(
                    "expected 1..={}, got {}",
                    self.canonical_order.len(),
                    self.tutorial_unit_count
                ),
            ));
        }
        for (field, value) in [
            ("time_limit_seconds", self.time_limit_seconds),
            ("highlight_seconds", self.highlight_seconds),
            ("highlight_interval_seconds", self.highlight_interval_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("expected a non-negative number, got {value}")));
            }
        }
        let layout = &self.layout;
        if !layout.bolt_spacing.is_finite() || layout.bolt_spacing <= 0.0 {
            return Err(invalid(
                "layout.bolt_spacing",
                format!("expected a positive number, got {}", layout.bolt_spacing),
            ));
        }
        if !layout.plate_top.is_finite()
            || !layout.plate_bottom.is_finite()
            || layout.plate_top <= layout.plate_bottom
        {
            return Err(invalid(
                "layout.plate_top",
                "must be above layout.plate_bottom",
            ));
        }
        self.interaction.validate()?;
        self.tightening.validate()?;
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(format!("{field}: {}", message.into()))
}

/// Loads and validates the puzzle config. A missing file falls back to the
/// built-in defaults.
pub(crate) fn load_puzzle_config(path: &Path) -> Result<PuzzleConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "puzzle_config_missing_using_defaults");
            return Ok(PuzzleConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = parse_puzzle_config(&raw).map_err(|(json_path, source)| ConfigError::Parse {
        path: path.to_path_buf(),
        json_path,
        source,
    })?;
    config.validate()?;
    info!(
        path = %path.display(),
        units = config.canonical_order.len(),
        tutorial_units = config.tutorial_unit_count,
        "puzzle_config_loaded"
    );
    Ok(config)
}

fn parse_puzzle_config(raw: &str) -> Result<PuzzleConfig, (String, serde_json::Error)> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, PuzzleConfig>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        (json_path, error.into_inner())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, raw: &str) -> PathBuf {
        let path = dir.path().join(PUZZLE_CONFIG_FILE);
        fs::write(&path, raw).expect("write config");
        path
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_puzzle_config(&dir.path().join("absent.json")).expect("defaults");
        assert_eq!(config, PuzzleConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            &dir,
            r#"{ "time_limit_seconds": 0, "tutorial_seed": 7, "interaction": { "hold_duration_seconds": 0.5 } }"#,
        );
        let config = load_puzzle_config(&path).expect("load");
        assert_eq!(config.time_limit_seconds, 0.0);
        assert_eq!(config.tutorial_seed, Some(7));
        assert_eq!(config.interaction.hold_duration_seconds, 0.5);
        assert_eq!(config.canonical_order, vec![2, 5, 3, 6, 4, 7, 8, 1]);
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn parse_error_names_the_json_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, r#"{ "layout": { "bolt_spacing": "wide" } }"#);
        match load_puzzle_config(&path) {
            Err(ConfigError::Parse { json_path, .. }) => {
                assert_eq!(json_path, "layout.bolt_spacing");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, r#"{ "tutorial_units": 3 }"#);
        assert!(matches!(
            load_puzzle_config(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn oversized_tutorial_is_invalid() {
        let config = PuzzleConfig {
            canonical_order: vec![1, 2],
            tutorial_unit_count: 3,
            ..PuzzleConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn nested_engine_values_are_validated() {
        let mut config = PuzzleConfig::default();
        config.interaction.hold_duration_seconds = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Value(_))));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let raw = include_str!("../../../../assets/puzzle.json");
        let config = parse_puzzle_config(raw).expect("shipped config parses");
        assert!(config.validate().is_ok());
        assert_eq!(config.canonical_units().len(), 8);
    }
}
