use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::math::Axis;
use super::node::PositionSpace;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigValueError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionConfig {
    /// Hold time before a press is validated.
    pub hold_duration_seconds: f32,
    /// How long `Wrong` lingers before reverting to `Idle`.
    pub wrong_feedback_seconds: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hold_duration_seconds: 1.0,
            wrong_feedback_seconds: 0.5,
        }
    }
}

impl InteractionConfig {
    pub fn validate(&self) -> Result<(), ConfigValueError> {
        positive("hold_duration_seconds", self.hold_duration_seconds)?;
        non_negative("wrong_feedback_seconds", self.wrong_feedback_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TighteningConfig {
    /// Absolute world height the shaft descends to.
    pub shaft_target_height: f32,
    /// Absolute world height the cap descends to.
    pub cap_target_height: f32,
    pub rotation_degrees: f32,
    pub rotation_axis: Axis,
    pub position_space: PositionSpace,
    pub shaft_lower_seconds: f32,
    pub settle_pause_seconds: f32,
    pub cap_turn_seconds: f32,
}

impl Default for TighteningConfig {
    fn default() -> Self {
        Self {
            shaft_target_height: 1.2,
            cap_target_height: 2.2,
            rotation_degrees: 360.0,
            rotation_axis: Axis::Z,
            position_space: PositionSpace::Local,
            shaft_lower_seconds: 0.5,
            settle_pause_seconds: 0.25,
            cap_turn_seconds: 0.5,
        }
    }
}

impl TighteningConfig {
    pub fn validate(&self) -> Result<(), ConfigValueError> {
        finite("shaft_target_height", self.shaft_target_height)?;
        finite("cap_target_height", self.cap_target_height)?;
        finite("rotation_degrees", self.rotation_degrees)?;
        non_negative("shaft_lower_seconds", self.shaft_lower_seconds)?;
        non_negative("settle_pause_seconds", self.settle_pause_seconds)?;
        non_negative("cap_turn_seconds", self.cap_turn_seconds)
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigValueError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigValueError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigValueError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigValueError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigValueError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigValueError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(InteractionConfig::default().validate().is_ok());
        assert!(TighteningConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_remaining_fields_from_defaults() {
        let config: TighteningConfig = serde_json::from_str(
            r#"{ "rotation_degrees": 180.0, "position_space": "world", "rotation_axis": "y" }"#,
        )
        .expect("parse");
        assert_eq!(config.rotation_degrees, 180.0);
        assert_eq!(config.position_space, PositionSpace::World);
        assert_eq!(config.rotation_axis, Axis::Y);
        assert_eq!(
            config.cap_turn_seconds,
            TighteningConfig::default().cap_turn_seconds
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<InteractionConfig>(r#"{ "hold_seconds": 2.0 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn zero_hold_duration_is_invalid() {
        let config = InteractionConfig {
            hold_duration_seconds: 0.0,
            ..InteractionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValueError::NotPositive {
                field: "hold_duration_seconds",
                value: 0.0
            })
        );
    }

    #[test]
    fn negative_durations_are_invalid() {
        let config = TighteningConfig {
            settle_pause_seconds: -1.0,
            ..TighteningConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValueError::Negative {
                field: "settle_pause_seconds",
                ..
            })
        ));
    }
}
