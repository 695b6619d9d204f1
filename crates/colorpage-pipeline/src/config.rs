//! User-facing sketch parameters and their mapping to stage inputs.
//!
//! The two controls are deliberately coarse: `thickness` becomes the
//! box-blur radius, `cleanliness` becomes the levels white point. Any
//! numeric value is accepted and clamped into range; only NaN is
//! rejected.

use serde::{Deserialize, Deserializer, Serialize};

use crate::levels;
use crate::types::PipelineError;

/// Parameters for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Line thickness, `1..=50`. Mapped to a blur radius of
    /// `max(1, thickness / 2)`. Any JSON number is accepted; see
    /// [`SketchConfig::saturating_thickness`].
    #[serde(deserialize_with = "deserialize_thickness")]
    pub thickness: i32,

    /// Background removal strength, `0..=100`. Mapped to a white-point
    /// level of `255 - cleanliness * 1.5`.
    pub cleanliness: f64,
}

impl SketchConfig {
    /// Default line thickness.
    pub const DEFAULT_THICKNESS: i32 = 10;
    /// Default cleanliness; high enough to drop most background shading.
    pub const DEFAULT_CLEANLINESS: f64 = 85.0;

    /// Smallest accepted thickness.
    pub const MIN_THICKNESS: i32 = 1;
    /// Largest accepted thickness.
    pub const MAX_THICKNESS: i32 = 50;
    /// Smallest accepted cleanliness.
    pub const MIN_CLEANLINESS: f64 = levels::MIN_WHITE_POINT;
    /// Largest accepted cleanliness.
    pub const MAX_CLEANLINESS: f64 = levels::MAX_WHITE_POINT;

    /// Create a config from raw (possibly out-of-range) values.
    #[must_use]
    pub const fn new(thickness: i32, cleanliness: f64) -> Self {
        Self {
            thickness,
            cleanliness,
        }
    }

    /// Convert any numeric thickness to `i32`, rounding down and
    /// saturating at the `i32` bounds. NaN becomes 0, which then clamps
    /// to [`MIN_THICKNESS`](Self::MIN_THICKNESS).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn saturating_thickness(value: f64) -> i32 {
        value.floor() as i32
    }

    /// Return a copy with both parameters clamped into range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ParameterOutOfRange`] if `cleanliness`
    /// is NaN. Infinities clamp to the nearest bound.
    pub fn clamped(self) -> Result<Self, PipelineError> {
        if self.cleanliness.is_nan() {
            return Err(PipelineError::ParameterOutOfRange {
                name: "cleanliness",
                value: self.cleanliness,
            });
        }
        Ok(Self {
            thickness: self
                .thickness
                .clamp(Self::MIN_THICKNESS, Self::MAX_THICKNESS),
            cleanliness: self
                .cleanliness
                .clamp(Self::MIN_CLEANLINESS, Self::MAX_CLEANLINESS),
        })
    }

    /// Box-blur radius in pixels for the clamped thickness.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn blur_radius(&self) -> u32 {
        let thickness = if self.thickness < Self::MIN_THICKNESS {
            Self::MIN_THICKNESS
        } else if self.thickness > Self::MAX_THICKNESS {
            Self::MAX_THICKNESS
        } else {
            self.thickness
        };
        let radius = thickness / 2;
        if radius < 1 { 1 } else { radius as u32 }
    }

    /// Levels white-point threshold for the clamped cleanliness.
    #[must_use]
    pub fn white_level(&self) -> f64 {
        levels::white_level(self.cleanliness)
    }
}

fn deserialize_thickness<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    f64::deserialize(deserializer).map(SketchConfig::saturating_thickness)
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THICKNESS, Self::DEFAULT_CLEANLINESS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SketchConfig::default();
        assert_eq!(config.thickness, 10);
        assert!((config.cleanliness - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn radius_is_half_thickness_with_floor_of_one() {
        assert_eq!(SketchConfig::new(1, 0.0).blur_radius(), 1);
        assert_eq!(SketchConfig::new(2, 0.0).blur_radius(), 1);
        assert_eq!(SketchConfig::new(3, 0.0).blur_radius(), 1);
        assert_eq!(SketchConfig::new(10, 0.0).blur_radius(), 5);
        assert_eq!(SketchConfig::new(11, 0.0).blur_radius(), 5);
        assert_eq!(SketchConfig::new(50, 0.0).blur_radius(), 25);
    }

    #[test]
    fn radius_uses_clamped_thickness() {
        assert_eq!(SketchConfig::new(999, 0.0).blur_radius(), 25);
        assert_eq!(SketchConfig::new(-4, 0.0).blur_radius(), 1);
        assert_eq!(SketchConfig::new(i32::MIN, 0.0).blur_radius(), 1);
    }

    #[test]
    fn white_level_spans_105_to_255() {
        assert!((SketchConfig::new(10, 0.0).white_level() - 255.0).abs() < 1e-9);
        assert!((SketchConfig::new(10, 50.0).white_level() - 180.0).abs() < 1e-9);
        assert!((SketchConfig::new(10, 85.0).white_level() - 127.5).abs() < 1e-9);
        assert!((SketchConfig::new(10, 100.0).white_level() - 105.0).abs() < 1e-9);
        assert!((SketchConfig::new(10, 250.0).white_level() - 105.0).abs() < 1e-9);
    }

    #[test]
    fn clamped_pulls_values_into_range() {
        let config = SketchConfig::new(999, -5.0).clamped().unwrap();
        assert_eq!(config, SketchConfig::new(50, 0.0));

        let config = SketchConfig::new(0, f64::INFINITY).clamped().unwrap();
        assert_eq!(config, SketchConfig::new(1, 100.0));
    }

    #[test]
    fn clamped_keeps_in_range_values() {
        let config = SketchConfig::new(7, 42.5);
        assert_eq!(config.clamped().unwrap(), config);
    }

    #[test]
    fn nan_cleanliness_is_rejected() {
        let err = SketchConfig::new(10, f64::NAN).clamped().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ParameterOutOfRange {
                name: "cleanliness",
                ..
            }
        ));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SketchConfig = serde_json::from_str(r#"{"thickness": 4}"#).unwrap();
        assert_eq!(config.thickness, 4);
        assert!((config.cleanliness - SketchConfig::DEFAULT_CLEANLINESS).abs() < f64::EPSILON);
    }

    #[test]
    fn oversized_json_thickness_saturates_then_clamps() {
        let config: SketchConfig = serde_json::from_str(r#"{"thickness": 1e3}"#).unwrap();
        assert_eq!(config.thickness, 1000);
        assert_eq!(config.clamped().unwrap().thickness, 50);

        let config: SketchConfig =
            serde_json::from_str(r#"{"thickness": 99999999999}"#).unwrap();
        assert_eq!(config.thickness, i32::MAX);
        assert_eq!(config.blur_radius(), 25);

        let config: SketchConfig = serde_json::from_str(r#"{"thickness": -1e20}"#).unwrap();
        assert_eq!(config.thickness, i32::MIN);
        assert_eq!(config.clamped().unwrap().thickness, 1);
    }

    #[test]
    fn fractional_thickness_rounds_down() {
        assert_eq!(SketchConfig::saturating_thickness(7.9), 7);
        assert_eq!(SketchConfig::saturating_thickness(-0.5), -1);
        assert_eq!(SketchConfig::saturating_thickness(f64::NAN), 0);
        assert_eq!(SketchConfig::saturating_thickness(f64::INFINITY), i32::MAX);
    }

    #[test]
    fn serde_round_trip() {
        let config = SketchConfig::new(22, 63.5);
        let json = serde_json::to_string(&config).unwrap();
        let back: SketchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
