//! Pipeline diagnostics: timing and pixel statistics for each stage.
//!
//! [`transform_with_diagnostics`] runs the same stage sequence as
//! [`transform`](crate::transform) and records how long each stage took
//! plus a few counts that help when tuning thickness and cleanliness.
//!
//! The crate stays free of platform time APIs: callers pass a [`Clock`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::blur::box_blur;
use crate::config::SketchConfig;
use crate::dodge::color_dodge;
use crate::grayscale::to_grayscale;
use crate::invert::invert;
use crate::levels::apply_levels;
use crate::types::{PipelineError, PixelBuffer};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: grayscale conversion.
    pub grayscale: StageDiagnostics,
    /// Stage 2: inversion of the grayscale copy.
    pub invert: StageDiagnostics,
    /// Stage 3: box blur of the inverted copy.
    pub blur: StageDiagnostics,
    /// Stage 4: color-dodge blend.
    pub dodge: StageDiagnostics,
    /// Stage 5: levels adjustment.
    pub levels: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of the final image.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Grayscale conversion metrics.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Mean luminance of the converted image.
        mean_luma: f64,
    },
    /// Inversion metrics.
    Invert {
        /// Number of pixels processed.
        pixel_count: u64,
    },
    /// Box blur metrics.
    Blur {
        /// Thickness after clamping.
        thickness: i32,
        /// Radius derived from the thickness.
        radius: u32,
    },
    /// Color-dodge metrics.
    Dodge {
        /// Pixels whose blend value was 255 (division guard taken).
        saturated_blend_count: u64,
        /// Pixels that came out pure white.
        white_pixel_count: u64,
    },
    /// Levels metrics.
    Levels {
        /// Cleanliness after clamping.
        cleanliness: f64,
        /// White-point threshold derived from cleanliness.
        white_level: f64,
        /// Pixels pushed to pure white by the threshold.
        clipped_pixel_count: u64,
    },
}

/// Summary of the final line art.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Pixels that are not pure white.
    pub ink_pixel_count: u64,
    /// `ink_pixel_count / pixel_count`.
    pub ink_coverage: f64,
}

/// Run the pipeline on a copy of `source`, timing each stage.
///
/// The returned image is byte-identical to [`transform`](crate::transform).
///
/// # Errors
///
/// Returns [`PipelineError::ParameterOutOfRange`] if the config holds a
/// NaN.
pub fn transform_with_diagnostics<C: Clock>(
    source: &PixelBuffer,
    config: &SketchConfig,
    clock: &C,
) -> Result<(PixelBuffer, PipelineDiagnostics), PipelineError> {
    let config = config.clamped()?;
    let dimensions = source.dimensions();
    let pipeline_start = clock.now();

    let start = clock.now();
    let mut gray = source.clone();
    to_grayscale(&mut gray);
    let grayscale = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Grayscale {
            width: dimensions.width,
            height: dimensions.height,
            mean_luma: mean_red(&gray),
        },
    };

    let start = clock.now();
    let mut inverted = gray.clone();
    invert(&mut inverted);
    let invert_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Invert {
            pixel_count: dimensions.pixel_count(),
        },
    };

    let start = clock.now();
    let radius = config.blur_radius();
    box_blur(&mut inverted, radius);
    let blur = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Blur {
            thickness: config.thickness,
            radius,
        },
    };

    let start = clock.now();
    let mut output = source.clone();
    color_dodge(&gray, &inverted, &mut output)?;
    let dodge = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Dodge {
            saturated_blend_count: count_red(&inverted, |v| v == u8::MAX),
            white_pixel_count: count_red(&output, |v| v == u8::MAX),
        },
    };

    let white_level = config.white_level();
    let clipped_pixel_count = count_red(&output, |v| f64::from(v) > white_level);
    let start = clock.now();
    apply_levels(&mut output, config.cleanliness);
    let levels = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Levels {
            cleanliness: config.cleanliness,
            white_level,
            clipped_pixel_count,
        },
    };

    let total_duration = clock.elapsed(&pipeline_start);

    let pixel_count = dimensions.pixel_count();
    let ink_pixel_count = count_red(&output, |v| v < u8::MAX);
    #[allow(clippy::cast_precision_loss)]
    let ink_coverage = ink_pixel_count as f64 / pixel_count as f64;

    let diagnostics = PipelineDiagnostics {
        grayscale,
        invert: invert_diag,
        blur,
        dodge,
        levels,
        total_duration,
        summary: PipelineSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count,
            ink_pixel_count,
            ink_coverage,
        },
    };
    Ok((output, diagnostics))
}

impl PipelineDiagnostics {
    /// Stages in pipeline order, with display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 5] {
        [
            ("Grayscale", &self.grayscale),
            ("Invert", &self.invert),
            ("Blur", &self.blur),
            ("Color Dodge", &self.dodge),
            ("Levels", &self.levels),
        ]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Ink pixels: {}  |  Coverage: {:.1}%",
            self.summary.ink_pixel_count,
            self.summary.ink_coverage * 100.0,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Grayscale {
            width,
            height,
            mean_luma,
        } => format!("{width}x{height} mean luma={mean_luma:.1}"),
        StageMetrics::Invert { pixel_count } => format!("{pixel_count} pixels"),
        StageMetrics::Blur { thickness, radius } => {
            format!("thickness={thickness} radius={radius}")
        }
        StageMetrics::Dodge {
            saturated_blend_count,
            white_pixel_count,
        } => format!("saturated={saturated_blend_count} white={white_pixel_count}"),
        StageMetrics::Levels {
            cleanliness,
            white_level,
            clipped_pixel_count,
        } => format!(
            "cleanliness={cleanliness:.1} level={white_level:.1} clipped={clipped_pixel_count}"
        ),
    }
}

/// Count pixels whose R value satisfies `pred`.
fn count_red(buffer: &PixelBuffer, pred: impl Fn(u8) -> bool) -> u64 {
    buffer.pixels().map(|px| u64::from(pred(px[0]))).sum()
}

/// Mean R value.
#[allow(clippy::cast_precision_loss)]
fn mean_red(buffer: &PixelBuffer) -> f64 {
    let sum: u64 = buffer.pixels().map(|px| u64::from(px[0])).sum();
    sum as f64 / buffer.dimensions().pixel_count() as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Clock that advances one millisecond per reading.
    struct StepClock {
        ticks: Cell<u64>,
    }

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn step_clock() -> StepClock {
        StepClock {
            ticks: Cell::new(0),
        }
    }

    fn edge_image() -> PixelBuffer {
        PixelBuffer::from_fn(8, 8, |x, _| {
            if x < 4 {
                [0, 0, 0, 255]
            } else {
                [255, 255, 255, 255]
            }
        })
        .unwrap()
    }

    #[test]
    fn output_matches_transform() {
        let source = edge_image();
        let config = SketchConfig::new(2, 50.0);
        let (output, _) = transform_with_diagnostics(&source, &config, &step_clock()).unwrap();
        assert_eq!(output, crate::transform(&source, &config).unwrap());
    }

    #[test]
    fn metrics_reflect_clamped_config() {
        let (_, diag) =
            transform_with_diagnostics(&edge_image(), &SketchConfig::new(80, -3.0), &step_clock())
                .unwrap();
        assert!(matches!(
            diag.blur.metrics,
            StageMetrics::Blur {
                thickness: 50,
                radius: 25
            }
        ));
        match diag.levels.metrics {
            StageMetrics::Levels {
                cleanliness,
                white_level,
                ..
            } => {
                assert!(cleanliness.abs() < f64::EPSILON);
                assert!((white_level - 255.0).abs() < f64::EPSILON);
            }
            ref other => unreachable!("unexpected metrics {other:?}"),
        }
    }

    #[test]
    fn summary_counts_ink() {
        // Thickness 2, cleanliness 50: only column 3 stays dark.
        let (_, diag) =
            transform_with_diagnostics(&edge_image(), &SketchConfig::new(2, 50.0), &step_clock())
                .unwrap();
        assert_eq!(diag.summary.pixel_count, 64);
        assert_eq!(diag.summary.ink_pixel_count, 8);
        assert!((diag.summary.ink_coverage - 0.125).abs() < 1e-12);
    }

    #[test]
    fn durations_come_from_the_clock() {
        let (_, diag) =
            transform_with_diagnostics(&edge_image(), &SketchConfig::default(), &step_clock())
                .unwrap();
        for (name, stage) in diag.stages() {
            assert_eq!(stage.duration, Duration::from_millis(1), "{name}");
        }
        assert!(diag.total_duration >= Duration::from_millis(5));
    }

    #[test]
    fn report_lists_every_stage() {
        let (_, diag) =
            transform_with_diagnostics(&edge_image(), &SketchConfig::default(), &step_clock())
                .unwrap();
        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        for name in ["Grayscale", "Invert", "Blur", "Color Dodge", "Levels"] {
            assert!(report.contains(name), "missing {name}");
        }
        assert!(report.contains("Image: 8x8 (64 pixels)"));
    }

    #[test]
    fn diagnostics_serde_round_trip() {
        let (_, diag) =
            transform_with_diagnostics(&edge_image(), &SketchConfig::default(), &step_clock())
                .unwrap();
        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.ink_pixel_count, diag.summary.ink_pixel_count);
        let drift = back.blur.duration.abs_diff(diag.blur.duration);
        assert!(drift < Duration::from_micros(1));
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }
}
