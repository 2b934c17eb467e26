//! Tuning parameters for the gauge reader.
//!
//! Defaults reproduce the behaviour the reader was tuned with on the
//! inspection robot's camera: 9×9-equivalent Gaussian smoothing, Canny
//! thresholds 50/150, a 7×7 closing element, and a coarse probabilistic Hough
//! transform (2 px / 2°, 90 votes).

use std::path::Path;

use crate::error::Result;

/// Edge map and contour extraction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Gaussian sigma applied to the grayscale image before Canny.
    pub blur_sigma: f32,
    /// Canny hysteresis low threshold.
    pub canny_low: f32,
    /// Canny hysteresis high threshold.
    pub canny_high: f32,
    /// Also trace contours on a morphologically closed edge map.
    pub use_closing: bool,
    /// Chebyshev radius of the closing element (3 → 7×7).
    pub close_radius: u8,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.7,
            canny_low: 50.0,
            canny_high: 150.0,
            use_closing: true,
            close_radius: 3,
        }
    }
}

/// Gauge-face center estimation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CenterConfig {
    /// Smallest fitted radius (px) accepted as a gauge face.
    pub min_radius_px: f64,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self { min_radius_px: 1.0 }
    }
}

/// Progressive probabilistic Hough transform.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    /// Distance resolution of the accumulator (px).
    pub rho: f64,
    /// Angle resolution of the accumulator (degrees).
    pub theta_deg: f64,
    /// Minimum accumulator votes before a line is traced.
    pub threshold: u32,
    /// Minimum segment extent along either axis (px).
    pub min_line_length: u32,
    /// Maximum run of missing edge pixels bridged while tracing (px).
    pub max_line_gap: u32,
    /// Optional cap on the number of segments returned.
    pub max_lines: Option<usize>,
    /// Seed for the random point ordering.
    pub seed: u64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            rho: 2.0,
            theta_deg: 2.0,
            threshold: 90,
            min_line_length: 5,
            max_line_gap: 10,
            max_lines: None,
            seed: 0x6761_7567,
        }
    }
}

/// Radius band a needle segment must span, as fractions of the gauge radius.
///
/// The endpoint nearer to the center must satisfy
/// `near_min·r < d1 < near_max·r`, the farther one
/// `far_min·r < d2 < far_max·r`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NeedleBandConfig {
    pub near_min: f64,
    pub near_max: f64,
    pub far_min: f64,
    pub far_max: f64,
}

impl Default for NeedleBandConfig {
    fn default() -> Self {
        Self {
            near_min: 0.05,
            near_max: 0.3,
            far_min: 0.5,
            far_max: 1.05,
        }
    }
}

/// What a reading reports when no needle segment survives the band filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedleMissPolicy {
    /// Surface `DetectionFailure::NoNeedle`.
    #[default]
    Fail,
    /// Report the lower end of the scale, marked as clamped.
    ClampToMin,
}

/// Keypoint calibration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct KeypointConfig {
    /// Offset (degrees) added to both keypoint angles to compensate the
    /// detector's systematic bias.
    pub angle_bias_deg: f64,
}

impl Default for KeypointConfig {
    fn default() -> Self {
        Self {
            angle_bias_deg: -2.0,
        }
    }
}

/// Complete reader configuration.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub edges: EdgeConfig,
    pub center: CenterConfig,
    pub hough: HoughConfig,
    pub needle_band: NeedleBandConfig,
    pub keypoints: KeypointConfig,
    pub needle_miss: NeedleMissPolicy,
    /// Record intermediate images for audit.
    pub debug_frames: bool,
}

impl ReaderConfig {
    /// Load a configuration from JSON; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Defaults with debug frame logging switched on.
    pub fn with_debug_frames() -> Self {
        Self {
            debug_frames: true,
            ..Self::default()
        }
    }
}
