//! gaugeread — analog gauge reading from still images.
//!
//! A reading runs through these stages:
//!
//! 1. **Edges** – Gaussian smoothing, Canny, optional morphological closing,
//!    external contour extraction.
//! 2. **Center** – direct least-squares ellipse fit on the largest contour.
//! 3. **Keypoints** – optional scale-range calibration from start/end marks
//!    reported by an external detector.
//! 4. **Needle** – probabilistic Hough segments filtered by a radius band
//!    around the face center; the longest survivor is the needle.
//! 5. **Calibration** – tip angle mapped linearly onto the physical scale.
//!
//! Readings can then be scored against per-sensor soft intervals and
//! classified by risk thresholds, see [`AnomalyChecker`].
//!
//! # Public API
//! - [`GaugeSession`] and [`read_gauge`] as primary entry points
//! - [`ReaderConfig`] for tuning the image stages
//! - [`SensorRegistry`] and [`AnomalyChecker`] for scoring

mod anomaly;
mod calibration;
mod center;
mod config;
mod conic;
mod debug_log;
mod edges;
mod error;
mod keypoints;
mod needle;
mod raster;
mod reading;
mod registry;
mod scoring;
mod session;

#[cfg(test)]
mod test_utils;

pub use anomaly::{AnomalyChecker, AuditParameters};
pub use calibration::{gauge_angle, GaugeCalibration, GaugeScale};
pub use center::{estimate_center, GaugeCenter};
pub use config::{
    CenterConfig, EdgeConfig, HoughConfig, KeypointConfig, NeedleBandConfig, NeedleMissPolicy,
    ReaderConfig,
};
pub use conic::Ellipse;
pub use debug_log::{DebugFrame, DebugFrameLog};
pub use edges::{Contour, EdgeStage};
pub use error::{
    ConfigurationError, DetectionFailure, ErrorKind, GaugeError, PreconditionViolation, Result,
};
pub use keypoints::{calibrate_angles, KeypointAngles, KeypointDetector, KeypointSet, StaticKeypoints};
pub use needle::{LineSegment, Needle, NeedleDetection};
pub use reading::{resolve_against_reference, Reading, ReadingSource, ResolvedValue, ValueSource};
pub use registry::{SensorCategoryConfig, SensorRegistry, SENSOR_SCHEMA_V1};
pub use scoring::{
    score_and_classify, Classification, RiskThresholds, ScoreResult, SoftIntervalParams,
};
pub use session::{read_gauge, GaugeReport, GaugeSession};

/// Image-stage building blocks for callers composing their own pipeline.
pub mod stages {
    pub use crate::edges::{edge_map, external_contours, extract, polygon_area};
    pub use crate::needle::{band_fit, detect_needle, detect_segments, select_needle};
    pub use crate::raster::{decode, encode_png, to_gray};
}
