//! Error taxonomy shared by every stage of the reader and the scorer.
//!
//! One enum, [`GaugeError`], carries every failure the crate can surface.
//! Callers branch on [`GaugeError::kind`] to pick a fallback policy: only
//! detection failures are meant to be recovered from, configuration and
//! precondition errors are fatal to the request.

use serde::Serialize;

/// Coarse error class, used by callers to decide on fallback behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Sensor configuration is missing, ambiguous or invalid.
    Configuration,
    /// The gauge face or the needle could not be found in the image.
    Detection,
    /// Calibration inputs would make the angle-to-value mapping degenerate.
    CalibrationPrecondition,
    /// A debug frame could not be encoded for the audit trail.
    FrameLogging,
    /// The input image bytes could not be decoded.
    ImageDecode,
    /// A numeric input was not usable (NaN, infinite, out of domain).
    InvalidInput,
    /// Reading a configuration resource failed.
    Io,
}

/// Configuration lookup and validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// No entry matches the requested `(category, marker_id)` pair.
    #[error("no sensor entry for category '{category}' with {}", marker_label(.marker_id))]
    NotFound {
        category: String,
        marker_id: Option<u32>,
    },
    /// More than one entry matches; the registry never picks one arbitrarily.
    #[error(
        "sensor category '{category}' with {} matches several entries: {}",
        marker_label(.marker_id),
        .entries.join(", ")
    )]
    Ambiguous {
        category: String,
        marker_id: Option<u32>,
        entries: Vec<String>,
    },
    /// A field of an entry failed validation.
    #[error("sensor entry '{entry}': invalid {field}: {reason}")]
    Invalid {
        entry: String,
        field: &'static str,
        reason: String,
    },
    /// The entry is used for gauge reading but has no scale configured.
    #[error("sensor entry '{entry}' has no gauge scale configured")]
    MissingScale { entry: String },
    /// The configuration document declares an unknown schema.
    #[error("unsupported sensor config schema '{found}' (expected '{expected}')")]
    Schema {
        found: String,
        expected: &'static str,
    },
}

fn marker_label(marker_id: &Option<u32>) -> String {
    match marker_id {
        Some(id) => format!("marker id {id}"),
        None => "no marker id".to_string(),
    }
}

/// Reasons a gauge face or needle could not be located.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DetectionFailure {
    /// Edge extraction produced no contour at all.
    #[error("no gauge-face contour found")]
    NoContours,
    /// The largest contour is too short for an ellipse fit.
    #[error("largest contour has {points} points, an ellipse fit needs at least {needed}")]
    ContourTooSmall { points: usize, needed: usize },
    /// The conic fit did not yield a proper ellipse.
    #[error("ellipse fit on the gauge-face contour failed")]
    EllipseFitFailed,
    /// The fitted ellipse is too small to be a gauge face.
    #[error("fitted gauge radius {radius:.3} px is degenerate")]
    DegenerateRadius { radius: f64 },
    /// No line segment survived the radius-band filter.
    #[error("no needle segment inside the radius band ({segments} segments detected)")]
    NoNeedle { segments: usize },
    /// The external keypoint detector returned nothing usable.
    #[error("keypoint detector produced no usable keypoints: {detail}")]
    KeypointsUnavailable { detail: String },
}

/// Calibration inputs that would make interpolation ill-defined.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreconditionViolation {
    #[error("angular range is degenerate (min_angle == max_angle == {angle})")]
    DegenerateAngleRange { angle: f64 },
    #[error("gauge radius must be positive, got {radius}")]
    NonPositiveRadius { radius: f64 },
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("canonical keypoint resolution must be non-zero, got {width}x{height}")]
    ZeroCanonicalResolution { width: u32, height: u32 },
}

/// Every error the crate surfaces.
#[derive(Debug, thiserror::Error)]
pub enum GaugeError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("detection failed: {0}")]
    Detection(#[from] DetectionFailure),

    #[error("calibration precondition violated: {0}")]
    CalibrationPrecondition(#[from] PreconditionViolation),

    #[error("debug frame '{stage}' could not be logged: {reason}")]
    FrameLogging { stage: String, reason: String },

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("input image data is empty")]
    EmptyImage,

    #[error("invalid {what}: {value}")]
    InvalidInput { what: &'static str, value: f64 },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl GaugeError {
    /// Error class for fallback decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::Json(_) => ErrorKind::Configuration,
            Self::Detection(_) => ErrorKind::Detection,
            Self::CalibrationPrecondition(_) => ErrorKind::CalibrationPrecondition,
            Self::FrameLogging { .. } => ErrorKind::FrameLogging,
            Self::ImageDecode(_) | Self::EmptyImage => ErrorKind::ImageDecode,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// The detection failure carried by this error, if any.
    pub fn detection_failure(&self) -> Option<&DetectionFailure> {
        match self {
            Self::Detection(reason) => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T, E = GaugeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_message_names_every_entry() {
        let err = ConfigurationError::Ambiguous {
            category: "pressure".into(),
            marker_id: Some(4),
            entries: vec!["boiler_a".into(), "boiler_b".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("boiler_a"), "{msg}");
        assert!(msg.contains("boiler_b"), "{msg}");
        assert!(msg.contains("marker id 4"), "{msg}");
    }

    #[test]
    fn not_found_without_marker_mentions_it() {
        let err = ConfigurationError::NotFound {
            category: "temperature".into(),
            marker_id: None,
        };
        assert!(err.to_string().contains("no marker id"));
    }

    #[test]
    fn kinds_follow_variants() {
        let e: GaugeError = DetectionFailure::NoNeedle { segments: 3 }.into();
        assert_eq!(e.kind(), ErrorKind::Detection);
        assert!(e.detection_failure().is_some());

        let e: GaugeError = PreconditionViolation::DegenerateAngleRange { angle: 10.0 }.into();
        assert_eq!(e.kind(), ErrorKind::CalibrationPrecondition);
        assert!(e.detection_failure().is_none());

        let e = GaugeError::FrameLogging {
            stage: "edges".into(),
            reason: "encoder".into(),
        };
        assert_eq!(e.kind(), ErrorKind::FrameLogging);
    }
}
