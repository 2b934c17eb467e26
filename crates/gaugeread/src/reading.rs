//! Gauge readings and their reconciliation with an external reference value.

use crate::error::{ErrorKind, GaugeError, Result};

/// How a reading's value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    /// Interpolated from a detected needle tip.
    Needle,
    /// No needle found; the lower end of the scale was reported on request.
    ClampedNoNeedle,
}

/// Value read from one gauge image.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Reading {
    pub value: f64,
    /// Needle tip in image pixels.
    pub tip: Option<[f64; 2]>,
    /// Unwrapped gauge angle of the tip, degrees.
    pub gauge_angle: Option<f64>,
    pub source: ReadingSource,
}

/// Origin of a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Detected,
    /// Detection failed; the reference value was used.
    ReferenceNoDetection,
    /// The detected value disagreed with the reference beyond tolerance.
    ReferenceOutOfTolerance,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ResolvedValue {
    pub value: f64,
    pub source: ValueSource,
    /// The detected value when one was available.
    pub detected: Option<f64>,
}

/// Accept `detected` when it lies within `reference·(1 ± tolerance)`,
/// otherwise fall back to `reference`.
///
/// Only detection failures are replaced; every other error is returned
/// unchanged. A clamped no-needle reading counts as a failed detection.
pub fn resolve_against_reference(
    detected: Result<Reading>,
    reference: f64,
    tolerance: f64,
) -> Result<ResolvedValue> {
    if !reference.is_finite() {
        return Err(GaugeError::InvalidInput {
            what: "reference value",
            value: reference,
        });
    }
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(GaugeError::InvalidInput {
            what: "value tolerance",
            value: tolerance,
        });
    }

    let reading = match detected {
        Ok(r) if r.source == ReadingSource::Needle => r,
        Ok(_) => {
            return Ok(ResolvedValue {
                value: reference,
                source: ValueSource::ReferenceNoDetection,
                detected: None,
            })
        }
        Err(e) if e.kind() == ErrorKind::Detection => {
            tracing::info!(error = %e, reference, "detection failed, using reference value");
            return Ok(ResolvedValue {
                value: reference,
                source: ValueSource::ReferenceNoDetection,
                detected: None,
            });
        }
        Err(e) => return Err(e),
    };

    let a = reference * (1.0 - tolerance);
    let b = reference * (1.0 + tolerance);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if (lo..=hi).contains(&reading.value) {
        Ok(ResolvedValue {
            value: reading.value,
            source: ValueSource::Detected,
            detected: Some(reading.value),
        })
    } else {
        tracing::info!(
            detected = reading.value,
            reference,
            tolerance,
            "detected value outside tolerance, using reference value"
        );
        Ok(ResolvedValue {
            value: reference,
            source: ValueSource::ReferenceOutOfTolerance,
            detected: Some(reading.value),
        })
    }
}
