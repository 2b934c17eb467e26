//! Scale-range calibration from detector keypoints.
//!
//! An external detector reports the start and end marks of the printed scale
//! in its own canonical input resolution. The points are mapped back into the
//! working image and turned into gauge angles around the located center.

use crate::calibration::{gauge_angle, GaugeScale};
use crate::center::GaugeCenter;
use crate::error::{PreconditionViolation, Result};

/// Start/end scale marks in the detector's canonical pixel space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeypointSet {
    pub start: [f64; 2],
    pub end: [f64; 2],
    /// `[width, height]` of the image the detector saw.
    pub canonical_resolution: [u32; 2],
}

impl KeypointSet {
    /// Keypoints rescaled independently per axis into a `width × height`
    /// image.
    pub fn rescaled(&self, width: u32, height: u32) -> Result<([f64; 2], [f64; 2])> {
        let [cw, ch] = self.canonical_resolution;
        if cw == 0 || ch == 0 {
            return Err(PreconditionViolation::ZeroCanonicalResolution {
                width: cw,
                height: ch,
            }
            .into());
        }
        let sx = f64::from(width) / f64::from(cw);
        let sy = f64::from(height) / f64::from(ch);
        Ok((
            [self.start[0] * sx, self.start[1] * sy],
            [self.end[0] * sx, self.end[1] * sy],
        ))
    }
}

/// External keypoint model. Blocking; the reader never looks inside it.
pub trait KeypointDetector {
    fn detect(&self, image_bytes: &[u8]) -> Result<KeypointSet>;
}

/// Detector output computed ahead of time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticKeypoints(pub KeypointSet);

impl KeypointDetector for StaticKeypoints {
    fn detect(&self, _image_bytes: &[u8]) -> Result<KeypointSet> {
        Ok(self.0)
    }
}

/// Angular range derived from keypoints.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeypointAngles {
    pub min_angle: f64,
    pub max_angle: f64,
    /// Rescaled start point in image pixels.
    pub start_px: [f64; 2],
    /// Rescaled end point in image pixels.
    pub end_px: [f64; 2],
}

impl KeypointAngles {
    /// `scale` with its angular range replaced by the keypoint angles.
    pub fn apply_to(&self, scale: &GaugeScale) -> GaugeScale {
        GaugeScale {
            min_angle: self.min_angle,
            max_angle: self.max_angle,
            ..*scale
        }
    }
}

/// Gauge angles of the scale marks around `center`.
///
/// The end angle is lifted by 360° when it falls below the start angle, then
/// `bias_deg` is added to both ends.
pub fn calibrate_angles(
    keypoints: &KeypointSet,
    image_size: (u32, u32),
    center: &GaugeCenter,
    bias_deg: f64,
) -> Result<KeypointAngles> {
    let (start_px, end_px) = keypoints.rescaled(image_size.0, image_size.1)?;
    let c = center.center();

    let start = gauge_angle(c, start_px);
    let mut end = gauge_angle(c, end_px);
    if end < start {
        end += 360.0;
    }
    if end == start {
        return Err(PreconditionViolation::DegenerateAngleRange { angle: start }.into());
    }

    let angles = KeypointAngles {
        min_angle: start + bias_deg,
        max_angle: end + bias_deg,
        start_px,
        end_px,
    };
    tracing::info!(
        min_angle = angles.min_angle,
        max_angle = angles.max_angle,
        "keypoint calibration"
    );
    Ok(angles)
}
