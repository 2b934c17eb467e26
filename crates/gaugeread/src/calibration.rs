//! Pixel-angle to physical-value mapping.
//!
//! Gauge angles are measured in image coordinates (y down) from the
//! downward direction, turning clockwise on screen: straight down is 0°,
//! left 90°, up 180°, right 270°. Most dials start their scale in the lower
//! left and end in the lower right, which keeps the range monotonic without
//! crossing the 0°/360° seam.

use crate::center::GaugeCenter;
use crate::error::{PreconditionViolation, Result};

/// Static angular and physical range of one gauge model.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaugeScale {
    pub min_angle: f64,
    pub max_angle: f64,
    pub min_value: f64,
    pub max_value: f64,
}

/// Gauge angle of `point` seen from `center`, in `[0, 360)`.
pub fn gauge_angle(center: [f64; 2], point: [f64; 2]) -> f64 {
    let dx = point[0] - center[0];
    let dy = point[1] - center[1];
    (dy.atan2(dx).to_degrees() - 90.0).rem_euclid(360.0)
}

/// Validated mapping from needle tip position to a physical value.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GaugeCalibration {
    center_x: f64,
    center_y: f64,
    radius: f64,
    min_angle: f64,
    max_angle: f64,
    min_value: f64,
    max_value: f64,
}

impl GaugeCalibration {
    /// Combine a located face with an angular/physical range.
    ///
    /// Rejects non-finite inputs, a non-positive radius and a degenerate
    /// angular range so that interpolation can never divide by zero.
    pub fn new(center: &GaugeCenter, scale: &GaugeScale) -> Result<Self> {
        let fields = [
            ("center_x", center.center_x),
            ("center_y", center.center_y),
            ("radius", center.radius),
            ("min_angle", scale.min_angle),
            ("max_angle", scale.max_angle),
            ("min_value", scale.min_value),
            ("max_value", scale.max_value),
        ];
        if let Some(&(field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PreconditionViolation::NonFinite { field }.into());
        }
        if center.radius <= 0.0 {
            return Err(PreconditionViolation::NonPositiveRadius {
                radius: center.radius,
            }
            .into());
        }
        if scale.max_angle == scale.min_angle {
            return Err(PreconditionViolation::DegenerateAngleRange {
                angle: scale.min_angle,
            }
            .into());
        }

        Ok(Self {
            center_x: center.center_x,
            center_y: center.center_y,
            radius: center.radius,
            min_angle: scale.min_angle,
            max_angle: scale.max_angle,
            min_value: scale.min_value,
            max_value: scale.max_value,
        })
    }

    pub fn center(&self) -> [f64; 2] {
        [self.center_x, self.center_y]
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn scale(&self) -> GaugeScale {
        GaugeScale {
            min_angle: self.min_angle,
            max_angle: self.max_angle,
            min_value: self.min_value,
            max_value: self.max_value,
        }
    }

    /// Gauge angle of `tip`, shifted by a full turn when it lies below the
    /// start of the scale.
    pub fn unwrapped_angle(&self, tip: [f64; 2]) -> f64 {
        let angle = gauge_angle(self.center(), tip);
        if angle < self.min_angle {
            angle + 360.0
        } else {
            angle
        }
    }

    /// Physical value for an unwrapped gauge angle, clamped to the scale.
    pub fn value_at_angle(&self, angle: f64) -> f64 {
        if angle <= self.min_angle {
            return self.min_value;
        }
        if angle >= self.max_angle {
            return self.max_value;
        }
        let t = (angle - self.min_angle) / (self.max_angle - self.min_angle);
        t * (self.max_value - self.min_value) + self.min_value
    }

    /// Physical value indicated by a needle tip.
    pub fn value_at(&self, tip: [f64; 2]) -> f64 {
        self.value_at_angle(self.unwrapped_angle(tip))
    }
}
