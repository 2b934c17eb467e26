//! Gauge-face center and radius from the largest edge contour.

use crate::config::CenterConfig;
use crate::conic::{fit_ellipse_direct, rms_sampson_distance, Ellipse, MIN_FIT_POINTS};
use crate::edges::Contour;
use crate::error::{DetectionFailure, Result};

/// Located gauge face.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GaugeCenter {
    pub center_x: f64,
    pub center_y: f64,
    /// Mean of the fitted semi-axes, in pixels.
    pub radius: f64,
    /// Fitted face ellipse.
    pub ellipse: Ellipse,
}

impl GaugeCenter {
    /// Center from explicit values, with a circular face ellipse.
    pub fn from_circle(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self {
            center_x,
            center_y,
            radius,
            ellipse: Ellipse {
                cx: center_x,
                cy: center_y,
                a: radius,
                b: radius,
                angle: 0.0,
            },
        }
    }

    pub fn center(&self) -> [f64; 2] {
        [self.center_x, self.center_y]
    }
}

/// Fit an ellipse to the contour of maximum enclosed area.
///
/// Fails with a [`DetectionFailure`] when there is no contour, when the
/// largest one has fewer than five points, when the fit does not produce an
/// ellipse, or when its radius is below `min_radius_px`.
pub fn estimate_center(contours: &[Contour], cfg: &CenterConfig) -> Result<GaugeCenter> {
    let largest = contours
        .iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .ok_or(DetectionFailure::NoContours)?;

    if largest.len() < MIN_FIT_POINTS {
        return Err(DetectionFailure::ContourTooSmall {
            points: largest.len(),
            needed: MIN_FIT_POINTS,
        }
        .into());
    }

    let ellipse = fit_ellipse_direct(&largest.points).ok_or(DetectionFailure::EllipseFitFailed)?;
    let radius = ellipse.mean_radius();
    if !radius.is_finite() || radius < cfg.min_radius_px {
        return Err(DetectionFailure::DegenerateRadius { radius }.into());
    }

    tracing::debug!(
        cx = ellipse.cx,
        cy = ellipse.cy,
        radius,
        points = largest.len(),
        rms = rms_sampson_distance(&ellipse, &largest.points),
        "gauge face fitted"
    );

    Ok(GaugeCenter {
        center_x: ellipse.cx,
        center_y: ellipse.cy,
        radius,
        ellipse,
    })
}
