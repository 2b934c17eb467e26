//! Needle localisation.
//!
//! Line segments from the probabilistic Hough transform are kept only when
//! one end sits near the hub and the other reaches out toward the rim. The
//! longest survivor is the needle; its far end is the tip.

mod hough;

pub use hough::{detect_segments, LineSegment};

use image::GrayImage;

use crate::center::GaugeCenter;
use crate::config::{HoughConfig, NeedleBandConfig};

/// Chosen needle segment.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Needle {
    pub segment: LineSegment,
    /// Endpoint farther from the center.
    pub tip: [f64; 2],
    /// Distance of the near endpoint from the center (px).
    pub near_distance: f64,
    /// Distance of the tip from the center (px).
    pub far_distance: f64,
}

/// All detected segments plus the chosen needle, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedleDetection {
    pub segments: Vec<LineSegment>,
    pub needle: Option<Needle>,
}

/// Near/far endpoint distances and the far endpoint, if `segment` lies in
/// the band around `center`.
pub fn band_fit(
    segment: &LineSegment,
    center: &GaugeCenter,
    band: &NeedleBandConfig,
) -> Option<Needle> {
    let c = center.center();
    let [p, q] = segment.endpoints();
    let dp = (p[0] - c[0]).hypot(p[1] - c[1]);
    let dq = (q[0] - c[0]).hypot(q[1] - c[1]);
    let (near, far, tip) = if dp > dq { (dq, dp, p) } else { (dp, dq, q) };

    let r = center.radius;
    let near_ok = band.near_min * r < near && near < band.near_max * r;
    let far_ok = band.far_min * r < far && far < band.far_max * r;
    (near_ok && far_ok).then_some(Needle {
        segment: *segment,
        tip,
        near_distance: near,
        far_distance: far,
    })
}

/// Longest segment inside the band.
pub fn select_needle(
    segments: &[LineSegment],
    center: &GaugeCenter,
    band: &NeedleBandConfig,
) -> Option<Needle> {
    segments
        .iter()
        .filter_map(|s| band_fit(s, center, band))
        .max_by(|a, b| a.segment.length().total_cmp(&b.segment.length()))
}

/// Hough segments on `edges` and the needle chosen among them.
pub fn detect_needle(
    edges: &GrayImage,
    center: &GaugeCenter,
    hough: &HoughConfig,
    band: &NeedleBandConfig,
) -> NeedleDetection {
    let segments = detect_segments(edges, hough);
    let needle = select_needle(&segments, center, band);
    match &needle {
        Some(n) => tracing::debug!(
            tip_x = n.tip[0],
            tip_y = n.tip[1],
            length = n.segment.length(),
            candidates = segments.len(),
            "needle selected"
        ),
        None => tracing::debug!(candidates = segments.len(), "no segment inside radius band"),
    }
    NeedleDetection { segments, needle }
}
