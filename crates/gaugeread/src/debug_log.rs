//! Per-session log of intermediate images for audit.
//!
//! Frames are appended in pipeline order and encoded as PNG immediately.
//! An encoding failure is remembered, not raised: the reading continues and
//! the failure surfaces when the frames are collected. The log is emptied
//! when it is dropped.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};

use crate::conic::Ellipse;
use crate::error::{GaugeError, Result};
use crate::raster::encode_png;

/// One encoded intermediate image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugFrame {
    /// Pipeline stage that produced the frame.
    pub stage: &'static str,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameFailure {
    stage: &'static str,
    reason: String,
}

/// Ordered, append-only frame log.
#[derive(Debug, Default)]
pub struct DebugFrameLog {
    enabled: bool,
    frames: Vec<DebugFrame>,
    failure: Option<FrameFailure>,
}

impl DebugFrameLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            frames: Vec::new(),
            failure: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Encode and append `image`. No-op when logging is disabled.
    pub fn record(&mut self, stage: &'static str, image: impl FnOnce() -> DynamicImage) {
        if !self.enabled {
            return;
        }
        match encode_png(&image()) {
            Ok(png) => self.frames.push(DebugFrame { stage, png }),
            Err(e) => self.record_failure(stage, e.to_string()),
        }
    }

    pub fn record_gray(&mut self, stage: &'static str, image: &GrayImage) {
        self.record(stage, || DynamicImage::ImageLuma8(image.clone()));
    }

    pub fn record_rgb(&mut self, stage: &'static str, image: &RgbImage) {
        self.record(stage, || DynamicImage::ImageRgb8(image.clone()));
    }

    /// Note a frame that could not be produced. The first failure is kept.
    pub fn record_failure(&mut self, stage: &'static str, reason: String) {
        tracing::warn!(stage, %reason, "debug frame not logged");
        self.failure.get_or_insert(FrameFailure { stage, reason });
    }

    /// Frames logged so far, or the first logging failure.
    pub fn frames(&self) -> Result<&[DebugFrame]> {
        match &self.failure {
            Some(f) => Err(GaugeError::FrameLogging {
                stage: f.stage.to_string(),
                reason: f.reason.clone(),
            }),
            None => Ok(&self.frames),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.failure = None;
    }
}

impl Drop for DebugFrameLog {
    fn drop(&mut self) {
        self.clear();
    }
}

pub(crate) const GREEN: Rgb<u8> = Rgb([0, 200, 0]);
pub(crate) const RED: Rgb<u8> = Rgb([230, 0, 0]);
pub(crate) const BLUE: Rgb<u8> = Rgb([0, 60, 230]);

fn to_i32(p: [f64; 2]) -> (i32, i32) {
    (p[0].round() as i32, p[1].round() as i32)
}

/// Polyline overlay of an ellipse with a dot at its center.
pub(crate) fn draw_ellipse(canvas: &mut RgbImage, e: &Ellipse, color: Rgb<u8>) {
    let pts = e.sample_points(180);
    for (p, q) in pts.iter().zip(pts.iter().cycle().skip(1)) {
        draw_line_segment_mut(
            canvas,
            (p[0] as f32, p[1] as f32),
            (q[0] as f32, q[1] as f32),
            color,
        );
    }
    draw_filled_circle_mut(canvas, to_i32([e.cx, e.cy]), 3, color);
}

pub(crate) fn draw_polyline(canvas: &mut RgbImage, points: &[[f64; 2]], color: Rgb<u8>) {
    for w in points.windows(2) {
        draw_line_segment_mut(
            canvas,
            (w[0][0] as f32, w[0][1] as f32),
            (w[1][0] as f32, w[1][1] as f32),
            color,
        );
    }
}

pub(crate) fn draw_segment(canvas: &mut RgbImage, p: [f64; 2], q: [f64; 2], color: Rgb<u8>) {
    draw_line_segment_mut(
        canvas,
        (p[0] as f32, p[1] as f32),
        (q[0] as f32, q[1] as f32),
        color,
    );
}

pub(crate) fn draw_marker(canvas: &mut RgbImage, p: [f64; 2], radius: i32, color: Rgb<u8>) {
    draw_hollow_circle_mut(canvas, to_i32(p), radius, color);
    draw_filled_circle_mut(canvas, to_i32(p), 2, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::decode;
    use image::Luma;

    #[test]
    fn frames_keep_order_and_decode() {
        let mut log = DebugFrameLog::new(true);
        log.record_gray("edges", &GrayImage::from_pixel(10, 8, Luma([200])));
        let mut rgb = RgbImage::new(12, 12);
        draw_marker(&mut rgb, [6.0, 6.0], 4, RED);
        log.record_rgb("overlay", &rgb);

        let frames = log.frames().expect("no failure");
        let stages: Vec<_> = frames.iter().map(|f| f.stage).collect();
        assert_eq!(stages, ["edges", "overlay"]);
        let back = decode(&frames[1].png).expect("valid png");
        assert_eq!(back.get_pixel(6, 6), &RED);
    }

    #[test]
    fn disabled_log_stays_empty() {
        let mut log = DebugFrameLog::new(false);
        log.record("never", || panic!("image closure must not run"));
        assert!(log.is_empty());
        assert!(log.frames().expect("no failure").is_empty());
    }

    #[test]
    fn failure_is_reported_but_keeps_frames() {
        let mut log = DebugFrameLog::new(true);
        log.record_gray("edges", &GrayImage::new(4, 4));
        log.record_failure("overlay", "encoder unavailable".into());
        log.record_failure("needle", "later failure".into());
        assert_eq!(log.len(), 1);
        match log.frames() {
            Err(GaugeError::FrameLogging { stage, reason }) => {
                assert_eq!(stage, "overlay");
                assert_eq!(reason, "encoder unavailable");
            }
            other => panic!("expected frame logging failure, got {other:?}"),
        }

        log.clear();
        assert!(log.frames().expect("cleared").is_empty());
    }
}
