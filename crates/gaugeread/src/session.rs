//! One-shot gauge reading session over a single image.

use image::{GrayImage, RgbImage};

use crate::calibration::{GaugeCalibration, GaugeScale};
use crate::center::{estimate_center, GaugeCenter};
use crate::config::{NeedleMissPolicy, ReaderConfig};
use crate::debug_log::{self, DebugFrame, DebugFrameLog, BLUE, GREEN, RED};
use crate::edges;
use crate::error::{DetectionFailure, Result};
use crate::keypoints::{calibrate_angles, KeypointDetector, KeypointSet};
use crate::needle::{self, NeedleDetection};
use crate::raster;
use crate::reading::{Reading, ReadingSource};

/// Decoded image plus the per-session calibration state and frame log.
///
/// The angular range starts as the configured static scale; keypoint
/// calibration replaces it for the rest of the session.
#[derive(Debug)]
pub struct GaugeSession {
    image_bytes: Vec<u8>,
    rgb: RgbImage,
    gray: GrayImage,
    static_scale: GaugeScale,
    scale: GaugeScale,
    config: ReaderConfig,
    log: DebugFrameLog,
}

impl GaugeSession {
    /// Decode `image_bytes` and open an empty frame log.
    pub fn open(image_bytes: &[u8], scale: GaugeScale, config: &ReaderConfig) -> Result<Self> {
        let rgb = raster::decode(image_bytes)?;
        let gray = raster::to_gray(&rgb);
        tracing::debug!(
            width = rgb.width(),
            height = rgb.height(),
            "gauge session opened"
        );
        Ok(Self {
            image_bytes: image_bytes.to_vec(),
            rgb,
            gray,
            static_scale: scale,
            scale,
            config: config.clone(),
            log: DebugFrameLog::new(config.debug_frames),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }

    /// Scale currently used for angle-to-value mapping.
    pub fn active_scale(&self) -> GaugeScale {
        self.scale
    }

    /// Locate the gauge face; the angular range stays at the static scale.
    pub fn calibrate(&mut self) -> Result<GaugeCenter> {
        self.scale = self.static_scale;
        self.locate_face()
    }

    /// Locate the gauge face and take the angular range from keypoints.
    pub fn calibrate_with_keypoints(&mut self, keypoints: &KeypointSet) -> Result<GaugeCenter> {
        let center = self.locate_face()?;
        let angles = calibrate_angles(
            keypoints,
            self.dimensions(),
            &center,
            self.config.keypoints.angle_bias_deg,
        )?;
        self.scale = angles.apply_to(&self.static_scale);

        if self.log.is_enabled() {
            let mut overlay = self.rgb.clone();
            debug_log::draw_segment(&mut overlay, center.center(), angles.start_px, GREEN);
            debug_log::draw_segment(&mut overlay, center.center(), angles.end_px, BLUE);
            debug_log::draw_marker(&mut overlay, angles.start_px, 6, GREEN);
            debug_log::draw_marker(&mut overlay, angles.end_px, 6, BLUE);
            debug_log::draw_marker(&mut overlay, center.center(), 4, RED);
            self.log.record_rgb("keypoints", &overlay);
        }
        Ok(center)
    }

    /// Ask `detector` for keypoints on this image, then calibrate with them.
    pub fn calibrate_with_detector(
        &mut self,
        detector: &dyn KeypointDetector,
    ) -> Result<GaugeCenter> {
        let keypoints = detector.detect(&self.image_bytes)?;
        self.calibrate_with_keypoints(&keypoints)
    }

    fn locate_face(&mut self) -> Result<GaugeCenter> {
        let stage = edges::extract(&self.gray, &self.config.edges);
        self.log.record_gray("smoothed", &stage.smoothed);
        self.log.record_gray("edges", &stage.edges);
        if let Some(closed) = &stage.closed {
            self.log.record_gray("edges_closed", closed);
        }
        if self.log.is_enabled() {
            let mut overlay = self.rgb.clone();
            for c in &stage.contours {
                debug_log::draw_polyline(&mut overlay, &c.points, GREEN);
            }
            self.log.record_rgb("contours", &overlay);
        }

        let center = estimate_center(&stage.contours, &self.config.center)?;
        tracing::info!(
            "gauge center ({:.1}, {:.1}), radius {:.1}",
            center.center_x,
            center.center_y,
            center.radius
        );

        if self.log.is_enabled() {
            let mut overlay = self.rgb.clone();
            debug_log::draw_ellipse(&mut overlay, &center.ellipse, RED);
            self.log.record_rgb("gauge_face", &overlay);
        }
        Ok(center)
    }

    /// Read the needle around `center` and map it to a physical value.
    ///
    /// With [`NeedleMissPolicy::Fail`] a missing needle is a
    /// [`DetectionFailure::NoNeedle`]; with `ClampToMin` the reading reports
    /// the scale minimum and says so in its `source`.
    pub fn get_current_value(&mut self, center: &GaugeCenter) -> Result<Reading> {
        let calibration = GaugeCalibration::new(center, &self.scale)?;

        let edge_map = edges::edge_map(&self.gray, &self.config.edges);
        self.log.record_gray("needle_edges", &edge_map);

        let detection = needle::detect_needle(
            &edge_map,
            center,
            &self.config.hough,
            &self.config.needle_band,
        );
        self.record_needle(&detection, &calibration);

        let Some(found) = detection.needle else {
            return match self.config.needle_miss {
                NeedleMissPolicy::Fail => Err(DetectionFailure::NoNeedle {
                    segments: detection.segments.len(),
                }
                .into()),
                NeedleMissPolicy::ClampToMin => {
                    tracing::warn!(
                        segments = detection.segments.len(),
                        "no needle found, reporting scale minimum"
                    );
                    Ok(Reading {
                        value: self.scale.min_value,
                        tip: None,
                        gauge_angle: None,
                        source: ReadingSource::ClampedNoNeedle,
                    })
                }
            };
        };

        let angle = calibration.unwrapped_angle(found.tip);
        let value = calibration.value_at_angle(angle);
        tracing::info!("gauge angle {angle:.2}°, value {value:.3}");
        Ok(Reading {
            value,
            tip: Some(found.tip),
            gauge_angle: Some(angle),
            source: ReadingSource::Needle,
        })
    }

    fn record_needle(&mut self, detection: &NeedleDetection, calibration: &GaugeCalibration) {
        if !self.log.is_enabled() {
            return;
        }
        let mut overlay = self.rgb.clone();
        for s in &detection.segments {
            let [p, q] = s.endpoints();
            debug_log::draw_segment(&mut overlay, p, q, BLUE);
        }
        self.log.record_rgb("segments", &overlay);

        if let Some(n) = &detection.needle {
            let mut overlay = self.rgb.clone();
            debug_log::draw_segment(&mut overlay, calibration.center(), n.tip, GREEN);
            debug_log::draw_marker(&mut overlay, n.tip, 3, RED);
            self.log.record_rgb("needle", &overlay);
        }
    }

    /// Frames logged so far, or the first frame that failed to log.
    pub fn debug_frames(&self) -> Result<&[DebugFrame]> {
        self.log.frames()
    }

    /// End the session; the frame log is released with it.
    pub fn close(self) {}
}

/// Result of a complete reading.
#[derive(Debug, Clone)]
pub struct GaugeReport {
    pub center: GaugeCenter,
    /// Scale used for the reading (keypoint angles when available).
    pub scale: GaugeScale,
    pub reading: Reading,
    pub frames: Vec<DebugFrame>,
    /// Set when the audit trail is incomplete; the reading is still valid.
    pub frame_logging_error: Option<String>,
}

/// Open a session, calibrate (with keypoints when given), read the needle.
pub fn read_gauge(
    image_bytes: &[u8],
    scale: GaugeScale,
    keypoints: Option<&KeypointSet>,
    config: &ReaderConfig,
) -> Result<GaugeReport> {
    let mut session = GaugeSession::open(image_bytes, scale, config)?;
    let center = match keypoints {
        Some(kp) => session.calibrate_with_keypoints(kp)?,
        None => session.calibrate()?,
    };
    let reading = session.get_current_value(&center)?;

    let (frames, frame_logging_error) = match session.debug_frames() {
        Ok(frames) => (frames.to_vec(), None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };
    Ok(GaugeReport {
        center,
        scale: session.active_scale(),
        reading,
        frames,
        frame_logging_error,
    })
}
