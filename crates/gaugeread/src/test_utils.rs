//! Synthetic dial rendering shared by the pipeline tests.

use image::{DynamicImage, Rgb, RgbImage};

use crate::config::ReaderConfig;

/// Dark rim and needle on a light face.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SyntheticDial {
    pub size: u32,
    pub center: [f64; 2],
    pub outer_radius: f64,
    pub rim_width: f64,
    /// Gauge angle of the needle, degrees (0 = down, 180 = up).
    pub needle_angle: f64,
    /// Needle extent as fractions of `outer_radius`.
    pub needle_from: f64,
    pub needle_to: f64,
    pub needle_half_width: f64,
}

impl Default for SyntheticDial {
    fn default() -> Self {
        Self {
            size: 300,
            center: [150.0, 150.0],
            outer_radius: 120.0,
            rim_width: 6.0,
            needle_angle: 180.0,
            needle_from: 0.12,
            needle_to: 0.8,
            needle_half_width: 3.5,
        }
    }
}

impl SyntheticDial {
    pub fn needle_tip(&self) -> [f64; 2] {
        self.point_at(self.needle_to * self.outer_radius)
    }

    fn point_at(&self, dist: f64) -> [f64; 2] {
        let t = (self.needle_angle + 90.0).to_radians();
        [
            self.center[0] + dist * t.cos(),
            self.center[1] + dist * t.sin(),
        ]
    }

    pub fn render(&self) -> RgbImage {
        let face = Rgb([245, 245, 240]);
        let ink = Rgb([20, 20, 25]);
        let hub = self.point_at(self.needle_from * self.outer_radius);
        let tip = self.needle_tip();
        let inner = self.outer_radius - self.rim_width;

        RgbImage::from_fn(self.size, self.size, |x, y| {
            let p = [f64::from(x), f64::from(y)];
            let d = (p[0] - self.center[0]).hypot(p[1] - self.center[1]);
            let on_rim = d >= inner && d <= self.outer_radius;
            let on_needle = distance_to_segment(p, hub, tip) <= self.needle_half_width;
            if on_rim || on_needle {
                ink
            } else {
                face
            }
        })
    }

    pub fn png(&self) -> Vec<u8> {
        crate::raster::encode_png(&DynamicImage::ImageRgb8(self.render()))
            .expect("synthetic dial encodes")
    }
}

fn distance_to_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let (vx, vy) = (b[0] - a[0], b[1] - a[1]);
    let len2 = vx * vx + vy * vy;
    let t = if len2 > 0.0 {
        (((p[0] - a[0]) * vx + (p[1] - a[1]) * vy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p[0] - a[0] - t * vx).hypot(p[1] - a[1] - t * vy)
}

/// Reader settings for the 300 px synthetic dial: fewer Hough votes, since
/// the needle is far shorter than on camera frames.
pub(crate) fn synthetic_config() -> ReaderConfig {
    let mut cfg = ReaderConfig::with_debug_frames();
    cfg.hough.threshold = 30;
    cfg
}
