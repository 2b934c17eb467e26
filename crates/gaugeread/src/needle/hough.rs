//! Progressive probabilistic Hough transform (Matas, Galambos & Kittler).
//!
//! Edge pixels are visited in random order. Each one votes for every
//! quantized `(theta, rho)` line through it; as soon as a bin reaches the
//! threshold, the line is traced through the edge mask in both directions
//! tolerating gaps of up to `max_line_gap` pixels. Traced pixels leave the
//! mask, and when the segment is long enough their votes are withdrawn.

use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::HoughConfig;

/// Detected segment with integer pixel endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LineSegment {
    pub p0: [i32; 2],
    pub p1: [i32; 2],
}

impl LineSegment {
    pub fn length(&self) -> f64 {
        let dx = f64::from(self.p1[0] - self.p0[0]);
        let dy = f64::from(self.p1[1] - self.p0[1]);
        dx.hypot(dy)
    }

    pub fn endpoints(&self) -> [[f64; 2]; 2] {
        [
            [f64::from(self.p0[0]), f64::from(self.p0[1])],
            [f64::from(self.p1[0]), f64::from(self.p1[1])],
        ]
    }
}

const SHIFT: u32 = 16;

/// Run the transform over the non-zero pixels of `edges`.
pub fn detect_segments(edges: &GrayImage, cfg: &HoughConfig) -> Vec<LineSegment> {
    let (w, h) = edges.dimensions();
    let (width, height) = (w as i32, h as i32);
    if width == 0 || height == 0 || cfg.rho <= 0.0 || cfg.theta_deg <= 0.0 {
        return Vec::new();
    }

    let theta = cfg.theta_deg.to_radians();
    let irho = 1.0 / cfg.rho;
    let num_angle = ((std::f64::consts::PI / theta).round() as usize).max(1);
    let num_rho = ((f64::from(width + height) * 2.0 + 1.0) / cfg.rho).round() as usize;
    let rho_offset = (num_rho as i64 - 1) / 2;
    let trig: Vec<(f64, f64)> = (0..num_angle)
        .map(|n| {
            let a = n as f64 * theta;
            (a.cos() * irho, a.sin() * irho)
        })
        .collect();

    let mut accum = Accumulator {
        votes: vec![0i32; num_angle * num_rho],
        num_rho,
        rho_offset,
    };

    let mut mask = vec![false; (w * h) as usize];
    let mut points: Vec<(i32, i32)> = Vec::new();
    for (x, y, p) in edges.enumerate_pixels() {
        if p.0[0] != 0 {
            mask[(y * w + x) as usize] = true;
            points.push((x as i32, y as i32));
        }
    }
    let at = |x: i32, y: i32| (y * width + x) as usize;

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut lines = Vec::new();
    let threshold = cfg.threshold.max(1) as i32;
    let min_len = cfg.min_line_length as i32;

    let mut remaining = points.len();
    while remaining > 0 {
        let idx = rng.gen_range(0..remaining);
        let (px, py) = points[idx];
        points.swap(idx, remaining - 1);
        remaining -= 1;

        if !mask[at(px, py)] {
            continue;
        }

        let mut max_val = threshold - 1;
        let mut max_n = 0;
        for (n, &(c, s)) in trig.iter().enumerate() {
            let v = accum.vote(n, px, py, c, s);
            if v > max_val {
                max_val = v;
                max_n = n;
            }
        }
        if max_val < threshold {
            continue;
        }

        // Walk along the line direction, perpendicular to the normal.
        let (c, s) = trig[max_n];
        let (a, b) = (-s, c);
        let walk = Walk::new(px, py, a, b);

        let mut ends = [(px, py); 2];
        for (k, end) in ends.iter_mut().enumerate() {
            let mut gap = 0;
            for (x, y) in walk.steps(k == 1) {
                if x < 0 || x >= width || y < 0 || y >= height {
                    break;
                }
                if mask[at(x, y)] {
                    gap = 0;
                    *end = (x, y);
                } else {
                    gap += 1;
                    if gap > cfg.max_line_gap {
                        break;
                    }
                }
            }
        }

        let good = (ends[1].0 - ends[0].0).abs() >= min_len
            || (ends[1].1 - ends[0].1).abs() >= min_len;

        for (k, &end) in ends.iter().enumerate() {
            for (x, y) in walk.steps(k == 1) {
                if x < 0 || x >= width || y < 0 || y >= height {
                    break;
                }
                let i = at(x, y);
                if mask[i] {
                    if good {
                        for (n, &(c, s)) in trig.iter().enumerate() {
                            accum.unvote(n, x, y, c, s);
                        }
                    }
                    mask[i] = false;
                }
                if (x, y) == end {
                    break;
                }
            }
        }

        if good {
            lines.push(LineSegment {
                p0: [ends[0].0, ends[0].1],
                p1: [ends[1].0, ends[1].1],
            });
            if cfg.max_lines.is_some_and(|cap| lines.len() >= cap) {
                break;
            }
        }
    }

    tracing::debug!(
        segments = lines.len(),
        edge_pixels = points.len(),
        "probabilistic hough"
    );
    lines
}

/// Vote counts per `(theta, rho)` bin. Withdrawing a traced segment also
/// removes pixels that never voted, so counts may go negative.
struct Accumulator {
    votes: Vec<i32>,
    num_rho: usize,
    rho_offset: i64,
}

impl Accumulator {
    fn bin(&self, n: usize, x: i32, y: i32, c: f64, s: f64) -> Option<usize> {
        let r = (f64::from(x) * c + f64::from(y) * s).round() as i64 + self.rho_offset;
        (0..self.num_rho as i64)
            .contains(&r)
            .then(|| n * self.num_rho + r as usize)
    }

    fn vote(&mut self, n: usize, x: i32, y: i32, c: f64, s: f64) -> i32 {
        match self.bin(n, x, y, c, s) {
            Some(i) => {
                self.votes[i] += 1;
                self.votes[i]
            }
            None => i32::MIN,
        }
    }

    fn unvote(&mut self, n: usize, x: i32, y: i32, c: f64, s: f64) {
        if let Some(i) = self.bin(n, x, y, c, s) {
            self.votes[i] -= 1;
        }
    }
}

/// Fixed-point pixel walk along a line direction, stepping one pixel along
/// the dominant axis.
#[derive(Clone, Copy)]
struct Walk {
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
    x_major: bool,
}

impl Walk {
    fn new(px: i32, py: i32, a: f64, b: f64) -> Self {
        let half = 1i64 << (SHIFT - 1);
        let one = f64::from(1u32 << SHIFT);
        if a.abs() > b.abs() {
            Self {
                x0: i64::from(px),
                y0: (i64::from(py) << SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one / a.abs()).round() as i64,
                x_major: true,
            }
        } else {
            Self {
                x0: (i64::from(px) << SHIFT) + half,
                y0: i64::from(py),
                dx: (a * one / b.abs()).round() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    /// Pixels starting at the seed point, forwards or backwards.
    fn steps(self, backwards: bool) -> impl Iterator<Item = (i32, i32)> {
        let (dx, dy) = if backwards {
            (-self.dx, -self.dy)
        } else {
            (self.dx, self.dy)
        };
        (0i64..).map(move |k| {
            let x = self.x0 + k * dx;
            let y = self.y0 + k * dy;
            if self.x_major {
                (x as i32, (y >> SHIFT) as i32)
            } else {
                ((x >> SHIFT) as i32, y as i32)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_line_segment_mut;

    fn cfg(threshold: u32) -> HoughConfig {
        HoughConfig {
            threshold,
            ..HoughConfig::default()
        }
    }

    fn blank() -> GrayImage {
        GrayImage::new(120, 100)
    }

    #[test]
    fn finds_a_vertical_segment() {
        let mut img = blank();
        for y in 10..90 {
            img.put_pixel(40, y, Luma([255]));
        }
        let lines = detect_segments(&img, &cfg(30));
        assert_eq!(lines.len(), 1);
        let l = lines[0];
        assert_eq!(l.p0[0], 40);
        assert_eq!(l.p1[0], 40);
        let (lo, hi) = (l.p0[1].min(l.p1[1]), l.p0[1].max(l.p1[1]));
        assert_eq!((lo, hi), (10, 89));
        assert!((l.length() - 79.0).abs() < 1e-9);
    }

    #[test]
    fn bridges_small_gaps_but_not_large_ones() {
        let mut img = blank();
        for x in 5..50 {
            img.put_pixel(x, 30, Luma([255]));
        }
        // 6 px gap: bridged.
        for x in 56..110 {
            img.put_pixel(x, 30, Luma([255]));
        }
        let lines = detect_segments(&img, &cfg(25));
        assert_eq!(lines.len(), 1);
        let xs = (lines[0].p0[0].min(lines[0].p1[0]), lines[0].p0[0].max(lines[0].p1[0]));
        assert_eq!(xs, (5, 109));

        let mut img = blank();
        for x in 5..45 {
            img.put_pixel(x, 30, Luma([255]));
        }
        // 30 px gap: never traced as one segment.
        for x in 75..115 {
            img.put_pixel(x, 30, Luma([255]));
        }
        let lines = detect_segments(&img, &cfg(25));
        assert!(!lines.is_empty());
        for l in &lines {
            assert!((l.p0[0] - l.p1[0]).abs() < 45, "{l:?} spans the gap");
        }
    }

    #[test]
    fn diagonal_segment_endpoints() {
        let mut img = blank();
        draw_line_segment_mut(&mut img, (20.0, 15.0), (80.0, 75.0), Luma([255]));
        // 1° bins put the 45° line exactly on a bin center.
        let fine = HoughConfig {
            theta_deg: 1.0,
            ..cfg(30)
        };
        let lines = detect_segments(&img, &fine);
        assert_eq!(lines.len(), 1);
        let best = lines[0];
        assert!(best.length() > 80.0, "length {}", best.length());
        for [x, y] in best.endpoints() {
            assert!((x - y - 5.0).abs() <= 2.0, "endpoint ({x}, {y}) off the diagonal");
        }
    }

    #[test]
    fn sparse_noise_produces_nothing() {
        let mut img = blank();
        for i in 0..20u32 {
            img.put_pixel((i * 37) % 120, (i * 53) % 100, Luma([255]));
        }
        assert!(detect_segments(&img, &cfg(15)).is_empty());
        assert!(detect_segments(&blank(), &cfg(15)).is_empty());
    }

    #[test]
    fn same_seed_same_result_and_cap() {
        let mut img = blank();
        for y in 5..95 {
            img.put_pixel(20, y, Luma([255]));
            img.put_pixel(90, y, Luma([255]));
        }
        let a = detect_segments(&img, &cfg(30));
        let b = detect_segments(&img, &cfg(30));
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);

        let capped = HoughConfig {
            max_lines: Some(1),
            ..cfg(30)
        };
        assert_eq!(detect_segments(&img, &capped).len(), 1);
    }
}
