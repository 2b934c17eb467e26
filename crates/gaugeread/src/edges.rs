//! Edge map and external contour extraction for the gauge face.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;

use crate::config::EdgeConfig;

/// Closed boundary polyline in image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<[f64; 2]>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area of the polyline, treated as a closed polygon.
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }
}

/// Intermediate images and contours of the edge stage.
#[derive(Debug, Clone)]
pub struct EdgeStage {
    pub smoothed: GrayImage,
    pub edges: GrayImage,
    /// Edge map after morphological closing, when enabled.
    pub closed: Option<GrayImage>,
    pub contours: Vec<Contour>,
}

/// Smooth → Canny → external contours, optionally repeated on a closed edge
/// map. The contour set is the union of both passes and may be empty.
pub fn extract(gray: &GrayImage, cfg: &EdgeConfig) -> EdgeStage {
    let smoothed = smooth(gray, cfg);
    let edges = canny(&smoothed, cfg.canny_low, cfg.canny_high);
    let mut contours = external_contours(&edges);

    let closed = cfg.use_closing.then(|| close(&edges, Norm::LInf, cfg.close_radius));
    if let Some(closed) = &closed {
        contours.extend(external_contours(closed));
    }

    tracing::debug!(
        contours = contours.len(),
        closing = cfg.use_closing,
        "edge contours extracted"
    );

    EdgeStage {
        smoothed,
        edges,
        closed,
        contours,
    }
}

/// Canny edge map of the smoothed image; the needle detector votes on it.
pub fn edge_map(gray: &GrayImage, cfg: &EdgeConfig) -> GrayImage {
    canny(&smooth(gray, cfg), cfg.canny_low, cfg.canny_high)
}

fn smooth(gray: &GrayImage, cfg: &EdgeConfig) -> GrayImage {
    if cfg.blur_sigma > 0.0 {
        gaussian_blur_f32(gray, cfg.blur_sigma)
    } else {
        gray.clone()
    }
}

/// Outer borders without a parent, i.e. contours not nested in any hole.
pub fn external_contours(edges: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour {
            points: c
                .points
                .iter()
                .map(|p| [f64::from(p.x), f64::from(p.y)])
                .collect(),
        })
        .collect()
}

/// Shoelace area of a closed polygon (absolute value).
pub fn polygon_area(points: &[[f64; 2]]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p[0] * q[1] - q[0] * p[1])
        .sum();
    0.5 * twice.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;
    use imageproc::drawing::draw_filled_circle_mut;

    #[test]
    fn shoelace_area_of_rectangle_and_triangle() {
        let rect = [[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0]];
        assert_relative_eq!(polygon_area(&rect), 12.0);
        // Orientation does not change the sign.
        let mut rev = rect;
        rev.reverse();
        assert_relative_eq!(polygon_area(&rev), 12.0);

        let tri = [[0.0, 0.0], [10.0, 0.0], [0.0, 5.0]];
        assert_relative_eq!(polygon_area(&tri), 25.0);
        assert_eq!(polygon_area(&tri[..2]), 0.0);
    }

    #[test]
    fn blank_image_has_no_contours() {
        let gray = GrayImage::from_pixel(64, 64, Luma([255]));
        let stage = extract(&gray, &EdgeConfig::default());
        assert!(stage.contours.is_empty());
        assert!(stage.closed.is_some());
    }

    #[test]
    fn disc_yields_outer_contour_near_its_rim() {
        let mut gray = GrayImage::from_pixel(120, 120, Luma([255]));
        draw_filled_circle_mut(&mut gray, (60, 60), 35, Luma([0]));

        let cfg = EdgeConfig {
            use_closing: false,
            ..EdgeConfig::default()
        };
        let stage = extract(&gray, &cfg);
        assert!(stage.closed.is_none());
        let largest = stage
            .contours
            .iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()))
            .expect("disc boundary should be traced");

        let expected = std::f64::consts::PI * 35.0 * 35.0;
        assert!((largest.area() - expected).abs() / expected < 0.15);
        for &[x, y] in &largest.points {
            let d = (x - 60.0).hypot(y - 60.0);
            assert!((30.0..40.0).contains(&d), "edge point at distance {d}");
        }
    }

    #[test]
    fn closing_adds_contours_from_second_pass() {
        // A 5 px dark ring with a small break the closing pass bridges.
        let mut gray = GrayImage::from_pixel(100, 100, Luma([255]));
        draw_filled_circle_mut(&mut gray, (50, 50), 33, Luma([0]));
        draw_filled_circle_mut(&mut gray, (50, 50), 28, Luma([255]));
        for y in 45..55 {
            for x in 80..86 {
                gray.put_pixel(x, y, Luma([255]));
            }
        }

        let plain = extract(
            &gray,
            &EdgeConfig {
                use_closing: false,
                ..EdgeConfig::default()
            },
        );
        let union = extract(&gray, &EdgeConfig::default());
        assert!(union.contours.len() > plain.contours.len());
    }
}
