//! Conic and ellipse representations with conversions.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// General conic `A x² + B xy + C y² + D x + E y + F = 0`,
/// stored as `[A, B, C, D, E, F]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicCoeffs(pub [f64; 6]);

/// Geometric ellipse in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Center x.
    pub cx: f64,
    /// Center y.
    pub cy: f64,
    /// Semi-major axis length.
    pub a: f64,
    /// Semi-minor axis length.
    pub b: f64,
    /// Rotation of the major axis from +x, radians in (−π/2, π/2].
    pub angle: f64,
}

impl ConicCoeffs {
    /// Value of the conic polynomial at `(x, y)`.
    pub fn algebraic_distance(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, f] = self.0;
        a * x * x + b * x * y + c * y * y + d * x + e * y + f
    }

    /// Discriminant test `B² − 4AC < 0`.
    pub fn is_ellipse(&self) -> bool {
        let [a, b, c, ..] = self.0;
        b * b - 4.0 * a * c < 0.0
    }

    /// Geometric parameters, or `None` when the conic is not a real ellipse.
    pub fn to_ellipse(self) -> Option<Ellipse> {
        conic_to_ellipse(&self)
    }
}

impl Ellipse {
    /// Positive, finite semi-axes and finite center/angle.
    pub fn is_valid(&self) -> bool {
        self.a > 0.0
            && self.b > 0.0
            && self.a.is_finite()
            && self.b.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.angle.is_finite()
    }

    /// Radius of the circle a slightly skewed gauge face would have
    /// head-on: the mean of the two semi-axes.
    pub fn mean_radius(&self) -> f64 {
        0.5 * (self.a + self.b)
    }

    pub fn to_conic(self) -> ConicCoeffs {
        ellipse_to_conic(&self)
    }

    /// `n` points evenly spaced in the ellipse parameter.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let (sin_a, cos_a) = self.angle.sin_cos();
        (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * (i as f64) / (n as f64);
                let px = self.a * t.cos();
                let py = self.b * t.sin();
                [
                    self.cx + cos_a * px - sin_a * py,
                    self.cy + sin_a * px + cos_a * py,
                ]
            })
            .collect()
    }

    /// First-order geometric distance from a point to the boundary.
    pub fn sampson_distance(&self, x: f64, y: f64) -> f64 {
        let c = self.to_conic();
        let [ca, cb, cc, cd, ce, _] = c.0;
        let alg = c.algebraic_distance(x, y);
        let gx = 2.0 * ca * x + cb * y + cd;
        let gy = cb * x + 2.0 * cc * y + ce;
        let grad_sq = gx * gx + gy * gy;
        if grad_sq < 1e-30 {
            return alg.abs();
        }
        alg.abs() / grad_sq.sqrt()
    }
}

/// Convert general conic coefficients to geometric ellipse parameters.
fn conic_to_ellipse(c: &ConicCoeffs) -> Option<Ellipse> {
    let [a, b, cc, d, e, f] = c.0;

    if b * b - 4.0 * a * cc >= 0.0 {
        return None;
    }

    let m = Matrix3::new(
        a,
        b / 2.0,
        d / 2.0,
        b / 2.0,
        cc,
        e / 2.0,
        d / 2.0,
        e / 2.0,
        f,
    );
    if m.determinant().abs() < 1e-15 {
        return None;
    }

    // Center solves the gradient-zero system.
    let denom = 4.0 * a * cc - b * b;
    let cx = (b * e - 2.0 * cc * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;

    let angle = if (a - cc).abs() < 1e-15 {
        if b > 0.0 {
            std::f64::consts::FRAC_PI_4
        } else if b < 0.0 {
            -std::f64::consts::FRAC_PI_4
        } else {
            0.0
        }
    } else {
        0.5 * b.atan2(a - cc)
    };

    let sum = a + cc;
    let diff = ((a - cc).powi(2) + b * b).sqrt();
    let lambda1 = (sum + diff) / 2.0;
    let lambda2 = (sum - diff) / 2.0;

    let f_center = a * cx * cx + b * cx * cy + cc * cy * cy + d * cx + e * cy + f;
    if f_center.abs() < 1e-15 {
        return None;
    }

    let a_sq = -f_center / lambda1;
    let b_sq = -f_center / lambda2;
    if a_sq <= 0.0 || b_sq <= 0.0 {
        return None;
    }

    let (semi_a, semi_b, angle) = {
        let (sa, sb) = (a_sq.sqrt(), b_sq.sqrt());
        if sa >= sb {
            (sa, sb, angle)
        } else {
            (sb, sa, angle + std::f64::consts::FRAC_PI_2)
        }
    };

    Some(Ellipse {
        cx,
        cy,
        a: semi_a,
        b: semi_b,
        angle: wrap_half_turn(angle),
    })
}

fn ellipse_to_conic(e: &Ellipse) -> ConicCoeffs {
    let (sin_a, cos_a) = e.angle.sin_cos();
    let a2 = e.a * e.a;
    let b2 = e.b * e.b;

    let ca = cos_a * cos_a / a2 + sin_a * sin_a / b2;
    let cb = 2.0 * cos_a * sin_a * (1.0 / a2 - 1.0 / b2);
    let cc = sin_a * sin_a / a2 + cos_a * cos_a / b2;
    let cd = -2.0 * ca * e.cx - cb * e.cy;
    let ce = -cb * e.cx - 2.0 * cc * e.cy;
    let cf = ca * e.cx * e.cx + cb * e.cx * e.cy + cc * e.cy * e.cy - 1.0;

    ConicCoeffs([ca, cb, cc, cd, ce, cf])
}

/// Wrap an axis orientation into (−π/2, π/2].
fn wrap_half_turn(mut angle: f64) -> f64 {
    use std::f64::consts::{FRAC_PI_2, PI};
    while angle > FRAC_PI_2 {
        angle -= PI;
    }
    while angle <= -FRAC_PI_2 {
        angle += PI;
    }
    angle
}
