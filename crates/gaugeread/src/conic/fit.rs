//! Direct least-squares ellipse fitting (Fitzgibbon, Pilu & Fisher, 1999).

use nalgebra::{DMatrix, Matrix3, Vector6};

use super::eigen::constrained_eigenvector;
use super::types::{ConicCoeffs, Ellipse};

/// Minimum number of boundary points for a conic fit.
pub const MIN_FIT_POINTS: usize = 5;

/// Fit a conic constrained to be an ellipse.
///
/// Points are centred and scaled before building the design matrix; the
/// coefficients are mapped back to pixel coordinates afterwards. Returns
/// `None` for fewer than [`MIN_FIT_POINTS`] points or when the solution is
/// not a proper ellipse.
pub fn fit_conic_direct(points: &[[f64; 2]]) -> Option<ConicCoeffs> {
    let n = points.len();
    if n < MIN_FIT_POINTS {
        return None;
    }

    let norm = Normalization::of(points);

    // Design matrix rows [x², xy, y², x, y, 1].
    let mut d = DMatrix::<f64>::zeros(n, 6);
    for (i, &p) in points.iter().enumerate() {
        let [x, y] = norm.apply(p);
        d[(i, 0)] = x * x;
        d[(i, 1)] = x * y;
        d[(i, 2)] = y * y;
        d[(i, 3)] = x;
        d[(i, 4)] = y;
        d[(i, 5)] = 1.0;
    }

    let s = d.transpose() * &d;
    let s11 = s.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = s.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = s.fixed_view::<3, 3>(3, 3).into_owned();

    // Ellipse constraint 4AC − B² = 1 on the quadratic block.
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);

    let s22_inv = s22.try_inverse()?;
    let reduced = s11 - s12 * s22_inv * s12.transpose();
    let system = c1.try_inverse()? * reduced;

    let quad = constrained_eigenvector(&system)?;
    let lin = -s22_inv * s12.transpose() * quad;

    let coeffs = Vector6::new(quad[0], quad[1], quad[2], lin[0], lin[1], lin[2]);
    let conic = ConicCoeffs(norm.denormalize(&coeffs));

    if !conic.is_ellipse() {
        return None;
    }
    let ellipse = conic.to_ellipse()?;
    ellipse.is_valid().then_some(conic)
}

/// Geometric form of [`fit_conic_direct`].
pub fn fit_ellipse_direct(points: &[[f64; 2]]) -> Option<Ellipse> {
    fit_conic_direct(points)?.to_ellipse()
}

/// RMS Sampson distance of `points` to `ellipse`, in pixels.
pub fn rms_sampson_distance(ellipse: &Ellipse, points: &[[f64; 2]]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = points
        .iter()
        .map(|&[x, y]| ellipse.sampson_distance(x, y).powi(2))
        .sum();
    (sum_sq / points.len() as f64).sqrt()
}

/// Similarity transform moving the centroid to the origin with mean
/// distance √2.
struct Normalization {
    mx: f64,
    my: f64,
    s: f64,
}

impl Normalization {
    fn of(points: &[[f64; 2]]) -> Self {
        let n = points.len() as f64;
        let mx = points.iter().map(|p| p[0]).sum::<f64>() / n;
        let my = points.iter().map(|p| p[1]).sum::<f64>() / n;
        let mean_dist = points
            .iter()
            .map(|p| (p[0] - mx).hypot(p[1] - my))
            .sum::<f64>()
            / n;
        let s = if mean_dist > 1e-15 {
            std::f64::consts::SQRT_2 / mean_dist
        } else {
            1.0
        };
        Self { mx, my, s }
    }

    fn apply(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        [(x - self.mx) * self.s, (y - self.my) * self.s]
    }

    /// Substitute x' = s(x − mx), y' = s(y − my) back into the conic.
    fn denormalize(&self, c: &Vector6<f64>) -> [f64; 6] {
        let [a_, b_, c_, d_, e_, f_] = [c[0], c[1], c[2], c[3], c[4], c[5]];
        let Self { mx, my, s } = *self;
        let s2 = s * s;

        let a = a_ * s2;
        let b = b_ * s2;
        let c = c_ * s2;
        let d = -2.0 * a_ * s2 * mx - b_ * s2 * my + d_ * s;
        let e = -b_ * s2 * mx - 2.0 * c_ * s2 * my + e_ * s;
        let f = a_ * s2 * mx * mx + b_ * s2 * mx * my + c_ * s2 * my * my
            - d_ * s * mx
            - e_ * s * my
            + f_;
        [a, b, c, d, e, f]
    }
}
