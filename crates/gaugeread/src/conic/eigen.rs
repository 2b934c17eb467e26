//! Small dense eigen helpers for the 3×3 reduced ellipse system.

use nalgebra::{Matrix3, Vector3};

/// Eigenvector of the reduced system that satisfies the ellipse constraint
/// `4·a0·a2 − a1² > 0`.
///
/// `system` is `C1⁻¹ M`, which is not symmetric, so eigenvalues come from the
/// characteristic cubic and eigenvectors from the adjugate of `A − λI`.
/// When several eigenpairs pass the constraint the one with the smallest
/// |λ| wins (smallest algebraic residual).
pub(crate) fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let trace = a[(0, 0)] + a[(1, 1)] + a[(2, 2)];
    let minors = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];
    let det = a.determinant();

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for ev in real_cubic_roots(-trace, minors, -det) {
        let Some(v) = null_vector(&(system - Matrix3::identity() * ev)) else {
            continue;
        };
        if 4.0 * v[0] * v[2] - v[1] * v[1] <= 0.0 {
            continue;
        }
        if best.map_or(true, |(b, _)| ev.abs() < b) {
            best = Some((ev.abs(), v));
        }
    }
    best.map(|(_, v)| v)
}

/// Unit null vector of a rank-2 matrix: the largest row of its adjugate.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            -(m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)]),
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            -(m[(0, 1)] * m[(2, 2)] - m[(0, 2)] * m[(2, 1)]),
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            -(m[(0, 0)] * m[(2, 1)] - m[(0, 1)] * m[(2, 0)]),
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            -(m[(0, 0)] * m[(1, 2)] - m[(0, 2)] * m[(1, 0)]),
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];

    let best = rows
        .iter()
        .max_by(|l, r| l.norm_squared().total_cmp(&r.norm_squared()))?;
    let norm_sq = best.norm_squared();
    if norm_sq < 1e-30 {
        return None;
    }
    Some(best / norm_sq.sqrt())
}

/// Real roots of the monic cubic `x³ + b x² + c x + d`.
fn real_cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    // Depressed form t³ + p t + q with x = t − b/3.
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    if -4.0 * p * p * p - 27.0 * q * q >= 0.0 {
        let r = (-p / 3.0).sqrt();
        let cos_arg = if r.abs() < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        let tau = std::f64::consts::TAU;
        (0..3)
            .map(|k| 2.0 * r * ((theta + tau * k as f64) / 3.0).cos() + shift)
            .collect()
    } else {
        let s = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        vec![(-q / 2.0 + s).cbrt() + (-q / 2.0 - s).cbrt() + shift]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cubic_with_three_real_roots() {
        // (x - 1)(x - 2)(x - 3) = x³ - 6x² + 11x - 6
        let mut roots = real_cubic_roots(-6.0, 11.0, -6.0);
        roots.sort_by(f64::total_cmp);
        assert_eq!(roots.len(), 3);
        assert_relative_eq!(roots[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(roots[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(roots[2], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn cubic_with_single_real_root() {
        // (x - 2)(x² + 1) = x³ - 2x² + x - 2
        let roots = real_cubic_roots(-2.0, 1.0, -2.0);
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn null_vector_of_singular_matrix() {
        let m = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        let v = null_vector(&m).expect("rank-2 matrix has a null vector");
        assert_relative_eq!(v[2].abs(), 1.0, epsilon = 1e-12);
    }
}
