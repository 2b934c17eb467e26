//! Ellipse fitting primitives used to locate the gauge face.
//!
//! - Direct least-squares conic fit with the ellipse constraint.
//! - Conversion between conic coefficients and geometric parameters.
//! - Sampson distance for residual reporting.

mod eigen;
mod fit;
mod types;

pub use fit::{fit_ellipse_direct, rms_sampson_distance, MIN_FIT_POINTS};
pub use types::Ellipse;
