//! Soft-interval score: 1 inside the nominal band, decaying smoothly toward
//! `min_score` outside it.

use crate::error::{GaugeError, Result};

/// Closed-form parameters of the soft-interval function.
///
/// ```text
/// s(x) = 1                                                  min ≤ x ≤ max
/// s(x) = m + (1 − m)·exp(−((min − x)/left_scale)^left_power)     x < min
/// s(x) = m + (1 − m)·exp(−((x − max)/right_scale)^right_power)   x > max
/// ```
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoftIntervalParams {
    pub min_value: f64,
    pub max_value: f64,
    /// Asymptote the score approaches far outside the band.
    pub min_score: f64,
    pub left_scale: f64,
    pub left_power: f64,
    pub right_scale: f64,
    pub right_power: f64,
}

impl SoftIntervalParams {
    /// Field-level check; returns the offending field and the reason.
    pub fn validate(&self) -> std::result::Result<(), (&'static str, String)> {
        let finite = [
            ("min_value", self.min_value),
            ("max_value", self.max_value),
            ("min_score", self.min_score),
            ("left_scale", self.left_scale),
            ("left_power", self.left_power),
            ("right_scale", self.right_scale),
            ("right_power", self.right_power),
        ];
        for (field, v) in finite {
            if !v.is_finite() {
                return Err((field, format!("must be finite, got {v}")));
            }
        }
        if self.min_value > self.max_value {
            return Err((
                "min_value",
                format!(
                    "min_value {} exceeds max_value {}",
                    self.min_value, self.max_value
                ),
            ));
        }
        if !(0.0..1.0).contains(&self.min_score) {
            return Err((
                "min_score",
                format!("must lie in [0, 1), got {}", self.min_score),
            ));
        }
        for (field, v) in [
            ("left_scale", self.left_scale),
            ("left_power", self.left_power),
            ("right_scale", self.right_scale),
            ("right_power", self.right_power),
        ] {
            if v <= 0.0 {
                return Err((field, format!("must be positive, got {v}")));
            }
        }
        Ok(())
    }

    /// Score of `value`.
    pub fn score(&self, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(GaugeError::InvalidInput {
                what: "value to score",
                value,
            });
        }
        let (distance, scale, power) = if value < self.min_value {
            (self.min_value - value, self.left_scale, self.left_power)
        } else if value > self.max_value {
            (value - self.max_value, self.right_scale, self.right_power)
        } else {
            return Ok(1.0);
        };
        let decay = (-(distance / scale).powf(power)).exp();
        Ok(self.min_score + (1.0 - self.min_score) * decay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    fn room_temperature() -> SoftIntervalParams {
        SoftIntervalParams {
            min_value: 20.0,
            max_value: 25.0,
            min_score: 0.0,
            left_scale: 7.0,
            left_power: 2.0,
            right_scale: 7.0,
            right_power: 2.0,
        }
    }

    #[test]
    fn literal_scores() {
        let p = room_temperature();
        assert_eq!(p.score(22.0).expect("finite"), 1.0);
        assert_relative_eq!(p.score(27.0).expect("finite"), 0.9216, epsilon = 1e-4);
        assert_relative_eq!(
            p.score(27.0).expect("finite"),
            (-(2.0f64 / 7.0).powi(2)).exp(),
            epsilon = 1e-12
        );
        assert_relative_eq!(p.score(15.0).expect("finite"), 0.6003, epsilon = 1e-4);
    }

    #[test]
    fn band_edges_score_one() {
        let p = room_temperature();
        assert_eq!(p.score(20.0).expect("finite"), 1.0);
        assert_eq!(p.score(25.0).expect("finite"), 1.0);
    }

    #[test]
    fn random_values_stay_in_bounds() {
        let p = SoftIntervalParams {
            min_score: 0.2,
            left_scale: 3.0,
            left_power: 1.5,
            right_scale: 11.0,
            right_power: 3.0,
            ..room_temperature()
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2000 {
            let x: f64 = rng.gen_range(-100.0..150.0);
            let s = p.score(x).expect("finite");
            assert!(s > 0.2 - 1e-15 && s <= 1.0, "score {s} at {x}");
            if (20.0..=25.0).contains(&x) {
                assert_eq!(s, 1.0);
            }
        }
    }

    #[test]
    fn decays_monotonically_toward_min_score() {
        let p = SoftIntervalParams {
            min_score: 0.3,
            ..room_temperature()
        };
        let mut last = 1.0;
        for k in 1..30 {
            let s = p.score(25.0 + k as f64).expect("finite");
            assert!(s < last);
            assert!(s >= 0.3);
            last = s;
        }
        assert_relative_eq!(p.score(1e6).expect("finite"), 0.3, epsilon = 1e-12);
        assert_relative_eq!(p.score(-1e6).expect("finite"), 0.3, epsilon = 1e-12);
        // Just outside the band the score is still strictly above the floor.
        assert!(p.score(40.0).expect("finite") > 0.3);
    }

    #[test]
    fn rejects_non_finite_values() {
        let p = room_temperature();
        assert!(matches!(
            p.score(f64::NAN),
            Err(GaugeError::InvalidInput { .. })
        ));
        assert!(p.score(f64::INFINITY).is_err());
    }

    #[test]
    fn validation_names_the_field() {
        let ok = room_temperature();
        assert!(ok.validate().is_ok());

        let swapped = SoftIntervalParams {
            min_value: 30.0,
            ..ok
        };
        assert_eq!(swapped.validate().map_err(|e| e.0), Err("min_value"));

        let floor = SoftIntervalParams {
            min_score: 1.0,
            ..ok
        };
        assert_eq!(floor.validate().map_err(|e| e.0), Err("min_score"));

        let scale = SoftIntervalParams {
            right_scale: 0.0,
            ..ok
        };
        assert_eq!(scale.validate().map_err(|e| e.0), Err("right_scale"));

        let power = SoftIntervalParams {
            left_power: f64::NAN,
            ..ok
        };
        assert_eq!(power.validate().map_err(|e| e.0), Err("left_power"));
    }
}
