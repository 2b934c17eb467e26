//! Value scoring and risk classification.

mod risk;
mod soft_interval;

pub use risk::{Classification, RiskThresholds, ScoreResult};
pub use soft_interval::SoftIntervalParams;

use crate::error::Result;

/// Score `value` with `params` and classify it with `thresholds`.
pub fn score_and_classify(
    value: f64,
    params: &SoftIntervalParams,
    thresholds: &RiskThresholds,
) -> Result<ScoreResult> {
    Ok(thresholds.evaluate(params.score(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_band_value_is_safe_and_far_value_is_anomalous() {
        let params = SoftIntervalParams {
            min_value: 1.0,
            max_value: 4.0,
            min_score: 0.1,
            left_scale: 0.5,
            left_power: 2.0,
            right_scale: 1.0,
            right_power: 2.0,
        };
        let thresholds = RiskThresholds {
            safe_range: 0.95,
            uncertain_range: 0.5,
            anomaly_range: 0.2,
        };

        let r = score_and_classify(2.5, &params, &thresholds).expect("finite");
        assert_eq!(r.score, 1.0);
        assert_eq!(r.classification, Classification::Safe);

        // 0.5 above the band: 0.1 + 0.9·e^(−0.25) ≈ 0.80.
        let r = score_and_classify(4.5, &params, &thresholds).expect("finite");
        assert_eq!(r.classification, Classification::Uncertain);

        let r = score_and_classify(-3.0, &params, &thresholds).expect("finite");
        assert_eq!(r.classification, Classification::Anomaly);
    }
}
