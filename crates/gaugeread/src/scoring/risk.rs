//! Ternary risk classification of a score.

/// Score cutoffs, ordered `anomaly_range ≤ uncertain_range ≤ safe_range`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskThresholds {
    pub safe_range: f64,
    pub uncertain_range: f64,
    pub anomaly_range: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Safe,
    Uncertain,
    Anomaly,
}

impl Classification {
    pub fn is_anomaly(self) -> bool {
        self == Self::Anomaly
    }
}

/// Score with its classification.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub classification: Classification,
}

impl RiskThresholds {
    pub fn validate(&self) -> std::result::Result<(), (&'static str, String)> {
        for (field, v) in [
            ("safe_range", self.safe_range),
            ("uncertain_range", self.uncertain_range),
            ("anomaly_range", self.anomaly_range),
        ] {
            if !v.is_finite() {
                return Err((field, format!("must be finite, got {v}")));
            }
        }
        if self.uncertain_range > self.safe_range {
            return Err((
                "uncertain_range",
                format!(
                    "{} is above safe_range {}",
                    self.uncertain_range, self.safe_range
                ),
            ));
        }
        if self.anomaly_range > self.uncertain_range {
            return Err((
                "anomaly_range",
                format!(
                    "{} is above uncertain_range {}",
                    self.anomaly_range, self.uncertain_range
                ),
            ));
        }
        Ok(())
    }

    /// `Anomaly` exactly when `score < uncertain_range`; a score equal to
    /// `uncertain_range` is `Uncertain`. Scores below `anomaly_range` are
    /// anomalous as well.
    pub fn classify(&self, score: f64) -> Classification {
        if score >= self.safe_range {
            Classification::Safe
        } else if score >= self.uncertain_range {
            Classification::Uncertain
        } else {
            Classification::Anomaly
        }
    }

    pub fn evaluate(&self, score: f64) -> ScoreResult {
        ScoreResult {
            score,
            classification: self.classify(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn thresholds() -> RiskThresholds {
        RiskThresholds {
            safe_range: 0.9,
            uncertain_range: 0.6,
            anomaly_range: 0.3,
        }
    }

    #[test]
    fn classifies_each_band() {
        let t = thresholds();
        assert_eq!(t.classify(1.0), Classification::Safe);
        assert_eq!(t.classify(0.9), Classification::Safe);
        assert_eq!(t.classify(0.75), Classification::Uncertain);
        assert_eq!(t.classify(0.6), Classification::Uncertain);
        assert_eq!(t.classify(0.45), Classification::Anomaly);
        assert_eq!(t.classify(0.3), Classification::Anomaly);
        assert_eq!(t.classify(0.1), Classification::Anomaly);
    }

    #[test]
    fn anomaly_iff_below_uncertain_range() {
        let t = thresholds();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5000 {
            let s: f64 = rng.gen_range(-0.2..1.2);
            assert_eq!(t.classify(s).is_anomaly(), s < t.uncertain_range, "score {s}");
        }
        assert!(!t.classify(t.uncertain_range).is_anomaly());
        assert!(t.classify(t.uncertain_range - f64::EPSILON).is_anomaly());
    }

    #[test]
    fn validation_requires_ordering() {
        assert!(thresholds().validate().is_ok());

        let inverted = RiskThresholds {
            uncertain_range: 0.95,
            ..thresholds()
        };
        assert_eq!(inverted.validate().map_err(|e| e.0), Err("uncertain_range"));

        let low = RiskThresholds {
            anomaly_range: 0.7,
            ..thresholds()
        };
        assert_eq!(low.validate().map_err(|e| e.0), Err("anomaly_range"));

        let nan = RiskThresholds {
            safe_range: f64::NAN,
            ..thresholds()
        };
        assert_eq!(nan.validate().map_err(|e| e.0), Err("safe_range"));
    }

    #[test]
    fn serializes_classification_in_snake_case() {
        let r = thresholds().evaluate(0.7);
        let json = serde_json::to_string(&r).expect("serialize");
        assert_eq!(json, r#"{"score":0.7,"classification":"uncertain"}"#);
    }
}
