//! Anomaly surface over the sensor registry.

use std::sync::Arc;

use crate::error::Result;
use crate::registry::SensorRegistry;
use crate::scoring::{score_and_classify, RiskThresholds, ScoreResult, SoftIntervalParams};

/// Scoring and threshold fields of one sensor, flattened for persistence.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AuditParameters {
    /// Score function kind.
    pub function: &'static str,
    pub entry: String,
    pub unit: String,
    #[serde(flatten)]
    pub parameters: SoftIntervalParams,
    #[serde(flatten)]
    pub risk_thresholds: RiskThresholds,
}

/// Scores values against their sensor's configuration.
#[derive(Debug, Clone)]
pub struct AnomalyChecker {
    registry: Arc<SensorRegistry>,
}

impl AnomalyChecker {
    pub fn new(registry: Arc<SensorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Score and classification of `value` for the configured sensor.
    pub fn evaluate(
        &self,
        value: f64,
        category_name: &str,
        marker_id: Option<u32>,
    ) -> Result<ScoreResult> {
        let entry = self.registry.lookup(category_name, marker_id)?;
        let result = score_and_classify(value, &entry.parameters, &entry.risk_thresholds)?;
        tracing::debug!(
            entry = %entry.name,
            value,
            score = result.score,
            classification = ?result.classification,
            "value scored"
        );
        Ok(result)
    }

    /// `(score, is_anomaly)`; anomalous exactly when the score is below the
    /// sensor's `uncertain_range`.
    pub fn is_anomaly(
        &self,
        value: f64,
        category_name: &str,
        marker_id: Option<u32>,
    ) -> Result<(f64, bool)> {
        let r = self.evaluate(value, category_name, marker_id)?;
        Ok((r.score, r.classification.is_anomaly()))
    }

    pub fn get_parameters_for_audit(
        &self,
        category_name: &str,
        marker_id: Option<u32>,
    ) -> Result<AuditParameters> {
        let entry = self.registry.lookup(category_name, marker_id)?;
        Ok(AuditParameters {
            function: "soft_interval",
            entry: entry.name.clone(),
            unit: entry.unit.clone(),
            parameters: entry.parameters,
            risk_thresholds: entry.risk_thresholds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, ErrorKind, GaugeError};
    use crate::registry::tests::pressure_entry;
    use approx::assert_relative_eq;

    fn checker() -> AnomalyChecker {
        let registry = SensorRegistry::new(vec![
            pressure_entry("boiler_a", Some(7)),
            pressure_entry("boiler_b", Some(7)),
            pressure_entry("hall", None),
        ])
        .expect("valid registry");
        AnomalyChecker::new(Arc::new(registry))
    }

    #[test]
    fn in_band_value_is_not_anomalous() {
        let (score, anomalous) = checker().is_anomaly(4.0, "pressure", None).expect("hall");
        assert_eq!(score, 1.0);
        assert!(!anomalous);
    }

    #[test]
    fn far_value_is_anomalous() {
        // 1.5 above the band: exp(−2.25) ≈ 0.105 < 0.6.
        let (score, anomalous) = checker().is_anomaly(7.5, "pressure", None).expect("hall");
        assert_relative_eq!(score, (-2.25f64).exp(), epsilon = 1e-12);
        assert!(anomalous);
    }

    #[test]
    fn lookup_errors_propagate() {
        let err = checker()
            .is_anomaly(4.0, "pressure", Some(7))
            .expect_err("two entries share marker 7");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(
            err,
            GaugeError::Configuration(ConfigurationError::Ambiguous { .. })
        ));

        let err = checker()
            .get_parameters_for_audit("flow", None)
            .expect_err("unknown category");
        assert!(matches!(
            err,
            GaugeError::Configuration(ConfigurationError::NotFound { .. })
        ));
    }

    #[test]
    fn audit_parameters_are_flat() {
        let audit = checker()
            .get_parameters_for_audit("pressure", None)
            .expect("hall");
        let v = serde_json::to_value(&audit).expect("serialize");
        assert_eq!(v["function"], "soft_interval");
        assert_eq!(v["entry"], "hall");
        assert_eq!(v["min_value"], 2.0);
        assert_eq!(v["right_power"], 2.0);
        assert_eq!(v["uncertain_range"], 0.6);
        assert_eq!(v["anomaly_range"], 0.3);
    }
}
