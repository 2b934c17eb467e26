//! Per-sensor configuration, keyed by category and optional marker id.
//!
//! The registry is built once, validated eagerly and never mutated
//! afterwards; consumers share it through `Arc<SensorRegistry>`.
//!
//! JSON layout:
//!
//! ```json
//! {
//!   "schema": "gaugeread.sensors.v1",
//!   "sensors": [
//!     {
//!       "name": "boiler_pressure_a",
//!       "category_name": "pressure",
//!       "marker_id": 7,
//!       "unit": "bar",
//!       "value_tolerance": 0.1,
//!       "scale": { "min_angle": 45, "max_angle": 315, "min_value": 0, "max_value": 10 },
//!       "parameters": { "min_value": 2, "max_value": 6, "min_score": 0,
//!                       "left_scale": 1, "left_power": 2,
//!                       "right_scale": 1, "right_power": 2 },
//!       "risk_thresholds": { "safe_range": 0.9, "uncertain_range": 0.6, "anomaly_range": 0.3 }
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use crate::calibration::GaugeScale;
use crate::error::{ConfigurationError, Result};
use crate::scoring::{RiskThresholds, SoftIntervalParams};

pub const SENSOR_SCHEMA_V1: &str = "gaugeread.sensors.v1";

/// One configured sensor.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorCategoryConfig {
    /// Entry identifier, reported in lookup errors.
    pub name: String,
    pub category_name: String,
    /// Physical marker next to replicated sensors; absent for single
    /// instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_id: Option<u32>,
    #[serde(default)]
    pub unit: String,
    /// Relative tolerance when comparing against a reference value.
    #[serde(default)]
    pub value_tolerance: f64,
    /// Dial geometry, required for gauge reading only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<GaugeScale>,
    pub parameters: SoftIntervalParams,
    pub risk_thresholds: RiskThresholds,
}

impl SensorCategoryConfig {
    /// Static scale used to map needle angles to values.
    pub fn gauge_scale(&self) -> std::result::Result<GaugeScale, ConfigurationError> {
        self.scale.ok_or_else(|| ConfigurationError::MissingScale {
            entry: self.name.clone(),
        })
    }

    fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        let invalid = |field: &'static str, reason: String| ConfigurationError::Invalid {
            entry: self.name.clone(),
            field,
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty".into()));
        }
        if self.category_name.trim().is_empty() {
            return Err(invalid("category_name", "must not be empty".into()));
        }
        if !self.value_tolerance.is_finite() || self.value_tolerance < 0.0 {
            return Err(invalid(
                "value_tolerance",
                format!("must be a finite non-negative number, got {}", self.value_tolerance),
            ));
        }
        self.parameters
            .validate()
            .map_err(|(field, reason)| invalid(field, reason))?;
        self.risk_thresholds
            .validate()
            .map_err(|(field, reason)| invalid(field, reason))?;

        if let Some(scale) = &self.scale {
            let fields = [
                ("scale.min_angle", scale.min_angle),
                ("scale.max_angle", scale.max_angle),
                ("scale.min_value", scale.min_value),
                ("scale.max_value", scale.max_value),
            ];
            for (field, v) in fields {
                if !v.is_finite() {
                    return Err(invalid(field, format!("must be finite, got {v}")));
                }
            }
            if scale.min_angle == scale.max_angle {
                return Err(invalid(
                    "scale.max_angle",
                    format!("equals min_angle {}", scale.min_angle),
                ));
            }
        }
        Ok(())
    }
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SensorDocument {
    schema: String,
    sensors: Vec<SensorCategoryConfig>,
}

/// Immutable lookup table of sensor configurations.
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    entries: Vec<SensorCategoryConfig>,
}

impl SensorRegistry {
    /// Validate every entry up front.
    pub fn new(entries: Vec<SensorCategoryConfig>) -> std::result::Result<Self, ConfigurationError> {
        for entry in &entries {
            entry.validate()?;
        }
        tracing::debug!(entries = entries.len(), "sensor registry loaded");
        Ok(Self { entries })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: SensorDocument = serde_json::from_str(json)?;
        if doc.schema != SENSOR_SCHEMA_V1 {
            return Err(ConfigurationError::Schema {
                found: doc.schema,
                expected: SENSOR_SCHEMA_V1,
            }
            .into());
        }
        Ok(Self::new(doc.sensors)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn entries(&self) -> &[SensorCategoryConfig] {
        &self.entries
    }

    /// The single entry for `(category_name, marker_id)`.
    ///
    /// `marker_id = None` matches only entries without a marker id. Zero
    /// matches and several matches are both errors.
    pub fn lookup(
        &self,
        category_name: &str,
        marker_id: Option<u32>,
    ) -> std::result::Result<&SensorCategoryConfig, ConfigurationError> {
        let mut matches = self
            .entries
            .iter()
            .filter(|e| e.category_name == category_name && e.marker_id == marker_id);

        let Some(first) = matches.next() else {
            return Err(ConfigurationError::NotFound {
                category: category_name.to_string(),
                marker_id,
            });
        };
        let rest: Vec<&SensorCategoryConfig> = matches.collect();
        if rest.is_empty() {
            return Ok(first);
        }

        let entries = std::iter::once(first)
            .chain(rest)
            .map(|e| e.name.clone())
            .collect();
        Err(ConfigurationError::Ambiguous {
            category: category_name.to_string(),
            marker_id,
            entries,
        })
    }
}
