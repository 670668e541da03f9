//! Scoring configuration
//!
//! Every tunable constant of the engine lives in [`BioAgeConfig`]: domain
//! weights, reference values, scales, years-per-z coefficients, the per-domain
//! clamp and the global shrinkage. The config is plain immutable data passed by
//! reference into every call, so a tuning change is reproducible in tests and
//! safe to share across threads.
//!
//! All sections are `#[serde(default)]`: a partial JSON document overrides only
//! the fields it names.

use crate::error::ComputeError;
use crate::types::Domain;
use serde::{Deserialize, Serialize};

/// Version tag of the default configuration
pub const CONFIG_VERSION: &str = "bioage.config.v1";

/// Default staleness window for metric freshness flags
pub const DEFAULT_STALE_AFTER_HOURS: f64 = 48.0;

/// Tolerance when checking that domain weights sum to one
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Base blend weight per domain; must sum to 1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainWeights {
    pub fitness: f64,
    pub circadian: f64,
    pub autonomic: f64,
    pub sleep: f64,
    pub mobility: f64,
}

impl Default for DomainWeights {
    fn default() -> Self {
        Self {
            fitness: 0.30,
            circadian: 0.25,
            autonomic: 0.20,
            sleep: 0.15,
            mobility: 0.10,
        }
    }
}

impl DomainWeights {
    pub fn get(&self, domain: Domain) -> f64 {
        match domain {
            Domain::Fitness => self.fitness,
            Domain::Circadian => self.circadian,
            Domain::Autonomic => self.autonomic,
            Domain::Sleep => self.sleep,
            Domain::Mobility => self.mobility,
        }
    }

    pub fn sum(&self) -> f64 {
        Domain::ALL.iter().map(|d| self.get(*d)).sum()
    }
}

/// Cardiorespiratory fitness (VO2 max)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// ml/kg/min
    pub reference_vo2max: f64,
    pub vo2max_scale: f64,
    pub years_per_z: f64,
    /// Sample count at which fitness quality saturates
    pub full_quality_samples: u32,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            reference_vo2max: 40.0,
            vo2max_scale: 6.0,
            years_per_z: 2.5,
            full_quality_samples: 3,
        }
    }
}

/// Autonomic balance (resting HR, HRV, HRV variability)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomicConfig {
    /// bpm
    pub reference_resting_hr: f64,
    pub resting_hr_scale: f64,
    /// SDNN in ms; compared on a log scale
    pub reference_hrv_sdnn: f64,
    pub hrv_log_scale: f64,
    pub reference_hrv_cv: f64,
    pub hrv_cv_scale: f64,
    pub years_per_z: f64,
    pub resting_hr_quality_weight: f64,
    pub hrv_quality_weight: f64,
    pub hrv_cv_quality_weight: f64,
}

impl Default for AutonomicConfig {
    fn default() -> Self {
        Self {
            reference_resting_hr: 60.0,
            resting_hr_scale: 8.0,
            reference_hrv_sdnn: 50.0,
            hrv_log_scale: 0.35,
            reference_hrv_cv: 0.10,
            hrv_cv_scale: 0.05,
            years_per_z: 2.5,
            resting_hr_quality_weight: 1.0,
            hrv_quality_weight: 1.0,
            hrv_cv_quality_weight: 0.5,
        }
    }
}

impl AutonomicConfig {
    pub fn total_quality_weight(&self) -> f64 {
        self.resting_hr_quality_weight + self.hrv_quality_weight + self.hrv_cv_quality_weight
    }
}

/// Sleep duration, efficiency and timing regularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    pub reference_hours: f64,
    pub years_per_hour: f64,
    pub reference_efficiency_pct: f64,
    pub years_per_efficiency_pct: f64,
    pub reference_midpoint_std_hours: f64,
    pub years_per_midpoint_std_hour: f64,
    /// Night count at which sleep quality saturates
    pub full_quality_nights: f64,
    /// Night count used when the caller sends no `sleep_nights` hint.
    /// `None` means the hint is required and sleep quality is 0 without it.
    pub assumed_nights: Option<f64>,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            reference_hours: 7.5,
            years_per_hour: 1.5,
            reference_efficiency_pct: 85.0,
            years_per_efficiency_pct: 0.1,
            reference_midpoint_std_hours: 0.5,
            years_per_midpoint_std_hour: 1.0,
            full_quality_nights: 14.0,
            assumed_nights: Some(14.0),
        }
    }
}

/// Walking speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilityConfig {
    /// m/s
    pub reference_walking_speed: f64,
    pub walking_speed_scale: f64,
    pub years_per_z: f64,
}

impl Default for MobilityConfig {
    fn default() -> Self {
        Self {
            reference_walking_speed: 1.3,
            walking_speed_scale: 0.15,
            years_per_z: 2.5,
        }
    }
}

/// Circadian rhythm strength
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircadianConfig {
    pub relative_amplitude_weight: f64,
    pub interdaily_stability_weight: f64,
    pub intradaily_variability_weight: f64,
    /// Composite score of a typical healthy rhythm
    pub target_score: f64,
    pub years_per_score_point: f64,
}

impl Default for CircadianConfig {
    fn default() -> Self {
        Self {
            relative_amplitude_weight: 0.45,
            interdaily_stability_weight: 0.35,
            intradaily_variability_weight: 0.20,
            target_score: 0.70,
            years_per_score_point: 10.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BioAgeConfig {
    pub version: String,
    pub weights: DomainWeights,
    /// Fraction of the weighted gap that is reported (0-1)
    pub shrinkage: f64,
    /// Symmetric bound on every raw domain gap (years)
    pub per_domain_clamp_years: f64,
    /// Device readings older than this are flagged stale
    pub stale_after_hours: f64,
    pub fitness: FitnessConfig,
    pub autonomic: AutonomicConfig,
    pub sleep: SleepConfig,
    pub mobility: MobilityConfig,
    pub circadian: CircadianConfig,
}

impl Default for BioAgeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            weights: DomainWeights::default(),
            shrinkage: 0.70,
            per_domain_clamp_years: 12.0,
            stale_after_hours: DEFAULT_STALE_AFTER_HOURS,
            fitness: FitnessConfig::default(),
            autonomic: AutonomicConfig::default(),
            sleep: SleepConfig::default(),
            mobility: MobilityConfig::default(),
            circadian: CircadianConfig::default(),
        }
    }
}

/// The documented default configuration
pub fn default_bio_age_config() -> BioAgeConfig {
    BioAgeConfig::default()
}

impl BioAgeConfig {
    /// Check that every constant is usable
    pub fn validate(&self) -> Result<(), ComputeError> {
        for domain in Domain::ALL {
            non_negative(&format!("weights.{}", domain.as_str()), self.weights.get(domain))?;
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ComputeError::InvalidConfig(format!(
                "domain weights must sum to 1.0, got {sum}"
            )));
        }

        if !(0.0..=1.0).contains(&self.shrinkage) {
            return Err(ComputeError::InvalidConfig(format!(
                "shrinkage must be within [0, 1], got {}",
                self.shrinkage
            )));
        }
        positive("per_domain_clamp_years", self.per_domain_clamp_years)?;
        positive("stale_after_hours", self.stale_after_hours)?;

        let f = &self.fitness;
        finite("fitness.reference_vo2max", f.reference_vo2max)?;
        non_negative("fitness.vo2max_scale", f.vo2max_scale)?;
        finite("fitness.years_per_z", f.years_per_z)?;
        if f.full_quality_samples == 0 {
            return Err(ComputeError::InvalidConfig(
                "fitness.full_quality_samples must be at least 1".to_string(),
            ));
        }

        let a = &self.autonomic;
        finite("autonomic.reference_resting_hr", a.reference_resting_hr)?;
        non_negative("autonomic.resting_hr_scale", a.resting_hr_scale)?;
        positive("autonomic.reference_hrv_sdnn", a.reference_hrv_sdnn)?;
        non_negative("autonomic.hrv_log_scale", a.hrv_log_scale)?;
        finite("autonomic.reference_hrv_cv", a.reference_hrv_cv)?;
        non_negative("autonomic.hrv_cv_scale", a.hrv_cv_scale)?;
        finite("autonomic.years_per_z", a.years_per_z)?;
        non_negative("autonomic.resting_hr_quality_weight", a.resting_hr_quality_weight)?;
        non_negative("autonomic.hrv_quality_weight", a.hrv_quality_weight)?;
        non_negative("autonomic.hrv_cv_quality_weight", a.hrv_cv_quality_weight)?;
        positive("autonomic quality weight total", a.total_quality_weight())?;

        let s = &self.sleep;
        finite("sleep.reference_hours", s.reference_hours)?;
        finite("sleep.years_per_hour", s.years_per_hour)?;
        finite("sleep.reference_efficiency_pct", s.reference_efficiency_pct)?;
        finite("sleep.years_per_efficiency_pct", s.years_per_efficiency_pct)?;
        finite("sleep.reference_midpoint_std_hours", s.reference_midpoint_std_hours)?;
        finite("sleep.years_per_midpoint_std_hour", s.years_per_midpoint_std_hour)?;
        positive("sleep.full_quality_nights", s.full_quality_nights)?;
        if let Some(nights) = s.assumed_nights {
            non_negative("sleep.assumed_nights", nights)?;
        }

        let m = &self.mobility;
        finite("mobility.reference_walking_speed", m.reference_walking_speed)?;
        non_negative("mobility.walking_speed_scale", m.walking_speed_scale)?;
        finite("mobility.years_per_z", m.years_per_z)?;

        let c = &self.circadian;
        non_negative("circadian.relative_amplitude_weight", c.relative_amplitude_weight)?;
        non_negative("circadian.interdaily_stability_weight", c.interdaily_stability_weight)?;
        non_negative("circadian.intradaily_variability_weight", c.intradaily_variability_weight)?;
        finite("circadian.target_score", c.target_score)?;
        finite("circadian.years_per_score_point", c.years_per_score_point)?;

        Ok(())
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn finite(name: &str, value: f64) -> Result<(), ComputeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ComputeError::InvalidConfig(format!(
            "{name} must be finite, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ComputeError> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(ComputeError::InvalidConfig(format!(
            "{name} must be >= 0, got {value}"
        )));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<(), ComputeError> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(ComputeError::InvalidConfig(format!(
            "{name} must be > 0, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = default_bio_age_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.version, CONFIG_VERSION);
        assert!((config.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let json = r#"{
            "shrinkage": 0.5,
            "autonomic": { "reference_resting_hr": 55.0 }
        }"#;
        let config = BioAgeConfig::from_json(json).unwrap();

        assert_eq!(config.shrinkage, 0.5);
        assert_eq!(config.autonomic.reference_resting_hr, 55.0);
        assert_eq!(config.autonomic.resting_hr_scale, 8.0);
        assert_eq!(config.weights, DomainWeights::default());
        assert_eq!(config.sleep, SleepConfig::default());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = BioAgeConfig::default();
        config.weights.fitness = 0.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ComputeError::InvalidConfig(_)));
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = BioAgeConfig::default();
        config.shrinkage = 1.5;
        assert!(config.validate().is_err());

        let mut config = BioAgeConfig::default();
        config.per_domain_clamp_years = 0.0;
        assert!(config.validate().is_err());

        let mut config = BioAgeConfig::default();
        config.fitness.vo2max_scale = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = BioAgeConfig::default();
        config.autonomic.reference_hrv_sdnn = 0.0;
        assert!(config.validate().is_err());

        let mut config = BioAgeConfig::default();
        config.fitness.full_quality_samples = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_scale_is_allowed() {
        let mut config = BioAgeConfig::default();
        config.mobility.walking_speed_scale = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = BioAgeConfig::default();
        config.sleep.assumed_nights = None;
        let json = config.to_json().unwrap();
        let loaded = BioAgeConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = BioAgeConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ComputeError::JsonError(_)));
    }
}
