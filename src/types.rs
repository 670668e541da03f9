//! Core types for the BioAge engine
//!
//! This module defines the data structures that flow through each stage of the
//! scoring pipeline: metric readings in, extracted features, per-domain results
//! and the final bio-age result out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

/// Physiological domain scored independently by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Fitness,
    Circadian,
    Autonomic,
    Sleep,
    Mobility,
}

impl Domain {
    /// All domains, in blend order
    pub const ALL: [Domain; 5] = [
        Domain::Fitness,
        Domain::Circadian,
        Domain::Autonomic,
        Domain::Sleep,
        Domain::Mobility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Fitness => "fitness",
            Domain::Circadian => "circadian",
            Domain::Autonomic => "autonomic",
            Domain::Sleep => "sleep",
            Domain::Mobility => "mobility",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Domain::Fitness => "Cardiorespiratory Fitness",
            Domain::Circadian => "Circadian Rhythm",
            Domain::Autonomic => "Autonomic Balance",
            Domain::Sleep => "Sleep",
            Domain::Mobility => "Mobility",
        }
    }
}

/// Known metric keys, plus a catch-all for keys this engine does not score
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    /// Resting heart rate (bpm)
    RestingHr,
    /// Heart-rate variability, SDNN (ms)
    Hrv,
    /// Coefficient of variation of day-to-day HRV (ratio)
    HrvCv,
    /// VO2 max (ml/kg/min)
    Vo2Max,
    /// VO2 max trend (ml/kg/min per month)
    Vo2MaxSlope,
    /// Average nightly sleep (hours)
    SleepDuration,
    /// Sleep efficiency (percent)
    SleepEfficiency,
    /// Standard deviation of the nightly sleep midpoint (hours)
    SleepMidpointStd,
    /// Number of nights behind the sleep averages
    SleepNights,
    /// Walking speed (m/s)
    WalkingSpeed,
    /// Keys written by newer clients; ignored by the engine
    #[serde(untagged)]
    Other(String),
}

impl MetricKey {
    /// All keys the engine knows how to score
    pub const ALL: [MetricKey; 10] = [
        MetricKey::RestingHr,
        MetricKey::Hrv,
        MetricKey::HrvCv,
        MetricKey::Vo2Max,
        MetricKey::Vo2MaxSlope,
        MetricKey::SleepDuration,
        MetricKey::SleepEfficiency,
        MetricKey::SleepMidpointStd,
        MetricKey::SleepNights,
        MetricKey::WalkingSpeed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            MetricKey::RestingHr => "resting_hr",
            MetricKey::Hrv => "hrv",
            MetricKey::HrvCv => "hrv_cv",
            MetricKey::Vo2Max => "vo2_max",
            MetricKey::Vo2MaxSlope => "vo2_max_slope",
            MetricKey::SleepDuration => "sleep_duration",
            MetricKey::SleepEfficiency => "sleep_efficiency",
            MetricKey::SleepMidpointStd => "sleep_midpoint_std",
            MetricKey::SleepNights => "sleep_nights",
            MetricKey::WalkingSpeed => "walking_speed",
            MetricKey::Other(key) => key.as_str(),
        }
    }

    /// Human-readable label; unknown keys fall back to the raw key
    pub fn label(&self) -> &str {
        match self {
            MetricKey::RestingHr => "Resting HR",
            MetricKey::Hrv => "HRV",
            MetricKey::HrvCv => "HRV Variability",
            MetricKey::Vo2Max => "VO2 Max",
            MetricKey::Vo2MaxSlope => "VO2 Max Trend",
            MetricKey::SleepDuration => "Sleep Duration",
            MetricKey::SleepEfficiency => "Sleep Efficiency",
            MetricKey::SleepMidpointStd => "Sleep Timing Variability",
            MetricKey::SleepNights => "Nights Tracked",
            MetricKey::WalkingSpeed => "Walking Speed",
            MetricKey::Other(key) => key.as_str(),
        }
    }

    /// Canonical unit for the value of this key
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKey::RestingHr => "bpm",
            MetricKey::Hrv => "ms",
            MetricKey::HrvCv => "ratio",
            MetricKey::Vo2Max => "ml/kg/min",
            MetricKey::Vo2MaxSlope => "ml/kg/min/month",
            MetricKey::SleepDuration => "hrs",
            MetricKey::SleepEfficiency => "%",
            MetricKey::SleepMidpointStd => "hrs",
            MetricKey::SleepNights => "nights",
            MetricKey::WalkingSpeed => "m/s",
            MetricKey::Other(_) => "",
        }
    }

    /// Domain this key feeds, or `None` for unknown keys
    pub fn domain(&self) -> Option<Domain> {
        match self {
            MetricKey::Vo2Max | MetricKey::Vo2MaxSlope => Some(Domain::Fitness),
            MetricKey::RestingHr | MetricKey::Hrv | MetricKey::HrvCv => Some(Domain::Autonomic),
            MetricKey::SleepDuration
            | MetricKey::SleepEfficiency
            | MetricKey::SleepMidpointStd
            | MetricKey::SleepNights => Some(Domain::Sleep),
            MetricKey::WalkingSpeed => Some(Domain::Mobility),
            MetricKey::Other(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MetricKey::Other(_))
    }
}

/// A single timestamped observation supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    /// Physiological quantity this reading measures
    pub metric_key: MetricKey,
    /// Value in the canonical unit for `metric_key`; missing or non-numeric JSON becomes NaN
    #[serde(default = "missing_value", deserialize_with = "lenient_f64")]
    pub value: f64,
    /// Display unit (informational only)
    #[serde(default)]
    pub unit: String,
    /// When the value was measured
    pub recorded_at: DateTime<Utc>,
    /// Manually entered or lab-verified rather than device-synced
    #[serde(default)]
    pub is_override: bool,
}

impl MetricReading {
    /// Device-synced reading with the key's canonical unit
    pub fn new(metric_key: MetricKey, value: f64, recorded_at: DateTime<Utc>) -> Self {
        let unit = metric_key.unit().to_string();
        Self {
            metric_key,
            value,
            unit,
            recorded_at,
            is_override: false,
        }
    }

    /// Mark this reading as a manual / lab-verified override
    pub fn as_override(mut self) -> Self {
        self.is_override = true;
        self
    }
}

fn missing_value() -> f64 {
    f64::NAN
}

/// Accept numbers, numeric strings and nulls; anything unusable becomes NaN
/// so the extractor can drop the single reading instead of failing the request.
///
/// The raw token is parsed directly so out-of-range literals such as `1e400`
/// become infinite instead of aborting the whole document.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    let text = raw.get().trim();
    let number = if text.starts_with('"') {
        serde_json::from_str::<String>(text)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
    } else {
        text.parse::<f64>().ok()
    };
    Ok(number.unwrap_or(f64::NAN))
}

/// Pre-computed circadian rhythm bundle derived from raw activity data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircadianFeatures {
    /// Rhythm-adjusted mean activity level
    pub mesor: f64,
    /// Half the peak-to-trough activity swing
    pub amplitude: f64,
    /// Hour of day at peak activity
    pub acrophase_hour: f64,
    /// Relative amplitude (RA, 0-1)
    pub relative_amplitude: f64,
    /// Interdaily stability (IS, 0-1)
    pub interdaily_stability: f64,
    /// Intradaily variability (IV, typically 0-2)
    pub intradaily_variability: f64,
    /// Fraction of the analysis window with step data (0-1)
    pub steps_coverage: f64,
}

impl CircadianFeatures {
    /// True when every component is a finite number
    pub fn is_finite(&self) -> bool {
        [
            self.mesor,
            self.amplitude,
            self.acrophase_hour,
            self.relative_amplitude,
            self.interdaily_stability,
            self.intradaily_variability,
            self.steps_coverage,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Sparse feature record; `None` always means "no data", never zero
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WearableFeatures {
    pub resting_hr: Option<f64>,
    pub hrv_sdnn: Option<f64>,
    pub hrv_cv: Option<f64>,
    pub vo2max: Option<f64>,
    pub vo2max_slope: Option<f64>,
    pub sleep_avg_hours: Option<f64>,
    pub sleep_efficiency_pct: Option<f64>,
    pub sleep_midpoint_std: Option<f64>,
    pub walking_speed: Option<f64>,
    pub circadian: Option<CircadianFeatures>,
    /// Number of usable VO2 max readings supplied (history depth)
    pub vo2max_samples: u32,
    /// Nights behind the sleep averages, when the caller supplied the hint
    pub sleep_nights: Option<f64>,
}

impl WearableFeatures {
    /// Check if any scoreable feature is present
    pub fn has_data(&self) -> bool {
        self.resting_hr.is_some()
            || self.hrv_sdnn.is_some()
            || self.hrv_cv.is_some()
            || self.vo2max.is_some()
            || self.sleep_avg_hours.is_some()
            || self.walking_speed.is_some()
            || self.circadian.is_some()
    }
}

/// A metric that fed a domain, annotated for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricContribution {
    pub key: MetricKey,
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
    /// Recorded within the staleness window, or an override
    pub fresh: bool,
    pub is_override: bool,
}

/// Per-domain breakdown of the blended result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResult {
    pub domain: Domain,
    pub label: String,
    /// Contribution to the final age gap: raw gap x weight x shrinkage (years)
    pub gap: f64,
    /// Clamped domain gap before weighting (years)
    pub raw_gap: f64,
    /// Normalized blend weight actually used
    pub weight: f64,
    /// Measurement confidence (0-1)
    pub quality: f64,
    /// Selected reading of every key owned by this domain, including context
    /// keys (`vo2_max_slope`, `sleep_nights`) that do not enter the gap formula
    pub metrics: Vec<MetricContribution>,
}

/// Complete result of one bio-age computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioAgeResult {
    pub bio_age: f64,
    pub chronological_age: f64,
    pub pace_of_aging: f64,
    /// Blended, shrunk age gap (years; negative = younger)
    pub age_gap: f64,
    pub domains: Vec<DomainResult>,
    /// Same value as `age_gap`
    pub total_impact: f64,
    /// Version of the configuration that produced this result
    pub config_version: String,
}

/// Request payload accepted by the JSON, FFI and CLI entry points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioAgeRequest {
    pub chronological_age: f64,
    #[serde(default)]
    pub metrics: Vec<MetricReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circadian: Option<CircadianFeatures>,
    /// Reference time for freshness; defaults to the newest reading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

impl BioAgeRequest {
    pub fn new(chronological_age: f64, metrics: Vec<MetricReading>) -> Self {
        Self {
            chronological_age,
            metrics,
            circadian: None,
            as_of: None,
        }
    }

    pub fn with_circadian(mut self, circadian: CircadianFeatures) -> Self {
        self.circadian = Some(circadian);
        self
    }

    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }
}
