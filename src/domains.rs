//! Domain gap calculators and quality estimators
//!
//! Each domain turns its slice of [`WearableFeatures`] into:
//! - a gap in years (`None` when the domain has no data, which is distinct from
//!   a zero gap), clamped to the configured per-domain bound
//! - a quality score in [0, 1] reflecting how much data backs the gap
//!
//! Dispatch goes through [`Domain::gap`] and [`Domain::quality`], a plain
//! `match` over the fixed domain set.

use crate::config::{AutonomicConfig, BioAgeConfig, CircadianConfig, SleepConfig};
use crate::types::{CircadianFeatures, Domain, WearableFeatures};

impl Domain {
    /// Clamped age gap for this domain, or `None` without data
    pub fn gap(&self, features: &WearableFeatures, config: &BioAgeConfig) -> Option<f64> {
        match self {
            Domain::Fitness => gap_fitness(features, config),
            Domain::Circadian => gap_circadian(features, config),
            Domain::Autonomic => gap_autonomic(features, config),
            Domain::Sleep => gap_sleep(features, config),
            Domain::Mobility => gap_mobility(features, config),
        }
    }

    /// Measurement confidence for this domain
    pub fn quality(&self, features: &WearableFeatures, config: &BioAgeConfig) -> f64 {
        match self {
            Domain::Fitness => quality_fitness(features, config),
            Domain::Circadian => quality_circadian(features),
            Domain::Autonomic => quality_autonomic(features, &config.autonomic),
            Domain::Sleep => quality_sleep(features, &config.sleep),
            Domain::Mobility => quality_mobility(features),
        }
    }
}

/// Linear standardization; a non-positive scale yields 0
pub fn z_score(value: f64, reference: f64, scale: f64) -> f64 {
    if scale > 0.0 {
        (value - reference) / scale
    } else {
        0.0
    }
}

/// Saturate a single gap term so opposite-signed overflows cannot sum to NaN
fn term(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-f64::MAX, f64::MAX)
    }
}

fn clamp_gap(gap: f64, config: &BioAgeConfig) -> f64 {
    let bound = config.per_domain_clamp_years;
    gap.clamp(-bound, bound)
}

// ============================================================================
// Gap calculators
// ============================================================================

/// Higher VO2 max reads younger
pub fn gap_fitness(features: &WearableFeatures, config: &BioAgeConfig) -> Option<f64> {
    let cfg = &config.fitness;
    let vo2max = features.vo2max?;
    let gap = -cfg.years_per_z * z_score(vo2max, cfg.reference_vo2max, cfg.vo2max_scale);
    Some(clamp_gap(term(gap), config))
}

/// Resting HR, log-HRV and HRV variability; present terms sum
pub fn gap_autonomic(features: &WearableFeatures, config: &BioAgeConfig) -> Option<f64> {
    let terms = autonomic_terms(features, &config.autonomic);
    if terms.is_empty() {
        return None;
    }
    Some(clamp_gap(terms.iter().sum(), config))
}

fn autonomic_terms(features: &WearableFeatures, cfg: &AutonomicConfig) -> Vec<f64> {
    let mut terms = Vec::with_capacity(3);

    if let Some(hr) = features.resting_hr {
        terms.push(term(
            cfg.years_per_z * z_score(hr, cfg.reference_resting_hr, cfg.resting_hr_scale),
        ));
    }

    // ln is undefined for non-positive HRV, so such a reading contributes nothing
    if let Some(hrv) = features.hrv_sdnn.filter(|v| *v > 0.0) {
        terms.push(term(
            -cfg.years_per_z * z_score(hrv.ln(), cfg.reference_hrv_sdnn.ln(), cfg.hrv_log_scale),
        ));
    }

    if let Some(cv) = features.hrv_cv {
        terms.push(term(
            cfg.years_per_z * z_score(cv, cfg.reference_hrv_cv, cfg.hrv_cv_scale),
        ));
    }

    terms
}

/// Short sleep ages; low efficiency and irregular timing add to it
pub fn gap_sleep(features: &WearableFeatures, config: &BioAgeConfig) -> Option<f64> {
    let cfg: &SleepConfig = &config.sleep;
    let hours = features.sleep_avg_hours?;

    let mut gap = term(-cfg.years_per_hour * (hours - cfg.reference_hours));

    if let Some(efficiency) = features.sleep_efficiency_pct {
        gap += term(-cfg.years_per_efficiency_pct * (efficiency - cfg.reference_efficiency_pct));
    }

    if let Some(midpoint_std) = features.sleep_midpoint_std {
        gap += term(
            cfg.years_per_midpoint_std_hour * (midpoint_std - cfg.reference_midpoint_std_hours),
        );
    }

    Some(clamp_gap(gap, config))
}

/// Faster walking reads younger
pub fn gap_mobility(features: &WearableFeatures, config: &BioAgeConfig) -> Option<f64> {
    let cfg = &config.mobility;
    let speed = features.walking_speed?;
    let gap = -cfg.years_per_z * z_score(speed, cfg.reference_walking_speed, cfg.walking_speed_scale);
    Some(clamp_gap(term(gap), config))
}

/// Rhythm weaker than target ages
pub fn gap_circadian(features: &WearableFeatures, config: &BioAgeConfig) -> Option<f64> {
    let cfg = &config.circadian;
    let bundle = features.circadian.as_ref()?;
    let score = circadian_composite(bundle, cfg);
    let gap = (cfg.target_score - score) * cfg.years_per_score_point;
    Some(clamp_gap(term(gap), config))
}

/// Weighted rhythm-strength score from RA, IS and IV
pub fn circadian_composite(bundle: &CircadianFeatures, cfg: &CircadianConfig) -> f64 {
    let ra = bundle.relative_amplitude.clamp(0.0, 1.0);
    let is = bundle.interdaily_stability.clamp(0.0, 1.0);
    let iv = (1.0 / (1.0 + bundle.intradaily_variability.max(0.0))).clamp(0.0, 1.0);

    cfg.relative_amplitude_weight * ra
        + cfg.interdaily_stability_weight * is
        + cfg.intradaily_variability_weight * iv
}

// ============================================================================
// Quality estimators
// ============================================================================

/// VO2 max sample count relative to the saturation count
pub fn quality_fitness(features: &WearableFeatures, config: &BioAgeConfig) -> f64 {
    if features.vo2max.is_none() {
        return 0.0;
    }
    let full = config.fitness.full_quality_samples.max(1) as f64;
    (features.vo2max_samples as f64 / full).clamp(0.0, 1.0)
}

/// Weighted share of autonomic sub-features present
pub fn quality_autonomic(features: &WearableFeatures, cfg: &AutonomicConfig) -> f64 {
    let total = cfg.total_quality_weight();
    if total <= 0.0 {
        return 0.0;
    }

    let mut present = 0.0;
    if features.resting_hr.is_some() {
        present += cfg.resting_hr_quality_weight;
    }
    if features.hrv_sdnn.is_some() {
        present += cfg.hrv_quality_weight;
    }
    if features.hrv_cv.is_some() {
        present += cfg.hrv_cv_quality_weight;
    }

    (present / total).clamp(0.0, 1.0)
}

/// Nights behind the averages relative to the saturation count
pub fn quality_sleep(features: &WearableFeatures, cfg: &SleepConfig) -> f64 {
    if features.sleep_avg_hours.is_none() || cfg.full_quality_nights <= 0.0 {
        return 0.0;
    }
    match features.sleep_nights.or(cfg.assumed_nights) {
        Some(nights) => (nights / cfg.full_quality_nights).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// Binary: walking speed present or not
pub fn quality_mobility(features: &WearableFeatures) -> f64 {
    if features.walking_speed.is_some() {
        1.0
    } else {
        0.0
    }
}

/// Step-data coverage of the circadian window
pub fn quality_circadian(features: &WearableFeatures) -> f64 {
    features
        .circadian
        .map(|c| c.steps_coverage.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}
