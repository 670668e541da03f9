//! Engine orchestration
//!
//! This module provides the public API for the BioAge engine. It runs the full
//! scoring pipeline from metric readings to a [`BioAgeResult`]:
//! feature extraction → domain gaps and qualities → blending → rounding.
//!
//! Every call is pure: it reads only its arguments and the configuration.

use crate::blender::{blend, DomainScore};
use crate::config::BioAgeConfig;
use crate::error::ComputeError;
use crate::features::{is_fresh, FeatureExtractor};
use crate::types::{
    BioAgeRequest, BioAgeResult, CircadianFeatures, DomainResult, MetricContribution,
    MetricReading,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Compute biological age from a chronological age and metric readings.
///
/// # Arguments
/// * `chronological_age` - Age in years; must be finite and > 0
/// * `metrics` - Readings in any order, duplicates allowed
/// * `config` - Tuning constants; `None` uses the default configuration
///
/// # Example
/// ```ignore
/// let result = calculate_bio_age(32.0, &readings, None)?;
/// println!("bio age {} (pace {})", result.bio_age, result.pace_of_aging);
/// ```
pub fn calculate_bio_age(
    chronological_age: f64,
    metrics: &[MetricReading],
    config: Option<&BioAgeConfig>,
) -> Result<BioAgeResult, ComputeError> {
    match config {
        Some(config) => {
            config.validate()?;
            score(chronological_age, metrics, None, None, config)
        }
        None => score(chronological_age, metrics, None, None, &BioAgeConfig::default()),
    }
}

/// Compute biological age from a JSON [`BioAgeRequest`] and return JSON.
///
/// # Arguments
/// * `request_json` - Serialized `BioAgeRequest`
/// * `config_json` - Optional (partial) `BioAgeConfig` JSON
pub fn bio_age_from_json(
    request_json: &str,
    config_json: Option<&str>,
) -> Result<String, ComputeError> {
    let request: BioAgeRequest = serde_json::from_str(request_json)
        .map_err(|e| ComputeError::ParseError(e.to_string()))?;

    let engine = match config_json {
        Some(json) => BioAgeEngine::new(BioAgeConfig::from_json(json)?)?,
        None => BioAgeEngine::default(),
    };

    let result = engine.calculate(&request)?;
    Ok(serde_json::to_string(&result)?)
}

/// Engine bound to a validated configuration.
///
/// Use this when scoring many requests with the same tuning.
#[derive(Debug, Clone, Default)]
pub struct BioAgeEngine {
    config: BioAgeConfig,
}

impl BioAgeEngine {
    /// Create an engine, validating the configuration once
    pub fn new(config: BioAgeConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BioAgeConfig {
        &self.config
    }

    /// Score a full request (metrics, optional circadian bundle, reference time)
    pub fn calculate(&self, request: &BioAgeRequest) -> Result<BioAgeResult, ComputeError> {
        score(
            request.chronological_age,
            &request.metrics,
            request.circadian.as_ref(),
            request.as_of,
            &self.config,
        )
    }

    /// Score readings alone
    pub fn calculate_metrics(
        &self,
        chronological_age: f64,
        metrics: &[MetricReading],
    ) -> Result<BioAgeResult, ComputeError> {
        score(chronological_age, metrics, None, None, &self.config)
    }
}

/// Pipeline stages:
/// 1. FeatureExtractor - latest finite reading per known key
/// 2. DomainScore - clamped gap and quality per domain
/// 3. blend - quality-gated, renormalized, shrunk gap
/// 4. Rounding and freshness annotation
fn score(
    chronological_age: f64,
    metrics: &[MetricReading],
    circadian: Option<&CircadianFeatures>,
    as_of: Option<DateTime<Utc>>,
    config: &BioAgeConfig,
) -> Result<BioAgeResult, ComputeError> {
    if !chronological_age.is_finite() || chronological_age <= 0.0 {
        return Err(ComputeError::InvalidChronologicalAge(chronological_age));
    }

    // Stage 1: Extract features
    let extracted = FeatureExtractor::extract(metrics, circadian);

    // Stage 2: Score domains
    let scores = DomainScore::compute_all(&extracted.features, config);

    // Stage 3: Blend
    let blended = blend(&scores, config);

    // Stage 4: Assemble
    let reference = as_of.or_else(|| extracted.latest_recorded_at());

    let domains: Vec<DomainResult> = blended
        .domains
        .iter()
        .map(|d| {
            let metrics = extracted
                .readings_for(d.domain)
                .map(|reading| MetricContribution {
                    key: reading.metric_key.clone(),
                    label: reading.metric_key.label().to_string(),
                    value: reading.value,
                    unit: reading.metric_key.unit().to_string(),
                    recorded_at: reading.recorded_at,
                    fresh: reference
                        .map(|now| is_fresh(reading, now, config.stale_after_hours))
                        .unwrap_or(true),
                    is_override: reading.is_override,
                })
                .collect();

            DomainResult {
                domain: d.domain,
                label: d.domain.label().to_string(),
                gap: round_to(d.contribution, 2),
                raw_gap: round_to(d.raw_gap, 2),
                weight: d.weight,
                quality: d.quality,
                metrics,
            }
        })
        .collect();

    let bio_age = round_to(chronological_age + blended.blended_gap, 1);
    let pace_of_aging = if extracted.has_input() {
        round_to(bio_age / chronological_age, 2)
    } else {
        1.0
    };
    if !pace_of_aging.is_finite() {
        return Err(ComputeError::InvalidChronologicalAge(chronological_age));
    }
    let age_gap = round_to(blended.blended_gap, 2);

    debug!(
        chronological_age,
        bio_age,
        age_gap,
        pace_of_aging,
        domains = domains.len(),
        "computed bio age"
    );

    Ok(BioAgeResult {
        bio_age,
        chronological_age,
        pace_of_aging,
        age_gap,
        domains,
        total_impact: age_gap,
        config_version: config.version.clone(),
    })
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
