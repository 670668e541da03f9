//! Domain blending
//!
//! Combines per-domain gaps into one age gap:
//! 1. Domains without a gap are dropped (zero weight, not zero gap)
//! 2. Base weight x quality gives the gated weight
//! 3. Gated weights are renormalized over the present domains
//! 4. The weighted gap is multiplied by the global shrinkage
//!
//! Each domain's reported contribution is `raw_gap x weight x shrinkage`, so
//! the contributions sum to the blended gap.

use crate::config::BioAgeConfig;
use crate::types::{Domain, WearableFeatures};
use tracing::trace;

/// Gap and quality for a single domain before blending
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainScore {
    pub domain: Domain,
    /// `None` when the domain had no data
    pub raw_gap: Option<f64>,
    pub quality: f64,
}

impl DomainScore {
    /// Score one domain from extracted features
    pub fn compute(domain: Domain, features: &WearableFeatures, config: &BioAgeConfig) -> Self {
        let raw_gap = domain.gap(features, config);
        let quality = domain.quality(features, config);
        trace!(domain = domain.as_str(), ?raw_gap, quality, "scored domain");
        Self {
            domain,
            raw_gap,
            quality,
        }
    }

    /// Score every domain, in blend order
    pub fn compute_all(features: &WearableFeatures, config: &BioAgeConfig) -> Vec<Self> {
        Domain::ALL
            .iter()
            .map(|domain| Self::compute(*domain, features, config))
            .collect()
    }
}

/// A present domain after weighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendedDomain {
    pub domain: Domain,
    pub raw_gap: f64,
    pub quality: f64,
    /// Normalized weight; sums to 1.0 across present domains unless all are 0
    pub weight: f64,
    /// `raw_gap x weight x shrinkage`
    pub contribution: f64,
}

/// Output of the blender
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blend {
    /// Sum of contributions (years)
    pub blended_gap: f64,
    /// Present domains only, in input order
    pub domains: Vec<BlendedDomain>,
}

/// Blend domain scores into a single gap
pub fn blend(scores: &[DomainScore], config: &BioAgeConfig) -> Blend {
    let present: Vec<(DomainScore, f64, f64)> = scores
        .iter()
        .filter_map(|score| {
            score.raw_gap.map(|gap| {
                let quality = sanitize_quality(score.quality);
                let gated = config.weights.get(score.domain) * quality;
                (*score, gap, gated)
            })
        })
        .collect();

    let total_gated: f64 = present.iter().map(|(_, _, gated)| gated).sum();
    let shrinkage = config.shrinkage;

    let domains: Vec<BlendedDomain> = present
        .into_iter()
        .map(|(score, raw_gap, gated)| {
            let weight = if total_gated > 0.0 {
                gated / total_gated
            } else {
                0.0
            };
            BlendedDomain {
                domain: score.domain,
                raw_gap,
                quality: sanitize_quality(score.quality),
                weight,
                contribution: raw_gap * weight * shrinkage,
            }
        })
        .collect();

    let blended_gap: f64 = domains.iter().map(|d| d.contribution).sum();

    Blend {
        blended_gap,
        domains,
    }
}

fn sanitize_quality(quality: f64) -> f64 {
    if quality.is_nan() {
        0.0
    } else {
        quality.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(domain: Domain, raw_gap: Option<f64>, quality: f64) -> DomainScore {
        DomainScore {
            domain,
            raw_gap,
            quality,
        }
    }

    #[test]
    fn test_no_domains() {
        let blend = blend(&[], &BioAgeConfig::default());
        assert_eq!(blend.blended_gap, 0.0);
        assert!(blend.domains.is_empty());
    }

    #[test]
    fn test_absent_domains_are_dropped() {
        let scores = vec![
            score(Domain::Fitness, None, 1.0),
            score(Domain::Autonomic, Some(5.0), 0.4),
            score(Domain::Sleep, None, 0.0),
        ];
        let blend = blend(&scores, &BioAgeConfig::default());

        assert_eq!(blend.domains.len(), 1);
        assert_eq!(blend.domains[0].domain, Domain::Autonomic);
        assert!((blend.domains[0].weight - 1.0).abs() < 1e-12);
        assert!((blend.blended_gap - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_quality_gated_renormalization() {
        let scores = vec![
            score(Domain::Fitness, Some(-4.0), 1.0),
            score(Domain::Sleep, Some(2.0), 0.5),
        ];
        let config = BioAgeConfig::default();
        let blend = blend(&scores, &config);

        // gated: fitness 0.30, sleep 0.075 -> total 0.375
        let w_fit = 0.30 / 0.375;
        let w_sleep = 0.075 / 0.375;
        assert!((blend.domains[0].weight - w_fit).abs() < 1e-12);
        assert!((blend.domains[1].weight - w_sleep).abs() < 1e-12);

        let expected = (-4.0 * w_fit + 2.0 * w_sleep) * 0.7;
        assert!((blend.blended_gap - expected).abs() < 1e-12);

        let reconstructed: f64 = blend.domains.iter().map(|d| d.contribution).sum();
        assert!((reconstructed - blend.blended_gap).abs() < 1e-12);
    }

    #[test]
    fn test_zero_quality_everywhere_gives_zero_gap() {
        let scores = vec![
            score(Domain::Fitness, Some(-4.0), 0.0),
            score(Domain::Mobility, Some(6.0), 0.0),
        ];
        let blend = blend(&scores, &BioAgeConfig::default());

        assert_eq!(blend.blended_gap, 0.0);
        assert_eq!(blend.domains.len(), 2);
        assert!(blend.domains.iter().all(|d| d.weight == 0.0));
    }

    #[test]
    fn test_out_of_range_quality_is_clamped() {
        let scores = vec![
            score(Domain::Fitness, Some(2.0), 7.0),
            score(Domain::Autonomic, Some(2.0), f64::NAN),
        ];
        let blend = blend(&scores, &BioAgeConfig::default());
        assert_eq!(blend.domains[0].quality, 1.0);
        assert_eq!(blend.domains[1].quality, 0.0);
        assert!((blend.domains[0].weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_shrinkage_reports_no_gap() {
        let mut config = BioAgeConfig::default();
        config.shrinkage = 0.0;
        let scores = vec![score(Domain::Fitness, Some(-8.0), 1.0)];
        let blend = blend(&scores, &config);
        assert_eq!(blend.blended_gap, 0.0);
        assert!((blend.domains[0].weight - 1.0).abs() < 1e-12);
    }
}
