//! Feature extraction
//!
//! This module maps raw metric readings onto the sparse [`WearableFeatures`]
//! record the domain calculators consume:
//! - One reading per metric key (the most recent wins)
//! - Non-finite values dropped per reading
//! - Unknown metric keys ignored
//! - Freshness annotation relative to a reference time

use crate::types::{CircadianFeatures, Domain, MetricKey, MetricReading, WearableFeatures};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

/// Features plus the readings that produced them
#[derive(Debug, Clone, Default)]
pub struct ExtractedFeatures {
    pub features: WearableFeatures,
    /// Winning reading per known key, in `MetricKey::ALL` order
    pub selected: Vec<MetricReading>,
}

impl ExtractedFeatures {
    /// Selected readings feeding keys of the given domain
    pub fn readings_for(&self, domain: Domain) -> impl Iterator<Item = &MetricReading> + '_ {
        self.selected
            .iter()
            .filter(move |r| r.metric_key.domain() == Some(domain))
    }

    /// Newest `recorded_at` among the selected readings
    pub fn latest_recorded_at(&self) -> Option<DateTime<Utc>> {
        self.selected.iter().map(|r| r.recorded_at).max()
    }

    /// True when at least one usable reading or a circadian bundle survived extraction
    pub fn has_input(&self) -> bool {
        !self.selected.is_empty() || self.features.circadian.is_some()
    }
}

/// Feature extractor for turning readings into features
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Extract features from readings and an optional circadian bundle
    pub fn extract(
        readings: &[MetricReading],
        circadian: Option<&CircadianFeatures>,
    ) -> ExtractedFeatures {
        let mut latest: Vec<Option<&MetricReading>> = vec![None; MetricKey::ALL.len()];
        let mut vo2max_samples = 0u32;

        for reading in readings {
            let Some(slot) = key_index(&reading.metric_key) else {
                trace!(key = reading.metric_key.as_str(), "ignoring unknown metric key");
                continue;
            };

            if !reading.value.is_finite() {
                debug!(
                    key = reading.metric_key.as_str(),
                    recorded_at = %reading.recorded_at,
                    "dropping non-finite metric value"
                );
                continue;
            }

            if reading.metric_key == MetricKey::Vo2Max {
                vo2max_samples = vo2max_samples.saturating_add(1);
            }

            let replace = match latest[slot] {
                Some(current) => supersedes(reading, current),
                None => true,
            };
            if replace {
                latest[slot] = Some(reading);
            }
        }

        let selected: Vec<MetricReading> = latest.into_iter().flatten().cloned().collect();
        let value_of = |key: MetricKey| {
            selected
                .iter()
                .find(|r| r.metric_key == key)
                .map(|r| r.value)
        };

        let circadian = match circadian {
            Some(bundle) if bundle.is_finite() => Some(*bundle),
            Some(_) => {
                debug!("dropping circadian bundle with non-finite components");
                None
            }
            None => None,
        };

        let features = WearableFeatures {
            resting_hr: value_of(MetricKey::RestingHr),
            hrv_sdnn: value_of(MetricKey::Hrv),
            hrv_cv: value_of(MetricKey::HrvCv),
            vo2max: value_of(MetricKey::Vo2Max),
            vo2max_slope: value_of(MetricKey::Vo2MaxSlope),
            sleep_avg_hours: value_of(MetricKey::SleepDuration),
            sleep_efficiency_pct: value_of(MetricKey::SleepEfficiency),
            sleep_midpoint_std: value_of(MetricKey::SleepMidpointStd),
            walking_speed: value_of(MetricKey::WalkingSpeed),
            circadian,
            vo2max_samples,
            sleep_nights: value_of(MetricKey::SleepNights),
        };

        debug!(
            readings = readings.len(),
            selected = selected.len(),
            circadian = features.circadian.is_some(),
            "extracted wearable features"
        );

        ExtractedFeatures { features, selected }
    }
}

/// Position of a known key in `MetricKey::ALL`
fn key_index(key: &MetricKey) -> Option<usize> {
    MetricKey::ALL.iter().position(|k| k == key)
}

/// Whether `candidate` should replace `current` for the same key.
///
/// Newer `recorded_at` wins. On equal timestamps an override beats a device
/// reading; otherwise the later reading in input order wins.
fn supersedes(candidate: &MetricReading, current: &MetricReading) -> bool {
    if candidate.recorded_at != current.recorded_at {
        return candidate.recorded_at > current.recorded_at;
    }
    candidate.is_override || !current.is_override
}

/// Whether a reading counts as fresh at `reference`.
///
/// Overrides are always fresh. Readings timestamped after `reference` are fresh.
pub fn is_fresh(reading: &MetricReading, reference: DateTime<Utc>, stale_after_hours: f64) -> bool {
    if reading.is_override {
        return true;
    }
    let age_hours = (reference - reading.recorded_at).num_seconds() as f64 / 3600.0;
    age_hours < stale_after_hours
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
    }

    fn reading(key: MetricKey, value: f64, hour: u32) -> MetricReading {
        MetricReading::new(key, value, at(hour))
    }

    #[test]
    fn test_maps_known_keys() {
        let readings = vec![
            reading(MetricKey::RestingHr, 58.0, 6),
            reading(MetricKey::Hrv, 62.0, 6),
            reading(MetricKey::Vo2Max, 44.0, 6),
            reading(MetricKey::SleepDuration, 7.2, 6),
            reading(MetricKey::WalkingSpeed, 1.4, 6),
        ];
        let extracted = FeatureExtractor::extract(&readings, None);
        let f = &extracted.features;

        assert_eq!(f.resting_hr, Some(58.0));
        assert_eq!(f.hrv_sdnn, Some(62.0));
        assert_eq!(f.vo2max, Some(44.0));
        assert_eq!(f.sleep_avg_hours, Some(7.2));
        assert_eq!(f.walking_speed, Some(1.4));
        assert_eq!(f.hrv_cv, None);
        assert_eq!(f.sleep_efficiency_pct, None);
        assert_eq!(f.vo2max_samples, 1);
        assert_eq!(extracted.selected.len(), 5);
    }

    #[test]
    fn test_latest_reading_wins_regardless_of_order() {
        let readings = vec![
            reading(MetricKey::RestingHr, 70.0, 12),
            reading(MetricKey::RestingHr, 55.0, 6),
            reading(MetricKey::RestingHr, 60.0, 9),
        ];
        let extracted = FeatureExtractor::extract(&readings, None);
        assert_eq!(extracted.features.resting_hr, Some(70.0));
        assert_eq!(extracted.selected.len(), 1);
    }

    #[test]
    fn test_timestamp_tie_prefers_override_then_input_order() {
        let readings = vec![
            reading(MetricKey::Hrv, 50.0, 6).as_override(),
            reading(MetricKey::Hrv, 40.0, 6),
        ];
        let extracted = FeatureExtractor::extract(&readings, None);
        assert_eq!(extracted.features.hrv_sdnn, Some(50.0));

        let readings = vec![
            reading(MetricKey::Hrv, 40.0, 6),
            reading(MetricKey::Hrv, 45.0, 6),
        ];
        let extracted = FeatureExtractor::extract(&readings, None);
        assert_eq!(extracted.features.hrv_sdnn, Some(45.0));
    }

    #[test]
    fn test_non_finite_values_are_dropped() {
        let readings = vec![
            reading(MetricKey::Vo2Max, 42.0, 6),
            reading(MetricKey::Vo2Max, f64::NAN, 12),
            reading(MetricKey::WalkingSpeed, f64::INFINITY, 6),
        ];
        let extracted = FeatureExtractor::extract(&readings, None);

        // The newer NaN reading must not shadow the older finite one
        assert_eq!(extracted.features.vo2max, Some(42.0));
        assert_eq!(extracted.features.vo2max_samples, 1);
        assert_eq!(extracted.features.walking_speed, None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let readings = vec![
            reading(MetricKey::Other("blood_glucose".to_string()), 95.0, 6),
            reading(MetricKey::Other("bmi".to_string()), 22.0, 6),
        ];
        let extracted = FeatureExtractor::extract(&readings, None);
        assert!(!extracted.features.has_data());
        assert!(!extracted.has_input());
        assert!(extracted.selected.is_empty());
    }

    #[test]
    fn test_vo2max_sample_count_counts_history() {
        let readings = vec![
            reading(MetricKey::Vo2Max, 41.0, 1),
            reading(MetricKey::Vo2Max, 42.0, 2),
            reading(MetricKey::Vo2Max, 43.0, 3),
            reading(MetricKey::Vo2Max, 44.0, 4),
        ];
        let extracted = FeatureExtractor::extract(&readings, None);
        assert_eq!(extracted.features.vo2max, Some(44.0));
        assert_eq!(extracted.features.vo2max_samples, 4);
    }

    #[test]
    fn test_circadian_bundle_passthrough() {
        let bundle = CircadianFeatures {
            mesor: 100.0,
            amplitude: 60.0,
            acrophase_hour: 15.0,
            relative_amplitude: 0.8,
            interdaily_stability: 0.5,
            intradaily_variability: 0.9,
            steps_coverage: 0.75,
        };
        let extracted = FeatureExtractor::extract(&[], Some(&bundle));
        assert_eq!(extracted.features.circadian, Some(bundle));
        assert!(extracted.has_input());

        let broken = CircadianFeatures {
            relative_amplitude: f64::NAN,
            ..bundle
        };
        let extracted = FeatureExtractor::extract(&[], Some(&broken));
        assert_eq!(extracted.features.circadian, None);
    }

    #[test]
    fn test_freshness() {
        let reference = at(12);
        let recent = MetricReading::new(MetricKey::RestingHr, 60.0, reference - Duration::hours(47));
        let stale = MetricReading::new(MetricKey::RestingHr, 60.0, reference - Duration::hours(49));
        let stale_override = stale.clone().as_override();

        assert!(is_fresh(&recent, reference, 48.0));
        assert!(!is_fresh(&stale, reference, 48.0));
        assert!(is_fresh(&stale_override, reference, 48.0));
    }
}
