use bioage_engine::domains::{gap_autonomic, gap_fitness};
use bioage_engine::{
    calculate_bio_age, BioAgeConfig, BioAgeEngine, BioAgeRequest, CircadianFeatures, Domain,
    MetricKey, MetricReading, WearableFeatures,
};
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

fn recorded_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap()
}

fn reading(key: MetricKey, value: f64) -> MetricReading {
    MetricReading::new(key, value, recorded_at())
}

/// Readings for every known key with finite values in plausible ranges
fn arb_metrics() -> impl Strategy<Value = Vec<MetricReading>> {
    (
        prop::option::of(35.0f64..100.0),
        prop::option::of(5.0f64..200.0),
        prop::option::of(0.0f64..0.5),
        prop::option::of(15.0f64..70.0),
        prop::option::of(3.0f64..11.0),
        prop::option::of(50.0f64..100.0),
        prop::option::of(0.0f64..3.0),
        prop::option::of(0.4f64..2.2),
    )
        .prop_map(|(rhr, hrv, cv, vo2, sleep, eff, mid, speed)| {
            let pairs = [
                (MetricKey::RestingHr, rhr),
                (MetricKey::Hrv, hrv),
                (MetricKey::HrvCv, cv),
                (MetricKey::Vo2Max, vo2),
                (MetricKey::SleepDuration, sleep),
                (MetricKey::SleepEfficiency, eff),
                (MetricKey::SleepMidpointStd, mid),
                (MetricKey::WalkingSpeed, speed),
            ];
            pairs
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| reading(key, v)))
                .collect()
        })
}

fn arb_circadian() -> impl Strategy<Value = Option<CircadianFeatures>> {
    prop::option::of(
        (0.0f64..1.0, 0.0f64..1.0, 0.0f64..2.5, 0.0f64..1.0).prop_map(|(ra, is, iv, cov)| {
            CircadianFeatures {
                mesor: 100.0,
                amplitude: 50.0,
                acrophase_hour: 14.0,
                relative_amplitude: ra,
                interdaily_stability: is,
                intradaily_variability: iv,
                steps_coverage: cov,
            }
        }),
    )
}

proptest! {
    #[test]
    fn empty_metrics_return_chronological_age(age in 0.5f64..120.0) {
        let result = calculate_bio_age(age, &[], None).unwrap();
        prop_assert_eq!(result.bio_age, (age * 10.0).round() / 10.0);
        prop_assert_eq!(result.pace_of_aging, 1.0);
        prop_assert!(result.domains.is_empty());
    }

    #[test]
    fn higher_vo2max_is_younger(a in 10.0f64..80.0, delta in 0.5f64..20.0) {
        let config = BioAgeConfig::default();
        let low = WearableFeatures { vo2max: Some(a), ..Default::default() };
        let high = WearableFeatures { vo2max: Some(a + delta), ..Default::default() };
        let clamp = config.per_domain_clamp_years;

        let g_low = gap_fitness(&low, &config).unwrap();
        let g_high = gap_fitness(&high, &config).unwrap();
        // strict while the lower reading is inside the clamp range
        if g_low.abs() < clamp {
            prop_assert!(g_high < g_low, "{} !< {}", g_high, g_low);
        } else {
            prop_assert!(g_high <= g_low);
        }
    }

    #[test]
    fn higher_resting_hr_is_older(
        hr in 40.0f64..90.0,
        delta in 0.5f64..15.0,
        hrv in prop::option::of(10.0f64..150.0),
    ) {
        let config = BioAgeConfig::default();
        let low = WearableFeatures { resting_hr: Some(hr), hrv_sdnn: hrv, ..Default::default() };
        let high = WearableFeatures { resting_hr: Some(hr + delta), hrv_sdnn: hrv, ..Default::default() };
        let clamp = config.per_domain_clamp_years;

        let g_low = gap_autonomic(&low, &config).unwrap();
        let g_high = gap_autonomic(&high, &config).unwrap();
        if g_low.abs() < clamp {
            prop_assert!(g_high > g_low, "{} !> {}", g_high, g_low);
        } else {
            prop_assert!(g_high >= g_low);
        }
    }

    #[test]
    fn domain_gaps_never_exceed_clamp(
        vo2 in -1e12f64..1e12,
        hr in -1e12f64..1e12,
        cv in -1e12f64..1e12,
        hours in -1e12f64..1e12,
        speed in -1e12f64..1e12,
        ra in -1e6f64..1e6,
        iv in -1e6f64..1e6,
    ) {
        let config = BioAgeConfig::default();
        let features = WearableFeatures {
            vo2max: Some(vo2),
            resting_hr: Some(hr),
            hrv_cv: Some(cv),
            sleep_avg_hours: Some(hours),
            sleep_efficiency_pct: Some(-hours),
            sleep_midpoint_std: Some(hours),
            walking_speed: Some(speed),
            circadian: Some(CircadianFeatures {
                mesor: 0.0,
                amplitude: 0.0,
                acrophase_hour: 0.0,
                relative_amplitude: ra,
                interdaily_stability: -ra,
                intradaily_variability: iv,
                steps_coverage: 1.0,
            }),
            ..Default::default()
        };
        for domain in Domain::ALL {
            let gap = domain.gap(&features, &config).unwrap();
            prop_assert!(gap.is_finite());
            prop_assert!(gap.abs() <= config.per_domain_clamp_years);
        }
    }

    #[test]
    fn weights_sum_to_one_and_gaps_reconstruct(
        age in 18.0f64..95.0,
        metrics in arb_metrics(),
        circadian in arb_circadian(),
    ) {
        let mut request = BioAgeRequest::new(age, metrics);
        request.circadian = circadian;
        let result = BioAgeEngine::default().calculate(&request).unwrap();

        if !result.domains.is_empty() {
            let weight_sum: f64 = result.domains.iter().map(|d| d.weight).sum();
            let any_quality = result.domains.iter().any(|d| d.quality > 0.0);
            if any_quality {
                prop_assert!((weight_sum - 1.0).abs() < 1e-6, "weights sum {}", weight_sum);
            }
        }

        let gap_sum: f64 = result.domains.iter().map(|d| d.gap).sum();
        prop_assert!((gap_sum - result.age_gap).abs() <= 0.1, "{} vs {}", gap_sum, result.age_gap);
        prop_assert_eq!(result.total_impact, result.age_gap);
        prop_assert!(result.age_gap.abs() <= BioAgeConfig::default().per_domain_clamp_years);
    }

    #[test]
    fn calculation_is_idempotent(age in 18.0f64..95.0, metrics in arb_metrics()) {
        let first = calculate_bio_age(age, &metrics, None).unwrap();
        let second = calculate_bio_age(age, &metrics, None).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn input_order_does_not_matter(age in 18.0f64..95.0, metrics in arb_metrics()) {
        let mut reversed = metrics.clone();
        reversed.reverse();
        let forward = calculate_bio_age(age, &metrics, None).unwrap();
        let backward = calculate_bio_age(age, &reversed, None).unwrap();
        prop_assert_eq!(forward, backward);
    }
}
