//! BioAge Engine - Deterministic biological-age scoring from wearable metrics
//!
//! The engine turns a sparse, variably fresh set of physiological readings into
//! a biological-age estimate through a deterministic pipeline:
//! feature extraction → per-domain gap and quality → quality-gated blending with
//! shrinkage → bio age and pace of aging.
//!
//! ## Domains
//!
//! - **Fitness**: VO2 max
//! - **Autonomic**: resting HR, HRV, HRV variability
//! - **Sleep**: duration, efficiency, timing regularity
//! - **Mobility**: walking speed
//! - **Circadian**: pre-computed rhythm bundle (RA, IS, IV)

pub mod blender;
pub mod config;
pub mod domains;
pub mod engine;
pub mod error;
pub mod features;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{default_bio_age_config, BioAgeConfig, CONFIG_VERSION};
pub use engine::{bio_age_from_json, calculate_bio_age, BioAgeEngine};
pub use error::ComputeError;
pub use types::{
    BioAgeRequest, BioAgeResult, CircadianFeatures, Domain, DomainResult, MetricContribution,
    MetricKey, MetricReading, WearableFeatures,
};

/// Engine version embedded in CLI and FFI reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "bioage-engine";
