//! Quality tiers and the pure settings resolver

pub mod resolver;
pub mod settings;

pub use resolver::{
    is_low_battery, resolve, resolve_with_threshold, settings_for_tier, QualityOverride,
};
pub use settings::{QualityTier, VisualizationSettings};
