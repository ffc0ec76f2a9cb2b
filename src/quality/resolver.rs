use serde::{Deserialize, Serialize};

use crate::capability::CapabilityProfile;
use crate::constants::quality::{LOW_BATTERY_PARTICLE_MULTIPLIER, LOW_BATTERY_THRESHOLD};
use crate::quality::settings::{QualityTier, VisualizationSettings};

/// Optional user choices layered over the profile rules
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityOverride {
    pub tier: Option<QualityTier>,
    pub use_gpu: Option<bool>,
    pub adaptive_quality: Option<bool>,
    /// Ignored unless finite and positive
    pub particle_multiplier: Option<f32>,
}

/// Resolve settings with the default low-battery threshold
pub fn resolve(
    profile: &CapabilityProfile,
    user_override: Option<&QualityOverride>,
) -> VisualizationSettings {
    resolve_with_threshold(profile, user_override, LOW_BATTERY_THRESHOLD)
}

/// Pure profile -> settings mapping.
///
/// Rules, first match wins: mobile -> Low, high-end -> High, otherwise Medium.
/// User overrides come next. A known battery level below the threshold
/// forces Low with the reduced particle budget regardless of anything else.
pub fn resolve_with_threshold(
    profile: &CapabilityProfile,
    user_override: Option<&QualityOverride>,
    low_battery_threshold: f32,
) -> VisualizationSettings {
    let tier = if profile.is_mobile {
        QualityTier::Low
    } else if profile.is_high_end {
        QualityTier::High
    } else {
        QualityTier::Medium
    };

    let mut settings = settings_for_tier(tier, profile);

    if let Some(ov) = user_override {
        if let Some(tier) = ov.tier {
            settings = VisualizationSettings {
                use_gpu: settings.use_gpu,
                adaptive_quality: settings.adaptive_quality,
                ..settings_for_tier(tier, profile)
            };
        }
        if let Some(use_gpu) = ov.use_gpu {
            settings.use_gpu = use_gpu;
        }
        if let Some(adaptive) = ov.adaptive_quality {
            settings.adaptive_quality = adaptive;
        }
        if let Some(multiplier) = ov.particle_multiplier.filter(|m| m.is_finite() && *m > 0.0) {
            settings.particle_multiplier = multiplier;
        }
    }

    if is_low_battery(profile, low_battery_threshold) {
        settings = VisualizationSettings {
            particle_multiplier: LOW_BATTERY_PARTICLE_MULTIPLIER,
            use_gpu: settings.use_gpu,
            adaptive_quality: settings.adaptive_quality,
            ..settings_for_tier(QualityTier::Low, profile)
        };
    }

    settings
}

/// Settings for an explicitly chosen tier on this host
pub fn settings_for_tier(tier: QualityTier, profile: &CapabilityProfile) -> VisualizationSettings {
    let mut settings = VisualizationSettings::for_tier(tier);
    settings.use_gpu = profile.gpu_capable();
    if profile.is_mobile {
        settings.shadows_enabled = false;
        settings.post_processing_enabled = false;
    }
    if profile.is_low_power {
        settings.post_processing_enabled = false;
    }
    settings
}

/// Battery known and below threshold. An unknown level is never "low".
pub fn is_low_battery(profile: &CapabilityProfile, threshold: f32) -> bool {
    matches!(profile.battery_level, Some(level) if level < threshold)
}
