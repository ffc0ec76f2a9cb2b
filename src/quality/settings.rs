use serde::{Deserialize, Serialize};

use crate::constants::quality::*;

/// Discrete quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [QualityTier::Low, QualityTier::Medium, QualityTier::High];

    /// One step down, saturating at Low
    pub fn lower(self) -> Self {
        match self {
            QualityTier::High => QualityTier::Medium,
            QualityTier::Medium | QualityTier::Low => QualityTier::Low,
        }
    }

    /// One step up, saturating at High
    pub fn higher(self) -> Self {
        match self {
            QualityTier::Low => QualityTier::Medium,
            QualityTier::Medium | QualityTier::High => QualityTier::High,
        }
    }

    pub fn particle_multiplier(self) -> f32 {
        match self {
            QualityTier::Low => LOW_PARTICLE_MULTIPLIER,
            QualityTier::Medium => MEDIUM_PARTICLE_MULTIPLIER,
            QualityTier::High => HIGH_PARTICLE_MULTIPLIER,
        }
    }

    pub fn terrain_detail(self) -> u32 {
        match self {
            QualityTier::Low => LOW_TERRAIN_DETAIL,
            QualityTier::Medium => MEDIUM_TERRAIN_DETAIL,
            QualityTier::High => HIGH_TERRAIN_DETAIL,
        }
    }

    pub fn texture_resolution(self) -> u32 {
        match self {
            QualityTier::Low => LOW_TEXTURE_RESOLUTION,
            QualityTier::Medium => MEDIUM_TEXTURE_RESOLUTION,
            QualityTier::High => HIGH_TEXTURE_RESOLUTION,
        }
    }
}

/// Resolved rendering configuration.
///
/// Always replaced as a whole when the quality tier changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSettings {
    pub quality_tier: QualityTier,
    pub use_gpu: bool,
    pub particle_multiplier: f32,
    pub shadows_enabled: bool,
    pub post_processing_enabled: bool,
    pub terrain_detail: u32,
    pub texture_resolution: u32,
    pub adaptive_quality: bool,
}

impl VisualizationSettings {
    /// Table defaults for a tier
    pub fn for_tier(tier: QualityTier) -> Self {
        let rich = tier != QualityTier::Low;
        Self {
            quality_tier: tier,
            use_gpu: false,
            particle_multiplier: tier.particle_multiplier(),
            shadows_enabled: rich,
            post_processing_enabled: rich,
            terrain_detail: tier.terrain_detail(),
            texture_resolution: tier.texture_resolution(),
            adaptive_quality: true,
        }
    }

    /// Number of pool slots for an effect with the given base count
    pub fn particle_capacity(&self, base_count: usize) -> usize {
        ((base_count as f32) * self.particle_multiplier).round().max(1.0) as usize
    }
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        Self::for_tier(QualityTier::Medium)
    }
}
