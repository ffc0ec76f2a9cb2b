//! Distance fog derived from meteorological visibility

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::activation::FOG_VISIBILITY;
use crate::constants::atmosphere::{DEFAULT_FOG_COLOR, FOG_MIN_START};

/// Koschmieder constant: ln(1 / 0.02) for a 2% contrast threshold
const KOSCHMIEDER: f32 = 3.912;

/// Visibility band, used by renderers that pick a fog shader variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FogDensity {
    None,
    Light,
    Medium,
    Heavy,
    VeryHeavy,
}

impl FogDensity {
    pub fn from_visibility(visibility: f32) -> Self {
        if visibility >= FOG_VISIBILITY {
            FogDensity::None
        } else if visibility >= 2000.0 {
            FogDensity::Light
        } else if visibility >= 1000.0 {
            FogDensity::Medium
        } else if visibility >= 300.0 {
            FogDensity::Heavy
        } else {
            FogDensity::VeryHeavy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogSettings {
    pub density: FogDensity,
    pub color: Vec3,
    /// Linear fog ramp in world units
    pub start_distance: f32,
    pub end_distance: f32,
    /// Exponential extinction coefficient per world unit
    pub extinction: f32,
}

impl FogSettings {
    /// Fog that reaches full opacity at the visibility distance (meters)
    pub fn from_visibility(visibility: f32, color: Vec3) -> Self {
        let end_distance = visibility.max(FOG_MIN_START * 2.0);
        Self {
            density: FogDensity::from_visibility(visibility),
            color,
            start_distance: (end_distance * 0.1).max(FOG_MIN_START),
            end_distance,
            extinction: KOSCHMIEDER / end_distance,
        }
    }

    /// Linear fog amount in [0, 1] at `distance`
    pub fn linear_factor(&self, distance: f32) -> f32 {
        if self.density == FogDensity::None {
            return 0.0;
        }
        let span = self.end_distance - self.start_distance;
        ((distance - self.start_distance) / span).clamp(0.0, 1.0)
    }

    /// Exponential fog amount in [0, 1] at `distance`
    pub fn exponential_factor(&self, distance: f32) -> f32 {
        if self.density == FogDensity::None {
            return 0.0;
        }
        1.0 - (-self.extinction * distance.max(0.0)).exp()
    }
}

impl Default for FogSettings {
    fn default() -> Self {
        Self::from_visibility(FOG_VISIBILITY, Vec3::from_array(DEFAULT_FOG_COLOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_bands() {
        assert_eq!(FogDensity::from_visibility(10_000.0), FogDensity::None);
        assert_eq!(FogDensity::from_visibility(4999.0), FogDensity::Light);
        assert_eq!(FogDensity::from_visibility(1500.0), FogDensity::Medium);
        assert_eq!(FogDensity::from_visibility(500.0), FogDensity::Heavy);
        assert_eq!(FogDensity::from_visibility(50.0), FogDensity::VeryHeavy);
    }

    #[test]
    fn test_denser_fog_starts_closer() {
        let color = Vec3::from_array(DEFAULT_FOG_COLOR);
        let light = FogSettings::from_visibility(3000.0, color);
        let heavy = FogSettings::from_visibility(400.0, color);

        assert!(light.start_distance > heavy.start_distance);
        assert!(light.end_distance > heavy.end_distance);
        assert!(heavy.extinction > light.extinction);
        assert!(heavy.linear_factor(10.0) < heavy.linear_factor(390.0));
        assert_eq!(heavy.linear_factor(1000.0), 1.0);
    }

    #[test]
    fn test_exponential_fog_hits_threshold_at_visibility() {
        let fog = FogSettings::from_visibility(1000.0, Vec3::ONE);
        assert!((fog.exponential_factor(1000.0) - 0.98).abs() < 1e-3);
        assert_eq!(fog.exponential_factor(-5.0), 0.0);
    }

    #[test]
    fn test_clear_air_has_no_fog() {
        let clear = FogSettings::default();
        assert_eq!(clear.density, FogDensity::None);
        assert_eq!(clear.linear_factor(1e6), 0.0);
        assert_eq!(clear.exponential_factor(1e6), 0.0);
    }

    #[test]
    fn test_zero_visibility_stays_well_formed() {
        let fog = FogSettings::from_visibility(0.0, Vec3::ONE);
        assert!(fog.end_distance > fog.start_distance);
        assert!(fog.extinction.is_finite());
        assert_eq!(fog.linear_factor(fog.end_distance), 1.0);
    }
}
