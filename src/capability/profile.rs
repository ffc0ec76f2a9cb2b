use serde::{Deserialize, Serialize};

/// Immutable description of what the host can do
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CapabilityProfile {
    pub is_mobile: bool,
    pub is_high_end: bool,
    pub has_compute: bool,
    pub supports_float_buffers: bool,
    /// Fraction in [0, 1]; `None` until the host has reported a reading
    pub battery_level: Option<f32>,
    pub is_low_power: bool,
}

impl CapabilityProfile {
    /// Most conservative profile: every feature off, battery unknown
    pub fn conservative() -> Self {
        Self::default()
    }

    /// Copy of this profile carrying a resolved battery reading
    pub fn with_battery_level(self, level: f32) -> Self {
        let battery_level = if level.is_finite() {
            Some(level.clamp(0.0, 1.0))
        } else {
            None
        };
        Self {
            battery_level,
            ..self
        }
    }

    /// Whether the GPU particle path may be attempted at all
    pub fn gpu_capable(&self) -> bool {
        self.has_compute && self.supports_float_buffers && !self.is_mobile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conservative_profile() {
        let profile = CapabilityProfile::conservative();
        assert!(!profile.is_mobile);
        assert!(!profile.has_compute);
        assert!(profile.battery_level.is_none());
        assert!(!profile.gpu_capable());
    }

    #[test]
    fn test_with_battery_level_clamps_and_rejects_nan() {
        let base = CapabilityProfile {
            has_compute: true,
            ..Default::default()
        };

        let low = base.with_battery_level(-0.5);
        assert_eq!(low.battery_level, Some(0.0));
        assert!(low.has_compute);

        let full = base.with_battery_level(3.0);
        assert_eq!(full.battery_level, Some(1.0));

        let unknown = base.with_battery_level(f32::NAN);
        assert_eq!(unknown.battery_level, None);

        // the original value is untouched
        assert_eq!(base.battery_level, None);
    }

    #[test]
    fn test_mobile_is_never_gpu_capable() {
        let profile = CapabilityProfile {
            is_mobile: true,
            has_compute: true,
            supports_float_buffers: true,
            ..Default::default()
        };
        assert!(!profile.gpu_capable());
    }
}
