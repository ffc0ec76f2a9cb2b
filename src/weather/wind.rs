//! Eased wind with periodic gusts

use glam::Vec3;

use crate::constants::atmosphere::{WIND_GUST_FREQUENCY, WIND_GUST_STRENGTH, WIND_TRANSITION_SPEED};
use crate::constants::particles::WIND_FORCE_SCALE;

/// Seconds a gust takes to rise and fall
const GUST_DURATION: f32 = 0.2;

/// Horizontal unit vector for a compass bearing (north = -Z, east = +X)
pub fn direction_vector(bearing_deg: f32) -> Vec3 {
    let angle = bearing_deg.to_radians();
    Vec3::new(angle.sin(), 0.0, -angle.cos())
}

/// Wind force shared by every particle emitter in a composer
#[derive(Debug, Clone)]
pub struct WindField {
    current: Vec3,
    target: Vec3,
    /// Seconds since the last gust started
    since_gust: f32,
    gust_period: f32,
}

impl Default for WindField {
    fn default() -> Self {
        Self::new()
    }
}

impl WindField {
    pub fn new() -> Self {
        Self {
            current: Vec3::ZERO,
            target: Vec3::ZERO,
            since_gust: GUST_DURATION,
            gust_period: 1.0 / WIND_GUST_FREQUENCY,
        }
    }

    /// Aim at the wind for a compass bearing and normalised strength
    pub fn set_target(&mut self, bearing_deg: f32, strength: f32) {
        let strength = if strength.is_finite() { strength.clamp(0.0, 1.0) } else { 0.0 };
        self.target = direction_vector(bearing_deg) * strength * WIND_FORCE_SCALE;
    }

    /// Jump straight to the target, skipping the easing
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    pub fn update(&mut self, dt: f32) {
        let blend = (WIND_TRANSITION_SPEED * dt).min(1.0);
        self.current = self.current.lerp(self.target, blend);

        self.since_gust += dt;
        if self.since_gust >= self.gust_period {
            self.since_gust -= self.gust_period;
        }
    }

    /// Current force including any gust in progress
    pub fn wind_vector(&self) -> Vec3 {
        self.current * (1.0 + self.gust_envelope() * WIND_GUST_STRENGTH * 0.1)
    }

    /// Gust amplitude in [0, 1]
    fn gust_envelope(&self) -> f32 {
        if self.since_gust >= GUST_DURATION {
            return 0.0;
        }
        (self.since_gust / GUST_DURATION * std::f32::consts::PI).sin()
    }

    /// Compass bearing the wind blows toward, in [0, 360)
    pub fn bearing(&self) -> f32 {
        self.current.x.atan2(-self.current.z).to_degrees().rem_euclid(360.0)
    }

    pub fn speed(&self) -> f32 {
        self.current.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_vector_axes() {
        let north = direction_vector(0.0);
        assert!(north.x.abs() < 1e-5 && north.z < -0.99);

        let east = direction_vector(90.0);
        assert!(east.x > 0.99 && east.z.abs() < 1e-5);
        assert_eq!(east.y, 0.0);
    }

    #[test]
    fn test_wind_eases_toward_target() {
        let mut wind = WindField::new();
        wind.set_target(90.0, 1.0);

        wind.update(0.5);
        let partial = wind.speed();
        assert!(partial > 0.0 && partial < WIND_FORCE_SCALE);

        for _ in 0..200 {
            wind.update(0.1);
        }
        assert!((wind.speed() - WIND_FORCE_SCALE).abs() < 0.01);
        assert!((wind.bearing() - 90.0).abs() < 0.5);
    }

    #[test]
    fn test_snap_and_calm() {
        let mut wind = WindField::new();
        wind.set_target(180.0, 0.5);
        wind.snap_to_target();
        assert!((wind.speed() - WIND_FORCE_SCALE * 0.5).abs() < 1e-4);
        assert!((wind.bearing() - 180.0).abs() < 0.5);

        wind.set_target(0.0, 0.0);
        wind.snap_to_target();
        assert_eq!(wind.wind_vector(), Vec3::ZERO);
    }

    #[test]
    fn test_gust_boosts_then_fades() {
        let mut wind = WindField::new();
        wind.set_target(270.0, 1.0);
        wind.snap_to_target();
        let base = wind.wind_vector().length();

        // walk to just past the start of the next gust
        let mut t = 0.0;
        while t < 1.0 / WIND_GUST_FREQUENCY - GUST_DURATION + 0.1 {
            wind.update(0.05);
            t += 0.05;
        }
        let mut peak = base;
        for _ in 0..8 {
            wind.update(0.05);
            peak = peak.max(wind.wind_vector().length());
        }
        assert!(peak > base);

        wind.update(GUST_DURATION);
        assert!((wind.wind_vector().length() - base).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_strength_is_calm() {
        let mut wind = WindField::new();
        wind.set_target(45.0, f32::NAN);
        wind.snap_to_target();
        assert_eq!(wind.speed(), 0.0);
    }
}
