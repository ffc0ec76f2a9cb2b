use glam::{Vec3, Vec4};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::particles::*;

/// A single precipitation particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds left before respawn
    pub lifetime: f32,
}

/// Particle-driven precipitation effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrecipitationKind {
    Rain,
    Snow,
}

impl PrecipitationKind {
    pub fn base_count(self, rain: usize, snow: usize) -> usize {
        match self {
            PrecipitationKind::Rain => rain,
            PrecipitationKind::Snow => snow,
        }
    }
}

/// Per-kind physical and visual parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleProperties {
    /// Downward acceleration
    pub gravity: f32,
    /// Lifetime lost per second
    pub decay_rate: f32,
    /// Vertical velocity given on respawn
    pub base_velocity: f32,
    /// Random velocity spread on respawn
    pub jitter: f32,
    pub turbulence: f32,
    /// Rate at which horizontal velocity follows the wind
    pub wind_response: f32,
    /// Horizontal sway amplitude
    pub oscillation: f32,
    pub oscillation_frequency: f32,
    pub size: f32,
    pub color: Vec4,
}

impl ParticleProperties {
    pub fn for_kind(kind: PrecipitationKind) -> Self {
        match kind {
            PrecipitationKind::Rain => Self {
                gravity: RAIN_GRAVITY,
                decay_rate: RAIN_DECAY_RATE,
                base_velocity: RAIN_BASE_VELOCITY,
                jitter: RAIN_JITTER,
                turbulence: RAIN_TURBULENCE,
                wind_response: RAIN_WIND_RESPONSE,
                oscillation: 0.0,
                oscillation_frequency: 0.0,
                size: RAIN_SIZE,
                color: Vec4::from_array(RAIN_COLOR),
            },
            PrecipitationKind::Snow => Self {
                gravity: SNOW_GRAVITY,
                decay_rate: SNOW_DECAY_RATE,
                base_velocity: SNOW_BASE_VELOCITY,
                jitter: SNOW_JITTER,
                turbulence: SNOW_TURBULENCE,
                wind_response: SNOW_WIND_RESPONSE,
                oscillation: SNOW_OSCILLATION,
                oscillation_frequency: SNOW_OSCILLATION_FREQUENCY,
                size: SNOW_SIZE,
                color: Vec4::from_array(SNOW_COLOR),
            },
        }
    }

    /// Respawn velocity: straight down plus a little random spread
    pub fn spawn_velocity(&self, rng: &mut impl Rng) -> Vec3 {
        Vec3::new(
            rng.gen_range(-1.0..=1.0) * self.jitter,
            self.base_velocity + rng.gen_range(-1.0..=1.0) * self.jitter,
            rng.gen_range(-1.0..=1.0) * self.jitter,
        )
    }
}

/// Axis-aligned simulation volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationBounds {
    pub min: Vec3,
    pub max: Vec3,
    /// Thickness of the spawn slab under `max.y`
    pub spawn_depth: f32,
}

impl Default for SimulationBounds {
    fn default() -> Self {
        Self {
            min: Vec3::from_array(BOUNDS_MIN),
            max: Vec3::from_array(BOUNDS_MAX),
            spawn_depth: SPAWN_DEPTH,
        }
    }
}

impl SimulationBounds {
    pub fn new(min: Vec3, max: Vec3, spawn_depth: f32) -> Self {
        let (lo, hi) = (min.min(max), min.max(max));
        Self {
            min: lo,
            max: hi,
            spawn_depth: spawn_depth.clamp(0.0, hi.y - lo.y),
        }
    }

    /// Particles below this height respawn
    pub fn floor(&self) -> f32 {
        self.min.y
    }

    /// Lower corner of the spawn slab
    pub fn spawn_min(&self) -> Vec3 {
        Vec3::new(self.min.x, self.max.y - self.spawn_depth, self.min.z)
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn in_spawn_slab(&self, p: Vec3) -> bool {
        p.cmpge(self.spawn_min()).all() && p.cmple(self.max).all()
    }

    /// Uniform sample from the spawn slab
    pub fn sample_spawn(&self, rng: &mut impl Rng) -> Vec3 {
        sample_box(rng, self.spawn_min(), self.max)
    }

    /// Uniform sample from the whole volume (initial fill)
    pub fn sample_volume(&self, rng: &mut impl Rng) -> Vec3 {
        sample_box(rng, self.min, self.max)
    }
}

fn sample_box(rng: &mut impl Rng, lo: Vec3, hi: Vec3) -> Vec3 {
    let t = Vec3::new(rng.gen(), rng.gen(), rng.gen());
    // lerp keeps the result inside [lo, hi] even for degenerate axes
    lo + (hi - lo) * t
}

/// Fresh lifetime in [LIFETIME_MIN, LIFETIME_MAX]
pub fn sample_lifetime(rng: &mut impl Rng) -> f32 {
    rng.gen_range(LIFETIME_MIN..=LIFETIME_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rain_and_snow_differ_as_expected() {
        let rain = ParticleProperties::for_kind(PrecipitationKind::Rain);
        let snow = ParticleProperties::for_kind(PrecipitationKind::Snow);
        assert!(rain.gravity > snow.gravity);
        assert!(rain.decay_rate > snow.decay_rate);
        assert!(rain.size < snow.size);
        assert!(snow.turbulence > rain.turbulence);
        assert!(snow.oscillation > 0.0);
        assert_eq!(rain.oscillation, 0.0);
    }

    #[test]
    fn test_spawn_samples_stay_in_slab() {
        let bounds = SimulationBounds::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let p = bounds.sample_spawn(&mut rng);
            assert!(bounds.in_spawn_slab(p));
            assert!(bounds.contains(p));
            let life = sample_lifetime(&mut rng);
            assert!((LIFETIME_MIN..=LIFETIME_MAX).contains(&life));
        }
    }

    #[test]
    fn test_bounds_normalise_corners() {
        let bounds = SimulationBounds::new(Vec3::new(5.0, 10.0, 5.0), Vec3::ZERO, 50.0);
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(5.0, 10.0, 5.0));
        assert_eq!(bounds.spawn_depth, 10.0);
        assert_eq!(bounds.spawn_min().y, 0.0);
    }

    #[test]
    fn test_spawn_velocity_points_down() {
        let rain = ParticleProperties::for_kind(PrecipitationKind::Rain);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let v = rain.spawn_velocity(&mut rng);
            assert!(v.y < 0.0);
            assert!(v.x.abs() <= rain.jitter);
        }
    }
}
