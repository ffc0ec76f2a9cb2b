use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::atmosphere::{
    CLOUD_ALTITUDE, CLOUD_DRIFT_FACTOR, LIGHTNING_DECAY_RATE, LIGHTNING_MEAN_INTERVAL,
};
use crate::scene::{NodeUniforms, RenderNode};
use crate::weather::{EffectParameters, FogSettings, WeatherState};

/// Non-particle effect driven by the composer
pub trait AtmosphereEffect {
    fn render_node(&self) -> RenderNode;

    /// Take new weather, style and intensity. Must not reallocate.
    fn configure(&mut self, state: &WeatherState, style: &EffectParameters, intensity: f32);

    /// Per-frame animation; `wind` is the current wind vector
    fn tick(&mut self, _dt: f32, _wind: Vec3) {}

    fn uniforms(&self) -> NodeUniforms;
}

/// Distance fog derived from visibility
#[derive(Debug, Clone)]
pub struct FogLayer {
    settings: FogSettings,
    intensity: f32,
}

impl FogLayer {
    pub fn new(state: &WeatherState, style: &EffectParameters, intensity: f32) -> Self {
        let mut fog = Self {
            settings: FogSettings::default(),
            intensity: 0.0,
        };
        fog.configure(state, style, intensity);
        fog
    }

    pub fn settings(&self) -> &FogSettings {
        &self.settings
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }
}

impl AtmosphereEffect for FogLayer {
    fn render_node(&self) -> RenderNode {
        RenderNode::Fog(self.settings.clone())
    }

    fn configure(&mut self, state: &WeatherState, style: &EffectParameters, intensity: f32) {
        self.settings = FogSettings::from_visibility(state.visibility, style.fog_color);
        self.intensity = intensity;
    }

    fn uniforms(&self) -> NodeUniforms {
        NodeUniforms::Fog {
            intensity: self.intensity,
            settings: self.settings.clone(),
        }
    }
}

/// Coverage-driven cloud deck drifting with the wind
#[derive(Debug, Clone)]
pub struct CloudLayer {
    opacity: f32,
    darkness: f32,
    offset: Vec2,
}

impl CloudLayer {
    pub fn new(state: &WeatherState, style: &EffectParameters, intensity: f32) -> Self {
        let mut clouds = Self {
            opacity: 0.0,
            darkness: 0.0,
            offset: Vec2::ZERO,
        };
        clouds.configure(state, style, intensity);
        clouds
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }
}

impl AtmosphereEffect for CloudLayer {
    fn render_node(&self) -> RenderNode {
        RenderNode::CloudLayer {
            altitude: CLOUD_ALTITUDE,
        }
    }

    fn configure(&mut self, state: &WeatherState, style: &EffectParameters, intensity: f32) {
        self.opacity = intensity;
        // Storms darken the deck regardless of the preset style
        let storm_darkness = if state.storm { 0.8 } else { 0.0 };
        self.darkness = style.cloud_darkness.max(storm_darkness).clamp(0.0, 1.0);
    }

    fn tick(&mut self, dt: f32, wind: Vec3) {
        self.offset += Vec2::new(wind.x, wind.z) * CLOUD_DRIFT_FACTOR * dt;
    }

    fn uniforms(&self) -> NodeUniforms {
        NodeUniforms::CloudLayer {
            opacity: self.opacity,
            darkness: self.darkness,
            offset: self.offset,
        }
    }
}

/// Randomly scheduled lightning strikes with exponential flash decay
#[derive(Debug, Clone)]
pub struct LightningFlash {
    intensity: f32,
    frequency: f32,
    ambient_tint: Vec3,
    brightness: f32,
    next_strike_in: f32,
    strikes: u64,
    rng: StdRng,
}

impl LightningFlash {
    pub fn new(state: &WeatherState, style: &EffectParameters, intensity: f32) -> Self {
        Self::with_rng(state, style, intensity, StdRng::from_entropy())
    }

    pub fn with_seed(state: &WeatherState, style: &EffectParameters, intensity: f32, seed: u64) -> Self {
        Self::with_rng(state, style, intensity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(state: &WeatherState, style: &EffectParameters, intensity: f32, rng: StdRng) -> Self {
        let mut flash = Self {
            intensity: 0.0,
            frequency: 1.0,
            ambient_tint: style.ambient_tint,
            brightness: 0.0,
            next_strike_in: 0.0,
            strikes: 0,
            rng,
        };
        flash.configure(state, style, intensity);
        flash.next_strike_in = flash.sample_interval();
        flash
    }

    /// Mean seconds between strikes at the current frequency
    pub fn mean_interval(&self) -> f32 {
        LIGHTNING_MEAN_INTERVAL / self.frequency
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn strikes(&self) -> u64 {
        self.strikes
    }

    fn sample_interval(&mut self) -> f32 {
        // Exponential inter-arrival times
        let u: f32 = self.rng.gen_range(0.0..1.0);
        -(1.0 - u).ln() * self.mean_interval()
    }
}

impl AtmosphereEffect for LightningFlash {
    fn render_node(&self) -> RenderNode {
        RenderNode::Lightning
    }

    fn configure(&mut self, _state: &WeatherState, style: &EffectParameters, intensity: f32) {
        self.intensity = intensity;
        self.frequency = if style.lightning_frequency.is_finite() {
            style.lightning_frequency.max(0.01)
        } else {
            1.0
        };
        self.ambient_tint = style.ambient_tint;
    }

    fn tick(&mut self, dt: f32, _wind: Vec3) {
        self.brightness *= (-LIGHTNING_DECAY_RATE * dt).exp();
        self.next_strike_in -= dt;
        if self.next_strike_in <= 0.0 {
            self.brightness = self.intensity;
            self.strikes += 1;
            self.next_strike_in = self.sample_interval();
            log::trace!("[LightningFlash] Strike #{}", self.strikes);
        }
    }

    fn uniforms(&self) -> NodeUniforms {
        NodeUniforms::Lightning {
            brightness: self.brightness,
            ambient_tint: self.ambient_tint,
        }
    }
}

/// Visible wind (streaks, debris) following the wind field
#[derive(Debug, Clone)]
pub struct WindEffect {
    intensity: f32,
    vector: Vec3,
}

impl WindEffect {
    pub fn new(state: &WeatherState, style: &EffectParameters, intensity: f32) -> Self {
        let mut wind = Self {
            intensity: 0.0,
            vector: Vec3::ZERO,
        };
        wind.configure(state, style, intensity);
        wind
    }

    pub fn vector(&self) -> Vec3 {
        self.vector
    }
}

impl AtmosphereEffect for WindEffect {
    fn render_node(&self) -> RenderNode {
        RenderNode::Wind
    }

    fn configure(&mut self, _state: &WeatherState, _style: &EffectParameters, intensity: f32) {
        self.intensity = intensity;
    }

    fn tick(&mut self, _dt: f32, wind: Vec3) {
        self.vector = wind;
    }

    fn uniforms(&self) -> NodeUniforms {
        NodeUniforms::Wind {
            intensity: self.intensity,
            vector: self.vector,
        }
    }
}
