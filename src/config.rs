//! Engine configuration
//!
//! Loaded from TOML (or built from `Default`) and handed to the orchestrator
//! once at construction. Every field has a default so partial files work.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{monitor, particles, quality, transitions};
use crate::error::{VisualizationError, VisualizationResult};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VisualizationConfig {
    pub monitor: MonitorConfig,
    pub particles: ParticleConfig,
    pub transitions: TransitionConfig,
    pub quality: QualityConfig,
}

/// Performance monitor tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub sample_window_secs: f32,
    pub min_fps: f32,
    pub target_fps: f32,
    pub upgrade_factor: f32,
    pub downgrade_cooldown_windows: u32,
    pub upgrade_cooldown_windows: u32,
    pub metrics_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_window_secs: monitor::SAMPLE_WINDOW_SECS,
            min_fps: monitor::MIN_FPS,
            target_fps: monitor::TARGET_FPS,
            upgrade_factor: monitor::UPGRADE_FACTOR,
            downgrade_cooldown_windows: monitor::DOWNGRADE_COOLDOWN_WINDOWS,
            upgrade_cooldown_windows: monitor::UPGRADE_COOLDOWN_WINDOWS,
            metrics_capacity: monitor::METRICS_CAPACITY,
        }
    }
}

/// Particle pool sizing and simulation volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub rain_base_count: usize,
    pub snow_base_count: usize,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub spawn_depth: f32,
    /// Allow the GPU engine when the resolved settings permit it
    pub prefer_gpu: bool,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            rain_base_count: particles::RAIN_BASE_COUNT,
            snow_base_count: particles::SNOW_BASE_COUNT,
            bounds_min: Vec3::from_array(particles::BOUNDS_MIN),
            bounds_max: Vec3::from_array(particles::BOUNDS_MAX),
            spawn_depth: particles::SPAWN_DEPTH,
            prefer_gpu: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub default_duration_ms: u64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: transitions::DEFAULT_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub low_battery_threshold: f32,
    pub adaptive_quality: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            low_battery_threshold: quality::LOW_BATTERY_THRESHOLD,
            adaptive_quality: true,
        }
    }
}

impl VisualizationConfig {
    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> VisualizationResult<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| VisualizationError::ConfigParse(e.to_string()))?;
        Ok(config.validated())
    }

    /// Load a TOML file from disk
    pub fn load(path: impl AsRef<Path>) -> VisualizationResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        log::info!("[Config] Loaded visualization config from {}", path.display());
        Self::from_toml_str(&raw)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> VisualizationResult<String> {
        toml::to_string_pretty(self).map_err(|e| VisualizationError::ConfigParse(e.to_string()))
    }

    /// Replace nonsensical values with defaults
    pub fn validated(mut self) -> Self {
        let defaults = MonitorConfig::default();
        let m = &mut self.monitor;
        if !(m.sample_window_secs.is_finite() && m.sample_window_secs > 0.0) {
            log::warn!("[Config] Invalid sample window {}, using default", m.sample_window_secs);
            m.sample_window_secs = defaults.sample_window_secs;
        }
        if !(m.min_fps.is_finite() && m.min_fps > 0.0) {
            m.min_fps = defaults.min_fps;
        }
        if !(m.target_fps.is_finite() && m.target_fps >= m.min_fps) {
            m.target_fps = defaults.target_fps.max(m.min_fps);
        }
        if !(m.upgrade_factor.is_finite() && m.upgrade_factor >= 1.0) {
            m.upgrade_factor = defaults.upgrade_factor;
        }
        if m.metrics_capacity == 0 {
            m.metrics_capacity = defaults.metrics_capacity;
        }

        let p = &mut self.particles;
        let (lo, hi) = (p.bounds_min.min(p.bounds_max), p.bounds_min.max(p.bounds_max));
        p.bounds_min = lo;
        p.bounds_max = hi;
        p.spawn_depth = p.spawn_depth.clamp(0.0, hi.y - lo.y);

        let q = &mut self.quality;
        if !q.low_battery_threshold.is_finite() {
            q.low_battery_threshold = quality::LOW_BATTERY_THRESHOLD;
        }
        q.low_battery_threshold = q.low_battery_threshold.clamp(0.0, 1.0);

        self
    }
}
