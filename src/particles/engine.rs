//! Common interface over the CPU and GPU particle simulations

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::VisualizationResult;
use crate::gpu::GpuContext;
use crate::particles::gpu_particle_system::GpuParticleSystem;
use crate::particles::particle::{Particle, ParticleProperties, PrecipitationKind, SimulationBounds};
use crate::particles::particle_data::ParticleVertex;
use crate::particles::system::CpuParticleSystem;

/// Which simulation path an engine runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineBackend {
    Cpu,
    Gpu,
}

/// Per-frame inputs shared by every engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalParams {
    /// Seconds since the composer started (drives noise and sway)
    pub time: f32,
    /// Wind velocity in world units per second
    pub wind: Vec3,
    pub wind_enabled: bool,
    /// Multiplier on each kind's own turbulence
    pub turbulence: f32,
    /// Animation speed; scales displacement per step
    pub velocity_scale: f32,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            time: 0.0,
            wind: Vec3::ZERO,
            wind_enabled: false,
            turbulence: 1.0,
            velocity_scale: 1.0,
        }
    }
}

/// Where the renderer reads particles from
pub enum ParticleRenderSource<'a> {
    /// CPU path: one vertex per visible particle
    Vertices(&'a [ParticleVertex]),
    /// GPU path: sample position/lifetime and velocity textures
    Textures {
        position_lifetime: &'a wgpu::TextureView,
        velocity: &'a wgpu::TextureView,
        texture_size: u32,
        /// Number of texels (row-major) to draw
        count: usize,
    },
}

impl ParticleRenderSource<'_> {
    pub fn count(&self) -> usize {
        match self {
            ParticleRenderSource::Vertices(v) => v.len(),
            ParticleRenderSource::Textures { count, .. } => *count,
        }
    }
}

pub trait ParticleEngine {
    fn kind(&self) -> PrecipitationKind;

    fn backend(&self) -> EngineBackend;

    /// Unique per constructed engine; lets callers detect re-creation
    fn instance_id(&self) -> u64;

    /// Total simulated particles
    fn capacity(&self) -> usize;

    fn properties(&self) -> &ParticleProperties;

    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32, params: &GlobalParams) -> VisualizationResult<()>;

    /// Visible fraction of the pool, clamped to [0, 1]
    fn set_intensity(&mut self, intensity: f32);

    fn intensity(&self) -> f32;

    /// Particles the renderer should draw
    fn active_count(&self) -> usize {
        active_count_for(self.capacity(), self.intensity())
    }

    fn render_source(&self) -> ParticleRenderSource<'_>;

    /// Copy the full particle state back to the host
    fn snapshot(&mut self) -> VisualizationResult<Vec<Particle>>;
}

pub fn active_count_for(capacity: usize, intensity: f32) -> usize {
    let intensity = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((capacity as f32 * intensity).ceil() as usize).min(capacity)
}

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_instance_id() -> u64 {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Build an engine on the GPU when a context is given, otherwise on the CPU
pub fn create_engine(
    kind: PrecipitationKind,
    capacity: usize,
    bounds: SimulationBounds,
    gpu: Option<&Arc<GpuContext>>,
) -> VisualizationResult<Box<dyn ParticleEngine>> {
    match gpu {
        Some(context) => {
            let engine = GpuParticleSystem::new(Arc::clone(context), kind, capacity, bounds)?;
            Ok(Box::new(engine))
        }
        None => Ok(Box::new(CpuParticleSystem::new(kind, capacity, bounds))),
    }
}
