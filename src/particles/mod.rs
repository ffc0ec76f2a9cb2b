//! Precipitation particle simulation
//!
//! Rain and snow share one kinematic model with per-kind parameters. The CPU
//! path steps an SOA pool; the GPU path runs the same model in two compute
//! passes over ping-pong textures.

pub mod engine;
pub mod gpu_particle_system;
pub mod particle;
pub mod particle_data;
pub mod shaders;
pub mod system;
pub mod update;

pub use engine::{
    create_engine, EngineBackend, GlobalParams, ParticleEngine, ParticleRenderSource,
};
pub use gpu_particle_system::{texture_side_for, GpuParticleSystem};
pub use particle::{Particle, ParticleProperties, PrecipitationKind, SimulationBounds};
pub use particle_data::{ParticleData, ParticleVertex};
pub use system::CpuParticleSystem;
