use noise::Perlin;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::VisualizationResult;
use crate::particles::engine::{
    active_count_for, next_instance_id, EngineBackend, GlobalParams, ParticleEngine,
    ParticleRenderSource,
};
use crate::particles::particle::{Particle, ParticleProperties, PrecipitationKind, SimulationBounds};
use crate::particles::particle_data::{prepare_render_data, ParticleData, ParticleVertex};
use crate::particles::update::{spawn_initial, update_particles};

/// CPU particle simulation over an SOA pool
pub struct CpuParticleSystem {
    kind: PrecipitationKind,
    instance_id: u64,
    properties: ParticleProperties,
    bounds: SimulationBounds,
    particles: ParticleData,
    render_data: Vec<ParticleVertex>,
    noise: Perlin,
    rng: StdRng,
    intensity: f32,
}

impl CpuParticleSystem {
    pub fn new(kind: PrecipitationKind, capacity: usize, bounds: SimulationBounds) -> Self {
        Self::with_rng(kind, capacity, bounds, StdRng::from_entropy())
    }

    /// Deterministic construction for tests and benchmarks
    pub fn with_seed(kind: PrecipitationKind, capacity: usize, bounds: SimulationBounds, seed: u64) -> Self {
        Self::with_rng(kind, capacity, bounds, StdRng::seed_from_u64(seed))
    }

    fn with_rng(kind: PrecipitationKind, capacity: usize, bounds: SimulationBounds, mut rng: StdRng) -> Self {
        let properties = ParticleProperties::for_kind(kind);
        let mut particles = ParticleData::new(capacity);
        spawn_initial(&mut particles, &properties, &bounds, &mut rng);
        let noise = Perlin::new(rng.gen());

        let mut system = Self {
            kind,
            instance_id: next_instance_id(),
            properties,
            bounds,
            particles,
            render_data: Vec::with_capacity(capacity),
            noise,
            rng,
            intensity: 1.0,
        };
        system.refresh_render_data();

        log::debug!(
            "[CpuParticleSystem] Created {:?} system with {} particles",
            kind,
            capacity
        );
        system
    }

    pub fn bounds(&self) -> &SimulationBounds {
        &self.bounds
    }

    pub fn particles(&self) -> &ParticleData {
        &self.particles
    }

    fn refresh_render_data(&mut self) {
        let count = active_count_for(self.particles.len(), self.intensity);
        prepare_render_data(&self.particles, count, &mut self.render_data);
    }
}

impl ParticleEngine for CpuParticleSystem {
    fn kind(&self) -> PrecipitationKind {
        self.kind
    }

    fn backend(&self) -> EngineBackend {
        EngineBackend::Cpu
    }

    fn instance_id(&self) -> u64 {
        self.instance_id
    }

    fn capacity(&self) -> usize {
        self.particles.len()
    }

    fn properties(&self) -> &ParticleProperties {
        &self.properties
    }

    fn step(&mut self, dt: f32, params: &GlobalParams) -> VisualizationResult<()> {
        update_particles(
            &mut self.particles,
            &self.properties,
            &self.bounds,
            params,
            &self.noise,
            &mut self.rng,
            dt,
        );
        self.refresh_render_data();
        Ok(())
    }

    fn set_intensity(&mut self, intensity: f32) {
        self.intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.refresh_render_data();
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }

    fn render_source(&self) -> ParticleRenderSource<'_> {
        ParticleRenderSource::Vertices(&self.render_data)
    }

    fn snapshot(&mut self) -> VisualizationResult<Vec<Particle>> {
        Ok(self.particles.to_particles())
    }
}
