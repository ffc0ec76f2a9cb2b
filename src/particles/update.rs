use glam::Vec3;
use noise::{NoiseFn, Perlin};
use rand::Rng;

use crate::constants::particles::TURBULENCE_SCALE;
use crate::particles::engine::GlobalParams;
use crate::particles::particle::{sample_lifetime, ParticleProperties, SimulationBounds};
use crate::particles::particle_data::ParticleData;

/// One simulation step for every particle in the pool
pub fn update_particles(
    particles: &mut ParticleData,
    props: &ParticleProperties,
    bounds: &SimulationBounds,
    params: &GlobalParams,
    noise: &Perlin,
    rng: &mut impl Rng,
    dt: f32,
) {
    if dt <= 0.0 {
        return;
    }

    apply_gravity(particles, props, dt);
    if params.wind_enabled {
        apply_wind(particles, props, params.wind, dt);
    }
    let turbulence = props.turbulence * params.turbulence;
    if turbulence > 0.0 {
        apply_turbulence(particles, noise, turbulence, params.time, dt);
    }
    if props.oscillation > 0.0 {
        apply_oscillation(particles, props, params.time, dt);
    }

    integrate_motion(particles, params.velocity_scale, dt);
    update_lifetime(particles, props, dt);
    respawn_expired(particles, props, bounds, rng);
}

/// Apply gravity to all particles
pub fn apply_gravity(particles: &mut ParticleData, props: &ParticleProperties, dt: f32) {
    let dv = props.gravity * dt;
    for v in particles.velocity_y.iter_mut() {
        *v -= dv;
    }
}

/// Relax horizontal velocity toward the wind velocity
pub fn apply_wind(particles: &mut ParticleData, props: &ParticleProperties, wind: Vec3, dt: f32) {
    let k = (props.wind_response * dt).min(1.0);
    if k <= 0.0 {
        return;
    }

    for i in 0..particles.len() {
        particles.velocity_x[i] += (wind.x - particles.velocity_x[i]) * k;
        particles.velocity_z[i] += (wind.z - particles.velocity_z[i]) * k;
    }
}

/// Perlin-driven jitter, sampled at each particle's position
pub fn apply_turbulence(
    particles: &mut ParticleData,
    noise: &Perlin,
    strength: f32,
    time: f32,
    dt: f32,
) {
    let t = f64::from(time);
    let scale = strength * dt;

    for i in 0..particles.len() {
        let x = f64::from(particles.position_x[i]) * TURBULENCE_SCALE;
        let y = f64::from(particles.position_y[i]) * TURBULENCE_SCALE;
        let z = f64::from(particles.position_z[i]) * TURBULENCE_SCALE;

        // Offset the three lookups so the axes decorrelate
        let nx = noise.get([x, y, t]) as f32;
        let ny = noise.get([y + 31.4, z, t]) as f32;
        let nz = noise.get([z + 17.7, x, t]) as f32;

        particles.velocity_x[i] += nx * scale;
        particles.velocity_y[i] += ny * scale * 0.5;
        particles.velocity_z[i] += nz * scale;
    }
}

/// Side-to-side sway (snowflakes)
pub fn apply_oscillation(
    particles: &mut ParticleData,
    props: &ParticleProperties,
    time: f32,
    dt: f32,
) {
    let w = props.oscillation_frequency;
    let a = props.oscillation * dt;

    for i in 0..particles.len() {
        let phase = particles.phase[i];
        particles.velocity_x[i] += (time * w + phase).sin() * a;
        particles.velocity_z[i] += (time * w * 0.8 + phase).cos() * a * 0.5;
    }
}

/// position += velocity * velocity_scale * dt
pub fn integrate_motion(particles: &mut ParticleData, velocity_scale: f32, dt: f32) {
    let step = velocity_scale * dt;
    for i in 0..particles.len() {
        particles.position_x[i] += particles.velocity_x[i] * step;
        particles.position_y[i] += particles.velocity_y[i] * step;
        particles.position_z[i] += particles.velocity_z[i] * step;
    }
}

/// Update particle lifetimes
pub fn update_lifetime(particles: &mut ParticleData, props: &ParticleProperties, dt: f32) {
    let decay = dt * props.decay_rate;
    for life in particles.lifetime.iter_mut() {
        *life -= decay;
    }
}

/// Respawn every particle that fell through the floor or ran out of life.
/// Returns the number of respawned particles.
pub fn respawn_expired(
    particles: &mut ParticleData,
    props: &ParticleProperties,
    bounds: &SimulationBounds,
    rng: &mut impl Rng,
) -> usize {
    let floor = bounds.floor();
    let mut respawned = 0;

    for i in 0..particles.len() {
        if particles.position_y[i] < floor || particles.lifetime[i] <= 0.0 {
            respawn_particle(particles, i, props, bounds, rng);
            respawned += 1;
        }
    }

    respawned
}

/// Put one particle back into the spawn slab
pub fn respawn_particle(
    particles: &mut ParticleData,
    index: usize,
    props: &ParticleProperties,
    bounds: &SimulationBounds,
    rng: &mut impl Rng,
) {
    particles.set_position(index, bounds.sample_spawn(rng));
    particles.set_velocity(index, props.spawn_velocity(rng));
    particles.lifetime[index] = sample_lifetime(rng);
}

/// Spread the whole pool through the volume so the first frame is not empty
pub fn spawn_initial(
    particles: &mut ParticleData,
    props: &ParticleProperties,
    bounds: &SimulationBounds,
    rng: &mut impl Rng,
) {
    for i in 0..particles.len() {
        particles.set_position(i, bounds.sample_volume(rng));
        particles.set_velocity(i, props.spawn_velocity(rng));
        particles.lifetime[i] = sample_lifetime(rng);
        particles.phase[i] = rng.gen_range(0.0..std::f32::consts::TAU);
    }
}
