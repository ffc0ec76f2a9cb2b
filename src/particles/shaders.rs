//! WGSL kernels for the GPU particle path
//!
//! Both entry points share one bind group layout:
//! 0 = `SimParams` uniform, 1 = position/lifetime input, 2 = velocity input,
//! 3 = rgba32float storage output.
//!
//! `update_velocity` reads the current position and velocity and writes the
//! next velocity, flagging respawns in `w`. `update_position` then reads the
//! current position and the freshly written velocity and writes the next
//! position/lifetime, drawing a new spawn point wherever the flag is set.

pub const VELOCITY_ENTRY_POINT: &str = "update_velocity";
pub const POSITION_ENTRY_POINT: &str = "update_position";

/// Brings the shader's value noise to the RMS amplitude of the CPU path's
/// Perlin noise. Must match the WGSL constant of the same name.
pub const VALUE_NOISE_GAIN: f32 = 0.87;

pub const PARTICLE_SIMULATION_SHADER: &str = r#"
struct SimParams {
    // xyz = lower corner, w = spawn slab depth
    bounds_min: vec4<f32>,
    // xyz = upper corner, w = turbulence noise frequency
    bounds_max: vec4<f32>,
    // xyz = wind velocity, w = wind response (0 disables wind)
    wind: vec4<f32>,
    // gravity, decay rate, base velocity, jitter
    motion: vec4<f32>,
    // turbulence, oscillation, oscillation frequency, velocity scale
    sway: vec4<f32>,
    // dt, time, lifetime min, lifetime max
    timing: vec4<f32>,
    frame: u32,
    texture_size: u32,
    _pad0: u32,
    _pad1: u32,
}

@group(0) @binding(0) var<uniform> params: SimParams;
@group(0) @binding(1) var pos_life_in: texture_2d<f32>;
@group(0) @binding(2) var velocity_in: texture_2d<f32>;
@group(0) @binding(3) var output: texture_storage_2d<rgba32float, write>;

const TAU: f32 = 6.2831853;
const U32_MAX_F: f32 = 4294967295.0;
const VALUE_NOISE_GAIN: f32 = 0.87;

fn pcg(v: u32) -> u32 {
    let state = v * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}

fn particle_seed(index: u32, stream: u32) -> u32 {
    return pcg(index ^ pcg(params.frame * 2654435769u + stream));
}

fn rand01(seed: ptr<function, u32>) -> f32 {
    *seed = pcg(*seed);
    return f32(*seed) / U32_MAX_F;
}

fn rand_signed(seed: ptr<function, u32>) -> f32 {
    return rand01(seed) * 2.0 - 1.0;
}

fn lattice(c: vec3<i32>) -> f32 {
    let h = pcg(bitcast<u32>(c.x) ^ pcg(bitcast<u32>(c.y) ^ pcg(bitcast<u32>(c.z))));
    return f32(h) / U32_MAX_F * 2.0 - 1.0;
}

// Smooth value noise, scaled to match the CPU turbulence amplitude
fn value_noise(p: vec3<f32>) -> f32 {
    let i = vec3<i32>(floor(p));
    let f = fract(p);
    let u = f * f * (3.0 - 2.0 * f);

    let x00 = mix(lattice(i), lattice(i + vec3<i32>(1, 0, 0)), u.x);
    let x10 = mix(lattice(i + vec3<i32>(0, 1, 0)), lattice(i + vec3<i32>(1, 1, 0)), u.x);
    let x01 = mix(lattice(i + vec3<i32>(0, 0, 1)), lattice(i + vec3<i32>(1, 0, 1)), u.x);
    let x11 = mix(lattice(i + vec3<i32>(0, 1, 1)), lattice(i + vec3<i32>(1, 1, 1)), u.x);

    return mix(mix(x00, x10, u.y), mix(x01, x11, u.y), u.z) * VALUE_NOISE_GAIN;
}

@compute @workgroup_size(8, 8)
fn update_velocity(@builtin(global_invocation_id) id: vec3<u32>) {
    let size = params.texture_size;
    if (id.x >= size || id.y >= size) {
        return;
    }

    let coord = vec2<i32>(id.xy);
    let index = id.y * size + id.x;
    let dt = params.timing.x;
    let time = params.timing.y;

    let pos_life = textureLoad(pos_life_in, coord, 0);
    var v = textureLoad(velocity_in, coord, 0).xyz;

    v.y -= params.motion.x * dt;

    let k = min(params.wind.w * dt, 1.0);
    if (k > 0.0) {
        v.x += (params.wind.x - v.x) * k;
        v.z += (params.wind.z - v.z) * k;
    }

    let turbulence = params.sway.x;
    if (turbulence > 0.0) {
        let p = pos_life.xyz * params.bounds_max.w;
        let n = vec3<f32>(
            value_noise(vec3<f32>(p.x, p.y, time)),
            value_noise(vec3<f32>(p.y + 31.4, p.z, time)),
            value_noise(vec3<f32>(p.z + 17.7, p.x, time)),
        );
        v += n * vec3<f32>(1.0, 0.5, 1.0) * turbulence * dt;
    }

    let oscillation = params.sway.y;
    if (oscillation > 0.0) {
        let w = params.sway.z;
        let phase = f32(pcg(index)) / U32_MAX_F * TAU;
        v.x += sin(time * w + phase) * oscillation * dt;
        v.z += cos(time * w * 0.8 + phase) * oscillation * dt * 0.5;
    }

    let next_pos = pos_life.xyz + v * params.sway.w * dt;
    let next_life = pos_life.w - dt * params.motion.y;

    var respawn = 0.0;
    if (next_pos.y < params.bounds_min.y || next_life <= 0.0) {
        var seed = particle_seed(index, 1u);
        let jitter = params.motion.w;
        v = vec3<f32>(
            rand_signed(&seed) * jitter,
            params.motion.z + rand_signed(&seed) * jitter,
            rand_signed(&seed) * jitter,
        );
        respawn = 1.0;
    }

    textureStore(output, coord, vec4<f32>(v, respawn));
}

@compute @workgroup_size(8, 8)
fn update_position(@builtin(global_invocation_id) id: vec3<u32>) {
    let size = params.texture_size;
    if (id.x >= size || id.y >= size) {
        return;
    }

    let coord = vec2<i32>(id.xy);
    let index = id.y * size + id.x;
    let dt = params.timing.x;

    let pos_life = textureLoad(pos_life_in, coord, 0);
    let vel = textureLoad(velocity_in, coord, 0);

    var result: vec4<f32>;
    if (vel.w > 0.5) {
        var seed = particle_seed(index, 2u);
        let lo = vec3<f32>(
            params.bounds_min.x,
            params.bounds_max.y - params.bounds_min.w,
            params.bounds_min.z,
        );
        let hi = params.bounds_max.xyz;
        let t = vec3<f32>(rand01(&seed), rand01(&seed), rand01(&seed));
        let life = mix(params.timing.z, params.timing.w, rand01(&seed));
        result = vec4<f32>(mix(lo, hi, t), life);
    } else {
        result = vec4<f32>(
            pos_life.xyz + vel.xyz * params.sway.w * dt,
            pos_life.w - dt * params.motion.y,
        );
    }

    textureStore(output, coord, result);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::gpu_limits::WORKGROUP_SIZE;
    use noise::{NoiseFn, Perlin};

    // Host-side mirror of the WGSL noise helpers
    fn pcg(v: u32) -> u32 {
        let state = v.wrapping_mul(747796405).wrapping_add(2891336453);
        let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277803737);
        (word >> 22) ^ word
    }

    fn lattice(x: i32, y: i32, z: i32) -> f32 {
        let h = pcg(x as u32 ^ pcg(y as u32 ^ pcg(z as u32)));
        h as f32 / u32::MAX as f32 * 2.0 - 1.0
    }

    fn mix(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    fn value_noise(p: [f32; 3]) -> f32 {
        let i = p.map(|c| c.floor() as i32);
        let f: Vec<f32> = p.iter().map(|c| c - c.floor()).collect();
        let u: Vec<f32> = f.iter().map(|f| f * f * (3.0 - 2.0 * f)).collect();
        let l = |dx: i32, dy: i32, dz: i32| lattice(i[0] + dx, i[1] + dy, i[2] + dz);

        let x00 = mix(l(0, 0, 0), l(1, 0, 0), u[0]);
        let x10 = mix(l(0, 1, 0), l(1, 1, 0), u[0]);
        let x01 = mix(l(0, 0, 1), l(1, 0, 1), u[0]);
        let x11 = mix(l(0, 1, 1), l(1, 1, 1), u[0]);
        mix(mix(x00, x10, u[1]), mix(x01, x11, u[1]), u[2]) * VALUE_NOISE_GAIN
    }

    fn rms(samples: impl Iterator<Item = f32>) -> f32 {
        let (sum, n) = samples.fold((0.0f64, 0u32), |(s, n), v| (s + f64::from(v * v), n + 1));
        (sum / f64::from(n)).sqrt() as f32
    }

    fn grid() -> impl Iterator<Item = [f32; 3]> {
        (0..40).flat_map(|x| {
            (0..40).flat_map(move |y| {
                (0..40).map(move |z| [x as f32 * 0.613, y as f32 * 0.571 + 0.2, z as f32 * 0.659 + 0.4])
            })
        })
    }

    #[test]
    fn test_gpu_noise_gain_matches_shader() {
        let decl = format!("const VALUE_NOISE_GAIN: f32 = {:?};", VALUE_NOISE_GAIN);
        assert!(PARTICLE_SIMULATION_SHADER.contains(&decl));
    }

    #[test]
    fn test_gpu_and_cpu_turbulence_amplitude_agree() {
        let perlin = Perlin::new(7);
        let cpu = rms(grid().map(|p| perlin.get(p.map(f64::from)) as f32));
        let gpu = rms(grid().map(value_noise));

        let ratio = gpu / cpu;
        assert!((0.9..=1.1).contains(&ratio), "gpu rms {gpu} vs cpu rms {cpu}");
    }

    #[test]
    fn test_entry_points_exist() {
        assert!(PARTICLE_SIMULATION_SHADER.contains(&format!("fn {}(", VELOCITY_ENTRY_POINT)));
        assert!(PARTICLE_SIMULATION_SHADER.contains(&format!("fn {}(", POSITION_ENTRY_POINT)));
    }

    #[test]
    fn test_workgroup_size_matches_dispatch() {
        let attr = format!("@workgroup_size({}, {})", WORKGROUP_SIZE, WORKGROUP_SIZE);
        assert_eq!(PARTICLE_SIMULATION_SHADER.matches(&attr).count(), 2);
    }
}
