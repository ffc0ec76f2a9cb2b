use glam::Vec3;

use crate::particles::particle::Particle;

/// Fixed-capacity particle pool in Structure of Arrays (SOA) layout.
///
/// Particles are never added or removed after creation; expired slots are
/// respawned in place so the pool size always equals its capacity.
pub struct ParticleData {
    /// Position buffers
    pub position_x: Vec<f32>,
    pub position_y: Vec<f32>,
    pub position_z: Vec<f32>,

    /// Velocity buffers
    pub velocity_x: Vec<f32>,
    pub velocity_y: Vec<f32>,
    pub velocity_z: Vec<f32>,

    /// Seconds of life left
    pub lifetime: Vec<f32>,

    /// Per-particle sway phase (radians)
    pub phase: Vec<f32>,
}

impl ParticleData {
    /// Create a pool of `capacity` particles, all at the origin and expired
    pub fn new(capacity: usize) -> Self {
        Self {
            position_x: vec![0.0; capacity],
            position_y: vec![0.0; capacity],
            position_z: vec![0.0; capacity],
            velocity_x: vec![0.0; capacity],
            velocity_y: vec![0.0; capacity],
            velocity_z: vec![0.0; capacity],
            lifetime: vec![0.0; capacity],
            phase: vec![0.0; capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.lifetime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lifetime.is_empty()
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::new(
            self.position_x[index],
            self.position_y[index],
            self.position_z[index],
        )
    }

    pub fn velocity(&self, index: usize) -> Vec3 {
        Vec3::new(
            self.velocity_x[index],
            self.velocity_y[index],
            self.velocity_z[index],
        )
    }

    pub fn set_position(&mut self, index: usize, p: Vec3) {
        self.position_x[index] = p.x;
        self.position_y[index] = p.y;
        self.position_z[index] = p.z;
    }

    pub fn set_velocity(&mut self, index: usize, v: Vec3) {
        self.velocity_x[index] = v.x;
        self.velocity_y[index] = v.y;
        self.velocity_z[index] = v.z;
    }

    /// Gather one particle out of the SOA columns
    pub fn get(&self, index: usize) -> Particle {
        Particle {
            position: self.position(index),
            velocity: self.velocity(index),
            lifetime: self.lifetime[index],
        }
    }

    /// Gather every particle (used for snapshots and tests)
    pub fn to_particles(&self) -> Vec<Particle> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

/// Vertex layout handed to the renderer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 3],
    pub lifetime: f32,
}

/// Convert the first `count` particles into vertex data
pub fn prepare_render_data(particles: &ParticleData, count: usize, out: &mut Vec<ParticleVertex>) {
    let count = count.min(particles.len());
    out.clear();
    out.reserve(count);

    for i in 0..count {
        out.push(ParticleVertex {
            position: [
                particles.position_x[i],
                particles.position_y[i],
                particles.position_z[i],
            ],
            lifetime: particles.lifetime[i],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_has_fixed_size() {
        let data = ParticleData::new(64);
        assert_eq!(data.len(), 64);
        assert!(!data.is_empty());
        assert!(ParticleData::new(0).is_empty());
    }

    #[test]
    fn test_render_data_respects_count() {
        let mut data = ParticleData::new(10);
        data.set_position(2, Vec3::new(1.0, 2.0, 3.0));
        data.lifetime[2] = 0.5;

        let mut out = Vec::new();
        prepare_render_data(&data, 4, &mut out);
        assert_eq!(out.len(), 4);
        assert_eq!(out[2].position, [1.0, 2.0, 3.0]);
        assert_eq!(out[2].lifetime, 0.5);

        prepare_render_data(&data, 100, &mut out);
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<ParticleVertex>(), 16);
        let v = [ParticleVertex {
            position: [1.0, 2.0, 3.0],
            lifetime: 4.0,
        }];
        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(bytes.len(), 16);
    }
}
