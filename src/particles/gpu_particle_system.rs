use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::gpu_limits::{
    MAX_TEXTURE_SIDE, TEXEL_BYTES, TEXTURE_SIDE_ALIGNMENT, WORKGROUP_SIZE,
};
use crate::constants::particles::{LIFETIME_MAX, LIFETIME_MIN, TURBULENCE_SCALE};
use crate::error::{gpu_operation_error, GpuErrorContext, VisualizationResult};
use crate::gpu::GpuContext;
use crate::particles::engine::{
    active_count_for, next_instance_id, EngineBackend, GlobalParams, ParticleEngine,
    ParticleRenderSource,
};
use crate::particles::particle::{Particle, ParticleProperties, PrecipitationKind, SimulationBounds};
use crate::particles::particle_data::ParticleData;
use crate::particles::shaders::{
    PARTICLE_SIMULATION_SHADER, POSITION_ENTRY_POINT, VELOCITY_ENTRY_POINT,
};
use crate::particles::update::spawn_initial;

const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Texture side for `capacity` particles: the smallest multiple of
/// `TEXTURE_SIDE_ALIGNMENT` whose square holds them, capped at `MAX_TEXTURE_SIDE`.
pub fn texture_side_for(capacity: usize) -> u32 {
    let side = ((capacity.max(1) as f64).sqrt().ceil() as u32).min(MAX_TEXTURE_SIDE);
    let aligned = side.div_ceil(TEXTURE_SIDE_ALIGNMENT) * TEXTURE_SIDE_ALIGNMENT;
    aligned.min(MAX_TEXTURE_SIDE)
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SimParams {
    bounds_min: [f32; 4],
    bounds_max: [f32; 4],
    wind: [f32; 4],
    motion: [f32; 4],
    sway: [f32; 4],
    timing: [f32; 4],
    frame: u32,
    texture_size: u32,
    _padding: [u32; 2],
}

/// GPU particle simulation over ping-pong state textures.
///
/// State lives in two pairs of `texture_size x texture_size` rgba32float
/// textures: position/lifetime and velocity (respawn flag in `w`). Each step
/// runs the velocity pass then the position pass and flips `current`.
pub struct GpuParticleSystem {
    context: Arc<GpuContext>,
    kind: PrecipitationKind,
    instance_id: u64,
    properties: ParticleProperties,
    bounds: SimulationBounds,
    texture_size: u32,

    pos_life: [wgpu::Texture; 2],
    pos_life_views: [wgpu::TextureView; 2],
    velocity: [wgpu::Texture; 2],
    velocity_views: [wgpu::TextureView; 2],

    params_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,

    velocity_pipeline: wgpu::ComputePipeline,
    position_pipeline: wgpu::ComputePipeline,
    // Indexed by the state currently being read
    velocity_bind_groups: [wgpu::BindGroup; 2],
    position_bind_groups: [wgpu::BindGroup; 2],

    current: usize,
    frame: u32,
    intensity: f32,
}

struct GpuResources {
    pos_life: [wgpu::Texture; 2],
    pos_life_views: [wgpu::TextureView; 2],
    velocity: [wgpu::Texture; 2],
    velocity_views: [wgpu::TextureView; 2],
    params_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    velocity_pipeline: wgpu::ComputePipeline,
    position_pipeline: wgpu::ComputePipeline,
    velocity_bind_groups: [wgpu::BindGroup; 2],
    position_bind_groups: [wgpu::BindGroup; 2],
}

impl GpuParticleSystem {
    pub fn new(
        context: Arc<GpuContext>,
        kind: PrecipitationKind,
        capacity: usize,
        bounds: SimulationBounds,
    ) -> VisualizationResult<Self> {
        let texture_size = texture_side_for(capacity);
        let properties = ParticleProperties::for_kind(kind);

        let resources = context.scoped("create particle resources", |device| {
            create_resources(device, texture_size)
        })?;

        let system = Self {
            context,
            kind,
            instance_id: next_instance_id(),
            properties,
            bounds,
            texture_size,
            pos_life: resources.pos_life,
            pos_life_views: resources.pos_life_views,
            velocity: resources.velocity,
            velocity_views: resources.velocity_views,
            params_buffer: resources.params_buffer,
            readback_buffer: resources.readback_buffer,
            velocity_pipeline: resources.velocity_pipeline,
            position_pipeline: resources.position_pipeline,
            velocity_bind_groups: resources.velocity_bind_groups,
            position_bind_groups: resources.position_bind_groups,
            current: 0,
            frame: 0,
            intensity: 1.0,
        };
        system.upload_initial_state()?;

        log::info!(
            "[GpuParticleSystem] Created {:?} system: {}x{} texture ({} particles, {} requested)",
            kind,
            texture_size,
            texture_size,
            system.capacity(),
            capacity
        );
        Ok(system)
    }

    pub fn texture_size(&self) -> u32 {
        self.texture_size
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.texture_size,
            height: self.texture_size,
            depth_or_array_layers: 1,
        }
    }

    /// Fill state 0 from a CPU-side initial spread
    fn upload_initial_state(&self) -> VisualizationResult<()> {
        let mut data = ParticleData::new(self.capacity());
        let mut rng = StdRng::from_entropy();
        spawn_initial(&mut data, &self.properties, &self.bounds, &mut rng);

        let mut pos_life = Vec::with_capacity(data.len());
        let mut velocity = Vec::with_capacity(data.len());
        for i in 0..data.len() {
            let p = data.position(i);
            let v = data.velocity(i);
            pos_life.push([p.x, p.y, p.z, data.lifetime[i]]);
            velocity.push([v.x, v.y, v.z, 0.0]);
        }

        self.context.scoped("upload initial particle state", |_| {
            self.write_state(&self.pos_life[0], &pos_life);
            self.write_state(&self.velocity[0], &velocity);
        })
    }

    fn write_state(&self, texture: &wgpu::Texture, texels: &[[f32; 4]]) {
        self.context.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(texels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.texture_size * TEXEL_BYTES),
                rows_per_image: Some(self.texture_size),
            },
            self.extent(),
        );
    }

    fn sim_params(&self, dt: f32, params: &GlobalParams) -> SimParams {
        let props = &self.properties;
        let wind_response = if params.wind_enabled {
            props.wind_response
        } else {
            0.0
        };

        SimParams {
            bounds_min: [
                self.bounds.min.x,
                self.bounds.min.y,
                self.bounds.min.z,
                self.bounds.spawn_depth,
            ],
            bounds_max: [
                self.bounds.max.x,
                self.bounds.max.y,
                self.bounds.max.z,
                TURBULENCE_SCALE as f32,
            ],
            wind: [params.wind.x, params.wind.y, params.wind.z, wind_response],
            motion: [
                props.gravity,
                props.decay_rate,
                props.base_velocity,
                props.jitter,
            ],
            sway: [
                props.turbulence * params.turbulence,
                props.oscillation,
                props.oscillation_frequency,
                params.velocity_scale,
            ],
            timing: [dt, params.time, LIFETIME_MIN, LIFETIME_MAX],
            frame: self.frame,
            texture_size: self.texture_size,
            _padding: [0; 2],
        }
    }

    /// Copy one state texture into host memory
    fn read_state(&self, texture: &wgpu::Texture) -> VisualizationResult<Vec<[f32; 4]>> {
        let device = &self.context.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.texture_size * TEXEL_BYTES),
                    rows_per_image: Some(self.texture_size),
                },
            },
            self.extent(),
        );
        self.context.queue.submit(Some(encoder.finish()));

        let slice = self.readback_buffer.slice(..);
        let (tx, rx) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // Receiver only disappears if the caller already bailed out
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| gpu_operation_error("receive readback mapping", e))?
            .gpu_context("map readback buffer")?;

        let texels = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, [f32; 4]>(&data).to_vec()
        };
        self.readback_buffer.unmap();
        Ok(texels)
    }
}

impl ParticleEngine for GpuParticleSystem {
    fn kind(&self) -> PrecipitationKind {
        self.kind
    }

    fn backend(&self) -> EngineBackend {
        EngineBackend::Gpu
    }

    fn instance_id(&self) -> u64 {
        self.instance_id
    }

    fn capacity(&self) -> usize {
        (self.texture_size as usize) * (self.texture_size as usize)
    }

    fn properties(&self) -> &ParticleProperties {
        &self.properties
    }

    fn step(&mut self, dt: f32, params: &GlobalParams) -> VisualizationResult<()> {
        if dt <= 0.0 {
            return Ok(());
        }

        let uniforms = self.sim_params(dt, params);
        let read = self.current;
        let workgroups = self.texture_size.div_ceil(WORKGROUP_SIZE);

        self.context.scoped("particle step", |device| {
            self.context
                .queue
                .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[uniforms]));

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Step Encoder"),
            });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Particle Velocity Pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&self.velocity_pipeline);
                pass.set_bind_group(0, &self.velocity_bind_groups[read], &[]);
                pass.dispatch_workgroups(workgroups, workgroups, 1);
            }
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Particle Position Pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&self.position_pipeline);
                pass.set_bind_group(0, &self.position_bind_groups[read], &[]);
                pass.dispatch_workgroups(workgroups, workgroups, 1);
            }
            self.context.queue.submit(Some(encoder.finish()));
        })?;

        self.current = 1 - read;
        self.frame = self.frame.wrapping_add(1);
        Ok(())
    }

    fn set_intensity(&mut self, intensity: f32) {
        self.intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }

    fn render_source(&self) -> ParticleRenderSource<'_> {
        ParticleRenderSource::Textures {
            position_lifetime: &self.pos_life_views[self.current],
            velocity: &self.velocity_views[self.current],
            texture_size: self.texture_size,
            count: active_count_for(self.capacity(), self.intensity),
        }
    }

    fn snapshot(&mut self) -> VisualizationResult<Vec<Particle>> {
        let pos_life = self.read_state(&self.pos_life[self.current])?;
        let velocity = self.read_state(&self.velocity[self.current])?;

        Ok(pos_life
            .iter()
            .zip(velocity.iter())
            .map(|(p, v)| Particle {
                position: Vec3::new(p[0], p[1], p[2]),
                velocity: Vec3::new(v[0], v[1], v[2]),
                lifetime: p[3],
            })
            .collect())
    }
}

fn create_state_texture(device: &wgpu::Device, label: &str, size: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: STATE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn state_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_resources(device: &wgpu::Device, texture_size: u32) -> GpuResources {
    let pos_life = [
        create_state_texture(device, "Particle Position/Lifetime A", texture_size),
        create_state_texture(device, "Particle Position/Lifetime B", texture_size),
    ];
    let velocity = [
        create_state_texture(device, "Particle Velocity A", texture_size),
        create_state_texture(device, "Particle Velocity B", texture_size),
    ];
    let pos_life_views = [
        pos_life[0].create_view(&wgpu::TextureViewDescriptor::default()),
        pos_life[1].create_view(&wgpu::TextureViewDescriptor::default()),
    ];
    let velocity_views = [
        velocity[0].create_view(&wgpu::TextureViewDescriptor::default()),
        velocity[1].create_view(&wgpu::TextureViewDescriptor::default()),
    ];

    let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Params Buffer"),
        size: std::mem::size_of::<SimParams>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Readback Buffer"),
        size: u64::from(texture_size) * u64::from(texture_size) * u64::from(TEXEL_BYTES),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Particle Simulation Shader"),
        source: wgpu::ShaderSource::Wgsl(PARTICLE_SIMULATION_SHADER.into()),
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Particle Step Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            state_texture_entry(1),
            state_texture_entry(2),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: STATE_FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Particle Step Pipeline Layout"),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let velocity_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Particle Velocity Pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: VELOCITY_ENTRY_POINT,
    });
    let position_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Particle Position Pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: POSITION_ENTRY_POINT,
    });

    let bind_group = |label: &str,
                      pos_in: &wgpu::TextureView,
                      vel_in: &wgpu::TextureView,
                      out: &wgpu::TextureView| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(pos_in),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(vel_in),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(out),
                },
            ],
        })
    };

    // Velocity pass: (pos[c], vel[c]) -> vel[1-c]
    // Position pass: (pos[c], vel[1-c]) -> pos[1-c]
    let velocity_bind_groups = [
        bind_group("Particle Velocity Bind Group A", &pos_life_views[0], &velocity_views[0], &velocity_views[1]),
        bind_group("Particle Velocity Bind Group B", &pos_life_views[1], &velocity_views[1], &velocity_views[0]),
    ];
    let position_bind_groups = [
        bind_group("Particle Position Bind Group A", &pos_life_views[0], &velocity_views[1], &pos_life_views[1]),
        bind_group("Particle Position Bind Group B", &pos_life_views[1], &velocity_views[0], &pos_life_views[0]),
    ];

    GpuResources {
        pos_life,
        pos_life_views,
        velocity,
        velocity_views,
        params_buffer,
        readback_buffer,
        velocity_pipeline,
        position_pipeline,
        velocity_bind_groups,
        position_bind_groups,
    }
}
