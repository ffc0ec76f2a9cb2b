// Weather Visualization Constants - SINGLE SOURCE OF TRUTH
//
// Every tuning value used by the CPU simulation, the WGSL kernels and the
// adaptive quality loop lives here.
//
// Do NOT define numeric defaults anywhere else in the codebase!

/// Documented ranges of every `WeatherState` field
pub mod weather_ranges {
    pub const PRECIPITATION: (f32, f32) = (0.0, 1.0);
    /// km/h
    pub const WIND_SPEED: (f32, f32) = (0.0, 200.0);
    /// Degrees Celsius
    pub const TEMPERATURE: (f32, f32) = (-60.0, 60.0);
    /// Relative humidity in percent
    pub const HUMIDITY: (f32, f32) = (0.0, 100.0);
    /// Meters
    pub const VISIBILITY: (f32, f32) = (0.0, 20_000.0);
    pub const CLOUD_COVER: (f32, f32) = (0.0, 1.0);
    pub const FULL_CIRCLE_DEG: f32 = 360.0;
}

/// Thresholds deciding which effects are active for a weather state
pub mod activation {
    pub const PRECIPITATION_THRESHOLD: f32 = 0.5;
    /// Rain above, snow at or below (°C)
    pub const FREEZING_POINT: f32 = 0.0;
    /// Fog when visibility drops below this many meters
    pub const FOG_VISIBILITY: f32 = 5000.0;
    pub const CLOUD_COVER_THRESHOLD: f32 = 0.5;
    pub const WIND_STRENGTH_THRESHOLD: f32 = 0.1;
    /// windStrength = min(1, windSpeed / WIND_SPEED_FULL_SCALE)
    pub const WIND_SPEED_FULL_SCALE: f32 = 50.0;
}

/// Quality tier tables
pub mod quality {
    pub const LOW_PARTICLE_MULTIPLIER: f32 = 0.5;
    pub const MEDIUM_PARTICLE_MULTIPLIER: f32 = 1.0;
    pub const HIGH_PARTICLE_MULTIPLIER: f32 = 1.5;
    pub const LOW_BATTERY_PARTICLE_MULTIPLIER: f32 = 0.2;
    pub const LOW_BATTERY_THRESHOLD: f32 = 0.2;

    /// Terrain level-of-detail segments per tier
    pub const LOW_TERRAIN_DETAIL: u32 = 32;
    pub const MEDIUM_TERRAIN_DETAIL: u32 = 64;
    pub const HIGH_TERRAIN_DETAIL: u32 = 128;

    /// Texture resolution per tier
    pub const LOW_TEXTURE_RESOLUTION: u32 = 512;
    pub const MEDIUM_TEXTURE_RESOLUTION: u32 = 1024;
    pub const HIGH_TEXTURE_RESOLUTION: u32 = 2048;

    /// Host classification used by the profiler
    pub const HIGH_END_MIN_CORES: usize = 8;
    pub const HIGH_END_MIN_MEMORY_GB: f32 = 8.0;
}

/// Particle simulation parameters
pub mod particles {
    pub const RAIN_BASE_COUNT: usize = 15_000;
    pub const SNOW_BASE_COUNT: usize = 8_000;

    /// Respawn lifetime range (seconds)
    pub const LIFETIME_MIN: f32 = 1.0;
    pub const LIFETIME_MAX: f32 = 1.5;

    /// Simulation volume (world units)
    pub const BOUNDS_MIN: [f32; 3] = [-50.0, 0.0, -50.0];
    pub const BOUNDS_MAX: [f32; 3] = [50.0, 60.0, 50.0];
    /// Height of the spawn slab at the top of the volume
    pub const SPAWN_DEPTH: f32 = 10.0;

    // Rain: strong gravity, fast decay, thin streaks
    pub const RAIN_GRAVITY: f32 = 9.8;
    pub const RAIN_DECAY_RATE: f32 = 0.9;
    pub const RAIN_BASE_VELOCITY: f32 = -25.0;
    pub const RAIN_JITTER: f32 = 1.5;
    pub const RAIN_TURBULENCE: f32 = 0.0;
    pub const RAIN_WIND_RESPONSE: f32 = 0.6;
    pub const RAIN_SIZE: f32 = 0.08;
    pub const RAIN_COLOR: [f32; 4] = [0.7, 0.75, 0.85, 0.6];

    // Snow: light gravity, turbulent, drifting sideways
    pub const SNOW_GRAVITY: f32 = 0.6;
    pub const SNOW_DECAY_RATE: f32 = 0.25;
    pub const SNOW_BASE_VELOCITY: f32 = -2.5;
    pub const SNOW_JITTER: f32 = 0.5;
    pub const SNOW_TURBULENCE: f32 = 0.8;
    pub const SNOW_WIND_RESPONSE: f32 = 1.2;
    pub const SNOW_OSCILLATION: f32 = 0.9;
    pub const SNOW_OSCILLATION_FREQUENCY: f32 = 1.7;
    pub const SNOW_SIZE: f32 = 0.25;
    pub const SNOW_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.9];

    /// Spatial frequency of the turbulence noise field
    pub const TURBULENCE_SCALE: f64 = 0.08;
    /// World units per second of wind at full strength
    pub const WIND_FORCE_SCALE: f32 = 12.0;

    pub const MIN_ANIMATION_SPEED: f32 = 0.1;
    pub const MAX_ANIMATION_SPEED: f32 = 2.0;
}

/// GPU particle texture constraints
pub mod gpu_limits {
    /// Texture sides are multiples of this so readback rows stay 256-byte aligned
    pub const TEXTURE_SIDE_ALIGNMENT: u32 = 16;
    pub const MAX_TEXTURE_SIDE: u32 = 2048;
    /// Bytes per Rgba32Float texel
    pub const TEXEL_BYTES: u32 = 16;
    pub const WORKGROUP_SIZE: u32 = 8;
}

/// Adaptive quality loop
pub mod monitor {
    pub const SAMPLE_WINDOW_SECS: f32 = 5.0;
    pub const MIN_FPS: f32 = 30.0;
    pub const TARGET_FPS: f32 = 60.0;
    pub const UPGRADE_FACTOR: f32 = 1.2;
    pub const DOWNGRADE_COOLDOWN_WINDOWS: u32 = 3;
    pub const UPGRADE_COOLDOWN_WINDOWS: u32 = 5;
    pub const METRICS_CAPACITY: usize = 100;
}

/// Atmosphere objects
pub mod atmosphere {
    pub const DEFAULT_FOG_COLOR: [f32; 3] = [0.7, 0.7, 0.8];
    pub const MORNING_MIST_COLOR: [f32; 3] = [0.9, 0.85, 0.7];
    pub const STORM_FOG_COLOR: [f32; 3] = [0.45, 0.47, 0.52];
    pub const FOG_MIN_START: f32 = 5.0;

    pub const CLOUD_ALTITUDE: f32 = 120.0;
    /// Cloud drift per unit of wind vector per second
    pub const CLOUD_DRIFT_FACTOR: f32 = 2.0;

    /// Mean seconds between lightning strikes at frequency 1.0
    pub const LIGHTNING_MEAN_INTERVAL: f32 = 6.0;
    pub const LIGHTNING_DECAY_RATE: f32 = 8.0;

    pub const WIND_TRANSITION_SPEED: f32 = 0.5;
    pub const WIND_GUST_FREQUENCY: f32 = 0.1;
    pub const WIND_GUST_STRENGTH: f32 = 5.0;
}

/// Transition defaults
pub mod transitions {
    pub const DEFAULT_DURATION_MS: u64 = 3000;
}
