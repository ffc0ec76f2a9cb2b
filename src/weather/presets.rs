use std::collections::HashMap;

use glam::Vec3;
use lazy_static::lazy_static;
use serde::Serialize;

use crate::constants::atmosphere::{DEFAULT_FOG_COLOR, MORNING_MIST_COLOR, STORM_FOG_COLOR};
use crate::weather::weather_data::WeatherState;

/// Visual styling carried alongside a preset's weather
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectParameters {
    pub fog_color: Vec3,
    /// Multiplier applied to ambient light
    pub ambient_tint: Vec3,
    /// Relative lightning strike rate (1.0 = normal storm)
    pub lightning_frequency: f32,
    /// 0 = white clouds, 1 = black storm clouds
    pub cloud_darkness: f32,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            fog_color: Vec3::from_array(DEFAULT_FOG_COLOR),
            ambient_tint: Vec3::ONE,
            lightning_frequency: 1.0,
            cloud_darkness: 0.2,
        }
    }
}

/// Named, immutable weather + style tuple
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectPreset {
    pub id: &'static str,
    pub conditions: WeatherState,
    pub parameters: EffectParameters,
}

/// Catalog ids in display order
pub const PRESET_IDS: [&str; 10] = [
    "clearSky",
    "lightRain",
    "heavyRain",
    "lightSnow",
    "heavySnow",
    "foggy",
    "thunderstorm",
    "morningMist",
    "sunsetGlow",
    "windyDay",
];

#[allow(clippy::too_many_arguments)]
fn conditions(
    precipitation: f32,
    wind_speed: f32,
    temperature: f32,
    humidity: f32,
    visibility: f32,
    cloud_cover: f32,
    wind_direction_deg: f32,
    storm: bool,
) -> WeatherState {
    WeatherState {
        precipitation,
        wind_speed,
        temperature,
        humidity,
        visibility,
        cloud_cover,
        wind_direction_deg,
        storm,
    }
}

fn build_catalog() -> HashMap<&'static str, EffectPreset> {
    let base = EffectParameters::default();
    let presets = [
        EffectPreset {
            id: "clearSky",
            conditions: conditions(0.0, 5.0, 20.0, 40.0, 20_000.0, 0.1, 180.0, false),
            parameters: EffectParameters {
                ambient_tint: Vec3::new(1.0, 1.0, 1.05),
                cloud_darkness: 0.0,
                ..base
            },
        },
        EffectPreset {
            id: "lightRain",
            conditions: conditions(0.6, 10.0, 12.0, 80.0, 8000.0, 0.7, 200.0, false),
            parameters: EffectParameters {
                ambient_tint: Vec3::splat(0.85),
                cloud_darkness: 0.4,
                ..base
            },
        },
        EffectPreset {
            id: "heavyRain",
            conditions: conditions(0.8, 25.0, 10.0, 95.0, 3000.0, 0.95, 220.0, false),
            parameters: EffectParameters {
                fog_color: Vec3::new(0.55, 0.58, 0.62),
                ambient_tint: Vec3::splat(0.65),
                cloud_darkness: 0.7,
                ..base
            },
        },
        EffectPreset {
            id: "lightSnow",
            conditions: conditions(0.6, 5.0, -2.0, 85.0, 6000.0, 0.8, 0.0, false),
            parameters: EffectParameters {
                fog_color: Vec3::new(0.85, 0.88, 0.95),
                ambient_tint: Vec3::new(0.95, 0.97, 1.05),
                cloud_darkness: 0.25,
                ..base
            },
        },
        EffectPreset {
            id: "heavySnow",
            conditions: conditions(0.9, 20.0, -8.0, 90.0, 1500.0, 1.0, 330.0, false),
            parameters: EffectParameters {
                fog_color: Vec3::new(0.9, 0.92, 0.97),
                ambient_tint: Vec3::new(0.85, 0.88, 0.95),
                cloud_darkness: 0.45,
                ..base
            },
        },
        EffectPreset {
            id: "foggy",
            conditions: conditions(0.1, 3.0, 8.0, 98.0, 500.0, 0.6, 90.0, false),
            parameters: EffectParameters {
                ambient_tint: Vec3::splat(0.8),
                cloud_darkness: 0.3,
                ..base
            },
        },
        EffectPreset {
            id: "thunderstorm",
            conditions: conditions(1.0, 45.0, 18.0, 90.0, 2500.0, 1.0, 240.0, true),
            parameters: EffectParameters {
                fog_color: Vec3::from_array(STORM_FOG_COLOR),
                ambient_tint: Vec3::splat(0.45),
                lightning_frequency: 1.5,
                cloud_darkness: 0.9,
            },
        },
        EffectPreset {
            id: "morningMist",
            conditions: conditions(0.0, 2.0, 10.0, 95.0, 2000.0, 0.3, 120.0, false),
            parameters: EffectParameters {
                fog_color: Vec3::from_array(MORNING_MIST_COLOR),
                ambient_tint: Vec3::new(1.05, 1.0, 0.9),
                cloud_darkness: 0.1,
                ..base
            },
        },
        EffectPreset {
            id: "sunsetGlow",
            conditions: conditions(0.0, 8.0, 22.0, 50.0, 15_000.0, 0.3, 270.0, false),
            parameters: EffectParameters {
                fog_color: Vec3::new(1.0, 0.7, 0.5),
                ambient_tint: Vec3::new(1.2, 0.85, 0.65),
                cloud_darkness: 0.05,
                ..base
            },
        },
        EffectPreset {
            id: "windyDay",
            conditions: conditions(0.0, 40.0, 15.0, 45.0, 15_000.0, 0.4, 300.0, false),
            parameters: EffectParameters {
                cloud_darkness: 0.15,
                ..base
            },
        },
    ];

    presets.into_iter().map(|p| (p.id, p)).collect()
}

lazy_static! {
    static ref CATALOG: HashMap<&'static str, EffectPreset> = build_catalog();
}

/// Case-sensitive lookup
pub fn find_preset(id: &str) -> Option<&'static EffectPreset> {
    CATALOG.get(id)
}

/// All presets in display order
pub fn all_presets() -> impl Iterator<Item = &'static EffectPreset> {
    PRESET_IDS.iter().filter_map(|id| CATALOG.get(id))
}
