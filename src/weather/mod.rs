//! Weather data, presets and transitions
//!
//! Everything here is host-independent value logic; rendering lives in
//! `composer` and `particles`.

pub mod fog;
pub mod presets;
pub mod transition;
pub mod weather_data;
pub mod wind;

pub use fog::{FogDensity, FogSettings};
pub use presets::{all_presets, find_preset, EffectParameters, EffectPreset, PRESET_IDS};
pub use transition::{ease_in_out_cubic, interpolate, lerp_angle_deg, TransitionManager};
pub use weather_data::{normalize_degrees, WeatherState};
pub use wind::{direction_vector, WindField};
