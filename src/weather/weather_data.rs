//! Weather state value type consumed by the composer
use serde::{Deserialize, Serialize};

use crate::constants::activation::WIND_SPEED_FULL_SCALE;
use crate::constants::weather_ranges::*;

/// Semantic weather snapshot supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    /// 0 (dry) to 1 (downpour)
    pub precipitation: f32,
    /// km/h
    pub wind_speed: f32,
    /// °C
    pub temperature: f32,
    /// Relative humidity in percent
    pub humidity: f32,
    /// Meters
    pub visibility: f32,
    /// 0 (clear) to 1 (overcast)
    pub cloud_cover: f32,
    /// Meteorological direction, 0 = north, in [0, 360)
    pub wind_direction_deg: f32,
    pub storm: bool,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self::clear()
    }
}

impl WeatherState {
    pub fn clear() -> Self {
        Self {
            precipitation: 0.0,
            wind_speed: 5.0,
            temperature: 20.0,
            humidity: 50.0,
            visibility: VISIBILITY.1,
            cloud_cover: 0.0,
            wind_direction_deg: 0.0,
            storm: false,
        }
    }

    /// Copy with every field forced into its documented range.
    /// NaN falls back to the field's clear-sky value.
    pub fn clamped(&self) -> Self {
        let fallback = Self::clear();
        Self {
            precipitation: clamp_field(self.precipitation, PRECIPITATION, fallback.precipitation),
            wind_speed: clamp_field(self.wind_speed, WIND_SPEED, fallback.wind_speed),
            temperature: clamp_field(self.temperature, TEMPERATURE, fallback.temperature),
            humidity: clamp_field(self.humidity, HUMIDITY, fallback.humidity),
            visibility: clamp_field(self.visibility, VISIBILITY, fallback.visibility),
            cloud_cover: clamp_field(self.cloud_cover, CLOUD_COVER, fallback.cloud_cover),
            wind_direction_deg: normalize_degrees(self.wind_direction_deg),
            storm: self.storm,
        }
    }

    /// True when at least one field was outside its range or not a number
    pub fn is_out_of_range(&self) -> bool {
        // NaN != NaN, so a NaN field also makes this differ
        self.clamped() != *self
    }

    /// Wind strength normalised to [0, 1]
    pub fn wind_strength(&self) -> f32 {
        (self.wind_speed / WIND_SPEED_FULL_SCALE).clamp(0.0, 1.0)
    }
}

fn clamp_field(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

/// Wrap any angle into [0, 360); non-finite angles become 0
pub fn normalize_degrees(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(FULL_CIRCLE_DEG);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= FULL_CIRCLE_DEG {
        0.0
    } else {
        wrapped
    }
}
