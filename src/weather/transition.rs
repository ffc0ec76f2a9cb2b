//! Time-based interpolation between two weather states

use crate::constants::weather_ranges::FULL_CIRCLE_DEG;
use crate::weather::weather_data::{normalize_degrees, WeatherState};

/// Cubic ease-in-out on [0, 1]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolate an angle along the shorter arc
pub fn lerp_angle_deg(a: f32, b: f32, t: f32) -> f32 {
    let half = FULL_CIRCLE_DEG / 2.0;
    let diff = (b - a + half).rem_euclid(FULL_CIRCLE_DEG) - half;
    normalize_degrees(a + diff * t + FULL_CIRCLE_DEG)
}

/// Blend two states at eased progress `t`. Exact at both ends.
pub fn interpolate(start: &WeatherState, end: &WeatherState, t: f32) -> WeatherState {
    if t <= 0.0 {
        return *start;
    }
    if t >= 1.0 {
        return *end;
    }

    WeatherState {
        precipitation: lerp(start.precipitation, end.precipitation, t),
        wind_speed: lerp(start.wind_speed, end.wind_speed, t),
        temperature: lerp(start.temperature, end.temperature, t),
        humidity: lerp(start.humidity, end.humidity, t),
        visibility: lerp(start.visibility, end.visibility, t),
        cloud_cover: lerp(start.cloud_cover, end.cloud_cover, t),
        wind_direction_deg: lerp_angle_deg(start.wind_direction_deg, end.wind_direction_deg, t),
        storm: if t < 0.5 { start.storm } else { end.storm },
    }
}

type FrameCallback = Box<dyn FnMut(&WeatherState)>;

struct ActiveTransition {
    start: WeatherState,
    end: WeatherState,
    duration_ms: f64,
    elapsed_ms: f64,
    on_frame: FrameCallback,
}

/// Drives at most one in-flight transition; a new request replaces the old one
#[derive(Default)]
pub struct TransitionManager {
    active: Option<ActiveTransition>,
}

impl TransitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transition, cancelling any transition already running
    pub fn transition_to(
        &mut self,
        start: WeatherState,
        end: WeatherState,
        duration_ms: u64,
        on_frame: impl FnMut(&WeatherState) + 'static,
    ) {
        if self.active.is_some() {
            log::debug!("[TransitionManager] Cancelling in-flight transition");
        }
        self.active = Some(ActiveTransition {
            start,
            end,
            duration_ms: duration_ms as f64,
            elapsed_ms: 0.0,
            on_frame: Box::new(on_frame),
        });
    }

    /// Advance by `dt` seconds and emit one frame. Returns true when the
    /// transition finished during this call.
    pub fn update(&mut self, dt: f32) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        active.elapsed_ms += f64::from(dt.max(0.0)) * 1000.0;
        let t = if active.duration_ms <= 0.0 {
            1.0
        } else {
            (active.elapsed_ms / active.duration_ms).clamp(0.0, 1.0) as f32
        };

        if t >= 1.0 {
            let end = active.end;
            (active.on_frame)(&end);
            self.active = None;
            log::debug!("[TransitionManager] Transition complete");
            return true;
        }

        let frame = interpolate(&active.start, &active.end, ease_in_out_cubic(t));
        (active.on_frame)(&frame);
        false
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Target of the in-flight transition
    pub fn target(&self) -> Option<WeatherState> {
        self.active.as_ref().map(|a| a.end)
    }

    /// Abandon the in-flight transition without emitting a final frame
    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn dispose(&mut self) {
        self.cancel();
    }
}
