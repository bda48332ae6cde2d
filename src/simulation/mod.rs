//! Simulation engine: environmental inputs to derived physiological metrics.
//!
//! The model is illustrative, not medical:
//!
//! ```text
//! sweat_volume     = 0.5 + (temperature - 20) * 0.1
//! water_loss       = sweat_volume * 0.7 - (0.3 if hydrated)
//! body_temperature = 37 + (temperature - 25) * 0.1 + (water_loss * 0.05 if not hydrated)
//! ```
//!
//! Metrics are derived exactly and rounded once, to one decimal place,
//! halves away from zero. Humidity is carried through untouched. Nothing is
//! clamped: out-of-range inputs produce whatever the formulas give.

mod fixed;

pub use fixed::Fixed;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::input::EnvironmentalInput;

/// Exact, unrounded metrics for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Sweat volume in litres.
    pub sweat_volume: Fixed,
    /// Net water loss in litres.
    pub water_loss: Fixed,
    /// Core body temperature in °C.
    pub body_temperature: Fixed,
}

impl DerivedMetrics {
    /// Rounds every metric to one decimal place.
    #[must_use]
    pub const fn rounded(self) -> Self {
        Self {
            sweat_volume: self.sweat_volume.round_tenths(),
            water_loss: self.water_loss.round_tenths(),
            body_temperature: self.body_temperature.round_tenths(),
        }
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Air temperature in °C, as given.
    pub temperature: i32,
    /// Relative humidity in %, as given.
    pub humidity: u8,
    /// Whether the runner drank water.
    pub hydrated: bool,
    /// Sweat volume in litres, one decimal.
    pub sweat_volume: f64,
    /// Net water loss in litres, one decimal.
    pub water_loss: f64,
    /// Core body temperature in °C, one decimal.
    pub body_temperature: f64,
}

impl SimulationResult {
    /// The input this result was derived from.
    #[must_use]
    pub const fn input(&self) -> EnvironmentalInput {
        EnvironmentalInput::new(self.temperature, self.humidity, self.hydrated)
    }

    /// Indicator/value pairs for charting, in display order.
    #[must_use]
    pub fn metrics(&self) -> [(&'static str, f64); 5] {
        [
            ("temperature", f64::from(self.temperature)),
            ("humidity", f64::from(self.humidity)),
            ("sweat_volume", self.sweat_volume),
            ("water_loss", self.water_loss),
            ("body_temperature", self.body_temperature),
        ]
    }
}

/// Derives exact metrics without rounding.
#[must_use]
pub fn derive_metrics(input: &EnvironmentalInput) -> DerivedMetrics {
    let temperature = i64::from(input.temperature);

    let sweat_volume = Fixed::from_tenths(5) + Fixed::from_tenths(temperature - 20);

    let hydration_credit = if input.hydrated {
        Fixed::from_tenths(3)
    } else {
        Fixed::ZERO
    };
    let water_loss = sweat_volume.scale_by(7, 10) - hydration_credit;

    let dehydration_heat = if input.hydrated {
        Fixed::ZERO
    } else {
        water_loss.scale_by(5, 100)
    };
    let body_temperature =
        Fixed::from_int(37) + Fixed::from_tenths(temperature - 25) + dehydration_heat;

    DerivedMetrics {
        sweat_volume,
        water_loss,
        body_temperature,
    }
}

/// Runs the model for one input.
#[must_use]
pub fn simulate(input: &EnvironmentalInput) -> SimulationResult {
    let metrics = derive_metrics(input).rounded();

    let result = SimulationResult {
        temperature: input.temperature,
        humidity: input.humidity,
        hydrated: input.hydrated,
        sweat_volume: metrics.sweat_volume.to_f64(),
        water_loss: metrics.water_loss.to_f64(),
        body_temperature: metrics.body_temperature.to_f64(),
    };

    debug!(
        temperature = result.temperature,
        humidity = result.humidity,
        hydrated = result.hydrated,
        sweat_volume = result.sweat_volume,
        water_loss = result.water_loss,
        body_temperature = result.body_temperature,
        "simulation run"
    );

    result
}
