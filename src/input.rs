//! Environmental inputs for a single simulation run.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Supported air temperature range, in °C.
pub const TEMPERATURE_RANGE: RangeInclusive<i32> = 20..=40;

/// Supported relative humidity range, in percent.
pub const HUMIDITY_RANGE: RangeInclusive<u8> = 10..=90;

/// Conditions chosen by the user for one simulated run.
///
/// Ranges are the caller's responsibility. [`EnvironmentalInput::new`] does
/// not check them and the engine never rejects a value; use
/// [`EnvironmentalInput::checked`] at an input boundary that wants the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentalInput {
    /// Air temperature in °C.
    pub temperature: i32,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Whether the runner drinks water.
    pub hydrated: bool,
}

impl EnvironmentalInput {
    /// Creates an input without range checks.
    #[must_use]
    pub const fn new(temperature: i32, humidity: u8, hydrated: bool) -> Self {
        Self {
            temperature,
            humidity,
            hydrated,
        }
    }

    /// Creates an input, rejecting values outside the supported ranges.
    pub fn checked(temperature: i32, humidity: u8, hydrated: bool) -> Result<Self, ValidationError> {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(ValidationError::InputOutOfRange {
                field: "temperature",
                value: i64::from(temperature),
                min: i64::from(*TEMPERATURE_RANGE.start()),
                max: i64::from(*TEMPERATURE_RANGE.end()),
            });
        }
        if !HUMIDITY_RANGE.contains(&humidity) {
            return Err(ValidationError::InputOutOfRange {
                field: "humidity",
                value: i64::from(humidity),
                min: i64::from(*HUMIDITY_RANGE.start()),
                max: i64::from(*HUMIDITY_RANGE.end()),
            });
        }
        Ok(Self::new(temperature, humidity, hydrated))
    }

    /// Returns true if both temperature and humidity are in range.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        TEMPERATURE_RANGE.contains(&self.temperature) && HUMIDITY_RANGE.contains(&self.humidity)
    }
}

impl Default for EnvironmentalInput {
    /// 25 °C, 40 % humidity, drinking water.
    fn default() -> Self {
        Self::new(25, 40, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_accepts_boundaries() {
        assert!(EnvironmentalInput::checked(20, 10, true).is_ok());
        assert!(EnvironmentalInput::checked(40, 90, false).is_ok());
    }

    #[test]
    fn test_checked_rejects_temperature_first() {
        let err = EnvironmentalInput::checked(41, 95, true).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InputOutOfRange {
                field: "temperature",
                value: 41,
                min: 20,
                max: 40,
            }
        );
    }

    #[test]
    fn test_checked_rejects_humidity() {
        let err = EnvironmentalInput::checked(30, 5, true).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InputOutOfRange { field: "humidity", value: 5, .. }
        ));
    }

    #[test]
    fn test_new_does_not_validate() {
        let input = EnvironmentalInput::new(-5, 100, false);
        assert!(!input.is_in_range());
    }

    #[test]
    fn test_default_matches_initial_controls() {
        let input = EnvironmentalInput::default();
        assert_eq!(input, EnvironmentalInput::new(25, 40, true));
        assert!(input.is_in_range());
    }
}
