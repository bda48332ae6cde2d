//! Quiz scenario and the fixed set of hazard answers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::input::EnvironmentalInput;

/// The question presented to the user.
pub const SCENARIO_PROMPT: &str = "Running for one hour in hot, dry weather (40 °C, 20 % humidity) \
     without drinking any water: which health hazard are you facing?";

/// The conditions described by [`SCENARIO_PROMPT`].
#[must_use]
pub const fn scenario_input() -> EnvironmentalInput {
    EnvironmentalInput::new(40, 20, false)
}

/// A hazard the user can select as their answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardAnswer {
    NoRisk,
    Dehydration,
    HeatStroke,
    HeatExhaustion,
    Hypothermia,
}

impl HazardAnswer {
    /// All answers, in the order they are offered.
    pub const ALL: [Self; 5] = [
        Self::NoRisk,
        Self::Dehydration,
        Self::HeatStroke,
        Self::HeatExhaustion,
        Self::Hypothermia,
    ];

    /// Canonical label. This is the value persisted in the `answer` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoRisk => "NoRisk",
            Self::Dehydration => "Dehydration",
            Self::HeatStroke => "HeatStroke",
            Self::HeatExhaustion => "HeatExhaustion",
            Self::Hypothermia => "Hypothermia",
        }
    }

    /// Bilingual label shown next to the selector.
    #[must_use]
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::NoRisk => "无危险",
            Self::Dehydration => "脱水 (Dehydration)",
            Self::HeatStroke => "中暑 (Heat Stroke)",
            Self::HeatExhaustion => "热衰竭 (Heat Exhaustion)",
            Self::Hypothermia => "低温症 (Hypothermia)",
        }
    }

    /// Parses a label, returning `None` if it names no known hazard.
    ///
    /// Accepts canonical labels, display labels, and spelling variants that
    /// differ only in case, spacing or punctuation (`heat stroke`,
    /// `heat_stroke`, `No risk`).
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(answer) = Self::ALL.into_iter().find(|a| a.display_label() == label) {
            return Some(answer);
        }

        let key: String = label
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "norisk" | "none" => Some(Self::NoRisk),
            "dehydration" => Some(Self::Dehydration),
            "heatstroke" => Some(Self::HeatStroke),
            "heatexhaustion" => Some(Self::HeatExhaustion),
            "hypothermia" => Some(Self::Hypothermia),
            _ => None,
        }
    }
}

impl fmt::Display for HazardAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardAnswer {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s).ok_or_else(|| ValidationError::InvalidAnswer {
            value: s.to_string(),
        })
    }
}

impl From<HazardAnswer> for String {
    fn from(answer: HazardAnswer) -> Self {
        answer.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_labels_roundtrip() {
        for answer in HazardAnswer::ALL {
            assert_eq!(answer.as_str().parse::<HazardAnswer>(), Ok(answer));
            assert_eq!(HazardAnswer::parse_label(answer.display_label()), Some(answer));
        }
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(HazardAnswer::parse_label("heat stroke"), Some(HazardAnswer::HeatStroke));
        assert_eq!(HazardAnswer::parse_label(" HEAT_EXHAUSTION "), Some(HazardAnswer::HeatExhaustion));
        assert_eq!(HazardAnswer::parse_label("No risk"), Some(HazardAnswer::NoRisk));
        assert_eq!(HazardAnswer::parse_label("无危险"), Some(HazardAnswer::NoRisk));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(HazardAnswer::parse_label(""), None);
        assert_eq!(HazardAnswer::parse_label("sunburn"), None);

        let err = "frostbite".parse::<HazardAnswer>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidAnswer {
                value: "frostbite".to_string()
            }
        );
    }

    #[test]
    fn test_scenario_input() {
        let input = scenario_input();
        assert_eq!(input.temperature, 40);
        assert_eq!(input.humidity, 20);
        assert!(!input.hydrated);
    }
}
