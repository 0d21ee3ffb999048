use crate::interface::environment::EnvironmentAdvisory;
use crate::interface::report::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert severity, ordered from `None` (lowest) to `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    /// Reportable levels in ascending order.
    pub const REPORTABLE: [AlertLevel; 4] = [
        AlertLevel::Low,
        AlertLevel::Medium,
        AlertLevel::High,
        AlertLevel::Critical,
    ];

    /// Advisory class announced to the crew for this level.
    pub fn advisory(self) -> Advisory {
        match self {
            AlertLevel::Critical => Advisory::Resolution,
            AlertLevel::High => Advisory::Traffic,
            AlertLevel::Medium => Advisory::Advisory,
            AlertLevel::Low | AlertLevel::None => Advisory::Information,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertLevel::None => "NONE",
            AlertLevel::Low => "LOW",
            AlertLevel::Medium => "MEDIUM",
            AlertLevel::High => "HIGH",
            AlertLevel::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advisory {
    #[serde(rename = "RA")]
    Resolution,
    #[serde(rename = "TA")]
    Traffic,
    #[serde(rename = "ADVISORY")]
    Advisory,
    #[serde(rename = "INFO")]
    Information,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Advisory::Resolution => "RESOLUTION ADVISORY",
            Advisory::Traffic => "TRAFFIC ALERT",
            Advisory::Advisory => "Traffic advisory",
            Advisory::Information => "Traffic information",
        };
        f.write_str(name)
    }
}

/// Relative encounter geometry between ownship and an intruder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    HeadOn,
    Crossing,
    Overtaking,
    Diverging,
}

/// Per-pair risk components carried on every alert.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskFactors {
    pub speed: f64,
    pub altitude: f64,
    pub proximity: f64,
    /// Miss-distance factor from the predicted closest approach.
    pub cpa_gate: f64,
    pub closure_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub advisory: Advisory,
    pub intruder: ObjectId,
    pub score: f64,
    pub separation_m: f64,
    pub horizontal_separation_m: f64,
    pub vertical_separation_m: f64,
    pub time_to_cpa_s: f64,
    pub predicted_min_separation_m: f64,
    pub confidence: f64,
    pub geometry: Geometry,
    pub factors: RiskFactors,
    pub recommended_action: String,
    pub message: String,
    /// Conditions around ownship this cycle, when the frame reported any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentAdvisory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_totally_ordered_by_severity() {
        assert!(AlertLevel::Critical > AlertLevel::High);
        assert!(AlertLevel::High > AlertLevel::Medium);
        assert!(AlertLevel::Medium > AlertLevel::Low);
        assert!(AlertLevel::Low > AlertLevel::None);
    }

    #[test]
    fn levels_serialize_in_upper_case() {
        let json = serde_json::to_string(&AlertLevel::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
        let advisory = serde_json::to_string(&AlertLevel::High.advisory()).unwrap();
        assert_eq!(advisory, "\"TA\"");
    }
}
