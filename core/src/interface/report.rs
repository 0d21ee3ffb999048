use crate::math::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a tracked object.
///
/// Transponder-equipped aircraft are keyed by their 24-bit ICAO address;
/// objects seen only by radar or the visual channel receive a local number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ObjectId {
    Icao(u32),
    Local(u32),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Icao(icao) => write!(f, "{:06X}", icao & 0x00FF_FFFF),
            ObjectId::Local(n) => write!(f, "L{}", n),
        }
    }
}

/// Timestamped position and velocity shared by every report shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub timestamp: f64,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Kinematics {
    pub fn new(timestamp: f64, position: Vec3, velocity: Vec3) -> Self {
        Self {
            timestamp,
            position,
            velocity,
        }
    }

    pub fn vertical_rate(&self) -> f64 {
        self.velocity.z
    }

    pub fn is_finite(&self) -> bool {
        self.timestamp.is_finite() && self.position.is_finite() && self.velocity.is_finite()
    }

    /// Constant-velocity propagation to `timestamp`.
    pub fn propagated_to(&self, timestamp: f64) -> Kinematics {
        let dt = timestamp - self.timestamp;
        Kinematics {
            timestamp,
            position: self.position + self.velocity * dt,
            velocity: self.velocity,
        }
    }
}

/// Label produced by the external visual classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Transponder,
    Radar,
    Visual,
}

/// One already-normalised sensor report for a single cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sensor", rename_all = "snake_case")]
pub enum SensorReport {
    Transponder {
        icao: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        callsign: Option<String>,
        kinematics: Kinematics,
    },
    Radar {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<ObjectId>,
        kinematics: Kinematics,
    },
    Visual {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<ObjectId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        classification: Option<Classification>,
        kinematics: Kinematics,
    },
}

impl SensorReport {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReport::Transponder { .. } => SensorKind::Transponder,
            SensorReport::Radar { .. } => SensorKind::Radar,
            SensorReport::Visual { .. } => SensorKind::Visual,
        }
    }

    pub fn kinematics(&self) -> &Kinematics {
        match self {
            SensorReport::Transponder { kinematics, .. }
            | SensorReport::Radar { kinematics, .. }
            | SensorReport::Visual { kinematics, .. } => kinematics,
        }
    }

    /// Firm identity, only available from the transponder.
    pub fn firm_id(&self) -> Option<ObjectId> {
        match self {
            SensorReport::Transponder { icao, .. } => Some(ObjectId::Icao(*icao)),
            _ => None,
        }
    }

    pub fn hint(&self) -> Option<ObjectId> {
        match self {
            SensorReport::Transponder { .. } => None,
            SensorReport::Radar { hint, .. } | SensorReport::Visual { hint, .. } => *hint,
        }
    }

    pub fn classification(&self) -> Option<&Classification> {
        match self {
            SensorReport::Visual { classification, .. } => classification.as_ref(),
            _ => None,
        }
    }

    pub fn callsign(&self) -> Option<&str> {
        match self {
            SensorReport::Transponder { callsign, .. } => callsign.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_display_formats_icao_as_hex() {
        assert_eq!(ObjectId::Icao(0xA1B2C3).to_string(), "A1B2C3");
        assert_eq!(ObjectId::Local(7).to_string(), "L7");
    }

    #[test]
    fn report_deserializes_from_tagged_json() {
        let json = r#"{
            "sensor": "visual",
            "classification": {"label": "aircraft", "confidence": 0.8},
            "kinematics": {
                "timestamp": 1.0,
                "position": {"x": 0.0, "y": 0.0, "z": 1000.0},
                "velocity": {"x": 50.0, "y": 0.0, "z": 0.0}
            }
        }"#;
        let report: SensorReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.kind(), SensorKind::Visual);
        assert!(report.firm_id().is_none());
        assert_eq!(report.classification().unwrap().label, "aircraft");
    }

    #[test]
    fn propagation_moves_along_velocity() {
        let k = Kinematics::new(0.0, Vec3::ZERO, Vec3::new(10.0, 0.0, -2.0));
        let later = k.propagated_to(3.0);
        assert_eq!(later.position, Vec3::new(30.0, 0.0, -6.0));
        assert_eq!(later.timestamp, 3.0);
    }
}
