use crate::interface::alert::Alert;
use crate::interface::environment::{EnvironmentAdvisory, EnvironmentContext};
use crate::interface::report::{Kinematics, ObjectId, SensorReport};
use serde::{Deserialize, Serialize};

/// Everything the engine consumes for one update cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleFrame {
    pub timestamp: f64,
    #[serde(default)]
    pub ownship: Option<Kinematics>,
    #[serde(default)]
    pub reports: Vec<SensorReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Nominal,
    /// No reference frame this cycle; the alert list is empty by necessity,
    /// not because nothing was found.
    NoOwnship,
    BudgetExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedObject {
    pub id: ObjectId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp: f64,
    pub status: CycleStatus,
    pub alerts: Vec<Alert>,
    pub skipped: Vec<SkippedObject>,
    pub evicted: Vec<ObjectId>,
    pub dropped_reports: usize,
    pub active_tracks: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentAdvisory>,
}

impl CycleReport {
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
