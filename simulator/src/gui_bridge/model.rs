use serde::Serialize;
use tcascore::interface::{Alert, CycleReport, CycleStatus, SkippedObject};
use tcascore::telemetry::MetricsSnapshot;

/// Latest cycle outcome as served on `GET /alerts`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct AlertBoard {
    pub cycle: u64,
    pub timestamp: f64,
    pub status: Option<CycleStatus>,
    pub alerts: Vec<Alert>,
    pub skipped: Vec<SkippedObject>,
    pub active_tracks: usize,
    pub metrics: MetricsSnapshot,
    pub scenario: Option<String>,
}

impl AlertBoard {
    pub fn from_report(report: &CycleReport, metrics: MetricsSnapshot) -> Self {
        Self {
            cycle: report.cycle,
            timestamp: report.timestamp,
            status: Some(report.status),
            alerts: report.alerts.clone(),
            skipped: report.skipped.clone(),
            active_tracks: report.active_tracks,
            metrics,
            scenario: None,
        }
    }

    pub fn with_scenario(mut self, name: impl Into<String>) -> Self {
        self.scenario = Some(name.into());
        self
    }

    /// One-line operator summary of the most urgent alert.
    pub fn headline(&self) -> String {
        match self.alerts.first() {
            Some(alert) => format!("{} ({})", alert.message, alert.recommended_action),
            None => format!("cycle {}: clear, {} tracks", self.cycle, self.active_tracks),
        }
    }
}
