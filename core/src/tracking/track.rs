use crate::interface::{Classification, Kinematics, ObjectId, SensorKind};
use crate::math::Vec3;
use crate::tracking::history::HistoryRing;
use serde::{Deserialize, Serialize};

/// One recorded state of a track; never modified after it is appended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub timestamp: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub vertical_rate: f64,
}

impl TrackPoint {
    pub fn from_kinematics(kinematics: &Kinematics) -> Self {
        Self {
            timestamp: kinematics.timestamp,
            position: kinematics.position,
            velocity: kinematics.velocity,
            vertical_rate: kinematics.vertical_rate(),
        }
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics::new(self.timestamp, self.position, self.velocity)
    }
}

/// One cycle's merged view of an object across all contributing sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedObservation {
    pub object_id: ObjectId,
    pub timestamp: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub classification: Option<Classification>,
    pub fusion_confidence: f64,
    pub sources: Vec<SensorKind>,
    pub callsign: Option<String>,
}

impl FusedObservation {
    pub fn kinematics(&self) -> Kinematics {
        Kinematics::new(self.timestamp, self.position, self.velocity)
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    id: ObjectId,
    history: HistoryRing<TrackPoint>,
    latest: FusedObservation,
    staleness: u32,
}

impl Track {
    pub(crate) fn new(id: ObjectId, observation: FusedObservation, capacity: usize) -> Self {
        let mut history = HistoryRing::with_capacity(capacity);
        history.push(TrackPoint::from_kinematics(&observation.kinematics()));
        Self {
            id,
            history,
            latest: observation,
            staleness: 0,
        }
    }

    /// Appends the observation and makes it the latest one. An observation
    /// that does not advance the history is discarded and `false` returned;
    /// the track still counts as seen this cycle.
    pub(crate) fn record(&mut self, observation: FusedObservation) -> bool {
        self.staleness = 0;
        let advances = self
            .history
            .latest()
            .map_or(true, |last| observation.timestamp > last.timestamp);
        if advances {
            self.history
                .push(TrackPoint::from_kinematics(&observation.kinematics()));
            self.latest = observation;
        }
        advances
    }

    pub(crate) fn mark_missed(&mut self) -> u32 {
        self.staleness = self.staleness.saturating_add(1);
        self.staleness
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn history(&self) -> &HistoryRing<TrackPoint> {
        &self.history
    }

    pub fn latest(&self) -> &FusedObservation {
        &self.latest
    }

    pub fn staleness(&self) -> u32 {
        self.staleness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(t: f64, x: f64) -> FusedObservation {
        FusedObservation {
            object_id: ObjectId::Local(1),
            timestamp: t,
            position: Vec3::new(x, 0.0, 1000.0),
            velocity: Vec3::new(50.0, 0.0, 0.0),
            classification: None,
            fusion_confidence: 0.8,
            sources: vec![SensorKind::Radar],
            callsign: None,
        }
    }

    #[test]
    fn late_observation_keeps_latest_in_step_with_history() {
        let mut track = Track::new(ObjectId::Local(1), observation(5.0, 250.0), 4);
        track.mark_missed();
        assert!(!track.record(observation(5.0, 900.0)));
        assert!(!track.record(observation(4.0, 200.0)));
        assert_eq!(track.latest().timestamp, 5.0);
        assert_eq!(track.latest().position.x, 250.0);
        assert_eq!(track.history().latest().map(|p| p.timestamp), Some(5.0));
        assert_eq!(track.staleness(), 0);

        assert!(track.record(observation(6.0, 300.0)));
        assert_eq!(track.latest().position.x, 300.0);
        assert_eq!(track.history().len(), 2);
    }
}
