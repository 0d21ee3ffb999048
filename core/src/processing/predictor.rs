use crate::config::PredictionConfig;
use crate::interface::{Kinematics, ObjectId};
use crate::math::{RegressionHelper, Vec3};
use crate::prelude::{clamp_unit, EngineError, EngineResult};
use crate::tracking::{HistoryRing, Track, TrackPoint};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySample {
    /// Seconds after the cycle reference time.
    pub offset: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub confidence: f64,
}

/// Extrapolated future states of one object, sampled at a fixed interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedTrajectory {
    pub object_id: Option<ObjectId>,
    pub reference_time: f64,
    pub interval: f64,
    pub base_confidence: f64,
    pub samples: Vec<TrajectorySample>,
}

impl PredictedTrajectory {
    pub fn horizon(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.offset)
    }

    /// State at the reference time.
    pub fn current(&self) -> Option<&TrajectorySample> {
        self.samples.first()
    }

    /// Linearly interpolated position at `offset`, clamped to the horizon.
    pub fn position_at(&self, offset: f64) -> Option<Vec3> {
        let first = self.samples.first()?;
        if offset <= first.offset {
            return Some(first.position);
        }
        let idx = (offset / self.interval).floor() as usize;
        match (self.samples.get(idx), self.samples.get(idx + 1)) {
            (Some(a), Some(b)) => {
                let t = (offset - a.offset) / (b.offset - a.offset);
                Some(a.position.lerp(b.position, clamp_unit(t)))
            }
            _ => self.samples.last().map(|s| s.position),
        }
    }

    /// Interpolated confidence at `offset`; non-increasing in `offset`.
    pub fn confidence_at(&self, offset: f64) -> f64 {
        let idx = (offset.max(0.0) / self.interval).floor() as usize;
        match (self.samples.get(idx), self.samples.get(idx + 1)) {
            (Some(a), Some(b)) => {
                let t = clamp_unit((offset - a.offset) / (b.offset - a.offset));
                a.confidence + (b.confidence - a.confidence) * t
            }
            (Some(a), None) => a.confidence,
            _ => self.samples.last().map_or(0.0, |s| s.confidence),
        }
    }
}

/// Constant-velocity extrapolator with regression smoothing and confidence decay.
pub struct TrajectoryPredictor {
    config: PredictionConfig,
}

impl TrajectoryPredictor {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Decay multiplier: 1 at zero, falling quadratically to the floor at the horizon.
    pub fn decay(&self, t: f64) -> f64 {
        let horizon = self.config.horizon_s;
        let ratio = (t.max(0.0) / horizon).min(1.0);
        1.0 - (1.0 - self.config.decay_floor) * ratio * ratio
    }

    pub fn predict(&self, track: &Track, reference_time: f64) -> EngineResult<PredictedTrajectory> {
        let mut trajectory = self
            .predict_history(track.history(), track.latest().fusion_confidence, reference_time)
            .ok_or(EngineError::InsufficientHistory {
                id: track.id(),
                points: track.history().len(),
            })?;
        trajectory.object_id = Some(track.id());
        Ok(trajectory)
    }

    /// Prediction from a bare history; `None` with fewer than two points.
    pub fn predict_history(
        &self,
        history: &HistoryRing<TrackPoint>,
        base_confidence: f64,
        reference_time: f64,
    ) -> Option<PredictedTrajectory> {
        if history.len() < 2 {
            return None;
        }
        let last = *history.latest()?;
        let window: Vec<&TrackPoint> = history.recent(self.config.regression_points).collect();
        let velocity = self.estimate_velocity(&last, &window);
        Some(self.extrapolate(&last.kinematics(), velocity, base_confidence, reference_time))
    }

    /// Prediction straight from a single state, used for ownship before it
    /// has accumulated history.
    pub fn predict_state(&self, state: &Kinematics, confidence: f64, reference_time: f64) -> PredictedTrajectory {
        self.extrapolate(state, self.clamp_vertical(state.velocity), confidence, reference_time)
    }

    fn estimate_velocity(&self, last: &TrackPoint, window: &[&TrackPoint]) -> Vec3 {
        let instantaneous = last.velocity;
        let blended = if window.len() >= 3 {
            let times: Vec<f64> = window.iter().map(|p| p.timestamp).collect();
            let positions: Vec<Vec3> = window.iter().map(|p| p.position).collect();
            match RegressionHelper::velocity(&times, &positions) {
                Some(regressed) => {
                    let w = self.config.instantaneous_weight;
                    instantaneous * w + regressed * (1.0 - w)
                }
                None => instantaneous,
            }
        } else {
            instantaneous
        };
        self.clamp_vertical(blended)
    }

    fn clamp_vertical(&self, velocity: Vec3) -> Vec3 {
        let limit = self.config.max_vertical_rate_mps;
        Vec3::new(velocity.x, velocity.y, velocity.z.clamp(-limit, limit))
    }

    fn extrapolate(
        &self,
        origin: &Kinematics,
        velocity: Vec3,
        base_confidence: f64,
        reference_time: f64,
    ) -> PredictedTrajectory {
        let base_confidence = clamp_unit(base_confidence);
        let age = (reference_time - origin.timestamp).max(0.0);
        let start = origin.position + velocity * age;
        let interval = self.config.sample_interval_s;
        let steps = (self.config.horizon_s / interval).floor() as usize;

        let samples = (0..=steps)
            .map(|step| {
                let offset = step as f64 * interval;
                TrajectorySample {
                    offset,
                    position: start + velocity * offset,
                    velocity,
                    confidence: base_confidence * self.decay(age + offset),
                }
            })
            .collect();

        PredictedTrajectory {
            object_id: None,
            reference_time,
            interval,
            base_confidence,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingConfig;
    use crate::interface::SensorKind;
    use crate::tracking::{FusedObservation, TrackStore};

    fn observation(t: f64, position: Vec3, velocity: Vec3) -> FusedObservation {
        FusedObservation {
            object_id: ObjectId::Icao(0x400001),
            timestamp: t,
            position,
            velocity,
            classification: None,
            fusion_confidence: 0.8,
            sources: vec![SensorKind::Transponder, SensorKind::Radar],
            callsign: None,
        }
    }

    fn store_with(points: &[(f64, Vec3, Vec3)]) -> TrackStore {
        let mut store = TrackStore::new(TrackingConfig::default());
        for (t, p, v) in points {
            store.update(ObjectId::Icao(0x400001), observation(*t, *p, *v));
            store.age();
        }
        store
    }

    #[test]
    fn single_point_track_has_insufficient_history() {
        let store = store_with(&[(0.0, Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0))]);
        let track = store.get(&ObjectId::Icao(0x400001)).unwrap();
        let predictor = TrajectoryPredictor::new(PredictionConfig::default());
        assert_eq!(
            predictor.predict(track, 0.0),
            Err(EngineError::InsufficientHistory {
                id: ObjectId::Icao(0x400001),
                points: 1
            })
        );
    }

    #[test]
    fn confidence_is_non_increasing_and_bounded_by_fusion() {
        let v = Vec3::new(120.0, 0.0, 0.0);
        let store = store_with(&[
            (0.0, Vec3::ZERO, v),
            (1.0, Vec3::new(120.0, 0.0, 0.0), v),
            (2.0, Vec3::new(240.0, 0.0, 0.0), v),
        ]);
        let track = store.get(&ObjectId::Icao(0x400001)).unwrap();
        let predictor = TrajectoryPredictor::new(PredictionConfig::default());
        let trajectory = predictor.predict(track, 2.0).unwrap();

        assert_eq!(trajectory.samples.len(), 61);
        let mut previous = f64::INFINITY;
        for sample in &trajectory.samples {
            assert!(sample.confidence <= 0.8 + 1e-12);
            assert!(sample.confidence <= previous);
            previous = sample.confidence;
        }
        assert!((trajectory.samples[0].confidence - 0.8).abs() < 1e-12);
        let floor = 0.8 * predictor.config().decay_floor;
        assert!((trajectory.samples[60].confidence - floor).abs() < 1e-12);
    }

    #[test]
    fn constant_velocity_track_extrapolates_linearly() {
        let v = Vec3::new(100.0, 50.0, 0.0);
        let store = store_with(&[
            (0.0, Vec3::new(0.0, 0.0, 3000.0), v),
            (1.0, Vec3::new(100.0, 50.0, 3000.0), v),
            (2.0, Vec3::new(200.0, 100.0, 3000.0), v),
            (3.0, Vec3::new(300.0, 150.0, 3000.0), v),
        ]);
        let track = store.get(&ObjectId::Icao(0x400001)).unwrap();
        let predictor = TrajectoryPredictor::new(PredictionConfig::default());
        let trajectory = predictor.predict(track, 3.0).unwrap();
        let at_ten = trajectory.position_at(10.0).unwrap();
        assert!((at_ten.x - 1300.0).abs() < 1e-6);
        assert!((at_ten.y - 650.0).abs() < 1e-6);
    }

    #[test]
    fn regression_smooths_noisy_instantaneous_velocity() {
        let store = store_with(&[
            (0.0, Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)),
            (1.0, Vec3::new(100.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0)),
            (2.0, Vec3::new(200.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0)),
            (3.0, Vec3::new(300.0, 0.0, 0.0), Vec3::new(200.0, 0.0, 0.0)),
        ]);
        let track = store.get(&ObjectId::Icao(0x400001)).unwrap();
        let predictor = TrajectoryPredictor::new(PredictionConfig::default());
        let trajectory = predictor.predict(track, 3.0).unwrap();
        let vx = trajectory.samples[0].velocity.x;
        assert!(vx > 100.0 && vx < 200.0);
    }

    #[test]
    fn vertical_rate_is_clamped() {
        let predictor = TrajectoryPredictor::new(PredictionConfig::default());
        let state = Kinematics::new(0.0, Vec3::ZERO, Vec3::new(0.0, 0.0, 150.0));
        let trajectory = predictor.predict_state(&state, 1.0, 0.0);
        assert_eq!(trajectory.samples[0].velocity.z, 30.0);
    }

    #[test]
    fn stale_origin_is_propagated_to_reference_time() {
        let predictor = TrajectoryPredictor::new(PredictionConfig::default());
        let state = Kinematics::new(0.0, Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0));
        let trajectory = predictor.predict_state(&state, 1.0, 2.0);
        assert_eq!(trajectory.samples[0].position.x, 200.0);
        assert!(trajectory.samples[0].confidence < 1.0);
    }
}
