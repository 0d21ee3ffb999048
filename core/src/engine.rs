use crate::config::EngineConfig;
use crate::interface::{CycleFrame, CycleReport, CycleStatus, Kinematics, SkippedObject};
use crate::prelude::{EngineError, EngineResult};
use crate::processing::{
    AlertArbiter, EnvironmentAssessor, PredictedTrajectory, RiskAssessment, RiskAssessor, SensorFusion,
    TrajectoryPredictor,
};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use crate::tracking::{HistoryRing, TrackPoint, TrackStore};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Risk assessments for every predictable track at one reference time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleAssessment {
    pub assessments: Vec<RiskAssessment>,
    pub skipped: Vec<SkippedObject>,
}

/// Drives fusion, tracking, prediction, risk assessment and arbitration once
/// per cycle.
///
/// All mutation happens inside [`CollisionEngine::run_cycle`]; per-intruder
/// assessment reads the cycle's snapshot only and runs on the rayon pool.
pub struct CollisionEngine {
    config: EngineConfig,
    fusion: SensorFusion,
    store: TrackStore,
    predictor: TrajectoryPredictor,
    assessor: RiskAssessor,
    arbiter: AlertArbiter,
    environment: EnvironmentAssessor,
    ownship: HistoryRing<TrackPoint>,
    cycle: u64,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl CollisionEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let logger = LogManager::new("engine");
        logger.record(&format!(
            "engine ready: horizon {:.0} s, gate {:.0} m, budget {:.1} ms",
            config.prediction.horizon_s, config.fusion.gate_distance_m, config.cycle_budget_ms
        ));
        Ok(Self {
            fusion: SensorFusion::new(config.fusion.clone()),
            store: TrackStore::new(config.tracking.clone()),
            predictor: TrajectoryPredictor::new(config.prediction.clone()),
            assessor: RiskAssessor::new(config.risk.clone()),
            arbiter: AlertArbiter::new(config.alerting.clone()),
            environment: EnvironmentAssessor::new(config.environment.clone()),
            ownship: HistoryRing::with_capacity(config.tracking.history_capacity),
            cycle: 0,
            metrics: MetricsRecorder::new(),
            logger,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    pub fn arbiter(&self) -> &AlertArbiter {
        &self.arbiter
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn run_cycle(&mut self, frame: &CycleFrame) -> CycleReport {
        let started = Instant::now();
        self.cycle += 1;
        let now = frame.timestamp;

        let fused = self.fusion.fuse(&frame.reports, &self.store, now);
        let dropped_reports = fused.dropped;
        for observation in fused.observations {
            self.store.update(observation.object_id, observation);
        }
        let evicted = self.store.age();
        if !evicted.is_empty() {
            self.arbiter.forget(&evicted);
            self.logger.detail(&format!("evicted {} stale tracks", evicted.len()));
        }

        let mut report = CycleReport {
            cycle: self.cycle,
            timestamp: now,
            status: CycleStatus::Nominal,
            alerts: Vec::new(),
            skipped: Vec::new(),
            evicted,
            dropped_reports,
            active_tracks: self.store.len(),
            environment: frame
                .environment
                .as_ref()
                .and_then(|context| self.environment.assess(context)),
        };

        let ownship = match frame.ownship {
            Some(state) => self.fusion.validate_kinematics(&state, now).map(|_| state),
            None => Err(EngineError::MissingOwnship(now)),
        };
        let ownship = match ownship {
            Ok(state) => state,
            Err(err) => {
                self.logger.warn(&format!("cycle {} without reference frame: {}", self.cycle, err));
                report.status = CycleStatus::NoOwnship;
                self.record_metrics(&report);
                return report;
            }
        };
        self.push_ownship(&ownship);

        // Ownship history was just pushed, so the snapshot cannot miss it.
        let snapshot = match self.assess_snapshot(now) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.logger.warn(&err.to_string());
                CycleAssessment::default()
            }
        };
        report.alerts = self.arbiter.arbitrate(&snapshot.assessments);
        report.skipped = snapshot.skipped;
        if let Some(advisory) = &report.environment {
            for alert in &mut report.alerts {
                alert.environment = Some(advisory.clone());
            }
        }

        let elapsed = started.elapsed();
        let budget = self.config.cycle_budget_ms;
        if budget > 0.0 && elapsed > Duration::from_secs_f64(budget / 1000.0) {
            report.status = CycleStatus::BudgetExceeded;
            self.logger.warn(&format!(
                "cycle {} took {:.3} ms (budget {} ms)",
                self.cycle,
                elapsed.as_secs_f64() * 1000.0,
                self.config.cycle_budget_ms
            ));
        }
        if let Some(top) = report.alerts.first() {
            self.logger.detail(&format!("cycle {} top alert: {}", self.cycle, top.message));
        }
        self.record_metrics(&report);
        report
    }

    /// Predicts and assesses every active track against the current ownship
    /// history. Reads engine state only, so repeated calls agree.
    pub fn assess_snapshot(&self, reference_time: f64) -> EngineResult<CycleAssessment> {
        let own = self.ownship_trajectory(reference_time)?;

        let mut skipped = Vec::new();
        let mut predicted: Vec<PredictedTrajectory> = Vec::with_capacity(self.store.len());
        for track in self.store.all_active() {
            match self.predictor.predict(track, reference_time) {
                Ok(trajectory) => predicted.push(trajectory),
                Err(err) => skipped.push(SkippedObject {
                    id: track.id(),
                    reason: err.to_string(),
                }),
            }
        }

        let assessor = &self.assessor;
        let assessments = predicted
            .par_iter()
            .filter_map(|trajectory| {
                let id = trajectory.object_id?;
                assessor.assess(id, &own, trajectory)
            })
            .collect();

        Ok(CycleAssessment { assessments, skipped })
    }

    fn push_ownship(&mut self, state: &Kinematics) {
        let advances = self
            .ownship
            .latest()
            .map_or(true, |last| state.timestamp > last.timestamp);
        if advances {
            self.ownship.push(TrackPoint::from_kinematics(state));
        }
    }

    fn ownship_trajectory(&self, reference_time: f64) -> EngineResult<PredictedTrajectory> {
        if let Some(trajectory) = self.predictor.predict_history(&self.ownship, 1.0, reference_time) {
            return Ok(trajectory);
        }
        self.ownship
            .latest()
            .map(|point| self.predictor.predict_state(&point.kinematics(), 1.0, reference_time))
            .ok_or(EngineError::MissingOwnship(reference_time))
    }

    fn record_metrics(&self, report: &CycleReport) {
        self.metrics.record(|m| {
            m.cycles += 1;
            m.dropped_reports += report.dropped_reports;
            m.skipped_predictions += report.skipped.len();
            m.evictions += report.evicted.len();
            m.alerts_emitted += report.alerts.len();
            match report.status {
                CycleStatus::NoOwnship => m.missing_ownship += 1,
                CycleStatus::BudgetExceeded => m.budget_overruns += 1,
                CycleStatus::Nominal => {}
            }
        });
    }
}
