use anyhow::{anyhow, Context};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tcascore::interface::{AlertLevel, CycleFrame, CycleReport, CycleStatus};
use tcascore::telemetry::MetricsSnapshot;
use tcascore::{CollisionEngine, EngineConfig};

pub struct WorkflowResult {
    pub reports: Vec<CycleReport>,
    /// Highest level reached per intruder, keyed by its display id.
    pub peak_levels: BTreeMap<String, AlertLevel>,
    pub alert_count: usize,
    pub no_ownship_cycles: usize,
    pub metrics: MetricsSnapshot,
}

impl WorkflowResult {
    pub fn last(&self) -> Option<&CycleReport> {
        self.reports.last()
    }
}

/// Shared handle to one engine instance; clones drive the same tracks.
#[derive(Clone)]
pub struct Runner {
    config: EngineConfig,
    engine: Arc<Mutex<CollisionEngine>>,
}

impl Runner {
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let engine = CollisionEngine::new(config.clone()).context("initializing collision engine")?;
        Ok(Self {
            config,
            engine: Arc::new(Mutex::new(engine)),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn step(&self, frame: &CycleFrame) -> anyhow::Result<CycleReport> {
        let mut engine = self
            .engine
            .lock()
            .map_err(|_| anyhow!("collision engine lock poisoned"))?;
        Ok(engine.run_cycle(frame))
    }

    pub fn metrics(&self) -> anyhow::Result<MetricsSnapshot> {
        let engine = self
            .engine
            .lock()
            .map_err(|_| anyhow!("collision engine lock poisoned"))?;
        Ok(engine.metrics())
    }

    pub fn execute(&self, frames: &[CycleFrame]) -> anyhow::Result<WorkflowResult> {
        let mut reports = Vec::with_capacity(frames.len());
        let mut peak_levels: BTreeMap<String, AlertLevel> = BTreeMap::new();
        let mut alert_count = 0;
        let mut no_ownship_cycles = 0;

        for frame in frames {
            let report = self
                .step(frame)
                .with_context(|| format!("running cycle at t={:.3}", frame.timestamp))?;
            if report.status == CycleStatus::NoOwnship {
                no_ownship_cycles += 1;
            }
            alert_count += report.alerts.len();
            for alert in &report.alerts {
                let peak = peak_levels.entry(alert.intruder.to_string()).or_insert(alert.level);
                *peak = (*peak).max(alert.level);
            }
            reports.push(report);
        }

        Ok(WorkflowResult {
            reports,
            peak_levels,
            alert_count,
            no_ownship_cycles,
            metrics: self.metrics()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_frames, ScenarioConfig};
    use crate::generator::template::ScenarioKind;

    fn run(kind: ScenarioKind, cycles: usize) -> WorkflowResult {
        let scenario = ScenarioConfig {
            kind,
            rate_hz: 10.0,
            position_noise_m: 1.0,
            velocity_noise_mps: 0.1,
            ..ScenarioConfig::default()
        };
        let frames = build_frames(&scenario, cycles).unwrap();
        let runner = Runner::new(EngineConfig::default()).unwrap();
        runner.execute(&frames).unwrap()
    }

    #[test]
    fn head_on_scenario_peaks_critical() {
        let result = run(ScenarioKind::HeadOn, 20);
        assert_eq!(result.reports.len(), 20);
        assert_eq!(result.peak_levels.get("A1B2C3"), Some(&AlertLevel::Critical));
        assert_eq!(result.metrics.cycles, 20);
    }

    #[test]
    fn diverging_scenario_stays_quiet() {
        let result = run(ScenarioKind::Diverging, 30);
        let peak = result.peak_levels.get("89E112").copied().unwrap_or(AlertLevel::None);
        assert!(peak <= AlertLevel::Low);
    }

    #[test]
    fn frames_without_ownship_are_counted() {
        let runner = Runner::new(EngineConfig::default()).unwrap();
        let frames = vec![CycleFrame::default(), CycleFrame::default()];
        let result = runner.execute(&frames).unwrap();
        assert_eq!(result.no_ownship_cycles, 2);
        assert_eq!(result.alert_count, 0);
    }

    #[test]
    fn invalid_engine_config_fails_fast() {
        let mut config = EngineConfig::default();
        config.alerting.score_cache_capacity = 0;
        assert!(Runner::new(config).is_err());
    }
}
