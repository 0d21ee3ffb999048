use crate::generator::profile::ScenarioConfig;
use crate::generator::template::ScenarioKind;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tcascore::EngineConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub engine: EngineConfig,
    pub scenario: ScenarioConfig,
    pub cycles: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            scenario: ScenarioConfig::default(),
            cycles: 600,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .engine
            .validate()
            .with_context(|| format!("validating engine section of {}", path_ref.display()))?;
        config
            .scenario
            .validate()
            .with_context(|| format!("validating scenario section of {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(kind: ScenarioKind, cycles: usize, rate_hz: f64, seed: u64) -> Self {
        Self {
            engine: EngineConfig::default(),
            scenario: ScenarioConfig {
                kind,
                rate_hz,
                seed,
                ..ScenarioConfig::default()
            },
            cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_sets_scenario() {
        let cfg = WorkflowConfig::from_args(ScenarioKind::Crossing, 90, 10.0, 7);
        assert_eq!(cfg.scenario.kind, ScenarioKind::Crossing);
        assert_eq!(cfg.scenario.rate_hz, 10.0);
        assert_eq!(cfg.cycles, 90);
    }

    #[test]
    fn config_load_reads_yaml_with_partial_sections() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"cycles: 120\nscenario:\n  kind: diverging\n  seed: 9\nengine:\n  alerting:\n    hysteresis_margin: 0.08\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.cycles, 120);
        assert_eq!(cfg.scenario.kind, ScenarioKind::Diverging);
        assert_eq!(cfg.scenario.rate_hz, 30.0);
        assert_eq!(cfg.engine.alerting.hysteresis_margin, 0.08);
        assert_eq!(cfg.engine.prediction.horizon_s, 60.0);
    }

    #[test]
    fn config_load_rejects_invalid_engine_section() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"engine:\n  prediction:\n    horizon_s: -1.0\n")
            .unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }

    #[test]
    fn config_load_rejects_runaway_rate() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"scenario:
  rate_hz: 1.0e9
").unwrap();
        let path = temp.into_temp_path();
        let err = WorkflowConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("scenario rate"));
    }
}
