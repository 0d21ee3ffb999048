use crate::generator::template::{intruders, IntruderTemplate, ScenarioKind};
use anyhow::ensure;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tcascore::interface::{Classification, CycleFrame, EnvironmentContext, Kinematics, SensorReport};
use tcascore::math::Vec3;

/// Highest frame rate a scenario may request; the live loop ticks once per frame.
pub const MAX_RATE_HZ: f64 = 1000.0;

/// Configuration for generating synthetic encounter frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub kind: ScenarioKind,
    pub rate_hz: f64,
    pub ownship_speed_mps: f64,
    pub ownship_altitude_m: f64,
    pub position_noise_m: f64,
    pub velocity_noise_mps: f64,
    /// Probability that an intruder goes unreported in a given cycle.
    pub dropout_probability: f64,
    /// Adds a camera report for every intruder, not only silent ones.
    pub include_visual: bool,
    pub seed: u64,
    pub description: Option<String>,
    /// Weather and terrain attached unchanged to every frame.
    pub environment: Option<EnvironmentContext>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            kind: ScenarioKind::HeadOn,
            rate_hz: 30.0,
            ownship_speed_mps: 231.5,
            ownship_altitude_m: 3000.0,
            position_noise_m: 5.0,
            velocity_noise_mps: 0.5,
            dropout_probability: 0.0,
            include_visual: false,
            seed: 0,
            description: None,
            environment: None,
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.rate_hz > 0.0 && self.rate_hz <= MAX_RATE_HZ,
            "scenario rate must lie in (0, {}] Hz, got {}",
            MAX_RATE_HZ,
            self.rate_hz
        );
        ensure!(
            (0.0..=1.0).contains(&self.dropout_probability),
            "dropout probability {} outside [0, 1]",
            self.dropout_probability
        );
        ensure!(
            self.position_noise_m >= 0.0 && self.velocity_noise_mps >= 0.0,
            "noise levels must be non-negative"
        );
        Ok(())
    }

    pub fn name(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("{:?}", self.kind))
    }
}

/// Endless frame source for one scenario; deterministic for a given seed.
pub struct ScenarioStream {
    config: ScenarioConfig,
    templates: Vec<IntruderTemplate>,
    rng: StdRng,
    cycle: u64,
}

impl ScenarioStream {
    pub fn new(config: ScenarioConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            templates: intruders(config.kind, config.ownship_speed_mps),
            rng: StdRng::seed_from_u64(config.seed),
            cycle: 0,
            config,
        })
    }

    fn ownship_at(&self, t: f64) -> Kinematics {
        let speed = self.config.ownship_speed_mps;
        Kinematics::new(
            t,
            Vec3::new(speed * t, 0.0, self.config.ownship_altitude_m),
            Vec3::new(speed, 0.0, 0.0),
        )
    }

    fn jitter(&mut self, scale: f64) -> Vec3 {
        if scale <= 0.0 {
            return Vec3::ZERO;
        }
        Vec3::new(
            self.rng.gen_range(-scale..scale),
            self.rng.gen_range(-scale..scale),
            self.rng.gen_range(-scale..scale),
        )
    }

    fn noisy(&mut self, truth: &Kinematics, scale: f64) -> Kinematics {
        let position = truth.position + self.jitter(self.config.position_noise_m * scale);
        let velocity = truth.velocity + self.jitter(self.config.velocity_noise_mps * scale);
        Kinematics::new(truth.timestamp, position, velocity)
    }

    fn reports_for(&mut self, template: &IntruderTemplate, t: f64) -> Vec<SensorReport> {
        let start = Vec3::new(0.0, 0.0, self.config.ownship_altitude_m) + template.offset;
        let truth = Kinematics::new(t, start + template.velocity * t, template.velocity);

        let mut reports = Vec::with_capacity(3);
        if let Some(icao) = template.icao {
            reports.push(SensorReport::Transponder {
                icao,
                callsign: template.callsign.clone(),
                kinematics: self.noisy(&truth, 0.2),
            });
        }
        reports.push(SensorReport::Radar {
            hint: None,
            kinematics: self.noisy(&truth, 1.0),
        });
        if template.visual || self.config.include_visual {
            let confidence = self.rng.gen_range(0.6..0.95);
            reports.push(SensorReport::Visual {
                hint: None,
                classification: Some(Classification {
                    label: "aircraft".into(),
                    confidence,
                }),
                kinematics: self.noisy(&truth, 2.0),
            });
        }
        reports
    }
}

impl Iterator for ScenarioStream {
    type Item = CycleFrame;

    fn next(&mut self) -> Option<CycleFrame> {
        let t = self.cycle as f64 / self.config.rate_hz;
        self.cycle += 1;

        let templates = self.templates.clone();
        let mut reports = Vec::new();
        for template in &templates {
            if self.rng.gen_bool(self.config.dropout_probability) {
                continue;
            }
            reports.extend(self.reports_for(template, t));
        }

        Some(CycleFrame {
            timestamp: t,
            ownship: Some(self.ownship_at(t)),
            reports,
            environment: self.config.environment.clone(),
        })
    }
}

pub fn build_frames(config: &ScenarioConfig, cycles: usize) -> anyhow::Result<Vec<CycleFrame>> {
    Ok(ScenarioStream::new(config.clone())?.take(cycles).collect())
}
