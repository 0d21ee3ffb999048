//! Tunable configuration for every engine stage.
//!
//! All sections deserialize with defaults, so a workflow file only needs to
//! name the values it overrides.

use crate::interface::{AlertLevel, Geometry, SensorKind};
use crate::prelude::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fusion: FusionConfig,
    pub tracking: TrackingConfig,
    pub prediction: PredictionConfig,
    pub risk: RiskConfig,
    pub alerting: AlertConfig,
    pub environment: EnvironmentConfig,
    /// Wall-clock budget for one cycle; overruns are flagged, never blocking.
    /// Zero disables the check.
    pub cycle_budget_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig::default(),
            tracking: TrackingConfig::default(),
            prediction: PredictionConfig::default(),
            risk: RiskConfig::default(),
            alerting: AlertConfig::default(),
            environment: EnvironmentConfig::default(),
            cycle_budget_ms: 33.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.fusion.validate()?;
        self.tracking.validate()?;
        self.prediction.validate()?;
        self.risk.validate()?;
        self.alerting.validate()?;
        self.environment.validate()?;
        if !self.cycle_budget_ms.is_finite() || self.cycle_budget_ms < 0.0 {
            return Err(invalid("cycle budget must be finite and non-negative"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig(message.into())
}

/// One value per sensor type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorTable {
    pub transponder: f64,
    pub radar: f64,
    pub visual: f64,
}

impl SensorTable {
    pub fn get(&self, kind: SensorKind) -> f64 {
        match kind {
            SensorKind::Transponder => self.transponder,
            SensorKind::Radar => self.radar,
            SensorKind::Visual => self.visual,
        }
    }

    fn all_within(&self, low: f64, high: f64) -> bool {
        [self.transponder, self.radar, self.visual]
            .iter()
            .all(|v| v.is_finite() && *v >= low && *v <= high)
    }
}

/// Resolution applied when two gating candidates are equally close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    LowestStaleness,
    HighestConfidence,
    LowestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Averaging weight per sensor type, renormalised per object and cycle.
    pub weights: SensorTable,
    /// Reliability of a single, agreeing report of each type.
    pub reliability: SensorTable,
    pub gate_distance_m: f64,
    pub tie_epsilon_m: f64,
    pub tie_break: TieBreakPolicy,
    /// Deviation from the fused position at which agreement reaches zero.
    pub agreement_tolerance_m: f64,
    pub unclassified_visual_penalty: f64,
    pub terrain_floor_m: f64,
    pub max_plausible_speed_mps: f64,
    /// Reports older than this relative to the cycle are stale input.
    pub max_report_age_s: f64,
    pub initiate_untracked: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: SensorTable {
                transponder: 0.4,
                radar: 0.4,
                visual: 0.2,
            },
            reliability: SensorTable {
                transponder: 0.95,
                radar: 0.85,
                visual: 0.6,
            },
            gate_distance_m: 1500.0,
            tie_epsilon_m: 1.0,
            tie_break: TieBreakPolicy::LowestStaleness,
            agreement_tolerance_m: 300.0,
            unclassified_visual_penalty: 0.5,
            terrain_floor_m: -500.0,
            max_plausible_speed_mps: 1000.0,
            max_report_age_s: 2.0,
            initiate_untracked: true,
        }
    }
}

impl FusionConfig {
    fn validate(&self) -> EngineResult<()> {
        if !self.weights.all_within(0.0, f64::MAX) {
            return Err(invalid("fusion weights must be finite and non-negative"));
        }
        if !self.reliability.all_within(0.0, 1.0) {
            return Err(invalid("sensor reliability must lie in [0, 1]"));
        }
        if self.gate_distance_m <= 0.0 || self.agreement_tolerance_m <= 0.0 {
            return Err(invalid("gate distance and agreement tolerance must be positive"));
        }
        if !(0.0..=1.0).contains(&self.unclassified_visual_penalty) {
            return Err(invalid("unclassified visual penalty must lie in [0, 1]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Points retained per track; oldest are overwritten first.
    pub history_capacity: usize,
    /// Tracks are evicted once staleness exceeds this many cycles.
    pub max_staleness: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            history_capacity: 32,
            max_staleness: 30,
        }
    }
}

impl TrackingConfig {
    fn validate(&self) -> EngineResult<()> {
        if self.history_capacity < 2 {
            return Err(invalid("history capacity must hold at least two points"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub horizon_s: f64,
    pub sample_interval_s: f64,
    /// Residual confidence multiplier reached at the horizon.
    pub decay_floor: f64,
    pub regression_points: usize,
    /// Share of the latest reported velocity in the blended estimate.
    pub instantaneous_weight: f64,
    pub max_vertical_rate_mps: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            horizon_s: 60.0,
            sample_interval_s: 1.0,
            decay_floor: 0.5,
            regression_points: 8,
            instantaneous_weight: 0.6,
            max_vertical_rate_mps: 30.0,
        }
    }
}

impl PredictionConfig {
    fn validate(&self) -> EngineResult<()> {
        if self.horizon_s <= 0.0 || self.sample_interval_s <= 0.0 {
            return Err(invalid("prediction horizon and interval must be positive"));
        }
        if self.sample_interval_s > self.horizon_s {
            return Err(invalid("sample interval exceeds prediction horizon"));
        }
        if !(0.0..=1.0).contains(&self.decay_floor)
            || !(0.0..=1.0).contains(&self.instantaneous_weight)
        {
            return Err(invalid("decay floor and instantaneous weight must lie in [0, 1]"));
        }
        if self.regression_points < 3 {
            return Err(invalid("regression window needs at least three points"));
        }
        if self.max_vertical_rate_mps <= 0.0 {
            return Err(invalid("vertical rate limit must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskWeights {
    pub speed: f64,
    pub altitude: f64,
    pub proximity: f64,
}

impl RiskWeights {
    pub fn total(&self) -> f64 {
        self.speed + self.altitude + self.proximity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub min_horizontal_separation_m: f64,
    pub min_vertical_separation_m: f64,
    pub max_closure_speed_mps: f64,
    /// Predicted miss distance at which the CPA gate reaches zero.
    pub cpa_alert_radius_m: f64,
    /// Excess over each minimum at which proximity risk reaches zero.
    pub proximity_range_m: f64,
    pub vertical_proximity_range_m: f64,
    pub urgency_weight: f64,
    pub divergence_speed_scale_mps: f64,
    pub weights: RiskWeights,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_horizontal_separation_m: 1852.0,
            min_vertical_separation_m: 300.0,
            max_closure_speed_mps: 500.0,
            cpa_alert_radius_m: 5556.0,
            proximity_range_m: 37_040.0,
            vertical_proximity_range_m: 900.0,
            urgency_weight: 0.3,
            divergence_speed_scale_mps: 50.0,
            weights: RiskWeights {
                speed: 0.4,
                altitude: 0.3,
                proximity: 0.3,
            },
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> EngineResult<()> {
        if self.min_horizontal_separation_m <= 0.0 || self.min_vertical_separation_m <= 0.0 {
            return Err(invalid("minimum separations must be positive"));
        }
        if self.cpa_alert_radius_m <= self.min_horizontal_separation_m {
            return Err(invalid("CPA alert radius must exceed the horizontal minimum"));
        }
        if self.proximity_range_m <= 0.0 || self.vertical_proximity_range_m <= 0.0 {
            return Err(invalid("proximity ranges must be positive"));
        }
        if self.max_closure_speed_mps <= 0.0 || self.divergence_speed_scale_mps <= 0.0 {
            return Err(invalid("closure normalisation speeds must be positive"));
        }
        if !(0.0..=1.0).contains(&self.urgency_weight) {
            return Err(invalid("urgency weight must lie in [0, 1]"));
        }
        let w = self.weights;
        if w.speed < 0.0 || w.altitude < 0.0 || w.proximity < 0.0 || w.total() <= 0.0 {
            return Err(invalid("risk weights must be non-negative with a positive sum"));
        }
        Ok(())
    }
}

/// Ascending score thresholds selecting each reportable level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl AlertThresholds {
    pub fn threshold(&self, level: AlertLevel) -> f64 {
        match level {
            AlertLevel::None => 0.0,
            AlertLevel::Low => self.low,
            AlertLevel::Medium => self.medium,
            AlertLevel::High => self.high,
            AlertLevel::Critical => self.critical,
        }
    }

    pub fn level_for(&self, score: f64) -> AlertLevel {
        AlertLevel::REPORTABLE
            .iter()
            .rev()
            .copied()
            .find(|level| score >= self.threshold(*level))
            .unwrap_or(AlertLevel::None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRule {
    pub level: AlertLevel,
    pub geometry: Geometry,
    pub action: String,
}

/// Deterministic `(level, geometry) -> action` lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTable {
    pub rules: Vec<ActionRule>,
    pub critical: String,
    pub high: String,
    pub medium: String,
    pub low: String,
}

impl Default for ActionTable {
    fn default() -> Self {
        let rule = |level, geometry, action: &str| ActionRule {
            level,
            geometry,
            action: action.to_string(),
        };
        Self {
            rules: vec![
                rule(
                    AlertLevel::Critical,
                    Geometry::HeadOn,
                    "IMMEDIATE EVASIVE ACTION REQUIRED - HEAD-ON TRAFFIC",
                ),
                rule(
                    AlertLevel::Critical,
                    Geometry::Overtaking,
                    "IMMEDIATE EVASIVE ACTION REQUIRED - TRAFFIC OVERTAKING",
                ),
                rule(
                    AlertLevel::High,
                    Geometry::HeadOn,
                    "PREPARE FOR EVASIVE ACTION - HEAD-ON TRAFFIC",
                ),
                rule(
                    AlertLevel::Medium,
                    Geometry::Diverging,
                    "CONTINUE MONITORING - TRAFFIC DIVERGING",
                ),
                rule(
                    AlertLevel::Low,
                    Geometry::Diverging,
                    "CONTINUE MONITORING - TRAFFIC DIVERGING",
                ),
            ],
            critical: "IMMEDIATE EVASIVE ACTION REQUIRED".into(),
            high: "PREPARE FOR EVASIVE ACTION".into(),
            medium: "MONITOR AND MAINTAIN SEPARATION".into(),
            low: "CONTINUE MONITORING".into(),
        }
    }
}

impl ActionTable {
    pub fn lookup(&self, level: AlertLevel, geometry: Geometry) -> &str {
        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.level == level && rule.geometry == geometry)
        {
            return &rule.action;
        }
        match level {
            AlertLevel::Critical => &self.critical,
            AlertLevel::High => &self.high,
            AlertLevel::Medium => &self.medium,
            AlertLevel::Low | AlertLevel::None => &self.low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub thresholds: AlertThresholds,
    pub hysteresis_margin: f64,
    pub score_cache_capacity: usize,
    pub actions: ActionTable,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds {
                low: 0.2,
                medium: 0.4,
                high: 0.6,
                critical: 0.75,
            },
            hysteresis_margin: 0.05,
            score_cache_capacity: 256,
            actions: ActionTable::default(),
        }
    }
}

impl AlertConfig {
    fn validate(&self) -> EngineResult<()> {
        let t = self.thresholds;
        let ascending = 0.0 < t.low && t.low < t.medium && t.medium < t.high && t.high < t.critical;
        if !ascending || t.critical > 1.0 {
            return Err(invalid(format!(
                "alert thresholds must ascend within (0, 1]: {:?}",
                t
            )));
        }
        if self.hysteresis_margin < 0.0 || self.hysteresis_margin >= t.low {
            return Err(invalid("hysteresis margin must lie in [0, low threshold)"));
        }
        if self.score_cache_capacity == 0 {
            return Err(invalid("score cache capacity must be positive"));
        }
        Ok(())
    }
}

/// Band edges for a stepped factor: 1.0 past the critical edge, then 0.8,
/// 0.6 and 0.4, and 0.2 inside the low edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLadder {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl RiskLadder {
    const STEPS: [f64; 4] = [1.0, 0.8, 0.6, 0.4];
    const FLOOR: f64 = 0.2;

    fn edges(&self) -> [f64; 4] {
        [self.critical, self.high, self.medium, self.low]
    }

    /// For quantities that get worse as they fall (visibility, clearance).
    pub fn below(&self, value: f64) -> f64 {
        self.edges()
            .iter()
            .zip(Self::STEPS)
            .find(|(edge, _)| value < **edge)
            .map_or(Self::FLOOR, |(_, risk)| risk)
    }

    /// For quantities that get worse as they rise (wind, slope).
    pub fn above(&self, value: f64) -> f64 {
        self.edges()
            .iter()
            .zip(Self::STEPS)
            .find(|(edge, _)| value > **edge)
            .map_or(Self::FLOOR, |(_, risk)| risk)
    }

    fn ascending(&self) -> bool {
        self.critical < self.high && self.high < self.medium && self.medium < self.low
    }

    fn descending(&self) -> bool {
        self.critical > self.high && self.high > self.medium && self.medium > self.low
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub visibility_m: RiskLadder,
    pub precipitation_mm_h: RiskLadder,
    pub wind_kt: RiskLadder,
    pub clearance_m: RiskLadder,
    pub slope_deg: RiskLadder,
    pub roughness: RiskLadder,
    /// Obstacles at or beyond this distance add no distance risk.
    pub obstacle_distance_scale_m: f64,
    /// Obstacle height at which the height risk saturates.
    pub obstacle_height_scale_m: f64,
    /// Mean-score bands for the weather and terrain levels.
    pub levels: AlertThresholds,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        let ladder = |critical, high, medium, low| RiskLadder {
            critical,
            high,
            medium,
            low,
        };
        Self {
            visibility_m: ladder(1000.0, 3000.0, 5000.0, 8000.0),
            precipitation_mm_h: ladder(10.0, 5.0, 2.0, 0.5),
            wind_kt: ladder(50.0, 35.0, 25.0, 15.0),
            clearance_m: ladder(152.4, 304.8, 609.6, 914.4),
            slope_deg: ladder(45.0, 30.0, 15.0, 5.0),
            roughness: ladder(0.8, 0.6, 0.4, 0.2),
            obstacle_distance_scale_m: 5000.0,
            obstacle_height_scale_m: 300.0,
            levels: AlertThresholds {
                low: 0.2,
                medium: 0.4,
                high: 0.6,
                critical: 0.8,
            },
        }
    }
}

impl EnvironmentConfig {
    fn validate(&self) -> EngineResult<()> {
        if !self.visibility_m.ascending() || !self.clearance_m.ascending() {
            return Err(invalid("visibility and clearance ladders must rise from critical to low"));
        }
        let falling = [self.precipitation_mm_h, self.wind_kt, self.slope_deg, self.roughness];
        if !falling.iter().all(RiskLadder::descending) {
            return Err(invalid(
                "precipitation, wind, slope and roughness ladders must fall from critical to low",
            ));
        }
        if self.obstacle_distance_scale_m <= 0.0 || self.obstacle_height_scale_m <= 0.0 {
            return Err(invalid("obstacle scales must be positive"));
        }
        let t = self.levels;
        if !(0.0 < t.low && t.low < t.medium && t.medium < t.high && t.high < t.critical && t.critical <= 1.0) {
            return Err(invalid(format!("environment level bands must ascend within (0, 1]: {:?}", t)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn non_ascending_thresholds_are_rejected() {
        let mut config = EngineConfig::default();
        config.alerting.thresholds.high = 0.3;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn thresholds_map_scores_to_levels() {
        let t = AlertConfig::default().thresholds;
        assert_eq!(t.level_for(0.1), AlertLevel::None);
        assert_eq!(t.level_for(0.2), AlertLevel::Low);
        assert_eq!(t.level_for(0.45), AlertLevel::Medium);
        assert_eq!(t.level_for(0.7), AlertLevel::High);
        assert_eq!(t.level_for(0.9), AlertLevel::Critical);
    }

    #[test]
    fn action_table_prefers_geometry_rule_over_default() {
        let table = ActionTable::default();
        assert_eq!(
            table.lookup(AlertLevel::Critical, Geometry::HeadOn),
            "IMMEDIATE EVASIVE ACTION REQUIRED - HEAD-ON TRAFFIC"
        );
        assert_eq!(
            table.lookup(AlertLevel::Critical, Geometry::Crossing),
            "IMMEDIATE EVASIVE ACTION REQUIRED"
        );
    }

    #[test]
    fn risk_ladders_step_in_both_directions() {
        let env = EnvironmentConfig::default();
        assert_eq!(env.visibility_m.below(800.0), 1.0);
        assert_eq!(env.visibility_m.below(4000.0), 0.6);
        assert_eq!(env.visibility_m.below(12_000.0), 0.2);
        assert_eq!(env.wind_kt.above(55.0), 1.0);
        assert_eq!(env.wind_kt.above(30.0), 0.6);
        assert_eq!(env.wind_kt.above(10.0), 0.2);
    }

    #[test]
    fn misordered_environment_ladder_is_rejected() {
        let mut config = EngineConfig::default();
        config.environment.wind_kt.critical = 10.0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn negative_budget_and_proximity_range_are_rejected() {
        let mut config = EngineConfig::default();
        config.cycle_budget_ms = -1.0;
        assert!(config.validate().is_err());
        let mut config = EngineConfig::default();
        config.risk.proximity_range_m = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"risk": {"min_vertical_separation_m": 150.0}}"#).unwrap();
        assert_eq!(config.risk.min_vertical_separation_m, 150.0);
        assert_eq!(config.risk.min_horizontal_separation_m, 1852.0);
        assert_eq!(config.tracking.history_capacity, 32);
    }
}
