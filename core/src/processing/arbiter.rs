use crate::config::AlertConfig;
use crate::interface::{Alert, AlertLevel, ObjectId};
use crate::processing::risk::RiskAssessment;
use crate::telemetry::log::LogManager;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedScore {
    score: f64,
    level: AlertLevel,
}

/// Maps risk scores to ranked alerts, holding last cycle's levels for hysteresis.
pub struct AlertArbiter {
    config: AlertConfig,
    previous: HashMap<ObjectId, CachedScore>,
    logger: LogManager,
}

impl AlertArbiter {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            previous: HashMap::new(),
            logger: LogManager::new("arbiter"),
        }
    }

    /// Level for `score`, holding a previously higher level while the score
    /// stays within the hysteresis margin of that level's threshold.
    pub fn level_for(&self, id: &ObjectId, score: f64) -> AlertLevel {
        let thresholds = &self.config.thresholds;
        let raw = thresholds.level_for(score);
        let Some(previous) = self.previous.get(id) else {
            return raw;
        };
        if previous.level <= raw {
            return raw;
        }
        let margin = self.config.hysteresis_margin;
        let held = AlertLevel::REPORTABLE
            .iter()
            .rev()
            .copied()
            .filter(|level| *level <= previous.level)
            .find(|level| score >= thresholds.threshold(*level) - margin)
            .unwrap_or(AlertLevel::None);
        raw.max(held)
    }

    pub fn previous_level(&self, id: &ObjectId) -> Option<AlertLevel> {
        self.previous.get(id).map(|cached| cached.level)
    }

    pub fn previous_score(&self, id: &ObjectId) -> Option<f64> {
        self.previous.get(id).map(|cached| cached.score)
    }

    pub fn cache_len(&self) -> usize {
        self.previous.len()
    }

    /// Drops cached scores of evicted tracks.
    pub fn forget(&mut self, ids: &[ObjectId]) {
        for id in ids {
            self.previous.remove(id);
        }
    }

    /// Produces this cycle's ranked alert list from the complete set of
    /// assessments and replaces the score cache with this cycle's values.
    pub fn arbitrate(&mut self, assessments: &[RiskAssessment]) -> Vec<Alert> {
        let levelled: Vec<(&RiskAssessment, AlertLevel)> = assessments
            .iter()
            .map(|assessment| {
                let level = self.level_for(&assessment.intruder, assessment.combined_score);
                (assessment, level)
            })
            .collect();

        for (assessment, level) in &levelled {
            if let Some(previous) = self.previous_level(&assessment.intruder) {
                if previous != *level {
                    self.logger.record(&format!(
                        "{} {} -> {} (score {:.3})",
                        assessment.intruder, previous, level, assessment.combined_score
                    ));
                }
            }
        }

        let mut cache: Vec<(ObjectId, CachedScore)> = levelled
            .iter()
            .map(|(assessment, level)| {
                (
                    assessment.intruder,
                    CachedScore {
                        score: assessment.combined_score,
                        level: *level,
                    },
                )
            })
            .collect();
        if cache.len() > self.config.score_cache_capacity {
            cache.sort_by(|a, b| b.1.score.total_cmp(&a.1.score).then(a.0.cmp(&b.0)));
            cache.truncate(self.config.score_cache_capacity);
        }
        self.previous = cache.into_iter().collect();

        let mut alerts: Vec<Alert> = levelled
            .into_iter()
            .filter(|(_, level)| *level > AlertLevel::None)
            .map(|(assessment, level)| self.build_alert(assessment, level))
            .collect();
        alerts.sort_by(rank);
        alerts
    }

    fn build_alert(&self, assessment: &RiskAssessment, level: AlertLevel) -> Alert {
        let advisory = level.advisory();
        let action = self.config.actions.lookup(level, assessment.geometry);
        Alert {
            level,
            advisory,
            intruder: assessment.intruder,
            score: assessment.combined_score,
            separation_m: assessment.separation_m,
            horizontal_separation_m: assessment.horizontal_separation_m,
            vertical_separation_m: assessment.vertical_separation_m,
            time_to_cpa_s: assessment.time_to_cpa_s,
            predicted_min_separation_m: assessment.predicted_min_separation_m,
            confidence: assessment.confidence,
            geometry: assessment.geometry,
            factors: assessment.factors(),
            recommended_action: action.to_string(),
            message: format!(
                "{}: separation {:.1} m in {:.1} s",
                advisory, assessment.separation_m, assessment.time_to_cpa_s
            ),
            environment: None,
        }
    }
}

/// Imminent conflicts (HIGH and CRITICAL together) lead, soonest CPA first
/// then highest score; the rest follow by severity then score. Intruder id
/// keeps the order total.
fn rank(a: &Alert, b: &Alert) -> Ordering {
    let imminent = |alert: &Alert| alert.level >= AlertLevel::High;
    let ordered = match (imminent(a), imminent(b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a
            .time_to_cpa_s
            .total_cmp(&b.time_to_cpa_s)
            .then_with(|| b.score.total_cmp(&a.score)),
        (false, false) => b
            .level
            .cmp(&a.level)
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.time_to_cpa_s.total_cmp(&b.time_to_cpa_s)),
    };
    ordered.then_with(|| a.intruder.cmp(&b.intruder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::Geometry;

    fn assessment(id: u32, score: f64, tcpa: f64) -> RiskAssessment {
        RiskAssessment {
            intruder: ObjectId::Icao(id),
            speed_risk: score,
            altitude_risk: score,
            proximity_risk: score,
            cpa_gate: 1.0,
            combined_score: score,
            time_to_cpa_s: tcpa,
            predicted_min_separation_m: 100.0,
            vertical_separation_at_cpa_m: 0.0,
            closure_rate_mps: 300.0,
            separation_m: 5000.0,
            horizontal_separation_m: 5000.0,
            vertical_separation_m: 0.0,
            confidence: 0.9,
            geometry: Geometry::HeadOn,
        }
    }

    #[test]
    fn none_is_omitted_and_low_is_kept() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        let alerts = arbiter.arbitrate(&[assessment(1, 0.05, 30.0), assessment(2, 0.25, 30.0)]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].intruder, ObjectId::Icao(2));
        assert_eq!(alerts[0].level, AlertLevel::Low);
        assert_eq!(arbiter.cache_len(), 2);
    }

    #[test]
    fn high_alert_holds_through_a_dip_within_margin() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        let alerts = arbiter.arbitrate(&[assessment(1, 0.65, 25.0)]);
        assert_eq!(alerts[0].level, AlertLevel::High);

        // 0.58 is below HIGH (0.60) but inside the 0.05 margin.
        let alerts = arbiter.arbitrate(&[assessment(1, 0.58, 24.0)]);
        assert_eq!(alerts[0].level, AlertLevel::High);

        let alerts = arbiter.arbitrate(&[assessment(1, 0.50, 23.0)]);
        assert_eq!(alerts[0].level, AlertLevel::Medium);
    }

    #[test]
    fn promotion_uses_raw_threshold() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        arbiter.arbitrate(&[assessment(1, 0.45, 25.0)]);
        assert_eq!(arbiter.level_for(&ObjectId::Icao(1), 0.58), AlertLevel::Medium);
        assert_eq!(arbiter.level_for(&ObjectId::Icao(1), 0.60), AlertLevel::High);
    }

    #[test]
    fn imminent_conflicts_are_ranked_by_time_to_cpa() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        let alerts = arbiter.arbitrate(&[
            assessment(1, 0.45, 5.0),
            assessment(2, 0.80, 30.0),
            assessment(3, 0.90, 12.0),
            assessment(4, 0.65, 8.0),
            assessment(5, 0.70, 8.0),
        ]);
        let order: Vec<ObjectId> = alerts.iter().map(|a| a.intruder).collect();
        assert_eq!(
            order,
            vec![
                ObjectId::Icao(5),
                ObjectId::Icao(4),
                ObjectId::Icao(3),
                ObjectId::Icao(2),
                ObjectId::Icao(1)
            ]
        );
        assert_eq!(alerts[2].advisory, crate::interface::Advisory::Resolution);
        assert_eq!(
            alerts[2].recommended_action,
            "IMMEDIATE EVASIVE ACTION REQUIRED - HEAD-ON TRAFFIC"
        );
    }

    #[test]
    fn sooner_high_outranks_later_critical() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        let alerts = arbiter.arbitrate(&[assessment(1, 0.80, 40.0), assessment(2, 0.65, 6.0)]);
        assert_eq!(alerts[0].intruder, ObjectId::Icao(2));
        assert_eq!(alerts[0].level, AlertLevel::High);
        assert_eq!(alerts[1].level, AlertLevel::Critical);
    }

    #[test]
    fn lower_levels_follow_by_severity_then_score() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        let alerts = arbiter.arbitrate(&[
            assessment(1, 0.25, 2.0),
            assessment(2, 0.45, 50.0),
            assessment(3, 0.55, 40.0),
            assessment(4, 0.62, 59.0),
        ]);
        let order: Vec<ObjectId> = alerts.iter().map(|a| a.intruder).collect();
        assert_eq!(
            order,
            vec![ObjectId::Icao(4), ObjectId::Icao(3), ObjectId::Icao(2), ObjectId::Icao(1)]
        );
    }

    #[test]
    fn message_names_advisory_separation_and_time() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        let alerts = arbiter.arbitrate(&[assessment(1, 0.9, 20.0)]);
        assert_eq!(alerts[0].message, "RESOLUTION ADVISORY: separation 5000.0 m in 20.0 s");
        assert!(alerts[0].environment.is_none());
    }

    #[test]
    fn forget_clears_evicted_entries() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        arbiter.arbitrate(&[assessment(1, 0.65, 25.0), assessment(2, 0.3, 25.0)]);
        arbiter.forget(&[ObjectId::Icao(1)]);
        assert!(arbiter.previous_level(&ObjectId::Icao(1)).is_none());
        assert_eq!(arbiter.previous_level(&ObjectId::Icao(2)), Some(AlertLevel::Low));
    }

    #[test]
    fn cache_is_bounded_by_capacity() {
        let config = AlertConfig {
            score_cache_capacity: 2,
            ..AlertConfig::default()
        };
        let mut arbiter = AlertArbiter::new(config);
        arbiter.arbitrate(&[
            assessment(1, 0.1, 25.0),
            assessment(2, 0.9, 25.0),
            assessment(3, 0.5, 25.0),
        ]);
        assert_eq!(arbiter.cache_len(), 2);
        assert!(arbiter.previous_score(&ObjectId::Icao(1)).is_none());
    }

    #[test]
    fn identical_input_yields_identical_alerts() {
        let mut arbiter = AlertArbiter::new(AlertConfig::default());
        let input = [assessment(7, 0.62, 14.0), assessment(8, 0.41, 20.0)];
        let first = arbiter.arbitrate(&input);
        let second = arbiter.arbitrate(&input);
        assert_eq!(first, second);
    }
}
