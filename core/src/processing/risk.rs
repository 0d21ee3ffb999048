use crate::config::RiskConfig;
use crate::interface::{Geometry, ObjectId, RiskFactors};
use crate::math::Vec3;
use crate::prelude::clamp_unit;
use crate::processing::predictor::PredictedTrajectory;
use serde::Serialize;
use std::f64::consts::PI;

const DEGENERATE: f64 = 1e-6;

/// Risk of one ownship/intruder pair for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub intruder: ObjectId,
    pub speed_risk: f64,
    pub altitude_risk: f64,
    pub proximity_risk: f64,
    pub cpa_gate: f64,
    pub combined_score: f64,
    pub time_to_cpa_s: f64,
    pub predicted_min_separation_m: f64,
    pub vertical_separation_at_cpa_m: f64,
    pub closure_rate_mps: f64,
    pub separation_m: f64,
    pub horizontal_separation_m: f64,
    pub vertical_separation_m: f64,
    pub confidence: f64,
    pub geometry: Geometry,
}

impl RiskAssessment {
    pub fn factors(&self) -> RiskFactors {
        RiskFactors {
            speed: self.speed_risk,
            altitude: self.altitude_risk,
            proximity: self.proximity_risk,
            cpa_gate: self.cpa_gate,
            closure_rate: self.closure_rate_mps,
        }
    }
}

/// Closest point of approach between two sampled trajectories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    pub time: f64,
    /// Intruder minus ownship at `time`.
    pub relative: Vec3,
}

pub struct RiskAssessor {
    config: RiskConfig,
}

impl RiskAssessor {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Sample-wise minimum, refined analytically on the neighbouring segments.
    pub fn closest_approach(
        ownship: &PredictedTrajectory,
        intruder: &PredictedTrajectory,
    ) -> Option<ClosestApproach> {
        let relative: Vec<(f64, Vec3)> = ownship
            .samples
            .iter()
            .zip(intruder.samples.iter())
            .map(|(own, intr)| (own.offset, intr.position - own.position))
            .collect();

        let (best, _) = relative
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.1.norm().total_cmp(&b.1.norm()))?;
        let mut cpa = ClosestApproach {
            time: relative[best].0,
            relative: relative[best].1,
        };

        let segments = [best.checked_sub(1), Some(best)];
        for start in segments.into_iter().flatten() {
            let (Some(&(t0, a)), Some(&(t1, next))) = (relative.get(start), relative.get(start + 1))
            else {
                continue;
            };
            let b = next - a;
            let denom = b.dot(b);
            if denom < DEGENERATE {
                continue;
            }
            let s = clamp_unit(-a.dot(b) / denom);
            let candidate = a + b * s;
            if candidate.norm() < cpa.relative.norm() {
                cpa = ClosestApproach {
                    time: t0 + (t1 - t0) * s,
                    relative: candidate,
                };
            }
        }
        Some(cpa)
    }

    /// Miss-distance factor: 1 inside the horizontal minimum, 0 past the alert radius.
    pub fn cpa_gate(&self, predicted_min_separation: f64) -> f64 {
        let min_h = self.config.min_horizontal_separation_m;
        if predicted_min_separation <= min_h {
            return 1.0;
        }
        clamp_unit(1.0 - (predicted_min_separation - min_h) / (self.config.cpa_alert_radius_m - min_h))
    }

    /// Normalised elliptical proximity: 1 inside both minima, falling to 0 as
    /// the excess over the minima spans the configured proximity ranges.
    pub fn proximity(&self, horizontal: f64, vertical: f64) -> f64 {
        let cfg = &self.config;
        let h = (horizontal - cfg.min_horizontal_separation_m).max(0.0) / cfg.proximity_range_m;
        let v = (vertical - cfg.min_vertical_separation_m).max(0.0) / cfg.vertical_proximity_range_m;
        clamp_unit(1.0 - (h * h + v * v).sqrt())
    }

    pub fn assess(
        &self,
        intruder_id: ObjectId,
        ownship: &PredictedTrajectory,
        intruder: &PredictedTrajectory,
    ) -> Option<RiskAssessment> {
        let own_now = ownship.current()?;
        let intr_now = intruder.current()?;
        let cpa = Self::closest_approach(ownship, intruder)?;
        let cfg = &self.config;

        let relative = intr_now.position - own_now.position;
        let relative_velocity = intr_now.velocity - own_now.velocity;
        let range = relative.norm();
        // Zero range or zero relative motion leaves closure undefined: risk-neutral.
        let closure = if range < DEGENERATE || relative_velocity.norm() < DEGENERATE {
            0.0
        } else {
            -relative.dot(relative_velocity) / range
        };

        let horizontal = relative.horizontal_norm();
        let vertical = relative.z.abs();
        let vertical_at_cpa = cpa.relative.z.abs();
        let predicted_min_separation = cpa.relative.norm();

        let speed_risk = clamp_unit(closure / cfg.max_closure_speed_mps);
        let altitude_risk = clamp_unit(1.0 - vertical_at_cpa / cfg.min_vertical_separation_m);
        let proximity_risk = self.proximity(horizontal, vertical);

        let w = cfg.weights;
        let weighted = (w.speed * speed_risk + w.altitude * altitude_risk + w.proximity * proximity_risk)
            / w.total();

        let cpa_gate = self.cpa_gate(predicted_min_separation);
        let horizon = ownship.horizon().min(intruder.horizon());
        let urgency = if horizon > 0.0 {
            1.0 - cfg.urgency_weight * clamp_unit(cpa.time / horizon)
        } else {
            1.0
        };
        let divergence = if closure < 0.0 {
            1.0 / (1.0 + -closure / cfg.divergence_speed_scale_mps)
        } else {
            1.0
        };
        let confidence = clamp_unit(
            ownship
                .confidence_at(cpa.time)
                .min(intruder.confidence_at(cpa.time)),
        );

        let combined_score =
            clamp_unit(clamp_unit(weighted) * cpa_gate * urgency * divergence * confidence);

        Some(RiskAssessment {
            intruder: intruder_id,
            speed_risk,
            altitude_risk,
            proximity_risk,
            cpa_gate,
            combined_score,
            time_to_cpa_s: cpa.time,
            predicted_min_separation_m: predicted_min_separation,
            vertical_separation_at_cpa_m: vertical_at_cpa,
            closure_rate_mps: closure,
            separation_m: range,
            horizontal_separation_m: horizontal,
            vertical_separation_m: vertical,
            confidence,
            geometry: classify_geometry(own_now.velocity, intr_now.velocity, closure),
        })
    }
}

/// Encounter geometry from the two velocity vectors.
pub fn classify_geometry(own_velocity: Vec3, intruder_velocity: Vec3, closure: f64) -> Geometry {
    if closure <= 0.0 {
        return Geometry::Diverging;
    }
    let (Some(own), Some(intr)) = (own_velocity.heading(), intruder_velocity.heading()) else {
        return Geometry::Crossing;
    };
    let mut difference = (intr - own).abs() % (2.0 * PI);
    if difference > PI {
        difference = 2.0 * PI - difference;
    }
    if difference > 0.75 * PI {
        Geometry::HeadOn
    } else if difference < 0.25 * PI {
        Geometry::Overtaking
    } else {
        Geometry::Crossing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredictionConfig;
    use crate::interface::Kinematics;
    use crate::processing::predictor::TrajectoryPredictor;

    const KNOT: f64 = 0.514_444;
    const NM: f64 = 1852.0;

    fn trajectory(position: Vec3, velocity: Vec3, confidence: f64) -> PredictedTrajectory {
        let predictor = TrajectoryPredictor::new(PredictionConfig::default());
        predictor.predict_state(&Kinematics::new(0.0, position, velocity), confidence, 0.0)
    }

    fn assess(own: (Vec3, Vec3), intr: (Vec3, Vec3), confidence: f64) -> RiskAssessment {
        let assessor = RiskAssessor::new(RiskConfig::default());
        let ownship = trajectory(own.0, own.1, 1.0);
        let intruder = trajectory(intr.0, intr.1, confidence);
        assessor
            .assess(ObjectId::Icao(0x777777), &ownship, &intruder)
            .unwrap()
    }

    fn head_on(lateral_offset: f64, confidence: f64) -> RiskAssessment {
        let half = 450.0 * KNOT;
        assess(
            (Vec3::new(0.0, 0.0, 3000.0), Vec3::new(half, 0.0, 0.0)),
            (
                Vec3::new(5.0 * NM, lateral_offset, 3000.0),
                Vec3::new(-half, 0.0, 0.0),
            ),
            confidence,
        )
    }

    #[test]
    fn head_on_at_five_miles_is_critical() {
        let risk = head_on(0.0, 0.99);
        assert!((risk.time_to_cpa_s - 20.0).abs() < 0.5);
        assert!(risk.predicted_min_separation_m < 1.0);
        assert!((risk.closure_rate_mps - 900.0 * KNOT).abs() < 1e-6);
        assert_eq!(risk.geometry, Geometry::HeadOn);
        let thresholds = crate::config::AlertConfig::default().thresholds;
        assert!(risk.combined_score >= thresholds.critical, "{}", risk.combined_score);
    }

    #[test]
    fn score_is_non_decreasing_as_miss_distance_shrinks() {
        let mut previous = -1.0;
        for offset in [6000.0, 4000.0, 2500.0, 1000.0, 0.0] {
            let risk = head_on(offset, 1.0);
            assert!((0.0..=1.0).contains(&risk.combined_score));
            assert!(risk.combined_score >= previous);
            previous = risk.combined_score;
        }
    }

    #[test]
    fn lower_confidence_only_reduces_the_score() {
        let confident = head_on(0.0, 1.0);
        let doubtful = head_on(0.0, 0.4);
        assert!(doubtful.combined_score < confident.combined_score);
        assert_eq!(doubtful.speed_risk, confident.speed_risk);
    }

    #[test]
    fn diverging_intruder_trends_toward_zero() {
        let own = (Vec3::new(0.0, 0.0, 3000.0), Vec3::new(-100.0, 0.0, 0.0));
        let mut previous = f64::INFINITY;
        for opening in [50.0, 150.0, 300.0, 500.0] {
            let risk = assess(
                own,
                (Vec3::new(1000.0, 0.0, 3000.0), Vec3::new(opening - 100.0, 0.0, 0.0)),
                1.0,
            );
            assert_eq!(risk.geometry, Geometry::Diverging);
            assert_eq!(risk.speed_risk, 0.0);
            assert_eq!(risk.time_to_cpa_s, 0.0);
            assert!(risk.combined_score < previous);
            previous = risk.combined_score;
        }
        assert!(previous < crate::config::AlertConfig::default().thresholds.low);
    }

    #[test]
    fn zero_relative_velocity_is_risk_neutral_for_speed() {
        let v = Vec3::new(200.0, 0.0, 0.0);
        let risk = assess(
            (Vec3::new(0.0, 0.0, 3000.0), v),
            (Vec3::new(0.0, 3000.0, 3000.0), v),
            1.0,
        );
        assert_eq!(risk.closure_rate_mps, 0.0);
        assert_eq!(risk.speed_risk, 0.0);
        assert!(risk.combined_score.is_finite());
    }

    #[test]
    fn closest_approach_refines_between_samples() {
        // Meet at t = 10.5 s, which falls between the one-second samples.
        let own = trajectory(Vec3::new(0.0, 0.0, 3000.0), Vec3::new(100.0, 0.0, 0.0), 1.0);
        let intr = trajectory(
            Vec3::new(2100.0, 0.0, 3000.0),
            Vec3::new(-100.0, 0.0, 0.0),
            1.0,
        );
        let cpa = RiskAssessor::closest_approach(&own, &intr).unwrap();
        assert!((cpa.time - 10.5).abs() < 1e-9);
        assert!(cpa.relative.norm() < 1e-6);
    }

    #[test]
    fn vertical_separation_lowers_altitude_risk() {
        let half = 450.0 * KNOT;
        let level = head_on(0.0, 1.0);
        let separated = assess(
            (Vec3::new(0.0, 0.0, 3000.0), Vec3::new(half, 0.0, 0.0)),
            (Vec3::new(5.0 * NM, 0.0, 3600.0), Vec3::new(-half, 0.0, 0.0)),
            1.0,
        );
        assert_eq!(level.altitude_risk, 1.0);
        assert_eq!(separated.altitude_risk, 0.0);
        assert!(separated.combined_score < level.combined_score);
    }

    #[test]
    fn co_altitude_proximity_rises_as_range_shrinks() {
        let still = Vec3::new(0.0, 0.0, 0.0);
        let at = |range: f64| {
            assess(
                (Vec3::new(0.0, 0.0, 3000.0), still),
                (Vec3::new(range, 0.0, 3000.0), still),
                1.0,
            )
            .proximity_risk
        };
        let (near, mid, far) = (at(1000.0), at(20_000.0), at(90_000.0));
        assert_eq!(near, 1.0);
        assert!(mid > 0.0 && mid < near, "{}", mid);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn proximity_needs_both_axes_inside_the_minima() {
        let assessor = RiskAssessor::new(RiskConfig::default());
        assert_eq!(assessor.proximity(500.0, 100.0), 1.0);
        let stacked = assessor.proximity(0.0, 600.0);
        assert!(stacked < 1.0 && stacked > 0.0);
        assert!(assessor.proximity(0.0, 1200.0) < stacked);
        assert!(assessor.proximity(10_000.0, 600.0) < stacked);
    }

    #[test]
    fn geometry_classification_uses_relative_headings() {
        let east = Vec3::new(100.0, 0.0, 0.0);
        assert_eq!(classify_geometry(east, Vec3::new(-100.0, 0.0, 0.0), 1.0), Geometry::HeadOn);
        assert_eq!(classify_geometry(east, Vec3::new(150.0, 10.0, 0.0), 1.0), Geometry::Overtaking);
        assert_eq!(classify_geometry(east, Vec3::new(0.0, 100.0, 0.0), 1.0), Geometry::Crossing);
        assert_eq!(classify_geometry(east, east, -1.0), Geometry::Diverging);
    }
}
