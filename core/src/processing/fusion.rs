use crate::config::{FusionConfig, TieBreakPolicy};
use crate::interface::{Classification, Kinematics, ObjectId, SensorKind, SensorReport};
use crate::math::{StatsHelper, Vec3};
use crate::prelude::{clamp_unit, EngineError, EngineResult};
use crate::telemetry::log::LogManager;
use crate::tracking::{FusedObservation, TrackStore};
use std::collections::BTreeMap;

/// Result of one fusion pass.
#[derive(Debug, Default)]
pub struct FusionOutput {
    pub observations: Vec<FusedObservation>,
    pub dropped: usize,
}

/// Reports resolved to one object during the current cycle.
struct Group<'a> {
    id: ObjectId,
    anchor: Kinematics,
    reports: Vec<&'a SensorReport>,
}

/// Merges per-sensor reports into at most one observation per object.
///
/// Pure with respect to the track store: it reads tracks for gating but never
/// mutates them.
pub struct SensorFusion {
    config: FusionConfig,
    logger: LogManager,
}

impl SensorFusion {
    pub fn new(config: FusionConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("fusion"),
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Plausibility checks shared by sensor reports and the ownship state.
    pub fn validate_kinematics(&self, kinematics: &Kinematics, cycle_time: f64) -> EngineResult<()> {
        if !kinematics.is_finite() {
            return Err(EngineError::InvalidReport("non-finite kinematics".into()));
        }
        if kinematics.position.z < self.config.terrain_floor_m {
            return Err(EngineError::InvalidReport(format!(
                "altitude {:.1} m below terrain floor {:.1} m",
                kinematics.position.z, self.config.terrain_floor_m
            )));
        }
        let speed = kinematics.velocity.norm();
        if speed > self.config.max_plausible_speed_mps {
            return Err(EngineError::InvalidReport(format!(
                "implausible speed {:.1} m/s",
                speed
            )));
        }
        if (kinematics.timestamp - cycle_time).abs() > self.config.max_report_age_s {
            return Err(EngineError::InvalidReport(format!(
                "timestamp {:.3} outside cycle window at {:.3}",
                kinematics.timestamp, cycle_time
            )));
        }
        Ok(())
    }

    pub fn fuse(&self, reports: &[SensorReport], store: &TrackStore, cycle_time: f64) -> FusionOutput {
        let mut dropped = 0;
        let mut valid: Vec<&SensorReport> = Vec::with_capacity(reports.len());
        for report in reports {
            match self.validate_kinematics(report.kinematics(), cycle_time) {
                Ok(()) => valid.push(report),
                Err(err) => {
                    dropped += 1;
                    self.logger
                        .warn(&format!("dropping {:?} report: {}", report.kind(), err));
                }
            }
        }
        // Firm identities first so soft reports can gate against them.
        valid.sort_by_key(|report| report.kind());

        let mut groups: Vec<Group> = Vec::new();
        let mut next_local = store.next_local_id();
        for report in valid {
            let id = match report.firm_id() {
                Some(id) => id,
                None => match self.associate(report, store, &groups) {
                    Some(id) => id,
                    None if self.config.initiate_untracked => {
                        let id = ObjectId::Local(next_local);
                        next_local = next_local.saturating_add(1);
                        id
                    }
                    None => {
                        dropped += 1;
                        self.logger.detail(&format!(
                            "no track within gate for {:?} report",
                            report.kind()
                        ));
                        continue;
                    }
                },
            };
            match groups.iter_mut().find(|group| group.id == id) {
                Some(group) => group.reports.push(report),
                None => groups.push(Group {
                    id,
                    anchor: *report.kinematics(),
                    reports: vec![report],
                }),
            }
        }

        let observations = groups
            .iter()
            .filter_map(|group| self.fuse_group(group))
            .collect();

        FusionOutput {
            observations,
            dropped,
        }
    }

    /// Resolves a report without a firm identity to a known object.
    fn associate(&self, report: &SensorReport, store: &TrackStore, groups: &[Group]) -> Option<ObjectId> {
        let kinematics = report.kinematics();
        let distance_to = |id: &ObjectId| -> Option<f64> {
            let from_track = store.get(id).map(|track| {
                let predicted = track.latest().kinematics().propagated_to(kinematics.timestamp);
                (predicted.position - kinematics.position).norm()
            });
            let from_group = groups.iter().find(|g| g.id == *id).map(|group| {
                let predicted = group.anchor.propagated_to(kinematics.timestamp);
                (predicted.position - kinematics.position).norm()
            });
            match (from_track, from_group) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            }
        };

        if let Some(hint) = report.hint() {
            if let Some(distance) = distance_to(&hint) {
                if distance <= self.config.gate_distance_m {
                    return Some(hint);
                }
            }
        }

        let mut candidates: BTreeMap<ObjectId, f64> = BTreeMap::new();
        let ids = store
            .all_active()
            .map(|track| track.id())
            .chain(groups.iter().map(|group| group.id));
        for id in ids {
            if candidates.contains_key(&id) {
                continue;
            }
            if let Some(distance) = distance_to(&id) {
                if distance <= self.config.gate_distance_m {
                    candidates.insert(id, distance);
                }
            }
        }

        let nearest = candidates.values().copied().fold(f64::INFINITY, f64::min);
        let tied: Vec<ObjectId> = candidates
            .iter()
            .filter(|(_, distance)| **distance <= nearest + self.config.tie_epsilon_m)
            .map(|(id, _)| *id)
            .collect();

        match tied.len() {
            0 => None,
            1 => tied.first().copied(),
            _ => {
                self.logger.detail(&format!(
                    "{} equidistant candidates, applying {:?}",
                    tied.len(),
                    self.config.tie_break
                ));
                self.break_tie(&tied, store)
            }
        }
    }

    fn break_tie(&self, tied: &[ObjectId], store: &TrackStore) -> Option<ObjectId> {
        // `tied` is in id order, so `min_by` keeps the lowest id on equal keys.
        match self.config.tie_break {
            TieBreakPolicy::LowestStaleness => tied
                .iter()
                .copied()
                .min_by_key(|id| store.get(id).map_or(0, |track| track.staleness())),
            TieBreakPolicy::HighestConfidence => tied.iter().copied().min_by(|a, b| {
                let confidence =
                    |id: &ObjectId| store.get(id).map_or(0.0, |t| t.latest().fusion_confidence);
                confidence(b).total_cmp(&confidence(a))
            }),
            TieBreakPolicy::LowestId => tied.first().copied(),
        }
    }

    fn reliability(&self, report: &SensorReport) -> f64 {
        let base = self.config.reliability.get(report.kind());
        let factor = match report {
            SensorReport::Visual {
                classification: Some(classification),
                ..
            } => clamp_unit(classification.confidence),
            SensorReport::Visual { .. } => self.config.unclassified_visual_penalty,
            _ => 1.0,
        };
        clamp_unit(base * factor)
    }

    fn fuse_group(&self, group: &Group) -> Option<FusedObservation> {
        let timestamp = group
            .reports
            .iter()
            .map(|report| report.kinematics().timestamp)
            .fold(f64::NEG_INFINITY, f64::max);
        let aligned: Vec<(Kinematics, f64, &SensorReport)> = group
            .reports
            .iter()
            .map(|report| {
                (
                    report.kinematics().propagated_to(timestamp),
                    self.config.weights.get(report.kind()),
                    *report,
                )
            })
            .collect();

        let weighted = |select: fn(&Kinematics) -> Vec3| -> Option<Vec3> {
            let samples: Vec<(Vec3, f64)> = aligned.iter().map(|(k, w, _)| (select(k), *w)).collect();
            StatsHelper::weighted_average(&samples).or_else(|| {
                let equal: Vec<(Vec3, f64)> = samples.iter().map(|(v, _)| (*v, 1.0)).collect();
                StatsHelper::weighted_average(&equal)
            })
        };
        let position = weighted(|k| k.position)?;
        let velocity = weighted(|k| k.velocity)?;

        let miss_product: f64 = aligned
            .iter()
            .map(|(kinematics, _, report)| {
                let deviation = (kinematics.position - position).norm();
                let agreement = clamp_unit(1.0 - deviation / self.config.agreement_tolerance_m);
                1.0 - self.reliability(report) * agreement
            })
            .product();
        let fusion_confidence = clamp_unit(1.0 - miss_product);

        let classification = group
            .reports
            .iter()
            .filter_map(|report| report.classification())
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|c| Classification {
                label: c.label.clone(),
                confidence: clamp_unit(c.confidence),
            });
        let callsign = group
            .reports
            .iter()
            .find_map(|report| report.callsign())
            .map(str::to_string);
        let sources: Vec<SensorKind> = group.reports.iter().map(|report| report.kind()).collect();

        Some(FusedObservation {
            object_id: group.id,
            timestamp,
            position,
            velocity,
            classification,
            fusion_confidence,
            sources,
            callsign,
        })
    }
}
