use crate::config::TrackingConfig;
use crate::interface::ObjectId;
use crate::telemetry::LogManager;
use crate::tracking::track::{FusedObservation, Track};
use std::collections::{BTreeMap, BTreeSet};

/// Exclusive owner of every intruder track and its history.
///
/// Mutated only during the fusion/update phase of a cycle; every later phase
/// borrows it immutably.
pub struct TrackStore {
    config: TrackingConfig,
    tracks: BTreeMap<ObjectId, Track>,
    updated: BTreeSet<ObjectId>,
    next_local: u32,
    logger: LogManager,
}

impl TrackStore {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            tracks: BTreeMap::new(),
            updated: BTreeSet::new(),
            next_local: 1,
            logger: LogManager::new("tracks"),
        }
    }

    pub fn update(&mut self, id: ObjectId, mut observation: FusedObservation) {
        observation.object_id = id;
        if let ObjectId::Local(n) = id {
            self.next_local = self.next_local.max(n.saturating_add(1));
        }
        match self.tracks.get_mut(&id) {
            Some(track) => {
                if !track.record(observation) {
                    self.logger
                        .detail(&format!("{} observation did not advance history", id));
                }
            }
            None => {
                self.logger.detail(&format!("initiating track {}", id));
                self.tracks
                    .insert(id, Track::new(id, observation, self.config.history_capacity));
            }
        }
        self.updated.insert(id);
    }

    /// Ends the update phase: tracks without an observation this cycle grow
    /// stale, and those past the threshold are evicted and returned.
    pub fn age(&mut self) -> Vec<ObjectId> {
        let mut evicted = Vec::new();
        for (id, track) in self.tracks.iter_mut() {
            if self.updated.contains(id) {
                continue;
            }
            if track.mark_missed() > self.config.max_staleness {
                evicted.push(*id);
            }
        }
        for id in &evicted {
            self.tracks.remove(id);
            self.logger.record(&format!("evicted stale track {}", id));
        }
        self.updated.clear();
        evicted
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// Active tracks in id order; clone the iterator to walk it again.
    pub fn all_active(&self) -> impl Iterator<Item = &Track> + Clone + '_ {
        self.tracks.values()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.tracks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// First local number not yet used by any track.
    pub fn next_local_id(&self) -> u32 {
        self.next_local
    }
}
