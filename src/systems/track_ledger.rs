use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;

use crate::detections::TrackId;

use super::alert_latch::AlertLatch;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ZoneState {
    Inside,
    Outside,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub zone_time: Duration,
    pub outside_time: Duration,
    pub current_zone: ZoneState,
    pub last_update: SystemTime,
    pub alert: AlertLatch,
}

impl Track {
    pub fn new(id: TrackId, first_seen: SystemTime) -> Self {
        Track {
            id,
            zone_time: Duration::ZERO,
            outside_time: Duration::ZERO,
            current_zone: ZoneState::Outside,
            last_update: first_seen,
            alert: AlertLatch::one_shot(),
        }
    }

    pub fn total_time(&self) -> Duration {
        self.zone_time + self.outside_time
    }

    pub fn alerted(&self) -> bool {
        self.alert.is_fired()
    }
}

/// Every identity seen during the session, in order of first sighting.
#[derive(Debug, Default)]
pub struct TrackLedger {
    tracks: IndexMap<TrackId, Track>,
}

impl TrackLedger {
    pub fn new() -> Self {
        TrackLedger::default()
    }

    /// Fetch the entry for `id`, creating it (with `last_update = now`)
    /// on first sighting.
    pub fn observe(&mut self, id: TrackId, now: SystemTime) -> &mut Track {
        self.tracks.entry(id).or_insert_with(|| {
            debug!("New track {} first seen", id);
            Track::new(id, now)
        })
    }

    /// Drop tracks whose last update is more than `window` before `now`;
    /// returns how many were removed.
    pub fn evict_unseen(&mut self, now: SystemTime, window: Duration) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|_id, track| match now.duration_since(track.last_update) {
            Ok(unseen) => unseen <= window,
            Err(_) => true,
        });
        let evicted = before - self.tracks.len();
        if evicted > 0 {
            info!(
                "Evicted {} track(s) unseen for longer than {:?}",
                evicted, window
            );
        }
        evicted
    }

    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}
