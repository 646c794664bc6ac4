use crate::shared::bbox::BoundingBox;
use crate::tracking::kalman::BoxMotionFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStatus {
    /// Seen, but not yet matched often enough to be reported.
    Tentative,
    /// Reported downstream. Never demoted back to Tentative.
    Confirmed,
    /// Terminal; the manager removes dead tracks at the end of each frame.
    Dead,
}

/// One tracked object. Owned exclusively by the tracker; identifiers are
/// unique for the life of a run.
pub struct Track {
    id: u64,
    filter: BoxMotionFilter,
    status: TrackStatus,
    hit_streak: u32,
    time_since_update: u32,
}

impl Track {
    /// The founding detection counts as the first hit.
    pub fn new(id: u64, bbox: &BoundingBox, min_hits: u32) -> Self {
        let status = if min_hits <= 1 {
            TrackStatus::Confirmed
        } else {
            TrackStatus::Tentative
        };
        Self {
            id,
            filter: BoxMotionFilter::new(bbox),
            status,
            hit_streak: 1,
            time_since_update: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    pub fn hit_streak(&self) -> u32 {
        self.hit_streak
    }

    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    pub fn current_box(&self) -> BoundingBox {
        self.filter.current_box()
    }

    /// Advances the motion state one frame.
    pub fn predict(&mut self) -> BoundingBox {
        self.filter.predict()
    }

    pub fn record_match(&mut self, bbox: &BoundingBox, min_hits: u32) {
        self.filter.update(bbox);
        self.hit_streak += 1;
        self.time_since_update = 0;
        if self.status == TrackStatus::Tentative && self.hit_streak >= min_hits {
            self.status = TrackStatus::Confirmed;
        }
    }

    /// A missed frame: the state stays at its prediction. Both Tentative and
    /// Confirmed tracks age out through the same counter.
    pub fn record_miss(&mut self, max_age: u32) {
        self.time_since_update += 1;
        self.hit_streak = 0;
        if self.time_since_update > max_age {
            self.status = TrackStatus::Dead;
        }
    }
}
