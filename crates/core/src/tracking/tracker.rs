//! Frame-by-frame track management.
//!
//! Drives the predict/match/update cycle and owns the live track set. Frames
//! must be fed strictly in order; the corrected state after frame N is the
//! prior for frame N+1.

use log::trace;

use crate::detection::blob::Blob;
use crate::shared::bbox::BoundingBox;
use crate::shared::config::TrackerConfig;
use crate::tracking::assignment::match_blobs_to_tracks;
use crate::tracking::track::{Track, TrackStatus};

/// One confirmed track's position for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedBox {
    pub track_id: u64,
    pub bbox: BoundingBox,
}

pub struct BlobTracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    next_id: u64,
}

impl BlobTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            next_id: 1,
        }
    }

    pub fn live_track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Consumes one frame's detections and returns the confirmed tracks
    /// matched in this frame, in ascending id order.
    pub fn process(&mut self, blobs: &[Blob]) -> Vec<TrackedBox> {
        let predicted: Vec<BoundingBox> = self.tracks.iter_mut().map(Track::predict).collect();
        let blob_boxes: Vec<BoundingBox> = blobs.iter().map(|b| b.bbox).collect();

        let result = match_blobs_to_tracks(&predicted, &blob_boxes, self.config.iou_thresh);
        trace!(
            "{} matches, {} unmatched tracks, {} new detections",
            result.matches.len(),
            result.unmatched_tracks.len(),
            result.unmatched_blobs.len()
        );

        for &(track_idx, blob_idx) in &result.matches {
            self.tracks[track_idx].record_match(&blob_boxes[blob_idx], self.config.min_hits);
        }
        for &track_idx in &result.unmatched_tracks {
            self.tracks[track_idx].record_miss(self.config.max_age);
        }
        for &blob_idx in &result.unmatched_blobs {
            let id = self.next_id;
            self.next_id += 1;
            self.tracks
                .push(Track::new(id, &blob_boxes[blob_idx], self.config.min_hits));
        }

        self.tracks.retain(|t| t.status() != TrackStatus::Dead);

        // Creation order means ascending id order.
        self.tracks
            .iter()
            .filter(|t| t.status() == TrackStatus::Confirmed && t.time_since_update() == 0)
            .map(|t| TrackedBox {
                track_id: t.id(),
                bbox: t.current_box(),
            })
            .collect()
    }
}
