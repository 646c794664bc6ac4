//! Hook for confirming sampled calibration frames before a run commits to
//! them.

use crate::detection::blob::Blob;
use crate::shared::frame::GrayFrame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewDecision {
    Accept,
    Reject,
}

/// Callback invoked once per threshold-calibration frame, with the candidate
/// regions found on it. A `Reject` cancels calibration before any output is
/// produced; implementations may block on external input.
pub trait FrameReview {
    fn review(&mut self, frame: &GrayFrame, candidates: &[Blob]) -> ReviewDecision;
}

/// Default reviewer for unattended runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl FrameReview for AcceptAll {
    fn review(&mut self, _: &GrayFrame, _: &[Blob]) -> ReviewDecision {
        ReviewDecision::Accept
    }
}
