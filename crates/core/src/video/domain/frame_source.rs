use crate::shared::frame::GrayFrame;
use crate::shared::video_metadata::VideoMetadata;

/// Provides grayscale frames of one video.
///
/// Calibration samples frames out of order via `read_frame`; the tracking
/// loop consumes `frames` strictly in index order. Implementations handle
/// I/O details while the pipeline works with `GrayFrame` and
/// `VideoMetadata`.
pub trait FrameSource: Send {
    fn metadata(&self) -> &VideoMetadata;

    /// Random access by frame index.
    fn read_frame(&mut self, index: usize) -> Result<GrayFrame, Box<dyn std::error::Error>>;

    /// Returns an iterator over all frames in index order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<GrayFrame, Box<dyn std::error::Error>>> + '_>;
}
