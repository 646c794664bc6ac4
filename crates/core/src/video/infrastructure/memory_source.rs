use crate::shared::frame::GrayFrame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// A [`FrameSource`] over frames already held in memory.
///
/// Used when frames are produced by an upstream stage in-process, and by
/// tests that build synthetic videos.
pub struct MemorySource {
    frames: Vec<GrayFrame>,
    metadata: VideoMetadata,
}

impl MemorySource {
    /// Panics if frames disagree on dimensions; an in-memory video is a
    /// programming artifact, not untrusted input.
    pub fn new(frames: Vec<GrayFrame>, fps: f64) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        assert!(
            frames
                .iter()
                .all(|f| f.width() == width && f.height() == height),
            "all frames must share dimensions"
        );
        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: frames.len(),
            source_path: None,
        };
        Self { frames, metadata }
    }
}

impl FrameSource for MemorySource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self, index: usize) -> Result<GrayFrame, Box<dyn std::error::Error>> {
        self.frames
            .get(index)
            .cloned()
            .ok_or_else(|| format!("frame index {index} out of range").into())
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<GrayFrame, Box<dyn std::error::Error>>> + '_> {
        Box::new(self.frames.iter().cloned().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(value: u8, index: usize) -> GrayFrame {
        GrayFrame::new(vec![value; 16], 4, 4, index)
    }

    #[test]
    fn test_metadata_from_frames() {
        let source = MemorySource::new(vec![frame(1, 0), frame(2, 1)], 25.0);
        assert_eq!(source.metadata().width, 4);
        assert_eq!(source.metadata().total_frames, 2);
        assert_eq!(source.metadata().fps, 25.0);
    }

    #[test]
    fn test_empty_source() {
        let source = MemorySource::new(Vec::new(), 0.0);
        assert_eq!(source.metadata().total_frames, 0);
    }

    #[test]
    fn test_sequential_and_random_access_agree() {
        let mut source = MemorySource::new(vec![frame(5, 0), frame(9, 1)], 0.0);
        let sequential: Vec<u8> = source.frames().map(|f| f.unwrap().data()[0]).collect();
        assert_eq!(sequential, vec![5, 9]);
        assert_eq!(source.read_frame(1).unwrap().data()[0], 9);
        assert!(source.read_frame(2).is_err());
    }

    #[test]
    #[should_panic(expected = "all frames must share dimensions")]
    fn test_mixed_dimensions_panic() {
        let odd = GrayFrame::new(vec![0; 8], 4, 2, 1);
        MemorySource::new(vec![frame(0, 0), odd], 0.0);
    }
}
