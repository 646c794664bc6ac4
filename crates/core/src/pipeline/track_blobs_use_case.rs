//! End-to-end run over one video: calibrate once, then track every frame in
//! order and stream records to the writer.
//!
//! Frame decoding runs on a prefetch thread ahead of the tracking loop; the
//! tracking stage itself is strictly sequential because each frame's
//! prediction depends on the previous frame's corrected state.

use log::info;
use thiserror::Error;

use crate::calibration::background::{estimate_background, BackgroundModel};
use crate::calibration::error::CalibrationError;
use crate::calibration::review::FrameReview;
use crate::calibration::sample_calibration_indices;
use crate::calibration::threshold::calibrate_threshold;
use crate::detection::blob_detector::BlobDetector;
use crate::detection::preprocess::foreground_mask;
use crate::pipeline::record::{RecordWriter, TrackRecord};
use crate::shared::config::RunConfig;
use crate::shared::constants::PREFETCH_CAPACITY;
use crate::shared::frame::GrayFrame;
use crate::tracking::tracker::BlobTracker;
use crate::video::domain::frame_source::FrameSource;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("frame source failed: {0}")]
    Source(String),

    #[error("output failed: {0}")]
    Output(String),
}

/// What a completed run did.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub frames_processed: usize,
    pub records_written: usize,
    pub threshold: u8,
}

pub struct TrackBlobsUseCase {
    config: RunConfig,
}

impl TrackBlobsUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Runs calibration and the tracking loop over the whole source.
    ///
    /// `on_progress` is called after every tracked frame with the number of
    /// frames done and the total.
    pub fn execute(
        &self,
        source: &mut dyn FrameSource,
        writer: Box<dyn RecordWriter>,
        reviewer: &mut dyn FrameReview,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<RunSummary, PipelineError> {
        let total_frames = source.metadata().total_frames;
        let fps = self.config.framerate.or_else(|| {
            let fps = source.metadata().fps;
            (fps > 0.0).then_some(fps)
        });

        let (background, threshold) = self.calibrate(source, reviewer)?;
        info!("calibrated threshold {threshold} over {total_frames} frames");

        self.track(source, writer, &background, threshold, fps, on_progress)
    }

    fn calibrate(
        &self,
        source: &mut dyn FrameSource,
        reviewer: &mut dyn FrameReview,
    ) -> Result<(BackgroundModel, u8), PipelineError> {
        let total_frames = source.metadata().total_frames;
        let threshold_count = if self.config.threshold.is_some() {
            0
        } else {
            self.config.threshold_samples
        };
        let (background_indices, threshold_indices) = sample_calibration_indices(
            total_frames,
            self.config.background_samples,
            threshold_count,
            self.config.seed,
        )?;

        let background_frames = self.read_frames(source, &background_indices)?;
        let background = estimate_background(&background_frames)?;

        let threshold = match self.config.threshold {
            Some(fixed) => fixed,
            None => {
                let threshold_frames = self.read_frames(source, &threshold_indices)?;
                let detector = BlobDetector::new(self.config.detector.clone());
                calibrate_threshold(&threshold_frames, &background, &detector, reviewer)?
            }
        };

        Ok((background, threshold))
    }

    fn read_frames(
        &self,
        source: &mut dyn FrameSource,
        indices: &[usize],
    ) -> Result<Vec<GrayFrame>, PipelineError> {
        indices
            .iter()
            .map(|&i| {
                source
                    .read_frame(i)
                    .map_err(|e| PipelineError::Source(e.to_string()))
            })
            .collect()
    }

    fn track(
        &self,
        source: &mut dyn FrameSource,
        mut writer: Box<dyn RecordWriter>,
        background: &BackgroundModel,
        threshold: u8,
        fps: Option<f64>,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<RunSummary, PipelineError> {
        let total_frames = source.metadata().total_frames;
        let detector = BlobDetector::new(self.config.detector.clone());
        let mut tracker = BlobTracker::new(self.config.tracker.clone());
        let mut records_written = 0usize;
        let mut frames_processed = 0usize;

        std::thread::scope(|scope| -> Result<(), PipelineError> {
            let (tx, rx) = crossbeam_channel::bounded::<Result<GrayFrame, String>>(
                PREFETCH_CAPACITY,
            );

            scope.spawn(move || {
                for frame in source.frames() {
                    let item = frame.map_err(|e| e.to_string());
                    if tx.send(item).is_err() {
                        // Receiver gave up; stop decoding.
                        break;
                    }
                }
            });

            for item in rx {
                let frame = item.map_err(PipelineError::Source)?;
                let mask = foreground_mask(&frame, background, threshold);
                let blobs = detector.detect(&mask);
                let tracked = tracker.process(&blobs);

                for t in &tracked {
                    let record = TrackRecord {
                        frame_index: frame.index(),
                        track_id: t.track_id,
                        x: t.bbox.x,
                        y: t.bbox.y,
                        width: t.bbox.width,
                        height: t.bbox.height,
                        timestamp: fps.map(|f| frame.index() as f64 / f),
                    };
                    writer
                        .write(&record)
                        .map_err(|e| PipelineError::Output(e.to_string()))?;
                    records_written += 1;
                }

                frames_processed += 1;
                on_progress(frames_processed, total_frames);
            }
            Ok(())
        })?;

        writer
            .finish()
            .map_err(|e| PipelineError::Output(e.to_string()))?;

        info!("wrote {records_written} records over {frames_processed} frames");
        Ok(RunSummary {
            frames_processed,
            records_written,
            threshold,
        })
    }
}
