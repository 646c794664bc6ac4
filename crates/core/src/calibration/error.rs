use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("video has {available} frames, calibration needs at least {required}")]
    InsufficientFrames { available: usize, required: usize },

    #[error("no blobs detected in any calibration frame; cannot derive a threshold")]
    NoBlobsDetected,

    #[error("every candidate region had a flat histogram; cannot derive a threshold")]
    DegenerateThreshold,

    #[error("calibration frame rejected by review")]
    ReviewRejected,
}
