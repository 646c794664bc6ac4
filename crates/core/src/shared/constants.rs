/// Frames sampled for the background median (about one second of footage).
pub const DEFAULT_BACKGROUND_SAMPLES: usize = 30;

/// Frames sampled for threshold calibration, disjoint from the background
/// sample.
pub const DEFAULT_THRESHOLD_SAMPLES: usize = 10;

/// Frames a track may go unmatched before it is retired.
pub const DEFAULT_MAX_AGE: u32 = 5;

/// Consecutive matches required before a track is reported.
pub const DEFAULT_MIN_HITS: u32 = 3;

/// Minimum IoU for a predicted box to accept a detection.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.3;

/// Step between binarization levels in the calibration threshold sweep.
pub const SWEEP_THRESHOLD_STEP: u8 = 16;

/// Candidate boxes overlapping at least this much across sweep levels are
/// treated as the same blob.
pub const SWEEP_DEDUP_IOU: f64 = 0.5;

/// Frames buffered ahead of the tracking loop by the prefetching reader.
pub const PREFETCH_CAPACITY: usize = 8;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif"];
