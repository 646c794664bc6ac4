//! One-time per-video calibration: frame sampling, background estimation,
//! and binarization threshold selection.

pub mod background;
pub mod error;
pub mod review;
pub mod threshold;

use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::calibration::error::CalibrationError;

/// Draws disjoint frame index sets for background estimation and threshold
/// calibration, both sorted ascending. Deterministic for a given seed.
///
/// A video shorter than the two requested sample sizes combined falls back
/// to using every frame, split between the two sets in proportion to the
/// request; only an empty video is an error.
pub fn sample_calibration_indices(
    total_frames: usize,
    background_count: usize,
    threshold_count: usize,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), CalibrationError> {
    let requested = background_count + threshold_count;
    if total_frames == 0 || requested == 0 {
        return Err(CalibrationError::InsufficientFrames {
            available: total_frames,
            required: requested.max(1),
        });
    }

    let (background_share, threshold_share) = if total_frames >= requested {
        (background_count, threshold_count)
    } else {
        warn!(
            "video has {total_frames} frames, fewer than the {requested} requested \
             calibration samples; using every frame"
        );
        // Proportional split; threshold keeps at least one frame whenever it
        // was asked for and one can be spared.
        let threshold_share = if threshold_count == 0 || total_frames < 2 {
            0
        } else {
            (total_frames * threshold_count / requested).max(1)
        };
        (total_frames - threshold_share, threshold_share)
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let picked =
        rand::seq::index::sample(&mut rng, total_frames, background_share + threshold_share)
            .into_vec();

    let mut background: Vec<usize> = picked[..background_share].to_vec();
    let mut threshold: Vec<usize> = picked[background_share..].to_vec();
    background.sort_unstable();
    threshold.sort_unstable();
    Ok((background, threshold))
}
