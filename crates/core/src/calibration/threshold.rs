//! Automatic binarization threshold calibration.
//!
//! Sweeps coarse binarization levels over a handful of sample frames to find
//! candidate foreground regions, then runs Otsu's method on each candidate's
//! local neighborhood in the inverted difference image. The final threshold
//! is the mean of the per-candidate Otsu values.

use log::debug;
use ndarray::{s, ArrayView2};

use crate::calibration::background::BackgroundModel;
use crate::calibration::error::CalibrationError;
use crate::calibration::review::{FrameReview, ReviewDecision};
use crate::detection::blob::Blob;
use crate::detection::blob_detector::BlobDetector;
use crate::detection::preprocess::{binarize, inverted_difference, median_denoise};
use crate::shared::bbox::BoundingBox;
use crate::shared::constants::{SWEEP_DEDUP_IOU, SWEEP_THRESHOLD_STEP};
use crate::shared::frame::GrayFrame;

/// Candidate neighborhoods are inflated this much about their center before
/// the local histogram is taken, so both foreground and surround contribute.
const CANDIDATE_INFLATION: f64 = 2.0;

/// Derives a binarization threshold from the sampled frames.
///
/// The reviewer is consulted once per frame with the candidate regions found
/// on it; a rejection cancels the whole calibration. Fails with
/// [`CalibrationError::NoBlobsDetected`] when no sweep level finds any
/// region, and with [`CalibrationError::DegenerateThreshold`] when every
/// candidate's neighborhood is flat (a histogram with a single populated bin
/// admits no split).
pub fn calibrate_threshold(
    frames: &[GrayFrame],
    background: &BackgroundModel,
    detector: &BlobDetector,
    reviewer: &mut dyn FrameReview,
) -> Result<u8, CalibrationError> {
    let mut otsu_values: Vec<f64> = Vec::new();
    let mut candidate_count = 0usize;

    for frame in frames {
        let diff = inverted_difference(frame, background);
        let candidates = sweep_candidates(&diff, frame.width(), frame.height(), detector);
        debug!(
            "frame {}: {} candidate regions",
            frame.index(),
            candidates.len()
        );
        if reviewer.review(frame, &candidates) == ReviewDecision::Reject {
            return Err(CalibrationError::ReviewRejected);
        }
        candidate_count += candidates.len();

        for blob in &candidates {
            let histogram = region_histogram(&diff, frame.width(), frame.height(), &blob.bbox);
            if let Some(value) = otsu_threshold(&histogram) {
                otsu_values.push(value as f64);
            }
        }
    }

    if candidate_count == 0 {
        return Err(CalibrationError::NoBlobsDetected);
    }
    if otsu_values.is_empty() {
        return Err(CalibrationError::DegenerateThreshold);
    }

    let mean = otsu_values.iter().sum::<f64>() / otsu_values.len() as f64;
    let threshold = mean.round().clamp(1.0, 255.0) as u8;
    debug!(
        "calibrated threshold {threshold} from {} candidate regions",
        otsu_values.len()
    );
    Ok(threshold)
}

/// Binarizes the difference image at every coarse level and collects the
/// distinct regions found across levels. Regions from different levels that
/// overlap above [`SWEEP_DEDUP_IOU`] are the same physical blob; the
/// first-seen box wins.
fn sweep_candidates(diff: &[u8], width: u32, height: u32, detector: &BlobDetector) -> Vec<Blob> {
    let mut candidates: Vec<Blob> = Vec::new();
    let step = SWEEP_THRESHOLD_STEP as u16;

    for level in (step..=255).step_by(step as usize) {
        let mask = median_denoise(&binarize(diff, width, height, level as u8));
        for blob in detector.detect(&mask) {
            let duplicate = candidates
                .iter()
                .any(|seen| seen.bbox.iou(&blob.bbox) >= SWEEP_DEDUP_IOU);
            if !duplicate {
                candidates.push(blob);
            }
        }
    }

    candidates
}

/// Intensity histogram over the candidate's inflated neighborhood, clamped
/// to the frame.
fn region_histogram(diff: &[u8], width: u32, height: u32, bbox: &BoundingBox) -> [u64; 256] {
    let (cx, cy) = bbox.center();
    let half_w = bbox.width * CANDIDATE_INFLATION / 2.0;
    let half_h = bbox.height * CANDIDATE_INFLATION / 2.0;
    let x0 = (cx - half_w).floor().max(0.0) as usize;
    let y0 = (cy - half_h).floor().max(0.0) as usize;
    let x1 = ((cx + half_w).ceil() as usize).min(width as usize);
    let y1 = ((cy + half_h).ceil() as usize).min(height as usize);

    let view = ArrayView2::from_shape((height as usize, width as usize), diff)
        .expect("difference image length must match dimensions");
    let mut histogram = [0u64; 256];
    for &value in view.slice(s![y0..y1, x0..x1]) {
        histogram[value as usize] += 1;
    }
    histogram
}

/// Otsu's method over a 256-bin histogram.
///
/// A threshold `t` splits the histogram into `[0, t)` and `[t, 255]`,
/// matching the strict `v < t` foreground test used at binarization. Returns
/// `None` when fewer than two bins are populated.
pub fn otsu_threshold(histogram: &[u64; 256]) -> Option<u8> {
    let total: u64 = histogram.iter().sum();
    let populated = histogram.iter().filter(|&&count| count > 0).count();
    if total == 0 || populated < 2 {
        return None;
    }

    let total_f = total as f64;
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut best_threshold = 0u8;
    let mut best_variance = -1.0;
    let mut weight0 = 0.0;
    let mut sum0 = 0.0;
    for t in 1..=255usize {
        let bin = t - 1;
        weight0 += histogram[bin] as f64;
        sum0 += bin as f64 * histogram[bin] as f64;
        let weight1 = total_f - weight0;
        if weight0 == 0.0 || weight1 == 0.0 {
            continue;
        }
        let mean0 = sum0 / weight0;
        let mean1 = (weighted_total - sum0) / weight1;
        let variance = weight0 * weight1 * (mean0 - mean1).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    Some(best_threshold)
}
