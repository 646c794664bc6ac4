//! Optimal one-to-one assignment of detections to predicted track boxes.
//!
//! Cost is 1 - IoU; the square padded matrix is solved exactly with the
//! Hungarian algorithm (Jonker-style potentials, O(n^3)). Pairs whose IoU
//! falls below the acceptance threshold are demoted to unmatched on both
//! sides after solving.

use crate::shared::bbox::BoundingBox;

/// Outcome of matching one frame's blobs against live tracks. Index pairs
/// refer into the input slices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_blobs: Vec<usize>,
}

pub fn match_blobs_to_tracks(
    track_boxes: &[BoundingBox],
    blob_boxes: &[BoundingBox],
    iou_thresh: f64,
) -> MatchResult {
    if track_boxes.is_empty() || blob_boxes.is_empty() {
        return MatchResult {
            matches: Vec::new(),
            unmatched_tracks: (0..track_boxes.len()).collect(),
            unmatched_blobs: (0..blob_boxes.len()).collect(),
        };
    }

    let size = track_boxes.len().max(blob_boxes.len());
    let mut cost = vec![vec![1.0f64; size]; size];
    for (i, track) in track_boxes.iter().enumerate() {
        for (j, blob) in blob_boxes.iter().enumerate() {
            cost[i][j] = 1.0 - track.iou(blob);
        }
    }

    let assignment = solve_min_cost(&cost);

    let mut result = MatchResult::default();
    let mut matched_blobs = vec![false; blob_boxes.len()];
    for (track_idx, track) in track_boxes.iter().enumerate() {
        let blob_idx = assignment[track_idx];
        if blob_idx < blob_boxes.len() && track.iou(&blob_boxes[blob_idx]) >= iou_thresh {
            result.matches.push((track_idx, blob_idx));
            matched_blobs[blob_idx] = true;
        } else {
            result.unmatched_tracks.push(track_idx);
        }
    }
    result.unmatched_blobs = matched_blobs
        .iter()
        .enumerate()
        .filter(|(_, matched)| !**matched)
        .map(|(j, _)| j)
        .collect();
    result
}

/// Hungarian algorithm over a square cost matrix; returns the column chosen
/// for each row. Deterministic: among equal-cost solutions the scan order
/// (ascending row, ascending column) decides.
fn solve_min_cost(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut row_for_col = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        row_for_col[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = row_for_col[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[row_for_col[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if row_for_col[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            row_for_col[j0] = row_for_col[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=n {
        if row_for_col[j] > 0 {
            assignment[row_for_col[j] - 1] = j - 1;
        }
    }
    assignment
}
