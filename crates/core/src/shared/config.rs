use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::shared::constants::{
    DEFAULT_BACKGROUND_SAMPLES, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_AGE, DEFAULT_MIN_HITS,
    DEFAULT_THRESHOLD_SAMPLES,
};

/// Shape filters for the blob detector.
///
/// Every bound is optional; `None` means no constraint on that side, so an
/// all-default config accepts every connected component.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub min_circularity: Option<f64>,
    pub max_circularity: Option<f64>,
    pub min_convexity: Option<f64>,
    pub max_convexity: Option<f64>,
    pub min_inertia_ratio: Option<f64>,
    pub max_inertia_ratio: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a track survives without a match before deletion.
    pub max_age: u32,
    /// Consecutive matches required before a track is emitted.
    pub min_hits: u32,
    /// Minimum IoU to accept a (track, blob) assignment.
    pub iou_thresh: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            min_hits: DEFAULT_MIN_HITS,
            iou_thresh: DEFAULT_IOU_THRESHOLD,
        }
    }
}

/// Full configuration for one tracking run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub detector: DetectorConfig,
    pub tracker: TrackerConfig,
    /// Informational only; used for timestamp annotation, never for tracking.
    pub framerate: Option<f64>,
    pub background_samples: usize,
    pub threshold_samples: usize,
    /// Fixed binarization threshold. When set, threshold calibration is
    /// skipped entirely (useful for footage with no foreground at
    /// calibration time).
    pub threshold: Option<u8>,
    /// Seed for calibration frame sampling; fixed seed gives reproducible
    /// runs.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            tracker: TrackerConfig::default(),
            framerate: None,
            background_samples: DEFAULT_BACKGROUND_SAMPLES,
            threshold_samples: DEFAULT_THRESHOLD_SAMPLES,
            threshold: None,
            seed: 0,
        }
    }
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detector_defaults_are_unconstrained() {
        let cfg = DetectorConfig::default();
        assert!(cfg.min_area.is_none());
        assert!(cfg.max_inertia_ratio.is_none());
    }

    #[test]
    fn test_tracker_defaults() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.max_age, DEFAULT_MAX_AGE);
        assert_eq!(cfg.min_hits, DEFAULT_MIN_HITS);
        assert_eq!(cfg.iou_thresh, DEFAULT_IOU_THRESHOLD);
    }

    #[test]
    fn test_from_json_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "detector": {{ "min_area": 10.0 }},
                "tracker": {{ "max_age": 12 }},
                "framerate": 30.0
            }}"#
        )
        .unwrap();

        let cfg = RunConfig::from_json_file(file.path()).unwrap();
        assert_eq!(cfg.detector.min_area, Some(10.0));
        assert_eq!(cfg.detector.max_area, None);
        assert_eq!(cfg.tracker.max_age, 12);
        assert_eq!(cfg.tracker.min_hits, DEFAULT_MIN_HITS);
        assert_eq!(cfg.framerate, Some(30.0));
        assert_eq!(cfg.threshold, None);
    }

    #[test]
    fn test_from_json_missing_file_errors() {
        assert!(RunConfig::from_json_file(Path::new("/nonexistent/cfg.json")).is_err());
    }
}
