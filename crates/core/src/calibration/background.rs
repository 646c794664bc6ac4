//! Per-pixel median background estimation.

use ndarray::ArrayView2;

use crate::calibration::error::CalibrationError;
use crate::shared::frame::GrayFrame;

/// The static scene estimate every frame is differenced against.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundModel {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl BackgroundModel {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize));
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u8> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.data)
            .expect("background data length must match dimensions")
    }
}

/// Per-pixel median over the sampled frames.
///
/// Moving objects occupy any given pixel in only a minority of samples, so
/// the median recovers the static scene behind them. For an even sample
/// count the upper median (index n/2) is used, keeping the result an
/// observed pixel value rather than an interpolated one.
pub fn estimate_background(frames: &[GrayFrame]) -> Result<BackgroundModel, CalibrationError> {
    let Some(first) = frames.first() else {
        return Err(CalibrationError::InsufficientFrames {
            available: 0,
            required: 1,
        });
    };
    let width = first.width();
    let height = first.height();
    let pixel_count = (width as usize) * (height as usize);

    let mut data = Vec::with_capacity(pixel_count);
    let mut column = vec![0u8; frames.len()];
    for i in 0..pixel_count {
        for (slot, frame) in column.iter_mut().zip(frames) {
            *slot = frame.data()[i];
        }
        column.sort_unstable();
        data.push(column[column.len() / 2]);
    }

    Ok(BackgroundModel::new(data, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: Vec<u8>, index: usize) -> GrayFrame {
        let len = data.len() as u32;
        GrayFrame::new(data, len, 1, index)
    }

    #[test]
    fn test_median_ignores_transient_object() {
        // Pixel 0 is occluded (value 10) in 2 of 5 frames.
        let frames = vec![
            frame(vec![200, 50], 0),
            frame(vec![10, 50], 1),
            frame(vec![200, 50], 2),
            frame(vec![10, 50], 3),
            frame(vec![200, 50], 4),
        ];
        let background = estimate_background(&frames).unwrap();
        assert_eq!(background.data(), &[200, 50]);
    }

    #[test]
    fn test_even_count_takes_upper_median() {
        let frames = vec![frame(vec![10], 0), frame(vec![20], 1)];
        let background = estimate_background(&frames).unwrap();
        assert_eq!(background.get(0, 0), 20);
    }

    #[test]
    fn test_single_frame_is_its_own_background() {
        let frames = vec![frame(vec![7, 8, 9], 0)];
        let background = estimate_background(&frames).unwrap();
        assert_eq!(background.data(), &[7, 8, 9]);
    }

    #[test]
    fn test_as_ndarray_is_height_by_width() {
        let background = BackgroundModel::new(vec![1, 2, 3, 4, 5, 6], 3, 2);
        let view = background.as_ndarray();
        assert_eq!(view.shape(), &[2, 3]);
        assert_eq!(view[[1, 0]], 4);
    }

    #[test]
    fn test_no_frames_is_an_error() {
        assert!(matches!(
            estimate_background(&[]),
            Err(CalibrationError::InsufficientFrames { .. })
        ));
    }
}
