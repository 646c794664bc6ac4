//! Turns a raw frame into a denoised binary foreground mask.
//!
//! Steps: absolute difference against the background model, invert (so
//! foreground reads dark), binarize at the calibrated threshold, 3x3 median
//! denoise. Stateless and deterministic given its inputs.

use ndarray::Zip;

use crate::calibration::background::BackgroundModel;
use crate::shared::frame::GrayFrame;

/// Binary foreground mask; set pixels are stored as 255.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryMask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl BinaryMask {
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

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.data[(y as usize) * (self.width as usize) + (x as usize)] != 0
    }

    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Inverted absolute difference against the background: pixels matching the
/// background read 255, foreground reads dark.
pub fn inverted_difference(frame: &GrayFrame, background: &BackgroundModel) -> Vec<u8> {
    debug_assert_eq!(frame.width(), background.width());
    debug_assert_eq!(frame.height(), background.height());
    let frame_view = frame.as_ndarray();
    let background_view = background.as_ndarray();
    let diff = Zip::from(&frame_view)
        .and(&background_view)
        .map_collect(|&f, &b| 255 - f.abs_diff(b));
    let (data, _) = diff.into_raw_vec_and_offset();
    data
}

/// Foreground is every pixel strictly darker than `threshold`.
pub fn binarize(values: &[u8], width: u32, height: u32, threshold: u8) -> BinaryMask {
    let data = values
        .iter()
        .map(|&v| if v < threshold { 255 } else { 0 })
        .collect();
    BinaryMask::new(data, width, height)
}

/// 3x3 median filter on a binary mask: a pixel stays set only if set pixels
/// hold the majority of its in-bounds neighborhood. Removes isolated-pixel
/// noise without eroding blob interiors.
pub fn median_denoise(mask: &BinaryMask) -> BinaryMask {
    let w = mask.width() as i64;
    let h = mask.height() as i64;
    let mut out = vec![0u8; (w * h) as usize];

    for y in 0..h {
        for x in 0..w {
            let mut set = 0u32;
            let mut total = 0u32;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    total += 1;
                    if mask.is_set(nx as u32, ny as u32) {
                        set += 1;
                    }
                }
            }
            if 2 * set > total {
                out[(y * w + x) as usize] = 255;
            }
        }
    }

    BinaryMask::new(out, mask.width(), mask.height())
}

/// Full preprocessing chain for one production frame.
pub fn foreground_mask(frame: &GrayFrame, background: &BackgroundModel, threshold: u8) -> BinaryMask {
    let diff = inverted_difference(frame, background);
    let mask = binarize(&diff, frame.width(), frame.height(), threshold);
    median_denoise(&mask)
}
