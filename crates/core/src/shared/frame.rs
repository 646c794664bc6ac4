use ndarray::ArrayView2;

/// A single grayscale video frame: contiguous intensity bytes in row-major
/// order.
///
/// Frames are immutable once read; all pipeline stages produce new buffers
/// rather than mutating their input.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of this frame in the video, starting at zero.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u8> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.data)
            .expect("frame data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 6]; // 3x2
        let frame = GrayFrame::new(data.clone(), 3, 2, 7);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_get_is_row_major() {
        let data = vec![10, 20, 30, 40, 50, 60]; // 3x2
        let frame = GrayFrame::new(data, 3, 2, 0);
        assert_eq!(frame.get(0, 0), 10);
        assert_eq!(frame.get(2, 0), 30);
        assert_eq!(frame.get(0, 1), 40);
        assert_eq!(frame.get(2, 1), 60);
    }

    #[test]
    fn test_as_ndarray_shape_is_height_width() {
        let frame = GrayFrame::new(vec![0u8; 8], 4, 2, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4]);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        let mut data = vec![0u8; 6];
        data[4] = 255; // row 1, col 1 of a 3-wide frame
        let frame = GrayFrame::new(data, 3, 2, 0);
        assert_eq!(frame.as_ndarray()[[1, 1]], 255);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height")]
    fn test_mismatched_data_length_panics_in_debug() {
        GrayFrame::new(vec![0u8; 5], 3, 2, 0);
    }
}
