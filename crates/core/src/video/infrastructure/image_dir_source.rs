use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::GrayFrame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Adapts a directory of image files to the [`FrameSource`] interface.
///
/// Files are ordered lexicographically by name, so zero-padded frame numbers
/// (`frame_00000042.png`) decode in recording order. Every image is converted
/// to 8-bit grayscale on read; all frames must share the dimensions of the
/// first one.
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    metadata: VideoMetadata,
}

impl ImageDirSource {
    pub fn open(dir: &Path, fps: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_image(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(format!("no image frames found in {}", dir.display()).into());
        }

        let first = image::open(&paths[0])?.into_luma8();
        let metadata = VideoMetadata {
            width: first.width(),
            height: first.height(),
            fps,
            total_frames: paths.len(),
            source_path: Some(dir.to_path_buf()),
        };

        Ok(Self { paths, metadata })
    }

    fn decode(&self, index: usize) -> Result<GrayFrame, Box<dyn std::error::Error>> {
        let path = self
            .paths
            .get(index)
            .ok_or_else(|| format!("frame index {index} out of range"))?;
        let img = image::open(path)?.into_luma8();
        if img.width() != self.metadata.width || img.height() != self.metadata.height {
            return Err(format!(
                "frame {} is {}x{}, expected {}x{}",
                path.display(),
                img.width(),
                img.height(),
                self.metadata.width,
                self.metadata.height
            )
            .into());
        }
        Ok(GrayFrame::new(
            img.into_raw(),
            self.metadata.width,
            self.metadata.height,
            index,
        ))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self, index: usize) -> Result<GrayFrame, Box<dyn std::error::Error>> {
        self.decode(index)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<GrayFrame, Box<dyn std::error::Error>>> + '_> {
        let total = self.paths.len();
        Box::new((0..total).map(move |i| self.decode(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_gray_png(dir: &Path, name: &str, width: u32, height: u32, value: u8) {
        let img = image::GrayImage::from_pixel(width, height, image::Luma([value]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_gray_png(dir.path(), "frame_000.png", 8, 6, 10);
        write_gray_png(dir.path(), "frame_001.png", 8, 6, 20);

        let source = ImageDirSource::open(dir.path(), 30.0).unwrap();
        let meta = source.metadata();
        assert_eq!(meta.width, 8);
        assert_eq!(meta.height, 6);
        assert_eq!(meta.fps, 30.0);
        assert_eq!(meta.total_frames, 2);
    }

    #[test]
    fn test_frames_are_lexicographically_ordered() {
        let dir = tempfile::tempdir().unwrap();
        // Written out of order on purpose.
        write_gray_png(dir.path(), "frame_002.png", 4, 4, 30);
        write_gray_png(dir.path(), "frame_000.png", 4, 4, 10);
        write_gray_png(dir.path(), "frame_001.png", 4, 4, 20);

        let mut source = ImageDirSource::open(dir.path(), 0.0).unwrap();
        let values: Vec<u8> = source
            .frames()
            .map(|f| f.unwrap().data()[0])
            .collect();
        assert_eq!(values, vec![10, 20, 30]);
    }

    #[test]
    fn test_read_frame_random_access() {
        let dir = tempfile::tempdir().unwrap();
        write_gray_png(dir.path(), "a.png", 4, 4, 1);
        write_gray_png(dir.path(), "b.png", 4, 4, 2);
        write_gray_png(dir.path(), "c.png", 4, 4, 3);

        let mut source = ImageDirSource::open(dir.path(), 0.0).unwrap();
        assert_eq!(source.read_frame(2).unwrap().data()[0], 3);
        assert_eq!(source.read_frame(0).unwrap().data()[0], 1);
        assert_eq!(source.read_frame(0).unwrap().index(), 0);
    }

    #[test]
    fn test_read_frame_out_of_range_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_gray_png(dir.path(), "a.png", 4, 4, 1);

        let mut source = ImageDirSource::open(dir.path(), 0.0).unwrap();
        assert!(source.read_frame(1).is_err());
    }

    #[test]
    fn test_open_empty_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageDirSource::open(dir.path(), 0.0).is_err());
    }

    #[test]
    fn test_non_image_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_gray_png(dir.path(), "a.png", 4, 4, 1);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let source = ImageDirSource::open(dir.path(), 0.0).unwrap();
        assert_eq!(source.metadata().total_frames, 1);
    }

    #[test]
    fn test_mismatched_dimensions_error_on_read() {
        let dir = tempfile::tempdir().unwrap();
        write_gray_png(dir.path(), "a.png", 4, 4, 1);
        write_gray_png(dir.path(), "b.png", 6, 4, 2);

        let mut source = ImageDirSource::open(dir.path(), 0.0).unwrap();
        assert!(source.read_frame(0).is_ok());
        assert!(source.read_frame(1).is_err());
    }
}
