//! CSV record sink with atomic promotion.
//!
//! Rows go to `<output>.tmp`; the file is renamed to its final name only in
//! `finish`, so a cancelled or failed run never leaves a partial result
//! under the output name.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;

use crate::pipeline::record::{RecordWriter, TrackRecord};

pub struct CsvRecordWriter {
    writer: Option<csv::Writer<File>>,
    tmp_path: PathBuf,
    final_path: PathBuf,
}

impl CsvRecordWriter {
    pub fn create(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let writer = csv::Writer::from_writer(File::create(&tmp_path)?);
        Ok(Self {
            writer: Some(writer),
            tmp_path,
            final_path: path.to_path_buf(),
        })
    }
}

impl RecordWriter for CsvRecordWriter {
    fn write(&mut self, record: &TrackRecord) -> Result<(), Box<dyn std::error::Error>> {
        let writer = self.writer.as_mut().ok_or("writer already finished")?;
        writer.serialize(record)?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), Box<dyn std::error::Error>> {
        let writer = self.writer.take().ok_or("writer already finished")?;
        writer.into_inner()?.sync_all()?;
        std::fs::rename(&self.tmp_path, &self.final_path)?;
        debug!("promoted {}", self.final_path.display());
        Ok(())
    }
}

impl Drop for CsvRecordWriter {
    fn drop(&mut self) {
        if self.writer.is_some() {
            // Unfinished run; drop the partial file.
            let _ = std::fs::remove_file(&self.tmp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame_index: usize, track_id: u64) -> TrackRecord {
        TrackRecord {
            frame_index,
            track_id,
            x: 1.0,
            y: 2.0,
            width: 6.0,
            height: 6.0,
            timestamp: None,
        }
    }

    #[test]
    fn test_rows_visible_only_after_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");

        let mut writer = Box::new(CsvRecordWriter::create(&path).unwrap());
        writer.write(&record(0, 1)).unwrap();
        assert!(!path.exists());

        writer.finish().unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("tracks.csv.tmp").exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("frame_index,track_id,x,y,width,height,timestamp"));
        assert!(content.contains("0,1,1.0,2.0,6.0,6.0,"));
    }

    #[test]
    fn test_dropped_writer_cleans_up_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");

        {
            let mut writer = CsvRecordWriter::create(&path).unwrap();
            writer.write(&record(0, 1)).unwrap();
        }
        assert!(!path.exists());
        assert!(!dir.path().join("tracks.csv.tmp").exists());
    }

    #[test]
    fn test_timestamp_column_serializes_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");

        let mut writer = Box::new(CsvRecordWriter::create(&path).unwrap());
        let mut row = record(3, 7);
        row.timestamp = Some(0.1);
        writer.write(&row).unwrap();
        writer.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("3,7,1.0,2.0,6.0,6.0,0.1"));
    }
}
