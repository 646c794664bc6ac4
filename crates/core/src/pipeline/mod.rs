//! Run orchestration: calibrate a video once, track every frame, persist
//! the record stream.

pub mod csv_writer;
pub mod record;
pub mod track_blobs_use_case;
