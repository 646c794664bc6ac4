use serde::Serialize;

/// One output row: a confirmed track's box on one frame.
///
/// `timestamp` is seconds from video start, present only when the run knows
/// a framerate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackRecord {
    pub frame_index: usize,
    pub track_id: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub timestamp: Option<f64>,
}

/// Sink for the record stream of one run.
///
/// Implementations must not leave a partial result visible on failure:
/// rows become observable at their final destination only after `finish`.
pub trait RecordWriter {
    fn write(&mut self, record: &TrackRecord) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes and promotes the output to its final destination.
    fn finish(self: Box<Self>) -> Result<(), Box<dyn std::error::Error>>;
}
