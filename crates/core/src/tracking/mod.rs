//! Multi-object tracking: motion prediction, assignment, and the track
//! lifecycle state machine.

pub mod assignment;
pub mod kalman;
pub mod track;
pub mod tracker;
