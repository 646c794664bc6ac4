pub mod blob;
pub mod blob_detector;
pub mod preprocess;
