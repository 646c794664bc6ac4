pub mod image_dir_source;
pub mod memory_source;
