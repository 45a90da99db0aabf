// src/reader/mod.rs

pub mod sync_reader;

// Re-export the public reader struct
pub use sync_reader::SensorChannelReader;
