// src/lib.rs

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("feature \"defmt\" and feature \"log\" cannot be enabled at the same time");

#[macro_use]
mod logging;

pub mod common;
pub mod reader;

#[cfg(feature = "async")]
pub mod shared;

#[cfg(test)]
mod mock;

// Re-export key types for convenience
pub use common::{ChannelAddress, FirmwareVersion, InputValue, ReadRequest, ReaderConfig, Reading, RtdError};
pub use reader::SensorChannelReader;

#[cfg(feature = "async")]
pub use shared::{SharedBus, SharedChannelReader};
