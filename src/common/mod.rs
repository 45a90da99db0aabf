// src/common/mod.rs

pub mod address;
pub mod bus_state;
pub mod error;
pub mod hal_traits;
pub mod input;
pub mod payload;
pub mod reading;
pub mod request;

// --- Re-export key types/traits/functions for easier access ---

pub use address::{ChannelAddress, Quantity, RangePolicy};
pub use bus_state::ReaderState;
pub use error::{RtdError, ValidationError};
pub use hal_traits::OpenBus;
pub use input::{InputValue, RejectedInput};
pub use payload::{resolve_payload, PayloadError, PayloadFn, PayloadMode};
pub use reading::{poly5_temperature, ChannelReading, FirmwareVersion, Reading};
pub use request::{PreparedRead, ReadRequest, ReaderConfig};
