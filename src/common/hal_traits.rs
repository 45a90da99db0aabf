// src/common/hal_traits.rs

use embedded_hal::i2c::ErrorType;

/// A bus handle that can be opened by bus number (`1` is `/dev/i2c-1` on Linux).
///
/// Opening failures use the bus's own error type. Closing is `Drop`: the handle releases the
/// OS resource when it goes out of scope.
pub trait OpenBus: ErrorType + Sized {
    fn open(bus_number: u8) -> Result<Self, Self::Error>;
}

/// Linux i2c-dev character device.
#[cfg(feature = "linux")]
impl OpenBus for linux_embedded_hal::I2cdev {
    fn open(bus_number: u8) -> Result<Self, Self::Error> {
        let path = std::format!("/dev/i2c-{}", bus_number);
        linux_embedded_hal::I2cdev::new(path).map_err(linux_embedded_hal::I2CError::from)
    }
}
