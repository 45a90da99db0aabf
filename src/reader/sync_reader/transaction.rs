// src/reader/sync_reader/transaction.rs

use super::SensorChannelReader;
use crate::common::{
    address::{board_address, ChannelAddress, FIRMWARE_REVISION_LEN, FIRMWARE_REVISION_REGISTER},
    error::RtdError,
    reading::READING_LEN,
};
use embedded_hal::i2c::I2c;

impl<I2C, V> SensorChannelReader<I2C, V>
where
    I2C: I2c,
{
    /// Selects `register` on the board at `address` and reads one 4-byte register.
    ///
    /// No retry: a failed transfer goes straight back to the caller.
    pub(super) fn block_read(
        &mut self,
        address: ChannelAddress,
        register: u8,
    ) -> Result<[u8; READING_LEN], RtdError<I2C::Error>> {
        self.register_read(address.device_address(), register, READING_LEN, |cause| {
            warn!(
                "block read failed on stack {} channel {}",
                address.stack(),
                address.channel()
            );
            RtdError::Transaction { address, cause }
        })?;
        Ok(self.buffer)
    }

    /// Reads the two revision bytes of the board at `stack`.
    pub(super) fn revision_read(
        &mut self,
        stack: u8,
    ) -> Result<[u8; FIRMWARE_REVISION_LEN], RtdError<I2C::Error>> {
        self.register_read(
            board_address(stack),
            FIRMWARE_REVISION_REGISTER,
            FIRMWARE_REVISION_LEN,
            |cause| {
                warn!("revision read failed on stack {}", stack);
                RtdError::BoardTransaction { stack, cause }
            },
        )?;
        let mut raw = [0; FIRMWARE_REVISION_LEN];
        raw.copy_from_slice(&self.buffer[..FIRMWARE_REVISION_LEN]);
        Ok(raw)
    }

    // Register select + repeated-start read of `len` bytes into the transfer buffer.
    fn register_read(
        &mut self,
        device: u8,
        register: u8,
        len: usize,
        on_error: impl FnOnce(I2C::Error) -> RtdError<I2C::Error>,
    ) -> Result<(), RtdError<I2C::Error>> {
        let bus = self.bus.bus_mut::<I2C::Error>()?;
        trace!("block read device {} register {} len {}", device, register, len);
        bus.write_read(device, &[register], &mut self.buffer[..len])
            .map_err(on_error)
    }
}
