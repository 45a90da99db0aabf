// src/shared/reader.rs

use super::SharedBus;
use crate::common::{
    error::{RtdError, ValidationError},
    input::InputValue,
    reading::{ChannelReading, FirmwareVersion, Reading},
    request::{PreparedRead, ReadRequest, ReaderConfig},
};
use core::cell::Cell;
use core::time::Duration;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex as BlockingMutex};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

/// A logical channel reader borrowing a [`SharedBus`].
///
/// Reads take `&self`; concurrent calls, from this or any other reader on the same bus, are
/// serialized by the bus mutex.
pub struct SharedChannelReader<'a, M: RawMutex, I2C, V = ()> {
    bus: &'a SharedBus<M, I2C>,
    config: ReaderConfig<V>,
    last_validation_error: BlockingMutex<M, Cell<Option<ValidationError>>>,
}

impl<'a, M: RawMutex, I2C, V> SharedChannelReader<'a, M, I2C, V> {
    pub fn new(bus: &'a SharedBus<M, I2C>, config: ReaderConfig<V>) -> Self {
        SharedChannelReader {
            bus,
            config,
            last_validation_error: BlockingMutex::new(Cell::new(None)),
        }
    }

    pub fn config(&self) -> &ReaderConfig<V> {
        &self.config
    }

    pub fn bus(&self) -> &'a SharedBus<M, I2C> {
        self.bus
    }

    /// Why the most recent request was rejected, or `None` if it passed validation.
    pub fn last_validation_error(&self) -> Option<ValidationError> {
        self.last_validation_error.lock(|cell| cell.get())
    }

    fn record_validation(&self, outcome: Option<ValidationError>) {
        self.last_validation_error.lock(|cell| cell.set(outcome));
    }
}

impl<'a, M, I2C, V> SharedChannelReader<'a, M, I2C, V>
where
    M: RawMutex,
    I2C: I2c,
    V: Clone,
{
    fn prepare(&self, request: &ReadRequest<'_>) -> Result<PreparedRead<V>, ValidationError> {
        let outcome = self.config.prepare(request);
        match &outcome {
            Ok(_) => self.record_validation(None),
            Err(e) => {
                warn!("request rejected before bus access");
                self.record_validation(Some(*e));
            }
        }
        outcome
    }

    /// Reads one channel, waiting for the bus if another transaction is in flight.
    ///
    /// An invalid request fails straight away, without waiting for the bus. There is no
    /// timeout on the transfer itself: one that never completes blocks this call. See
    /// [`read_channel_within`](Self::read_channel_within).
    pub async fn read_channel(
        &self,
        request: &ReadRequest<'_>,
    ) -> Result<ChannelReading<V>, RtdError<I2C::Error>> {
        let prepared = self.prepare(request)?;
        self.transfer(prepared).await
    }

    /// Like [`read_channel`](Self::read_channel) but gives up after `timeout`, measured with
    /// `delay` and including the wait for the bus.
    ///
    /// Expiry yields [`RtdError::Timeout`], never a stale value. The pending read is dropped,
    /// which releases the bus; whether the transfer already on the wire is aborted is up to
    /// the HAL driver.
    pub async fn read_channel_within<D: DelayNs>(
        &self,
        request: &ReadRequest<'_>,
        mut delay: D,
        timeout: Duration,
    ) -> Result<ChannelReading<V>, RtdError<I2C::Error>> {
        let prepared = self.prepare(request)?;
        let address = prepared.address;
        let timeout_us = u32::try_from(timeout.as_micros()).unwrap_or(u32::MAX);

        match select(self.transfer(prepared), delay.delay_us(timeout_us)).await {
            Either::First(result) => result,
            Either::Second(()) => {
                warn!(
                    "read timed out on stack {} channel {}",
                    address.stack(),
                    address.channel()
                );
                Err(RtdError::Timeout { address })
            }
        }
    }

    async fn transfer(
        &self,
        prepared: PreparedRead<V>,
    ) -> Result<ChannelReading<V>, RtdError<I2C::Error>> {
        let mut inner = self.bus.inner().lock().await;
        inner.ensure_open()?;

        let raw = inner.block_read(prepared.address, prepared.register).await?;
        Ok(ChannelReading {
            address: prepared.address,
            reading: Reading::from_le_bytes(raw),
            payload: prepared.payload,
        })
    }
}

impl<'a, M, I2C, V> SharedChannelReader<'a, M, I2C, V>
where
    M: RawMutex,
    I2C: I2c,
{
    /// Reads the firmware revision of the board at `stack`, validated like a channel read.
    pub async fn read_firmware_version<'r>(
        &self,
        stack: impl Into<InputValue<'r>>,
    ) -> Result<FirmwareVersion, RtdError<I2C::Error>> {
        let stack = match self.config.resolve_stack(stack.into()) {
            Ok(stack) => {
                self.record_validation(None);
                stack
            }
            Err(e) => {
                warn!("stack rejected before bus access");
                self.record_validation(Some(e));
                return Err(e.into());
            }
        };

        let mut inner = self.bus.inner().lock().await;
        inner.ensure_open()?;
        let raw = inner.revision_read(stack).await?;
        Ok(FirmwareVersion::from_bytes(raw))
    }
}
