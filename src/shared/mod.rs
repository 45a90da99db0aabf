// src/shared/mod.rs

//! One physical bus shared by many logical channel readers.
//!
//! [`SharedBus`] owns the bus handle and the transfer buffer behind an async mutex. Each
//! [`SharedChannelReader`] borrows the bus and holds its own [`ReaderConfig`]. Requests are
//! validated before the mutex is taken; a read then keeps the mutex for the whole register
//! select + block read, so concurrent readers queue instead of interleaving on the wire.

mod reader;

pub use reader::SharedChannelReader;

use crate::common::{
    address::{board_address, ChannelAddress, FIRMWARE_REVISION_LEN, FIRMWARE_REVISION_REGISTER},
    bus_state::{BusSlot, ReaderState},
    error::RtdError,
    hal_traits::OpenBus,
    reading::READING_LEN,
    request::ReaderConfig,
};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::i2c::{ErrorType, I2c};

pub(crate) struct BusInner<I2C> {
    slot: BusSlot<I2C>,
    buffer: [u8; READING_LEN],
}

impl<I2C: I2c> BusInner<I2C> {
    pub(crate) fn ensure_open(&self) -> Result<(), RtdError<I2C::Error>> {
        self.slot.ensure_open::<I2C::Error>()
    }

    pub(crate) async fn block_read(
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
        })
        .await?;
        Ok(self.buffer)
    }

    pub(crate) async fn revision_read(
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
        )
        .await?;
        let mut raw = [0; FIRMWARE_REVISION_LEN];
        raw.copy_from_slice(&self.buffer[..FIRMWARE_REVISION_LEN]);
        Ok(raw)
    }

    async fn register_read(
        &mut self,
        device: u8,
        register: u8,
        len: usize,
        on_error: impl FnOnce(I2C::Error) -> RtdError<I2C::Error>,
    ) -> Result<(), RtdError<I2C::Error>> {
        let bus = self.slot.bus_mut::<I2C::Error>()?;
        trace!("block read device {} register {} len {}", device, register, len);
        bus.write_read(device, &[register], &mut self.buffer[..len])
            .await
            .map_err(on_error)
    }
}

/// Owner of one I2C bus handle shared by any number of [`SharedChannelReader`]s.
///
/// `M` selects the mutex flavour, e.g. `CriticalSectionRawMutex` when readers run on
/// different executors or `NoopRawMutex` when they all share one.
pub struct SharedBus<M: RawMutex, I2C> {
    inner: Mutex<M, BusInner<I2C>>,
}

impl<M: RawMutex, I2C> SharedBus<M, I2C> {
    /// A manager without a bus, suitable for a `static`.
    pub const fn new() -> Self {
        SharedBus {
            inner: Mutex::new(BusInner {
                slot: BusSlot::Uninitialized,
                buffer: [0; READING_LEN],
            }),
        }
    }

    /// A manager that is already `Open` on `bus`.
    pub fn with_bus(bus: I2C) -> Self {
        SharedBus {
            inner: Mutex::new(BusInner {
                slot: BusSlot::Open(bus),
                buffer: [0; READING_LEN],
            }),
        }
    }

    pub async fn state(&self) -> ReaderState {
        self.inner.lock().await.slot.state()
    }

    /// Closes the bus once any in-flight transaction has finished and hands it back.
    ///
    /// Every reader sharing this bus fails with [`RtdError::BusClosed`] afterwards.
    pub async fn shutdown(&self) -> Option<I2C> {
        let bus = self.inner.lock().await.slot.close();
        if bus.is_some() {
            debug!("shared bus closed");
        }
        bus
    }

    /// A logical reader on this bus.
    pub fn reader<V>(&self, config: ReaderConfig<V>) -> SharedChannelReader<'_, M, I2C, V> {
        SharedChannelReader::new(self, config)
    }

    pub(crate) fn inner(&self) -> &Mutex<M, BusInner<I2C>> {
        &self.inner
    }
}

impl<M: RawMutex, I2C> Default for SharedBus<M, I2C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, I2C: ErrorType> SharedBus<M, I2C> {
    /// Installs an already opened bus.
    pub async fn attach(&self, bus: I2C) -> Result<(), RtdError<I2C::Error>> {
        self.inner.lock().await.slot.attach::<I2C::Error>(bus)?;
        debug!("shared bus attached");
        Ok(())
    }
}

impl<M: RawMutex, I2C: OpenBus> SharedBus<M, I2C> {
    /// Opens bus `bus_number`; see [`OpenBus`].
    pub async fn initialize(&self, bus_number: u8) -> Result<(), RtdError<I2C::Error>> {
        let mut inner = self.inner.lock().await;
        inner.slot.ensure_vacant::<I2C::Error>()?;
        let bus = I2C::open(bus_number).map_err(|e| {
            warn!("failed to open i2c bus {}", bus_number);
            RtdError::BusOpen(e)
        })?;
        inner.slot.attach::<I2C::Error>(bus)?;
        debug!("shared bus {} open", bus_number);
        Ok(())
    }
}
