// src/common/bus_state.rs

use super::error::RtdError;
use core::fmt::Debug;

/// Lifecycle of a reader: `Uninitialized -> Open -> Closed`. `Closed` is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReaderState {
    Uninitialized,
    Open,
    Closed,
}

/// Holds the bus handle according to the reader's lifecycle.
#[derive(Debug)]
pub(crate) enum BusSlot<B> {
    Uninitialized,
    Open(B),
    Closed,
}

impl<B> Default for BusSlot<B> {
    fn default() -> Self {
        BusSlot::Uninitialized
    }
}

impl<B> BusSlot<B> {
    pub(crate) fn state(&self) -> ReaderState {
        match self {
            BusSlot::Uninitialized => ReaderState::Uninitialized,
            BusSlot::Open(_) => ReaderState::Open,
            BusSlot::Closed => ReaderState::Closed,
        }
    }

    /// Checks that a bus may be installed, without installing one.
    pub(crate) fn ensure_vacant<E: Debug>(&self) -> Result<(), RtdError<E>> {
        match self {
            BusSlot::Uninitialized => Ok(()),
            BusSlot::Open(_) => Err(RtdError::AlreadyInitialized),
            BusSlot::Closed => Err(RtdError::BusClosed),
        }
    }

    pub(crate) fn attach<E: Debug>(&mut self, bus: B) -> Result<(), RtdError<E>> {
        self.ensure_vacant::<E>()?;
        *self = BusSlot::Open(bus);
        Ok(())
    }

    pub(crate) fn bus(&self) -> Option<&B> {
        match self {
            BusSlot::Open(bus) => Some(bus),
            _ => None,
        }
    }

    /// Checks that a transaction may start, without borrowing the bus.
    pub(crate) fn ensure_open<E: Debug>(&self) -> Result<(), RtdError<E>> {
        match self {
            BusSlot::Open(_) => Ok(()),
            BusSlot::Uninitialized => Err(RtdError::BusNotOpen),
            BusSlot::Closed => Err(RtdError::BusClosed),
        }
    }

    pub(crate) fn bus_mut<E: Debug>(&mut self) -> Result<&mut B, RtdError<E>> {
        match self {
            BusSlot::Open(bus) => Ok(bus),
            BusSlot::Uninitialized => Err(RtdError::BusNotOpen),
            BusSlot::Closed => Err(RtdError::BusClosed),
        }
    }

    /// Moves to `Closed`, handing back the bus if one was open.
    pub(crate) fn close(&mut self) -> Option<B> {
        match core::mem::replace(self, BusSlot::Closed) {
            BusSlot::Open(bus) => Some(bus),
            _ => None,
        }
    }
}
