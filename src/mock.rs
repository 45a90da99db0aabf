// src/mock.rs

// Test doubles for the bus seams. Compiled for unit tests only.

use crate::common::hal_traits::OpenBus;
use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
use std::collections::HashMap;
use std::vec::Vec;

/// Bus number the mock accepts in `OpenBus::open`.
pub const MOCK_BUS_NUMBER: u8 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MockI2cError {
    /// Board did not acknowledge its address.
    Nack,
    /// Bus device file missing.
    NoDevice,
}

impl embedded_hal::i2c::Error for MockI2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            MockI2cError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            MockI2cError::NoDevice => ErrorKind::Other,
        }
    }
}

/// One block read seen by a mock bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockRead {
    pub address: u8,
    pub register: u8,
    pub len: usize,
}

/// Register contents shared by both mock buses.
#[derive(Debug, Default)]
pub struct RegisterFile {
    registers: HashMap<(u8, u8), [u8; 4]>,
}

impl RegisterFile {
    pub fn set(&mut self, address: u8, register: u8, raw: [u8; 4]) {
        self.registers.insert((address, register), raw);
    }

    pub fn set_value(&mut self, address: u8, register: u8, value: f32) {
        self.set(address, register, value.to_le_bytes());
    }

    fn fill(&self, address: u8, register: u8, buf: &mut [u8]) {
        let raw = self.registers.get(&(address, register)).copied().unwrap_or([0; 4]);
        for (dst, src) in buf.iter_mut().zip(raw.iter()) {
            *dst = *src;
        }
    }
}

// Splits `[Write([register]), Read(buf)]` into its parts.
fn split_block_read<'a, 'b>(operations: &'a mut [Operation<'b>]) -> (u8, &'a mut [u8]) {
    match operations {
        [Operation::Write(reg), Operation::Read(buf)] => {
            assert_eq!(reg.len(), 1, "register select must be a single byte");
            (reg[0], &mut **buf)
        }
        _ => panic!("unexpected I2C operation sequence"),
    }
}

// --- Blocking mock ---

#[derive(Debug, Default)]
pub struct MockI2c {
    pub registers: RegisterFile,
    pub transactions: Vec<BlockRead>,
    /// Number of upcoming transactions that fail with a NACK.
    pub fail_next: usize,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorType for MockI2c {
    type Error = MockI2cError;
}

impl embedded_hal::i2c::I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let (register, buf) = split_block_read(operations);
        self.transactions.push(BlockRead { address, register, len: buf.len() });
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(MockI2cError::Nack);
        }
        self.registers.fill(address, register, buf);
        Ok(())
    }
}

impl OpenBus for MockI2c {
    fn open(bus_number: u8) -> Result<Self, Self::Error> {
        if bus_number == MOCK_BUS_NUMBER {
            Ok(MockI2c::new())
        } else {
            Err(MockI2cError::NoDevice)
        }
    }
}

// --- Async mock ---

#[cfg(feature = "async")]
pub use self::asynch::*;

#[cfg(feature = "async")]
mod asynch {
    use super::*;
    use core::cell::RefCell;
    use std::rc::Rc;

    /// Bus activity in the order it happened.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum BusEvent {
        Start { address: u8, register: u8 },
        End { address: u8, register: u8 },
    }

    /// Async mock that suspends in the middle of every transfer, so a second caller gets the
    /// chance to run while a transaction is in flight.
    #[derive(Debug, Default)]
    pub struct MockAsyncI2c {
        pub registers: RegisterFile,
        pub events: Rc<RefCell<Vec<BusEvent>>>,
        pub fail_next: usize,
        /// Never complete a transfer.
        pub hang: bool,
    }

    impl MockAsyncI2c {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn transaction_count(&self) -> usize {
            self.events
                .borrow()
                .iter()
                .filter(|e| matches!(e, BusEvent::Start { .. }))
                .count()
        }
    }

    impl ErrorType for MockAsyncI2c {
        type Error = MockI2cError;
    }

    impl OpenBus for MockAsyncI2c {
        fn open(bus_number: u8) -> Result<Self, Self::Error> {
            if bus_number == MOCK_BUS_NUMBER {
                Ok(MockAsyncI2c::new())
            } else {
                Err(MockI2cError::NoDevice)
            }
        }
    }

    impl embedded_hal_async::i2c::I2c for MockAsyncI2c {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            let (register, buf) = split_block_read(operations);
            self.events.borrow_mut().push(BusEvent::Start { address, register });

            if self.hang {
                core::future::pending::<()>().await;
            }
            embassy_futures::yield_now().await;

            // Scribble, suspend again, then write the real value; an interleaved reader
            // sharing the buffer would pick up the scribble.
            buf.fill(0xEE);
            embassy_futures::yield_now().await;

            let result = if self.fail_next > 0 {
                self.fail_next -= 1;
                Err(MockI2cError::Nack)
            } else {
                self.registers.fill(address, register, buf);
                Ok(())
            };
            self.events.borrow_mut().push(BusEvent::End { address, register });
            result
        }
    }

    /// Delay that either elapses immediately or never.
    #[derive(Debug, Copy, Clone)]
    pub struct MockDelay {
        pub elapses: bool,
    }

    impl embedded_hal_async::delay::DelayNs for MockDelay {
        async fn delay_ns(&mut self, _ns: u32) {
            if !self.elapses {
                core::future::pending::<()>().await;
            }
        }
    }
}
