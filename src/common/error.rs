// src/common/error.rs

use super::address::ChannelAddress;
use super::input::RejectedInput;
use super::payload::PayloadError;

/// A request rejected before any bus traffic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Stack level missing or not an integer.
    #[error("Stack level ({0}) value is missing or incorrect")]
    InvalidStack(RejectedInput),

    /// Channel number missing or not an integer.
    #[error("Sensor number ({0}) value is missing or incorrect")]
    InvalidChannel(RejectedInput),

    /// Stack level outside 0..=7 while the reader rejects out-of-range values.
    #[error("Stack level {0} out of range [0..7]")]
    StackOutOfRange(i64),

    /// Channel number outside 1..=8 while the reader rejects out-of-range values.
    #[error("Sensor number {0} out of range [1..8]")]
    ChannelOutOfRange(i64),

    /// The payload could not be evaluated for this request.
    #[error("Payload evaluation failed: {0}")]
    Payload(PayloadError),
}

/// Everything that can go wrong between a read request and a decoded reading.
///
/// `E` is the error type of the underlying bus (the HAL's `I2c::Error`).
#[derive(Debug, thiserror::Error)]
pub enum RtdError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Request rejected before touching the bus.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The bus device could not be opened.
    #[error("Failed to open I2C bus: {0:?}")]
    BusOpen(E),

    /// A read was attempted before the bus was opened.
    #[error("I2C bus not open")]
    BusNotOpen,

    /// A read was attempted after shutdown.
    #[error("I2C bus already closed")]
    BusClosed,

    /// `initialize` or `attach` called on a reader that already holds a bus.
    #[error("I2C bus already open")]
    AlreadyInitialized,

    /// The block read failed (NACK, I/O error, board absent).
    #[error("I2C transaction failed for {address}: {cause:?}")]
    Transaction { address: ChannelAddress, cause: E },

    /// A board-wide register read (firmware revision) failed.
    #[error("I2C transaction failed for board on stack {stack}: {cause:?}")]
    BoardTransaction { stack: u8, cause: E },

    /// The block read did not complete within the configured timeout.
    #[error("I2C transaction timed out for {address}")]
    Timeout { address: ChannelAddress },
}

impl<E: core::fmt::Debug> RtdError<E> {
    /// The validation failure behind this error, if the request never reached the bus.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            RtdError::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// The sensor a failed transaction was aimed at.
    pub fn address(&self) -> Option<ChannelAddress> {
        match self {
            RtdError::Transaction { address, .. } | RtdError::Timeout { address } => Some(*address),
            _ => None,
        }
    }

    /// The stack level of the board involved in a failed transaction.
    pub fn stack(&self) -> Option<u8> {
        match self {
            RtdError::BoardTransaction { stack, .. } => Some(*stack),
            other => other.address().map(|a| a.stack()),
        }
    }
}
