// src/common/address.rs

use core::fmt;

/// 7-bit I2C address of the board at stack level 0.
pub const DEVICE_ADDRESS_BASE: u8 = 0x40;

/// Lowest and highest stack level (board position) a bus can carry.
pub const STACK_MIN: u8 = 0;
pub const STACK_MAX: u8 = 7;

/// Lowest and highest RTD channel on a board.
pub const CHANNEL_MIN: u8 = 1;
pub const CHANNEL_MAX: u8 = 8;

/// Width in bytes of one channel register (an IEEE-754 single).
pub const REGISTER_WIDTH: u8 = 4;

/// Register base of the temperature block (°C).
pub const TEMPERATURE_REGISTER_BASE: u8 = 0;
/// Register base of the resistance block (Ω).
pub const RESISTANCE_REGISTER_BASE: u8 = 59;

/// Firmware revision, major byte followed by minor byte.
pub const FIRMWARE_REVISION_REGISTER: u8 = 57;
pub const FIRMWARE_REVISION_LEN: usize = 2;

/// How out-of-range stack and channel numbers are handled.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangePolicy {
    /// Silently move the value to the nearest valid position.
    #[default]
    Clamp,
    /// Reject the request before any I/O.
    Reject,
}

/// Which register block of a channel is read.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Quantity {
    /// Linearized temperature computed by the board, in °C.
    #[default]
    Temperature,
    /// Raw sensor resistance, in Ω.
    Resistance,
}

impl Quantity {
    #[inline]
    pub const fn register_base(self) -> u8 {
        match self {
            Quantity::Temperature => TEMPERATURE_REGISTER_BASE,
            Quantity::Resistance => RESISTANCE_REGISTER_BASE,
        }
    }
}

/// I2C address of the board at `stack`, which must already be in range.
#[inline]
pub const fn board_address(stack: u8) -> u8 {
    DEVICE_ADDRESS_BASE + stack
}

/// Clamps a stack level to `STACK_MIN..=STACK_MAX`.
#[inline]
pub fn clamp_stack(stack: i64) -> u8 {
    stack.clamp(STACK_MIN as i64, STACK_MAX as i64) as u8
}

/// Clamps a channel number to `CHANNEL_MIN..=CHANNEL_MAX`.
#[inline]
pub fn clamp_channel(channel: i64) -> u8 {
    channel.clamp(CHANNEL_MIN as i64, CHANNEL_MAX as i64) as u8
}

/// A physical sensor position: board on the stack and channel on that board.
///
/// Both fields are always in range; construction goes through clamping or validation.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelAddress {
    stack: u8,
    channel: u8,
}

impl ChannelAddress {
    /// Builds an address, moving out-of-range values to the nearest valid position.
    pub fn clamped(stack: i64, channel: i64) -> Self {
        ChannelAddress {
            stack: clamp_stack(stack),
            channel: clamp_channel(channel),
        }
    }

    /// Builds an address, returning `None` when either value is out of range.
    pub fn checked(stack: i64, channel: i64) -> Option<Self> {
        let stack_ok = (STACK_MIN as i64..=STACK_MAX as i64).contains(&stack);
        let channel_ok = (CHANNEL_MIN as i64..=CHANNEL_MAX as i64).contains(&channel);
        if stack_ok && channel_ok {
            Some(ChannelAddress {
                stack: stack as u8,
                channel: channel as u8,
            })
        } else {
            None
        }
    }

    #[inline]
    pub const fn stack(&self) -> u8 {
        self.stack
    }

    #[inline]
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// I2C address of the board, `0x40..=0x47`.
    #[inline]
    pub const fn device_address(&self) -> u8 {
        board_address(self.stack)
    }

    /// Offset of the channel's temperature register, `0, 4, .., 28`.
    #[inline]
    pub const fn register_offset(&self) -> u8 {
        self.register_offset_for(Quantity::Temperature)
    }

    /// Offset of the channel's register inside the block selected by `quantity`.
    #[inline]
    pub const fn register_offset_for(&self, quantity: Quantity) -> u8 {
        quantity.register_base() + (self.channel - CHANNEL_MIN) * REGISTER_WIDTH
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack {} channel {}", self.stack, self.channel)
    }
}
