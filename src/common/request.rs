// src/common/request.rs

use super::address::{clamp_channel, clamp_stack, ChannelAddress, Quantity, RangePolicy};
use super::error::ValidationError;
use super::input::{InputValue, RejectedInput};
use super::payload::{resolve_payload, PayloadMode};

/// One read request as delivered by the caller.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ReadRequest<'a> {
    pub stack: InputValue<'a>,
    pub channel: InputValue<'a>,
}

impl<'a> ReadRequest<'a> {
    pub fn new(stack: impl Into<InputValue<'a>>, channel: impl Into<InputValue<'a>>) -> Self {
        ReadRequest {
            stack: stack.into(),
            channel: channel.into(),
        }
    }
}

/// Per-reader settings.
///
/// A fixed `stack` or `channel` wins over the value carried by the request; the request value
/// is only consulted for fields left unset.
#[derive(Debug, Clone)]
pub struct ReaderConfig<V = ()> {
    pub stack: Option<i64>,
    pub channel: Option<i64>,
    pub quantity: Quantity,
    pub range_policy: RangePolicy,
    pub payload: PayloadMode<V>,
}

impl<V> Default for ReaderConfig<V> {
    fn default() -> Self {
        ReaderConfig {
            stack: None,
            channel: None,
            quantity: Quantity::default(),
            range_policy: RangePolicy::default(),
            payload: PayloadMode::default(),
        }
    }
}

impl ReaderConfig {
    /// Defaults: request-supplied address, temperature block, clamping, no payload.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V> ReaderConfig<V> {
    pub fn with_stack(mut self, stack: i64) -> Self {
        self.stack = Some(stack);
        self
    }

    pub fn with_channel(mut self, channel: i64) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_range_policy(mut self, range_policy: RangePolicy) -> Self {
        self.range_policy = range_policy;
        self
    }

    pub fn with_payload<W>(self, payload: PayloadMode<W>) -> ReaderConfig<W> {
        ReaderConfig {
            stack: self.stack,
            channel: self.channel,
            quantity: self.quantity,
            range_policy: self.range_policy,
            payload,
        }
    }

    /// Validates the request and maps it to a physical sensor position.
    pub fn resolve_address(&self, request: &ReadRequest<'_>) -> Result<ChannelAddress, ValidationError> {
        let stack = self.resolve_stack(request.stack)?;

        let channel_input = self.channel.map_or(request.channel, InputValue::Integer);
        let channel = channel_input
            .as_integer()
            .ok_or_else(|| ValidationError::InvalidChannel(RejectedInput::capture(&channel_input)))?;
        let clamped = clamp_channel(channel);
        if self.range_policy == RangePolicy::Reject && clamped as i64 != channel {
            return Err(ValidationError::ChannelOutOfRange(channel));
        }

        Ok(ChannelAddress::clamped(stack as i64, clamped as i64))
    }

    /// Validates a stack level on its own, for board-wide registers.
    pub fn resolve_stack(&self, stack: InputValue<'_>) -> Result<u8, ValidationError> {
        let stack_input = self.stack.map_or(stack, InputValue::Integer);
        let stack = stack_input
            .as_integer()
            .ok_or_else(|| ValidationError::InvalidStack(RejectedInput::capture(&stack_input)))?;
        let clamped = clamp_stack(stack);
        if self.range_policy == RangePolicy::Reject && clamped as i64 != stack {
            return Err(ValidationError::StackOutOfRange(stack));
        }
        Ok(clamped)
    }
}

impl<V: Clone> ReaderConfig<V> {
    /// Everything that can be decided without the bus: address, register and payload.
    pub fn prepare(&self, request: &ReadRequest<'_>) -> Result<PreparedRead<V>, ValidationError> {
        let address = self.resolve_address(request)?;
        let payload = resolve_payload(&self.payload, request).map_err(ValidationError::Payload)?;
        Ok(PreparedRead {
            address,
            register: address.register_offset_for(self.quantity),
            payload,
        })
    }
}

/// A validated request, ready for the block read.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRead<V> {
    pub address: ChannelAddress,
    pub register: u8,
    pub payload: Option<V>,
}
