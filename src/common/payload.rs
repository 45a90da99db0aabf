// src/common/payload.rs

use super::request::ReadRequest;

/// Why a payload could not be produced for a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("{0}")]
pub struct PayloadError(&'static str);

impl PayloadError {
    pub const fn new(message: &'static str) -> Self {
        PayloadError(message)
    }

    #[inline]
    pub const fn message(&self) -> &'static str {
        self.0
    }
}

/// Evaluates a payload from the incoming request.
pub type PayloadFn<V> = fn(&ReadRequest<'_>) -> Result<V, PayloadError>;

/// What accompanies a reading in the result.
#[derive(Debug, Clone)]
pub enum PayloadMode<V> {
    /// The same configured value for every reading.
    Static(V),
    /// A value computed from each request.
    FromRequest(PayloadFn<V>),
    /// No payload; the result carries the reading alone.
    Suppressed,
}

impl<V> Default for PayloadMode<V> {
    fn default() -> Self {
        PayloadMode::Suppressed
    }
}

/// Produces the payload for `request`.
///
/// Runs before any bus traffic so an evaluation error aborts the read like a validation error.
pub fn resolve_payload<V: Clone>(
    mode: &PayloadMode<V>,
    request: &ReadRequest<'_>,
) -> Result<Option<V>, PayloadError> {
    match mode {
        PayloadMode::Static(value) => Ok(Some(value.clone())),
        PayloadMode::FromRequest(eval) => eval(request).map(Some),
        PayloadMode::Suppressed => Ok(None),
    }
}
