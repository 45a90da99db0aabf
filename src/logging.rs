// src/logging.rs

// Crate-internal logging macros. They forward to `defmt` or `log` depending on the enabled
// feature and expand to nothing when neither is enabled. Format strings must stay within the
// subset both backends accept: plain `{}` on integers and `&str`.

#[cfg(feature = "defmt")]
macro_rules! trace {
    ($($arg:tt)*) => {{ ::defmt::trace!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => {{ ::defmt::debug!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => {{ ::defmt::warn!($($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! trace {
    ($($arg:tt)*) => {{ ::log::trace!(target: "sm_rtd", $($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($arg:tt)*) => {{ ::log::debug!(target: "sm_rtd", $($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! warn {
    ($($arg:tt)*) => {{ ::log::warn!(target: "sm_rtd", $($arg)*); }};
}

#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! trace {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}
