//! Crate-internal logging macros.
//!
//! With the `defmt` feature the macros forward to `defmt`. Without it they
//! compile to nothing, but still borrow every argument so values that exist
//! only for logging do not trigger unused warnings.

#![allow(unused_macros, dead_code)]

#[cfg(feature = "defmt")]
pub(crate) use defmt::{Debug2Format, Display2Format};

/// Formats a `Debug` value through the `defmt` adapter (no-op without `defmt`).
#[cfg(not(feature = "defmt"))]
pub(crate) struct Debug2Format<'a, T: ?Sized>(pub &'a T);

/// Formats a `Display` value through the `defmt` adapter (no-op without `defmt`).
#[cfg(not(feature = "defmt"))]
pub(crate) struct Display2Format<'a, T: ?Sized>(pub &'a T);

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! error {
    ($($arg:tt)*) => { defmt::error!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{ $( let _ = &$arg; )* }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{ $( let _ = &$arg; )* }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{ $( let _ = &$arg; )* }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{ $( let _ = &$arg; )* }};
}
