//! Error types.
//!
//! Steady-state output APIs never fail: out-of-range parameters are clamped
//! and runtime peripheral faults are logged and absorbed. The only errors a
//! caller sees are boot-time ones, which the board crate treats as fatal.

use core::fmt;

/// Fatal USB host failure, tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError<E> {
    /// Installing the host stack failed.
    Install(E),
    /// Registering the class-driver client failed.
    Register(E),
    /// Waiting for host library events failed.
    LibEvents(E),
    /// Waiting for client events failed.
    ClientEvents(E),
    /// Tearing the host stack down failed.
    Uninstall(E),
}

impl<E> HostError<E> {
    /// Short name of the failing stage.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Register(_) => "register",
            Self::LibEvents(_) => "library events",
            Self::ClientEvents(_) => "client events",
            Self::Uninstall(_) => "uninstall",
        }
    }

    /// The underlying driver error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Install(e)
            | Self::Register(e)
            | Self::LibEvents(e)
            | Self::ClientEvents(e)
            | Self::Uninstall(e) => e,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for HostError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install(e)
            | Self::Register(e)
            | Self::LibEvents(e)
            | Self::ClientEvents(e)
            | Self::Uninstall(e) => write!(f, "USB host {} failed: {e:?}", self.stage()),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for HostError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Install(e)
            | Self::Register(e)
            | Self::LibEvents(e)
            | Self::ClientEvents(e)
            | Self::Uninstall(e) => defmt::write!(f, "USB host {=str} failed: {}", self.stage(), e),
        }
    }
}
