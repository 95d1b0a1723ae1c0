//! USB host library pump.
//!
//! Installs the host stack, services its library events, and tears it down
//! once no client is registered and every device has been freed.

use core::fmt::Debug;

use crate::error::HostError;

/// Flags reported by one round of host library event handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LibEvents {
    /// The last client deregistered.
    pub no_clients: bool,
    /// Every device has been freed.
    pub all_free: bool,
}

/// Library side of a USB host stack.
pub trait UsbHostLib {
    type Error: Debug;

    fn install(&mut self) -> Result<(), Self::Error>;

    /// Block until the library has events to report.
    fn handle_events(&mut self) -> Result<LibEvents, Self::Error>;

    /// Start freeing every device. Returns `true` when nothing was left to
    /// free; otherwise completion is reported later through
    /// [`LibEvents::all_free`].
    fn free_all_devices(&mut self) -> bool;

    fn uninstall(&mut self) -> Result<(), Self::Error>;
}

/// Result of one [`HostController::pump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerStatus {
    Running,
    /// Clients and devices are gone; the stack may be uninstalled.
    Finished,
}

pub struct HostController<L> {
    lib: L,
    awaiting_free: bool,
}

impl<L: UsbHostLib> HostController<L> {
    pub fn new(lib: L) -> Self {
        HostController {
            lib,
            awaiting_free: false,
        }
    }

    pub fn install(&mut self) -> Result<(), HostError<L::Error>> {
        info!("usb: installing host library");
        self.lib.install().map_err(HostError::Install)
    }

    /// Handle one batch of library events.
    pub fn pump(&mut self) -> Result<ControllerStatus, HostError<L::Error>> {
        let events = self.lib.handle_events().map_err(HostError::LibEvents)?;

        if events.no_clients {
            if self.lib.free_all_devices() {
                return Ok(ControllerStatus::Finished);
            }
            debug!("usb: waiting for devices to be freed");
            self.awaiting_free = true;
        }
        if self.awaiting_free && events.all_free {
            return Ok(ControllerStatus::Finished);
        }
        Ok(ControllerStatus::Running)
    }

    /// Task entry point after [`install()`](Self::install): pump until the
    /// stack is idle, then uninstall.
    pub fn run(&mut self) -> Result<(), HostError<L::Error>> {
        while self.pump()? == ControllerStatus::Running {}
        info!("usb: uninstalling host library");
        self.lib.uninstall().map_err(HostError::Uninstall)
    }

    pub fn lib(&self) -> &L {
        &self.lib
    }
}
