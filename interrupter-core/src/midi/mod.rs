//! USB MIDI host.
//!
//! Two cooperating task bodies, each generic over a thin trait on the USB
//! host stack:
//!
//! | Task | Type | Blocks on |
//! |------|------|-----------|
//! | Host library pump | [`HostController`] over [`UsbHostLib`] | library events |
//! | MIDI class client | [`UsbMidiHost`] over [`UsbHostClient`] | client events |
//!
//! The client decodes Note-On / Note-Off packets and forwards them, together
//! with attach and detach notifications, to a [`MidiEventSink`]. Nothing in
//! the output stage consumes MIDI yet; the sink is for display.

pub mod controller;
pub mod host;
pub mod name;
pub mod packet;

pub use controller::{ControllerStatus, HostController, LibEvents, UsbHostLib};
pub use host::{ClientEvent, MidiEvent, MidiEventSink, UsbHostClient, UsbMidiHost};
pub use name::DeviceName;
pub use packet::{decode_packets, MidiMessage, NoteState};

/// Connection state of the MIDI client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbMidiDeviceState {
    Disconnected,
    /// Device opened, interface being claimed.
    Opening,
    /// Interface claimed and the inbound transfer in flight.
    Streaming,
    /// Device detached, interface being released.
    Closing,
}
