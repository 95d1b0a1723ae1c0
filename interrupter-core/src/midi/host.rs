//! MIDI class-driver client.
//!
//! [`UsbMidiHost`] registers with the host stack as a client, claims the
//! MIDI streaming interface of an attached device and keeps one inbound
//! transfer in flight, resubmitting it every time it completes.
//!
//! ## Device state machine
//!
//! ```text
//!                  attach                claim ok
//! Disconnected ─────────────► Opening ─────────────► Streaming
//!      ▲                         │                       │
//!      │        claim failed     │                       │ detach
//!      ├─────────────────────────┘                       ▼
//!      └──────────────────────────────────────────── Closing
//!                   release + close done
//! ```
//!
//! [`MidiEvent::Connected`] is published once the stream is running and
//! [`MidiEvent::Disconnected`] only for a device that was announced as
//! connected, so sinks always see the two strictly alternating.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;

use super::name::DeviceName;
use super::packet::{decode_packets, MidiMessage};
use super::UsbMidiDeviceState;
use crate::constants::{
    DISCONNECT_SETTLE_MS, MIDI_EP_ADDR, MIDI_INTERFACE, MIDI_PACKET_SIZE, PRODUCT_STRING_UNITS,
};
use crate::error::HostError;

/// Event delivered to a registered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientEvent {
    /// A device enumerated at `address`.
    NewDevice { address: u8 },
    /// The opened device was physically removed.
    DeviceGone,
    /// The inbound transfer completed with `len` bytes in the buffer.
    InTransferDone { len: usize },
}

/// Client side of a USB host stack.
///
/// One inbound transfer exists per client; its data lands in the buffer
/// passed to [`next_event()`](Self::next_event).
pub trait UsbHostClient {
    /// Open device handle.
    type Device: Copy;
    type Error: Debug;

    fn register(&mut self) -> Result<(), Self::Error>;

    /// Block until the next client event. Completed transfer data is
    /// copied into `buf`.
    fn next_event(&mut self, buf: &mut [u8; MIDI_PACKET_SIZE]) -> Result<ClientEvent, Self::Error>;

    fn open_device(&mut self, address: u8) -> Result<Self::Device, Self::Error>;
    fn claim_interface(&mut self, dev: Self::Device, interface: u8, alt_setting: u8) -> Result<(), Self::Error>;
    fn release_interface(&mut self, dev: Self::Device, interface: u8) -> Result<(), Self::Error>;
    fn close_device(&mut self, dev: Self::Device) -> Result<(), Self::Error>;

    /// Copy the product string descriptor into `buf`, returning the number
    /// of UTF-16 code units written.
    fn product_string(&mut self, dev: Self::Device, buf: &mut [u16]) -> Result<usize, Self::Error>;

    /// Queue the inbound transfer of `len` bytes on `endpoint`.
    fn submit_in(&mut self, dev: Self::Device, endpoint: u8, len: usize) -> Result<(), Self::Error>;
}

/// Notification published to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent<'a> {
    Connected { name: &'a DeviceName },
    Message(MidiMessage),
    Disconnected,
}

/// Consumer of [`MidiEvent`]s.
pub trait MidiEventSink {
    fn on_midi_event(&mut self, event: MidiEvent<'_>);
}

impl<F> MidiEventSink for F
where
    F: FnMut(MidiEvent<'_>),
{
    fn on_midi_event(&mut self, event: MidiEvent<'_>) {
        self(event)
    }
}

/// USB MIDI class-driver client task.
pub struct UsbMidiHost<C: UsbHostClient, D, S> {
    client: C,
    delay: D,
    sink: S,
    state: UsbMidiDeviceState,
    device: Option<C::Device>,
    stream_active: bool,
    name: DeviceName,
    buf: [u8; MIDI_PACKET_SIZE],
}

impl<C, D, S> UsbMidiHost<C, D, S>
where
    C: UsbHostClient,
    D: DelayNs,
    S: MidiEventSink,
{
    pub fn new(client: C, delay: D, sink: S) -> Self {
        UsbMidiHost {
            client,
            delay,
            sink,
            state: UsbMidiDeviceState::Disconnected,
            device: None,
            stream_active: false,
            name: DeviceName::new(),
            buf: [0; MIDI_PACKET_SIZE],
        }
    }

    /// Register as a client of the host stack. Fatal on failure.
    pub fn register(&mut self) -> Result<(), HostError<C::Error>> {
        self.client.register().map_err(HostError::Register)
    }

    /// Wait for one client event and handle it.
    pub fn pump(&mut self) -> Result<(), HostError<C::Error>> {
        let event = self
            .client
            .next_event(&mut self.buf)
            .map_err(HostError::ClientEvents)?;

        match event {
            ClientEvent::NewDevice { address } => self.open(address),
            ClientEvent::DeviceGone => self.close(),
            ClientEvent::InTransferDone { len } => self.transfer_done(len),
        }
        Ok(())
    }

    /// Task entry point: register, then pump events until the host stack
    /// fails.
    pub fn run(&mut self) -> Result<(), HostError<C::Error>> {
        self.register()?;
        loop {
            self.pump()?;
        }
    }

    pub fn state(&self) -> UsbMidiDeviceState {
        self.state
    }

    /// Whether the inbound stream is running.
    pub fn is_connected(&self) -> bool {
        self.stream_active
    }

    /// Name of the streaming device, if any.
    pub fn device_name(&self) -> Option<&DeviceName> {
        if self.stream_active {
            Some(&self.name)
        } else {
            None
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn open(&mut self, address: u8) {
        if self.state != UsbMidiDeviceState::Disconnected {
            warn!("midi: ignoring device {} while one is attached", address);
            return;
        }
        info!("midi: device attached at {}", address);
        self.state = UsbMidiDeviceState::Opening;

        let dev = match self.client.open_device(address) {
            Ok(dev) => dev,
            Err(e) => {
                warn!("midi: open failed: {}", crate::log::Debug2Format(&e));
                self.state = UsbMidiDeviceState::Disconnected;
                return;
            }
        };

        if let Err(e) = self.client.claim_interface(dev, MIDI_INTERFACE, 0) {
            info!("midi: no MIDI interface: {}", crate::log::Debug2Format(&e));
            self.release(dev, false);
            self.state = UsbMidiDeviceState::Disconnected;
            return;
        }

        let mut units = [0u16; PRODUCT_STRING_UNITS];
        self.name = match self.client.product_string(dev, &mut units) {
            Ok(n) => DeviceName::from_utf16_latin1(&units[..n.min(units.len())]),
            Err(e) => {
                warn!("midi: no product string: {}", crate::log::Debug2Format(&e));
                DeviceName::new()
            }
        };

        if let Err(e) = self.client.submit_in(dev, MIDI_EP_ADDR, MIDI_PACKET_SIZE) {
            error!("midi: initial submit failed: {}", crate::log::Debug2Format(&e));
            self.name.clear();
            self.release(dev, true);
            self.state = UsbMidiDeviceState::Disconnected;
            return;
        }

        self.device = Some(dev);
        self.stream_active = true;
        self.state = UsbMidiDeviceState::Streaming;
        info!("midi: streaming from {}", self.name);
        self.sink.on_midi_event(MidiEvent::Connected { name: &self.name });
    }

    fn close(&mut self) {
        if self.state != UsbMidiDeviceState::Streaming {
            debug!("midi: device gone while {}", self.state);
            return;
        }
        self.state = UsbMidiDeviceState::Closing;
        self.stream_active = false;
        let dev = self.device.take();

        self.delay.delay_ms(DISCONNECT_SETTLE_MS);
        if let Some(dev) = dev {
            self.release(dev, true);
        }

        self.name.clear();
        self.state = UsbMidiDeviceState::Disconnected;
        info!("midi: device disconnected");
        self.sink.on_midi_event(MidiEvent::Disconnected);
    }

    fn transfer_done(&mut self, len: usize) {
        let len = len.min(MIDI_PACKET_SIZE);
        for msg in decode_packets(&self.buf[..len]) {
            debug!("midi: {}", msg);
            self.sink.on_midi_event(MidiEvent::Message(msg));
        }

        if !self.stream_active {
            return;
        }
        if let Some(dev) = self.device {
            if let Err(e) = self.client.submit_in(dev, MIDI_EP_ADDR, MIDI_PACKET_SIZE) {
                error!("midi: resubmit failed: {}", crate::log::Debug2Format(&e));
                self.stream_active = false;
            }
        }
    }

    fn release(&mut self, dev: C::Device, claimed: bool) {
        if claimed {
            if let Err(e) = self.client.release_interface(dev, MIDI_INTERFACE) {
                warn!("midi: release failed: {}", crate::log::Debug2Format(&e));
            }
        }
        if let Err(e) = self.client.close_device(dev) {
            warn!("midi: close failed: {}", crate::log::Debug2Format(&e));
        }
    }
}
