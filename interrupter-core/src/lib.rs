//! # interrupter-core
//!
//! A `no_std`, allocation-free core for a handheld signal-output device. One
//! output pin carries either a manually configured pulse train or an
//! audio-envelope-driven PWM signal, gated by an arm switch and selected by a
//! mode switch. A USB MIDI controller can be attached as an auxiliary input.
//!
//! The crate never touches registers: every physical resource is a trait in
//! [`peripheral`] (plus [`embedded_hal`] pins and delays), so the same logic
//! runs on the board and under host tests.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Config | [`constants`] | Sample rates, register limits, USB endpoints |
//! | Trait | [`peripheral`] | Pulse channel, PWM channel, signal router, ADC |
//! | Audio | [`audio`] | Continuous sampling and ISR sample → duty mapping |
//! | Pulse | [`pulse`] | Hardware-looped and software-paced pulse trains |
//! | Routing | [`arbiter`] | Mode/arm state machine, single owner of the pin |
//! | USB | [`midi`] | USB host controller, MIDI class client (feature-gated) |
//!
//! ## Data flow
//!
//! ```text
//! Buttons ──► ModeArbiter ──┬──► PulseGenerator ──► pulse channel ─┐
//!                           │                                      ├─► SignalRouter ─► pin
//!                           └──► AudioEnvelopeSampler (start/stop) │
//!   ADC ISR ──► ConversionHook ──► PWM channel (duty) ─────────────┘
//!
//! USB host ──► UsbMidiHost ──► MidiEventSink (menu / display)
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `usb-midi` | yes | USB MIDI host state machine ([`midi`]) |
//! | `defmt` | no | Structured logging through `defmt` |

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod constants;
pub mod error;
pub mod peripheral;
pub mod audio;
pub mod pulse;
pub mod arbiter;

#[cfg(feature = "usb-midi")]
pub mod midi;

#[cfg(test)]
mod mock;


pub use arbiter::{ArmState, Button, ModeArbiter, OutputMode};
pub use audio::{AudioEnvelopeSampler, ConversionHook, DutyLevel, DutySink, RawSample, Volume};
pub use error::HostError;
pub use pulse::{PulseGenerator, PulsePacer, PulseSpec};

#[cfg(feature = "usb-midi")]
pub use midi::{HostController, MidiEvent, MidiEventSink, UsbMidiHost};
